//! テスト用の台本付き取得経路

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api;
use crate::error::{HarvestError, TransportError};
use crate::traits::Transport;

type Matcher = Box<dyn Fn(&str) -> bool + Send + Sync>;

enum Reply {
    Respond(Result<Value, TransportError>),
    /// 応答を返さず待ち続ける
    Hang,
}

struct Route {
    matcher: Matcher,
    responses: VecDeque<Reply>,
}

/// URLごとに用意した応答を順に返す。未登録・使い切りは空ページ
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(
        self,
        matcher: impl Fn(&str) -> bool + Send + Sync + 'static,
        responses: Vec<Result<Value, TransportError>>,
    ) -> Self {
        self.routes.lock().unwrap().push(Route {
            matcher: Box::new(matcher),
            responses: responses.into_iter().map(Reply::Respond).collect(),
        });
        self
    }

    /// マッチしたリクエストを1回だけ応答なしで保留する
    pub(crate) fn hang(self, matcher: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.routes.lock().unwrap().push(Route {
            matcher: Box::new(matcher),
            responses: VecDeque::from([Reply::Hang]),
        });
        self
    }

    /// 一覧APIの (カテゴリ, offset) に1ページを割り当てる
    pub(crate) fn page(self, category: Option<i64>, offset: u64, payload: Value) -> Self {
        self.route(listing(category, offset), vec![Ok(payload)])
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn query_of(url: &str) -> Option<(String, HashMap<String, String>)> {
    let parsed = url::Url::parse(url).ok()?;
    let query = parsed.query_pairs().into_owned().collect();
    Some((parsed.path().to_string(), query))
}

/// 一覧APIの特定ページにマッチ
pub(crate) fn listing(category: Option<i64>, offset: u64) -> impl Fn(&str) -> bool {
    let category = category.map(|c| c.to_string()).unwrap_or_default();
    let offset = offset.to_string();
    move |url| match query_of(url) {
        Some((path, q)) => {
            path == api::LISTING_PATH
                && q.get("categoriesId") == Some(&category)
                && q.get("offset") == Some(&offset)
        }
        None => false,
    }
}

pub(crate) fn options() -> impl Fn(&str) -> bool {
    |url| matches!(query_of(url), Some((path, _)) if path == api::OPTIONS_PATH)
}

/// `{games: [{id, name}, ...]}`
pub(crate) fn games(entries: &[(i64, &str)]) -> Value {
    let games: Vec<Value> = entries
        .iter()
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect();
    json!({ "games": games })
}

/// id範囲から1ページを作る
pub(crate) fn games_range(ids: std::ops::Range<i64>) -> Value {
    let games: Vec<Value> = ids
        .map(|id| json!({"id": id, "name": format!("game-{}", id)}))
        .collect();
    json!({ "games": games })
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open(&mut self) -> Result<(), HarvestError> {
        Ok(())
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            routes
                .iter_mut()
                .filter(|route| (route.matcher)(url))
                .find_map(|route| route.responses.pop_front())
        };

        match reply {
            Some(Reply::Respond(response)) => response,
            Some(Reply::Hang) => futures::future::pending().await,
            None => Ok(json!({ "games": [] })),
        }
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        Ok(())
    }
}
