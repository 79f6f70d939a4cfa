use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://melbet-tn.com";
pub const DEFAULT_LANG: &str = "en";

/// 取得経路
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// ブラウザ起動を試み、失敗したらHTTPにフォールバック
    #[default]
    Auto,
    Http,
    Browser,
}

/// 走査するカテゴリの指定方法
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelection {
    /// カテゴリ指定なし（categoriesIdを空で送る）
    #[default]
    Unfiltered,
    /// 指定順のまま使う
    Explicit(Vec<i64>),
    /// オプションAPIから全カテゴリを解決
    All,
}

/// ページ取得がリトライ上限に達したときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFailurePolicy {
    /// 実行全体を失敗させる
    #[default]
    Abort,
    /// そのカテゴリを打ち切って次へ進む
    SkipCategory,
}

/// 1回の収集実行の設定。実行中は変更しない
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub base_url: String,
    pub lang: String,
    pub mode: TransportMode,
    pub categories: CategorySelection,
    pub brand_ids: Vec<i64>,
    pub title_search: Option<String>,
    /// 1ページの件数 (limit)
    pub page_size: u32,
    /// 収集上限。0は無制限
    pub max_items: usize,
    pub page_delay: Duration,
    pub retries: u32,
    pub backoff_base: Duration,
    pub request_timeout: Duration,
    pub headless: bool,
    pub failure_policy: PageFailurePolicy,
    pub debug: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            mode: TransportMode::Auto,
            categories: CategorySelection::Unfiltered,
            brand_ids: Vec::new(),
            title_search: None,
            page_size: 50,
            max_items: 1000,
            page_delay: Duration::from_millis(200),
            retries: 5,
            backoff_base: Duration::from_millis(750),
            request_timeout: Duration::from_secs(30),
            headless: true,
            failure_policy: PageFailurePolicy::Abort,
            debug: false,
        }
    }
}

impl HarvestConfig {
    pub fn new(base_url: impl Into<String>, lang: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_categories(mut self, categories: CategorySelection) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_brand_ids(mut self, brand_ids: Vec<i64>) -> Self {
        self.brand_ids = brand_ids;
        self
    }

    pub fn with_title_search(mut self, search: Option<String>) -> Self {
        self.title_search = search.filter(|s| !s.is_empty());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_retries(mut self, retries: u32, backoff_base: Duration) -> Self {
        self.retries = retries;
        self.backoff_base = backoff_base;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_failure_policy(mut self, policy: PageFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
