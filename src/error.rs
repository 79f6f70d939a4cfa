use thiserror::Error;

/// 1回の取得試行の失敗。すべてリトライ対象
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("ネットワークエラー: {0}")]
    Network(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("HTTPステータス異常: status={status}")]
    Status { status: u16 },

    #[error("空のレスポンス: status={status}")]
    EmptyBody { status: u16 },

    #[error("JSONパースエラー: {0}")]
    InvalidJson(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("セッションが開かれていません")]
    NotOpen,
}

impl TransportError {
    /// 1回の試行に閉じた失敗なので常に再試行可能
    pub fn is_retryable(&self) -> bool {
        true
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status {
                status: status.as_u16(),
            }
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("取得失敗 ({attempts}回試行): {url}: {last_cause}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        last_cause: TransportError,
    },

    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("HTTPクライアント初期化エラー: {0}")]
    HttpClient(String),

    #[error("不正なレスポンス: {0}")]
    InvalidResponse(String),

    #[error("設定エラー: {0}")]
    InvalidConfig(String),

    #[error("中断されました")]
    Interrupted,

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),
}

impl HarvestError {
    /// リトライ上限に達した取得失敗かどうか
    pub fn is_fetch_exhausted(&self) -> bool {
        matches!(self, HarvestError::FetchExhausted { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, HarvestError::Interrupted)
    }
}
