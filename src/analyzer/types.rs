use brand_ai_common::{ContentPart, TokenUsage};
use thiserror::Error;

/// モデル呼び出しの入力
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub parts: Vec<ContentPart>,
    /// 思考トークン予算（None = 設定しない）
    pub thinking_budget: Option<i32>,
}

impl ModelRequest {
    pub fn new(parts: Vec<ContentPart>) -> Self {
        Self {
            parts,
            thinking_budget: None,
        }
    }

    pub fn with_thinking_budget(mut self, budget: Option<i32>) -> Self {
        self.thinking_budget = budget;
        self
    }
}

/// モデル呼び出しの結果（HTTPとしては成功）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub block_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            block_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// 空でない応答テキスト（ブロック時は None）
    pub fn answer(&self) -> Option<&str> {
        if self.block_reason.is_some() {
            return None;
        }
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// 呼び出し失敗時の動作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// 一定時間待ってから次のサンプルへ
    WaitAndSkip,
    /// すぐ次のサンプルへ
    Skip,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("クォータ超過: {0}")]
    QuotaExceeded(String),

    #[error("サーバーエラー ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    #[error("リクエスト生成エラー: {0}")]
    InvalidRequest(String),

    #[error("API呼び出しエラー: {0}")]
    Other(String),
}

impl ModelError {
    pub fn action(&self) -> ErrorAction {
        match self {
            ModelError::QuotaExceeded(_) | ModelError::Server { .. } => ErrorAction::WaitAndSkip,
            ModelError::BadRequest(_) | ModelError::InvalidRequest(_) | ModelError::Other(_) => {
                ErrorAction::Skip
            }
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            ModelError::QuotaExceeded(_) => OutcomeKind::QuotaExceeded,
            ModelError::Server { .. } => OutcomeKind::ServerError,
            ModelError::BadRequest(_) => OutcomeKind::BadRequest,
            ModelError::InvalidRequest(_) | ModelError::Other(_) => OutcomeKind::Unhandled,
        }
    }
}

/// 1回の呼び出しの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    SafetyBlock,
    MalformedResponse,
    QuotaExceeded,
    ServerError,
    BadRequest,
    Unhandled,
}
