mod gemini;
mod types;

pub use gemini::GeminiClient;
pub use types::{ErrorAction, ModelError, ModelRequest, ModelResponse, OutcomeKind};

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// マルチモーダルモデルの呼び出し口
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// 1回呼び出す（リトライはしない）
    async fn generate(&self, request: &ModelRequest) -> std::result::Result<ModelResponse, ModelError>;

    fn name(&self) -> &str;
}

/// 設定からプロバイダのクライアントを生成
pub fn create_client(provider: AiProvider, config: &Config) -> Result<Box<dyn ModelClient>> {
    let api_key = config.get_api_key(provider)?;
    let timeout = Duration::from_secs(config.timeout_seconds);

    match provider {
        AiProvider::Gemini => Ok(Box::new(GeminiClient::new(
            api_key,
            config.model.clone(),
            config.api_base.clone(),
            timeout,
        )?)),
    }
}
