//! Gemini API連携
//!
//! generateContent REST を1回呼び、応答テキストとトークン使用量を返す。
//! HTTPステータスは ModelError に分類する（429 → クォータ、5xx → サーバー、400 → 不正リクエスト）。

use super::types::{ModelError, ModelRequest, ModelResponse};
use super::ModelClient;
use crate::error::{BrandAiError, Result};
use async_trait::async_trait;
use brand_ai_common::{ContentPart, TokenUsage};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "thinkingConfig")]
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
struct ThinkingConfig {
    #[serde(rename = "thinkingBudget")]
    thinking_budget: i32,
}

impl GeminiRequest {
    fn from_model_request(request: &ModelRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => Part::Text { text: text.clone() },
                ContentPart::Image(image) => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    },
                },
            })
            .collect();

        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: request.thinking_budget.map(|budget| GenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: budget,
                },
            }),
        }
    }
}

/// Gemini APIレスポンス
#[derive(Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    thoughts_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

/// エラーレスポンス {"error": {"code", "message", "status"}}
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiResponse {
    fn into_model_response(self) -> ModelResponse {
        // 思考パートを除いたテキストを連結
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|t| !t.is_empty());

        let usage = self.usage_metadata.map(|u| TokenUsage {
            prompt_token_count: u.prompt_token_count.unwrap_or(0),
            thoughts_token_count: u.thoughts_token_count.unwrap_or(0),
            candidates_token_count: u.candidates_token_count.unwrap_or(0),
            total_token_count: u.total_token_count.unwrap_or(0),
        });

        ModelResponse {
            text,
            block_reason: self.prompt_feedback.and_then(|f| f.block_reason),
            usage,
        }
    }
}

/// HTTPエラーステータスを分類
fn classify_status(status: u16, body: &str) -> ModelError {
    let (message, status_text) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => (parsed.error.message, parsed.error.status.unwrap_or_default()),
        Err(_) => (body.chars().take(200).collect(), String::new()),
    };

    if status == 429 || status_text == "RESOURCE_EXHAUSTED" {
        return ModelError::QuotaExceeded(message);
    }

    match status {
        500 | 502 | 503 | 504 => ModelError::Server { status, message },
        400 => ModelError::BadRequest(message),
        _ => ModelError::Other(format!("HTTP {}: {}", status, message)),
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrandAiError::ApiCall(format!("HTTPクライアント生成エラー: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            api_base: api_base.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> std::result::Result<ModelResponse, ModelError> {
        let body = GeminiRequest::from_model_request(request);
        let payload = serde_json::to_vec(&body)
            .map_err(|e| ModelError::InvalidRequest(e.to_string()))?;

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| ModelError::Other(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Other(format!("レスポンス読み込みエラー: {}", e)))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &text));
        }

        debug!(bytes = text.len(), "Gemini応答を受信");

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Other(format!("レスポンスのパースに失敗: {}", e)))?;

        Ok(parsed.into_model_response())
    }

    fn name(&self) -> &str {
        &self.model
    }
}
