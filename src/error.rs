use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrandAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`brand-ai config --set-api-key YOUR_KEY` で設定するか GEMINI_API_KEY を指定してください")]
    MissingApiKey,

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Common(#[from] brand_ai_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BrandAiError>;
