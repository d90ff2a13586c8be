use clap::ValueEnum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AiProvider {
    Gemini,
}

impl AiProvider {
    /// 出力ディレクトリ名 (Phase1_{label}) に使うラベル
    pub fn dir_label(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "Gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini-2.5-flash-lite",
        }
    }

    /// APIキーを読む環境変数
    pub fn api_key_env(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}
