use crate::ai_provider::AiProvider;
use crate::error::{BrandAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    /// {input_dir}/{dataset}/{brand}/{hash}/
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prompt_dir: PathBuf,
    /// クォータ・サーバーエラー後の待機秒数
    pub quota_wait_seconds: u64,
    pub timeout_seconds: u64,
    /// Phase1の思考トークン予算（-1 = 動的、None = 指定しない）
    pub thinking_budget: Option<i32>,
    pub max_image_width: u32,
    pub max_image_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: AiProvider::Gemini.default_model().into(),
            api_base: "https://generativelanguage.googleapis.com".into(),
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
            prompt_dir: PathBuf::from("prompts"),
            quota_wait_seconds: 60,
            timeout_seconds: 120,
            thinking_budget: Some(-1),
            max_image_width: 1920,  // 最初のビューポート
            max_image_height: 1080,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| BrandAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("brand-ai").join("config.json"))
    }

    pub fn get_api_key(&self, provider: AiProvider) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(provider.api_key_env()) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(BrandAiError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    /// CLIで指定されたディレクトリで上書き
    pub fn apply_overrides(
        &mut self,
        input_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        prompt_dir: Option<PathBuf>,
    ) {
        if let Some(dir) = input_dir {
            self.input_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(dir) = prompt_dir {
            self.prompt_dir = dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.5-flash-lite");
        assert_eq!(config.quota_wait_seconds, 60);
        assert_eq!(config.thinking_budget, Some(-1));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"output_dir": "/tmp/out", "quota_wait_seconds": 5}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.quota_wait_seconds, 5);
        assert_eq!(config.model, "gemini-2.5-flash-lite");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_key: Some("key-123".into()),
            thinking_budget: None,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("key-123"));
        assert_eq!(loaded.thinking_budget, None);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some(PathBuf::from("in")), None, Some(PathBuf::from("tpl")));
        assert_eq!(config.input_dir, PathBuf::from("in"));
        assert_eq!(config.output_dir, PathBuf::from("data/output"));
        assert_eq!(config.prompt_dir, PathBuf::from("tpl"));
    }
}
