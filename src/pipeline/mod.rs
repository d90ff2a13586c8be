//! 2段階バッチ処理
//!
//! - Phase1 (識別): サンプルごと・入力モードごとにブランドを予測
//! - Phase2 (照合): Phase1の予測と正解URLが一致するかを判定
//!
//! すべて逐次実行。1サンプルの失敗でバッチ全体は止めない。

mod format;
mod phase1;
mod phase2;

pub use format::{format_phase1, format_phase2};

use crate::ai_provider::AiProvider;
use crate::analyzer::{ErrorAction, ModelClient, ModelError, OutcomeKind};
use crate::config::Config;
use crate::error::Result;
use crate::scanner::ImageLimits;
use crate::store::OutputLayout;
use brand_ai_common::{InputMode, PromptTemplates};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prompt_dir: PathBuf,
    pub provider: AiProvider,
    /// Phase1で処理する入力モード（Phase2は全モードを走査）
    pub modes: Vec<InputMode>,
    pub thinking_budget: Option<i32>,
    /// クォータ・サーバーエラー後の待機
    pub transient_wait: Duration,
    pub image_limits: ImageLimits,
    pub show_progress: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config, provider: AiProvider) -> Self {
        Self {
            input_dir: config.input_dir.clone(),
            output_dir: config.output_dir.clone(),
            prompt_dir: config.prompt_dir.clone(),
            provider,
            modes: InputMode::ALL.to_vec(),
            thinking_budget: config.thinking_budget,
            transient_wait: Duration::from_secs(config.quota_wait_seconds),
            image_limits: ImageLimits {
                max_width: config.max_image_width,
                max_height: config.max_image_height,
            },
            show_progress: true,
        }
    }

    pub fn with_modes(mut self, modes: Vec<InputMode>) -> Self {
        if !modes.is_empty() {
            self.modes = modes;
        }
        self
    }
}

/// Phase1の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Phase1Stats {
    /// 書き込んだ結果ファイル
    pub written: usize,
    /// そのうちブロック・パース失敗（Error=true）
    pub flagged: usize,
    /// 既に結果があり呼び出さなかった
    pub already_done: usize,
    /// スクリーンショットかHTML情報がないサンプル
    pub incomplete: usize,
    /// HTML情報・画像が読めずスキップしたサンプル
    pub unreadable: usize,
    /// 呼び出し失敗でスキップした件数
    pub failed: usize,
}

/// Phase2の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Phase2Stats {
    pub written: usize,
    pub flagged: usize,
    pub already_done: usize,
    /// Phase1がエラーで対象外
    pub excluded: usize,
    /// 壊れたPhase1結果
    pub broken: usize,
    pub failed: usize,
    pub summary_rows: usize,
    /// サマリーへの追記に失敗した行
    pub summary_failed: usize,
}

pub struct Pipeline<'a> {
    client: &'a dyn ModelClient,
    settings: PipelineSettings,
    layout: OutputLayout,
}

impl<'a> Pipeline<'a> {
    pub fn new(client: &'a dyn ModelClient, settings: PipelineSettings) -> Self {
        let layout = OutputLayout::new(settings.output_dir.clone(), settings.provider);
        Self {
            client,
            settings,
            layout,
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// 指定モードのテンプレートをまとめて読み込む
    fn load_templates(&self, modes: &[InputMode]) -> Result<HashMap<InputMode, PromptTemplates>> {
        let mut templates = HashMap::new();
        for &mode in modes {
            templates.insert(mode, PromptTemplates::load(&self.settings.prompt_dir, mode)?);
        }
        Ok(templates)
    }

    /// 呼び出し失敗をログに出し、必要なら待機（同じサンプルは再試行しない）
    async fn handle_failure(&self, error: &ModelError, hash: &str, mode: InputMode) {
        let kind = error.kind();
        let label = match kind {
            OutcomeKind::QuotaExceeded => "クォータエラー",
            OutcomeKind::ServerError => "サーバーエラー",
            OutcomeKind::BadRequest => "BadRequest",
            _ => "想定外のエラー",
        };
        warn!(hash, %mode, ?kind, "[Warning] {}: {}", label, error);

        if error.action() == ErrorAction::WaitAndSkip && !self.settings.transient_wait.is_zero() {
            tokio::time::sleep(self.settings.transient_wait).await;
        }
    }

    fn progress_bar(&self, len: usize, message: String) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb.set_message(message);
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            quota_wait_seconds: 7,
            max_image_width: 800,
            ..Default::default()
        };
        let settings = PipelineSettings::from_config(&config, AiProvider::Gemini);

        assert_eq!(settings.transient_wait, Duration::from_secs(7));
        assert_eq!(settings.image_limits.max_width, 800);
        assert_eq!(settings.modes, InputMode::ALL.to_vec());
        assert_eq!(settings.thinking_budget, Some(-1));
    }

    #[test]
    fn test_with_modes() {
        let settings = PipelineSettings::from_config(&Config::default(), AiProvider::Gemini);
        assert_eq!(settings.clone().with_modes(vec![]).modes.len(), 3);
        assert_eq!(settings.with_modes(vec![InputMode::Html]).modes, vec![InputMode::Html]);
    }
}
