//! プロンプト生成モジュール
//!
//! テンプレートファイルとサンプルデータからモデル入力（パートの並び）を組み立てる:
//! - PromptTemplates: 入力モード別のテンプレート
//! - build_identification_prompt: Phase1（ブランド識別）用
//! - build_brandcheck_prompt: Phase2（ブランド照合）用

use crate::error::{Error, Result};
use crate::types::InputMode;
use std::path::Path;

/// システムテキストと証拠の間に置く区切り
pub const RESOURCE_MARKER: &str = "Here are the provided resources: ";

/// Base64エンコード済み画像
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

/// モデルに渡す入力パート（順序どおりに送信される）
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Image(EncodedImage),
}

impl ContentPart {
    pub fn text(s: impl Into<String>) -> Self {
        ContentPart::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(s) => Some(s),
            ContentPart::Image(_) => None,
        }
    }
}

/// 入力モードごとのテンプレート
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplates {
    pub mode: InputMode,
    pub phase1_system: String,
    /// 先頭に空行2つを付与済み
    pub phase1_response_format: String,
    pub phase2_system: String,
}

impl PromptTemplates {
    pub fn phase1_system_file(mode: InputMode) -> String {
        format!("phase1_system_{}.txt", mode.as_str())
    }

    pub fn phase1_response_file(mode: InputMode) -> String {
        format!("phase1_response_{}.txt", mode.as_str())
    }

    pub const PHASE2_SYSTEM_FILE: &'static str = "phase2_system.txt";

    /// テンプレートディレクトリから読み込み
    pub fn load(dir: &Path, mode: InputMode) -> Result<Self> {
        let phase1_system = read_template(dir, &Self::phase1_system_file(mode))?;
        let response_format = read_template(dir, &Self::phase1_response_file(mode))?;
        let phase2_system = read_template(dir, Self::PHASE2_SYSTEM_FILE)?;

        Ok(Self::from_parts(mode, phase1_system, response_format, phase2_system))
    }

    /// Phase2のシステム文だけを読み込み
    pub fn load_phase2_system(dir: &Path) -> Result<String> {
        read_template(dir, Self::PHASE2_SYSTEM_FILE)
    }

    pub fn from_parts(
        mode: InputMode,
        phase1_system: impl Into<String>,
        response_format: impl AsRef<str>,
        phase2_system: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            phase1_system: phase1_system.into(),
            phase1_response_format: format!("\n\n{}", response_format.as_ref()),
            phase2_system: phase2_system.into(),
        }
    }
}

fn read_template(dir: &Path, file_name: &str) -> Result<String> {
    let path = dir.join(file_name);
    std::fs::read_to_string(&path)
        .map_err(|e| Error::Template(format!("{}: {}", path.display(), e)))
}

/// Phase1プロンプト生成
///
/// 並び: システム文 → 区切り → (HTML) → (画像) → 応答形式
///
/// # Arguments
/// * `templates` - 対象モードのテンプレート
/// * `image` - スクリーンショット（ss / both で必須）
/// * `html_info` - add_info.json のブランド情報（html / both で使用）
pub fn build_identification_prompt(
    templates: &PromptTemplates,
    image: Option<&EncodedImage>,
    html_info: &str,
) -> Result<Vec<ContentPart>> {
    let mode = templates.mode;
    let mut parts = vec![
        ContentPart::text(templates.phase1_system.clone()),
        ContentPart::text(RESOURCE_MARKER),
    ];

    if mode.needs_html() {
        parts.push(ContentPart::text(html_info));
    }

    if mode.needs_image() {
        let image = image.ok_or_else(|| {
            Error::MissingEvidence(format!("{} モードにスクリーンショットがありません", mode))
        })?;
        parts.push(ContentPart::Image(image.clone()));
    }

    parts.push(ContentPart::text(templates.phase1_response_format.clone()));
    Ok(parts)
}

/// Phase2プロンプト生成（テキストのみ）
pub fn build_brandcheck_prompt(
    phase2_system: &str,
    ground_truth: &str,
    prediction: &str,
) -> Vec<ContentPart> {
    let data = format!(
        "Ground Truth: \"{}\"\n\"Prediction:\"{}",
        ground_truth, prediction
    );
    vec![ContentPart::text(phase2_system), ContentPart::Text(data)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(mode: InputMode) -> PromptTemplates {
        PromptTemplates::from_parts(mode, "SYSTEM", "FORMAT", "CHECK")
    }

    fn image() -> EncodedImage {
        EncodedImage {
            mime_type: "image/png".to_string(),
            data: "iVBORw0KGgo=".to_string(),
        }
    }

    #[test]
    fn test_identification_prompt_html() {
        let parts = build_identification_prompt(&templates(InputMode::Html), Some(&image()), "<title>Acme</title>").unwrap();
        assert_eq!(
            parts,
            vec![
                ContentPart::text("SYSTEM"),
                ContentPart::text(RESOURCE_MARKER),
                ContentPart::text("<title>Acme</title>"),
                ContentPart::text("\n\nFORMAT"),
            ]
        );
    }

    #[test]
    fn test_identification_prompt_ss() {
        let parts = build_identification_prompt(&templates(InputMode::Ss), Some(&image()), "ignored").unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[2], ContentPart::Image(image()));
        assert!(parts.iter().all(|p| p.as_text() != Some("ignored")));
    }

    #[test]
    fn test_identification_prompt_both_order() {
        let parts = build_identification_prompt(&templates(InputMode::Both), Some(&image()), "html").unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[2], ContentPart::text("html"));
        assert_eq!(parts[3], ContentPart::Image(image()));
        assert_eq!(parts[4].as_text(), Some("\n\nFORMAT"));
    }

    #[test]
    fn test_identification_prompt_missing_image() {
        let result = build_identification_prompt(&templates(InputMode::Ss), None, "");
        assert!(matches!(result, Err(Error::MissingEvidence(_))));

        // html モードは画像不要
        assert!(build_identification_prompt(&templates(InputMode::Html), None, "x").is_ok());
    }

    #[test]
    fn test_brandcheck_prompt() {
        let parts = build_brandcheck_prompt(&templates(InputMode::Html).phase2_system, "https://example.com", "BrandA");
        assert_eq!(parts[0], ContentPart::text("CHECK"));
        assert_eq!(
            parts[1].as_text(),
            Some("Ground Truth: \"https://example.com\"\n\"Prediction:\"BrandA")
        );
    }

    #[test]
    fn test_load_missing_template() {
        let dir = std::env::temp_dir().join("brand-ai-missing-templates");
        std::fs::create_dir_all(&dir).unwrap();

        let result = PromptTemplates::load(&dir, InputMode::Html);
        assert!(matches!(result, Err(Error::Template(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_templates() {
        let dir = std::env::temp_dir().join("brand-ai-load-templates");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("phase1_system_both.txt"), "identify").unwrap();
        std::fs::write(dir.join("phase1_response_both.txt"), "{\"Brand\": \"...\"}").unwrap();
        std::fs::write(dir.join("phase2_system.txt"), "compare").unwrap();

        let loaded = PromptTemplates::load(&dir, InputMode::Both).unwrap();
        assert_eq!(loaded.phase1_system, "identify");
        assert_eq!(loaded.phase1_response_format, "\n\n{\"Brand\": \"...\"}");
        assert_eq!(loaded.phase2_system, "compare");
        assert_eq!(PromptTemplates::load_phase2_system(&dir).unwrap(), "compare");

        std::fs::remove_dir_all(&dir).ok();
    }
}
