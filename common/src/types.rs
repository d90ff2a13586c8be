//! 実験データの型定義
//!
//! CLIとテストで共有される型:
//! - InputMode / Dataset: 入力モードとデータセット
//! - HtmlInfo: サンプルの add_info.json
//! - Phase1Record: Phase1（ブランド識別）の出力
//! - Phase2Record: Phase2（ブランド照合）の出力
//! - SummaryRow: Phase2サマリーCSVの1行

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// モデルに渡す証拠の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// スクリーンショットのみ
    Ss,
    /// HTMLのブランド情報のみ
    Html,
    /// HTML + スクリーンショット
    Both,
}

impl InputMode {
    pub const ALL: [InputMode; 3] = [InputMode::Ss, InputMode::Html, InputMode::Both];

    /// 出力ディレクトリ名・テンプレート名に使う識別子
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Ss => "ss",
            InputMode::Html => "html",
            InputMode::Both => "both",
        }
    }

    pub fn needs_image(&self) -> bool {
        matches!(self, InputMode::Ss | InputMode::Both)
    }

    pub fn needs_html(&self) -> bool {
        matches!(self, InputMode::Html | InputMode::Both)
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ss" | "screenshot" => Ok(InputMode::Ss),
            "html" => Ok(InputMode::Html),
            "both" => Ok(InputMode::Both),
            _ => Err(format!("Unknown input mode: {}. Use ss, html, or both", s)),
        }
    }
}

/// 評価データセット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Benign,
    Phishing,
}

impl Dataset {
    /// 実行順（良性 → フィッシング）
    pub const ALL: [Dataset; 2] = [Dataset::Benign, Dataset::Phishing];

    /// 入出力ディレクトリ名
    pub fn dir_name(&self) -> &'static str {
        match self {
            Dataset::Benign => "MMLLM_Benign",
            Dataset::Phishing => "MMLLM_Phishing",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "benign" | "mmllm_benign" => Ok(Dataset::Benign),
            "phishing" | "mmllm_phishing" => Ok(Dataset::Phishing),
            _ => Err(format!("Unknown dataset: {}. Use benign or phishing", s)),
        }
    }
}

/// サンプルディレクトリの add_info.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlInfo {
    /// HTMLから抽出したブランド関連テキスト
    #[serde(rename = "html_brand_info")]
    pub brand_info: String,

    /// 収集元URL（Phase2の正解データ）
    #[serde(rename = "Url")]
    pub url: String,
}

impl HtmlInfo {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// APIのトークン使用量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_token_count: u32,
    #[serde(default)]
    pub thoughts_token_count: u32,
    pub candidates_token_count: u32,
    pub total_token_count: u32,
}

/// Phase1の出力: 予測ブランド
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Phase1Record {
    pub hash: String,

    pub brand: String,

    /// 安全フィルタ等で応答テキストが返らなかった
    #[serde(default)]
    pub blocked: bool,

    pub error: bool,

    /// Phase2の正解データ（必須）
    pub url: String,

    /// パース失敗時の応答テキスト
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,

    #[serde(flatten)]
    pub usage: Option<TokenUsage>,
}

impl Phase1Record {
    /// 正常応答
    pub fn answered(hash: impl Into<String>, brand: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            brand: brand.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// 応答テキストなし（ブロック）
    pub fn blocked(hash: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            url: url.into(),
            blocked: true,
            error: true,
            ..Default::default()
        }
    }

    /// 応答テキストはあるがパースできない
    pub fn malformed(hash: impl Into<String>, url: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            url: url.into(),
            error: true,
            raw_response: Some(raw.into()),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    /// Phase2の入力にできるか
    pub fn is_usable(&self) -> bool {
        !self.error && !self.blocked
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Phase2の出力: 予測ブランドと正解URLの一致判定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Phase2Record {
    pub brand_matched: bool,

    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,

    #[serde(flatten)]
    pub usage: Option<TokenUsage>,
}

impl Phase2Record {
    pub fn matched(brand_matched: bool) -> Self {
        Self {
            brand_matched,
            ..Default::default()
        }
    }

    /// 応答なし・パース失敗
    pub fn failed(raw: Option<String>) -> Self {
        Self {
            brand_matched: false,
            error: true,
            raw_response: raw.filter(|r| !r.is_empty()),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Phase2サマリーCSVの1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryRow {
    pub dataset: String,
    pub input_mode: String,
    pub brand: String,
    pub hash: String,
    pub phase1_pred: String,
    #[serde(
        serialize_with = "serialize_py_bool",
        deserialize_with = "deserialize_py_bool"
    )]
    pub phase2_matched: bool,
}

/// CSVヘッダー
pub const SUMMARY_HEADER: [&str; 6] =
    ["Dataset", "InputMode", "Brand", "Hash", "Phase1Pred", "Phase2Matched"];

impl SummaryRow {
    /// 重複判定キー (Dataset, InputMode, Brand, Hash)
    pub fn key(&self) -> (String, String, String, String) {
        (
            self.dataset.clone(),
            self.input_mode.clone(),
            self.brand.clone(),
            self.hash.clone(),
        )
    }
}

// 既存の集計スクリプトは True/False 表記を前提にしている
fn serialize_py_bool<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

fn deserialize_py_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_bool_text(&s).map_err(serde::de::Error::custom)
}

/// "True"/"false"/"1" などを bool に変換
pub fn parse_bool_text(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(Error::Parse(format!("boolではありません: {}", other))),
    }
}
