//! APIレスポンスパーサー
//!
//! モデルの応答テキストからJSONオブジェクトを抽出し、
//! Phase1（ブランド名）/Phase2（一致判定）の結果をパースする

use crate::error::{Error, Result};
use crate::types::parse_bool_text;
use regex::Regex;
use serde_json::{Map, Value};

/// Phase1の応答から取り出した値
#[derive(Debug, Clone, PartialEq)]
pub struct Phase1Answer {
    pub brand: String,
}

const BRAND_KEYS: &[&str] = &["Brand", "brand", "BrandName", "brand_name"];
const MATCHED_KEYS: &[&str] = &["BrandMatched", "brand_matched", "brandMatched", "Matched", "matched"];

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use brand_ai_common::extract_json;
///
/// let response = "Answer: {\"Brand\": \"Acme\"}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"Brand\": \"Acme\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // 生の {...} を探す
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// Phase1レスポンスをパース
///
/// # Returns
/// * `Ok(Phase1Answer)` - ブランド名（null は空文字）
/// * `Err` - JSONもBrandキーも見つからない
pub fn parse_phase1_response(response: &str) -> Result<Phase1Answer> {
    if let Some(map) = json_object(response) {
        if let Some(value) = find_key(&map, BRAND_KEYS) {
            let brand = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            return Ok(Phase1Answer { brand });
        }
        return Err(Error::Parse("Brandキーがありません".into()));
    }

    // 壊れたJSON（末尾カンマ等）でもキーが読めれば採用
    lazy_static::lazy_static! {
        static ref BRAND_RE: Regex =
            Regex::new(r#""(?:[Bb]rand|BrandName|brand_name)"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    }
    BRAND_RE
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| Phase1Answer {
            brand: m.as_str().replace("\\\"", "\"").trim().to_string(),
        })
        .ok_or_else(|| Error::Parse("Phase1 応答にブランドがありません".into()))
}

/// Phase2レスポンスをパース
///
/// # Returns
/// * `Ok(bool)` - BrandMatched の値
/// * `Err` - 判定値が見つからない
pub fn parse_phase2_response(response: &str) -> Result<bool> {
    if let Some(map) = json_object(response) {
        return match find_key(&map, MATCHED_KEYS) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => parse_bool_text(s),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(Error::Parse(format!("BrandMatched が不正: {}", n))),
            },
            Some(other) => Err(Error::Parse(format!("BrandMatched が不正: {}", other))),
            None => Err(Error::Parse("BrandMatchedキーがありません".into())),
        };
    }

    lazy_static::lazy_static! {
        static ref MATCHED_RE: Regex =
            Regex::new(r#"(?i)"(?:brand_?matched|matched)"\s*:\s*"?(true|false)"#).unwrap();
    }
    MATCHED_RE
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().eq_ignore_ascii_case("true"))
        .ok_or_else(|| Error::Parse("Phase2 応答に判定がありません".into()))
}

fn json_object(response: &str) -> Option<Map<String, Value>> {
    let json_str = extract_json(response).ok()?;
    match serde_json::from_str::<Value>(json_str.trim()).ok()? {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.into_iter().find_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        }),
        _ => None,
    }
}

fn find_key<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}
