//! モデル応答 → 結果レコード

use crate::analyzer::{ModelResponse, OutcomeKind};
use brand_ai_common::{parse_phase1_response, parse_phase2_response, Phase1Record, Phase2Record};

/// Phase1の応答を記録形式に変換
///
/// - テキストなし → Blocked/Error、Brand は空
/// - パース不能 → Error、応答テキストを RawResponse に残す
pub fn format_phase1(hash: &str, url: &str, response: &ModelResponse) -> (Phase1Record, OutcomeKind) {
    let (record, kind) = match response.answer() {
        None => (Phase1Record::blocked(hash, url), OutcomeKind::SafetyBlock),
        Some(text) => match parse_phase1_response(text) {
            Ok(answer) => (Phase1Record::answered(hash, answer.brand, url), OutcomeKind::Success),
            Err(_) => (Phase1Record::malformed(hash, url, text), OutcomeKind::MalformedResponse),
        },
    };

    (record.with_usage(response.usage), kind)
}

/// Phase2の応答を記録形式に変換（失敗時は BrandMatched=false, Error=true）
pub fn format_phase2(response: &ModelResponse) -> (Phase2Record, OutcomeKind) {
    let (record, kind) = match response.answer() {
        None => (Phase2Record::failed(None), OutcomeKind::SafetyBlock),
        Some(text) => match parse_phase2_response(text) {
            Ok(matched) => (Phase2Record::matched(matched), OutcomeKind::Success),
            Err(_) => (Phase2Record::failed(Some(text.to_string())), OutcomeKind::MalformedResponse),
        },
    };

    (record.with_usage(response.usage), kind)
}
