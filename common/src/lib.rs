//! Brand AI Common Library
//!
//! フィッシング検知実験（ブランド識別・照合）で共有される型とユーティリティ

pub mod types;
pub mod error;
pub mod parser;
pub mod prompts;

pub use types::{
    parse_bool_text, Dataset, HtmlInfo, InputMode, Phase1Record, Phase2Record, SummaryRow,
    TokenUsage, SUMMARY_HEADER,
};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_phase1_response, parse_phase2_response, Phase1Answer};
pub use prompts::{
    build_brandcheck_prompt, build_identification_prompt, ContentPart, EncodedImage,
    PromptTemplates, RESOURCE_MARKER,
};
