use brand_ai_common::{build_brandcheck_prompt, parse_phase2_response};
use brand_ai_rust::ai_provider::AiProvider;
use brand_ai_rust::analyzer::{GeminiClient, ModelClient, ModelRequest};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[tokio::test]
async fn gemini_brandcheck_integration() {
    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            return;
        }
    };

    let system = r#"You compare a predicted brand name with the URL the page was collected from.
Return ONLY a JSON object exactly in this format:
{"BrandMatched": true}
or
{"BrandMatched": false}
"#;

    let client = GeminiClient::new(
        api_key,
        AiProvider::Gemini.default_model(),
        GEMINI_API_BASE,
        Duration::from_secs(60),
    )
    .expect("client build failed");

    let request = ModelRequest::new(build_brandcheck_prompt(system, "https://www.google.com", "Google"));
    let response = client.generate(&request).await.expect("request failed");

    let text = response.answer().expect("response text missing");
    let matched = parse_phase2_response(text).expect("failed to parse phase2 response");
    assert!(matched);
    assert!(response.usage.is_some());
}
