//! ログ初期化
//!
//! `tracing` のサブスクライバを設定する。RUST_LOG があればそれを優先し、
//! なければ `--verbose` で debug、通常は info を出力する。

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// 既定のフィルタ指定
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("brand_ai_rust={level},brand_ai_common={level},warn")
}

/// 一度だけ初期化する（2回目以降は無視）
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert!(default_directives(false).starts_with("brand_ai_rust=info"));
        assert!(default_directives(true).contains("brand_ai_common=debug"));
    }

    #[test]
    fn test_init_twice() {
        init_logging(false);
        init_logging(true);
        tracing::info!("logging initialized");
    }
}
