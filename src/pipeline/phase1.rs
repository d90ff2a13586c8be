use super::{format_phase1, Phase1Stats, Pipeline};
use crate::analyzer::{ModelError, ModelRequest, OutcomeKind};
use crate::error::Result;
use crate::scanner::{self, crop_encode_image};
use crate::store;
use brand_ai_common::{build_identification_prompt, Dataset, EncodedImage, InputMode};
use tracing::{debug, info, warn};

impl Pipeline<'_> {
    /// Phase1: ブランド識別
    ///
    /// 結果ファイルが既にあるモードは呼び出さない。
    pub async fn run_phase1(&self, dataset: Dataset) -> Result<Phase1Stats> {
        let modes = self.settings.modes.clone();
        let templates = self.load_templates(&modes)?;
        let samples = scanner::scan_dataset(&self.settings.input_dir, dataset)?;

        info!(dataset = %dataset, samples = samples.len(), model = self.client.name(), "Phase1 開始");

        let mut stats = Phase1Stats::default();
        let pb = self.progress_bar(samples.len(), dataset.to_string());

        for sample in &samples {
            pb.inc(1);

            if !sample.is_complete() {
                debug!(path = %sample.path.display(), "入力ファイルが揃っていないためスキップ");
                stats.incomplete += 1;
                continue;
            }

            let mut pending: Vec<InputMode> = Vec::new();
            for &mode in &modes {
                let output = self.layout.phase1_path(dataset, mode, &sample.brand, &sample.hash);
                if output.exists() {
                    pb.println(format!("[Skipping] Output already exists for hash: {} ({})", sample.hash, mode));
                    stats.already_done += 1;
                } else {
                    pending.push(mode);
                }
            }
            if pending.is_empty() {
                continue;
            }

            let html_info = match sample.load_html_info() {
                Ok(info) => info,
                Err(e) => {
                    warn!(path = %sample.html_info_path().display(), "[Warning] HTML情報を読めません。スキップ: {}", e);
                    stats.unreadable += 1;
                    continue;
                }
            };

            let image: Option<EncodedImage> = if pending.iter().any(|m| m.needs_image()) {
                match crop_encode_image(&sample.screenshot_path(), self.settings.image_limits) {
                    Ok(image) => Some(image),
                    Err(e) => {
                        warn!(path = %sample.path.display(), "[Warning] 画像処理に失敗。スキップ: {}", e);
                        stats.unreadable += 1;
                        continue;
                    }
                }
            } else {
                None
            };

            for mode in pending {
                let prompt = match build_identification_prompt(&templates[&mode], image.as_ref(), &html_info.brand_info) {
                    Ok(prompt) => prompt,
                    Err(e) => {
                        self.handle_failure(&ModelError::InvalidRequest(e.to_string()), &sample.hash, mode)
                            .await;
                        stats.failed += 1;
                        continue;
                    }
                };

                let request = ModelRequest::new(prompt).with_thinking_budget(self.settings.thinking_budget);

                let response = match self.client.generate(&request).await {
                    Ok(response) => response,
                    Err(e) => {
                        self.handle_failure(&e, &sample.hash, mode).await;
                        stats.failed += 1;
                        continue;
                    }
                };

                let (record, kind) = format_phase1(&sample.hash, &html_info.url, &response);
                if kind != OutcomeKind::Success {
                    debug!(hash = %sample.hash, %mode, ?kind, "エラーフラグ付きで記録");
                    stats.flagged += 1;
                }

                let output = self.layout.phase1_path(dataset, mode, &sample.brand, &sample.hash);
                store::write_record(&output, &record)?;
                stats.written += 1;
            }
        }

        pb.finish_and_clear();
        info!(
            dataset = %dataset,
            written = stats.written,
            flagged = stats.flagged,
            skipped = stats.already_done,
            failed = stats.failed,
            "Phase1 完了"
        );

        Ok(stats)
    }
}
