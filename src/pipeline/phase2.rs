use super::{format_phase2, Phase2Stats, Pipeline};
use crate::analyzer::{ModelRequest, OutcomeKind};
use crate::error::Result;
use crate::store;
use crate::summary::SummaryWriter;
use brand_ai_common::{build_brandcheck_prompt, Dataset, InputMode, PromptTemplates, SummaryRow};
use tracing::{debug, info, warn};

impl Pipeline<'_> {
    /// Phase2: 予測ブランドと正解URLの照合
    ///
    /// Error/Blocked の Phase1 結果は対象外。結果1件ごとにサマリーへ1行追記する。
    pub async fn run_phase2(&self, dataset: Dataset) -> Result<Phase2Stats> {
        let mut summary = SummaryWriter::open(&self.layout.summary_path(dataset))?;
        let mut stats = Phase2Stats::default();

        let brands = self.layout.phase1_brands(dataset)?;
        if brands.is_empty() {
            warn!(dataset = %dataset, "Phase1の結果にブランドフォルダがありません。Phase1の実行を確認してください");
            return Ok(stats);
        }

        let system = PromptTemplates::load_phase2_system(&self.settings.prompt_dir)?;
        info!(dataset = %dataset, brands = brands.len(), model = self.client.name(), "Phase2 開始");

        let pb = self.progress_bar(brands.len(), format!("Phase2 {}", dataset));

        for brand in &brands {
            pb.inc(1);

            for mode in InputMode::ALL {
                for input_path in self.layout.phase1_results(dataset, mode, brand)? {
                    let hash = store::hash_of(&input_path);

                    let output = self.layout.phase2_path(dataset, mode, brand, &hash);
                    if output.exists() {
                        pb.println(format!(
                            "[Skipping Phase 2] Output already exists for hash: {} in {}",
                            hash, mode
                        ));
                        stats.already_done += 1;
                        continue;
                    }

                    let phase1 = match store::read_phase1(&input_path) {
                        Ok(record) => record,
                        Err(e) => {
                            warn!(path = %input_path.display(), "[Warning] 壊れたPhase1結果: {}", e);
                            stats.broken += 1;
                            continue;
                        }
                    };

                    if !phase1.is_usable() {
                        stats.excluded += 1;
                        continue;
                    }

                    let prompt = build_brandcheck_prompt(&system, &phase1.url, &phase1.brand);
                    let request = ModelRequest::new(prompt);

                    let response = match self.client.generate(&request).await {
                        Ok(response) => response,
                        Err(e) => {
                            self.handle_failure(&e, &hash, mode).await;
                            stats.failed += 1;
                            continue;
                        }
                    };

                    let (record, kind) = format_phase2(&response);
                    if kind != OutcomeKind::Success {
                        debug!(hash = %hash, %mode, ?kind, "エラーフラグ付きで記録");
                        stats.flagged += 1;
                    }

                    store::write_record(&output, &record)?;
                    stats.written += 1;

                    let row = SummaryRow {
                        dataset: dataset.dir_name().to_string(),
                        input_mode: mode.as_str().to_string(),
                        brand: brand.clone(),
                        hash,
                        phase1_pred: phase1.brand,
                        phase2_matched: record.brand_matched,
                    };
                    // 追記失敗は警告のみ（summary --rebuild で復元）
                    match summary.append(&row) {
                        Ok(true) => stats.summary_rows += 1,
                        Ok(false) => {}
                        Err(e) => {
                            warn!(hash = %row.hash, %mode, "[Warning] サマリーに追記できません: {}", e);
                            stats.summary_failed += 1;
                        }
                    }
                }
            }
        }

        pb.finish_and_clear();
        info!(
            dataset = %dataset,
            written = stats.written,
            excluded = stats.excluded,
            skipped = stats.already_done,
            failed = stats.failed,
            summary = %summary.path().display(),
            "Phase2 完了"
        );

        Ok(stats)
    }
}
