//! Phase2サマリーCSV
//!
//! Phase2の結果1件につき1行を追記する。既存の (Dataset, InputMode, Brand, Hash)
//! と同じキーの行は追記しない。

use crate::error::Result;
use crate::store::{self, OutputLayout};
use brand_ai_common::{Dataset, InputMode, SummaryRow, SUMMARY_HEADER};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type RowKey = (String, String, String, String);

pub struct SummaryWriter {
    path: PathBuf,
    keys: HashSet<RowKey>,
}

impl SummaryWriter {
    /// ファイルがない（または空）ならヘッダーだけ書いて作成、あれば既存キーを読み込む
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let has_content = path.exists() && fs::metadata(path)?.len() > 0;

        let mut keys = HashSet::new();
        if has_content {
            for row in read_rows(path)? {
                keys.insert(row.key());
            }
            debug!(rows = keys.len(), path = %path.display(), "既存サマリーを読み込み");
        } else {
            let mut writer = WriterBuilder::new()
                .terminator(Terminator::Any(b'\n'))
                .from_path(path)?;
            writer.write_record(SUMMARY_HEADER)?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            keys,
        })
    }

    /// 1行追記。同じキーが既にあれば false
    pub fn append(&mut self, row: &SummaryRow) -> Result<bool> {
        let key = row.key();
        if self.keys.contains(&key) {
            warn!(
                dataset = %row.dataset,
                mode = %row.input_mode,
                brand = %row.brand,
                hash = %row.hash,
                "サマリーに同じ行があるため追記しません"
            );
            return Ok(false);
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;

        self.keys.insert(key);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// サマリーCSVの全行（壊れた行は警告して読み飛ばす）
pub fn read_rows(path: &Path) -> Result<Vec<SummaryRow>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut rows = Vec::new();

    for (line, result) in reader.deserialize::<SummaryRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!(line = line + 2, error = %e, "サマリーの行を読めません"),
        }
    }

    Ok(rows)
}

/// Phase2の結果ファイルからサマリーを作り直す
///
/// 既存のCSVは Phase2_Res_Summary.{日時}.csv.bak に退避する。
/// 並びは Phase2 の処理順（ブランド → 入力モード → ハッシュ）。
pub fn rebuild(layout: &OutputLayout, dataset: Dataset) -> Result<usize> {
    let path = layout.summary_path(dataset);

    if path.exists() {
        let backup = backup_path(&path);
        fs::rename(&path, &backup)?;
        info!(backup = %backup.display(), "既存サマリーを退避");
    }

    let mut writer = SummaryWriter::open(&path)?;
    let mut written = 0;

    for brand in layout.phase1_brands(dataset)? {
        for mode in InputMode::ALL {
            for result_path in layout.phase2_results(dataset, mode, &brand)? {
                let hash = store::hash_of(&result_path);

                let phase2 = match store::read_phase2(&result_path) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(path = %result_path.display(), error = %e, "Phase2結果を読めません");
                        continue;
                    }
                };

                let phase1_pred = store::read_phase1(&layout.phase1_path(dataset, mode, &brand, &hash))
                    .map(|r| r.brand)
                    .unwrap_or_default();

                let row = SummaryRow {
                    dataset: dataset.dir_name().to_string(),
                    input_mode: mode.as_str().to_string(),
                    brand: brand.clone(),
                    hash,
                    phase1_pred,
                    phase2_matched: phase2.brand_matched,
                };
                if writer.append(&row)? {
                    written += 1;
                }
            }
        }
    }

    Ok(written)
}

/// 既存の退避ファイルと重ならない名前（ミリ秒、同名があれば連番）
fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%3f");
    let mut backup = path.with_file_name(format!("Phase2_Res_Summary.{}.csv.bak", stamp));

    let mut n = 1;
    while backup.exists() {
        backup = path.with_file_name(format!("Phase2_Res_Summary.{}-{}.csv.bak", stamp, n));
        n += 1;
    }
    backup
}
