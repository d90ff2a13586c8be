//! 結果ファイルの配置
//!
//! 出力ファイルの有無が「処理済み」の唯一の目印になる。
//! 書き込みは一時ファイル経由で行い、途中で止まっても壊れたファイルを残さない。

use crate::ai_provider::AiProvider;
use crate::error::Result;
use brand_ai_common::{Dataset, InputMode, Phase1Record, Phase2Record};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE_NAME: &str = "Phase2_Res_Summary.csv";

/// {output_dir}/{dataset}/Phase{1,2}_{provider}/{mode}/{brand}/{hash}.json
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    provider: AiProvider,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, provider: AiProvider) -> Self {
        Self {
            root: root.into(),
            provider,
        }
    }

    pub fn phase1_dir(&self, dataset: Dataset) -> PathBuf {
        self.root
            .join(dataset.dir_name())
            .join(format!("Phase1_{}", self.provider.dir_label()))
    }

    pub fn phase2_dir(&self, dataset: Dataset) -> PathBuf {
        self.root
            .join(dataset.dir_name())
            .join(format!("Phase2_{}", self.provider.dir_label()))
    }

    pub fn phase1_brand_dir(&self, dataset: Dataset, mode: InputMode, brand: &str) -> PathBuf {
        self.phase1_dir(dataset).join(mode.as_str()).join(brand)
    }

    pub fn phase1_path(&self, dataset: Dataset, mode: InputMode, brand: &str, hash: &str) -> PathBuf {
        self.phase1_brand_dir(dataset, mode, brand)
            .join(format!("{}.json", hash))
    }

    pub fn phase2_path(&self, dataset: Dataset, mode: InputMode, brand: &str, hash: &str) -> PathBuf {
        self.phase2_dir(dataset)
            .join(mode.as_str())
            .join(brand)
            .join(format!("{}.json", hash))
    }

    pub fn summary_path(&self, dataset: Dataset) -> PathBuf {
        self.phase2_dir(dataset).join(SUMMARY_FILE_NAME)
    }

    /// Phase1結果に現れるブランド名（入力モード名のディレクトリ配下のみ、昇順・重複なし）
    pub fn phase1_brands(&self, dataset: Dataset) -> Result<Vec<String>> {
        let mut brands = BTreeSet::new();

        for mode in InputMode::ALL {
            let mode_dir = self.phase1_dir(dataset).join(mode.as_str());
            if !mode_dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&mode_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    brands.insert(entry.file_name().to_string_lossy().to_string());
                }
            }
        }

        Ok(brands.into_iter().collect())
    }

    /// ブランドディレクトリ内の Phase1 結果 (*.json) をファイル名順で返す
    pub fn phase1_results(&self, dataset: Dataset, mode: InputMode, brand: &str) -> Result<Vec<PathBuf>> {
        list_json_files(&self.phase1_brand_dir(dataset, mode, brand))
    }

    pub fn phase2_results(&self, dataset: Dataset, mode: InputMode, brand: &str) -> Result<Vec<PathBuf>> {
        list_json_files(&self.phase2_dir(dataset).join(mode.as_str()).join(brand))
    }
}

/// ディレクトリ直下の *.json（なければ空）
pub fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// "abc.json" → "abc"
pub fn hash_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// 結果をJSONで保存（親ディレクトリも作成）
pub fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(record)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn read_phase1(path: &Path) -> Result<Phase1Record> {
    let content = fs::read_to_string(path)?;
    Ok(Phase1Record::from_json(&content)?)
}

pub fn read_phase2(path: &Path) -> Result<Phase2Record> {
    let content = fs::read_to_string(path)?;
    Ok(Phase2Record::from_json(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("/out", AiProvider::Gemini);
        assert_eq!(
            layout.phase1_path(Dataset::Benign, InputMode::Html, "brandA", "hash123"),
            PathBuf::from("/out/MMLLM_Benign/Phase1_Gemini/html/brandA/hash123.json")
        );
        assert_eq!(
            layout.phase2_path(Dataset::Phishing, InputMode::Both, "brandA", "h"),
            PathBuf::from("/out/MMLLM_Phishing/Phase2_Gemini/both/brandA/h.json")
        );
        assert_eq!(
            layout.summary_path(Dataset::Benign),
            PathBuf::from("/out/MMLLM_Benign/Phase2_Gemini/Phase2_Res_Summary.csv")
        );
    }

    #[test]
    fn test_phase1_brands_ignores_unknown_modes() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), AiProvider::Gemini);
        let phase1 = layout.phase1_dir(Dataset::Benign);

        fs::create_dir_all(phase1.join("html").join("brandB")).unwrap();
        fs::create_dir_all(phase1.join("ss").join("brandA")).unwrap();
        fs::create_dir_all(phase1.join("both").join("brandB")).unwrap();
        fs::create_dir_all(phase1.join("old_run").join("brandZ")).unwrap();

        let brands = layout.phase1_brands(Dataset::Benign).unwrap();
        assert_eq!(brands, vec!["brandA".to_string(), "brandB".to_string()]);
    }

    #[test]
    fn test_phase1_brands_empty() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), AiProvider::Gemini);
        assert!(layout.phase1_brands(Dataset::Phishing).unwrap().is_empty());
    }

    #[test]
    fn test_write_and_read_record() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), AiProvider::Gemini);
        let path = layout.phase1_path(Dataset::Benign, InputMode::Ss, "brandA", "h1");

        let record = Phase1Record::answered("h1", "BrandA", "https://a.com");
        write_record(&path, &record).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(read_phase1(&path).unwrap(), record);
    }

    #[test]
    fn test_list_json_files_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json.tmp"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = list_json_files(dir.path()).unwrap();
        let hashes: Vec<String> = files.iter().map(|p| hash_of(p)).collect();
        assert_eq!(hashes, vec!["a", "b"]);
    }
}
