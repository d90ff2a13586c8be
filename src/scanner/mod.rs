mod screenshot;

pub use screenshot::{crop_encode_image, ImageLimits};

use crate::error::{BrandAiError, Result};
use brand_ai_common::{Dataset, HtmlInfo};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SCREENSHOT_FILE: &str = "screenshot_aft.png";
pub const HTML_INFO_FILE: &str = "add_info.json";

/// 1サンプル = {dataset}/{brand}/{hash}/ ディレクトリ
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDir {
    pub path: PathBuf,
    pub brand: String,
    pub hash: String,
}

impl SampleDir {
    pub fn screenshot_path(&self) -> PathBuf {
        self.path.join(SCREENSHOT_FILE)
    }

    pub fn html_info_path(&self) -> PathBuf {
        self.path.join(HTML_INFO_FILE)
    }

    /// スクリーンショットとHTML情報の両方が揃っているか
    pub fn is_complete(&self) -> bool {
        self.screenshot_path().is_file() && self.html_info_path().is_file()
    }

    pub fn load_html_info(&self) -> Result<HtmlInfo> {
        let content = std::fs::read_to_string(self.html_info_path())?;
        Ok(HtmlInfo::from_json(&content)?)
    }
}

/// データセット直下の {brand}/{hash}/ を列挙（パス順）
pub fn scan_dataset(input_dir: &Path, dataset: Dataset) -> Result<Vec<SampleDir>> {
    let root = input_dir.join(dataset.dir_name());
    if !root.is_dir() {
        return Err(BrandAiError::FolderNotFound(root.display().to_string()));
    }

    let mut samples = Vec::new();

    for entry in WalkDir::new(&root)
        .min_depth(2)
        .max_depth(2)  // brand/hash のみ
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let hash = file_name_of(path);
        let brand = path.parent().map(file_name_of).unwrap_or_default();

        samples.push(SampleDir {
            path: path.to_path_buf(),
            brand,
            hash,
        });
    }

    samples.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(samples)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn make_sample(root: &Path, brand: &str, hash: &str, with_ss: bool, with_html: bool) -> PathBuf {
        let dir = root.join("MMLLM_Benign").join(brand).join(hash);
        fs::create_dir_all(&dir).unwrap();
        if with_ss {
            fs::write(dir.join(SCREENSHOT_FILE), b"png").unwrap();
        }
        if with_html {
            fs::write(
                dir.join(HTML_INFO_FILE),
                r#"{"html_brand_info": "Acme", "Url": "https://acme.com"}"#,
            )
            .unwrap();
        }
        dir
    }

    #[test]
    fn test_scan_dataset_not_found() {
        let dir = tempdir().unwrap();
        let result = scan_dataset(dir.path(), Dataset::Phishing);
        assert!(matches!(result, Err(BrandAiError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_dataset_sorted() {
        let dir = tempdir().unwrap();
        make_sample(dir.path(), "brandB", "h2", true, true);
        make_sample(dir.path(), "brandA", "h9", true, true);
        make_sample(dir.path(), "brandA", "h1", true, true);
        // ブランド直下のファイルは無視
        fs::write(dir.path().join("MMLLM_Benign").join("brandA").join("notes.txt"), "x").unwrap();

        let samples = scan_dataset(dir.path(), Dataset::Benign).unwrap();
        let ids: Vec<(&str, &str)> = samples.iter().map(|s| (s.brand.as_str(), s.hash.as_str())).collect();
        assert_eq!(ids, vec![("brandA", "h1"), ("brandA", "h9"), ("brandB", "h2")]);
    }

    #[test]
    fn test_sample_completeness() {
        let dir = tempdir().unwrap();
        make_sample(dir.path(), "brandA", "full", true, true);
        make_sample(dir.path(), "brandA", "no_ss", false, true);
        make_sample(dir.path(), "brandA", "no_html", true, false);

        let samples = scan_dataset(dir.path(), Dataset::Benign).unwrap();
        let complete: Vec<&str> = samples
            .iter()
            .filter(|s| s.is_complete())
            .map(|s| s.hash.as_str())
            .collect();
        assert_eq!(complete, vec!["full"]);
    }

    #[test]
    fn test_load_html_info() {
        let dir = tempdir().unwrap();
        let path = make_sample(dir.path(), "brandA", "h1", false, true);
        let sample = SampleDir {
            path,
            brand: "brandA".into(),
            hash: "h1".into(),
        };

        let info = sample.load_html_info().unwrap();
        assert_eq!(info.brand_info, "Acme");
        assert_eq!(info.url, "https://acme.com");
    }
}
