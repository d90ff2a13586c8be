use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use brand_ai_common::{Dataset, InputMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brand-ai")]
#[command(about = "フィッシングサイトのブランド識別・照合バッチ", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ
    #[arg(long, default_value = "gemini", global = true)]
    pub provider: AiProvider,

    /// 入力データのルート（設定ファイルより優先）
    #[arg(long, global = true)]
    pub input_dir: Option<PathBuf>,

    /// 出力先のルート
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// プロンプトテンプレートのディレクトリ
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Phase1 → Phase2 を一括実行
    Run {
        /// 対象データセット (benign/phishing)。省略時は両方
        #[arg(short, long = "dataset")]
        datasets: Vec<Dataset>,
    },

    /// Phase1: ブランド識別
    Phase1 {
        /// 対象データセット (benign/phishing)
        #[arg(short, long)]
        dataset: Dataset,

        /// 入力モード (ss/html/both)。省略時は全モード
        #[arg(short, long = "mode")]
        modes: Vec<InputMode>,
    },

    /// Phase2: ブランド照合
    Phase2 {
        /// 対象データセット (benign/phishing)
        #[arg(short, long)]
        dataset: Dataset,
    },

    /// サマリーCSVの確認・再生成
    Summary {
        /// 対象データセット (benign/phishing)
        #[arg(short, long)]
        dataset: Dataset,

        /// Phase2の結果ファイルから作り直す
        #[arg(long)]
        rebuild: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// APIキーを対話入力
        #[arg(long)]
        prompt_api_key: bool,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 未指定ならすべてのデータセット（benign → phishing）
pub fn resolve_datasets(datasets: Vec<Dataset>) -> Vec<Dataset> {
    if datasets.is_empty() {
        Dataset::ALL.to_vec()
    } else {
        datasets
    }
}
