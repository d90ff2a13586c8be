use anyhow::Context;
use brand_ai_rust::{analyzer, cli, config, logging, pipeline, store, summary};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use pipeline::{Pipeline, PipelineSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut config = Config::load().context("設定ファイルを読み込めません")?;
    config.apply_overrides(cli.input_dir.clone(), cli.output_dir.clone(), cli.prompt_dir.clone());

    let provider = cli.provider;

    match cli.command {
        Commands::Run { datasets } => {
            println!("🔍 brand-ai - 一括処理\n");

            let client = analyzer::create_client(provider, &config)?;
            let pipeline = Pipeline::new(client.as_ref(), PipelineSettings::from_config(&config, provider));

            for dataset in cli::resolve_datasets(datasets) {
                println!("[Phase1] {}", dataset);
                let stats = pipeline.run_phase1(dataset).await?;
                println!(
                    "✔ 書き込み {}件（エラー記録 {}件）/ 既存 {}件 / 失敗 {}件\n",
                    stats.written, stats.flagged, stats.already_done, stats.failed
                );

                println!("[Phase2] {}", dataset);
                let stats = pipeline.run_phase2(dataset).await?;
                println!(
                    "✔ 書き込み {}件 / 対象外 {}件 / 既存 {}件 / 失敗 {}件 / サマリー追記 {}行\n",
                    stats.written, stats.excluded, stats.already_done, stats.failed, stats.summary_rows
                );
            }

            println!("✅ 完了");
        }

        Commands::Phase1 { dataset, modes } => {
            let client = analyzer::create_client(provider, &config)?;
            let settings = PipelineSettings::from_config(&config, provider).with_modes(modes);
            let pipeline = Pipeline::new(client.as_ref(), settings);

            println!("[Phase1] {}", dataset);
            let stats = pipeline.run_phase1(dataset).await?;
            println!(
                "✔ 書き込み {}件（エラー記録 {}件）/ 既存 {}件 / 入力不足 {}件 / 読込失敗 {}件 / 失敗 {}件",
                stats.written, stats.flagged, stats.already_done, stats.incomplete, stats.unreadable, stats.failed
            );
        }

        Commands::Phase2 { dataset } => {
            let client = analyzer::create_client(provider, &config)?;
            let pipeline = Pipeline::new(client.as_ref(), PipelineSettings::from_config(&config, provider));

            println!("[Phase2] {}", dataset);
            let stats = pipeline.run_phase2(dataset).await?;
            println!(
                "✔ 書き込み {}件 / 対象外 {}件 / 破損 {}件 / 既存 {}件 / 失敗 {}件 / サマリー追記 {}行",
                stats.written, stats.excluded, stats.broken, stats.already_done, stats.failed, stats.summary_rows
            );
            if stats.summary_failed > 0 {
                println!("⚠ サマリー追記失敗 {}行: `brand-ai summary --dataset {} --rebuild` で再生成してください", stats.summary_failed, dataset);
            }
        }

        Commands::Summary { dataset, rebuild } => {
            let layout = store::OutputLayout::new(config.output_dir.clone(), provider);
            let path = layout.summary_path(dataset);

            if rebuild {
                let rows = summary::rebuild(&layout, dataset)?;
                println!("✔ サマリーを再生成しました: {} ({}行)", path.display(), rows);
            } else if path.exists() {
                let rows = summary::read_rows(&path)?;
                let matched = rows.iter().filter(|r| r.phase2_matched).count();
                println!("サマリー:");
                println!("  パス: {}", path.display());
                println!("  行数: {}", rows.len());
                println!("  一致: {}", matched);
            } else {
                println!("サマリーが存在しません: {}", path.display());
            }
        }

        Commands::Config { set_api_key, prompt_api_key, show } => {
            // 上書き前の設定に保存する
            let mut stored = Config::load()?;

            if let Some(key) = set_api_key {
                stored.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if prompt_api_key {
                let key: String = dialoguer::Password::new()
                    .with_prompt("Gemini APIキー")
                    .interact()
                    .context("APIキーを入力できません")?;
                stored.set_api_key(key.trim().to_string())?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  API: {}", config.api_base);
                println!("  入力: {}", config.input_dir.display());
                println!("  出力: {}", config.output_dir.display());
                println!("  テンプレート: {}", config.prompt_dir.display());
                println!("  待機秒数: {}", config.quota_wait_seconds);
                println!("  最大画像サイズ: {}x{}", config.max_image_width, config.max_image_height);
                println!(
                    "  APIキー: {}",
                    if stored.get_api_key(provider).is_ok() { "設定済み" } else { "未設定" }
                );
            }
        }
    }

    Ok(())
}
