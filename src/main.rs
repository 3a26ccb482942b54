// ghostpen CLI - single conversions, batch runs, and preset management

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use ghostpen_lib::batch::{estimate_usage, BatchConfig, BatchOrchestrator};
use ghostpen_lib::client::OpenAiClient;
use ghostpen_lib::config::Config;
use ghostpen_lib::engine::ConversionEngine;
use ghostpen_lib::presets::{parse_business_document, PresetStore};
use ghostpen_lib::worklist::parse_work_list;
use ghostpen_lib::BusinessProfile;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ghostpen",
    version,
    about = "Ghost-writes blog posts in the style of a sample post for different businesses"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one source post for one business
    Convert {
        /// Source blog post to mirror the style of
        #[arg(long)]
        source: PathBuf,
        /// Preset filename to load the business profile from
        #[arg(long)]
        preset: Option<String>,
        /// Business-info document to parse the profile from instead
        #[arg(long)]
        info: Option<PathBuf>,
        /// SEO keyword for this post
        #[arg(long)]
        keyword: String,
        /// Output file (defaults to `{business}_{keyword}.txt`)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Preset directory
        #[arg(long, default_value = "업체정보")]
        preset_dir: PathBuf,
        /// Fixed random seed for reproducible feature selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a CSV work list across one or more businesses
    Batch {
        /// Work-list CSV (원본파일경로, 키워드, 프리셋파일)
        #[arg(long)]
        worklist: PathBuf,
        /// Preset filename used for rows without their own preset reference
        #[arg(long)]
        preset: Option<String>,
        /// Root directory for run output
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
        /// Preset directory
        #[arg(long, default_value = "업체정보")]
        preset_dir: PathBuf,
        /// Attempts per item before it is terminally failed
        #[arg(long, default_value_t = 3)]
        max_retries: u32,
        /// Throttle between items, in seconds
        #[arg(long, default_value_t = 2)]
        api_delay: u64,
        /// Fixed random seed for reproducible feature selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Inspect and import business presets
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },
    /// Estimate API usage for a work list
    Estimate {
        #[arg(long)]
        worklist: PathBuf,
    },
}

#[derive(Subcommand)]
enum PresetAction {
    /// List stored presets
    List {
        #[arg(long, default_value = "업체정보")]
        preset_dir: PathBuf,
    },
    /// Print one preset as JSON
    Show {
        name: String,
        #[arg(long, default_value = "업체정보")]
        preset_dir: PathBuf,
    },
    /// Parse a business-info document and store it as a preset
    Import {
        /// Business-info document (`**섹션**` delimited)
        #[arg(long)]
        info: PathBuf,
        /// Preset filename (defaults to `{business}.json`)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "업체정보")]
        preset_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert {
            source,
            preset,
            info,
            keyword,
            output,
            preset_dir,
            seed,
        } => run_convert(source, preset, info, keyword, output, preset_dir, seed),
        Command::Batch {
            worklist,
            preset,
            output_dir,
            preset_dir,
            max_retries,
            api_delay,
            seed,
        } => run_batch(
            worklist,
            preset,
            output_dir,
            preset_dir,
            max_retries,
            api_delay,
            seed,
        ),
        Command::Preset { action } => run_preset(action),
        Command::Estimate { worklist } => run_estimate(worklist),
    }
}

fn load_config(seed: Option<u64>) -> Result<Config> {
    let mut config = Config::load().map_err(|e| anyhow!(e))?;
    if seed.is_some() {
        config.feature_seed = seed;
    }
    if config.api_key.trim().is_empty() {
        bail!(
            "no API key configured: set GHOSTPEN_API_KEY / OPENAI_API_KEY or add it to {}",
            Config::default_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the config file".to_string())
        );
    }
    Ok(config)
}

fn resolve_profile(
    preset: Option<String>,
    info: Option<PathBuf>,
    preset_dir: &PathBuf,
) -> Result<BusinessProfile> {
    match (preset, info) {
        (Some(name), _) => {
            let store = PresetStore::new(preset_dir);
            store
                .load(&name)
                .map_err(|e| anyhow!("failed to load preset: {}", e))
        }
        (None, Some(info_path)) => {
            let content = std::fs::read_to_string(&info_path).with_context(|| {
                format!("failed to read business info '{}'", info_path.display())
            })?;
            parse_business_document(&content)
                .map_err(|e| anyhow!("failed to parse business info: {}", e))
        }
        (None, None) => bail!("either --preset or --info is required"),
    }
}

fn run_convert(
    source: PathBuf,
    preset: Option<String>,
    info: Option<PathBuf>,
    keyword: String,
    output: Option<PathBuf>,
    preset_dir: PathBuf,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(seed)?;
    let profile = resolve_profile(preset, info, &preset_dir)?.with_keyword(keyword.clone());

    let source_text = std::fs::read_to_string(&source)
        .with_context(|| format!("failed to read source file '{}'", source.display()))?;

    let client = OpenAiClient::new(config.api_key.clone());
    let mut engine = ConversionEngine::new(config, Box::new(client));
    let outcome = engine
        .convert(&source_text, &profile)
        .map_err(|e| anyhow!("conversion failed: {}", e))?;

    let output_path =
        output.unwrap_or_else(|| PathBuf::from(format!("{}_{}.txt", profile.name, keyword)));
    std::fs::write(&output_path, outcome.document())
        .with_context(|| format!("failed to write result to '{}'", output_path.display()))?;

    println!("변환 완료: {}", output_path.display());
    if let Some(title) = &outcome.title {
        println!("제목: {}", title);
    }
    println!(
        "글자수: {}자 (원본 대비 {}자 차이{})",
        outcome.validation.char_count,
        outcome.validation.char_deviation,
        if outcome.validation.length_ok { "" } else { ", 허용 범위 초과" }
    );
    println!(
        "키워드 출현: {}회{}",
        outcome.validation.keyword_total,
        if outcome.validation.keyword_ok { "" } else { " (권장 범위 밖)" }
    );
    if outcome.validation.has_repetition {
        println!(
            "경고: 반복 문장 {}개 발견",
            outcome.validation.repeated_sentences.len()
        );
    }
    Ok(())
}

fn run_batch(
    worklist: PathBuf,
    preset: Option<String>,
    output_dir: PathBuf,
    preset_dir: PathBuf,
    max_retries: u32,
    api_delay: u64,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(seed)?;
    let mut items = parse_work_list(&worklist).map_err(|e| anyhow!(e))?;
    if items.is_empty() {
        bail!("work list '{}' contains no usable rows", worklist.display());
    }

    let estimate = estimate_usage(items.len());
    log::info!(
        "[Batch] estimated usage: {} item(s) x 3,500 tokens = {} tokens (~${:.2})",
        estimate.items,
        estimate.tokens,
        estimate.estimated_usd
    );

    // The default profile backs rows without a preset reference and rows
    // whose preset cannot be loaded: --preset wins, else the first row's
    // preset reference
    let store = PresetStore::new(&preset_dir);
    let default_profile = match preset.or_else(|| items[0].preset_ref.clone()) {
        Some(name) => store
            .load(&name)
            .map_err(|e| anyhow!("failed to load default preset: {}", e))?,
        None => bail!("no default business profile: pass --preset or reference one in the work list"),
    };

    let client = OpenAiClient::new(config.api_key.clone());
    let engine = ConversionEngine::new(config, Box::new(client));
    let batch_config = BatchConfig {
        output_base_dir: output_dir,
        preset_dir,
        max_retries,
        api_delay_secs: api_delay,
        ..Default::default()
    };
    let mut orchestrator = BatchOrchestrator::new(batch_config, engine);

    ghostpen_lib::shutdown::register_signal_handlers(orchestrator.handle())?;

    let summary = orchestrator
        .run(&mut items, &default_profile)
        .map_err(|e| anyhow!("batch run failed: {}", e))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_preset(action: PresetAction) -> Result<()> {
    match action {
        PresetAction::List { preset_dir } => {
            let store = PresetStore::new(&preset_dir);
            let names = store.list().map_err(|e| anyhow!(e.to_string()))?;
            if names.is_empty() {
                println!("저장된 프리셋이 없습니다. ({})", preset_dir.display());
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }
        PresetAction::Show { name, preset_dir } => {
            let store = PresetStore::new(&preset_dir);
            let profile = store.load(&name).map_err(|e| anyhow!(e.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        PresetAction::Import {
            info,
            name,
            preset_dir,
        } => {
            let content = std::fs::read_to_string(&info)
                .with_context(|| format!("failed to read business info '{}'", info.display()))?;
            let profile =
                parse_business_document(&content).map_err(|e| anyhow!(e.to_string()))?;
            let store = PresetStore::new(&preset_dir);
            let path = store
                .save(&profile, name.as_deref())
                .map_err(|e| anyhow!(e.to_string()))?;
            println!("프리셋 저장: {}", path.display());
        }
    }
    Ok(())
}

fn run_estimate(worklist: PathBuf) -> Result<()> {
    let items = parse_work_list(&worklist).map_err(|e| anyhow!(e))?;
    let estimate = estimate_usage(items.len());
    println!(
        "{}개 항목 × 3,500 토큰 = {} 토큰 (예상 비용 ${:.2})",
        estimate.items, estimate.tokens, estimate.estimated_usd
    );
    Ok(())
}
