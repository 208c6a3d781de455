//! Aura Panel - persona judges for body-language critique
//!
//! # Usage
//!
//! ```bash
//! # Generate synthetic reference clips for the default judges
//! aura-panel generate-reference --judge Judge_Steve_Jobs --behavior steeple
//! aura-panel generate-reference --judge Judge_Donald_Trump --behavior accordion
//!
//! # Turn per-frame landmarker output into the user clip
//! aura-panel ingest --input captures/ --output landmarks.json
//!
//! # Run the panel without a model
//! aura-panel evaluate --offline
//!
//! # Run the panel against a hosted model (needs OPENAI_API_KEY)
//! aura-panel evaluate --judge Judge_Steve_Jobs
//! ```
//!
//! # Environment Variables
//!
//! - `AURA_CONFIG`: Path to the panel TOML config (default: ./panel_config.toml)
//! - `OPENAI_API_KEY`: API key for model-backed judges (name configurable)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use aura_panel::clip::{self, ingest, synth};
use aura_panel::config::{self, defaults, PanelConfig};
use aura_panel::extract::extract;
use aura_panel::panel::{evaluate, EvaluationRequest, JudgeBackend};
use aura_panel::scoring::{catalog, run_analysis, Metric};
use aura_panel::storage::PreferenceStore;
use aura_panel::types::{landmark_reference, JudgeProfile};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "aura-panel")]
#[command(about = "Persona judge panel for body-language critique")]
#[command(version)]
struct CliArgs {
    /// Panel config file (overrides AURA_CONFIG and ./panel_config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Run every judge's session and print the ranked report
    Evaluate {
        /// Use the deterministic rubric judge instead of a hosted model
        #[arg(long)]
        offline: bool,
        /// Restrict to these judge ids (repeatable)
        #[arg(long = "judge")]
        judges: Vec<String>,
        /// User clip (default from config)
        #[arg(long)]
        user: Option<PathBuf>,
        /// Reference directory (default from config)
        #[arg(long)]
        references: Option<PathBuf>,
        /// Preference store (default from config)
        #[arg(long)]
        preferences: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Also write the JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compute one metric for a judge and print the analysis record
    Score {
        /// Metric name from the catalog (omit to list the catalog)
        #[arg(long)]
        metric: Option<String>,
        /// Judge id or "id:Label"
        #[arg(long)]
        judge: Option<String>,
        #[arg(long)]
        user: Option<PathBuf>,
        #[arg(long)]
        references: Option<PathBuf>,
    },

    /// Recover a verdict from raw judge output (file or stdin)
    Extract {
        /// Judge the verdict is attributed to when it names none
        #[arg(long, default_value = "unknown")]
        judge: String,
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,
    },

    /// Inspect or change preference weights
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
        #[arg(long, global = true)]
        preferences: Option<PathBuf>,
    },

    /// Build the user clip from per-frame landmarker payloads
    Ingest {
        /// Directory of per-frame JSON payloads
        #[arg(long)]
        input: PathBuf,
        /// Clip artifact to write (default from config)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write synthetic reference clips for a judge
    GenerateReference {
        /// Judge id used as the file name prefix
        #[arg(long)]
        judge: String,
        /// neutral, steeple or accordion
        #[arg(long, default_value = "neutral")]
        behavior: synth::Behavior,
        /// Number of reference files
        #[arg(long, default_value_t = 2)]
        count: usize,
        /// Frames per file
        #[arg(long, default_value_t = defaults::SYNTHETIC_FRAMES)]
        frames: usize,
        /// Output directory (default from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the landmark index table
    Landmarks,
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print stored weights
    Show,
    /// Add a delta to a weight (default 1.0), clamped at 0
    Adjust {
        key: String,
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
    /// Overwrite a weight
    Set { key: String, weight: f64 },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PanelConfig> {
    let config = match path {
        Some(p) => PanelConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display()))?,
        None => PanelConfig::load(),
    };
    config.validate().context("Invalid panel configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    config::init(load_config(args.config.as_ref())?);
    let cfg = config::get();

    match args.command {
        SubCommand::Evaluate { offline, judges, user, references, preferences, format, output } => {
            run_evaluate(cfg, offline, &judges, user, references, preferences, format, output).await
        }
        SubCommand::Score { metric, judge, user, references } => {
            run_score(cfg, metric.as_deref(), judge.as_deref(), user, references)
        }
        SubCommand::Extract { judge, input } => run_extract(&judge, input),
        SubCommand::Prefs { action, preferences } => {
            run_prefs(preferences.unwrap_or_else(|| cfg.paths.preferences.clone()), action)
        }
        SubCommand::Ingest { input, output } => {
            run_ingest(&input, output.unwrap_or_else(|| cfg.paths.user_clip.clone()))
        }
        SubCommand::GenerateReference { judge, behavior, count, frames, output_dir } => {
            let dir = output_dir.unwrap_or_else(|| cfg.paths.reference_dir.clone());
            run_generate_reference(&judge, behavior, count, frames, &dir)
        }
        SubCommand::Landmarks => {
            println!("{}", landmark_reference());
            Ok(())
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

#[allow(clippy::too_many_arguments)]
async fn run_evaluate(
    cfg: &PanelConfig,
    offline: bool,
    judge_ids: &[String],
    user: Option<PathBuf>,
    references: Option<PathBuf>,
    preferences: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let judges = cfg.select_judges(judge_ids);
    if judges.is_empty() {
        bail!("No configured judge matches {:?}", judge_ids);
    }

    let backend = if offline {
        JudgeBackend::Rubric
    } else {
        JudgeBackend::from_config(&cfg.model).context("Failed to prepare model-backed judges")?
    };

    let mut request = EvaluationRequest::from_config(cfg, backend);
    request.judges = judges;
    if let Some(p) = user {
        request.user_clip = p;
    }
    if let Some(p) = references {
        request.reference_dir = p;
    }
    if let Some(p) = preferences {
        request.preferences = p;
    }

    // Graceful shutdown via Ctrl+C
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        warn!("Received Ctrl+C, cutting sessions short");
        shutdown.cancel();
    });

    info!(judges = request.judges.len(), offline, "Starting panel evaluation");
    let report = evaluate(cfg, request, cancel).await;

    let json = serde_json::to_string_pretty(&report)?;
    if let Some(path) = output {
        std::fs::write(&path, &json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!(path = %path.display(), "Report written");
    }
    match format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{json}"),
    }
    Ok(())
}

fn run_score(
    cfg: &PanelConfig,
    metric: Option<&str>,
    judge: Option<&str>,
    user: Option<PathBuf>,
    references: Option<PathBuf>,
) -> Result<()> {
    let Some(metric_name) = metric else {
        println!("{}", catalog());
        return Ok(());
    };
    let metric = Metric::from_name(metric_name)
        .with_context(|| format!("Unknown metric '{metric_name}'"))?;

    let judge = match judge {
        Some(spec) => cfg
            .judges
            .iter()
            .find(|j| j.id == spec)
            .cloned()
            .or_else(|| JudgeProfile::parse_spec(spec))
            .with_context(|| format!("Cannot interpret judge '{spec}'"))?,
        None => cfg.judges.first().cloned().context("No judges configured")?,
    };

    let user_clip = clip::load_clip(&user.unwrap_or_else(|| cfg.paths.user_clip.clone()));
    let ref_dir = references.unwrap_or_else(|| cfg.paths.reference_dir.clone());
    let refs = clip::load_reference_clips(&ref_dir, &judge);

    let outcome = run_analysis(&judge.id, metric, &user_clip, &refs);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn run_extract(judge: &str, input: Option<PathBuf>) -> Result<()> {
    let text = match input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };
    let verdict = extract(text, judge).into_verdict();
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

fn run_prefs(path: PathBuf, action: PrefsAction) -> Result<()> {
    let store = PreferenceStore::new(path);
    match action {
        PrefsAction::Show => {
            let weights = store.load()?;
            if weights.is_empty() {
                println!("(no stored weights, every judge weighs 1.0)");
            }
            for (key, weight) in weights.iter() {
                println!("{key}: {weight:.2}");
            }
        }
        PrefsAction::Adjust { key, delta } => {
            let weight = store.adjust(&key, delta)?;
            println!("{key}: {weight:.2}");
        }
        PrefsAction::Set { key, weight } => {
            let weight = store.set(&key, weight)?;
            println!("{key}: {weight:.2}");
        }
    }
    Ok(())
}

fn run_ingest(input: &std::path::Path, output: PathBuf) -> Result<()> {
    let payloads = ingest::load_frame_payloads(input)
        .with_context(|| format!("Failed to read captures from {}", input.display()))?;
    let ctx = clip::IngestContext::new();
    let clip = ctx.ingest(payloads);
    if clip.is_empty() {
        warn!("No pose detected in any capture, writing an empty clip");
    }
    clip::write_clip(&output, &clip)?;
    info!(path = %output.display(), frames = clip.len(), "User clip written");
    Ok(())
}

fn run_generate_reference(
    judge: &str,
    behavior: synth::Behavior,
    count: usize,
    frames: usize,
    dir: &std::path::Path,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    for n in 1..=count {
        let clip = synth::generate_reference(behavior, frames, &mut rng);
        let path = dir.join(synth::reference_file_name(judge, n));
        clip::write_clip(&path, &clip)?;
        info!(path = %path.display(), %behavior, frames, "Generated reference clip");
    }
    Ok(())
}
