//! copilot: generate a social campaign (ad copy + promotional image) for a
//! product brief.
//!
//!   copilot run [brief...]     — Run the writer/reviewer/art-director loop
//!   copilot check              — Validate API keys and configuration
//!   copilot diagram            — Show the workflow diagram
//!   copilot history --archive  — List archived campaigns
//!   copilot examples list      — Show the built-in sample briefs
//!   copilot examples run NAME  — Run one sample brief
//!   copilot examples all       — Run every sample brief in sequence
//!
//! Uses GROQ_API_KEY for text and TOGETHER_API_KEY or HUGGINGFACE_API_TOKEN
//! for images. Missing keys degrade to templated copy, rule-based review and
//! simulated images.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use copilot_agents::archive::Archive;
use copilot_agents::catalog;
use copilot_agents::config::{Credentials, CopilotConfig};
use copilot_agents::image::{self, HuggingFaceImages, ImageGenerator, ImageProvider, TogetherImages};
use copilot_agents::llm::{self, LlmClient, TextGenerator};
use copilot_agents::output;
use copilot_agents::workflow::{CampaignResult, Workflow};

const DEFAULT_BRIEF: &str =
    "Eco-friendly water bottle made with sustainable bamboo, keeps drinks cold for 24 hours";

#[derive(Parser)]
#[command(name = "copilot", about = "Creative campaign co-pilot: writer, reviewer and art director agents")]
struct Args {
    /// Config file (default: ~/.config/creative-copilot/copilot.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a campaign for a product brief
    Run(RunArgs),
    /// Validate API keys and configuration
    Check(KeyArgs),
    /// Print the workflow diagram
    Diagram,
    /// List archived campaigns
    History {
        /// Archive database path
        #[arg(long)]
        archive: PathBuf,

        /// Number of campaigns to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Built-in sample briefs
    Examples {
        #[command(subcommand)]
        action: ExamplesAction,
    },
}

#[derive(Subcommand)]
enum ExamplesAction {
    /// List the sample briefs
    List,
    /// Run one sample brief by name
    Run {
        /// Example name, e.g. "Tech Product"
        name: String,

        #[command(flatten)]
        service: ServiceArgs,

        /// Record the finished campaign in this SQLite archive
        #[arg(long)]
        archive: Option<PathBuf>,
    },
    /// Run every sample brief in sequence
    All {
        #[command(flatten)]
        service: ServiceArgs,

        /// Seconds to wait between campaigns
        #[arg(long, default_value_t = 5)]
        pause_secs: u64,

        /// Record each finished campaign in this SQLite archive
        #[arg(long)]
        archive: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct KeyArgs {
    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    /// Together AI API key
    #[arg(long, env = "TOGETHER_API_KEY", hide_env_values = true)]
    together_api_key: Option<String>,

    /// Hugging Face API token
    #[arg(long, env = "HUGGINGFACE_API_TOKEN", hide_env_values = true)]
    huggingface_token: Option<String>,
}

impl From<KeyArgs> for Credentials {
    fn from(keys: KeyArgs) -> Self {
        Credentials {
            groq_api_key: keys.groq_api_key,
            together_api_key: keys.together_api_key,
            huggingface_token: keys.huggingface_token,
        }
    }
}

/// Flags that shape the services and ceilings of a run.
#[derive(clap::Args)]
struct ServiceArgs {
    #[command(flatten)]
    keys: KeyArgs,

    /// Chat model
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Draft attempts before forcing image generation
    #[arg(long)]
    retry_ceiling: Option<u32>,

    /// Hard limit on workflow steps
    #[arg(long)]
    step_ceiling: Option<u32>,

    /// Image backend: together or huggingface
    #[arg(long)]
    image_provider: Option<ImageProvider>,

    /// Directory for generated images
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Product brief (defaults to an example product)
    brief: Vec<String>,

    #[command(flatten)]
    service: ServiceArgs,

    /// Record the finished campaign in this SQLite archive
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Also write the rendered report to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the result as JSON instead of the report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    match args.command {
        Command::Run(run_args) => run(args.config.as_deref(), run_args).await,
        Command::Check(keys) => check(args.config.as_deref(), keys.into()),
        Command::Diagram => {
            println!("{}", output::DIAGRAM);
            Ok(())
        }
        Command::History { archive, limit } => {
            let archive = Archive::open(&archive)?;
            print!("{}", output::render_history(&archive.recent(limit)?));
            Ok(())
        }
        Command::Examples { action } => examples(args.config.as_deref(), action).await,
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "copilot_agents=info,copilot=info".into());
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load config, apply CLI overrides and build the workflow.
fn build_workflow(config_path: Option<&Path>, args: ServiceArgs) -> Result<Workflow> {
    let mut config = CopilotConfig::load(config_path)?;
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(base_url) = args.base_url {
        config.llm.base_url = base_url;
    }
    if let Some(n) = args.retry_ceiling {
        config.workflow.retry_ceiling = n;
    }
    if let Some(n) = args.step_ceiling {
        config.workflow.step_ceiling = n;
    }
    if let Some(provider) = args.image_provider {
        config.image.provider = provider;
    }
    if let Some(dir) = args.output_dir {
        config.image.output_dir = dir;
    }
    config.validate()?;

    let credentials: Credentials = args.keys.into();
    Ok(Workflow::from_config(
        &config,
        text_service(&config, &credentials),
        image_service(&config, &credentials),
    ))
}

async fn run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let brief = if args.brief.is_empty() {
        tracing::info!("No brief given, using example product");
        DEFAULT_BRIEF.to_string()
    } else {
        args.brief.join(" ")
    };

    let workflow = build_workflow(config_path, args.service)?;
    let result = workflow.run(&brief).await?;
    let report = output::render_report(&result);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{report}");
    }

    if let Some(path) = &args.save {
        output::save_report(path, &report)?;
        tracing::info!(path = %path.display(), "Report saved");
    }

    if let Some(db) = &args.archive {
        archive_result(db, &result).await?;
    }

    Ok(())
}

async fn examples(config_path: Option<&Path>, action: ExamplesAction) -> Result<()> {
    match action {
        ExamplesAction::List => {
            print!("{}", output::render_catalog(catalog::ALL_EXAMPLES));
            Ok(())
        }
        ExamplesAction::Run {
            name,
            service,
            archive,
        } => {
            let Some(example) = catalog::find(&name) else {
                eprintln!("❌ Example '{name}' not found!\n");
                eprint!("{}", output::render_catalog(catalog::ALL_EXAMPLES));
                anyhow::bail!("unknown example '{name}'");
            };
            let workflow = build_workflow(config_path, service)?;
            tracing::info!(name = example.name, "Running example");
            let result = workflow.run(example.description).await?;
            print!("{}", output::render_report(&result));
            if let Some(db) = &archive {
                archive_result(db, &result).await?;
            }
            Ok(())
        }
        ExamplesAction::All {
            service,
            pause_secs,
            archive,
        } => {
            let workflow = build_workflow(config_path, service)?;
            let entries = catalog::run_batch(
                &workflow,
                catalog::ALL_EXAMPLES,
                Duration::from_secs(pause_secs),
            )
            .await;
            for entry in &entries {
                if let Ok(result) = &entry.outcome {
                    print!("{}", output::render_report(result));
                    if let Some(db) = &archive {
                        archive_result(db, result).await?;
                    }
                }
            }
            print!("{}", output::render_batch_summary(&entries));
            Ok(())
        }
    }
}

async fn archive_result(db: &Path, result: &CampaignResult) -> Result<()> {
    if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let id = Archive::open(db)?.record(result)?;
    tracing::info!(id, archive = %db.display(), "Campaign archived");
    Ok(())
}

fn text_service(config: &CopilotConfig, credentials: &Credentials) -> Arc<dyn TextGenerator> {
    match credentials.groq() {
        Some(key) => Arc::new(
            LlmClient::new(key.to_string())
                .with_model(&config.llm.model)
                .with_base_url(&config.llm.base_url),
        ),
        None => {
            tracing::warn!("GROQ_API_KEY not set, using templated copy and rule-based review");
            Arc::new(llm::Unavailable::new("GROQ_API_KEY not set"))
        }
    }
}

fn image_service(config: &CopilotConfig, credentials: &Credentials) -> Arc<dyn ImageGenerator> {
    let settings = &config.image;
    let Some(token) = credentials.image_token(settings.provider) else {
        tracing::warn!(provider = %settings.provider, "No image token, images will be simulated");
        return Arc::new(image::Simulated);
    };
    match settings.provider {
        ImageProvider::Together => Arc::new(
            TogetherImages::new(token.to_string(), settings.output_dir.clone())
                .with_model(&settings.model),
        ),
        ImageProvider::Huggingface => Arc::new(
            HuggingFaceImages::new(token.to_string(), settings.output_dir.clone())
                .with_model(&settings.model),
        ),
    }
}

fn check(config_path: Option<&Path>, credentials: Credentials) -> Result<()> {
    println!("🔍 Running setup validation...\n");

    let config = CopilotConfig::load(config_path)?;
    config.validate()?;
    println!(
        "✅ Configuration valid (retry ceiling {}, step ceiling {})",
        config.workflow.retry_ceiling, config.workflow.step_ceiling
    );

    let issues = credentials.issues(config.image.provider);
    if issues.is_empty() {
        println!("✅ All API keys are configured");
        println!("\n✨ Setup validation complete! Ready to run.");
        return Ok(());
    }

    println!("❌ API key issues found:");
    for issue in &issues {
        println!("   → {issue}");
    }
    println!("\n📖 Get your API keys:");
    println!("   • Groq: https://console.groq.com/keys");
    println!("   • Together AI: https://api.together.ai/settings/api-keys");
    println!("   • Hugging Face: https://huggingface.co/settings/tokens");
    anyhow::bail!("setup check failed with {} issue(s)", issues.len())
}
