use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use generation_client::{GenerationStudio, Outcome};
use studio_core::{RawGenerationInput, Style, StudioConfig, TranscriptKind};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ai-studio")]
#[command(about = "Submit image generations with retries and keep a short history")]
#[command(version)]
struct Cli {
    /// Path to a config.toml (defaults to <data dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a generation and wait for its outcome
    Generate {
        /// Image reference, e.g. a data URL
        #[arg(long)]
        image: String,
        /// Text prompt
        #[arg(long)]
        prompt: String,
        /// Editorial, Streetwear, Vintage, Minimalist or Artistic
        #[arg(long, default_value = "Editorial")]
        style: Style,
    },
    /// List recent generations, newest first
    History {
        #[arg(long)]
        json: bool,
    },
    /// Print the inputs of a past generation
    Restore {
        /// Generation id
        id: String,
    },
    /// Print the conversation transcript
    Transcript {
        #[arg(long)]
        json: bool,
    },
    /// Remove the history and the transcript
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = StudioConfig::load(cli.config.as_deref());
    tracing::debug!("Using endpoint {}", config.endpoint);

    match cli.command {
        Commands::Generate {
            image,
            prompt,
            style,
        } => generate(&config, image, prompt, style).await,
        Commands::History { json } => history(&config, json).await,
        Commands::Restore { id } => restore(&config, &id).await,
        Commands::Transcript { json } => transcript(&config, json).await,
        Commands::Clear => {
            GenerationStudio::from_config(&config).await?.clear().await;
            println!("{}", "History cleared".green());
            Ok(())
        }
    }
}

async fn generate(
    config: &StudioConfig,
    image: String,
    prompt: String,
    style: Style,
) -> anyhow::Result<()> {
    let max_attempts = config.retry_policy().max_attempts();
    let studio = GenerationStudio::from_config(config)
        .await?
        .with_retry_observer(move |attempt, error| {
            eprintln!(
                "{}",
                format!("Attempt {attempt}/{max_attempts} failed: {error}, retrying").yellow()
            );
        });

    let handle = studio
        .submit(RawGenerationInput::new(image, prompt, style))
        .await?;
    println!(
        "{}",
        format!("Generating ({style}), press Ctrl-C to cancel...").cyan()
    );

    let canceller = handle.canceller();
    let wait = handle.wait();
    tokio::pin!(wait);

    let outcome = tokio::select! {
        outcome = &mut wait => outcome,
        _ = tokio::signal::ctrl_c() => {
            canceller.cancel();
            wait.await
        }
    };

    match outcome {
        Outcome::Succeeded(result) => {
            println!("{}", format!("Generated {}", result.id).green());
            println!("  image:  {}", result.artifact_ref);
            println!("  prompt: {}", result.prompt);
            println!("  style:  {}", result.style);
            Ok(())
        }
        Outcome::Failed { error, attempts } => {
            anyhow::bail!("Generation failed after {attempts} attempt(s): {error}")
        }
        Outcome::Aborted => Ok(()),
    }
}

async fn history(config: &StudioConfig, json: bool) -> anyhow::Result<()> {
    let items = GenerationStudio::from_config(config).await?.history().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("{}", "No generations yet".dimmed());
    }
    for item in items {
        println!(
            "{}  {}  {:<10} {}",
            item.id.bold(),
            item.created_at.format("%Y-%m-%d %H:%M:%S"),
            item.style.as_str(),
            item.prompt
        );
    }
    Ok(())
}

async fn restore(config: &StudioConfig, id: &str) -> anyhow::Result<()> {
    let studio = GenerationStudio::from_config(config).await?;
    let Some(item) = studio.restore(id).await else {
        anyhow::bail!("No generation with id {id} in history");
    };
    println!("  image:  {}", item.artifact_ref);
    println!("  prompt: {}", item.prompt);
    println!("  style:  {}", item.style);
    Ok(())
}

async fn transcript(config: &StudioConfig, json: bool) -> anyhow::Result<()> {
    let entries = GenerationStudio::from_config(config)
        .await?
        .transcript()
        .await;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in entries {
        let who = match entry.kind {
            TranscriptKind::User => "you".cyan(),
            TranscriptKind::Ai => "ai".green(),
        };
        let style = entry.style.map(|s| format!(" [{s}]")).unwrap_or_default();
        println!("{who}{style}: {}", entry.content);
        if let Some(url) = entry.image_url {
            println!("    {}", url.dimmed());
        }
    }
    Ok(())
}
