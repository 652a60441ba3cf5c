use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use labs_auth::AuthFlow;
use labs_config::Config;
use labs_tasks::TaskClient;
use labs_types::{LoginCredentials, ServiceSession};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "labs", about = "labs — headless login and image generation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and open a service session.
    Login {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Generate images for a prompt and print their paths.
    Generate {
        /// Text prompt for the image.
        prompt: String,
        /// Images to request (default: `labs.batch_size` from config).
        #[arg(short = 'n', long)]
        count: Option<u32>,
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { config } => cmd_login(config).await,
        Commands::Generate {
            prompt,
            count,
            config,
        } => cmd_generate(prompt, count, config).await,
    }
}

async fn cmd_login(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    open_session(&config).await?;
    eprintln!("login successful");
    Ok(())
}

async fn cmd_generate(
    prompt: String,
    count: Option<u32>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let session = open_session(&config).await?;
    let client = TaskClient::new(&session, &config.labs)?;
    let count = count.unwrap_or_else(|| client.default_batch_size());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, cancelling");
            on_signal.cancel();
        }
    });

    let results = client
        .submit_with_cancel(&prompt, count, &cancel)
        .await
        .context("generation failed")?;
    for result in &results {
        println!("{}", result.image_path());
    }
    Ok(())
}

async fn open_session(config: &Config) -> Result<ServiceSession> {
    let flow = AuthFlow::new(config)?;
    let bundle = flow
        .login(&credentials_from_env()?)
        .await
        .context("login failed")?;
    flow.create_session(&bundle)
        .await
        .context("session creation failed")
}

fn credentials_from_env() -> Result<LoginCredentials> {
    let username = std::env::var("LABS_USERNAME").context("LABS_USERNAME is not set")?;
    let password = std::env::var("LABS_PASSWORD").context("LABS_PASSWORD is not set")?;
    Ok(LoginCredentials::new(username, password))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    init_tracing(&config);
    Ok(config)
}

/// `RUST_LOG` wins over `log.level` from config.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.log.level;
        EnvFilter::new(format!(
            "labs={level},labs_auth={level},labs_tasks={level},warn"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
