use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use travel_buddy::api::HttpItineraryApi;
use travel_buddy::app::App;
use travel_buddy::config::Config;
use travel_buddy::workflow::CollageTemplate;
use travel_buddy::{headless, logging, ui};

#[derive(Parser)]
#[command(name = "travel-buddy")]
#[command(about = "Plan a trip and refine an AI itinerary from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Itinerary backend base URL (overrides server.base_url)
    #[arg(short, long)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a trip without the TUI
    Plan {
        /// TOML file with one key per form field
        #[arg(short, long)]
        answers: PathBuf,

        /// Revision feedback, applied in order after the first generation
        #[arg(short, long)]
        feedback: Vec<String>,

        /// Finalize and print the PDF download link
        #[arg(long)]
        finalize: bool,
    },

    /// Print the form definition as TOML
    Form,

    /// Write the effective config to .travel-buddy/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }

    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Plan {
            answers,
            feedback,
            finalize,
        }) => {
            cmd_plan(&config, &answers, &feedback, finalize).await?;
        }
        Some(Commands::Form) => {
            cmd_form(&config)?;
        }
        Some(Commands::Init { force }) => {
            let path = Config::local_config_path();
            config.init_file(&path, force)?;
            println!("Wrote {}", path.display());
        }
        None => {
            run_tui(config, logging_handle.log_file_path).await?;
        }
    }

    Ok(())
}

async fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    ui::install_panic_hook();

    let api = HttpItineraryApi::from_config(&config.server)
        .context("Failed to create itinerary client")?;
    tracing::info!(base_url = api.base_url(), "starting travel-buddy");

    let mut app = App::new(config, Arc::new(api))?;
    let result = app.run().await;

    if let Some(log_path) = log_file_path {
        if log_path.metadata().is_ok_and(|m| m.len() > 0) {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    result
}

async fn cmd_plan(
    config: &Config,
    answers: &std::path::Path,
    feedback: &[String],
    finalize: bool,
) -> Result<()> {
    let definition = config.form_definition()?;
    let answers = headless::load_answers(answers)?;
    let api = HttpItineraryApi::from_config(&config.server)
        .context("Failed to create itinerary client")?;

    let outcome = headless::run_plan(
        &api,
        &definition,
        CollageTemplate::from_config(&config.collage),
        &answers,
        feedback,
        finalize,
    )
    .await?;

    println!("{}", outcome.confirmation);
    println!("{}", "─".repeat(60));
    println!("{}", outcome.itinerary);
    if let Some(url) = outcome.download_url {
        println!("{}", "─".repeat(60));
        println!("PDF: {url}");
    }

    Ok(())
}

fn cmd_form(config: &Config) -> Result<()> {
    let definition = config.form_definition()?;
    print!("{}", definition.to_toml()?);
    Ok(())
}
