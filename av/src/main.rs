//! AgriVision - Precision Agriculture Advisory
//!
//! CLI entry point for running advisory capabilities.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Result, WrapErr};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use agrivision::cli::{Cli, Command, OutputFormat, generate_after_help, image_mime};
use agrivision::config::Config;
use agrivision::flows::{
    AnalyzeNdvi, AskCropQuestion, CapabilityKind, EstimateYield, FlowRunner, ForecastPests, GenerateAvatar,
    PredictIrrigation, SummarizeDashboard,
};
use agrivision::forms::Presentable;
use agrivision::repl;
use agrivision::schema::{AvatarInput, Contract, CropQuestion, DashboardInput, DataUri, ValidationError};

/// Exit status for input that fails validation
const EXIT_INVALID_INPUT: u8 = 2;

fn setup_logging(verbose: bool) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agrivision")
        .join("logs");

    fs::create_dir_all(&log_dir).wrap_err("Failed to create log directory")?;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(log_dir.join("agrivision.log")).wrap_err("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    setup_logging(cli.verbose).wrap_err("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).wrap_err("Failed to load configuration")?;
    info!("AgriVision loaded config: provider={}", config.llm.provider);

    debug!(command = ?cli.command, "main: dispatching command");
    let result = match cli.command {
        Command::Dashboard { location, language } => {
            let input = DashboardInput {
                location: location.unwrap_or_else(|| config.session.farm.farm_location.clone()),
                language: language.unwrap_or(config.session.language),
            };
            run_capability::<SummarizeDashboard>(&config, input, cli.format).await.map(|_| ())
        }
        Command::Irrigation(args) => run_capability::<PredictIrrigation>(&config, args.into(), cli.format)
            .await
            .map(|_| ()),
        Command::Yield(args) => run_capability::<EstimateYield>(&config, args.into(), cli.format)
            .await
            .map(|_| ()),
        Command::Ndvi(args) => match encode_image(args.image.as_deref()) {
            Ok(ndvi_data) => run_capability::<AnalyzeNdvi>(&config, args.into_input(ndvi_data), cli.format)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        },
        Command::Pest(args) => run_capability::<ForecastPests>(&config, args.into(), cli.format)
            .await
            .map(|_| ()),
        Command::Avatar { prompt, output } => cmd_avatar(&config, &prompt, output.as_deref(), cli.format).await,
        Command::Ask { question } => {
            run_capability::<AskCropQuestion>(&config, CropQuestion::new(question), cli.format)
                .await
                .map(|_| ())
        }
        Command::Invoke { capability, input } => cmd_invoke(&config, capability, &input).await,
        Command::Assistant { question } => {
            debug!("main: launching assistant");
            repl::run_interactive(&config, question).await
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => match err.downcast_ref::<ValidationError>() {
            Some(invalid) => {
                debug!(field = %invalid.field_name(), "main: input rejected");
                eprintln!("{}", "Invalid input:".red().bold());
                for field in invalid.errors() {
                    eprintln!("  {}", field);
                }
                Ok(ExitCode::from(EXIT_INVALID_INPUT))
            }
            None => Err(err),
        },
    }
}

/// Validate, build the backend client, run once, print
///
/// Input is checked before any client is constructed, so bad input never
/// needs an API key.
async fn run_capability<C: Presentable>(config: &Config, input: C::Input, format: OutputFormat) -> Result<C::Output> {
    debug!(capability = C::NAME, "run_capability: called");
    input.validate()?;
    config.validate().wrap_err("Invalid configuration")?;

    let runner = FlowRunner::from_config(config).wrap_err("Failed to create LLM client")?;
    let output = runner.run::<C>(&input).await.wrap_err(C::FAILURE)?;

    match format {
        OutputFormat::Text => println!("{}", C::render(&output)),
        OutputFormat::Json => print_json(&output)?,
    }
    Ok(output)
}

async fn cmd_avatar(config: &Config, prompt: &str, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    debug!(?output, "cmd_avatar: called");
    let avatar = run_capability::<GenerateAvatar>(config, AvatarInput::new(prompt), format).await?;

    if let Some(path) = output {
        let image = DataUri::parse(&avatar.avatar_data_uri).wrap_err("Generated avatar is not a data URI")?;
        fs::write(path, image.to_bytes()).wrap_err(format!("Failed to write {}", path.display()))?;
        println!("Avatar written to {}", path.display());
    }
    Ok(())
}

async fn cmd_invoke(config: &Config, kind: CapabilityKind, input: &str) -> Result<()> {
    debug!(%kind, %input, "cmd_invoke: called");
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).wrap_err("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(input).wrap_err(format!("Failed to read {}", input))?
    };

    let raw: Value =
        serde_json::from_str(&text).map_err(|e| ValidationError::field("input", format!("is not valid JSON: {}", e)))?;
    kind.validate(raw.clone())?;
    config.validate().wrap_err("Invalid configuration")?;

    let runner = FlowRunner::from_config(config).wrap_err("Failed to create LLM client")?;
    let output = runner
        .invoke_kind(kind, raw)
        .await
        .wrap_err(format!("{} invocation failed", kind))?;

    print_json(&output)
}

/// Read an image file into a data URI; no file means an empty value
fn encode_image(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        return Ok(String::new());
    };
    debug!(?path, "encode_image: called");
    let mime = image_mime(path).ok_or_else(|| eyre::eyre!("Unsupported image type: {}", path.display()))?;
    let bytes = fs::read(path).wrap_err(format!("Failed to read {}", path.display()))?;
    Ok(DataUri::from_bytes(mime, &bytes).to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
