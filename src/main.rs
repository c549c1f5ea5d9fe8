mod classifier;
mod composer;
mod config;
mod digest;
mod email;
mod formatter;
mod openai_client;
mod sheet_parser;
mod sheets_client;
mod sheets_types;
mod task_record;

use chrono::{Local, NaiveDate};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{AppConfig, ConfigError, default_config_path};
use crate::digest::DigestPipeline;
use crate::email::SmtpMailer;
use crate::openai_client::OpenAiClient;
use crate::sheets_client::{GoogleSheetsClient, JsonFileSource, SheetSource};

#[derive(Parser)]
#[command(name = "pixel-digest")]
#[command(author, version, about = "email a friendly daily summary of a task spreadsheet", long_about = None)]
struct Cli {
    /// path to the config file (defaults to ./pixel_digest.toml)
    #[arg(short, long, value_name = "FILE", env = "PIXEL_DIGEST_CONFIG")]
    config: Option<PathBuf>,

    /// write a template config file and exit
    #[arg(long)]
    setup: bool,

    /// date to treat as today, YYYY-MM-DD (defaults to the local date)
    #[arg(long, value_name = "DATE")]
    today: Option<NaiveDate>,

    /// read tasks from a JSON export instead of Google Sheets
    #[arg(short, long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// generate the email and print it instead of sending
    #[arg(long)]
    dry_run: bool,

    /// print the prompt and stop before calling the text generator
    #[arg(long, conflicts_with = "dry_run")]
    print_prompt: bool,

    /// debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => match env::current_dir() {
            Ok(dir) => default_config_path(&dir),
            Err(e) => {
                error!("Could not determine working directory: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    if cli.setup {
        return match setup_config(&config_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run(&cli, config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn setup_config(path: &Path) -> Result<(), ConfigError> {
    AppConfig::write_default(path)?;

    println!("✓ Created {}", path.display());
    println!("Please edit it with your settings:");
    println!("  - [sheet] spreadsheet_id/range: the sheet holding Task, Due Date, Priority, Completed?");
    println!("  - [generation] model/temperature: text generation settings");
    println!("  - [email] smtp_server/smtp_port/username: your SMTP relay (Gmail: smtp.gmail.com, 587)");
    println!("  - [email] from_email/to_email: sender and recipient");
    println!("Credentials are best kept in the environment:");
    println!("  GOOGLE_SHEETS_TOKEN or GOOGLE_SHEETS_API_KEY, OPENAI_API_KEY, SMTP_PASSWORD (or GMAIL_APP_PASSWORD)");
    Ok(())
}

async fn run(cli: &Cli, config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) if cli.print_prompt => {
            warn!("{} not found, composing with default settings", path.display());
            AppConfig::default()
        }
        Err(e) => return Err(e.into()),
    };
    config.apply_process_env();

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let pipeline = DigestPipeline::from_config(&config);

    let source: Box<dyn SheetSource> = match &cli.source {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(GoogleSheetsClient::new(
            config.sheets_auth()?,
            config.sheet.spreadsheet_id.clone(),
            config.sheet.range.clone(),
        )?),
    };

    if cli.print_prompt {
        let prompt = pipeline.prepare(source.as_ref(), today).await?;
        println!("{}", prompt.text());
        return Ok(());
    }

    let mut generator = OpenAiClient::new(config.generation_api_key()?.to_string())?
        .with_model(config.generation.model.clone())
        .with_temperature(config.generation.temperature);
    if let Some(base_url) = &config.generation.base_url {
        generator = generator.with_base_url(base_url.clone());
    }

    if cli.dry_run {
        let prompt = pipeline.prepare(source.as_ref(), today).await?;
        let draft = pipeline.draft(&generator, &prompt).await?;
        println!("Subject: {}", draft.subject);
        println!("From: {}", draft.from);
        println!("To: {}", draft.to);
        println!();
        println!("{}", draft.body);
        return Ok(());
    }

    let mailer = SmtpMailer::new(
        &config.email.smtp_server,
        config.email.smtp_port,
        config.email.username.clone(),
        config.smtp_password()?.to_string(),
    )?;
    let draft = pipeline.run(source.as_ref(), &generator, &mailer, today).await?;
    println!("✓ Task summary sent to {}", draft.to);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_today_and_modes() {
        let cli = Cli::try_parse_from([
            "pixel-digest",
            "--today",
            "2024-01-05",
            "--source",
            "tasks.json",
            "--print-prompt",
        ])
        .unwrap();

        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(cli.source, Some(PathBuf::from("tasks.json")));
        assert!(cli.print_prompt);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_rejects_conflicting_modes() {
        assert!(Cli::try_parse_from(["pixel-digest", "--dry-run", "--print-prompt"]).is_err());
        assert!(Cli::try_parse_from(["pixel-digest", "--today", "05/01/2024"]).is_err());
    }
}
