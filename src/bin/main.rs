//! Job Creator CLI - Serve the API or compile query payloads to SQL
//!
//! Usage:
//!   job-creator serve [--host <host>] [--port <port>] [--config <file>]
//!   job-creator compile <payload.json> [--strict]
//!   job-creator preview <payload.json>
//!   job-creator wizard <form.json> --database <bigquery|snowflake>
//!
//! Examples:
//!   job-creator serve --port 8080
//!   job-creator compile request.json --strict
//!   job-creator wizard form.json --database snowflake --no-delay

use clap::{Parser, Subcommand, ValueEnum};
use job_creator::compile::{compile, CompileOptions, IdentifierPolicy};
use job_creator::config::{DelaySettings, Settings};
use job_creator::model::{FormData, FormUpdate, QueryRequest};
use job_creator::preview::preview_sql;
use job_creator::web;
use job_creator::wizard::{EntryOption, Wizard, WizardResult};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "job-creator")]
#[command(about = "Job Creator - Build warehouse SQL from structured query payloads")]
#[command(version)]
struct Cli {
    /// Path to a config file (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compile a request payload to SQL
    Compile {
        /// Path to the JSON payload
        file: PathBuf,

        /// Validate identifiers and parse the generated SQL
        #[arg(long)]
        strict: bool,
    },

    /// Render the quoted preview for a request payload
    Preview {
        /// Path to the JSON payload
        file: PathBuf,
    },

    /// Drive the wizard end to end with a saved form
    Wizard {
        /// Path to the JSON form data
        file: PathBuf,

        /// Target database
        #[arg(short, long)]
        database: DatabaseArg,

        /// Skip simulated server latency
        #[arg(long)]
        no_delay: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DatabaseArg {
    Bigquery,
    Snowflake,
}

impl DatabaseArg {
    fn as_str(&self) -> &'static str {
        match self {
            DatabaseArg::Bigquery => "bigquery",
            DatabaseArg::Snowflake => "snowflake",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "job_creator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(settings, host, port).await,
        Commands::Compile { file, strict } => cmd_compile(&settings, &file, strict),
        Commands::Preview { file } => cmd_preview(&file),
        Commands::Wizard {
            file,
            database,
            no_delay,
        } => cmd_wizard(settings, &file, database, no_delay).await,
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, ExitCode> {
    let result = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    result.map_err(|e| {
        eprintln!("Configuration error: {}", e);
        ExitCode::FAILURE
    })
}

fn read_json<T: DeserializeOwned>(file: &Path) -> Result<T, ExitCode> {
    let source = fs::read_to_string(file).map_err(|e| {
        eprintln!("Error reading file '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })?;
    serde_json::from_str(&source).map_err(|e| {
        eprintln!("Error parsing '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })
}

async fn cmd_serve(mut settings: Settings, host: Option<String>, port: Option<u16>) -> ExitCode {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    match web::serve(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_compile(settings: &Settings, file: &Path, strict: bool) -> ExitCode {
    let request: QueryRequest = match read_json(file) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let options = if strict {
        CompileOptions::default().with_policy(IdentifierPolicy::Strict)
    } else {
        settings.compiler.options()
    };

    match compile(&request, &options) {
        Ok(output) => {
            println!("{}", output.sql);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_preview(file: &Path) -> ExitCode {
    match read_json::<QueryRequest>(file) {
        Ok(request) => {
            println!("{}", preview_sql(&request));
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

async fn cmd_wizard(
    mut settings: Settings,
    file: &Path,
    database: DatabaseArg,
    no_delay: bool,
) -> ExitCode {
    let form: FormData = match read_json(file) {
        Ok(f) => f,
        Err(code) => return code,
    };
    if no_delay {
        settings.delays = DelaySettings::none();
        settings.wizard.transition_delay_ms = 0;
    }

    let mut wizard = match Wizard::from_settings(settings) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let update = FormUpdate {
        table_name: Some(form.table_name),
        fields: Some(form.fields),
        aggregation: Some(form.aggregation),
        cumulative: Some(form.cumulative),
        custom_sql: Some(form.custom_sql),
    };

    match run_wizard(&mut wizard, database, update).await {
        Ok(sql) => {
            println!("{}", sql);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Wizard error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_wizard(
    wizard: &mut Wizard,
    database: DatabaseArg,
    update: FormUpdate,
) -> WizardResult<String> {
    wizard.select_option(EntryOption::New)?;
    wizard.select_database(database.as_str())?;
    wizard.update_form(update)?;
    wizard.resolve_token().await?;
    let generated = wizard.generate().await?;
    Ok(generated.sql.clone())
}
