//! script-delegate CLI - run initialization scripts against a configured database.

use clap::{Parser, Subcommand};
use script_delegate::{
    load_script, Config, DatabaseDelegate, DelegateError, DelegateImpl, ExecutionPolicy,
    ScriptSummary,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "script-delegate")]
#[command(about = "Run ordered initialization scripts against a database")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute statements in order, then close the connection
    Run {
        /// YAML file holding a sequence of statements
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Statement to execute after the script file (repeatable)
        #[arg(long = "statement")]
        statements: Vec<String>,

        /// Script path reported in diagnostics (default: the script file)
        #[arg(long)]
        script_path: Option<String>,

        /// Absorb every failed statement and keep going
        #[arg(long)]
        continue_on_error: bool,

        /// Absorb failed DROP statements
        #[arg(long)]
        ignore_failed_drops: bool,

        /// Validate configuration and list statements without connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the target database answers a trivial statement
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DelegateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    let target_address = config.target.address()?;
    info!(
        "Loaded configuration from {:?} (target {} at {})",
        cli.config, config.target.r#type, target_address
    );

    match cli.command {
        Commands::Run {
            script,
            statements,
            script_path,
            continue_on_error,
            ignore_failed_drops,
            dry_run,
        } => {
            let mut all_statements = match &script {
                Some(path) => load_script(path)?,
                None => Vec::new(),
            };
            all_statements.extend(statements);

            let script_path = script_path
                .or_else(|| script.as_ref().map(|p| p.display().to_string()))
                .unwrap_or_else(|| "<command-line>".to_string());

            let policy = ExecutionPolicy::new(
                continue_on_error || config.execution.continue_on_error,
                ignore_failed_drops || config.execution.ignore_failed_drops,
            );

            if dry_run {
                print_dry_run(
                    &all_statements,
                    &script_path,
                    &target_address,
                    policy,
                    cli.output_json,
                )?;
                return Ok(());
            }

            let mut delegate = DelegateImpl::from_config(&config.target)?;
            let summary = delegate
                .execute_script(&all_statements, &script_path, policy)
                .await?;
            print_summary(&summary, cli.output_json)?;
        }

        Commands::HealthCheck => {
            let mut delegate = DelegateImpl::from_config(&config.target)?;
            let check = delegate.health_check_statement();
            let result = delegate
                .execute_one(check, "health-check", 1, ExecutionPolicy::strict())
                .await;
            delegate.close().await;
            result?;

            if cli.output_json {
                let report = serde_json::json!({
                    "healthy": true,
                    "type": config.target.r#type,
                    "target": target_address,
                    "backend": delegate.backend_name(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Health check passed");
                println!("  Target: {} ({})", target_address, config.target.r#type);
            }
        }
    }

    Ok(())
}

fn print_dry_run(
    statements: &[String],
    script_path: &str,
    target_address: &str,
    policy: ExecutionPolicy,
    output_json: bool,
) -> Result<(), DelegateError> {
    if output_json {
        let report = serde_json::json!({
            "script_path": script_path,
            "target": target_address,
            "policy": policy,
            "statements": statements,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Dry run: {} statements from {} (target {})",
        statements.len(),
        script_path,
        target_address
    );
    for (index, statement) in statements.iter().enumerate() {
        println!("  {:>4}: {}", index + 1, statement);
    }
    Ok(())
}

fn print_summary(summary: &ScriptSummary, output_json: bool) -> Result<(), DelegateError> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("\nScript completed!");
        println!("  Script: {}", summary.script_path);
        println!("  Executed: {}", summary.statements_executed);
        if summary.statements_absorbed > 0 {
            println!("  Failures ignored: {}", summary.statements_absorbed);
        }
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout stays parseable with --output-json.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
