mod analyze;
mod backend;
mod cases;
mod config;
mod convergence;
mod error;
mod payload;
mod report;
mod suite;
mod verify;

use crate::config::HarnessConfig;
use crate::report::render;
use crate::suite::runner::SuiteRunner;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Parser)]
#[command(name = "memprobe")]
#[command(about = "Black-box integration harness for the memory service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the built-in suite against a running backend
    Run {
        /// Backend base URL
        #[arg(long, default_value = "http://localhost:8000", env = "MEMPROBE_BASE_URL")]
        base_url: String,

        /// Group id under which suite data is ingested
        #[arg(long, default_value = "memprobe_suite")]
        project_id: String,

        /// Destination for the result artifact
        #[arg(long, default_value = "test_results.json")]
        output: PathBuf,

        /// Poll attempts per read-back check
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Sleep between poll attempts, in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },
    /// Analyze a persisted result set and export the CSV summary
    Analyze {
        /// Result artifact written by `run`
        #[arg(long, default_value = "test_results.json")]
        results: PathBuf,

        /// CSV export destination
        #[arg(long, default_value = "test_results_summary.csv")]
        csv: PathBuf,

        /// Also print per-case detail
        #[arg(short, long)]
        verbose: bool,
    },
}

// Exit contract: 0 when no case failed, 1 otherwise (fixed sentinel).
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run {
            base_url,
            project_id,
            output,
            max_attempts,
            poll_interval_ms,
        } => {
            let config = HarnessConfig::builder()
                .base_url(base_url)
                .project_id(project_id)
                .results_path(output)
                .maybe_max_attempts(max_attempts)
                .maybe_poll_interval_ms(poll_interval_ms)
                .build();
            run_suite(config).await
        }
        Commands::Analyze {
            results,
            csv,
            verbose,
        } => match analyze::run_analysis(&results, &csv, verbose) {
            Ok(0) => 0,
            Ok(_) => 1,
            Err(err) => {
                eprintln!("Error: {}", err);
                1
            }
        },
    };
    ExitCode::from(code)
}

async fn run_suite(config: HarnessConfig) -> u8 {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling after the current attempt");
            interrupt.cancel();
        }
    });

    let specs = match cases::builtin_cases(&config.project_id) {
        Ok(specs) => specs,
        Err(err) => {
            eprintln!("Error: {}", err);
            return 1;
        }
    };

    let runner = SuiteRunner::new(&config, cancel);
    let result_set = match runner.run(specs).await {
        Ok(result_set) => result_set,
        Err(err) => {
            eprintln!("Error: {}", err);
            return 1;
        }
    };

    println!();
    print!("{}", render::render_summary(&result_set.summary));

    if let Err(err) = result_set.save(&config.results_path) {
        eprintln!("Error: {}", err);
        return 1;
    }
    println!();
    println!("Results exported to: {}", config.results_path.display());

    if result_set.summary.failed == 0 {
        0
    } else {
        1
    }
}
