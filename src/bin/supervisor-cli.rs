use std::process::ExitCode;

use clap::{Parser, Subcommand};

use worker_supervisor::http::client::{fetch_health, EXIT_UNREACHABLE};

#[derive(Parser)]
#[command(name = "supervisor-cli")]
#[command(about = "Management CLI for the worker supervisor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Health endpoint path on the server.
    #[arg(long, default_value = "/health")]
    path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the health endpoint
    Health {
        /// Print the per-probe breakdown
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health { verbose } => {
            let report = match fetch_health(&client, &cli.url, &cli.path, verbose).await {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(EXIT_UNREACHABLE);
                }
            };

            let label = if report.is_healthy() { "healthy" } else { "unhealthy" };
            println!("{} ({})", label, report.status);

            if let Some(result) = &report.result {
                match serde_json::to_string_pretty(result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }

            ExitCode::from(report.exit_code())
        }
    }
}
