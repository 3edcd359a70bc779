use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "supervisor-cli")]
#[command(about = "Operator CLI for the failover supervisor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Node health, policy and current decision
    Status,
    /// Where a request would be routed right now
    Route,
    /// Supervisor health aggregate
    Health,
    /// Fetch an order through the supervisor
    Order {
        id: u64,
    },
    /// Record the stimulus and fail the primary
    FailPrimary {
        #[arg(short, long, default_value = "manual")]
        reason: String,
    },
    /// Clear the primary's simulated fault
    RecoverPrimary,
    /// Clear the stimulus and the request ledger
    Reset,
    /// Resilience report around the last stimulus
    Metrics {
        /// Seconds before the stimulus
        #[arg(long, default_value_t = 2.0)]
        pre: f64,
        /// Seconds after the stimulus
        #[arg(long, default_value_t = 10.0)]
        post: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/status", base)),
        Commands::Route => client.get(format!("{}/route", base)),
        Commands::Health => client.get(format!("{}/health", base)),
        Commands::Order { id } => client.get(format!("{}/orders/{}", base, id)),
        Commands::FailPrimary { reason } => client
            .post(format!("{}/stimulus/fail-primary", base))
            .query(&[("reason", reason)]),
        Commands::RecoverPrimary => client.post(format!("{}/stimulus/recover-primary", base)),
        Commands::Reset => client.post(format!("{}/stimulus/reset-metrics", base)),
        Commands::Metrics { pre, post } => client
            .get(format!("{}/metrics", base))
            .query(&[("pre_window_s", pre), ("post_window_s", post)]),
    };

    let res = request.send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: supervisor returned status {}", status);
        eprintln!("{}", body);
        std::process::exit(1);
    }
    println!("{}", body);
    Ok(())
}
