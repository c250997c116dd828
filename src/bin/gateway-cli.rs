use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the MSA Gateway Discovery API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered services
    Services,
    /// Show one service
    Service { name: String },
    /// Register or replace a service
    Register {
        name: String,
        base_address: String,
        #[arg(long, default_value = "/health")]
        health_check: String,
        /// Path prefix routed to this service (repeatable)
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },
    /// Remove a service
    Unregister { name: String },
    /// Probe one service now
    Health { name: String },
    /// Probe every service now
    HealthAll,
    /// Status snapshot of every service
    Status,
    /// Show the active route table
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Services => client.get(format!("{}/discovery/services", base)).send().await?,
        Commands::Service { name } => {
            client
                .get(format!("{}/discovery/services/{}", base, name))
                .send()
                .await?
        }
        Commands::Register {
            name,
            base_address,
            health_check,
            prefixes,
        } => {
            let body = json!({
                "name": name,
                "base_address": base_address,
                "health_check_path": health_check,
                "path_prefixes": prefixes,
            });
            client
                .post(format!("{}/discovery/services", base))
                .json(&body)
                .send()
                .await?
        }
        Commands::Unregister { name } => {
            client
                .delete(format!("{}/discovery/services/{}", base, name))
                .send()
                .await?
        }
        Commands::Health { name } => {
            client
                .get(format!("{}/discovery/services/{}/health", base, name))
                .send()
                .await?
        }
        Commands::HealthAll => client.get(format!("{}/discovery/health/all", base)).send().await?,
        Commands::Status => client.get(format!("{}/services/status", base)).send().await?,
        Commands::Routes => client.get(format!("{}/discovery/routes", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
