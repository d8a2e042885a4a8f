use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "plane-cli")]
#[command(about = "Admin CLI for the config-plane server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:18001", env = "PLANE_ADMIN_URL")]
    url: String,

    #[arg(short, long, env = "PLANE_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Server status and the last reconciliation result
    Status,
    /// Live snapshot per group
    Snapshots,
    /// Connected subscribers and their per-kind delivery state
    Sessions,
    /// Re-read the resource directories now
    Reconcile,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", cli.key))?);

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Snapshots => client.get(format!("{}/admin/snapshots", base)),
        Commands::Sessions => client.get(format!("{}/admin/sessions", base)),
        Commands::Reconcile => client.post(format!("{}/admin/reconcile", base)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
