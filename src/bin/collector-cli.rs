use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "collector-cli")]
#[command(about = "Operator CLI for the cookie collector", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(short, long, env = "API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service is up
    Status,
    /// Show the most recent records
    Recent,
    /// Submit a cookie batch from a JSON file
    Submit {
        /// Site the cookies belong to
        #[arg(short, long)]
        site: String,
        /// File containing a JSON array of cookie objects
        #[arg(short, long)]
        cookies: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(&cli.key)?);

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/", base)).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                return Err(format!("collector returned status {}: {}", status, text).into());
            }
            println!("{} {}", status, text);
        }
        Commands::Recent => {
            let res = client.get(format!("{}/logs", base))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Submit { site, cookies } => {
            let raw = std::fs::read_to_string(&cookies)?;
            let cookies: Value = serde_json::from_str(&raw)?;
            let res = client.post(format!("{}/collect", base))
                .headers(headers)
                .json(&json!({ "site_identifier": site, "cookies": cookies }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let json = check_response(status, &text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Non-2xx answers become errors so the process exits non-zero.
fn check_response(status: StatusCode, body: &str) -> Result<Value, String> {
    if !status.is_success() {
        return Err(format!("collector returned status {}: {}", status, body.trim()));
    }
    serde_json::from_str(body).map_err(|e| format!("unreadable collector response: {}", e))
}
