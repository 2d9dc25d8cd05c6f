use clap::{Parser, Subcommand};
use fin360::{Client, ClientConfig, StatementUpload, parse_transactions_with_details};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "fin360-cli", about = "CLI wrapper for the Fin360 statement API")]
struct Cli {
    /// Access token; falls back to FIN360_ACCESS_TOKEN env var
    #[arg(long, env = "FIN360_ACCESS_TOKEN")]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and print the access token
    Login {
        #[arg(long, env = "FIN360_EMAIL")]
        email: String,
        #[arg(long, env = "FIN360_PASSWORD")]
        password: String,
    },
    /// Upload a statement file
    Upload {
        /// Bank code, e.g. ICICI
        #[arg(long)]
        bank: String,
        /// SAVING, CURRENT or CREDIT_CARD
        #[arg(long)]
        account_type: String,
        #[arg(long)]
        file: PathBuf,
        /// Extra form fields as key=value
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Fetch transactions of an uploaded statement
    Transactions {
        #[arg(long)]
        account_id: String,
        /// Print a summary instead of the raw JSON
        #[arg(long)]
        summary: bool,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut client = Client::with_config(ClientConfig {
        access_token: cli.token,
        timeout: Duration::from_secs(cli.timeout),
    })?;

    match cli.command {
        Commands::Login { email, password } => {
            client.authenticate(&email, &password).await?;
            println!("{}", client.access_token().unwrap_or_default());
        }
        Commands::Upload {
            bank,
            account_type,
            file,
            fields,
        } => {
            let statement = fields
                .into_iter()
                .fold(StatementUpload::new(bank, account_type, &file), |s, (k, v)| {
                    s.with_field(k, v)
                });
            client.upload_statement(&statement).await?;
            println!("Uploaded {}", file.display());
        }
        Commands::Transactions {
            account_id,
            summary,
        } => {
            let body = client.get_transactions_with_details(&account_id).await?;
            if summary {
                let parsed = parse_transactions_with_details(&body)?;
                for txn in &parsed.transactions {
                    println!(
                        "{} {:>12} {}",
                        txn.date,
                        txn.amount,
                        txn.description.as_deref().unwrap_or("")
                    );
                }
            } else {
                println!("{}", serde_json::to_string_pretty(body.as_value())?);
            }
        }
    }

    Ok(())
}
