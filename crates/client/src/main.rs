use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mes_client::{ClientConfig, DEFAULT_BASE_URL, Sdk};
use mes_signer::Credential;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    #[clap(long, env = "MES_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    #[clap(long, env = "MES_APP_KEY")]
    app_key: String,
    #[clap(long, env = "MES_APP_SECRET", hide_env_values = true)]
    app_secret: String,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up a device under test by QR code.
    Devices {
        #[clap(long)]
        test_station_id: i64,
        #[clap(long)]
        qrcode: String,
    },
    /// Save test data for a device. Reads JSON from FILE, or stdin when omitted.
    TestData {
        #[clap(long)]
        qrcode: String,
        file: Option<PathBuf>,
    },
    /// Upload a test image.
    Upload { image: PathBuf },
    /// Send an instrument heartbeat.
    Ping {
        #[clap(long)]
        instrument_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let credential = Credential::new(args.app_key, args.app_secret).context("loading app key")?;
    let config = ClientConfig::new(&args.base_url, credential)?;
    let sdk = Sdk::new(config)?;

    let body = match args.command {
        Command::Devices {
            test_station_id,
            qrcode,
        } => sdk.get_devices(test_station_id, &qrcode).await?,
        Command::TestData { qrcode, file } => {
            let test_data = read_test_data(file).await?;
            sdk.save_test_data(&qrcode, &test_data).await?
        }
        Command::Upload { image } => sdk.upload_image(&image).await?,
        Command::Ping { instrument_id } => sdk.ping_instrument(instrument_id).await?,
    };

    println!("{body}");
    Ok(())
}

async fn read_test_data(file: Option<PathBuf>) -> Result<serde_json::Value> {
    let raw = match file {
        Some(path) => tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("reading test data from stdin")?;
            buf
        }
    };
    serde_json::from_slice(&raw).context("parsing test data JSON")
}
