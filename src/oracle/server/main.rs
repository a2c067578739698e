use prefix_mac_forgery::{random_key, server, Algorithm};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Serve a secret-prefix MAC oracle over HTTP.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value = "127.0.0.1:9000")]
    address: String,

    /// Hash underlying the MAC: sha1 or md4.
    #[arg(long, default_value = "sha1")]
    algorithm: Algorithm,

    /// Hex encoded secret key. A random 16 byte key is used when omitted.
    #[arg(long)]
    key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let key = match args.key {
        Some(key) => hex::decode(key)?,
        None => random_key(&mut rand::thread_rng(), 16),
    };

    let request_handler = server::MacRequestHandler::new(args.algorithm, &key);
    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        algorithm = %args.algorithm,
        key_len = key.len(),
        "serving MAC oracle"
    );
    axum::serve(listener, server::router(request_handler)).await?;
    Ok(())
}
