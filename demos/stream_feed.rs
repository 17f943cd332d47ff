//! Streaming feed example
//!
//! Opens a stream against a Fluidinfo instance and prints every record until
//! Ctrl-C, then stops the session and drains what was already buffered.
//!
//! Run with:
//!   FLUIDINFO_USER=alice FLUIDINFO_PASSWORD=secret \
//!     cargo run --example stream_feed -- /records/feed

use anyhow::Context;
use fluidinfo_stream::{ClientConfig, Credentials, FluidinfoClient, StreamRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "/records/feed".to_string());
    let user = std::env::var("FLUIDINFO_USER").context("FLUIDINFO_USER not set")?;
    let password = std::env::var("FLUIDINFO_PASSWORD").context("FLUIDINFO_PASSWORD not set")?;

    let mut config = ClientConfig::new(Credentials::new(user, password));
    if let Ok(base_url) = std::env::var("FLUIDINFO_URL") {
        config.base_url = base_url;
    }

    let client = FluidinfoClient::new(config);
    let metadata = client
        .start_stream(StreamRequest::get(path.as_str()))
        .await
        .with_context(|| format!("opening stream {}", path))?;
    println!("Streaming {} (status {})", path, metadata.status);

    let records = client.records();
    loop {
        tokio::select! {
            envelope = records.recv() => {
                let Some(envelope) = envelope else { break };
                let record = envelope.record();
                let tags: Vec<&str> = record.tags().keys().map(String::as_str).collect();
                println!("{}  tags={:?}", record.id(), tags);
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping...");
                break;
            }
        }
    }

    client.stop();
    client.close_records().await;
    while let Some(envelope) = records.recv().await {
        println!("{}  (buffered)", envelope.record().id());
    }

    let diagnostics = client.diagnostics();
    println!(
        "delivered={} reconnects={} malformed={}",
        diagnostics.records_delivered, diagnostics.reconnects, diagnostics.malformed_records
    );
    Ok(())
}
