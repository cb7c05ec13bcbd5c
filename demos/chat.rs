//! Minimal wRAC chat session.
//!
//! Connects, prints server info and history, sends one message, then
//! prints pushes until Ctrl+C.
//!
//! Usage:
//!   cargo run --example chat -- ws://127.0.0.1:42667 "hello" [--debug]

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use wrac_client::{Client, EventName, Result};

fn init_logging(debug: bool) {
    let filter = if debug {
        "wrac_client=debug"
    } else {
        "wrac_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug = args.iter().any(|arg| arg == "--debug");
    let mut positional = args.iter().filter(|arg| !arg.starts_with("--"));

    let url = positional
        .next()
        .cloned()
        .unwrap_or_else(|| "ws://127.0.0.1:42667".to_owned());
    let text = positional.next().cloned();

    init_logging(debug);

    let client = Client::builder()
        .url(url)
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    client.subscribe(EventName::Messages, |event| {
        if let Some(messages) = event.messages() {
            for message in messages {
                println!("{message}");
            }
        }
    });
    client.subscribe(EventName::Close, |event| {
        println!("[closed] {event:?}");
    });

    client.connect().await?;

    let info = client.get_server_info()?.await?;
    println!("Connected to {info}");

    let size = client.get_message_size()?.await?;
    println!("History: {size} bytes");
    client.read_all_messages()?.await?;

    if let Some(text) = text {
        client.send_message(text)?;
    }

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();

    client.disconnect();
    Ok(())
}
