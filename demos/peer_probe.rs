//! Probe peer for a running relay
//!
//! Connects to a relay, announces itself with a join, and prints every
//! frame it receives. Handy for watching a room's signaling traffic.
//!
//! Run with: cargo run --example peer_probe [URL]
//!
//! Examples:
//!   cargo run --example peer_probe
//!   cargo run --example peer_probe ws://localhost:8080/websocket?room=demo

use signal_relay::{SignalClient, SignalMessage};

const DEFAULT_URL: &str = "ws://127.0.0.1:8080/websocket?room=demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let url = args.get(1).map(String::as_str).unwrap_or(DEFAULT_URL);

    println!("Connecting to {}", url);
    let mut client = SignalClient::connect(url).await?;

    client.send(&SignalMessage::new("join")).await?;
    println!("Joined; waiting for traffic (ctrl-c to quit)");

    loop {
        tokio::select! {
            frame = client.recv() => {
                match frame? {
                    Some(msg) => {
                        println!(
                            "<- type={} from={} to={} extra={}",
                            msg.kind.as_deref().unwrap_or("-"),
                            msg.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                            msg.to.map(|to| to.to_string()).unwrap_or_else(|| "-".into()),
                            serde_json::Value::Object(msg.extra.clone()),
                        );
                    }
                    None => {
                        println!("Relay closed the connection");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nLeaving...");
                break;
            }
        }
    }

    // The relay may already have closed the socket; either way we're done.
    let _ = client.close().await;

    Ok(())
}
