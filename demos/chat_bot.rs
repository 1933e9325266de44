//! Scripted chat client example
//!
//! Run with: cargo run --example chat_bot [ADDR] [TOKEN]
//!
//! Connects to a running broker (see `simple_broker`), joins the room, and
//! plays a short scripted conversation: typing feedback first, then the
//! message, then a feedback clear. Everything the room broadcasts back is
//! printed to stdout, so running two bots side by side shows the fan-out.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};

use roomcast::{ChatMessage, ClientEvent, ServerEvent};

const SCRIPT: &[&str] = &[
    "hello room",
    "the broker fans this out to everyone else",
    "goodbye",
];

async fn send(writer: &mut OwnedWriteHalf, event: &ClientEvent) -> roomcast::Result<()> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: chat_bot [ADDR] [TOKEN]");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  ADDR     Broker address (default: 127.0.0.1:7700)");
        eprintln!("  TOKEN    Credential and display name (default: bot)");
        return Ok(());
    }

    let addr: SocketAddr = args
        .get(1)
        .map(|a| a.replace("localhost", "127.0.0.1"))
        .unwrap_or_else(|| "127.0.0.1:7700".to_string())
        .parse()?;
    let token = args.get(2).cloned().unwrap_or_else(|| "bot".to_string());

    println!("Joining room at {} as '{}'", addr, token);

    let stream = TcpStream::connect(addr).await?;
    let (reader, mut writer) = stream.into_split();

    // Print everything the room sends us
    let printer = tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match serde_json::from_str::<ServerEvent>(&line) {
                Ok(ServerEvent::ClientsTotal { total }) => {
                    println!("<- {} client(s) in the room", total);
                }
                Ok(ServerEvent::ChatMessage(msg)) => {
                    println!("<- [{}] {}: {}", msg.date_time, msg.name, msg.message);
                }
                Ok(ServerEvent::Feedback { feedback }) if feedback.is_empty() => {
                    println!("<- (typing stopped)");
                }
                Ok(ServerEvent::Feedback { feedback }) => {
                    println!("<- {}", feedback);
                }
                Err(e) => {
                    eprintln!("Unparseable line from broker: {}", e);
                }
            }
        }
        println!("Connection closed by broker");
    });

    send(
        &mut writer,
        &ClientEvent::Connect {
            token: token.clone(),
        },
    )
    .await?;

    for text in SCRIPT {
        send(
            &mut writer,
            &ClientEvent::Feedback {
                feedback: format!("{} is typing...", token),
            },
        )
        .await?;
        sleep(Duration::from_secs(2)).await;

        let message = ChatMessage::new(
            token.as_str(),
            *text,
            chrono::Utc::now().to_rfc3339(),
        );
        send(&mut writer, &ClientEvent::Message(message)).await?;
        send(
            &mut writer,
            &ClientEvent::Feedback {
                feedback: String::new(),
            },
        )
        .await?;

        sleep(Duration::from_secs(3)).await;
    }

    // Stay in the room until interrupted so the other bots keep an audience
    tokio::select! {
        _ = printer => {}
        _ = tokio::signal::ctrl_c() => println!("\nLeaving the room..."),
    }

    Ok(())
}
