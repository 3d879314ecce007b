//! relaychat terminal client
//! Usage:
//!   relaychat-chat [relay-url]
//!
//! Type a message and press enter. `/new` starts a new chat, `/quit` exits.

use anyhow::Result;
use relaychat::client::{RelayClient, describe_detail};
use relaychat::error::{ClientError, SessionError};
use relaychat::{ChatSession, Config};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = Config::load()?;
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.client.relay_url.clone());

    let client = RelayClient::new(url);
    let mut session = ChatSession::new(config.client.greeting.clone());

    println!("💬 relaychat v{} → {}", relaychat::VERSION, client.url());
    println!("   /new starts a new chat, /quit exits\n");
    print_lines(session.transcript().render());

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/new" => {
                session.new_chat();
                println!("\n✨ New chat\n");
                print_lines(session.transcript().render());
                continue;
            }
            _ => {}
        }

        // An empty line after a failed send retries the restored draft
        let retry = line.trim().is_empty() && !session.draft().is_empty();
        if !retry {
            session.set_draft(line);
        }
        let before = session.transcript().entries().len();

        match session.submit(&client).await {
            Ok(()) => print_lines(session.transcript().render_from(before + 1)),
            Err(e) => match e.downcast_ref::<SessionError>() {
                Some(SessionError::EmptyDraft) => continue,
                Some(SessionError::Busy) => eprintln!("⏳ {}", e),
                None => {
                    let message = match e.downcast_ref::<ClientError>() {
                        Some(ClientError::Relay(detail)) => describe_detail(detail),
                        _ => e.to_string(),
                    };
                    eprintln!("⚠️  Not sent: {} (press enter to retry)", message);
                }
            },
        }
    }

    println!("\n👋 Bye");
    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
