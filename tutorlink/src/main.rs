use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tutorlink::ChatError;
use tutorlink::backend::HttpBackend;
use tutorlink::chat::{ChatListener, ChatManager};
use tutorlink::config::ClientConfig;
use tutorlink::models::{Identity, Message};

#[derive(Debug)]
enum ConsoleEvent {
    Updated {
        peer: Identity,
        messages: Vec<Message>,
    },
    Halted {
        peer: Identity,
        error: ChatError,
    },
}

struct ConsoleListener {
    tx: mpsc::Sender<ConsoleEvent>,
}

#[async_trait]
impl ChatListener for ConsoleListener {
    async fn on_conversation_updated(&self, peer: Identity, messages: Vec<Message>) {
        if let Err(err) = self.tx.send(ConsoleEvent::Updated { peer, messages }).await {
            tracing::debug!(?err, "Console closed");
        }
    }

    async fn on_sync_halted(&self, peer: Identity, error: ChatError) {
        if let Err(err) = self.tx.send(ConsoleEvent::Halted { peer, error }).await {
            tracing::debug!(?err, "Console closed");
        }
    }
}

enum Command {
    Open(Identity),
    Leave,
    Peers,
    Quit,
    Send(String),
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };
    let mut parts = rest.split_whitespace();
    match parts.next() {
        Some("open") => {
            let id = parts.next().ok_or("usage: /open <user id>")?;
            let id: i64 = id.parse().map_err(|_| format!("not a user id: {id}"))?;
            Ok(Command::Open(Identity(id)))
        }
        Some("leave") => Ok(Command::Leave),
        Some("peers") => Ok(Command::Peers),
        Some("quit") => Ok(Command::Quit),
        _ => Err(format!("unknown command: {line}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorlink=warn,tutorlink_transport=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(?err, "No .env file loaded");
    }
    let config = ClientConfig::from_env().context("Failed to load client config")?;
    let backend = Arc::new(HttpBackend::new(config.session()));
    let (tx, mut rx) = mpsc::channel(64);
    let manager = ChatManager::with_listener(
        backend,
        Arc::new(ConsoleListener { tx }),
        config.poll_interval,
    )
    .await
    .with_context(|| format!("Failed to sign in at {}", config.api_url))?;
    let viewer = manager.viewer();
    println!(
        "Signed in as {} ({}, id {})",
        viewer.display_name(),
        viewer.role,
        viewer.id
    );
    print_peers(&manager).await;
    println!("Commands: /open <id>, /leave, /peers, /quit. Other lines are sent to the open conversation.");
    let mut printed: HashMap<Identity, usize> = HashMap::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => run_command(&manager, command, &mut printed).await,
                    Err(err) => println!("{err}"),
                }
            }
            Some(event) = rx.recv() => match event {
                ConsoleEvent::Updated { peer, messages } => {
                    print_new_messages(&manager, peer, &messages, &mut printed);
                }
                ConsoleEvent::Halted { peer, error } => {
                    println!("Stopped syncing with {peer}: {error}. Use /open {peer} to retry.");
                }
            },
        }
    }
    manager.sign_out();
    Ok(())
}

async fn run_command(manager: &ChatManager, command: Command, printed: &mut HashMap<Identity, usize>) {
    match command {
        Command::Open(peer) => {
            printed.remove(&peer);
            match manager.select_peer(peer).await {
                Ok(()) => println!("Opened conversation with {peer}"),
                Err(err) => println!("Failed to open conversation with {peer}: {err}"),
            }
        }
        Command::Leave => {
            manager.leave_conversation();
            println!("Left conversation");
        }
        Command::Peers => print_peers(manager).await,
        Command::Send(content) => {
            if let Err(err) = manager.send_to_active(&content).await {
                println!("Not sent ({err}): {content}");
            }
        }
        Command::Quit => {}
    }
}

async fn print_peers(manager: &ChatManager) {
    match manager.load_peers().await {
        Ok(peers) if peers.is_empty() => println!("No peers available"),
        Ok(peers) => {
            for peer in peers {
                println!(
                    "  [{}] {} <{}> unread: {}",
                    peer.user.id,
                    peer.user.display_name(),
                    peer.user.email,
                    peer.unread
                );
            }
        }
        Err(err) => println!("Failed to load peers: {err}"),
    }
}

fn print_new_messages(
    manager: &ChatManager,
    peer: Identity,
    messages: &[Message],
    printed: &mut HashMap<Identity, usize>,
) {
    if manager.active_peer() != Some(peer) {
        return;
    }
    let seen = printed.entry(peer).or_default();
    if *seen > messages.len() {
        *seen = 0;
    }
    let viewer = manager.viewer().id;
    for message in &messages[*seen..] {
        let who = if message.sender_id == viewer {
            "me".to_string()
        } else {
            message.sender_id.to_string()
        };
        println!(
            "[{}] {}: {}",
            message.created_at.0.format("%H:%M:%S"),
            who,
            message.content
        );
    }
    *seen = messages.len();
}
