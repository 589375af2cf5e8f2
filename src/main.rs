use std::sync::Arc;
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info};
use chatline::app::App;
use chatline::identity::{reset_client_id, CLIENT_ID_KEY};
use chatline::tui::{Events, TerminalGuard};
use chatline::{
    handler, logging, resolve_client_id, ui, ChatClient, ChatSession, Config, FileStore,
    HttpTransport, KeyValueStore, RouteProbe, SendOutcome,
};

#[derive(Parser)]
#[command(name = "chatline")]
#[command(about = "Chat with a remote chat endpoint from the terminal")]
struct Cli {
    /// Base URL of the chat endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Interface and reply language (en, zh)
    #[arg(long, global = true)]
    language: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat window (default)
    Chat,
    /// Send one message and print the reply
    Send {
        /// Message text
        text: String,
    },
    /// Show the client identifier
    Id {
        /// Forget the stored identifier
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?.with_env();
    if let Some(url) = cli.base_url {
        config.base_url = Some(url);
    }
    if let Some(language) = cli.language {
        config.language = Some(language);
    }

    let data_dir = Config::data_dir()?;
    let _logger = logging::init(config.log_level(), &data_dir.join("logs"))?;
    let store = FileStore::open(data_dir.join("storage.json"));

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&config, store).await?,
        Commands::Send { text } => send_once(&config, store, &text).await,
        Commands::Id { reset } => show_id(store, reset)?,
    }

    Ok(())
}

fn connect(config: &Config, store: Option<FileStore>) -> ChatClient {
    let client_id = resolve_client_id(store.as_ref().map(|s| s as &dyn KeyValueStore));
    let url = config.endpoint_url();
    info!("Chat endpoint {}", url);

    ChatClient::new(
        ChatSession::new(client_id, config.language()),
        Arc::new(HttpTransport::new(&url)),
        Arc::new(RouteProbe::new()),
    )
}

async fn run_chat(config: &Config, store: Option<FileStore>) -> Result<()> {
    let client = connect(config, store);
    let mut app = App::new(client, config.endpoint_url());

    let mut terminal = TerminalGuard::enter()?;
    let mut events = Events::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    drop(terminal);
    if let Err(e) = &result {
        error!("Chat window closed with error: {}", e);
    }
    result
}

async fn send_once(config: &Config, store: Option<FileStore>, text: &str) {
    let mut client = connect(config, store);
    match client.send_text(Some(text)).await {
        SendOutcome::Sent => {
            if let Some(reply) = client.messages().last() {
                println!("{}", reply.text);
            }
        }
        SendOutcome::Empty => eprintln!("Nothing to send"),
        SendOutcome::Busy => {}
    }
}

fn show_id(store: Option<FileStore>, reset: bool) -> Result<()> {
    let Some(store) = store else {
        println!("Local storage unavailable; a new id is generated every session");
        return Ok(());
    };

    if reset {
        reset_client_id(&store)?;
        println!("Client id cleared from {}", store.path().display());
        return Ok(());
    }

    let id = resolve_client_id(Some(&store));
    println!("{}", id);
    println!("(stored as \"{}\" in {})", CLIENT_ID_KEY, store.path().display());
    Ok(())
}
