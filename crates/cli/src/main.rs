use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use wiser_lib::client::RelayClient;
use wiser_lib::relay::BOT_NAME;
use wiser_lib::ui::{validate, ChatView};

#[derive(Parser)]
#[command(name = "wiserchild")]
#[command(about = "WiserChild CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and write the default config if missing.
    Init {
        /// Config file path (default: WISERCHILD_CONFIG_PATH or ~/.wiserchild/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the chat relay (POST /api/chat) in front of the Anthropic Messages API.
    Relay {
        /// Config file path (default: WISERCHILD_CONFIG_PATH or ~/.wiserchild/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Chat with WiserChild through a running relay (interactive).
    Chat {
        /// Config file path (default: WISERCHILD_CONFIG_PATH or ~/.wiserchild/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Your screen name.
        #[arg(long, short)]
        name: String,

        /// Anthropic API key (your "password").
        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("wiserchild {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Relay { config, port, bind }) => {
            if let Err(e) = run_relay(config, port, bind).await {
                log::error!("relay failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat {
            config,
            name,
            api_key,
        }) => {
            if let Err(e) = run_chat(config, name, api_key).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(wiser_lib::config::default_config_path);
    wiser_lib::init::init_config_dir(&path)?;
    println!(
        "initialized configuration at {}",
        path.parent().unwrap_or(Path::new(".")).display()
    );
    Ok(())
}

async fn run_relay(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = wiser_lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.relay.port = p;
    }
    if let Some(b) = bind {
        config.relay.bind = b;
    }
    log::info!(
        "starting relay on {}:{} (config {})",
        config.relay.bind,
        config.relay.port,
        path.display()
    );
    wiser_lib::relay::run_relay(config).await
}

async fn run_chat(
    config_path: Option<PathBuf>,
    name: String,
    api_key: String,
) -> anyhow::Result<()> {
    let (config, _) = wiser_lib::config::load_config(config_path)?;
    let session = validate(&name, &api_key)?;
    let client = RelayClient::new(wiser_lib::config::resolve_relay_url(&config));
    log::info!("chatting via relay at {}", client.base_url());

    let mut chat = ChatView::new(&session, BOT_NAME, Instant::now());
    let mut printed = 0;
    while let Some(deadline) = chat.next_deadline() {
        tokio::time::sleep_until(deadline.into()).await;
        chat.tick(Instant::now());
        if chat.typing_visible() {
            println!("{} is typing...", BOT_NAME);
        }
    }
    print_new(&chat, &mut printed);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "{}> ", chat.screen_name())?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        chat.input = input.to_string();
        let Some(request) = chat.submit() else {
            continue;
        };
        printed = chat.messages().len();
        println!("{} is typing...", BOT_NAME);
        chat.receive_reply(client.chat(&request).await);
        print_new(&chat, &mut printed);
    }
    Ok(())
}

/// Print transcript lines not shown yet.
fn print_new(chat: &ChatView, printed: &mut usize) {
    for m in &chat.messages()[*printed..] {
        println!(
            "{} ({}): {}",
            m.sender,
            wiser_lib::ui::format_time(&m.timestamp),
            m.text
        );
    }
    *printed = chat.messages().len();
}
