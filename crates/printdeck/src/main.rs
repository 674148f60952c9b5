use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use printdeck::host::DryRun;
use printdeck::host::StateFile;
use printdeck::Card;
use printdeck::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_CONFIG: &str = "printdeck.toml";

#[derive(Parser, Debug)]
#[command(version, about = "3D printer status card for Home Assistant")]
struct Cli {
    /// Config file [default: printdeck.toml, if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the printers found in a state dump
    Printers {
        /// JSON array of entity states, as returned by /api/states
        #[arg(long)]
        states: PathBuf,
    },
    /// Render the card for a state dump
    Status {
        #[arg(long)]
        states: PathBuf,

        /// Printer key to show instead of the default
        #[arg(long)]
        printer: Option<String>,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP API against a live Home Assistant instance
    #[cfg(feature = "host_ha")]
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(config.logging.targets())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Printers { states } => {
            let mut card = Card::new(config.card);
            card.set_states(StateFile::new(&states).load()?, None);
            for printer in card.printers() {
                let marker = if card.selection().key() == Some(printer.key.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}\t{}", marker, printer.key, printer.label);
            }
        }
        Command::Status {
            states,
            printer,
            json,
        } => {
            let base_url = config
                .host
                .as_ref()
                .map(|h| h.url.clone())
                .unwrap_or_default();
            let host = DryRun::new(&base_url);

            let mut card = Card::new(config.card);
            card.set_states(StateFile::new(&states).load()?, Some(&host));
            if let Some(key) = printer {
                card.select_printer(&key, Some(&host));
                anyhow::ensure!(
                    card.selection().key() == Some(key.as_str()),
                    "Printer '{}' not found in {}",
                    key,
                    states.display()
                );
            }

            let view = card.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", view);
            }
        }
        #[cfg(feature = "host_ha")]
        Command::Serve => serve(config).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => return Ok(Config::default()),
    };
    Config::from_file(path).with_context(|| format!("Loading {}", path.display()))
}

#[cfg(feature = "host_ha")]
async fn serve(config: Config) -> anyhow::Result<()> {
    use std::sync::Arc;

    use printdeck::api;
    use printdeck::host::HomeAssistant;

    let host_config = config
        .host
        .context("`serve` needs a [host] section with the Home Assistant URL")?;
    let token = host_config.token()?;

    tracing::info!("printdeck starting");
    tracing::info!("Home Assistant at {}", host_config.url);

    let ha = Arc::new(HomeAssistant::new(&host_config.url, token));
    let state = Arc::new(api::AppState::new(
        Card::new(config.card),
        ha.clone(),
        ha,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                shutdown_tx.send(()).ok();
            }
            Err(e) => {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                // Dropping the sender would stop the server.
                std::future::pending::<()>().await;
            }
        }
    });

    api::serve(&config.api.listen, config.api.port, state, shutdown_rx).await?;

    tracing::info!("printdeck shutdown complete");
    Ok(())
}
