mod config;
mod http;
mod net;
mod store;
mod worker;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;
use url::Url;

use crate::http::Request;
use crate::net::HttpFetcher;
use crate::store::{CacheStores, SqliteStores};
use crate::worker::CacheController;

#[derive(Parser, Debug)]
#[command(name = "shellcache")]
#[command(about = "Offline app-shell cache controller")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/shellcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Prime the current-generation store with the app shell
  Install,
  /// Remove cache stores left over from older generations
  Activate,
  /// List cache stores and their entry counts
  Status,
  /// Route a request through the controller and print the response body
  Get {
    /// Request URL (origin-relative or absolute)
    url: String,

    /// Treat the request as a full-page navigation
    #[arg(long)]
    navigate: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;

  let stores = SqliteStores::open()?;

  if let Command::Status = args.command {
    return print_status(&stores, &config.cache_name);
  }

  let origin = Url::parse(&config.origin)
    .map_err(|e| eyre!("Invalid origin {}: {}", config.origin, e))?;
  let fetcher = HttpFetcher::new(origin)?;
  let controller = CacheController::new(stores, fetcher, &config);

  match args.command {
    Command::Install => controller.install().await,
    Command::Activate => controller.activate().await,
    Command::Get { url, navigate } => {
      let request = if navigate {
        Request::navigate(url)
      } else {
        Request::subresource(url)
      };

      let served = controller.handle_fetch(&request).await?;
      eprintln!("{} ({:?})", served.response.status, served.source);
      std::io::stdout().write_all(&served.response.body)?;
      Ok(())
    }
    Command::Status => unreachable!("handled above"),
  }
}

fn print_status(stores: &SqliteStores, current: &str) -> Result<()> {
  for name in stores.names()? {
    let marker = if name == current { "*" } else { " " };
    let count = stores.urls(&name)?.len();
    println!("{marker} {name} ({count} entries)");
  }
  Ok(())
}
