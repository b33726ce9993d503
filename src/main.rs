use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use appcache_builder::{AppcacheConfig, LoadedConfig, ManifestBuilder, ManifestServer, manifest_attribute};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "appcache")]
#[command(version, about = "Build and serve an HTML5 application cache manifest")]
struct Cli {
  /// Configuration file (JSON or YAML); defaults to appcache.config.{json,yaml,yml} in the
  /// working directory
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Log debug output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Build a new appcache manifest file
  Build,
  /// Serve the built manifest over HTTP
  Serve {
    /// Address to listen on, overriding the configured one
    #[arg(long)]
    address: Option<String>,
  },
  /// Print the manifest attribute for the page's <html> element
  Link,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let loaded = load_config(cli.config.as_deref())?;
  let settings = loaded.settings();

  match cli.command {
    Command::Build => {
      ManifestBuilder::new(&settings)
        .build_and_store()
        .context("failed to build appcache manifest")?;
      println!("Wrote appcache to {}", settings.file_path().display());
    }
    Command::Serve { address } => {
      let address = address.unwrap_or_else(|| loaded.config.serve.address.clone());
      let server = ManifestServer::for_settings(&settings, loaded.config.serve.cache_ttl());
      server.run(&address)?;
    }
    Command::Link => println!("{}", manifest_attribute(&settings)),
  }

  Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<LoadedConfig> {
  match path {
    Some(path) => AppcacheConfig::load(path),
    None => {
      let cwd = std::env::current_dir().context("failed to determine working directory")?;
      AppcacheConfig::discover(&cwd)
    }
  }
}
