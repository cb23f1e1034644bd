use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser};
use going_home::config::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_FILE, DEFAULT_LOCATIONS_FILE, DEFAULT_TIMEOUT_SECS, Locations,
    Settings,
};
use going_home::fetcher::TransitFetcher;
use going_home::render::{Channel, render};
use going_home::transport::{
    ConnectionSource, MockTransportClient, TransportClient, TransportConfig,
};
use going_home::web::{self, AppState};
use tracing::{debug, info};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "going-home",
    version,
    about = "When to leave for the next connection home or to work"
)]
pub struct Cli {
    #[command(flatten)]
    mode: ModeArgs,

    /// YAML file with `home` and `work` locations.
    #[arg(long, env = "GOING_HOME_CONFIG", default_value = DEFAULT_LOCATIONS_FILE)]
    config: PathBuf,

    /// Where the last API response is cached.
    #[arg(long, env = "GOING_HOME_CACHE", default_value = DEFAULT_CACHE_FILE)]
    cache_file: PathBuf,

    /// Base URL of the journey API.
    #[arg(long, env = "GOING_HOME_API", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Port to listen on in server mode.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Serve this JSON file instead of querying the API.
    #[arg(long, value_name = "FILE")]
    mock: Option<PathBuf>,
}

/// Output modes; at most one may be given.
#[derive(Debug, Args)]
#[group(multiple = false)]
struct ModeArgs {
    /// Plain text (default).
    #[arg(long)]
    cli: bool,

    /// Desktop panel widget markup.
    #[arg(long)]
    argos: bool,

    /// Run an HTTP server.
    #[arg(long)]
    server: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Print(Channel),
    Server,
}

impl ModeArgs {
    fn mode(&self) -> Mode {
        if self.server {
            Mode::Server
        } else if self.argos {
            Mode::Print(Channel::Argos)
        } else {
            Mode::Print(Channel::Cli)
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let locations = Locations::load(&self.config)
            .with_context(|| format!("cannot load locations from {}", self.config.display()))?;
        let settings = Settings::new(locations)
            .with_cache_path(&self.cache_file)
            .with_base_url(&self.base_url)
            .with_timeout(self.timeout);
        let mode = self.mode.mode();

        match &self.mock {
            Some(path) => {
                let source = MockTransportClient::from_file(path)
                    .with_context(|| format!("cannot load mock data from {}", path.display()))?;
                run_mode(mode, source, &settings, self.port).await
            }
            None => {
                let config = TransportConfig::new()
                    .with_base_url(&settings.base_url)
                    .with_timeout(settings.timeout_secs);
                let source = TransportClient::new(config).context("cannot create API client")?;
                run_mode(mode, source, &settings, self.port).await
            }
        }
    }
}

async fn run_mode<S>(mode: Mode, source: S, settings: &Settings, port: u16) -> anyhow::Result<ExitCode>
where
    S: ConnectionSource + Send + Sync + 'static,
{
    let fetcher = TransitFetcher::new(source, settings);

    match mode {
        Mode::Print(channel) => {
            debug!(?channel, "running in print mode");
            let result = fetcher.run(&Local::now().fixed_offset()).await;
            let rendered = render(channel, &result)?;
            println!("{}", rendered.body);

            Ok(if rendered.failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Mode::Server => {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("cannot listen on {addr}"))?;
            info!(%addr, "running in server mode");
            println!("Going Home listening on http://{addr}");

            web::serve(listener, AppState::new(fetcher)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
