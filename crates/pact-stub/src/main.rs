use anyhow::Context;
use clap::Parser;
use pact_stub::{ContractSource, LogFormat, LoggingConfig, Stub, StubConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pact stub server - replay pact interactions over HTTP
#[derive(Parser, Debug)]
#[command(name = "pact-stub", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "PACT_STUB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "PACT_STUB_PORT")]
    port: Option<u16>,

    /// Interface to bind (overrides the config file)
    #[arg(long, env = "PACT_STUB_HOST")]
    host: Option<String>,

    #[command(flatten)]
    source: SourceArgs,

    /// Only replay interactions recorded under this provider state
    #[arg(long, env = "PACT_STUB_PROVIDER_STATE")]
    provider_state: Option<String>,

    /// Only replay interactions with this description
    #[arg(long, env = "PACT_STUB_DESCRIPTION")]
    description: Option<String>,

    /// Accept any request body
    #[arg(long)]
    no_body_matching: bool,

    /// Log filter directive used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Pact file to simulate
    #[arg(long, env = "PACT_STUB_PACT_FILE")]
    pact_file: Option<PathBuf>,

    /// Pact JSON to simulate
    #[arg(long)]
    pact_json: Option<String>,

    /// Pact broker URL of the pact to simulate
    #[arg(long, env = "PACT_STUB_BROKER_URL")]
    broker_url: Option<String>,

    /// Echo request bodies back with this status code instead of simulating a pact
    #[arg(long, value_name = "STATUS")]
    echo: Option<u16>,
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn build_config(args: &Args) -> anyhow::Result<StubConfig> {
    let mut config = match &args.config {
        Some(path) => StubConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StubConfig::default(),
    };

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if args.no_body_matching {
        config.match_body = false;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;
    init_logging(&config.logging);

    let match_body = config.match_body;
    let stub = Stub::new(config);
    if let Some(state) = &args.provider_state {
        stub.filter_on_provider_state(state);
    }
    if let Some(description) = &args.description {
        stub.filter_on_description(description);
    }

    match args.source.echo {
        Some(status) => {
            stub.echo(status).await?;
        }
        None => {
            let source = contract_source(args.source)?;
            stub.from_source(source, match_body).await?;
        }
    }

    if let Some(addr) = stub.local_addr() {
        info!("pact-stub listening on {}", addr);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    stub.stop().await;
    Ok(())
}

fn contract_source(source: SourceArgs) -> anyhow::Result<ContractSource> {
    if let Some(path) = source.pact_file {
        return Ok(ContractSource::File(path));
    }
    if let Some(json) = source.pact_json {
        return Ok(ContractSource::Json(json));
    }
    if let Some(url) = source.broker_url {
        return Ok(ContractSource::Broker(url));
    }
    anyhow::bail!("One of --pact-file, --pact-json, --broker-url or --echo is required")
}
