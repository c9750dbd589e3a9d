use clap::Parser;
use recordhub_server::ServerBuilder;
use recordhub_server::config::loader::load_config;

/// RecordHub GraphQL record API server.
#[derive(Parser, Debug)]
#[command(name = "recordhub-server", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "RECORDHUB_CONFIG", default_value = "recordhub.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    recordhub_server::observability::init_tracing();

    let cli = Cli::parse();

    let cfg = match load_config(Some(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(path = %cli.config, "Configuration loaded");
    recordhub_server::observability::apply_logging_level(&cfg.logging.level);

    let server = ServerBuilder::new().with_config(cfg).build().await?;
    server.run().await
}
