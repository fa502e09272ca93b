//! appstore-verify - verify App Store signed payloads from the command line.

use std::io::Read as _;
use std::path::PathBuf;

use appstore_cli::Config;
use appstore_cli::config::load_certificate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr as _;

#[derive(Parser)]
#[command(name = "appstore-verify")]
#[command(about = "Verify App Store signed transactions and notifications", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a signed payload and print its claims
    Decode {
        /// Compact JWS, or `-` to read from stdin
        token: String,
    },

    /// Show the metadata of a certificate file
    Inspect {
        /// DER or PEM certificate
        path: PathBuf,
    },

    /// Show the resolved configuration
    Config,
}

fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { token } => cmd_decode(cli.config, &token),
        Commands::Inspect { path } => cmd_inspect(&path),
        Commands::Config => cmd_config(cli.config),
    }
}

fn load_config(path: Option<PathBuf>) -> color_eyre::eyre::Result<Config> {
    let path = path.unwrap_or_else(Config::config_path);
    Config::load_from(&path).wrap_err_with(|| format!("failed to load {}", path.display()))
}

fn cmd_decode(config: Option<PathBuf>, token: &str) -> color_eyre::eyre::Result<()> {
    let config = load_config(config)?;
    let verifier = config.verifier().wrap_err("failed to initialize verifier")?;

    let token = if token == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read token from stdin")?;
        buf
    } else {
        token.to_string()
    };

    let claims = match verifier.decode(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), environment = %verifier.environment(), "rejected signed data");
            return Err(e).wrap_err("signed data verification failed");
        }
    };

    tracing::info!(claims = claims.len(), "signed data verified");
    println!("{}", serde_json::to_string_pretty(&claims)?);

    Ok(())
}

fn cmd_inspect(path: &std::path::Path) -> color_eyre::eyre::Result<()> {
    let cert = load_certificate(path)?;

    println!("Subject:    {}", cert.subject());
    println!("Issuer:     {}", cert.issuer());
    println!("Serial:     {}", cert.serial());
    println!("Valid from: {}", cert.valid_from());
    println!("Valid to:   {}", cert.valid_to());
    println!("Extensions:");
    for oid in cert.extension_oids() {
        println!("  {}", oid);
    }

    Ok(())
}

fn cmd_config(config: Option<PathBuf>) -> color_eyre::eyre::Result<()> {
    let config = load_config(config)?;

    println!("Environment:   {}", config.environment);
    println!("Online checks: {}", config.online_checks);
    println!("Root certificates:");
    for root in &config.root_certificates {
        println!("  {}", root.display());
    }

    Ok(())
}
