//! rekey command-line tool
//!
//! Drives the account recovery flow end to end: key generation, setup
//! submission, out-of-band confirmation, and recovery execution against
//! a configured recovery service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use rekey_core::{Address, LocalSigner, RecoverySession, SessionConfig};

/// rekey account recovery CLI
#[derive(Parser)]
#[command(name = "rekey")]
#[command(about = "Account recovery protocol client")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize client configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Generate a recovery signing key and show its account address
    Keygen {
        /// File to write the hex-encoded secret key to
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Submit a setup request for an address
    Setup {
        /// Account address to protect (0x-prefixed hex)
        address: String,
        /// Phone number for out-of-band confirmation
        #[arg(short, long)]
        phone: String,
        /// Email address for out-of-band confirmation
        #[arg(short, long)]
        email: String,
        /// Hex-encoded secret key file; omit to delegate to the tenant
        #[arg(short, long)]
        key_file: Option<PathBuf>,
    },

    /// Confirm a pending setup with the out-of-band code
    Confirm {
        /// Verification id returned by the setup step
        verification_id: String,
        /// Confirmation code received by phone or email
        code: String,
        /// Hex-encoded secret key file; omit to delegate to the tenant
        #[arg(short, long)]
        key_file: Option<PathBuf>,
    },

    /// Execute a recovery, rotating an old address to a new one
    Recover {
        /// Address being recovered (0x-prefixed hex)
        old_address: String,
        /// Replacement address (0x-prefixed hex)
        new_address: String,
        /// Recovery id returned by the setup step
        #[arg(short, long)]
        recovery_id: String,
        /// Hex-encoded secret key file; omit to delegate to the tenant
        #[arg(short, long)]
        key_file: Option<PathBuf>,
    },

    /// Show the active configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .init();

    let config_path = cli.config.unwrap_or_else(default_config_file);

    let config = if config_path.exists() {
        SessionConfig::from_file(&config_path)?
    } else {
        info!("No configuration at {}, using defaults", config_path.display());
        SessionConfig::default()
    };

    match cli.command {
        Commands::Init { force } => handle_init(&config_path, force).await,
        Commands::Keygen { out } => handle_keygen(out.as_deref()).await,
        Commands::Setup {
            address,
            phone,
            email,
            key_file,
        } => handle_setup(&config, &address, &phone, &email, key_file.as_deref()).await,
        Commands::Confirm {
            verification_id,
            code,
            key_file,
        } => handle_confirm(&config, &verification_id, &code, key_file.as_deref()).await,
        Commands::Recover {
            old_address,
            new_address,
            recovery_id,
            key_file,
        } => {
            handle_recover(
                &config,
                &old_address,
                &new_address,
                &recovery_id,
                key_file.as_deref(),
            )
            .await
        }
        Commands::Status => handle_status(&config, &config_path).await,
    }
}

async fn handle_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        println!("⚠️  Configuration file already exists. Use --force to overwrite.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let config = SessionConfig::default();
    config.save_to_file(config_path)?;

    println!("✅ Configuration initialized at: {}", config_path.display());
    println!("   Set recovery_url (and tenant_url for delegated signing) before use.");

    Ok(())
}

async fn handle_keygen(out: Option<&Path>) -> Result<()> {
    let signer = LocalSigner::generate();

    println!("🔑 Generated recovery signing key");
    println!("  Address: {}", signer.address());

    let key_hex = hex::encode(signer.secret_key().secret_bytes());
    match out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", key_hex))
                .with_context(|| format!("Failed to write key file: {}", path.display()))?;
            println!("  Secret key written to: {}", path.display());
        }
        None => {
            println!("  Secret key: {}", key_hex);
        }
    }

    Ok(())
}

async fn handle_setup(
    config: &SessionConfig,
    address: &str,
    phone: &str,
    email: &str,
    key_file: Option<&Path>,
) -> Result<()> {
    let address = Address::from_hex(address)?;
    let session = build_session(config, key_file)?;

    let response = session.initiate_setup(&address, phone, email).await?;

    println!("✅ Setup request accepted for {}", address);
    println!("  Recovery id: {}", response.recovery_id);
    if let Some(verification_id) = &response.verification_id {
        println!("  Verification id: {}", verification_id);
    }
    print_extra(&response.extra)?;

    Ok(())
}

async fn handle_confirm(
    config: &SessionConfig,
    verification_id: &str,
    code: &str,
    key_file: Option<&Path>,
) -> Result<()> {
    let session = build_session(config, key_file)?;

    let response = session.confirm_setup(code, verification_id).await?;

    println!("✅ Setup confirmed");
    println!("  Verification id: {}", response.verification_id);
    print_extra(&response.extra)?;

    Ok(())
}

async fn handle_recover(
    config: &SessionConfig,
    old_address: &str,
    new_address: &str,
    recovery_id: &str,
    key_file: Option<&Path>,
) -> Result<()> {
    let old_address = Address::from_hex(old_address)?;
    let new_address = Address::from_hex(new_address)?;
    let session = build_session(config, key_file)?;

    let response = session
        .initiate_recovery(&old_address, &new_address, recovery_id)
        .await?;

    println!("✅ Recovery request accepted: {} -> {}", old_address, new_address);
    println!("  Recovery id: {}", response.recovery_id);
    print_extra(&response.extra)?;

    Ok(())
}

async fn handle_status(config: &SessionConfig, config_path: &Path) -> Result<()> {
    println!("📡 Recovery client configuration");
    println!("  Config file: {}", config_path.display());

    if config.recovery_url.is_empty() {
        println!("  Recovery service: ❌ not set");
    } else {
        println!("  Recovery service: ✅ {}", config.recovery_url);
    }

    match &config.tenant_url {
        Some(url) => println!("  Tenant delegate: ✅ {}", url),
        None => println!("  Tenant delegate: ❌ not set (self-signing via --key-file)"),
    }

    println!("  Request timeout: {} ms", config.http.timeout_ms);

    Ok(())
}

// Helper functions

fn build_session(config: &SessionConfig, key_file: Option<&Path>) -> Result<RecoverySession> {
    match key_file {
        Some(path) => {
            let key_hex = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read key file: {}", path.display()))?;
            let signer = LocalSigner::from_hex(key_hex.trim())?;
            Ok(RecoverySession::with_local_signer(config, signer)?)
        }
        None => Ok(RecoverySession::with_delegated_signer(config)?),
    }
}

fn print_extra(extra: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
    if !extra.is_empty() {
        println!("  Service response: {}", serde_json::to_string_pretty(extra)?);
    }
    Ok(())
}

fn default_config_file() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".rekey").join("config.toml")
    } else {
        PathBuf::from("/etc/rekey/config.toml")
    }
}
