//! Command-line front end for the credential core.
//!
//! Registers users and issues access tokens against the flat-file user
//! store configured in `authcore.toml`. Passwords are read from the first
//! line of stdin, never from the command line.
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{bail, Context};
use authcore_common::{SignInCredentials, SignUpCredentials};
use authcore_lib::{config::Settings, AppState};
use clap::{Parser, Subcommand};
use rand::RngCore;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "authcore", version, about = "User registration and login")]
struct Cli {
    /// Configuration file (TOML, or JSON by extension)
    #[arg(short, long, default_value = "authcore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new user (password on stdin)
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Log in and print an access token (password on stdin)
    Signin {
        #[arg(long)]
        email: String,
    },
    /// Verify a token and print its claims
    InspectToken { token: String },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// First line of `input` without its line ending
fn read_password(mut input: impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line).context("reading password")? == 0 {
        bail!("expected a password on stdin");
    }
    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);
    Ok(line)
}

/// 32 random bytes, hex encoded
fn ephemeral_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_tracing(&settings.log_level);

    if settings.token.secret.is_none() {
        warn!("no token secret configured, using an ephemeral one; issued tokens will not verify in later runs");
        settings.token.secret = Some(ephemeral_secret());
    }

    let state = AppState::with_flat_file_store(settings)?;

    let output = match cli.command {
        Command::Signup { name, email } => {
            let password = read_password(io::stdin().lock())?;
            let user = state
                .auth
                .sign_up(SignUpCredentials::new(name, email, password))
                .await?;
            serde_json::to_string_pretty(&user)?
        },
        Command::Signin { email } => {
            let password = read_password(io::stdin().lock())?;
            let token = state
                .auth
                .sign_in(SignInCredentials::new(email, password))
                .await?;
            serde_json::to_string_pretty(&token)?
        },
        Command::InspectToken { token } => {
            let claims = state.signer.verify(&token)?;
            serde_json::to_string_pretty(&claims)?
        },
    };

    println!("{output}");
    Ok(())
}
