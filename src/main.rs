mod config;
mod error;
mod script;
mod session;

use std::path::{Path, PathBuf};

use canvas::registry::UploadedImage;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::HostConfig;
use crate::error::HostError;
use crate::session::{AuthBackend, HttpAuthBackend, SessionCredentials, require_session};

#[derive(Parser, Debug)]
#[command(name = "layoutpad", about = "Layout editor host: auth backend client and gesture replay")]
struct Cli {
    #[arg(long, env = "LAYOUTPAD_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "LAYOUTPAD_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "LAYOUTPAD_EMAIL")]
    email: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange email and password for a session token.
    Login {
        #[arg(long, env = "LAYOUTPAD_PASSWORD")]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long, env = "LAYOUTPAD_PASSWORD")]
        password: String,
        #[arg(long)]
        role: Option<String>,
    },
    /// Check whether the token is a live session.
    Session,
    /// Replay a gesture script through the editor and print the layout.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Gesture script (JSON array of steps).
    script: PathBuf,

    /// Background image to upload before the first step.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Engine tunables (JSON); missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Probe as a touch device, selecting the touch drag backend.
    #[arg(long, default_value_t = false)]
    touch: bool,
}

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(err) = dotenv {
        if !err.not_found() {
            tracing::warn!(error = %err, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    let host = HostConfig::new(&cli.base_url);
    let backend = HttpAuthBackend::new(&host)?;

    match cli.command {
        Command::Login { password } => {
            let email = cli.email.ok_or(HostError::MissingEmail)?;
            run_login(&backend, &email, &password).await
        }
        Command::Register { password, role } => {
            let email = cli.email.ok_or(HostError::MissingEmail)?;
            run_register(&backend, &email, &password, role.as_deref()).await
        }
        Command::Session => {
            let creds = credentials(cli.token, cli.email)?;
            let authenticated = backend.validate_session(&creds.token, &creds.email).await?;
            print_json(&serde_json::json!({ "isAuthenticated": authenticated }))
        }
        Command::Replay(args) => {
            let creds = credentials(cli.token, cli.email)?;
            require_session(&backend, &creds).await?;
            run_replay(args).await
        }
    }
}

fn credentials(token: Option<String>, email: Option<String>) -> Result<SessionCredentials, HostError> {
    let token = token.ok_or(HostError::MissingToken)?;
    let email = email.ok_or(HostError::MissingEmail)?;
    Ok(SessionCredentials { token, email })
}

async fn run_login(backend: &dyn AuthBackend, email: &str, password: &str) -> Result<(), HostError> {
    let outcome = backend.authenticate(email, password).await?;
    if !outcome.success {
        return Err(HostError::Denied(outcome.message));
    }
    tracing::info!(%email, "logged in");
    print_json(&outcome)
}

async fn run_register(
    backend: &dyn AuthBackend,
    email: &str,
    password: &str,
    role: Option<&str>,
) -> Result<(), HostError> {
    let outcome = backend.register(email, password, role).await?;
    if !outcome.success {
        return Err(HostError::Denied(outcome.message));
    }
    tracing::info!(%email, "registered");
    print_json(&outcome)
}

async fn run_replay(args: ReplayArgs) -> Result<(), HostError> {
    let raw = read_text(&args.script).await?;
    let steps = script::parse_script(&raw)?;
    let config = config::load_canvas_config(args.config.as_deref()).await?;
    let mut core = script::build_engine(&config, args.touch)?;

    if let Some(path) = &args.image {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| HostError::Io { path: path.display().to_string(), source })?;
        core.set_image(UploadedImage::from_bytes(script::image_mime(path), &bytes));
    }

    let actions = script::replay(&mut core, &steps)?;
    tracing::info!(steps = steps.len(), actions = actions.len(), "replay finished");
    print_json(&script::Layout::of(&core))
}

async fn read_text(path: &Path) -> Result<String, HostError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| HostError::Io { path: path.display().to_string(), source })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), HostError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
