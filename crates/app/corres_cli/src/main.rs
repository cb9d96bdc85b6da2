// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use corres_core::auth::validation;
use corres_core::backend::{AuthBackend, http::HttpAuthBackend, mock::MockAuthBackend};
use corres_core::models::auth::{Action, LoginCredentials, Resource};
use corres_core::session::persist::FileSessionPersister;
use corres_core::session::{SessionManager, SessionPhase};

mod cli;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    let backend: Arc<dyn AuthBackend> = match &args.api_url {
        Some(url) => Arc::new(HttpAuthBackend::new(url)?),
        None => Arc::new(MockAuthBackend::new()),
    };
    let persister = match &args.session_file {
        Some(path) => FileSessionPersister::new(path),
        None => FileSessionPersister::default_location(),
    };

    // Every invocation restores the persisted session and re-validates it
    // before the command runs.
    let mut manager = SessionManager::restore(backend, Box::new(persister)).await;

    match &args.command {
        Commands::Login { username, password } => {
            let credentials = LoginCredentials {
                username: username.clone(),
                password: password.clone(),
            };
            validation::validate_credentials(&credentials)?;
            manager.login(&credentials).await?;
            if let Some(user) = manager.user() {
                println!("Sesión iniciada: {} — {}", user.full_name(), user.role.name);
            }
        }
        Commands::Logout => {
            manager.logout();
            println!("Sesión cerrada");
        }
        Commands::Status => {
            print_status(&manager);
        }
        Commands::Check => {
            manager.check_auth().await;
            print_status(&manager);
        }
        Commands::Refresh => {
            manager.refresh_auth().await?;
            println!("Token renovado");
        }
        Commands::Can { resource, action } => {
            let resource: Resource = resource.parse().map_err(Error::Auth)?;
            let action: Action = action.parse().map_err(Error::Auth)?;
            if manager.has_permission(resource, action) {
                println!("permitido: {resource} {action}");
            } else {
                println!("denegado: {resource} {action}");
                std::process::exit(2);
            }
        }
        Commands::Whoami => match manager.user() {
            Some(user) => {
                println!("{} <{}>", user.full_name(), user.email);
                println!("  usuario: {}", user.username);
                println!("  rol:     {}", user.role.name);
                println!("  área:    {}", user.area);
            }
            None => return Err(Error::Custom("No hay sesión activa".into())),
        },
        Commands::Passwd { current, new } => {
            manager.change_password(current, new).await?;
            println!("Contraseña actualizada");
        }
        Commands::ResetPassword { email } => {
            if !validation::is_valid_email(email) {
                return Err(Error::Custom("Formato de email inválido".into()));
            }
            manager.request_password_reset(email).await?;
            println!("Si la dirección existe, se envió un correo de recuperación");
        }
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn print_status(manager: &SessionManager) {
    let phase = match manager.phase() {
        SessionPhase::LoggedOut => "sin sesión",
        SessionPhase::Authenticating => "autenticando",
        SessionPhase::Authenticated => "autenticada",
        SessionPhase::Refreshing => "renovando",
    };
    println!("estado: {phase}");
    if let Some(user) = manager.user() {
        println!("usuario: {} ({})", user.username, user.role.name);
        println!(
            "token: {}",
            if manager.is_token_expired() {
                "expirado o por expirar"
            } else {
                "vigente"
            }
        );
    }
    if let Some(error) = manager.last_error() {
        println!("último error: {error}");
    }
}
