use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line front-end for the Correspondencia session core.
#[derive(Parser)]
#[command(name = "corres", version, about)]
pub struct Cli {
    /// Base URL of a real auth API (e.g. http://localhost:3001/api/).
    /// The built-in mock directory is used when absent.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session snapshot file. Defaults to the per-user data directory.
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and persist the session.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the session and invalidate it server-side.
    Logout,
    /// Show the current session state.
    Status,
    /// Re-validate the stored session against the auth service.
    Check,
    /// Force a token refresh.
    Refresh,
    /// Ask whether the session holds a permission, e.g. `can correspondence route`.
    Can { resource: String, action: String },
    /// Show the signed-in user.
    Whoami,
    /// Change the current user's password.
    Passwd {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Request a password-reset mail.
    ResetPassword { email: String },
    /// Print the version.
    Version,
}
