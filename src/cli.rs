//! CLI commands for inspecting tracking state.

use clap::{Parser, Subcommand};

use crate::context::UserContext;
use crate::identity::Identity;
use crate::transport::TransportClient;

/// Top-level command line.
#[derive(Parser, Debug)]
#[command(name = "mindful-tracking", version, about = "Engagement tracking core")]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check that the remote API is reachable
    Health,

    /// Recompute and print a user's progress snapshot
    Stats {
        /// User to compute statistics for
        #[arg(long)]
        user: String,
    },

    /// Print a user's stored preferences
    Prefs {
        /// User whose preferences to load
        #[arg(long)]
        user: String,
    },
}

impl Commands {
    /// User the command acts on, if any.
    pub fn user(&self) -> Option<&str> {
        match self {
            Commands::Health => None,
            Commands::Stats { user } | Commands::Prefs { user } => Some(user),
        }
    }
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Run the health check.
pub async fn execute_health(transport: &TransportClient) -> CliResult {
    match transport.health_check().await {
        Ok(health) => CliResult::success(format!("API status: {}", health.status)),
        Err(e) => CliResult::error(format!("API unreachable: {}", e)),
    }
}

/// Execute a command against a user context.
pub async fn execute_command(command: Commands, ctx: &UserContext) -> CliResult {
    match command {
        Commands::Health => execute_health(ctx.transport()).await,
        Commands::Stats { user } => {
            ctx.identity.sign_in(user);
            match ctx.metrics.refresh().await {
                Ok(Some(snapshot)) => to_json(&snapshot),
                Ok(None) => CliResult::error("No user signed in"),
                Err(e) => CliResult::error(format!("Failed to compute statistics: {}", e)),
            }
        }
        Commands::Prefs { user } => {
            ctx.identity.sign_in(user);
            let preferences = ctx.preferences.load().await;
            let status = ctx.preferences.status().await;
            if status.is_failed() {
                return CliResult::error(format!("Failed to load preferences: {:?}", status));
            }
            to_json(&preferences)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> CliResult {
    match serde_json::to_string_pretty(value) {
        Ok(json) => CliResult::success(json),
        Err(e) => CliResult::error(format!("Failed to render output: {}", e)),
    }
}

/// Identity for a parsed command line.
pub fn identity_for(command: &Commands) -> Identity {
    match command.user() {
        Some(user) => Identity::signed_in(user),
        None => Identity::anonymous(),
    }
}
