//! services/client/src/bin/mail_router.rs

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client_lib::{
    adapters::{FileTokenStore, HttpBackend, RecordingNavigator},
    config::Config,
    dashboard::{AppState, Dashboard, RouteDecision, ViewState},
    error::ClientError,
};
use mail_router_core::domain::{ActionTaken, EmailLogEntry, Route, TemporaryAddress};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mail_router", about = "Manage disposable addresses on the AI email router")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show statistics, addresses and recent activity (default).
    Status,
    /// List the classification log, newest first.
    Activity {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one temporary address.
    Show { id: i64 },
    /// Create a new temporary address.
    Create {
        #[arg(long, default_value = "")]
        purpose: String,
    },
    /// Deactivate a temporary address.
    Deactivate {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Store a token issued by the login flow.
    UseToken { token: String },
    /// Forget the stored token.
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    let cli = Cli::parse();

    // --- 2. Initialize Adapters ---
    let credentials = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let backend = Arc::new(HttpBackend::from_config(&config, credentials.clone()));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        identity: backend.clone(),
        temp_emails: backend.clone(),
        dashboard: backend,
        credentials,
        navigator: Arc::new(RecordingNavigator::default()),
    });
    let dashboard = Dashboard::new(app_state);
    info!("Using backend at {}", config.api_base_url);

    // --- 4. Run the Command ---
    match cli.command.unwrap_or(Command::Status) {
        Command::UseToken { token } => {
            dashboard.sign_in(&token).await?;
            println!("Token stored.");
        }
        Command::Logout => {
            dashboard.logout().await;
            println!("Logged out.");
        }
        Command::Status => {
            if !open_dashboard(&dashboard).await {
                return Ok(());
            }
            if let Some(view) = dashboard.view() {
                print_view(&view);
            }
        }
        Command::Activity { limit } => {
            if !open_dashboard(&dashboard).await {
                return Ok(());
            }
            let entries = dashboard
                .activity_log(limit.unwrap_or(config.activity_log_limit))
                .await?;
            print_activity(&entries);
        }
        Command::Show { id } => {
            if !open_dashboard(&dashboard).await {
                return Ok(());
            }
            let address = dashboard.address(id).await?;
            print_address(&address);
        }
        Command::Create { purpose } => {
            if !open_dashboard(&dashboard).await {
                return Ok(());
            }
            dashboard.open_create_form();
            dashboard.set_purpose(&purpose);
            dashboard.submit_create_form().await?;
            if let Some(view) = dashboard.view() {
                print_addresses(&view);
            }
        }
        Command::Deactivate { id, yes } => {
            if !open_dashboard(&dashboard).await {
                return Ok(());
            }
            let pending = dashboard.request_deactivation(id)?;
            if yes || confirm(&format!(
                "Are you sure you want to deactivate address {}? [y/N] ",
                id
            ))? {
                dashboard.confirm_deactivation(pending).await?;
                println!("Address {} deactivated.", id);
            } else {
                dashboard.decline_deactivation(pending);
                println!("Nothing changed.");
            }
        }
    }

    Ok(())
}

/// Enters the dashboard route. Prints where the user was sent if it did not render.
async fn open_dashboard(dashboard: &Dashboard) -> bool {
    match dashboard.enter(Route::Dashboard).await {
        RouteDecision::Render => true,
        RouteDecision::Redirect(Route::Login) => {
            println!("Not signed in. Sign in on the web and run `mail_router use-token <token>`.");
            false
        }
        RouteDecision::Redirect(route) => {
            println!("Redirected to {}.", route.path());
            false
        }
        RouteDecision::Wait => false,
    }
}

fn confirm(prompt: &str) -> Result<bool, ClientError> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

//=========================================================================================
// Output
//=========================================================================================

fn print_view(view: &ViewState) {
    if let Some(stats) = &view.stats {
        println!(
            "Total Emails: {}   Active: {}   Forwarded: {}   Deleted: {}",
            stats.total_temp_emails,
            stats.active_temp_emails,
            stats.emails_forwarded,
            stats.emails_deleted
        );
        println!();
    }
    print_addresses(view);
    println!();
    println!("Recent Activity");
    match &view.stats {
        Some(stats) if !stats.recent_activity.is_empty() => print_activity(&stats.recent_activity),
        _ => println!("  No recent activity."),
    }
}

fn print_addresses(view: &ViewState) {
    println!("Temporary Email Addresses");
    if view.addresses.is_empty() {
        println!("  No temporary emails created yet.");
        return;
    }
    for address in &view.addresses {
        print_address(address);
    }
}

fn print_address(address: &TemporaryAddress) {
    println!(
        "  [{}] {} ({}) created {}, expires {}",
        address.id,
        address.address,
        if address.is_active { "Active" } else { "Inactive" },
        short_date(&address.created_at),
        short_date(&address.expires_at)
    );
    if let Some(purpose) = &address.purpose {
        println!("       {}", purpose);
    }
}

fn print_activity(entries: &[EmailLogEntry]) {
    for entry in entries {
        let action = match &entry.action_taken {
            ActionTaken::Forward => "forward".to_string(),
            ActionTaken::Delete => "delete".to_string(),
            ActionTaken::Other(raw) => format!("{}?", raw),
        };
        let confidence = entry
            .ai_confidence_score
            .map(|score| format!(" {:.0}%", score * 100.0))
            .unwrap_or_default();
        println!(
            "  {} [{}{}] {}  From: {}",
            entry.created_at.format("%b %-d, %-I:%M %p"),
            action,
            confidence,
            entry.subject,
            entry.sender_email
        );
    }
}

fn short_date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}
