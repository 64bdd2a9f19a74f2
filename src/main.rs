mod dispatch;
mod export;
mod repl;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use courier_core::{config, error::CourierError};
use courier_crm::{Reconciler, ZohoClient};
use courier_session::SessionController;

#[derive(Parser)]
#[command(
    name = "courier",
    version,
    about = "Batch outreach sessions over chat links, with CRM reconciliation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive outreach session.
    Start,
    /// Check configuration and CRM connectivity.
    Status,
    /// Look up a single number in the CRM and mark it contacted.
    Reconcile {
        /// The phone number to look up.
        number: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;
            let reconciler = build_reconciler(&cfg);
            if cfg.crm.enabled && reconciler.is_none() {
                anyhow::bail!(
                    "CRM is enabled but access_token is empty. Set it in {}.",
                    cli.config
                );
            }
            let notifier = webhook::WebhookNotifier::from_config(&cfg.webhook);
            let dispatcher = Arc::new(dispatch::LinkDispatcher::new(
                cfg.dispatch.base_url.clone(),
                cfg.session.message.clone(),
                reconciler,
                notifier,
            ));
            let controller = SessionController::new(
                dispatcher,
                cfg.session.batch_size,
                Duration::from_secs(cfg.session.auto_delay_secs),
            );
            repl::run(controller, cfg.crm.flag_value.clone()).await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("courier — status check\n");
            println!("Config: {}", cli.config);
            println!("Batch size: {}", cfg.session.batch_size);
            println!("Auto delay: {}s", cfg.session.auto_delay_secs);
            println!("Chat link base: {}", cfg.dispatch.base_url);
            println!();

            if !cfg.crm.enabled {
                println!("  crm: disabled");
            } else if cfg.crm.access_token.is_empty() {
                println!("  crm: enabled but missing access_token");
            } else {
                let client =
                    ZohoClient::new(cfg.crm.access_token.clone(), cfg.crm.api_base.clone());
                match client.probe().await {
                    Ok(count) => println!("  crm: connected ({count} contacts)"),
                    Err(CourierError::Unauthorized) => {
                        println!("  crm: token expired or invalid")
                    }
                    Err(e) => println!("  crm: unreachable ({e})"),
                }
            }

            if cfg.webhook.enabled && !cfg.webhook.url.is_empty() {
                println!("  webhook: {}", cfg.webhook.url);
            } else {
                println!("  webhook: disabled");
            }
        }
        Commands::Reconcile { number } => {
            let cfg = config::load(&cli.config)?;
            let Some(reconciler) = build_reconciler(&cfg) else {
                anyhow::bail!(
                    "CRM is not configured. Enable [crm] and set access_token in {}.",
                    cli.config
                );
            };

            match reconciler.search_all(&number).await {
                Ok(contacts) if contacts.is_empty() => {
                    println!("no contacts match {number}");
                }
                Ok(contacts) => {
                    for c in &contacts {
                        println!("{}  {}  flag={}", c.id, c.phone, c.flag);
                    }
                }
                Err(e) => println!("search failed: {e}"),
            }

            if reconciler.reconcile(&number).await {
                println!("marked {number} as contacted");
            } else {
                println!("could not update {number}");
            }
        }
    }

    Ok(())
}

/// Build the reconciliation engine when the CRM is usable.
fn build_reconciler(cfg: &config::Config) -> Option<Arc<Reconciler>> {
    if !cfg.crm.enabled || cfg.crm.access_token.is_empty() {
        return None;
    }
    let store = Arc::new(ZohoClient::new(
        cfg.crm.access_token.clone(),
        cfg.crm.api_base.clone(),
    ));
    Some(Arc::new(Reconciler::new(store, cfg.crm.flag_value.clone())))
}
