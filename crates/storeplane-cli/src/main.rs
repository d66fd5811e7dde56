//! Storeplane CLI - operator dashboard for store provisioning.
//!
//! Single binary that provides:
//! - `storeplane list` - refresh once and render the dashboard
//! - `storeplane create` - request a store and follow up
//! - `storeplane delete <id>` - confirmation-gated delete
//! - `storeplane health` - probe the backend
//! - `storeplane init` - write a starter config
//! - `storeplane dashboard` (or no args) - interactive session

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{fmt, EnvFilter};

use storeplane_core::config::DEFAULT_CONFIG_FILE;
use storeplane_core::{
    AssumeYes, Confirm, CreateOutcome, DashboardConfig, DashboardView, DeleteOutcome,
    HttpBackend, Notice, Reconciler, RefreshOutcome, StoreBackend,
};

type Dashboard = Reconciler<HttpBackend>;

#[derive(Parser)]
#[command(name = "storeplane")]
#[command(about = "Store provisioning dashboard", version)]
struct Cli {
    /// Config file (defaults to ./storeplane.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base address, overrides the config file
    #[arg(long, global = true, env = "STOREPLANE_API_BASE")]
    api_base: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stores
    List,

    /// Request a new store
    Create {
        /// Return as soon as the backend acknowledges
        #[arg(long)]
        no_wait: bool,
    },

    /// Delete a store
    Delete {
        store_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check that the backend is up
    Health,

    /// Interactive dashboard session
    Dashboard,

    /// Write a starter storeplane.yaml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(Commands::Init) = cli.command {
        return init_config();
    }

    let config = load_config(&cli)?;
    let (dashboard, notices) = Reconciler::from_config(&config)
        .with_context(|| format!("Failed to set up client for {}", config.api_base))?;

    tracing::debug!(api_base = %config.api_base, "Dashboard configured");

    match cli.command {
        Some(Commands::List) => list_stores(&dashboard, notices).await,
        Some(Commands::Create { no_wait }) => create_store(&dashboard, notices, no_wait).await,
        Some(Commands::Delete { store_id, yes }) => {
            delete_store(&dashboard, notices, &store_id, yes).await
        }
        Some(Commands::Health) => show_health(&dashboard, &config).await,
        Some(Commands::Dashboard) | None => run_dashboard(dashboard, notices).await,
        Some(Commands::Init) => Ok(()),
    }
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let mut config = DashboardConfig::load_or_default(cli.config.as_deref(), &cwd)?;
    if let Some(api_base) = &cli.api_base {
        config.api_base = api_base.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_config() -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config_path = cwd.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        println!("{} already exists, leaving it alone", config_path.display());
        return Ok(());
    }

    let default_config = r#"# Storeplane dashboard configuration

api_base: http://127.0.0.1:8000
request_timeout_secs: 30

post_create:
  # delay: one refresh after delay_secs
  # poll: refresh every poll_interval_secs until the new store settles
  mode: delay
  delay_secs: 3
  poll_interval_secs: 5
  poll_max_attempts: 12
"#;
    std::fs::write(&config_path, default_config)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Point api_base at the provisioning API");
    println!("  2. Run: storeplane list");
    Ok(())
}

fn render(dashboard: &Dashboard) {
    let view = dashboard.session().read(DashboardView::from_state);
    print!("{}", view);
}

fn print_notice(notice: &Notice) {
    println!(
        "[{}] {} {}",
        notice.timestamp.format("%H:%M:%S"),
        notice.kind.as_str(),
        notice.message
    );
}

fn print_pending(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        print_notice(&notice);
    }
}

async fn list_stores(dashboard: &Dashboard, mut notices: UnboundedReceiver<Notice>) -> Result<()> {
    let outcome = dashboard.mount().await;
    print_pending(&mut notices);
    if let RefreshOutcome::Failed { .. } = outcome {
        anyhow::bail!("Could not list stores");
    }
    render(dashboard);
    Ok(())
}

async fn create_store(
    dashboard: &Dashboard,
    mut notices: UnboundedReceiver<Notice>,
    no_wait: bool,
) -> Result<()> {
    let outcome = dashboard.create_store().await;
    print_pending(&mut notices);

    let failed = matches!(outcome, CreateOutcome::Failed { .. });
    if let Some(follow_up) = outcome.follow_up() {
        if no_wait {
            follow_up.abort();
        } else {
            println!("Waiting for the backend before refreshing…");
            follow_up.await.context("Post-create refresh task failed")?;
            print_pending(&mut notices);
            render(dashboard);
        }
    }

    if failed {
        anyhow::bail!("Create request failed");
    }
    Ok(())
}

/// Asks on the terminal, like a browser confirm dialog.
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn delete_store(
    dashboard: &Dashboard,
    mut notices: UnboundedReceiver<Notice>,
    store_id: &str,
    yes: bool,
) -> Result<()> {
    let outcome = if yes {
        dashboard.delete_store(store_id, &AssumeYes).await
    } else {
        dashboard.delete_store(store_id, &TerminalConfirm).await
    };
    print_pending(&mut notices);

    match outcome {
        DeleteOutcome::Declined => {
            println!("Cancelled.");
            Ok(())
        }
        DeleteOutcome::Requested { refresh, .. } => {
            if refresh.is_applied() {
                render(dashboard);
            }
            Ok(())
        }
        DeleteOutcome::Failed { error, .. } => Err(error).context("Delete request failed"),
    }
}

async fn show_health(dashboard: &Dashboard, config: &DashboardConfig) -> Result<()> {
    let status = dashboard
        .backend()
        .health()
        .await
        .with_context(|| format!("Backend at {} is not answering", config.api_base))?;
    println!("{}: {}", config.api_base, status);
    Ok(())
}

enum Input {
    Refresh,
    Create,
    Delete(String),
    Links(String),
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next()?;
    let arg = parts.next().map(str::to_string);
    Some(match (cmd, arg) {
        ("r" | "refresh", _) => Input::Refresh,
        ("c" | "create", _) => Input::Create,
        ("d" | "delete", Some(id)) => Input::Delete(id),
        ("o" | "open", Some(id)) => Input::Links(id),
        ("h" | "help" | "?", _) => Input::Help,
        ("q" | "quit" | "exit", _) => Input::Quit,
        _ => Input::Unknown(line.trim().to_string()),
    })
}

fn print_help() {
    println!("Commands:");
    println!("  r         Refresh");
    println!("  c         Create store");
    println!("  d <id>    Delete store");
    println!("  o <id>    Show store links and events");
    println!("  q         Quit");
}

async fn run_dashboard(dashboard: Dashboard, mut notices: UnboundedReceiver<Notice>) -> Result<()> {
    let mut state_rx = dashboard.session().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.mount().await });
    }
    print_help();

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = DashboardView::from_state(&state_rx.borrow_and_update());
                print!("{}", view);
            }
            Some(notice) = notices.recv() => print_notice(&notice),
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from terminal")? else {
                    break;
                };
                match parse_input(&line) {
                    None => {}
                    Some(Input::Refresh) => {
                        let dashboard = dashboard.clone();
                        tokio::spawn(async move { dashboard.refresh().await });
                    }
                    Some(Input::Create) => {
                        let dashboard = dashboard.clone();
                        tokio::spawn(async move { dashboard.create_store().await });
                    }
                    Some(Input::Delete(store_id)) => {
                        // the prompt is modal: read the answer before anything else
                        print!("{} [y/N] ", storeplane_core::reconcile::delete_prompt(&store_id));
                        let _ = std::io::stdout().flush();
                        let answer = lines
                            .next_line()
                            .await
                            .context("Failed to read from terminal")?
                            .unwrap_or_default();
                        let answered = is_yes(&answer);
                        let confirm = move |_: &str| answered;
                        dashboard.delete_store(&store_id, &confirm).await;
                    }
                    Some(Input::Links(store_id)) => show_links(&dashboard, &store_id),
                    Some(Input::Help) => print_help(),
                    Some(Input::Quit) => break,
                    Some(Input::Unknown(cmd)) => println!("Unknown command: {} (h for help)", cmd),
                }
            }
        }
    }

    Ok(())
}

fn show_links(dashboard: &Dashboard, store_id: &str) {
    dashboard.session().read(|state| match state.registry().get(store_id) {
        Some(store) => {
            println!("{} ({})", store.store_id, store.status);
            println!("  NodePort: {}", store.nodeport_url);
            println!("  Ingress:  {}", store.ingress_url);
            for line in store.event_lines() {
                println!("  | {}", line);
            }
        }
        None => println!("No store {} in the current view", store_id),
    });
}
