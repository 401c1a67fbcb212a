//! eventdesk - a terminal admin console for events, tickets and organizers.
//!
//! Every view behind a sign-in is reached through the auth guard. The
//! console also offers a few one-shot commands for scripting the session.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eventdesk_core::config::ENV_TOKEN;
use eventdesk_core::routing::AuthGuard;
use eventdesk_core::{Config, Router};

use app::{App, AppState, INITIAL_PATH};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "eventdesk.log";

const USAGE: &str = "\
Usage: eventdesk [PATH]
       eventdesk --check <PATH>
       eventdesk --login | --logout | --routes

  PATH        first route to open (default /)
  --check     print where a navigation to PATH would land
  --login     prompt for a token and store it
  --logout    clear the stored token
  --routes    print the route table in resolution order";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a file; the terminal belongs to the UI.
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(guard)
}

/// One-shot commands log to stderr.
fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Help,
    Check(String),
    Login,
    Logout,
    Routes,
    /// Open the console at the given path.
    Run(String),
}

fn parse_args(args: &[String]) -> Result<CliCommand> {
    let (command, used) = match args.first().map(String::as_str) {
        None => (CliCommand::Run(INITIAL_PATH.to_string()), 0),
        Some("-h") | Some("--help") => (CliCommand::Help, 1),
        Some("--check") => {
            let path = args.get(1).context("--check needs a path")?;
            (CliCommand::Check(path.clone()), 2)
        }
        Some("--login") => (CliCommand::Login, 1),
        Some("--logout") => (CliCommand::Logout, 1),
        Some("--routes") => (CliCommand::Routes, 1),
        Some(other) if other.starts_with('-') => {
            bail!("Unknown argument {}\n\n{}", other, USAGE)
        }
        Some(path) => (CliCommand::Run(path.to_string()), 1),
    };

    if let Some(extra) = args.get(used) {
        bail!("Unexpected argument {}\n\n{}", extra, USAGE);
    }
    Ok(command)
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let initial_path = match parse_args(&args)? {
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Check(path) => {
            init_cli_tracing();
            return check(&Config::load()?, &path);
        }
        CliCommand::Login => {
            init_cli_tracing();
            return login(&Config::load()?);
        }
        CliCommand::Logout => {
            init_cli_tracing();
            return logout(&Config::load()?);
        }
        CliCommand::Routes => {
            init_cli_tracing();
            return print_routes(&Config::load()?);
        }
        CliCommand::Run(path) => path,
    };

    let config = Config::load()?;
    let _log_guard = init_tracing(&config.data_dir()?)?;
    info!("eventdesk starting");

    let mut app = App::from_config(config)?;

    // A token handed over by the environment counts as a login
    if let Some(token) = std::env::var(ENV_TOKEN).ok().filter(|t| !t.is_empty()) {
        info!("Signing in with token from {}", ENV_TOKEN);
        app.session.login(token)?;
    }

    // The guard runs before the very first render too
    app.navigate(&initial_path);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("eventdesk shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Print where a navigation to `path` would land with the saved session.
fn check(config: &Config, path: &str) -> Result<()> {
    let session = config.open_session()?;
    let router = Router::new(config.route_table()?);
    let guard = AuthGuard::new(&session).with_login_path(&config.login_path);

    let navigation = router.preview(path, &guard)?;
    let landed = navigation.route.full_path();
    let view = navigation.route.view().unwrap_or("(no view)");

    if navigation.was_redirected() {
        println!(
            "{} -> {} [{}] via {}",
            navigation.requested,
            landed,
            view,
            navigation.redirects.join(" -> ")
        );
    } else {
        println!("{} -> {} [{}]", navigation.requested, landed, view);
    }
    println!(
        "session: {}",
        if session.is_authenticated() { "signed in" } else { "anonymous" }
    );
    Ok(())
}

fn login(config: &Config) -> Result<()> {
    let mut session = config.open_session()?;
    let token = rpassword::prompt_password("Token: ").context("Failed to read token")?;
    session.login(token.trim())?;

    if session.is_persistent() {
        eprintln!("Signed in. Token saved to {}.", session.storage_name());
    } else {
        warn!("Token slot unavailable, nothing was saved");
        bail!("Could not save the token to {}", session.storage_name());
    }
    Ok(())
}

fn logout(config: &Config) -> Result<()> {
    let mut session = config.open_session()?;
    let was_signed_in = session.is_authenticated();
    session.logout();

    if !session.is_persistent() {
        bail!("Could not clear the token from {}", session.storage_name());
    }
    if was_signed_in {
        eprintln!("Signed out.");
    } else {
        eprintln!("Not signed in.");
    }
    Ok(())
}

fn print_routes(config: &Config) -> Result<()> {
    let table = config.route_table()?;
    for (path, chain) in table.iter() {
        let leaf = chain.last();
        let auth = if chain.iter().any(|r| r.requires_auth) { "auth" } else { "    " };
        let target = match leaf.and_then(|r| r.redirect.as_deref()) {
            Some(redirect) => format!("redirect {}", redirect),
            None => leaf.and_then(|r| r.view.clone()).unwrap_or_default(),
        };
        println!("{:<24} {} {}", path, auth, target);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
