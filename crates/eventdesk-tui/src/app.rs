//! Application state management for eventdesk.
//!
//! This module contains the core `App` struct: the session, the router, and
//! the UI state of the command bar and the login view. Every navigation goes
//! through `App::navigate`, which asks the auth guard before anything renders.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use eventdesk_core::routing::{AuthGuard, NavigationError};
use eventdesk_core::{Config, Router, SessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for token input.
/// Bearer tokens are usually JWTs; 4096 chars leaves room for large claims.
const MAX_TOKEN_LENGTH: usize = 4096;

/// Maximum length for the command bar.
const MAX_COMMAND_LENGTH: usize = 256;

/// Path of the first navigation when none is given on the command line.
pub const INITIAL_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    ShowingHelp,
    Quitting,
}

/// What the user typed into the command bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(String),
    Login,
    Logout,
    Back,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Command::Empty;
        }
        if input.starts_with('/') {
            return Command::Navigate(input.to_string());
        }
        if let Some(cmd) = input.strip_prefix(':') {
            return match cmd.trim() {
                "login" => Command::Login,
                "logout" => Command::Logout,
                "back" | "b" => Command::Back,
                "help" | "h" => Command::Help,
                "q" | "quit" => Command::Quit,
                other => Command::Unknown(other.to_string()),
            };
        }
        if input == "?" {
            return Command::Help;
        }
        // Bare words are paths without the leading slash
        Command::Navigate(format!("/{}", input))
    }
}

pub fn can_add_token_char(current_len: usize, c: char) -> bool {
    current_len < MAX_TOKEN_LENGTH && !c.is_control() && !c.is_whitespace()
}

pub fn can_add_command_char(current_len: usize, c: char) -> bool {
    current_len < MAX_COMMAND_LENGTH && !c.is_control()
}

/// "just now", "5m ago", "3h ago", "2d ago".
pub fn format_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - since).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

pub struct App {
    pub config: Config,
    pub session: SessionStore,
    pub router: Router,
    pub state: AppState,

    pub command_input: String,
    pub token_input: String,
    pub login_error: Option<String>,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config, session: SessionStore, router: Router) -> Self {
        Self {
            config,
            session,
            router,
            state: AppState::Normal,
            command_input: String::new(),
            token_input: String::new(),
            login_error: None,
            status_message: None,
        }
    }

    /// Build the app from configuration: open the token slot and compile
    /// the route table.
    pub fn from_config(config: Config) -> Result<Self> {
        let session = config.open_session()?;
        debug!(?session, "Session loaded");
        if !session.is_persistent() {
            warn!("Token slot unavailable, session will not survive a restart");
        }
        let router = Router::new(config.route_table()?);
        Ok(Self::new(config, session, router))
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Navigate through the auth guard and update the UI state to match.
    pub fn navigate(&mut self, path: &str) {
        let guard = AuthGuard::new(&self.session).with_login_path(&self.config.login_path);
        match self.router.navigate(path, &guard) {
            Ok(navigation) => {
                self.status_message = if navigation.was_redirected() {
                    Some(format!(
                        "{} redirected to {}",
                        navigation.requested,
                        navigation.route.full_path()
                    ))
                } else {
                    None
                };
                self.sync_login_view();
            }
            Err(NavigationError::Duplicated(path)) => {
                self.status_message = Some(format!("Already at {}", path));
            }
            Err(e) => {
                warn!(error = %e, path, "Navigation failed");
                self.status_message = Some(e.to_string());
            }
        }
    }

    pub fn back(&mut self) {
        let guard = AuthGuard::new(&self.session).with_login_path(&self.config.login_path);
        match self.router.back(&guard) {
            Ok(_) => {
                self.status_message = None;
                self.sync_login_view();
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    /// Run whatever is in the command bar. Returns true if the app should quit.
    pub fn submit_command(&mut self) -> bool {
        let command = Command::parse(&self.command_input);
        self.command_input.clear();
        debug!(?command, "Command submitted");

        match command {
            Command::Navigate(path) => self.navigate(&path),
            Command::Login => self.start_login(),
            Command::Logout => self.logout(),
            Command::Back => self.back(),
            Command::Help => self.state = AppState::ShowingHelp,
            Command::Quit => {
                self.state = AppState::Quitting;
                return true;
            }
            Command::Unknown(cmd) => {
                self.status_message = Some(format!("Unknown command :{} (try :help)", cmd));
            }
            Command::Empty => {}
        }
        false
    }

    /// Open the login view's token prompt.
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.token_input.clear();
        self.login_error = None;
    }

    pub fn cancel_login(&mut self) {
        self.state = AppState::Normal;
        self.token_input.clear();
        self.login_error = None;
    }

    /// Sign in with the token typed into the login view, then go home.
    pub fn attempt_login(&mut self) {
        let token = self.token_input.trim().to_string();
        if let Err(e) = self.session.login(token) {
            self.login_error = Some(e.to_string());
            return;
        }

        info!("Login successful");
        self.token_input.clear();
        self.login_error = None;
        self.state = AppState::Normal;

        let home = self.config.home_path.clone();
        self.navigate(&home);
        if !self.session.is_persistent() {
            self.status_message = Some("Signed in (not saved: token slot unavailable)".to_string());
        }
    }

    /// Sign out. The view on screen stays until the next navigation.
    pub fn logout(&mut self) {
        if !self.session.is_authenticated() {
            self.status_message = Some("Not signed in".to_string());
            return;
        }
        self.session.logout();
        self.status_message = Some("Signed out".to_string());
    }

    /// Age of the current session for the title bar, if known.
    pub fn session_age(&self) -> Option<String> {
        self.session
            .stored_at()
            .map(|stored_at| format_age(stored_at, Utc::now()))
    }

    /// Whether the rendered route is the record the login path resolves to.
    pub fn on_login_view(&self) -> bool {
        let Some(login) = self.router.table().resolve(&self.config.login_path) else {
            return false;
        };
        self.router
            .current()
            .and_then(|route| route.leaf())
            .zip(login.leaf())
            .is_some_and(|(current, login)| current.path == login.path)
    }

    // Landing on the login view anonymously focuses its token prompt
    fn sync_login_view(&mut self) {
        if self.on_login_view() && !self.session.is_authenticated() {
            self.start_login();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
