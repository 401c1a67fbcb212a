//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{can_add_command_char, can_add_token_char, App, AppState};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match app.state {
        AppState::LoggingIn => handle_login_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            false
        }
        AppState::Normal => handle_command_input(app, key),
        AppState::Quitting => true,
    }
}

fn handle_command_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => return app.submit_command(),
        KeyCode::Esc => {
            app.command_input.clear();
            app.status_message = None;
        }
        KeyCode::Backspace => {
            app.command_input.pop();
        }
        // Help is only a keystroke away while the bar is empty
        KeyCode::Char('?') if app.command_input.is_empty() => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char(c) => {
            if can_add_command_char(app.command_input.len(), c) {
                app.command_input.push(c);
            }
        }
        _ => {}
    }
    false
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => app.cancel_login(),
        KeyCode::Enter => app.attempt_login(),
        KeyCode::Backspace => {
            app.token_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_token_char(app.token_input.len(), c) {
                app.token_input.push(c);
            }
        }
        _ => {}
    }
    false
}
