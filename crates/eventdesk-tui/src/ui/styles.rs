use ratatui::style::{Color, Modifier, Style};

// Palette: one color per session or route state
pub const BRAND: Color = Color::Rgb(138, 99, 210);
pub const SIGNED_IN: Color = Color::Rgb(72, 176, 120);
pub const LOCKED: Color = Color::Rgb(224, 152, 56);
pub const DENIED: Color = Color::Rgb(214, 72, 88);
pub const DIM: Color = Color::Rgb(120, 116, 132);
pub const TEXT: Color = Color::Rgb(228, 226, 236);
pub const CURRENT_BG: Color = Color::Rgb(52, 40, 76);
pub const BAR_BG: Color = Color::Rgb(28, 24, 38);

pub fn brand_style() -> Style {
    Style::default().fg(BRAND).add_modifier(Modifier::BOLD)
}

/// The route currently rendered.
pub fn current_route_style() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(CURRENT_BG)
        .add_modifier(Modifier::BOLD)
}

pub fn route_style() -> Style {
    Style::default().fg(TEXT)
}

/// Lock mark on routes behind a sign-in.
pub fn locked_style() -> Style {
    Style::default().fg(LOCKED)
}

pub fn dim_style() -> Style {
    Style::default().fg(DIM)
}

pub fn prompt_style() -> Style {
    Style::default().fg(BRAND)
}

pub fn signed_in_style() -> Style {
    Style::default().fg(SIGNED_IN)
}

pub fn anonymous_style() -> Style {
    Style::default().fg(LOCKED)
}

pub fn error_style() -> Style {
    Style::default().fg(DENIED).add_modifier(Modifier::BOLD)
}

pub fn panel_border(focused: bool) -> Style {
    Style::default().fg(if focused { BRAND } else { DIM })
}

pub fn status_bar_style() -> Style {
    Style::default().bg(BAR_BG).fg(TEXT)
}

pub fn key_hint_style() -> Style {
    Style::default().fg(LOCKED).add_modifier(Modifier::BOLD)
}

pub fn hint_text_style() -> Style {
    Style::default().fg(TEXT)
}
