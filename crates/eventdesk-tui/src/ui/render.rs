use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Command bar
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_command_bar(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  eventdesk admin";

    let session = if app.is_authenticated() {
        let age = app
            .session_age()
            .map(|age| format!(" ({})", age))
            .unwrap_or_default();
        Span::styled(format!("● signed in{}", age), styles::signed_in_style())
    } else {
        Span::styled("○ anonymous".to_string(), styles::anonymous_style())
    };

    let padding = (area.width as usize)
        .saturating_sub(title.len())
        .saturating_sub(session.content.chars().count() + 2);

    let title_line = Line::from(vec![
        Span::styled(title, styles::brand_style()),
        Span::raw(" ".repeat(padding)),
        session,
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::dim_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    render_route_list(frame, app, chunks[0]);
    render_view_panel(frame, app, chunks[1]);
}

fn render_route_list(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.router.current().and_then(|r| r.leaf());

    let lines: Vec<Line> = app
        .router
        .table()
        .iter()
        .map(|(path, chain)| {
            let leaf = chain.last();
            let is_current = current.zip(leaf).is_some_and(|(a, b)| a.path == b.path);
            let lock = if chain.iter().any(|r| r.requires_auth) { "🔒" } else { "  " };
            let target = match leaf.and_then(|r| r.redirect.as_deref()) {
                Some(redirect) => format!("→ {}", redirect),
                None => leaf.and_then(|r| r.view.clone()).unwrap_or_default(),
            };
            let style = if is_current {
                styles::current_route_style()
            } else {
                styles::route_style()
            };
            Line::from(vec![
                Span::styled(format!(" {} ", lock), styles::locked_style()),
                Span::styled(format!("{:<20}", path), style),
                Span::styled(target, styles::dim_style()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Routes ")
        .borders(Borders::ALL)
        .border_style(styles::panel_border(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_view_panel(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.state, AppState::LoggingIn);

    let Some(route) = app.router.current() else {
        let block = Block::default().borders(Borders::ALL).border_style(styles::panel_border(false));
        frame.render_widget(Paragraph::new(" Nothing rendered yet").block(block), area);
        return;
    };

    let view = route.view().unwrap_or("(no view)");
    let mut lines = vec![
        Line::from(vec![
            Span::styled(" View:  ", styles::dim_style()),
            Span::styled(view.to_string(), styles::brand_style()),
        ]),
        Line::from(vec![
            Span::styled(" Path:  ", styles::dim_style()),
            Span::raw(route.full_path()),
        ]),
    ];

    for (name, value) in &route.params {
        lines.push(Line::from(vec![
            Span::styled(format!(" :{:<6}", name), styles::dim_style()),
            Span::raw(value.clone()),
        ]));
    }

    if app.on_login_view() {
        lines.push(Line::from(""));
        lines.extend(login_form_lines(app));
    }

    let block = Block::default()
        .title(format!(" {} ", view))
        .borders(Borders::ALL)
        .border_style(styles::panel_border(focused));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn login_form_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if app.is_authenticated() {
        lines.push(Line::from(Span::styled(
            " Already signed in. Type :logout to sign out.",
            styles::signed_in_style(),
        )));
        return lines;
    }

    let focused = matches!(app.state, AppState::LoggingIn);
    let token_style = if focused {
        styles::current_route_style()
    } else {
        styles::route_style()
    };
    let masked: String = "*".repeat(app.token_input.chars().count().min(24));
    let cursor = if focused { "▌" } else { "" };

    lines.push(Line::from(vec![
        Span::styled(" Token: [", styles::dim_style()),
        Span::styled(format!("{:<24}{}", masked, cursor), token_style),
        Span::styled("]", styles::dim_style()),
    ]));

    let hint = if focused {
        " [Enter] sign in  [Esc] back to command bar"
    } else {
        " Type :login to enter a token"
    };
    lines.push(Line::from(Span::styled(hint, styles::dim_style())));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    lines
}

fn render_command_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.state, AppState::Normal);
    let cursor = if focused { "▌" } else { "" };

    let line = Line::from(vec![
        Span::styled(" > ", styles::prompt_style()),
        Span::raw(format!("{}{}", app.command_input, cursor)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::panel_border(focused));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[?] help | :q quit";

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" Token slot: {} ", slot_label(app)),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let line = Line::from(vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::dim_style()),
    ]);

    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style()), area);
}

fn slot_label(app: &App) -> String {
    if app.session.is_persistent() {
        app.session.storage_name()
    } else {
        "unavailable, memory only".to_string()
    }
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 14, frame.area());
    frame.render_widget(Clear, area);

    let entries = [
        ("/path", "Navigate (guarded)"),
        ("name", "Same as /name"),
        (":login", "Open the token prompt"),
        (":logout", "Sign out"),
        (":back", "Previous route (guarded)"),
        (":help, ?", "This help"),
        (":q", "Quit"),
        ("Ctrl+C", "Quit"),
    ];

    let mut lines = vec![Line::from("")];
    for (key, desc) in entries {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", key), styles::key_hint_style()),
            Span::styled(desc, styles::hint_text_style()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  🔒 routes need a signed-in session",
        styles::dim_style(),
    )));

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(styles::panel_border(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
