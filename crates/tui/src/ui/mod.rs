pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Modal, Screen, Section};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::{Theme, series_color};

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    match state.screen {
        Screen::SignIn | Screen::SignUp => screens::login::render(frame, area, state),
        Screen::Shell => render_shell(frame, area, state),
    }
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tab bar
            Constraint::Min(0),    // Section
            Constraint::Length(1), // Hints
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(frame, layout[1], state.section, &theme);

    let content = layout[2];
    match state.section {
        Section::Dashboard => screens::dashboard::render(frame, content, state),
        Section::Transactions => screens::list::render(frame, content, &state.transactions),
        Section::Categories => screens::list::render(frame, content, &state.categories),
        Section::Currencies => screens::list::render(frame, content, &state.currencies),
        Section::PaymentMethods => {
            screens::list::render(frame, content, &state.payment_methods)
        }
        Section::Account => screens::account::render(frame, content, state),
    }

    render_bottom_bar(frame, layout[3], state, &theme);

    match &state.modal {
        Some(Modal::Form(form)) => screens::form::render(frame, area, form),
        Some(Modal::ConfirmDelete(pending)) => screens::list::render_confirm(frame, area, pending),
        Some(Modal::Filter) => screens::list::render_filter_prompt(frame, area, state),
        None => {}
    }
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let user = state.user.as_deref().unwrap_or("-");
    let line = Line::from(vec![
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {user}  ")),
        Span::styled("API", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}", state.base_url)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = components::tabs::tab_shortcuts(theme);
    let context = context_hints(state.section);
    if !context.is_empty() {
        parts.push(separator(theme));
        parts.extend(hints(&context, theme));
    }
    parts.push(separator(theme));
    parts.extend(hints(&[("q", "quit")], theme));
    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn context_hints(section: Section) -> Vec<(&'static str, &'static str)> {
    match section {
        Section::Dashboard => vec![
            ("r", "refresh"),
            ("c", "currency"),
            ("t", "type"),
            ("[ ]", "year"),
        ],
        Section::Transactions
        | Section::Categories
        | Section::Currencies
        | Section::PaymentMethods => vec![
            ("j/k", "select"),
            ("n/p", "page"),
            ("a", "add"),
            ("e", "edit"),
            ("d", "delete"),
            ("f", "filter by"),
            ("/", "search"),
        ],
        Section::Account => vec![("c", "change password"), ("o", "sign out")],
    }
}

fn hints(pairs: &[(&'static str, &'static str)], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, (key, action)) in pairs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {action}")));
    }
    spans
}

fn separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

/// A `width` x `height` rect centered in `area`, shrunk to fit.
pub(crate) fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
