use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::AppState,
    ui::{components::card::Card, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let column = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(60), Constraint::Min(0)])
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(column[0]);

    let user = state.user.as_deref().unwrap_or("-");
    let lines = vec![
        Line::from(vec![
            Span::styled("Signed in as ", Style::default().fg(theme.text_muted)),
            Span::styled(user.to_string(), Style::default().fg(theme.text)),
        ]),
        Line::from(vec![
            Span::styled("Server ", Style::default().fg(theme.text_muted)),
            Span::raw(state.base_url.clone()),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("c", Style::default().fg(theme.accent)),
            Span::raw(" change password  "),
            Span::styled("o", Style::default().fg(theme.accent)),
            Span::raw(" sign out"),
        ]),
    ];
    Card::new("Account", &theme).render_with(frame, rows[0], Paragraph::new(lines));
}
