use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::forms::{FormState, Input},
    ui::{centered_box, theme::Theme},
};

const FORM_WIDTH: u16 = 60;

/// Renders `form` as a centered modal over `area`.
pub fn render(frame: &mut Frame<'_>, area: Rect, form: &FormState) {
    let theme = Theme::default();
    let lines = form_lines(form, &theme);
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let rect = centered_box(FORM_WIDTH, height, area);

    let block = Block::default()
        .title(format!(" {} ", form.target.title()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border_focused));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// One line per field, an error line under each invalid field, then hints.
pub fn form_lines(form: &FormState, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, field) in form.fields.iter().enumerate() {
        let focused = index == form.focus;
        let label_style = if focused {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_muted)
        };
        let mut value = field.display();
        if focused {
            match field.input {
                Input::Text { .. } => value.push('│'),
                Input::Choice { .. } => value = format!("‹ {value} ›"),
            }
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", field.label), label_style),
            Span::styled(value, Style::default().fg(theme.text)),
        ]));
        if let Some(message) = form.error_for(field.key) {
            lines.push(Line::from(Span::styled(
                format!("{:<16}{message}", ""),
                Style::default().fg(theme.error),
            )));
        }
    }

    lines.push(Line::raw(""));
    let hint = if form.submitting {
        "saving…"
    } else {
        "Tab next  ←/→ pick  Enter save  Esc cancel"
    };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(theme.text_muted))));
    lines
}
