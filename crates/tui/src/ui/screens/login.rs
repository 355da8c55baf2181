use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::{AppState, Screen},
    ui::{centered_box, screens::form::form_lines, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let form = &state.auth_form;

    let mut lines = form_lines(form, &theme);
    let switch = match state.screen {
        Screen::SignUp => "Already have an account? Esc to sign in",
        _ => "No account yet? Esc to sign up",
    };
    lines.push(Line::from(Span::styled(switch, Style::default().fg(theme.text_muted))));

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let card_area = centered_box(56, height, area);
    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(format!(" {} ", form.target.title()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), card_area);

    let footer = Rect {
        x: area.x,
        y: card_area.bottom().min(area.bottom().saturating_sub(1)),
        width: area.width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            state.base_url.as_str(),
            Style::default().fg(theme.text_muted),
        ))
        .alignment(Alignment::Center),
        footer,
    );
}
