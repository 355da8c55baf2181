use engine::{EngineError, MonthlySeries};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::{AppState, state::DashboardState},
    ui::{
        components::{card::Card, charts},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let dashboard_state = &state.dashboard;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    render_header(frame, rows[0], state, &theme);

    let Some(dashboard) = &dashboard_state.dashboard else {
        let message = if dashboard_state.loading {
            "Loading transactions…"
        } else {
            "Press r to load the dashboard"
        };
        frame.render_widget(
            Paragraph::new(message).style(Style::default().fg(theme.text_muted)),
            rows[1],
        );
        return;
    };

    let top = split_row(rows[1]);
    charts::render_count_chart(frame, top[0], "By category", &dashboard.by_category, &theme);
    charts::render_count_chart(frame, top[1], "By currency", &dashboard.by_currency, &theme);

    let middle = split_row(rows[2]);
    charts::render_count_chart(
        frame,
        middle[0],
        "By payment method",
        &dashboard.by_payment_method,
        &theme,
    );
    let month_title = monthly_title("By month", &dashboard.by_month);
    charts::render_money_chart(frame, middle[1], &month_title, &dashboard.by_month.series, &theme);

    render_scoped(frame, rows[3], dashboard_state, &theme);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let dashboard = &state.dashboard;
    let currency = dashboard
        .scope
        .currency_id
        .and_then(|id| state.lookups.currencies.iter().find(|c| c.id == id))
        .map(|c| c.name.as_str())
        .unwrap_or("-");
    let kind = dashboard.scope.kind.map(|kind| kind.as_str()).unwrap_or("-");

    let mut spans = vec![
        Span::styled("Year", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", dashboard.year)),
        Span::styled("Currency", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {currency}  ")),
        Span::styled("Type", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {kind}  ")),
    ];
    if dashboard.loading {
        spans.push(Span::styled("loading…", Style::default().fg(theme.accent)));
    } else if let Some(error) = &dashboard.error {
        spans.push(Span::styled(error.clone(), Style::default().fg(theme.error)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_scoped(frame: &mut Frame<'_>, area: Rect, dashboard: &DashboardState, theme: &Theme) {
    match &dashboard.scoped {
        Some(Ok(monthly)) => {
            let title = monthly_title("Selected currency and type", monthly);
            charts::render_money_chart(frame, area, &title, &monthly.series, theme);
        }
        Some(Err(err)) => {
            let message = scope_message(err);
            Card::new("Selected currency and type", theme).render_with(
                frame,
                area,
                Paragraph::new(message).style(Style::default().fg(theme.text_muted)),
            );
        }
        None => {}
    }
}

/// The field message of a scope error, or the error itself.
fn scope_message(err: &EngineError) -> String {
    match err {
        EngineError::Validation(errors) => errors
            .get("scope")
            .map(str::to_string)
            .unwrap_or_else(|| errors.to_string()),
        other => other.to_string(),
    }
}

fn monthly_title(base: &str, monthly: &MonthlySeries) -> String {
    if monthly.skipped == 0 {
        base.to_string()
    } else {
        format!("{base} ({} skipped)", monthly.skipped)
    }
}

fn split_row(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

