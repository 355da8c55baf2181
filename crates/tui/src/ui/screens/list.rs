use engine::{Category, Currency, FetchStatus, Filter, PaymentMethod, Transaction};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table},
};

use crate::{
    app::{AppState, ListView, PendingDelete, Section},
    ui::{centered_box, components::card::Card, theme::Theme},
};

/// How a record is laid out as a table row.
pub trait TableRow {
    const HEADERS: &'static [&'static str];
    const WIDTHS: &'static [u16];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for Transaction {
    const HEADERS: &'static [&'static str] = &[
        "Date",
        "Amount",
        "Currency",
        "Category",
        "Payment method",
        "Description",
        "Receipt",
    ];
    const WIDTHS: &'static [u16] = &[12, 12, 10, 18, 16, 30, 8];

    fn cells(&self) -> Vec<String> {
        vec![
            self.date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            self.amount.map(|amount| amount.to_string()).unwrap_or_default(),
            named(self.currency.as_ref().map(|c| c.name.as_str())),
            named(self.category.as_ref().map(|c| c.name.as_str())),
            named(self.payment_method.as_ref().map(|m| m.name.as_str())),
            self.description.clone().unwrap_or_default(),
            if self.receipt.is_some() { "yes" } else { "" }.to_string(),
        ]
    }
}

impl TableRow for Category {
    const HEADERS: &'static [&'static str] = &["Name", "Type"];
    const WIDTHS: &'static [u16] = &[30, 10];

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.kind.as_str().to_string()]
    }
}

impl TableRow for Currency {
    const HEADERS: &'static [&'static str] = &["Name", "Symbol"];
    const WIDTHS: &'static [u16] = &[20, 10];

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.symbol.clone().unwrap_or_default()]
    }
}

impl TableRow for PaymentMethod {
    const HEADERS: &'static [&'static str] = &["Name"];
    const WIDTHS: &'static [u16] = &[30];

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

fn named(name: Option<&str>) -> String {
    name.unwrap_or("-").to_string()
}

pub fn render<T: TableRow>(frame: &mut Frame<'_>, area: Rect, view: &ListView<T>) {
    let theme = Theme::default();
    let controller = &view.controller;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    frame.render_widget(
        Paragraph::new(filter_line(controller.filter(), &theme)),
        layout[0],
    );

    let header = Row::new(T::HEADERS.iter().map(|title| Cell::from(*title)))
        .style(Style::default().fg(theme.text_muted).add_modifier(Modifier::BOLD));
    let rows = controller.items().iter().enumerate().map(|(index, item)| {
        let style = if index == view.selected {
            Style::default().fg(theme.accent).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(theme.text)
        };
        Row::new(item.cells()).style(style)
    });
    let widths = T::WIDTHS.iter().map(|width| Constraint::Length(*width));
    let table = Table::new(rows, widths).header(header).column_spacing(2);

    let title = controller.resource().label();
    let card = Card::new(title, &theme).focused(true);
    if controller.items().is_empty() && !controller.is_fetching() {
        card.render_with(
            frame,
            layout[1],
            Paragraph::new("No records").style(Style::default().fg(theme.text_muted)),
        );
    } else {
        card.render_with(frame, layout[1], table);
    }

    frame.render_widget(Paragraph::new(status_line(view, &theme)), layout[2]);
}

fn filter_line(filter: &Filter, theme: &Theme) -> Line<'static> {
    let field = filter.field.map(|field| field.label()).unwrap_or("none");
    Line::from(vec![
        Span::styled("Filter by", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {field}  ")),
        Span::styled("Value", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}", filter.value)),
    ])
}

fn status_line<T>(view: &ListView<T>, theme: &Theme) -> Line<'static> {
    let controller = &view.controller;
    let page = controller.page();
    let mut spans = vec![Span::raw(format!(
        "page {}/{} ({} total)  ",
        page.page,
        page.page_count.max(1),
        page.total
    ))];
    match controller.status() {
        FetchStatus::Fetching => {
            spans.push(Span::styled("loading…", Style::default().fg(theme.accent)));
        }
        FetchStatus::Failed(message) => {
            spans.push(Span::styled(message.clone(), Style::default().fg(theme.error)));
        }
        FetchStatus::Idle => {}
    }
    Line::from(spans)
}

pub fn render_confirm(frame: &mut Frame<'_>, area: Rect, pending: &PendingDelete) {
    let theme = Theme::default();
    let rect = centered_box(50, 5, area);
    let block = Block::default()
        .title(" confirm delete ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.error));
    let lines = vec![
        Line::from(format!("Delete {}?", pending.label)),
        Line::from(Span::styled(
            "y/Enter delete  n/Esc cancel",
            Style::default().fg(theme.text_muted),
        )),
    ];
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

pub fn render_filter_prompt(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let Some(filter) = section_filter(state) else {
        return;
    };
    let theme = Theme::default();
    let rect = centered_box(50, 4, area);
    let field = filter.field.map(|field| field.label()).unwrap_or("none");
    let block = Block::default()
        .title(format!(" search by {field} "))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border_focused));
    let lines = vec![
        Line::from(format!("{}│", filter.value)),
        Line::from(Span::styled(
            "Enter/Esc close",
            Style::default().fg(theme.text_muted),
        )),
    ];
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn section_filter(state: &AppState) -> Option<&Filter> {
    match state.section {
        Section::Transactions => Some(state.transactions.controller.filter()),
        Section::Categories => Some(state.categories.controller.filter()),
        Section::Currencies => Some(state.currencies.controller.filter()),
        Section::PaymentMethods => Some(state.payment_methods.controller.filter()),
        Section::Dashboard | Section::Account => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::category::CategoryType;

    #[test]
    fn rows_match_headers() {
        let category = Category {
            id: 1,
            name: "Food".to_string(),
            kind: CategoryType::Expense,
        };
        assert_eq!(category.cells(), vec!["Food", "Expense"]);
        assert_eq!(Category::HEADERS.len(), Category::WIDTHS.len());
        assert_eq!(Transaction::HEADERS.len(), Transaction::WIDTHS.len());
    }

    #[test]
    fn missing_relations_show_a_dash() {
        let tx = Transaction {
            id: 7,
            amount: None,
            date: None,
            description: None,
            category: None,
            currency: None,
            payment_method: None,
            receipt: None,
        };
        let cells = tx.cells();
        assert_eq!(cells.len(), Transaction::HEADERS.len());
        assert_eq!(cells[2], "-");
    }
}
