use engine::{ChartSeries, Money};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Paragraph},
};

use crate::ui::{components::card::Card, series_color, theme::Theme};

/// One bar per label, each in the series color.
pub fn render_count_chart(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    series: &ChartSeries<u64>,
    theme: &Theme,
) {
    let bars = series
        .points()
        .zip(series.colors.iter())
        .map(|((label, value), color)| {
            Bar::default()
                .label(Line::from(label.to_string()))
                .value(*value)
                .style(Style::default().fg(series_color(*color)))
        })
        .collect::<Vec<_>>();
    render_bars(frame, area, title, bars, theme);
}

/// Monthly totals. Bars are scaled in cents and labelled in major units.
pub fn render_money_chart(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    series: &ChartSeries<Money>,
    theme: &Theme,
) {
    let bars = series
        .points()
        .zip(series.colors.iter())
        .map(|((label, value), color)| {
            Bar::default()
                .label(Line::from(short_month(label)))
                .value(bar_height(*value))
                .text_value(value.to_string())
                .style(Style::default().fg(series_color(*color)))
        })
        .collect::<Vec<_>>();
    render_bars(frame, area, title, bars, theme);
}

fn render_bars(frame: &mut Frame<'_>, area: Rect, title: &str, bars: Vec<Bar<'_>>, theme: &Theme) {
    let card = Card::new(title, theme);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    if bars.is_empty() {
        frame.render_widget(
            Paragraph::new("No transactions").style(Style::default().fg(theme.text_muted)),
            inner,
        );
        return;
    }

    let bar_width = bar_width(inner.width, bars.len());
    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .value_style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD))
        .label_style(Style::default().fg(theme.text_muted));
    frame.render_widget(chart, inner);
}

/// Widest bar that still fits `count` bars with a one-cell gap.
fn bar_width(available: u16, count: usize) -> u16 {
    let count = u16::try_from(count.max(1)).unwrap_or(u16::MAX);
    (available.saturating_sub(count) / count).clamp(1, 9)
}

/// Negative totals are drawn as empty bars.
fn bar_height(value: Money) -> u64 {
    u64::try_from(value.cents()).unwrap_or(0)
}

fn short_month(label: &str) -> String {
    label.chars().take(3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_shrink_to_fit() {
        assert_eq!(bar_width(40, 4), 9);
        assert_eq!(bar_width(20, 5), 3);
        assert_eq!(bar_width(3, 12), 1);
    }

    #[test]
    fn negative_totals_have_no_height() {
        assert_eq!(bar_height(Money::new(-500)), 0);
        assert_eq!(bar_height(Money::new(1250)), 1250);
        assert_eq!(short_month("September"), "Sep");
    }
}
