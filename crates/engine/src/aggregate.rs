//! Dashboard aggregation.
//!
//! Turns a flat slice of transactions into chart-ready series. Labels keep
//! the order in which their key first appears in the input; nothing is
//! sorted. Missing relations are skipped, never reported as errors.

use std::collections::HashMap;

use api_types::category::CategoryType;
use chrono::{Datelike, Month};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    EngineError, Money, ResultEngine,
    color::{Palette, Rgba, series_colors},
    records::Transaction,
    validation::FieldErrors,
};

/// Labels, values and colors as parallel vectors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries<V> {
    pub labels: Vec<String>,
    pub values: Vec<V>,
    pub colors: Vec<Rgba>,
}

impl<V> ChartSeries<V> {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(label, value)` pairs in series order.
    pub fn points(&self) -> impl Iterator<Item = (&str, &V)> {
        self.labels.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Insertion-ordered buckets keyed by label.
struct Buckets<V> {
    index: HashMap<String, usize>,
    labels: Vec<String>,
    values: Vec<V>,
}

impl<V: Default> Buckets<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    fn slot(&mut self, label: &str) -> &mut V {
        let position = match self.index.get(label) {
            Some(position) => *position,
            None => {
                let position = self.labels.len();
                self.index.insert(label.to_string(), position);
                self.labels.push(label.to_string());
                self.values.push(V::default());
                position
            }
        };
        &mut self.values[position]
    }

    fn into_series(self, palette: Palette) -> ChartSeries<V> {
        let colors = series_colors(&self.labels, palette);
        ChartSeries {
            labels: self.labels,
            values: self.values,
            colors,
        }
    }
}

fn count_by<'a, F>(transactions: &'a [Transaction], palette: Palette, key: F) -> ChartSeries<u64>
where
    F: Fn(&'a Transaction) -> Option<&'a str>,
{
    let mut buckets = Buckets::<u64>::new();
    for label in transactions.iter().filter_map(key) {
        *buckets.slot(label) += 1;
    }
    buckets.into_series(palette)
}

/// Number of transactions per category name.
pub fn group_by_category(transactions: &[Transaction], palette: Palette) -> ChartSeries<u64> {
    count_by(transactions, palette, |tx| {
        tx.category.as_ref().map(|category| category.name.as_str())
    })
}

/// Number of transactions per currency name.
pub fn group_by_currency(transactions: &[Transaction], palette: Palette) -> ChartSeries<u64> {
    count_by(transactions, palette, |tx| {
        tx.currency.as_ref().map(|currency| currency.name.as_str())
    })
}

/// Number of transactions per payment method name.
pub fn group_by_payment_method(
    transactions: &[Transaction],
    palette: Palette,
) -> ChartSeries<u64> {
    count_by(transactions, palette, |tx| {
        tx.payment_method.as_ref().map(|method| method.name.as_str())
    })
}

/// Monthly totals plus how many transactions could not be summed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlySeries {
    pub series: ChartSeries<Money>,
    /// Transactions left out because their date or amount was unusable.
    pub skipped: usize,
}

/// Sum of amounts per month of `year`, months named in English.
///
/// Dates are read in `tz`. Months with no transactions do not appear.
/// Transactions without a date, or dated in `year` without a usable amount,
/// are counted in [`MonthlySeries::skipped`] instead of being summed.
pub fn group_by_month(
    transactions: &[Transaction],
    year: i32,
    tz: Tz,
    palette: Palette,
) -> MonthlySeries {
    group_months(transactions.iter(), year, tz, palette)
}

fn group_months<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
    year: i32,
    tz: Tz,
    palette: Palette,
) -> MonthlySeries {
    let mut buckets = Buckets::<Money>::new();
    let mut skipped = 0usize;

    for tx in transactions {
        let Some(date) = tx.date else {
            skipped += 1;
            continue;
        };
        let local = date.with_timezone(&tz);
        if local.year() != year {
            continue;
        }
        let Some(amount) = tx.amount else {
            skipped += 1;
            continue;
        };
        let Some(month) = u8::try_from(local.month())
            .ok()
            .and_then(|number| Month::try_from(number).ok())
        else {
            skipped += 1;
            continue;
        };

        let total = buckets.slot(month.name());
        match total.checked_add(amount) {
            Some(sum) => *total = sum,
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("monthly totals for {year}: skipped {skipped} transaction(s)");
    }

    MonthlySeries {
        series: buckets.into_series(palette),
        skipped,
    }
}

/// Narrows the monthly chart to one currency and one category type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonthlyScope {
    pub currency_id: Option<u64>,
    pub kind: Option<CategoryType>,
}

impl MonthlyScope {
    /// Both the currency and the type have to be chosen.
    pub fn validate(&self) -> ResultEngine<(u64, CategoryType)> {
        match (self.currency_id, self.kind) {
            (Some(currency_id), Some(kind)) => Ok((currency_id, kind)),
            _ => {
                let mut errors = FieldErrors::default();
                errors.push("scope", "Please select currency and type first");
                Err(EngineError::Validation(errors))
            }
        }
    }

    /// Monthly totals restricted to the scope.
    pub fn group_by_month(
        &self,
        transactions: &[Transaction],
        year: i32,
        tz: Tz,
        palette: Palette,
    ) -> ResultEngine<MonthlySeries> {
        let (currency_id, kind) = self.validate()?;
        let scoped = transactions.iter().filter(|tx| {
            tx.currency.as_ref().is_some_and(|c| c.id == currency_id)
                && tx.category.as_ref().is_some_and(|c| c.kind == kind)
        });
        Ok(group_months(scoped, year, tz, palette))
    }
}

/// Everything the dashboard page draws.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dashboard {
    pub by_category: ChartSeries<u64>,
    pub by_currency: ChartSeries<u64>,
    pub by_payment_method: ChartSeries<u64>,
    pub by_month: MonthlySeries,
}

impl Dashboard {
    pub fn build(transactions: &[Transaction], year: i32, tz: Tz, palette: Palette) -> Self {
        Self {
            by_category: group_by_category(transactions, palette),
            by_currency: group_by_currency(transactions, palette),
            by_payment_method: group_by_payment_method(transactions, palette),
            by_month: group_by_month(transactions, year, tz, palette),
        }
    }
}
