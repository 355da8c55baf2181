//! `finboard report`: dashboard series of a saved response, as JSON.

use std::path::Path;

use chrono::{Datelike, Utc};
use engine::{Dashboard, records::decode_transactions};

use crate::{config::AppConfig, error::Result};

/// Builds the dashboard from the raw body of a transactions list response.
pub fn build(config: &AppConfig, raw: &str, year: Option<i32>) -> Result<Dashboard> {
    let tz = config.tz()?;
    let year = year.unwrap_or_else(|| Utc::now().with_timezone(&tz).year());
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let transactions = decode_transactions(&value)?;
    tracing::info!("building report for {year} from {} transactions", transactions.len());
    Ok(Dashboard::build(&transactions, year, tz, config.palette()))
}

pub fn run(config: &AppConfig, input: &Path, year: Option<i32>) -> Result<()> {
    let raw = std::fs::read_to_string(input)?;
    let dashboard = build(config, &raw, year)?;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn report_from_saved_response() {
        let raw = r#"{
            "data": [{
                "id": 1,
                "attributes": {
                    "amount": "42",
                    "date": "2024-03-05T10:00:00.000Z",
                    "category": { "data": { "id": 1, "attributes": { "name": "Food", "type": "Expense" } } }
                }
            }],
            "meta": {}
        }"#;
        let dashboard = build(&AppConfig::default(), raw, Some(2024)).unwrap();
        assert_eq!(dashboard.by_category.labels, vec!["Food"]);
        assert_eq!(dashboard.by_month.series.labels, vec!["March"]);
    }

    #[test]
    fn non_collection_is_rejected() {
        let err = build(&AppConfig::default(), r#"{"data": 3}"#, Some(2024)).unwrap_err();
        assert!(matches!(err, AppError::Engine(_)));
    }
}
