use chrono_tz::Tz;
use serde_json::json;

use engine::{
    Dashboard, EngineError, ListQuery, Money, Palette, Resource,
    aggregate::{group_by_category, group_by_month},
    listing::fetch_all,
    records::decode_transactions,
};

mod common;
use common::FakeSource;

fn payload() -> serde_json::Value {
    json!({
        "data": [
            {
                "id": 3,
                "attributes": {
                    "amount": "42",
                    "date": "2024-03-15T09:00:00.000Z",
                    "category": { "data": { "id": 1, "attributes": { "name": "Food", "type": "Expense" } } },
                    "currency": { "data": [ { "id": 1, "attributes": { "name": "EUR" } } ] },
                    "payment_method": { "data": [ { "id": 2, "attributes": { "name": "Card" } } ] }
                }
            },
            {
                "id": 2,
                "attributes": {
                    "amount": 8.5,
                    "date": "2024-03-20T09:00:00.000Z",
                    "category": { "data": { "id": 1, "attributes": { "name": "Food", "type": "Expense" } } },
                    "currency": { "data": [ { "id": 2, "attributes": { "name": "USD" } } ] },
                    "payment_method": { "data": null }
                }
            },
            {
                "id": 1,
                "attributes": {
                    "amount": "oops",
                    "date": "2024-07-01T09:00:00.000Z",
                    "category": { "data": { "id": 4, "attributes": { "name": "Salary", "type": "Income" } } },
                    "currency": { "data": [] }
                }
            }
        ],
        "meta": { "pagination": { "page": 1, "pageSize": 100, "pageCount": 1, "total": 3 } }
    })
}

#[test]
fn single_food_transaction_in_march() {
    let txs = decode_transactions(&json!({
        "data": [{
            "id": 1,
            "attributes": {
                "amount": "42",
                "date": "2024-03-15T09:00:00.000Z",
                "category": { "data": { "id": 1, "attributes": { "name": "Food", "type": "Expense" } } }
            }
        }]
    }))
    .unwrap();

    let categories = group_by_category(&txs, Palette::Stable);
    assert_eq!(categories.labels, vec!["Food"]);
    assert_eq!(categories.values, vec![1]);

    let monthly = group_by_month(&txs, 2024, Tz::UTC, Palette::Stable);
    assert_eq!(monthly.series.labels, vec!["March"]);
    assert_eq!(monthly.series.values, vec![Money::new(4200)]);
}

#[test]
fn dashboard_counts_add_up() {
    let txs = decode_transactions(&payload()).unwrap();
    let dashboard = Dashboard::build(&txs, 2024, Tz::UTC, Palette::Stable);

    let with_category = txs.iter().filter(|tx| tx.category.is_some()).count() as u64;
    assert_eq!(dashboard.by_category.values.iter().sum::<u64>(), with_category);
    assert_eq!(dashboard.by_category.labels, vec!["Food", "Salary"]);

    assert_eq!(dashboard.by_currency.labels, vec!["EUR", "USD"]);
    assert_eq!(dashboard.by_payment_method.labels, vec!["Card"]);

    assert_eq!(dashboard.by_month.series.labels, vec!["March"]);
    assert_eq!(dashboard.by_month.series.values, vec![Money::new(5050)]);
    assert_eq!(dashboard.by_month.skipped, 1);

    for series in [
        &dashboard.by_category,
        &dashboard.by_currency,
        &dashboard.by_payment_method,
    ] {
        assert_eq!(series.labels.len(), series.values.len());
        assert_eq!(series.labels.len(), series.colors.len());
    }
}

#[test]
fn dashboard_serializes_for_charting() {
    let txs = decode_transactions(&payload()).unwrap();
    let dashboard = Dashboard::build(&txs, 2024, Tz::UTC, Palette::Stable);
    let value = serde_json::to_value(&dashboard).unwrap();

    assert_eq!(value["by_month"]["series"]["values"], json!([50.5]));
    assert_eq!(value["by_category"]["values"], json!([2, 1]));
    assert!(
        value["by_category"]["colors"][0]
            .as_str()
            .unwrap()
            .starts_with("rgba(")
    );
}

#[test]
fn malformed_payload_is_an_error_not_an_empty_chart() {
    assert!(matches!(
        decode_transactions(&json!({ "data": 5 })),
        Err(EngineError::MalformedCollection(_))
    ));
}

#[tokio::test]
async fn fetch_all_walks_every_page() {
    let source = FakeSource::new((1..=25).collect());
    let query = ListQuery::new().populate_all().page(1, 10).user_scope(1);

    let all: Vec<u64> = fetch_all(&source, Resource::Transactions, query)
        .await
        .unwrap();

    assert_eq!(all, (1..=25).collect::<Vec<_>>());
    assert_eq!(source.calls(), 3);
}
