//! Typed records built from the API's wire shapes.
//!
//! Conversion never fails on a missing relation or an odd amount: those
//! become `None`. Only a payload that is not a collection of records is
//! rejected (see [`decode_transactions`]).

use api_types::{
    Entity,
    category::{CategoryAttributes, CategoryType},
    currency::CurrencyAttributes,
    envelope::{List, Pagination},
    payment_method::PaymentMethodAttributes,
    transaction::{RawAmount, TransactionAttributes},
    upload::FileAttributes,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{EngineError, Money, ResultEngine};

/// Reference to a category as populated on a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: u64,
    pub name: String,
    pub kind: CategoryType,
}

/// Reference to a currency or a payment method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub id: u64,
    pub url: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: u64,
    /// `None` when the API sent no amount or one that does not parse.
    pub amount: Option<Money>,
    /// `None` when the API sent no date or one that does not parse.
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub category: Option<CategoryRef>,
    pub currency: Option<NamedRef>,
    pub payment_method: Option<NamedRef>,
    pub receipt: Option<StoredFile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub kind: CategoryType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub id: u64,
    pub name: String,
    pub symbol: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub id: u64,
    pub name: String,
}

/// Pagination metadata of the last applied list response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

impl Page {
    /// State before the first response: page 1 of 1, nothing loaded.
    #[must_use]
    pub const fn initial(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            page_count: 1,
            total: 0,
        }
    }
}

impl From<Pagination> for Page {
    fn from(value: Pagination) -> Self {
        Self {
            page: value.page,
            page_size: value.page_size,
            page_count: value.page_count,
            total: value.total,
        }
    }
}

/// One page of records with its pagination metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub page: Page,
}

impl<T> ListPage<T> {
    /// Converts a list envelope. When the server omits pagination the page is
    /// treated as the only one.
    pub fn from_envelope<W>(envelope: List<W>, page_size: u32) -> Self
    where
        T: From<W>,
    {
        let items: Vec<T> = envelope.data.into_iter().map(T::from).collect();
        let page = match envelope.meta.pagination {
            Some(pagination) => Page::from(pagination),
            None => Page {
                page: 1,
                page_size,
                page_count: 1,
                total: items.len() as u64,
            },
        };
        Self { items, page }
    }
}

/// A record type together with the wire shape it is decoded from.
pub trait WireRecord: From<Self::Wire> + Send + 'static {
    type Wire: DeserializeOwned + Send + 'static;
}

impl WireRecord for Transaction {
    type Wire = Entity<TransactionAttributes>;
}

impl WireRecord for Category {
    type Wire = Entity<CategoryAttributes>;
}

impl WireRecord for Currency {
    type Wire = Entity<CurrencyAttributes>;
}

impl WireRecord for PaymentMethod {
    type Wire = Entity<PaymentMethodAttributes>;
}

/// Coerces a wire amount into cents. Returns `None` for anything unusable.
pub fn coerce_amount(raw: &RawAmount) -> Option<Money> {
    let parsed = match raw {
        RawAmount::Number(value) => Money::from_major(*value),
        RawAmount::Text(text) => text.parse::<Money>(),
    };
    match parsed {
        Ok(amount) => Some(amount),
        Err(err) => {
            tracing::warn!("discarding amount {raw:?}: {err}");
            None
        }
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn coerce_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl From<Entity<TransactionAttributes>> for Transaction {
    fn from(entity: Entity<TransactionAttributes>) -> Self {
        let attrs = entity.attributes;
        let category = attrs
            .category
            .and_then(|relation| relation.data)
            .map(|category| CategoryRef {
                id: category.id,
                name: category.attributes.name,
                kind: category.attributes.kind,
            });
        let currency = attrs
            .currency
            .as_ref()
            .and_then(|relation| relation.first())
            .map(|currency| NamedRef {
                id: currency.id,
                name: currency.attributes.name.clone(),
            });
        let payment_method = attrs
            .payment_method
            .as_ref()
            .and_then(|relation| relation.first())
            .map(|method| NamedRef {
                id: method.id,
                name: method.attributes.name.clone(),
            });
        let receipt = attrs
            .receipt
            .as_ref()
            .and_then(|relation| relation.first())
            .map(stored_file);

        Self {
            id: entity.id,
            amount: attrs.amount.as_ref().and_then(coerce_amount),
            date: attrs.date.as_deref().and_then(coerce_date),
            description: attrs.description.filter(|text| !text.trim().is_empty()),
            category,
            currency,
            payment_method,
            receipt,
        }
    }
}

fn stored_file(entity: &Entity<FileAttributes>) -> StoredFile {
    StoredFile {
        id: entity.id,
        url: entity.attributes.url.clone(),
        name: entity.attributes.name.clone(),
    }
}

impl From<Entity<CategoryAttributes>> for Category {
    fn from(entity: Entity<CategoryAttributes>) -> Self {
        Self {
            id: entity.id,
            name: entity.attributes.name,
            kind: entity.attributes.kind,
        }
    }
}

impl From<Entity<CurrencyAttributes>> for Currency {
    fn from(entity: Entity<CurrencyAttributes>) -> Self {
        Self {
            id: entity.id,
            name: entity.attributes.name,
            symbol: entity.attributes.symbol,
        }
    }
}

impl From<Entity<PaymentMethodAttributes>> for PaymentMethod {
    fn from(entity: Entity<PaymentMethodAttributes>) -> Self {
        Self {
            id: entity.id,
            name: entity.attributes.name,
        }
    }
}

/// Decodes a `transactions` list response held as raw JSON.
///
/// Fails when the payload is not an object whose `data` is an array of
/// records (e.g. `null` or a bare number), so callers never aggregate over
/// something that is not a collection.
pub fn decode_transactions(value: &serde_json::Value) -> ResultEngine<Vec<Transaction>> {
    let data = value
        .get("data")
        .ok_or_else(|| EngineError::MalformedCollection("missing `data` field".to_string()))?;
    let records = data.as_array().ok_or_else(|| {
        EngineError::MalformedCollection(format!("`data` is not an array: {data}"))
    })?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value::<Entity<TransactionAttributes>>(record.clone())
                .map(Transaction::from)
                .map_err(|err| {
                    EngineError::MalformedCollection(format!("record {index}: {err}"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entity(attributes: serde_json::Value) -> Entity<TransactionAttributes> {
        serde_json::from_value(json!({ "id": 1, "attributes": attributes })).unwrap()
    }

    #[test]
    fn first_currency_and_payment_method_win() {
        let tx = Transaction::from(entity(json!({
            "amount": 5,
            "date": "2024-01-02T03:04:05Z",
            "currency": { "data": [
                { "id": 3, "attributes": { "name": "USD" } },
                { "id": 4, "attributes": { "name": "EUR" } }
            ] },
            "payment_method": { "data": [
                { "id": 9, "attributes": { "name": "Card" } }
            ] }
        })));

        assert_eq!(tx.currency.unwrap().name, "USD");
        assert_eq!(tx.payment_method.unwrap().id, 9);
        assert!(tx.category.is_none());
    }

    #[test]
    fn amounts_are_coerced_at_the_boundary() {
        assert_eq!(coerce_amount(&RawAmount::Text("42".into())), Some(Money::new(4200)));
        assert_eq!(coerce_amount(&RawAmount::Text("12,5".into())), Some(Money::new(1250)));
        assert_eq!(coerce_amount(&RawAmount::Number(19.99)), Some(Money::new(1999)));
        assert_eq!(coerce_amount(&RawAmount::Text("n/a".into())), None);

        let tx = Transaction::from(entity(json!({ "date": "2024-01-02" })));
        assert_eq!(tx.amount, None);
    }

    #[test]
    fn dates_accept_rfc3339_and_plain_dates() {
        let dt = coerce_date("2024-03-05T23:30:00.000+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-05T21:30:00+00:00");
        let day = coerce_date("2024-03-05").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-05T00:00:00+00:00");
        assert!(coerce_date("05/03/2024").is_none());
    }

    #[test]
    fn blank_descriptions_become_none() {
        let tx = Transaction::from(entity(json!({ "description": "   " })));
        assert!(tx.description.is_none());
    }

    #[test]
    fn decode_rejects_non_collections() {
        assert!(matches!(
            decode_transactions(&json!(null)),
            Err(EngineError::MalformedCollection(_))
        ));
        assert!(matches!(
            decode_transactions(&json!({ "data": null })),
            Err(EngineError::MalformedCollection(_))
        ));
        assert!(matches!(
            decode_transactions(&json!({ "data": { "id": 1 } })),
            Err(EngineError::MalformedCollection(_))
        ));
        assert!(matches!(
            decode_transactions(&json!({ "data": [42] })),
            Err(EngineError::MalformedCollection(_))
        ));
        assert_eq!(decode_transactions(&json!({ "data": [] })).unwrap(), vec![]);
    }

    #[test]
    fn missing_pagination_means_single_page() {
        let envelope: List<Entity<PaymentMethodAttributes>> = serde_json::from_value(json!({
            "data": [
                { "id": 1, "attributes": { "name": "Cash" } },
                { "id": 2, "attributes": { "name": "Card" } }
            ]
        }))
        .unwrap();

        let page: ListPage<PaymentMethod> = ListPage::from_envelope(envelope, 10);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page.page_count, 1);
        assert_eq!(page.page.total, 2);
    }
}
