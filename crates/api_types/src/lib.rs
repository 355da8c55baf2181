//! Wire types of the headless-CMS REST API consumed by finboard.
//!
//! Responses wrap records as `{ data: { id, attributes } }` (single) or
//! `{ data: [...], meta: { pagination } }` (lists). Relations come back as
//! `{ data: ... }` objects, where one-of-many relations hold an array.
//!
//! These structs mirror the JSON only. Coercion into trusted domain records
//! happens in the `engine` crate.

use serde::{Deserialize, Serialize};

/// A stored record: numeric id plus its attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity<A> {
    pub id: u64,
    pub attributes: A,
}

/// Single-valued relation (`{ "data": { ... } | null }`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct One<T> {
    pub data: Option<T>,
}

/// One-of-many relation (`{ "data": [ ... ] | null }`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Many<T> {
    pub data: Option<Vec<T>>,
}

impl<T> Many<T> {
    /// The first related record, which is the authoritative one.
    pub fn first(&self) -> Option<&T> {
        self.data.as_ref().and_then(|items| items.first())
    }
}

/// Request body wrapper used by create and update calls.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataBody<T> {
    pub data: T,
}

pub mod envelope {
    use super::*;

    /// `{ "data": { ... } }`
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Single<T> {
        pub data: T,
    }

    /// `{ "data": [ ... ], "meta": { "pagination": { ... } } }`
    #[derive(Debug, Serialize, Deserialize)]
    pub struct List<T> {
        pub data: Vec<T>,
        #[serde(default)]
        pub meta: ListMeta,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ListMeta {
        #[serde(default)]
        pub pagination: Option<Pagination>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Pagination {
        pub page: u32,
        pub page_size: u32,
        pub page_count: u32,
        pub total: u64,
    }

    /// Error body returned with non-2xx statuses.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorEnvelope {
        pub error: ErrorBody,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorBody {
        #[serde(default)]
        pub status: Option<u16>,
        #[serde(default)]
        pub name: Option<String>,
        pub message: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum CategoryType {
        Expense,
        Income,
    }

    impl CategoryType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Expense => "Expense",
                Self::Income => "Income",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryAttributes {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryType,
    }

    /// Body of `POST /categories` and `PUT /categories/:id`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryData {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryType,
        pub user: u64,
    }
}

pub mod currency {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CurrencyAttributes {
        pub name: String,
        #[serde(default)]
        pub symbol: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyData {
        pub name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub symbol: Option<String>,
        pub user: u64,
    }
}

pub mod payment_method {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct PaymentMethodAttributes {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentMethodData {
        pub name: String,
        pub user: u64,
    }
}

pub mod upload {
    use super::*;

    /// One element of the `POST /upload` response array.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct UploadedFile {
        pub id: u64,
        pub url: String,
        pub name: String,
    }

    /// Attributes of a populated media relation.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct FileAttributes {
        pub url: String,
        pub name: String,
    }
}

pub mod transaction {
    use super::*;
    use crate::{
        category::CategoryAttributes, currency::CurrencyAttributes,
        payment_method::PaymentMethodAttributes, upload::FileAttributes,
    };

    /// Decimal fields may arrive either as JSON numbers or as strings.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum RawAmount {
        Number(f64),
        Text(String),
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionAttributes {
        #[serde(default)]
        pub amount: Option<RawAmount>,
        #[serde(default)]
        pub date: Option<String>,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub category: Option<One<Entity<CategoryAttributes>>>,
        #[serde(default)]
        pub currency: Option<Many<Entity<CurrencyAttributes>>>,
        #[serde(default)]
        pub payment_method: Option<Many<Entity<PaymentMethodAttributes>>>,
        #[serde(default)]
        pub receipt: Option<Many<Entity<FileAttributes>>>,
    }

    /// Body of `POST /transactions` and `PUT /transactions/:id`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionData {
        pub amount: String,
        /// RFC 3339 timestamp.
        pub date: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        pub currency: u64,
        pub category: u64,
        pub payment_method: u64,
        pub user: u64,
        /// Id of an uploaded file; `null` clears the receipt.
        pub receipt: Option<u64>,
    }
}

pub mod auth {
    use super::*;

    /// Body of `POST /auth/local`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignIn {
        pub identifier: String,
        pub password: String,
    }

    /// Body of `POST /auth/local/register`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Register {
        pub username: String,
        pub full_name: String,
        pub email: String,
        pub password: String,
    }

    /// Body of `POST /auth/change-password`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ChangePassword {
        pub current_password: String,
        pub password: String,
        pub password_confirmation: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: u64,
        pub username: String,
        #[serde(default)]
        pub email: Option<String>,
    }

    /// Response of sign-in, registration and password change.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub jwt: String,
        pub user: User,
    }
}

#[cfg(test)]
mod tests {
    use super::{envelope::List, transaction::RawAmount, transaction::TransactionAttributes, *};

    #[test]
    fn list_envelope_reads_pagination_and_relations() {
        let body = r#"{
            "data": [{
                "id": 7,
                "attributes": {
                    "amount": "12.50",
                    "date": "2024-03-05T10:00:00.000Z",
                    "description": null,
                    "category": { "data": { "id": 1, "attributes": { "name": "Food", "type": "Expense" } } },
                    "currency": { "data": [{ "id": 2, "attributes": { "name": "EUR" } }] },
                    "payment_method": { "data": [] },
                    "receipt": { "data": null },
                    "createdAt": "2024-03-05T10:00:00.000Z"
                }
            }],
            "meta": { "pagination": { "page": 2, "pageSize": 10, "pageCount": 3, "total": 21 } }
        }"#;

        let list: List<Entity<TransactionAttributes>> = serde_json::from_str(body).unwrap();
        let pagination = list.meta.pagination.unwrap();
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.page_count, 3);
        assert_eq!(pagination.total, 21);

        let tx = &list.data[0];
        assert_eq!(tx.id, 7);
        assert_eq!(tx.attributes.amount, Some(RawAmount::Text("12.50".to_string())));
        let category = tx.attributes.category.as_ref().unwrap().data.as_ref().unwrap();
        assert_eq!(category.attributes.name, "Food");
        let currency = tx.attributes.currency.as_ref().unwrap().first().unwrap();
        assert_eq!(currency.attributes.name, "EUR");
        assert!(tx.attributes.payment_method.as_ref().unwrap().first().is_none());
        assert!(tx.attributes.receipt.as_ref().unwrap().first().is_none());
    }

    #[test]
    fn numeric_amount_is_kept_as_number() {
        let attrs: TransactionAttributes =
            serde_json::from_str(r#"{ "amount": 42, "date": "2024-03-05" }"#).unwrap();
        assert_eq!(attrs.amount, Some(RawAmount::Number(42.0)));
        assert!(attrs.category.is_none());
    }

    #[test]
    fn relation_without_data_is_empty() {
        let attrs: TransactionAttributes = serde_json::from_str(
            r#"{ "category": {}, "currency": {}, "payment_method": { "data": null } }"#,
        )
        .unwrap();
        assert!(attrs.category.unwrap().data.is_none());
        assert!(attrs.currency.unwrap().first().is_none());
        assert!(attrs.payment_method.unwrap().first().is_none());
    }

    #[test]
    fn list_without_meta_still_decodes() {
        let list: List<Entity<currency::CurrencyAttributes>> =
            serde_json::from_str(r#"{ "data": [] }"#).unwrap();
        assert!(list.meta.pagination.is_none());
    }

    #[test]
    fn request_bodies_use_api_field_names() {
        let body = DataBody {
            data: category::CategoryData {
                name: "Rent".to_string(),
                kind: category::CategoryType::Expense,
                user: 4,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["data"]["type"], "Expense");

        let register = serde_json::to_value(auth::Register {
            username: "a@b.io".to_string(),
            full_name: "Ada".to_string(),
            email: "a@b.io".to_string(),
            password: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(register["fullName"], "Ada");
    }
}
