//! Form checks run before anything is sent to the API.
//!
//! Each form holds what the user typed. `validate` either returns the request
//! body for the API or every failing field with its message.

use std::fmt;

use api_types::{
    auth::{ChangePassword, Register, SignIn},
    category::{CategoryData, CategoryType},
    currency::CurrencyData,
    payment_method::PaymentMethodData,
    transaction::TransactionData,
};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    EngineError, Money, ResultEngine,
    records::{Category, Currency, PaymentMethod, Transaction},
};

pub const MIN_PASSWORD_LEN: usize = 5;
pub const MIN_CATEGORY_NAME_LEN: usize = 2;

const PASSWORD_TOO_SHORT: &str = "Password must be at least 5 characters long";
const PASSWORDS_DIFFER: &str = "Passwords don't match";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failed check of one form submission, in field order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> ResultEngine<T> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(EngineError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Loose `local@domain.tld` check.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn check_email(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "Please enter your email.");
    } else if !is_email(value.trim()) {
        errors.push(field, "Invalid email");
    }
}

fn check_password(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.chars().count() < MIN_PASSWORD_LEN {
        errors.push(field, PASSWORD_TOO_SHORT);
    }
}

fn required_name(errors: &mut FieldErrors, value: &str) -> String {
    let name = value.trim();
    if name.is_empty() {
        errors.push("name", "Please enter the name.");
    }
    name.to_string()
}

#[derive(Clone, Debug, Default)]
pub struct SignInForm {
    pub identifier: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> ResultEngine<SignIn> {
        let mut errors = FieldErrors::default();
        check_email(&mut errors, "identifier", &self.identifier);
        check_password(&mut errors, "password", &self.password);
        errors.into_result(|| SignIn {
            identifier: self.identifier.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    /// The email doubles as the username.
    pub fn validate(&self) -> ResultEngine<Register> {
        let mut errors = FieldErrors::default();
        if self.full_name.trim().is_empty() {
            errors.push("full_name", "Please enter your full name.");
        }
        check_email(&mut errors, "email", &self.email);
        check_password(&mut errors, "password", &self.password);
        check_password(&mut errors, "confirm_password", &self.confirm_password);
        if self.password != self.confirm_password {
            errors.push("confirm_password", PASSWORDS_DIFFER);
        }
        let email = self.email.trim().to_string();
        errors.into_result(|| Register {
            username: email.clone(),
            full_name: self.full_name.trim().to_string(),
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: String,
}

impl ChangePasswordForm {
    pub fn validate(&self) -> ResultEngine<ChangePassword> {
        let mut errors = FieldErrors::default();
        if self.current_password.is_empty() {
            errors.push("current_password", "Please enter the current password");
        }
        check_password(&mut errors, "password", &self.password);
        check_password(&mut errors, "password_confirmation", &self.password_confirmation);
        if self.password != self.password_confirmation {
            errors.push("password_confirmation", PASSWORDS_DIFFER);
        }
        errors.into_result(|| ChangePassword {
            current_password: self.current_password.clone(),
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct CategoryForm {
    pub name: String,
    pub kind: Option<CategoryType>,
}

impl CategoryForm {
    pub fn from_record(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            kind: Some(category.kind),
        }
    }

    pub fn validate(&self, user_id: u64) -> ResultEngine<CategoryData> {
        let mut errors = FieldErrors::default();
        let name = self.name.trim();
        if name.chars().count() < MIN_CATEGORY_NAME_LEN {
            errors.push("name", "Category name must be at least 2 characters.");
        }
        if self.kind.is_none() {
            errors.push("type", "Please select category type.");
        }
        match self.kind {
            Some(kind) if errors.is_empty() => Ok(CategoryData {
                name: name.to_string(),
                kind,
                user: user_id,
            }),
            _ => Err(EngineError::Validation(errors)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CurrencyForm {
    pub name: String,
    pub symbol: String,
}

impl CurrencyForm {
    pub fn from_record(currency: &Currency) -> Self {
        Self {
            name: currency.name.clone(),
            symbol: currency.symbol.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self, user_id: u64) -> ResultEngine<CurrencyData> {
        let mut errors = FieldErrors::default();
        let name = required_name(&mut errors, &self.name);
        let symbol = Some(self.symbol.trim().to_string()).filter(|s| !s.is_empty());
        errors.into_result(|| CurrencyData {
            name,
            symbol,
            user: user_id,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct PaymentMethodForm {
    pub name: String,
}

impl PaymentMethodForm {
    pub fn from_record(method: &PaymentMethod) -> Self {
        Self {
            name: method.name.clone(),
        }
    }

    pub fn validate(&self, user_id: u64) -> ResultEngine<PaymentMethodData> {
        let mut errors = FieldErrors::default();
        let name = required_name(&mut errors, &self.name);
        errors.into_result(|| PaymentMethodData {
            name,
            user: user_id,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct TransactionForm {
    pub amount: String,
    /// `None` means "now" at submission time.
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    pub currency: Option<u64>,
    pub category: Option<u64>,
    pub payment_method: Option<u64>,
    pub receipt: Option<u64>,
}

impl TransactionForm {
    /// Prefills the form for editing an existing transaction.
    pub fn from_record(tx: &Transaction) -> Self {
        Self {
            amount: tx.amount.map(|amount| amount.to_string()).unwrap_or_default(),
            date: tx.date,
            description: tx.description.clone().unwrap_or_default(),
            currency: tx.currency.as_ref().map(|c| c.id),
            category: tx.category.as_ref().map(|c| c.id),
            payment_method: tx.payment_method.as_ref().map(|m| m.id),
            receipt: tx.receipt.as_ref().map(|file| file.id),
        }
    }

    pub fn validate(&self, user_id: u64, now: DateTime<Utc>) -> ResultEngine<TransactionData> {
        let mut errors = FieldErrors::default();

        let amount = self.amount.trim();
        let parsed = if amount.is_empty() {
            errors.push("amount", "Please enter the amount.");
            None
        } else {
            match amount.parse::<Money>() {
                Ok(money) => Some(money),
                Err(_) => {
                    errors.push("amount", "Please enter a valid amount.");
                    None
                }
            }
        };
        if self.currency.is_none() {
            errors.push("currency", "Please select a currency.");
        }
        if self.category.is_none() {
            errors.push("category", "Please select a category.");
        }
        if self.payment_method.is_none() {
            errors.push("payment_method", "Please select a payment method.");
        }

        match (parsed, self.currency, self.category, self.payment_method) {
            (Some(amount), Some(currency), Some(category), Some(payment_method))
                if errors.is_empty() =>
            {
                let description = self.description.trim();
                Ok(TransactionData {
                    amount: amount.to_string(),
                    date: self
                        .date
                        .unwrap_or(now)
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                    description: (!description.is_empty()).then(|| description.to_string()),
                    currency,
                    category,
                    payment_method,
                    user: user_id,
                    receipt: self.receipt,
                })
            }
            _ => Err(EngineError::Validation(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn errors_of<T: fmt::Debug>(result: ResultEngine<T>) -> FieldErrors {
        match result {
            Err(EngineError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn email_check() {
        assert!(is_email("ana@example.com"));
        assert!(!is_email("ana@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ana@@example.com"));
        assert!(!is_email("an a@example.com"));
    }

    #[test]
    fn sign_in_requires_email_and_long_password() {
        let errors = errors_of(
            SignInForm {
                identifier: "nope".into(),
                password: "1234".into(),
            }
            .validate(),
        );
        assert_eq!(errors.get("identifier"), Some("Invalid email"));
        assert_eq!(errors.get("password"), Some(PASSWORD_TOO_SHORT));
    }

    #[test]
    fn sign_up_uses_email_as_username() {
        let body = SignUpForm {
            full_name: " Ana Lopez ".into(),
            email: "ana@example.com".into(),
            password: "secret".into(),
            confirm_password: "secret".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(body.username, "ana@example.com");
        assert_eq!(body.full_name, "Ana Lopez");
    }

    #[test]
    fn mismatched_passwords_are_reported_on_the_confirmation() {
        let errors = errors_of(
            ChangePasswordForm {
                current_password: "old-pass".into(),
                password: "new-pass".into(),
                password_confirmation: "new-pasz".into(),
            }
            .validate(),
        );
        assert_eq!(errors.get("password_confirmation"), Some(PASSWORDS_DIFFER));
        assert_eq!(errors.get("password"), None);
    }

    #[test]
    fn category_needs_two_characters_and_a_type() {
        let errors = errors_of(
            CategoryForm {
                name: "a".into(),
                kind: None,
            }
            .validate(1),
        );
        assert_eq!(
            errors.get("name"),
            Some("Category name must be at least 2 characters.")
        );
        assert_eq!(errors.get("type"), Some("Please select category type."));
    }

    #[test]
    fn blank_symbol_is_omitted() {
        let body = CurrencyForm {
            name: "USD".into(),
            symbol: "  ".into(),
        }
        .validate(4)
        .unwrap();
        assert_eq!(body.symbol, None);
        assert_eq!(body.user, 4);
    }

    #[test]
    fn transaction_reports_every_missing_field() {
        let errors = errors_of(TransactionForm::default().validate(1, Utc::now()));
        assert_eq!(errors.get("amount"), Some("Please enter the amount."));
        assert_eq!(errors.get("currency"), Some("Please select a currency."));
        assert_eq!(errors.get("category"), Some("Please select a category."));
        assert_eq!(
            errors.get("payment_method"),
            Some("Please select a payment method.")
        );
    }

    #[test]
    fn transaction_defaults_date_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let body = TransactionForm {
            amount: "42,5".into(),
            currency: Some(1),
            category: Some(2),
            payment_method: Some(3),
            ..TransactionForm::default()
        }
        .validate(7, now)
        .unwrap();
        assert_eq!(body.amount, "42.50");
        assert_eq!(body.date, "2024-03-05T10:00:00.000Z");
        assert_eq!(body.description, None);
        assert_eq!(body.user, 7);
    }
}
