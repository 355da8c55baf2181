//! Terminal form state: labelled fields with keyboard focus, turned into the
//! engine's validated forms on submit.

use std::path::PathBuf;

use api_types::category::CategoryType;
use chrono::{DateTime, NaiveDate, Utc};
use engine::{
    Category, Currency, EngineError, PaymentMethod, ResultEngine, Transaction,
    records::coerce_date,
    validation::{
        CategoryForm, ChangePasswordForm, CurrencyForm, FieldErrors, PaymentMethodForm,
        SignInForm, SignUpForm, TransactionForm,
    },
};

use crate::app::state::Lookups;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    SignIn,
    SignUp,
    ChangePassword,
    Transaction(Option<u64>),
    Category(Option<u64>),
    Currency(Option<u64>),
    PaymentMethod(Option<u64>),
}

impl FormTarget {
    pub fn title(self) -> &'static str {
        match self {
            Self::SignIn => "sign in",
            Self::SignUp => "sign up",
            Self::ChangePassword => "change password",
            Self::Transaction(None) => "new transaction",
            Self::Transaction(Some(_)) => "edit transaction",
            Self::Category(None) => "new category",
            Self::Category(Some(_)) => "edit category",
            Self::Currency(None) => "new currency",
            Self::Currency(Some(_)) => "edit currency",
            Self::PaymentMethod(None) => "new payment method",
            Self::PaymentMethod(Some(_)) => "edit payment method",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: u64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text { value: String, secret: bool },
    Choice { options: Vec<Choice>, selected: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub input: Input,
}

impl Field {
    fn text(key: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            label,
            input: Input::Text {
                value: value.into(),
                secret: false,
            },
        }
    }

    fn secret(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            input: Input::Text {
                value: String::new(),
                secret: true,
            },
        }
    }

    fn choice(key: &'static str, label: &'static str, options: Vec<Choice>, current: Option<u64>) -> Self {
        let selected = current.and_then(|id| options.iter().position(|choice| choice.id == id));
        Self {
            key,
            label,
            input: Input::Choice { options, selected },
        }
    }

    /// What the field shows: the typed text or the selected option.
    pub fn display(&self) -> String {
        match &self.input {
            Input::Text { value, secret: true } => "•".repeat(value.chars().count()),
            Input::Text { value, .. } => value.clone(),
            Input::Choice { options, selected } => selected
                .and_then(|index| options.get(index))
                .map(|choice| choice.label.clone())
                .unwrap_or_else(|| "<select>".to_string()),
        }
    }
}

const TYPE_EXPENSE: u64 = 0;
const TYPE_INCOME: u64 = 1;

fn type_choices() -> Vec<Choice> {
    vec![
        Choice {
            id: TYPE_EXPENSE,
            label: CategoryType::Expense.as_str().to_string(),
        },
        Choice {
            id: TYPE_INCOME,
            label: CategoryType::Income.as_str().to_string(),
        },
    ]
}

fn type_id(kind: CategoryType) -> u64 {
    match kind {
        CategoryType::Expense => TYPE_EXPENSE,
        CategoryType::Income => TYPE_INCOME,
    }
}

/// A form being edited in the terminal.
#[derive(Debug, Clone)]
pub struct FormState {
    pub target: FormTarget,
    pub fields: Vec<Field>,
    pub focus: usize,
    pub errors: FieldErrors,
    pub submitting: bool,
}

impl FormState {
    fn new(target: FormTarget, fields: Vec<Field>) -> Self {
        Self {
            target,
            fields,
            focus: 0,
            errors: FieldErrors::default(),
            submitting: false,
        }
    }

    pub fn sign_in(identifier: &str) -> Self {
        let mut form = Self::new(
            FormTarget::SignIn,
            vec![
                Field::text("identifier", "Email", identifier),
                Field::secret("password", "Password"),
            ],
        );
        if !identifier.is_empty() {
            form.focus = 1;
        }
        form
    }

    pub fn sign_up() -> Self {
        Self::new(
            FormTarget::SignUp,
            vec![
                Field::text("full_name", "Full name", ""),
                Field::text("email", "Email", ""),
                Field::secret("password", "Password"),
                Field::secret("confirm_password", "Confirm password"),
            ],
        )
    }

    pub fn change_password() -> Self {
        Self::new(
            FormTarget::ChangePassword,
            vec![
                Field::secret("current_password", "Current password"),
                Field::secret("password", "New password"),
                Field::secret("password_confirmation", "Confirm password"),
            ],
        )
    }

    pub fn category(record: Option<&Category>) -> Self {
        let form = record.map(CategoryForm::from_record).unwrap_or_default();
        Self::new(
            FormTarget::Category(record.map(|c| c.id)),
            vec![
                Field::text("name", "Name", form.name),
                Field::choice("type", "Type", type_choices(), form.kind.map(type_id)),
            ],
        )
    }

    pub fn currency(record: Option<&Currency>) -> Self {
        let form = record.map(CurrencyForm::from_record).unwrap_or_default();
        Self::new(
            FormTarget::Currency(record.map(|c| c.id)),
            vec![
                Field::text("name", "Name", form.name),
                Field::text("symbol", "Symbol", form.symbol),
            ],
        )
    }

    pub fn payment_method(record: Option<&PaymentMethod>) -> Self {
        let form = record.map(PaymentMethodForm::from_record).unwrap_or_default();
        Self::new(
            FormTarget::PaymentMethod(record.map(|m| m.id)),
            vec![Field::text("name", "Name", form.name)],
        )
    }

    pub fn transaction(record: Option<&Transaction>, lookups: &Lookups) -> Self {
        let form = record.map(TransactionForm::from_record).unwrap_or_default();
        let date = form
            .date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let receipt = record
            .and_then(|tx| tx.receipt.as_ref())
            .map(|file| file.name.clone())
            .unwrap_or_default();
        Self::new(
            FormTarget::Transaction(record.map(|tx| tx.id)),
            vec![
                Field::text("amount", "Amount", form.amount),
                Field::text("date", "Date (YYYY-MM-DD)", date),
                Field::text("description", "Note", form.description),
                Field::choice("currency", "Currency", lookups.currency_choices(), form.currency),
                Field::choice("category", "Category", lookups.category_choices(), form.category),
                Field::choice(
                    "payment_method",
                    "Payment method",
                    lookups.payment_method_choices(),
                    form.payment_method,
                ),
                Field::text("receipt", "Receipt file", receipt),
            ],
        )
    }

    pub fn focused(&self) -> Option<&Field> {
        self.fields.get(self.focus)
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(Input::Text { value, .. }) = self.fields.get_mut(self.focus).map(|f| &mut f.input) {
            value.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(Input::Text { value, .. }) = self.fields.get_mut(self.focus).map(|f| &mut f.input) {
            value.pop();
        }
    }

    /// Moves the selection of a choice field by `step`.
    pub fn cycle_choice(&mut self, step: isize) {
        if let Some(Input::Choice { options, selected }) =
            self.fields.get_mut(self.focus).map(|f| &mut f.input)
        {
            if options.is_empty() {
                return;
            }
            let len = options.len() as isize;
            let next = match *selected {
                None if step < 0 => len - 1,
                None => 0,
                Some(index) => (index as isize + step).rem_euclid(len),
            };
            *selected = Some(next as usize);
        }
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors.get(key)
    }

    fn text(&self, key: &str) -> String {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .and_then(|field| match &field.input {
                Input::Text { value, .. } => Some(value.clone()),
                Input::Choice { .. } => None,
            })
            .unwrap_or_default()
    }

    fn choice(&self, key: &str) -> Option<u64> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .and_then(|field| match &field.input {
                Input::Choice { options, selected } => {
                    selected.and_then(|index| options.get(index)).map(|c| c.id)
                }
                Input::Text { .. } => None,
            })
    }

    pub fn sign_in_form(&self) -> SignInForm {
        SignInForm {
            identifier: self.text("identifier"),
            password: self.text("password"),
        }
    }

    pub fn sign_up_form(&self) -> SignUpForm {
        SignUpForm {
            full_name: self.text("full_name"),
            email: self.text("email"),
            password: self.text("password"),
            confirm_password: self.text("confirm_password"),
        }
    }

    pub fn change_password_form(&self) -> ChangePasswordForm {
        ChangePasswordForm {
            current_password: self.text("current_password"),
            password: self.text("password"),
            password_confirmation: self.text("password_confirmation"),
        }
    }

    pub fn category_form(&self) -> CategoryForm {
        CategoryForm {
            name: self.text("name"),
            kind: self.choice("type").map(|id| {
                if id == TYPE_INCOME {
                    CategoryType::Income
                } else {
                    CategoryType::Expense
                }
            }),
        }
    }

    pub fn currency_form(&self) -> CurrencyForm {
        CurrencyForm {
            name: self.text("name"),
            symbol: self.text("symbol"),
        }
    }

    pub fn payment_method_form(&self) -> PaymentMethodForm {
        PaymentMethodForm {
            name: self.text("name"),
        }
    }

    /// The transaction form plus the receipt file to upload, if a new path
    /// was typed.
    ///
    /// `existing_receipt` is the receipt already attached to the record being
    /// edited; it is kept as long as the field still shows its name.
    pub fn transaction_form(
        &self,
        existing: Option<&Transaction>,
    ) -> ResultEngine<(TransactionForm, Option<PathBuf>)> {
        let mut errors = FieldErrors::default();
        let date_text = self.text("date");
        let date = if date_text.trim().is_empty() {
            None
        } else {
            let parsed = parse_form_date(&date_text);
            if parsed.is_none() {
                errors.push("date", "Please enter a valid date (YYYY-MM-DD).");
            }
            parsed
        };

        let existing_receipt = existing.and_then(|tx| tx.receipt.as_ref());
        let receipt_text = self.text("receipt");
        let receipt_text = receipt_text.trim();
        let (receipt, upload) = match existing_receipt {
            Some(file) if file.name == receipt_text => (Some(file.id), None),
            _ if receipt_text.is_empty() => (None, None),
            _ => (None, Some(PathBuf::from(receipt_text))),
        };

        let form = TransactionForm {
            amount: self.text("amount"),
            date,
            description: self.text("description"),
            currency: self.choice("currency"),
            category: self.choice("category"),
            payment_method: self.choice("payment_method"),
            receipt,
        };

        if errors.is_empty() {
            Ok((form, upload))
        } else {
            Err(EngineError::Validation(errors))
        }
    }
}

fn parse_form_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|_| coerce_date(text))
}

#[cfg(test)]
mod tests {
    use engine::records::{NamedRef, StoredFile};

    use super::*;

    fn type_in(form: &mut FormState, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn sign_in_focuses_password_when_prefilled() {
        let form = FormState::sign_in("ana@example.com");
        assert_eq!(form.focused().unwrap().key, "password");
        assert_eq!(form.sign_in_form().identifier, "ana@example.com");
    }

    #[test]
    fn secrets_are_masked() {
        let mut form = FormState::change_password();
        type_in(&mut form, "hunter2");
        assert_eq!(form.fields[0].display(), "•••••••");
        assert_eq!(form.change_password_form().current_password, "hunter2");
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = FormState::payment_method(None);
        form.next_field();
        assert_eq!(form.focus, 0);
        let mut form = FormState::sign_up();
        form.prev_field();
        assert_eq!(form.focus, 3);
    }

    #[test]
    fn category_type_is_picked_from_choices() {
        let mut form = FormState::category(None);
        type_in(&mut form, "Rent");
        form.next_field();
        form.cycle_choice(-1);
        let category = form.category_form();
        assert_eq!(category.name, "Rent");
        assert_eq!(category.kind, Some(CategoryType::Income));
    }

    #[test]
    fn transaction_form_reads_choices_and_date() {
        let lookups = Lookups {
            currencies: vec![Currency {
                id: 3,
                name: "EUR".into(),
                symbol: None,
            }],
            ..Lookups::default()
        };
        let mut form = FormState::transaction(None, &lookups);
        type_in(&mut form, "12.50");
        form.next_field();
        type_in(&mut form, "2024-02-30");
        assert!(matches!(
            form.transaction_form(None),
            Err(EngineError::Validation(errors)) if errors.get("date").is_some()
        ));

        form.pop_char();
        form.pop_char();
        type_in(&mut form, "29");
        form.focus = 3;
        form.cycle_choice(1);
        let (tx, upload) = form.transaction_form(None).unwrap();
        assert_eq!(tx.amount, "12.50");
        assert_eq!(tx.currency, Some(3));
        assert_eq!(tx.date.unwrap().to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert!(upload.is_none());
    }

    #[test]
    fn existing_receipt_is_kept_unless_replaced() {
        let record = Transaction {
            id: 9,
            amount: None,
            date: None,
            description: None,
            category: None,
            currency: Some(NamedRef {
                id: 1,
                name: "EUR".into(),
            }),
            payment_method: None,
            receipt: Some(StoredFile {
                id: 77,
                url: "/uploads/r.png".into(),
                name: "r.png".into(),
            }),
        };
        let mut form = FormState::transaction(Some(&record), &Lookups::default());
        let (tx, upload) = form.transaction_form(Some(&record)).unwrap();
        assert_eq!(tx.receipt, Some(77));
        assert!(upload.is_none());

        form.focus = 6;
        type_in(&mut form, "x");
        let (tx, upload) = form.transaction_form(Some(&record)).unwrap();
        assert_eq!(tx.receipt, None);
        assert_eq!(upload, Some(PathBuf::from("r.pngx")));
    }
}
