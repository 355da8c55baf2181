use std::time::{Duration, Instant};

use api_types::category::CategoryType;
use chrono_tz::Tz;
use engine::{
    Category, Currency, Dashboard, ListController, MonthlyScope, MonthlySeries, Palette,
    PaymentMethod, Resource, ResultEngine, Transaction,
};

use crate::app::forms::{Choice, FormState};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    SignUp,
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Transactions,
    Categories,
    Currencies,
    PaymentMethods,
    Account,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Dashboard,
        Section::Transactions,
        Section::Categories,
        Section::Currencies,
        Section::PaymentMethods,
        Section::Account,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Transactions => "Transactions",
            Self::Categories => "Categories",
            Self::Currencies => "Currencies",
            Self::PaymentMethods => "Payment Methods",
            Self::Account => "Account",
        }
    }

    pub fn resource(self) -> Option<Resource> {
        match self {
            Self::Transactions => Some(Resource::Transactions),
            Self::Categories => Some(Resource::Categories),
            Self::Currencies => Some(Resource::Currencies),
            Self::PaymentMethods => Some(Resource::PaymentMethods),
            Self::Dashboard | Self::Account => None,
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Section bound to the digit keys `1`..`6`.
    pub fn from_digit(ch: char) -> Option<Self> {
        ch.to_digit(10)
            .and_then(|digit| (digit as usize).checked_sub(1))
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

impl ToastState {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            expires_at: Instant::now() + TOAST_TTL,
        }
    }
}

/// A resource table: the controller plus the highlighted row.
#[derive(Debug)]
pub struct ListView<T> {
    pub controller: ListController<T>,
    pub selected: usize,
}

impl<T> ListView<T> {
    pub fn new(resource: Resource, page_size: u32) -> Self {
        Self {
            controller: ListController::new(resource, page_size),
            selected: 0,
        }
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.controller.items().get(self.selected)
    }

    pub fn select_next(&mut self) {
        let len = self.controller.items().len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keeps the highlight inside the current page.
    pub fn clamp_selection(&mut self) {
        let len = self.controller.items().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Records used to fill the transaction form pickers and the dashboard scope.
#[derive(Debug, Default, Clone)]
pub struct Lookups {
    pub currencies: Vec<Currency>,
    pub categories: Vec<Category>,
    pub payment_methods: Vec<PaymentMethod>,
}

impl Lookups {
    pub fn currency_choices(&self) -> Vec<Choice> {
        self.currencies
            .iter()
            .map(|c| Choice {
                id: c.id,
                label: c.name.clone(),
            })
            .collect()
    }

    pub fn category_choices(&self) -> Vec<Choice> {
        self.categories
            .iter()
            .map(|c| Choice {
                id: c.id,
                label: format!("{} ({})", c.name, c.kind.as_str()),
            })
            .collect()
    }

    pub fn payment_method_choices(&self) -> Vec<Choice> {
        self.payment_methods
            .iter()
            .map(|m| Choice {
                id: m.id,
                label: m.name.clone(),
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct DashboardState {
    pub year: i32,
    pub transactions: Vec<Transaction>,
    pub dashboard: Option<Dashboard>,
    pub scope: MonthlyScope,
    pub scoped: Option<ResultEngine<MonthlySeries>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl DashboardState {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            transactions: Vec::new(),
            dashboard: None,
            scope: MonthlyScope::default(),
            scoped: None,
            loading: false,
            error: None,
        }
    }

    /// Recomputes every series from the loaded transactions.
    pub fn rebuild(&mut self, tz: Tz, palette: Palette) {
        self.dashboard = Some(Dashboard::build(&self.transactions, self.year, tz, palette));
        self.scoped = Some(
            self.scope
                .group_by_month(&self.transactions, self.year, tz, palette),
        );
    }

    /// Steps the scope currency through `currencies`, then back to none.
    pub fn cycle_currency(&mut self, currencies: &[Currency]) {
        let next = match self.scope.currency_id {
            None => currencies.first(),
            Some(current) => currencies
                .iter()
                .position(|c| c.id == current)
                .and_then(|index| currencies.get(index + 1)),
        };
        self.scope.currency_id = next.map(|c| c.id);
    }

    pub fn cycle_kind(&mut self) {
        self.scope.kind = match self.scope.kind {
            None => Some(CategoryType::Expense),
            Some(CategoryType::Expense) => Some(CategoryType::Income),
            Some(CategoryType::Income) => None,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub resource: Resource,
    pub id: u64,
    pub label: String,
}

#[derive(Debug)]
pub enum Modal {
    Form(FormState),
    ConfirmDelete(PendingDelete),
    Filter,
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub section: Section,
    pub auth_form: FormState,
    pub modal: Option<Modal>,
    pub user: Option<String>,
    pub transactions: ListView<Transaction>,
    pub categories: ListView<Category>,
    pub currencies: ListView<Currency>,
    pub payment_methods: ListView<PaymentMethod>,
    pub lookups: Lookups,
    pub dashboard: DashboardState,
    pub toast: Option<ToastState>,
    pub base_url: String,
    /// Record being edited, kept to compare the receipt on submit.
    pub editing: Option<Transaction>,
}

impl AppState {
    pub fn new(identifier: &str, base_url: &str, page_size: u32, year: i32) -> Self {
        Self {
            screen: Screen::SignIn,
            section: Section::Dashboard,
            auth_form: FormState::sign_in(identifier),
            modal: None,
            user: None,
            transactions: ListView::new(Resource::Transactions, page_size),
            categories: ListView::new(Resource::Categories, page_size),
            currencies: ListView::new(Resource::Currencies, page_size),
            payment_methods: ListView::new(Resource::PaymentMethods, page_size),
            lookups: Lookups::default(),
            dashboard: DashboardState::new(year),
            toast: None,
            base_url: base_url.to_string(),
            editing: None,
        }
    }

    pub fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(ToastState::new(level, message));
    }

    /// `true` while keystrokes go into a text field.
    pub fn is_typing(&self) -> bool {
        self.screen != Screen::Shell || matches!(self.modal, Some(Modal::Form(_) | Modal::Filter))
    }

    /// Marks every list as outdated.
    pub fn invalidate_lists(&mut self) {
        self.transactions.controller.invalidate();
        self.categories.controller.invalidate();
        self.currencies.controller.invalidate();
        self.payment_methods.controller.invalidate();
    }

    pub fn invalidate(&mut self, resource: Resource) {
        match resource {
            Resource::Transactions => self.transactions.controller.invalidate(),
            Resource::Categories => self.categories.controller.invalidate(),
            Resource::Currencies => self.currencies.controller.invalidate(),
            Resource::PaymentMethods => self.payment_methods.controller.invalidate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_jump_to_sections() {
        assert_eq!(Section::from_digit('1'), Some(Section::Dashboard));
        assert_eq!(Section::from_digit('5'), Some(Section::PaymentMethods));
        assert_eq!(Section::from_digit('0'), None);
        assert_eq!(Section::from_digit('9'), None);
        assert_eq!(Section::Account.next(), Section::Dashboard);
    }

    #[test]
    fn scope_cycles_through_currencies_then_none() {
        let currencies = vec![
            Currency {
                id: 1,
                name: "EUR".into(),
                symbol: None,
            },
            Currency {
                id: 2,
                name: "USD".into(),
                symbol: None,
            },
        ];
        let mut dashboard = DashboardState::new(2024);
        dashboard.cycle_currency(&currencies);
        assert_eq!(dashboard.scope.currency_id, Some(1));
        dashboard.cycle_currency(&currencies);
        assert_eq!(dashboard.scope.currency_id, Some(2));
        dashboard.cycle_currency(&currencies);
        assert_eq!(dashboard.scope.currency_id, None);
    }

    #[test]
    fn rebuild_reports_missing_scope() {
        let mut dashboard = DashboardState::new(2024);
        dashboard.rebuild(Tz::UTC, Palette::Stable);
        assert!(dashboard.dashboard.is_some());
        assert!(matches!(dashboard.scoped, Some(Err(_))));

        dashboard.cycle_kind();
        dashboard.scope.currency_id = Some(1);
        dashboard.rebuild(Tz::UTC, Palette::Stable);
        assert!(matches!(dashboard.scoped, Some(Ok(_))));
    }

    #[test]
    fn typing_depends_on_screen_and_modal() {
        let mut state = AppState::new("", "http://localhost", 10, 2024);
        assert!(state.is_typing());
        state.screen = Screen::Shell;
        assert!(!state.is_typing());
        state.modal = Some(Modal::Filter);
        assert!(state.is_typing());
    }
}
