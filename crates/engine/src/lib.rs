//! Client-side logic of the finance dashboard.
//!
//! Nothing here talks to the network or the terminal. The HTTP client plugs in
//! through the [`listing::ListSource`] and [`listing::DeleteSink`] traits, and
//! the aggregations work on already decoded [`Transaction`]s.

pub use aggregate::{ChartSeries, Dashboard, MonthlyScope, MonthlySeries};
pub use color::{Palette, Rgba};
pub use error::EngineError;
pub use listing::{
    DeleteSink, FetchOutcome, FetchStatus, FetchTicket, Filter, FilterField, ListController,
    ListSource, Resource,
};
pub use money::Money;
pub use query::ListQuery;
pub use records::{
    Category, CategoryRef, Currency, ListPage, NamedRef, Page, PaymentMethod, StoredFile,
    Transaction, WireRecord,
};
pub use session::{Session, SessionStore};

pub mod aggregate;
pub mod color;
mod error;
pub mod listing;
mod money;
pub mod query;
pub mod records;
pub mod session;
pub mod validation;

pub type ResultEngine<T> = Result<T, EngineError>;
