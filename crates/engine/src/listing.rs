//! Paginated, filterable resource lists.
//!
//! [`ListController`] owns the paging and filter state behind a resource
//! table. It builds the query for the next fetch, tags every fetch with a
//! sequence number and only applies the response of the latest request, so
//! a slow answer for a page the user already left cannot overwrite newer
//! state. Deletes go through an explicit confirmation step.

use std::{fmt, future::Future};

use crate::{
    EngineError, ResultEngine,
    query::ListQuery,
    records::{ListPage, Page},
};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// The four resource collections exposed by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Transactions,
    Categories,
    Currencies,
    PaymentMethods,
}

impl Resource {
    /// Path segment of the collection.
    pub fn route(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Categories => "categories",
            Self::Currencies => "currencies",
            Self::PaymentMethods => "payment-methods",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::Categories => "Categories",
            Self::Currencies => "Currencies",
            Self::PaymentMethods => "Payment Methods",
        }
    }

    /// Fields a list of this resource can be filtered on.
    pub fn filter_fields(self) -> &'static [FilterField] {
        match self {
            Self::Transactions => &[
                FilterField::Amount,
                FilterField::Date,
                FilterField::Description,
            ],
            Self::Categories => &[FilterField::Name, FilterField::Type],
            Self::Currencies | Self::PaymentMethods => &[FilterField::Name],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterField {
    Amount,
    Date,
    Description,
    Name,
    Type,
}

impl FilterField {
    /// Attribute name used in the query string.
    pub fn key(self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Date => "date",
            Self::Description => "description",
            Self::Name => "name",
            Self::Type => "type",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Amount => "Amount",
            Self::Date => "Date",
            Self::Description => "Note",
            Self::Name => "Name",
            Self::Type => "Type",
        }
    }
}

/// Single-field, case-insensitive substring filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub field: Option<FilterField>,
    pub value: String,
}

impl Filter {
    /// The `(field, value)` to send, if both are set.
    pub fn clause(&self) -> Option<(FilterField, &str)> {
        let value = self.value.trim();
        match self.field {
            Some(field) if !value.is_empty() => Some((field, value)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Fetching,
    Failed(String),
}

/// Identity of one issued fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub resource: Resource,
    pub query: ListQuery,
}

/// What happened to a completed fetch.
#[derive(Debug, PartialEq)]
pub enum FetchOutcome<E> {
    /// Records and pagination replaced.
    Applied,
    /// The server call failed; state kept as it was.
    Failed(E),
    /// A newer request was issued meanwhile; response dropped.
    Stale,
    /// The same query is already in flight; nothing was sent.
    Duplicate,
}

/// Backend able to return one page of `T`.
pub trait ListSource<T> {
    type Error: fmt::Display + Send;

    fn list(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> impl Future<Output = Result<ListPage<T>, Self::Error>> + Send;
}

/// Backend able to delete a record.
pub trait DeleteSink {
    type Error: fmt::Display + Send;

    fn delete(
        &self,
        resource: Resource,
        id: u64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Paging, filter and delete-confirmation state for one resource table.
#[derive(Debug)]
pub struct ListController<T> {
    resource: Resource,
    page: Page,
    filter: Filter,
    items: Vec<T>,
    status: FetchStatus,
    next_seq: u64,
    in_flight: Option<FetchTicket>,
    pending_delete: Option<u64>,
    stale: bool,
}

impl<T> ListController<T> {
    pub fn new(resource: Resource, page_size: u32) -> Self {
        Self {
            resource,
            page: Page::initial(page_size.max(1)),
            filter: Filter::default(),
            items: Vec::new(),
            status: FetchStatus::Idle,
            next_seq: 1,
            in_flight: None,
            pending_delete: None,
            stale: true,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// `true` when the page or filter changed since the last issued fetch,
    /// including while an older fetch is still in flight.
    pub fn needs_fetch(&self) -> bool {
        self.stale
    }

    /// Marks the cached page as outdated so the next render re-fetches.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn can_go_prev(&self) -> bool {
        self.page.page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.page.page < self.page.page_count
    }

    /// Moves to page `n`, kept within `1..=page_count`.
    pub fn set_page(&mut self, n: u32) {
        let last = self.page.page_count.max(1);
        let target = n.clamp(1, last);
        if target != self.page.page {
            self.page.page = target;
            self.stale = true;
        }
    }

    pub fn first_page(&mut self) {
        self.set_page(1);
    }

    pub fn last_page(&mut self) {
        self.set_page(self.page.page_count);
    }

    pub fn next_page(&mut self) {
        if self.can_go_next() {
            self.set_page(self.page.page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        if self.can_go_prev() {
            self.set_page(self.page.page - 1);
        }
    }

    /// Selects the filter field, clearing the value and going back to page 1.
    pub fn set_filter_field(&mut self, field: Option<FilterField>) -> ResultEngine<()> {
        if let Some(field) = field
            && !self.resource.filter_fields().contains(&field)
        {
            return Err(EngineError::InvalidFilter(format!(
                "{} cannot be filtered by {}",
                self.resource.route(),
                field.key()
            )));
        }
        self.apply_filter_field(field);
        Ok(())
    }

    fn apply_filter_field(&mut self, field: Option<FilterField>) {
        self.filter.field = field;
        self.filter.value.clear();
        self.reset_to_first_page();
    }

    /// Cycles through "no filter" and the resource's filter fields.
    pub fn cycle_filter_field(&mut self) {
        let fields = self.resource.filter_fields();
        let next = match self.filter.field {
            None => fields.first().copied(),
            Some(current) => fields
                .iter()
                .position(|field| *field == current)
                .and_then(|index| fields.get(index + 1).copied()),
        };
        self.apply_filter_field(next);
    }

    /// Updates the filter value and goes back to page 1. Ignored while no
    /// field is selected.
    pub fn set_filter_value(&mut self, value: impl Into<String>) {
        if self.filter.field.is_none() {
            return;
        }
        self.filter.value = value.into();
        self.reset_to_first_page();
    }

    pub fn clear_filter_value(&mut self) {
        if self.filter.value.is_empty() {
            return;
        }
        self.filter.value.clear();
        self.reset_to_first_page();
    }

    fn reset_to_first_page(&mut self) {
        self.page.page = 1;
        self.stale = true;
    }

    /// Query for the current page and filter, scoped to `user_id`.
    pub fn query(&self, user_id: u64) -> ListQuery {
        let mut query = ListQuery::new()
            .populate_all()
            .page(self.page.page, self.page.page_size)
            .sort_id_desc();
        if let Some((field, value)) = self.filter.clause() {
            query = query.contains(field.key(), value);
        }
        query.user_scope(user_id)
    }

    /// Starts a fetch for the current state, superseding any older one.
    ///
    /// Returns `None` when the exact same query is already in flight.
    pub fn begin_fetch(&mut self, user_id: u64) -> Option<FetchTicket> {
        let query = self.query(user_id);
        if self
            .in_flight
            .as_ref()
            .is_some_and(|ticket| ticket.query == query)
        {
            return None;
        }

        let ticket = FetchTicket {
            seq: self.next_seq,
            resource: self.resource,
            query,
        };
        self.next_seq += 1;
        self.in_flight = Some(ticket.clone());
        self.stale = false;
        self.status = FetchStatus::Fetching;
        tracing::debug!(
            "fetch #{} {}?{}",
            ticket.seq,
            self.resource.route(),
            ticket.query
        );
        Some(ticket)
    }

    /// Applies the result of `ticket` if it is still the latest request and
    /// the page and filter have not changed since it was issued.
    pub fn complete_fetch<E: fmt::Display>(
        &mut self,
        ticket: &FetchTicket,
        result: Result<ListPage<T>, E>,
    ) -> FetchOutcome<E> {
        let latest = self.in_flight.as_ref().map(|current| current.seq);
        if latest != Some(ticket.seq) {
            tracing::warn!(
                "dropping response #{} for {}, latest is {latest:?}",
                ticket.seq,
                self.resource.route()
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = None;
        if self.stale {
            tracing::debug!(
                "dropping response #{} for {}, state changed since it was sent",
                ticket.seq,
                self.resource.route()
            );
            self.status = FetchStatus::Idle;
            return FetchOutcome::Stale;
        }

        match result {
            Ok(page) => {
                self.items = page.items;
                self.page = page.page;
                self.status = FetchStatus::Idle;
                FetchOutcome::Applied
            }
            Err(err) => {
                tracing::error!("failed to fetch {}: {err}", self.resource.route());
                self.status = FetchStatus::Failed(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Fetches the current page from `source`.
    pub async fn fetch_page<S>(&mut self, source: &S, user_id: u64) -> FetchOutcome<S::Error>
    where
        S: ListSource<T>,
    {
        let Some(ticket) = self.begin_fetch(user_id) else {
            return FetchOutcome::Duplicate;
        };
        let result = source.list(ticket.resource, &ticket.query).await;
        self.complete_fetch(&ticket, result)
    }

    /// First step of a delete: remember what to delete and wait for the user.
    pub fn request_delete(&mut self, id: u64) {
        self.pending_delete = Some(id);
    }

    pub fn pending_delete(&self) -> Option<u64> {
        self.pending_delete
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Second step: the user said yes. Returns the id to delete.
    pub fn confirm_delete(&mut self) -> Option<u64> {
        self.pending_delete.take()
    }

    /// Records the result of a delete call. Success invalidates the page.
    pub fn complete_delete<E: fmt::Display>(&mut self, id: u64, result: Result<(), E>) -> Result<(), E> {
        match result {
            Ok(()) => {
                tracing::info!("deleted {} #{id}", self.resource.route());
                self.invalidate();
                Ok(())
            }
            Err(err) => {
                tracing::error!("failed to delete {} #{id}: {err}", self.resource.route());
                Err(err)
            }
        }
    }

    /// Confirms the pending delete and performs it against `sink`.
    ///
    /// Returns `None` when nothing was awaiting confirmation.
    pub async fn delete_confirmed<S>(&mut self, sink: &S) -> Option<Result<(), S::Error>>
    where
        S: DeleteSink,
    {
        let id = self.confirm_delete()?;
        let result = sink.delete(self.resource, id).await;
        Some(self.complete_delete(id, result))
    }
}

/// Reads every page of `query`, starting from page 1.
pub async fn fetch_all<T, S>(source: &S, resource: Resource, query: ListQuery) -> Result<Vec<T>, S::Error>
where
    S: ListSource<T> + Sync,
    T: Send,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let ListPage { items: batch, page: meta } = source.list(resource, &query.with_page(page)).await?;
        let done = batch.is_empty() || page >= meta.page_count;
        items.extend(batch);
        if done {
            return Ok(items);
        }
        page += 1;
    }
}
