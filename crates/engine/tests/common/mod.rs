#![allow(dead_code)]

use std::{
    future::Future,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use engine::{DeleteSink, ListPage, ListQuery, ListSource, Page, Resource};

/// In-memory backend serving `u64` records, newest first as given.
pub struct FakeSource {
    records: Vec<u64>,
    calls: AtomicUsize,
    fail: AtomicBool,
    queries: Mutex<Vec<ListQuery>>,
    deleted: Mutex<Vec<(Resource, u64)>>,
}

impl FakeSource {
    pub fn new(records: Vec<u64>) -> Self {
        Self {
            records,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            queries: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<ListQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn deleted(&self) -> Vec<(Resource, u64)> {
        self.deleted.lock().unwrap().clone()
    }

    fn page_of(&self, query: &ListQuery) -> ListPage<u64> {
        let number = |key: &str, default: u32| {
            query
                .get(key)
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(default)
        };
        let page = number("pagination[page]", 1);
        let page_size = number("pagination[pageSize]", 10);
        let total = self.records.len() as u64;
        let page_count = (self.records.len() as u32).div_ceil(page_size).max(1);
        let start = ((page - 1) * page_size) as usize;
        let items = self
            .records
            .iter()
            .skip(start)
            .take(page_size as usize)
            .copied()
            .collect();
        ListPage {
            items,
            page: Page {
                page,
                page_size,
                page_count,
                total,
            },
        }
    }
}

impl ListSource<u64> for FakeSource {
    type Error = String;

    fn list(
        &self,
        _resource: Resource,
        query: &ListQuery,
    ) -> impl Future<Output = Result<ListPage<u64>, Self::Error>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        let result = if self.fail.load(Ordering::SeqCst) {
            Err("Internal Server Error".to_string())
        } else {
            Ok(self.page_of(query))
        };
        async move { result }
    }
}

impl DeleteSink for FakeSource {
    type Error = String;

    fn delete(&self, resource: Resource, id: u64) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.deleted.lock().unwrap().push((resource, id));
        async move { Ok(()) }
    }
}
