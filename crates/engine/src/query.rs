//! Query strings understood by the REST API.
//!
//! Keys use the API's bracket syntax (`pagination[page]`,
//! `filters[amount][$containsi]`). The HTTP client percent-encodes the pairs.

use std::fmt;

/// Page size used when the dashboard walks every page of transactions.
pub const DASHBOARD_PAGE_SIZE: u32 = 100;

/// Ordered `(key, value)` pairs of a list request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pairs: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `populate=*`: expand every relation.
    pub fn populate_all(self) -> Self {
        self.push("populate", "*")
    }

    pub fn page(self, page: u32, page_size: u32) -> Self {
        self.push("pagination[page]", page.to_string())
            .push("pagination[pageSize]", page_size.to_string())
    }

    /// Newest records first.
    pub fn sort_id_desc(self) -> Self {
        self.push("sort[0]", "id:desc")
    }

    /// Case-insensitive substring match on a single field.
    pub fn contains(self, field: &str, value: &str) -> Self {
        self.push(format!("filters[{field}][$containsi]"), value)
    }

    /// Exact match on a nested field path, e.g. `["currency", "id"]`.
    pub fn equals(self, path: &[&str], value: impl ToString) -> Self {
        let key = path
            .iter()
            .fold(String::from("filters"), |key, part| format!("{key}[{part}]"));
        self.push(format!("{key}[$eq]"), value.to_string())
    }

    /// Restricts the results to records owned by `user_id`.
    pub fn user_scope(self, user_id: u64) -> Self {
        self.equals(&["user", "id"], user_id)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Same query pointed at another page.
    pub fn with_page(&self, page: u32) -> Self {
        let mut next = self.clone();
        for (key, value) in &mut next.pairs {
            if key == "pagination[page]" {
                *value = page.to_string();
            }
        }
        next
    }

    fn push(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }
}

/// Unencoded rendering, for logs.
impl fmt::Display for ListQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.pairs.iter().enumerate() {
            if index > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Every transaction of the user, one page of [`DASHBOARD_PAGE_SIZE`] at a
/// time starting from page 1.
pub fn dashboard_query(user_id: u64) -> ListQuery {
    ListQuery::new()
        .populate_all()
        .page(1, DASHBOARD_PAGE_SIZE)
        .sort_id_desc()
        .user_scope(user_id)
}

/// Unpaged lookup list (currencies, categories, payment methods) used to fill
/// form pickers.
pub fn lookup_query(user_id: u64) -> ListQuery {
    ListQuery::new()
        .page(1, DASHBOARD_PAGE_SIZE)
        .user_scope(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_bracketed_keys_in_order() {
        let query = ListQuery::new()
            .populate_all()
            .page(2, 10)
            .sort_id_desc()
            .contains("amount", "10")
            .user_scope(3);

        assert_eq!(
            query.to_string(),
            "populate=*&pagination[page]=2&pagination[pageSize]=10&sort[0]=id:desc\
             &filters[amount][$containsi]=10&filters[user][id][$eq]=3"
        );
    }

    #[test]
    fn with_page_only_touches_the_page() {
        let query = dashboard_query(9);
        let next = query.with_page(4);
        assert_eq!(next.get("pagination[page]"), Some("4"));
        assert_eq!(next.get("pagination[pageSize]"), Some("100"));
        assert_eq!(next.get("filters[user][id][$eq]"), Some("9"));
    }

    #[test]
    fn nested_equals() {
        let query = ListQuery::new().equals(&["category", "type"], "Expense");
        assert_eq!(query.get("filters[category][type][$eq]"), Some("Expense"));
    }
}
