//! List queries: filter, stable sort, pagination.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::record::{compare_fields, Record};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(StoreError::State(format!(
                "sort order must be asc or desc, got {other:?}"
            ))),
        }
    }
}

pub type Filter = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// Options for `list`. Every part is optional; the default lists the first
/// page of the whole collection in insertion order.
#[derive(Default)]
pub struct ListOptions {
    filter: Option<Filter>,
    sort_by: Option<String>,
    sort_order: SortOrder,
    page: Option<usize>,
    page_size: Option<usize>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only records for which `predicate` returns true.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// 1-based page number.
    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page_size_or(&self, default: usize) -> usize {
        self.page_size.unwrap_or(default)
    }
}

impl fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOptions")
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("sort_by", &self.sort_by)
            .field("sort_order", &self.sort_order)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    /// Number of records left after filtering.
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Convert every item, keeping the pagination.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            data: self.data.into_iter().map(f).collect::<Result<_, E>>()?,
            pagination: self.pagination,
        })
    }
}

/// Case-insensitive substring match over `fields`, or over every field when
/// `fields` is empty. A blank term matches everything.
pub fn search_filter(term: &str, fields: &[&str]) -> impl Fn(&Record) -> bool + Send + Sync + 'static {
    let term = term.trim().to_lowercase();
    let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();

    move |record: &Record| {
        if term.is_empty() {
            return true;
        }
        let matches = |value: &Value| match value {
            Value::String(s) => s.to_lowercase().contains(&term),
            Value::Null => false,
            other => other.to_string().to_lowercase().contains(&term),
        };
        if fields.is_empty() {
            record.fields().any(|(_, value)| matches(value))
        } else {
            fields.iter().filter_map(|f| record.get(f)).any(matches)
        }
    }
}

/// Run a list query over `records`.
///
/// Filter first, then stable sort (ties keep their prior relative order, in
/// both directions), then slice the requested page. `page_size` falls back to
/// `default_page_size` when unset. A page or page size of 0 is rejected.
pub fn run(records: &[Record], options: &ListOptions, default_page_size: usize) -> Result<Page<Record>> {
    let page = options.page.unwrap_or(1);
    let page_size = options.page_size_or(default_page_size);
    if page == 0 {
        return Err(StoreError::State("page must be at least 1".into()));
    }
    if page_size == 0 {
        return Err(StoreError::State("page size must be at least 1".into()));
    }

    let mut matched: Vec<&Record> = match &options.filter {
        Some(filter) => records.iter().filter(|r| filter(r)).collect(),
        None => records.iter().collect(),
    };

    if let Some(field) = &options.sort_by {
        match options.sort_order {
            SortOrder::Asc => matched.sort_by(|a, b| compare_fields(a.get(field), b.get(field))),
            SortOrder::Desc => matched.sort_by(|a, b| compare_fields(b.get(field), a.get(field))),
        }
    }

    let total = matched.len();
    let start = (page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size);
    let data = matched
        .get(start.min(total)..end.min(total))
        .unwrap_or_default()
        .iter()
        .map(|r| (*r).clone())
        .collect();

    Ok(Page {
        data,
        pagination: Pagination {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
            has_next: end < total,
            has_prev: page > 1,
        },
    })
}
