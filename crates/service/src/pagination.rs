//! Pagination utilities for the service layer.
//!
//! `offset` skips rows, `limit` caps the page size, and `meta.total` always
//! counts matching rows before pagination is applied.

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub const DEFAULT_LIMIT: u64 = 10;

/// Normalized pagination parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageQuery {
    /// rows to skip
    pub offset: u64,
    /// rows per page, at least 1
    pub limit: u64,
}

impl PageQuery {
    /// Apply defaults and reject a zero limit.
    pub fn new(offset: Option<u64>, limit: Option<u64>) -> Result<Self, ServiceError> {
        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(ServiceError::Validation("limit must be at least 1".into()));
        }
        Ok(Self { offset, limit })
    }
}

impl Default for PageQuery {
    fn default() -> Self { Self { offset: 0, limit: DEFAULT_LIMIT } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
}

/// Generic page container: one page of rows plus the pre-pagination count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self { data, meta: PageMeta { total } }
    }

    /// Map the page's rows while keeping the meta intact.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated { data: self.data.into_iter().map(f).collect(), meta: self.meta }
    }
}
