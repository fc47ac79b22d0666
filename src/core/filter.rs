//! Record filters and the ordered filter chain shared by loggers and handlers

use super::record::Record;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Predicate over a record. Returning `false` drops the record.
///
/// Filters may attach attributes to the record through
/// [`Record::set_extra`] before accepting it.
pub trait Filter: Send + Sync {
    fn filter(&self, record: &Record) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Record) -> bool + Send + Sync,
{
    fn filter(&self, record: &Record) -> bool {
        self(record)
    }
}

/// Accepts records from the named logger and its dotted descendants.
///
/// `NameFilter::new("a.b")` accepts `a.b` and `a.b.c` but not `a.bb`.
/// An empty name accepts everything.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    name: String,
}

impl NameFilter {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Filter for NameFilter {
    fn filter(&self, record: &Record) -> bool {
        if self.name.is_empty() || self.name == record.name {
            return true;
        }
        record.name.starts_with(&self.name)
            && record.name.as_bytes().get(self.name.len()) == Some(&b'.')
    }
}

/// Ordered filter list.
///
/// Mutation swaps in a new list, so a record being filtered always walks a
/// consistent snapshot even while filters are added concurrently.
#[derive(Default)]
pub struct Filterer {
    filters: RwLock<Arc<Vec<Arc<dyn Filter>>>>,
}

impl Filterer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; adding the same filter twice is a no-op.
    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        let mut guard = self.filters.write();
        if guard.iter().any(|f| same_filter(f, &filter)) {
            return;
        }
        let mut next = Vec::clone(&guard);
        next.push(filter);
        *guard = Arc::new(next);
    }

    pub fn remove_filter(&self, filter: &Arc<dyn Filter>) {
        let mut guard = self.filters.write();
        if !guard.iter().any(|f| same_filter(f, filter)) {
            return;
        }
        let next: Vec<_> = guard
            .iter()
            .filter(|f| !same_filter(f, filter))
            .cloned()
            .collect();
        *guard = Arc::new(next);
    }

    pub fn clear(&self) {
        *self.filters.write() = Arc::new(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }

    /// True when every filter accepts the record. Stops at the first rejection.
    pub fn filter(&self, record: &Record) -> bool {
        let snapshot = Arc::clone(&self.filters.read());
        snapshot.iter().all(|f| f.filter(record))
    }
}

impl fmt::Debug for Filterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filterer")
            .field("filters", &self.len())
            .finish()
    }
}

fn same_filter(a: &Arc<dyn Filter>, b: &Arc<dyn Filter>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
