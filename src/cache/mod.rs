use crate::list::{ListQuery, ListResult};
use std::collections::{HashMap, VecDeque};

/// Pages kept per view; the oldest stored page goes first.
pub(crate) const MAX_CACHED_PAGES: usize = 16;

/// Handle for one in-flight list request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Ticket {
    id: u64,
    epoch: u64,
    key: ListQuery,
}

impl Ticket {
    pub fn key(&self) -> &ListQuery {
        &self.key
    }
}

/// Per-view page cache with request supersession.
///
/// Only the most recently begun request is "current". Older responses
/// still fill the cache for their own key unless an invalidation happened
/// after they started.
#[derive(Clone, Debug)]
pub(crate) struct ListCache<R> {
    entries: HashMap<ListQuery, ListResult<R>>,
    order: VecDeque<ListQuery>,
    latest: u64,
    invalidations: u64,
}

impl<R> Default for ListCache<R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            latest: 0,
            invalidations: 0,
        }
    }
}

impl<R: Clone> ListCache<R> {
    pub fn begin(&mut self, key: &ListQuery) -> Ticket {
        self.latest = self.latest.saturating_add(1);
        Ticket {
            id: self.latest,
            epoch: self.invalidations,
            key: key.clone(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.id == self.latest
    }

    /// Store a finished response. Returns `true` if it should be rendered.
    pub fn complete(&mut self, ticket: &Ticket, result: ListResult<R>) -> bool {
        if ticket.epoch == self.invalidations {
            self.store(ticket.key.clone(), result);
        }
        self.is_current(ticket)
    }

    fn store(&mut self, key: ListQuery, result: ListResult<R>) {
        self.order.retain(|k| k != &key);
        self.order.push_back(key.clone());
        self.entries.insert(key, result);
        while self.entries.len() > MAX_CACHED_PAGES {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn lookup(&self, key: &ListQuery) -> Option<ListResult<R>> {
        self.entries.get(key).cloned()
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.invalidations = self.invalidations.saturating_add(1);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn invalidation_count(&self) -> u64 {
        self.invalidations
    }
}
