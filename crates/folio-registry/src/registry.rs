//! Persistent page registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use folio_core::PageId;
use parking_lot::RwLock;
use tracing::debug;

use crate::{Clock, PersistentPageRecord, RegistryError, SystemClock};

/// A page that can be stored in the registry.
pub trait Persistable: Send + 'static {
    /// Receive the identity allocated by the registry.
    fn assign_identity(&mut self, id: PageId);
}

struct Table<P> {
    records: HashMap<PageId, Arc<PersistentPageRecord<P>>>,
    next_id: u64,
}

/// Store of persistent pages, shared by every request.
///
/// The table is guarded by a read-write lock and only held for the map
/// operation itself. Page execution never runs under the table lock; it
/// runs under the per-record lock (see [`PersistentPageRecord::lock`]).
///
/// # Example
///
/// ```rust,ignore
/// let registry = Arc::new(PersistentPageRegistry::new());
/// let id = registry.register(page);
///
/// if let Some(record) = registry.lookup(id) {
///     let mut page = record.lock();
///     // run one lifecycle execution
/// }
/// ```
pub struct PersistentPageRegistry<P> {
    table: RwLock<Table<P>>,
    clock: Arc<dyn Clock>,
}

impl<P: Persistable> PersistentPageRegistry<P> {
    /// Create an empty registry using the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty registry using the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: RwLock::new(Table {
                records: HashMap::new(),
                next_id: 1,
            }),
            clock,
        }
    }

    /// Store a page under a freshly allocated identity.
    pub fn register(&self, page: P) -> PageId {
        self.register_owned(page, None)
    }

    /// Store a page reachable only from the given session.
    pub fn register_owned(&self, page: P, owner: Option<String>) -> PageId {
        self.register_record(page, owner).id()
    }

    /// Store a page and return its record.
    ///
    /// Holding the record keeps the page alive even if it is evicted or
    /// invalidated before the caller is done with it.
    pub fn register_record(
        &self,
        mut page: P,
        owner: Option<String>,
    ) -> Arc<PersistentPageRecord<P>> {
        let now = self.clock.now();
        let mut table = self.table.write();

        let id = PageId(table.next_id);
        table.next_id += 1;

        page.assign_identity(id);
        let record = Arc::new(PersistentPageRecord::new(id, page, owner, now));
        table.records.insert(id, Arc::clone(&record));

        debug!(page_id = %id, live = table.records.len(), "Registered persistent page");
        record
    }

    /// Find a record and refresh its activity timestamp.
    pub fn lookup(&self, id: PageId) -> Option<Arc<PersistentPageRecord<P>>> {
        let record = self.table.read().records.get(&id).cloned()?;
        record.touch(self.clock.now());
        Some(record)
    }

    /// Find a record on behalf of a session.
    ///
    /// Activity is refreshed only when the session may access the record, so
    /// requests from other sessions never keep a page alive.
    pub fn lookup_for(
        &self,
        id: PageId,
        session: &str,
    ) -> Result<Arc<PersistentPageRecord<P>>, RegistryError> {
        let record = self
            .table
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))?;
        if !record.is_accessible_by(session) {
            return Err(RegistryError::NotOwner(id));
        }
        record.touch(self.clock.now());
        Ok(record)
    }

    /// Remove a record. Returns whether one was present.
    pub fn invalidate(&self, id: PageId) -> bool {
        let removed = self.table.write().records.remove(&id).is_some();
        if removed {
            debug!(page_id = %id, "Invalidated persistent page");
        }
        removed
    }

    /// Remove every record idle for at least `max_idle`.
    ///
    /// Returns the number of records removed. A zero duration removes every
    /// record not touched after this call started.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let max_idle = chrono::Duration::from_std(max_idle).unwrap_or(chrono::Duration::MAX);
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(max_idle)
            .map_or(i64::MIN, |t| t.timestamp_millis());

        let mut table = self.table.write();
        let before = table.records.len();
        table
            .records
            .retain(|_, record| record.last_activity_millis() > cutoff);
        let evicted = before - table.records.len();

        if evicted > 0 {
            debug!(evicted, live = table.records.len(), "Evicted idle pages");
        }
        evicted
    }

    /// Mark a page as superseded by another URI.
    pub fn set_replacement(&self, id: PageId, uri: impl Into<String>) -> Result<(), RegistryError> {
        let record = self
            .table
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))?;
        record.set_replacement_uri(uri.into());
        Ok(())
    }

    /// Whether a record exists, without touching it.
    pub fn contains(&self, id: PageId) -> bool {
        self.table.read().records.contains_key(&id)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.table.read().records.len()
    }

    /// Whether the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.table.read().records.is_empty()
    }
}

impl<P: Persistable> Default for PersistentPageRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for PersistentPageRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read();
        f.debug_struct("PersistentPageRegistry")
            .field("live", &table.records.len())
            .field("next_id", &table.next_id)
            .finish()
    }
}
