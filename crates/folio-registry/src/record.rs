//! Registry records.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use folio_core::PageId;
use parking_lot::{Mutex, MutexGuard, RwLock};

/// Registry entry wrapping one persistent page.
///
/// The page sits behind its own mutex so that two requests bearing the same
/// identity run one after the other while unrelated pages proceed in
/// parallel. The lock is scoped to the guard returned by [`lock`] and is
/// released on every exit path, unwinding included.
///
/// [`lock`]: PersistentPageRecord::lock
#[derive(Debug)]
pub struct PersistentPageRecord<P> {
    id: PageId,
    created_at: DateTime<Utc>,
    /// Milliseconds since the epoch; only ever moves forward.
    last_activity: AtomicI64,
    owner: Option<String>,
    replacement_uri: RwLock<Option<String>>,
    page: Mutex<P>,
}

impl<P> PersistentPageRecord<P> {
    pub(crate) fn new(id: PageId, page: P, owner: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            last_activity: AtomicI64::new(now.timestamp_millis()),
            owner,
            replacement_uri: RwLock::new(None),
            page: Mutex::new(page),
        }
    }

    /// Identity of the wrapped page.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// When the record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last time the record was looked up.
    pub fn last_activity(&self) -> DateTime<Utc> {
        let millis = self.last_activity.load(Ordering::Acquire);
        DateTime::from_timestamp_millis(millis).unwrap_or(self.created_at)
    }

    pub(crate) fn last_activity_millis(&self) -> i64 {
        self.last_activity.load(Ordering::Acquire)
    }

    /// Refresh the activity timestamp. Older timestamps never win.
    pub fn touch(&self, now: DateTime<Utc>) {
        self.last_activity
            .fetch_max(now.timestamp_millis(), Ordering::AcqRel);
    }

    /// Session that registered the page, if it was registered with one.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Whether the given session may reach this page.
    ///
    /// Records registered without an owner are reachable from anywhere.
    pub fn is_accessible_by(&self, session: &str) -> bool {
        self.owner.as_deref().map_or(true, |owner| owner == session)
    }

    /// URI that supersedes this page, if any.
    pub fn replacement_uri(&self) -> Option<String> {
        self.replacement_uri.read().clone()
    }

    /// Whether future requests must be redirected instead of executed.
    pub fn is_replaced(&self) -> bool {
        self.replacement_uri.read().is_some()
    }

    pub(crate) fn set_replacement_uri(&self, uri: String) {
        *self.replacement_uri.write() = Some(uri);
    }

    /// Acquire exclusive access to the page.
    pub fn lock(&self) -> MutexGuard<'_, P> {
        self.page.lock()
    }

    /// Try to acquire exclusive access without blocking.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, P>> {
        self.page.try_lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_touch_is_monotonic() {
        let now = Utc::now();
        let record = PersistentPageRecord::new(PageId(1), (), None, now);

        record.touch(now + Duration::seconds(10));
        record.touch(now + Duration::seconds(5));

        assert_eq!(
            record.last_activity().timestamp_millis(),
            (now + Duration::seconds(10)).timestamp_millis()
        );
        assert_eq!(record.created_at(), now);
    }

    #[test]
    fn test_owner_access() {
        let record = PersistentPageRecord::new(PageId(1), (), Some("sess_a".into()), Utc::now());
        assert!(record.is_accessible_by("sess_a"));
        assert!(!record.is_accessible_by("sess_b"));

        let shared = PersistentPageRecord::new(PageId(2), (), None, Utc::now());
        assert!(shared.is_accessible_by("anyone"));
    }

    #[test]
    fn test_replacement_uri() {
        let record = PersistentPageRecord::new(PageId(3), 0u32, None, Utc::now());
        assert!(!record.is_replaced());

        record.set_replacement_uri("/done".to_string());
        assert!(record.is_replaced());
        assert_eq!(record.replacement_uri().as_deref(), Some("/done"));
    }

    #[test]
    fn test_lock_serializes_access() {
        let record = PersistentPageRecord::new(PageId(4), 0u32, None, Utc::now());
        let guard = record.lock();
        assert!(record.try_lock().is_none());
        drop(guard);

        *record.lock() += 1;
        assert_eq!(*record.lock(), 1);
    }
}
