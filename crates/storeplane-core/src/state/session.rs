//! Dashboard session - the registry and in-flight flags in one container.

use std::sync::Arc;

use tokio::sync::watch;

use super::registry::StoreRegistry;
use super::store::Store;

/// Everything a view needs to render the dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    registry: StoreRegistry,
    refreshes_in_flight: usize,
    creating: bool,
    issued_seq: u64,
}

impl DashboardState {
    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn stores(&self) -> &[Store] {
        self.registry.stores()
    }

    /// True while at least one list request is in flight
    pub fn is_loading(&self) -> bool {
        self.refreshes_in_flight > 0
    }

    /// True while a create request is in flight
    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn refreshes_in_flight(&self) -> usize {
        self.refreshes_in_flight
    }

    /// Sequence number handed to the most recently started refresh
    pub fn issued_seq(&self) -> u64 {
        self.issued_seq
    }

    fn end_refresh(&mut self) {
        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
    }
}

/// Shared handle to the dashboard state.
///
/// Owned by the dashboard root and cloned into the reconciler and views.
/// Mutations happen in short closures and never span an await; views
/// call [`Session::subscribe`] to be woken on every change.
#[derive(Debug, Clone)]
pub struct Session {
    tx: Arc<watch::Sender<DashboardState>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DashboardState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.tx.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DashboardState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Start a refresh: allocate its sequence number and raise `loading`.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut seq = 0;
        self.tx.send_modify(|state| {
            state.issued_seq += 1;
            state.refreshes_in_flight += 1;
            seq = state.issued_seq;
        });
        RefreshTicket {
            session: self.clone(),
            seq,
            open: true,
        }
    }

    /// Raise `creating` unless a create is already in flight.
    pub fn try_begin_create(&self) -> Option<CreateGuard> {
        let acquired = self.tx.send_if_modified(|state| {
            if state.creating {
                false
            } else {
                state.creating = true;
                true
            }
        });
        acquired.then(|| CreateGuard {
            session: self.clone(),
        })
    }
}

/// An in-flight refresh. Dropping it without applying clears its share of
/// `loading` and leaves the registry alone.
#[derive(Debug)]
pub struct RefreshTicket {
    session: Session,
    seq: u64,
    open: bool,
}

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Finish the refresh with a fresh snapshot.
    ///
    /// Returns false if a newer refresh was applied first; the snapshot is
    /// then discarded.
    pub fn apply(mut self, stores: Vec<Store>) -> bool {
        self.open = false;
        let seq = self.seq;
        let mut applied = false;
        self.session.tx.send_modify(|state| {
            state.end_refresh();
            applied = state.registry.replace(seq, stores);
        });
        applied
    }

    /// Finish the refresh without touching the registry
    pub fn release(mut self) {
        self.open = false;
        self.session.tx.send_modify(DashboardState::end_refresh);
    }
}

impl Drop for RefreshTicket {
    fn drop(&mut self) {
        if self.open {
            self.session.tx.send_modify(DashboardState::end_refresh);
        }
    }
}

/// Holds `creating` high until dropped.
#[derive(Debug)]
pub struct CreateGuard {
    session: Session,
}

impl Drop for CreateGuard {
    fn drop(&mut self) {
        self.session.tx.send_modify(|state| state.creating = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(id: &str) -> Store {
        Store {
            store_id: id.to_string(),
            ..Store::default()
        }
    }

    #[test]
    fn loading_tracks_open_tickets() {
        let session = Session::new();
        assert!(!session.snapshot().is_loading());

        let first = session.begin_refresh();
        let second = session.begin_refresh();
        assert_eq!((first.seq(), second.seq()), (1, 2));
        assert!(session.snapshot().is_loading());

        first.release();
        assert!(session.snapshot().is_loading());

        drop(second);
        assert!(!session.snapshot().is_loading());
        assert!(session.snapshot().stores().is_empty());
    }

    #[test]
    fn late_ticket_is_discarded() {
        let session = Session::new();
        let older = session.begin_refresh();
        let newer = session.begin_refresh();

        assert!(newer.apply(vec![store("fresh")]));
        assert!(!older.apply(vec![store("stale")]));

        let state = session.snapshot();
        assert_eq!(state.stores(), &[store("fresh")]);
        assert!(!state.is_loading());
    }

    #[test]
    fn create_guard_is_exclusive() {
        let session = Session::new();
        let guard = session.try_begin_create().expect("first create");
        assert!(session.snapshot().is_creating());
        assert!(session.try_begin_create().is_none());

        drop(guard);
        assert!(!session.snapshot().is_creating());
        assert!(session.try_begin_create().is_some());
    }

    #[test]
    fn subscribers_see_changes() {
        let session = Session::new();
        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());

        session.begin_refresh().apply(vec![store("a")]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().registry().len(), 1);
    }
}
