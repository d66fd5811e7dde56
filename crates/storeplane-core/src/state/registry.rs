//! Store registry - the last applied snapshot of the backend's store list.

use super::store::Store;

/// Ordered snapshot of stores, exactly as the backend listed them.
///
/// Only ever replaced wholesale. Each snapshot carries the sequence number
/// of the refresh that produced it so that a slow response cannot clobber
/// a newer one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreRegistry {
    stores: Vec<Store>,
    applied_seq: u64,
}

impl StoreRegistry {
    /// Current stores in backend order
    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// Get a store by ID
    pub fn get(&self, store_id: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.store_id == store_id)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Sequence number of the refresh behind the current snapshot (0 = none yet)
    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    /// Replace the snapshot with the result of refresh `seq`.
    ///
    /// Returns false and leaves the registry untouched when a newer refresh
    /// has already been applied.
    pub fn replace(&mut self, seq: u64, stores: Vec<Store>) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.stores = stores;
        self.applied_seq = seq;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(id: &str) -> Store {
        Store {
            store_id: id.to_string(),
            namespace: id.to_string(),
            status: "Provisioning".to_string(),
            ..Store::default()
        }
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let mut registry = StoreRegistry::default();
        assert!(registry.replace(1, vec![store("a"), store("b")]));
        assert!(registry.replace(2, vec![store("c")]));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").is_none());
        assert_eq!(registry.get("c").unwrap().namespace, "c");
        assert_eq!(registry.applied_seq(), 2);
    }

    #[test]
    fn older_snapshot_is_refused() {
        let mut registry = StoreRegistry::default();
        assert!(registry.replace(5, vec![store("new")]));
        assert!(!registry.replace(4, vec![store("old")]));
        assert!(!registry.replace(5, vec![]));

        assert_eq!(registry.stores(), &[store("new")]);
    }

    #[test]
    fn keeps_backend_order() {
        let mut registry = StoreRegistry::default();
        registry.replace(1, vec![store("z"), store("a"), store("m")]);
        let ids: Vec<_> = registry.stores().iter().map(|s| s.store_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }
}
