//! Registry of currently open sessions.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::session::SessionId;

/// Set of open session IDs.
///
/// Holds identities only, never the sessions themselves; membership is
/// advisory and used for counting.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: Mutex<HashSet<SessionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session. Returns `false` if it was already present.
    pub fn register(&self, id: SessionId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id)
    }

    /// Removes a session. Returns `false` if it was not present.
    pub fn unregister(&self, id: &SessionId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Number of open sessions.
    pub fn count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_registry() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn register_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let id = SessionId::new();
        assert!(registry.register(id));
        assert!(!registry.register(id));
        assert_eq!(registry.count(), 1);
        assert!(registry.contains(&id));
    }

    #[test]
    fn unregister_absent_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.register(SessionId::new());
        assert!(!registry.unregister(&SessionId::new()));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn count_tracks_opens_minus_closes() {
        let registry = ConnectionRegistry::new();
        let ids: Vec<SessionId> = (0..10).map(|_| SessionId::new()).collect();
        for id in &ids {
            registry.register(*id);
        }
        for id in &ids[..4] {
            assert!(registry.unregister(id));
        }
        assert_eq!(registry.count(), 6);
        assert!(!registry.contains(&ids[0]));
        assert!(registry.contains(&ids[9]));
    }

    #[test]
    fn concurrent_registration() {
        let registry = Arc::new(ConnectionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let ids: Vec<SessionId> = (0..50).map(|_| SessionId::new()).collect();
                    for id in &ids {
                        registry.register(*id);
                    }
                    for id in &ids[..20] {
                        registry.unregister(id);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.count(), 8 * 30);
    }
}
