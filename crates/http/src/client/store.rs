//! Session token storage

use arc_swap::ArcSwapOption;
use medadmin_core::SessionToken;
use std::sync::Arc;

/// Holder of the current session token
///
/// Implementations never touch the network. `set` replaces the whole token
/// and `clear` removes it; readers see either the old or the new value.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<Arc<SessionToken>>;

    fn set(&self, token: SessionToken);

    fn clear(&self);

    /// Replace the token only if the store still holds `expected`
    ///
    /// Returns `false`, leaving the store untouched, after a login or logout
    /// changed it since `expected` was read.
    fn compare_and_set(&self, expected: &Arc<SessionToken>, token: SessionToken) -> bool;
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    current: ArcSwapOption<SessionToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing session
    pub fn with_token(token: SessionToken) -> Self {
        Self {
            current: ArcSwapOption::from_pointee(token),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Arc<SessionToken>> {
        self.current.load_full()
    }

    fn set(&self, token: SessionToken) {
        self.current.store(Some(Arc::new(token)));
    }

    fn clear(&self) {
        self.current.store(None);
    }

    fn compare_and_set(&self, expected: &Arc<SessionToken>, token: SessionToken) -> bool {
        let expected = Some(Arc::clone(expected));
        let previous = self.current.compare_and_swap(&expected, Some(Arc::new(token)));
        match (previous.as_ref(), expected.as_ref()) {
            (Some(previous), Some(expected)) => Arc::ptr_eq(previous, expected),
            _ => false,
        }
    }
}
