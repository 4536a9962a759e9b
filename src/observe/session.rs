//! Observation session handle.
//!
//! Owning wrapper around one host observation. Dropping the handle releases
//! the session at the host, which removes the registered callback itself —
//! after that there is nothing left for a late event to invoke. This is the
//! structural half of the teardown contract: components cancel by dropping
//! the handle, never by checking a still-mounted flag inside the callback.

use std::rc::Rc;

use crate::host::{ObservationId, ViewportHost};

/// Owned handle to one live observation session.
///
/// Not cloneable: exactly one owner, and release happens exactly once.
pub struct ObservationSession {
    host: Rc<dyn ViewportHost>,
    id: ObservationId,
}

impl ObservationSession {
    /// Wrap a session id handed out by `host.observe`.
    pub fn new(host: Rc<dyn ViewportHost>, id: ObservationId) -> Self {
        Self { host, id }
    }

    /// The host-side id of this session.
    pub fn id(&self) -> ObservationId {
        self.id
    }
}

impl Drop for ObservationSession {
    fn drop(&mut self) {
        self.host.unobserve(self.id);
    }
}

impl std::fmt::Debug for ObservationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObservationSession").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::page::PageHost;
    use crate::types::{ObserverConfig, Rect};

    #[test]
    fn test_drop_releases_at_host() {
        let page = PageHost::new(1000.0, 800.0, 2000.0);
        let region = page.insert_region(Rect::new(0.0, 1500.0, 500.0, 200.0));

        let id = page
            .observe(region, ObserverConfig::default(), Box::new(|_| {}))
            .unwrap();
        let session = ObservationSession::new(page.as_host(), id);
        assert_eq!(page.observation_count(), 1);

        drop(session);
        assert_eq!(page.observation_count(), 0);
    }
}
