// Cancellation registry - one authoritative in-flight request per kind.
//
// `begin` invalidates the previous token for that kind and wakes any task
// waiting on `superseded`, which lets callers race a network future against
// supersession (best-effort transport abort). Correctness does not depend on
// that race: every handler re-checks `is_current` immediately before
// applying its result, so a stale response can never win a lost-update race
// against a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;

/// The two operation kinds with registry slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Metadata,
    Download,
}

impl RequestKind {
    fn index(self) -> usize {
        match self {
            Self::Metadata => 0,
            Self::Download => 1,
        }
    }
}

/// Proof of being (at issuance) the authoritative request for a kind.
#[derive(Debug, Clone, Copy)]
pub struct RequestToken {
    kind: RequestKind,
    serial: u64,
}

impl RequestToken {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

struct Slot {
    serial: AtomicU64,
    changed: Notify,
}

impl Slot {
    fn new() -> Self {
        Self {
            serial: AtomicU64::new(0),
            changed: Notify::new(),
        }
    }
}

pub struct RequestRegistry {
    slots: [Slot; 2],
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self {
            slots: [Slot::new(), Slot::new()],
        }
    }

    /// Invalidate the previous token for `kind` and issue a fresh one.
    pub fn begin(&self, kind: RequestKind) -> RequestToken {
        let slot = &self.slots[kind.index()];
        let serial = slot.serial.fetch_add(1, Ordering::SeqCst) + 1;
        slot.changed.notify_waiters();
        RequestToken { kind, serial }
    }

    /// True iff `token` is still the most recently issued one for its kind.
    pub fn is_current(&self, token: &RequestToken) -> bool {
        self.slots[token.kind.index()].serial.load(Ordering::SeqCst) == token.serial
    }

    /// Resolves once `token` has been superseded by a newer `begin`.
    pub async fn superseded(&self, token: &RequestToken) {
        let slot = &self.slots[token.kind.index()];
        loop {
            let changed = slot.changed.notified();
            tokio::pin!(changed);
            // Register before the check so a concurrent `begin` between the
            // check and the await cannot be missed.
            changed.as_mut().enable();
            if !self.is_current(token) {
                return;
            }
            changed.await;
        }
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn begin_invalidates_previous_token() {
        let registry = RequestRegistry::new();
        let first = registry.begin(RequestKind::Metadata);
        assert!(registry.is_current(&first));

        let second = registry.begin(RequestKind::Metadata);
        assert!(!registry.is_current(&first));
        assert!(registry.is_current(&second));
    }

    #[test]
    fn kinds_have_independent_slots() {
        let registry = RequestRegistry::new();
        let metadata = registry.begin(RequestKind::Metadata);
        let download = registry.begin(RequestKind::Download);

        registry.begin(RequestKind::Download);
        assert!(registry.is_current(&metadata));
        assert!(!registry.is_current(&download));
    }

    #[tokio::test]
    async fn superseded_resolves_on_new_token() {
        let registry = Arc::new(RequestRegistry::new());
        let token = registry.begin(RequestKind::Metadata);

        let waiter = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.superseded(&token).await })
        };
        tokio::task::yield_now().await;

        registry.begin(RequestKind::Metadata);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("superseded never resolved")
            .expect("waiter panicked");
    }

    #[tokio::test]
    async fn superseded_resolves_immediately_for_stale_token() {
        let registry = RequestRegistry::new();
        let token = registry.begin(RequestKind::Download);
        registry.begin(RequestKind::Download);

        tokio::time::timeout(Duration::from_secs(1), registry.superseded(&token))
            .await
            .expect("stale token should resolve at once");
    }
}
