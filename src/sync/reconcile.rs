//! Visual/authoritative reconciliation.
//!
//! A [`Reconciler`] holds the value the UI renders. While free it follows the
//! authoritative source; while suspended it keeps its own value and only
//! remembers the latest authoritative one.
//!
//! `resume(token, false)` keeps the current visual value and waits for the
//! next `observe`. [`Reconciler::has_deferred`] tells the caller whether an
//! authoritative value arrived during the freeze and was never applied; if so
//! the caller must trigger a refetch.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

static NEXT_RECONCILER_ID: AtomicU64 = AtomicU64::new(1);

/// Error type for suspension handling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("reconciler is already suspended")]
    AlreadySuspended,
    #[error("suspend token does not belong to the current suspension")]
    ForeignToken,
}

/// Capability returned by [`Reconciler::suspend`] and required by
/// [`Reconciler::resume`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a suspended reconciler stays frozen until resumed with this token"]
pub struct SuspendToken {
    owner: u64,
    cycle: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freeze {
    Free,
    Suspended { cycle: u64 },
}

#[derive(Debug)]
pub struct Reconciler<T> {
    id: u64,
    visual: Option<T>,
    latest_remote: Option<T>,
    freeze: Freeze,
    cycles: u64,
    deferred: bool,
}

impl<T: Clone> Default for Reconciler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Reconciler<T> {
    pub fn new() -> Self {
        Reconciler {
            id: NEXT_RECONCILER_ID.fetch_add(1, Ordering::Relaxed),
            visual: None,
            latest_remote: None,
            freeze: Freeze::Free,
            cycles: 0,
            deferred: false,
        }
    }

    /// Latest visual value (`None` until the first authoritative value or
    /// local write).
    pub fn current(&self) -> Option<&T> {
        self.visual.as_ref()
    }

    /// Latest authoritative value seen, whether or not it was applied.
    pub fn latest_remote(&self) -> Option<&T> {
        self.latest_remote.as_ref()
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.freeze, Freeze::Suspended { .. })
    }

    /// An authoritative value was observed while suspended and has not been
    /// applied since.
    pub fn has_deferred(&self) -> bool {
        self.deferred
    }

    /// Feed a new authoritative value. Applied only while free; always
    /// remembered.
    pub fn observe(&mut self, remote: T) {
        if self.is_suspended() {
            trace!("reconciler suspended, remote value deferred");
            self.deferred = true;
        } else {
            self.visual = Some(remote.clone());
            self.deferred = false;
        }
        self.latest_remote = Some(remote);
    }

    /// Unconditional local write.
    pub fn set_visual(&mut self, value: T) {
        self.visual = Some(value);
    }

    /// Freeze the visual value. Fails if another caller holds the freeze.
    pub fn suspend(&mut self) -> Result<SuspendToken, ReconcileError> {
        if self.is_suspended() {
            return Err(ReconcileError::AlreadySuspended);
        }
        self.cycles += 1;
        self.freeze = Freeze::Suspended { cycle: self.cycles };
        self.deferred = false;
        debug!(cycle = self.cycles, "reconciler suspended");
        Ok(SuspendToken {
            owner: self.id,
            cycle: self.cycles,
        })
    }

    /// Lift the freeze. With `discard_local` the last observed authoritative
    /// value (if any) replaces the visual one immediately.
    pub fn resume(&mut self, token: SuspendToken, discard_local: bool) -> Result<(), ReconcileError> {
        match self.freeze {
            Freeze::Suspended { cycle } if token.owner == self.id && token.cycle == cycle => {}
            _ => return Err(ReconcileError::ForeignToken),
        }
        self.freeze = Freeze::Free;
        if discard_local && let Some(remote) = &self.latest_remote {
            self.visual = Some(remote.clone());
            self.deferred = false;
        }
        debug!(cycle = token.cycle, discard_local, "reconciler resumed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_replaces_visual_while_free() {
        let mut r = Reconciler::new();
        assert_eq!(r.current(), None);
        r.observe(1);
        assert_eq!(r.current(), Some(&1));
        r.observe(2);
        assert_eq!(r.current(), Some(&2));
    }

    #[test]
    fn suspended_observe_is_opaque() {
        let mut r = Reconciler::new();
        r.observe(1);
        let token = r.suspend().unwrap();
        r.observe(2);
        r.observe(3);
        assert_eq!(r.current(), Some(&1));
        assert_eq!(r.latest_remote(), Some(&3));

        r.resume(token, false).unwrap();
        assert_eq!(r.current(), Some(&1));
        r.observe(4);
        assert_eq!(r.current(), Some(&4));
    }

    #[test]
    fn deferred_flag_tracks_unapplied_observations() {
        let mut r = Reconciler::new();
        r.observe(1);
        let token = r.suspend().unwrap();
        assert!(!r.has_deferred());
        r.observe(2);
        assert!(r.has_deferred());

        r.resume(token, false).unwrap();
        assert!(r.has_deferred());
        r.observe(3);
        assert!(!r.has_deferred());

        let token = r.suspend().unwrap();
        r.observe(4);
        r.resume(token, true).unwrap();
        assert!(!r.has_deferred());
        assert_eq!(r.current(), Some(&4));
    }

    #[test]
    fn resume_discarding_local_adopts_last_remote() {
        let mut r = Reconciler::new();
        r.observe(1);
        let token = r.suspend().unwrap();
        r.set_visual(10);
        r.observe(2);
        assert_eq!(r.current(), Some(&10));
        r.resume(token, true).unwrap();
        assert_eq!(r.current(), Some(&2));
    }

    #[test]
    fn resume_discarding_local_without_remote_keeps_visual() {
        let mut r = Reconciler::new();
        let token = r.suspend().unwrap();
        r.set_visual(7);
        r.resume(token, true).unwrap();
        assert_eq!(r.current(), Some(&7));
    }

    #[test]
    fn set_visual_works_in_both_states() {
        let mut r = Reconciler::new();
        r.set_visual(5);
        assert_eq!(r.current(), Some(&5));
        let token = r.suspend().unwrap();
        r.set_visual(6);
        assert_eq!(r.current(), Some(&6));
        r.resume(token, false).unwrap();
        assert_eq!(r.current(), Some(&6));
    }

    #[test]
    fn overlapping_suspend_is_rejected() {
        let mut r: Reconciler<i32> = Reconciler::new();
        let token = r.suspend().unwrap();
        assert_eq!(r.suspend().unwrap_err(), ReconcileError::AlreadySuspended);
        r.resume(token, false).unwrap();
        assert!(!r.is_suspended());
    }

    #[test]
    fn token_from_other_reconciler_is_rejected() {
        let mut a: Reconciler<i32> = Reconciler::new();
        let mut b: Reconciler<i32> = Reconciler::new();
        let ta = a.suspend().unwrap();
        let tb = b.suspend().unwrap();
        assert_eq!(a.resume(tb, false).unwrap_err(), ReconcileError::ForeignToken);
        assert!(a.is_suspended());
        a.resume(ta, false).unwrap();
    }
}
