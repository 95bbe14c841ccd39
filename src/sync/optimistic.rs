//! Optimistic mutation protocol: snapshot, local apply, remote call, then
//! rollback or settle.
//!
//! There is no cross-mutation conflict detection. Overlapping mutations apply
//! in call order, each capturing whatever value was cached at its own
//! pre-apply.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// The cached copy of remote data that optimistic updates write into.
pub trait QueryCache<T> {
    /// Drop any in-flight refetch so its result cannot overwrite what follows.
    fn cancel(&mut self);
    fn current(&self) -> Option<T>;
    fn set_current(&mut self, value: Option<T>);
    /// Mark the cached value stale and refetch it.
    fn invalidate(&mut self);
}

/// What `on_mutate` captured for a later rollback
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackContext<T> {
    pub previous: Option<T>,
}

/// User-visible transient failure notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub at: DateTime<Utc>,
    pub mutation: String,
    pub message: String,
}

impl Notice {
    pub fn failure(mutation: &str, error: &dyn fmt::Display) -> Self {
        Notice {
            at: Utc::now(),
            mutation: mutation.to_string(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.mutation, self.message)
    }
}

type UpdateFn<T, I> = Box<dyn Fn(&T, &I) -> Option<T> + Send>;

/// The three callbacks wrapped around a remote mutation.
///
/// `update` must be pure. Returning `None` means the input does not apply to
/// the cached value, which is then left alone.
pub struct OptimisticMutation<I, T> {
    name: String,
    update: UpdateFn<T, I>,
}

impl<I, T: Clone> OptimisticMutation<I, T> {
    pub fn new(name: impl Into<String>, update: impl Fn(&T, &I) -> Option<T> + Send + 'static) -> Self {
        OptimisticMutation {
            name: name.into(),
            update: Box::new(update),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pre-apply: cancel refetches, snapshot, write the optimistic value.
    pub fn on_mutate(&self, cache: &mut impl QueryCache<T>, input: &I) -> RollbackContext<T> {
        cache.cancel();
        let previous = cache.current();
        match previous.as_ref().map(|prev| (self.update)(prev, input)) {
            Some(Some(updated)) => cache.set_current(Some(updated)),
            Some(None) => debug!(mutation = %self.name, "optimistic update does not apply locally"),
            None => debug!(mutation = %self.name, "nothing cached, skipping optimistic update"),
        }
        RollbackContext { previous }
    }

    /// Restore the snapshot taken by `on_mutate` and produce the notice.
    pub fn on_error(
        &self,
        cache: &mut impl QueryCache<T>,
        context: RollbackContext<T>,
        error: &dyn fmt::Display,
    ) -> Notice {
        warn!(mutation = %self.name, error = %error, "mutation failed, rolling back");
        cache.set_current(context.previous);
        Notice::failure(&self.name, error)
    }

    /// Runs after success and failure alike.
    pub fn on_settled(&self, cache: &mut impl QueryCache<T>) {
        cache.invalidate();
    }
}

impl<I, T> fmt::Debug for OptimisticMutation<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimisticMutation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingCache {
        value: Option<Vec<u32>>,
        calls: Vec<&'static str>,
    }

    impl QueryCache<Vec<u32>> for RecordingCache {
        fn cancel(&mut self) {
            self.calls.push("cancel");
        }
        fn current(&self) -> Option<Vec<u32>> {
            self.value.clone()
        }
        fn set_current(&mut self, value: Option<Vec<u32>>) {
            self.calls.push("set");
            self.value = value;
        }
        fn invalidate(&mut self) {
            self.calls.push("invalidate");
        }
    }

    fn push_mutation() -> OptimisticMutation<u32, Vec<u32>> {
        OptimisticMutation::new("push", |current: &Vec<u32>, n: &u32| {
            let mut next = current.clone();
            next.push(*n);
            Some(next)
        })
    }

    #[test]
    fn pre_apply_cancels_before_writing() {
        let mut cache = RecordingCache {
            value: Some(vec![1]),
            ..Default::default()
        };
        let m = push_mutation();
        let ctx = m.on_mutate(&mut cache, &2);
        assert_eq!(cache.calls, vec!["cancel", "set"]);
        assert_eq!(cache.value, Some(vec![1, 2]));
        assert_eq!(ctx.previous, Some(vec![1]));
    }

    #[test]
    fn error_restores_exact_snapshot() {
        let mut cache = RecordingCache {
            value: Some(vec![1]),
            ..Default::default()
        };
        let m = push_mutation();
        let ctx = m.on_mutate(&mut cache, &2);
        let notice = m.on_error(&mut cache, ctx, &"server said no");
        m.on_settled(&mut cache);
        assert_eq!(cache.value, Some(vec![1]));
        assert_eq!(notice.mutation, "push");
        assert_eq!(notice.to_string(), "push failed: server said no");
        assert_eq!(cache.calls.last(), Some(&"invalidate"));
    }

    #[test]
    fn sequential_mutations_capture_their_own_previous() {
        let mut cache = RecordingCache {
            value: Some(vec![]),
            ..Default::default()
        };
        let m = push_mutation();
        let first = m.on_mutate(&mut cache, &1);
        let second = m.on_mutate(&mut cache, &2);
        assert_eq!(first.previous, Some(vec![]));
        assert_eq!(second.previous, Some(vec![1]));

        // first fails after second was applied: last write wins
        m.on_error(&mut cache, first, &"boom");
        assert_eq!(cache.value, Some(vec![]));
    }

    #[test]
    fn inapplicable_update_leaves_cache_alone() {
        let mut cache = RecordingCache {
            value: Some(vec![1]),
            ..Default::default()
        };
        let m: OptimisticMutation<u32, Vec<u32>> = OptimisticMutation::new("never", |_, _| None);
        let ctx = m.on_mutate(&mut cache, &9);
        assert_eq!(cache.calls, vec!["cancel"]);
        assert_eq!(ctx.previous, Some(vec![1]));
    }

    #[test]
    fn empty_cache_skips_pre_apply() {
        let mut cache = RecordingCache::default();
        let ctx = push_mutation().on_mutate(&mut cache, &1);
        assert_eq!(ctx.previous, None);
        assert_eq!(cache.value, None);
    }
}
