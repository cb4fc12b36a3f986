//! Priority-ordered interceptor dispatch
//!
//! An [`InterceptorDispatcher`] holds handlers that mutate a `(context,
//! subject)` pair. Handlers are grouped by integer priority and run in
//! ascending priority order; handlers sharing a priority run in the order they
//! were added.
//!
//! Handlers added without an explicit priority receive the next value of a
//! monotonically increasing counter, so they always run after every handler
//! that was previously given a default priority. Creating a new bucket with an
//! explicit priority advances the counter past it.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Boxed interceptor handler
///
/// Receives the per-step context first and the subject second.
pub type Interceptor<S, C> = Box<dyn Fn(&mut C, &mut S) + Send + Sync>;

/// Priority-ordered registry of interceptors for subject `S` and context `C`
pub struct InterceptorDispatcher<S, C> {
    buckets: BTreeMap<i32, SmallVec<[Interceptor<S, C>; 1]>>,
    next_priority: i32,
}

impl<S, C> InterceptorDispatcher<S, C> {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            next_priority: 0,
        }
    }

    /// Register a handler at the next default priority
    ///
    /// Returns the priority the handler was stored under.
    pub fn add_interceptor<F>(&mut self, handler: F) -> i32
    where
        F: Fn(&mut C, &mut S) + Send + Sync + 'static,
    {
        let priority = self.next_priority;
        self.next_priority = self.next_priority.saturating_add(1);
        self.buckets
            .entry(priority)
            .or_default()
            .push(Box::new(handler));
        priority
    }

    /// Register a handler at an explicit priority
    ///
    /// The handler is appended after any handlers already in that bucket.
    /// Returns `true` when the bucket already existed.
    pub fn add_interceptor_with_priority<F>(&mut self, priority: i32, handler: F) -> bool
    where
        F: Fn(&mut C, &mut S) + Send + Sync + 'static,
    {
        if let Some(bucket) = self.buckets.get_mut(&priority) {
            bucket.push(Box::new(handler));
            return true;
        }

        let mut bucket = SmallVec::new();
        bucket.push(Box::new(handler) as Interceptor<S, C>);
        self.buckets.insert(priority, bucket);
        if priority >= self.next_priority {
            self.next_priority = priority.saturating_add(1);
        }
        false
    }

    /// Run every handler against `subject` and `context`
    ///
    /// An empty dispatcher leaves both untouched.
    pub fn compute(&self, subject: &mut S, context: &mut C) {
        for handler in self.buckets.values().flatten() {
            handler(&mut *context, &mut *subject);
        }
    }

    /// Priority the next default-priority handler will receive
    pub fn next_priority(&self) -> i32 {
        self.next_priority
    }

    /// Registered priorities in execution order
    pub fn priorities(&self) -> impl Iterator<Item = i32> + '_ {
        self.buckets.keys().copied()
    }

    /// Total number of registered handlers
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Remove all handlers and reset the default priority counter
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.next_priority = 0;
    }
}

impl<S, C> Default for InterceptorDispatcher<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> fmt::Debug for InterceptorDispatcher<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorDispatcher")
            .field(
                "buckets",
                &self
                    .buckets
                    .iter()
                    .map(|(p, b)| (*p, b.len()))
                    .collect::<Vec<_>>(),
            )
            .field("next_priority", &self.next_priority)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<&'static str>;

    fn push(tag: &'static str) -> impl Fn(&mut (), &mut Log) + Send + Sync + 'static {
        move |_, log: &mut Log| log.push(tag)
    }

    #[test]
    fn test_empty_dispatcher_is_identity() {
        let dispatcher: InterceptorDispatcher<Log, ()> = InterceptorDispatcher::new();
        let mut log = vec!["start"];
        dispatcher.compute(&mut log, &mut ());
        assert_eq!(log, vec!["start"]);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_explicit_priorities_run_ascending() {
        let mut dispatcher = InterceptorDispatcher::new();
        assert!(!dispatcher.add_interceptor_with_priority(5, push("p5")));
        assert!(!dispatcher.add_interceptor_with_priority(1, push("p1a")));
        assert!(dispatcher.add_interceptor_with_priority(1, push("p1b")));

        let mut log = Log::new();
        dispatcher.compute(&mut log, &mut ());
        assert_eq!(log, vec!["p1a", "p1b", "p5"]);
        assert_eq!(dispatcher.priorities().collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn test_default_priorities_keep_insertion_order() {
        let mut dispatcher = InterceptorDispatcher::new();
        let first = dispatcher.add_interceptor(push("a"));
        let second = dispatcher.add_interceptor(push("b"));
        let third = dispatcher.add_interceptor(push("c"));
        assert!(first < second && second < third);

        // Lands in the first handler's bucket, before the second handler
        assert!(dispatcher.add_interceptor_with_priority(first, push("x")));

        let mut log = Log::new();
        dispatcher.compute(&mut log, &mut ());
        assert_eq!(log, vec!["a", "x", "b", "c"]);
    }

    #[test]
    fn test_explicit_bucket_advances_default_counter() {
        let mut dispatcher = InterceptorDispatcher::new();
        dispatcher.add_interceptor_with_priority(10, push("explicit"));
        let priority = dispatcher.add_interceptor(push("default"));
        assert_eq!(priority, 11);

        let mut log = Log::new();
        dispatcher.compute(&mut log, &mut ());
        assert_eq!(log, vec!["explicit", "default"]);
    }

    #[test]
    fn test_handlers_mutate_context() {
        let mut dispatcher: InterceptorDispatcher<u32, u32> = InterceptorDispatcher::new();
        dispatcher.add_interceptor(|ctx, subject| {
            *subject += 1;
            *ctx = *subject * 10;
        });
        dispatcher.add_interceptor(|ctx, subject| *subject += *ctx);

        let mut subject = 1;
        let mut ctx = 0;
        dispatcher.compute(&mut subject, &mut ctx);
        assert_eq!(subject, 22);
        assert_eq!(ctx, 20);
        assert_eq!(dispatcher.len(), 2);
    }
}
