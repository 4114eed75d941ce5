//! Cancelable tasks
//!
//! Cancellation here is cooperative: a cancelled task still runs its
//! request to completion, but the result is dropped instead of delivered.
//!
//! - `Cancelable<T>` owns a spawned task and the token that governs it;
//!   `join` yields `None` once the token is cancelled
//! - `spawn_settled` settles the result under the owner's state lock and
//!   rechecks the token there, so a teardown taking the same lock is
//!   ordered strictly before or after the settle. Side effects that may
//!   re-enter the owner run afterwards, outside the lock
//! - `TaskScope` hands out `TaskToken`s and cancels every live one exactly
//!   once on teardown; a token leaves the scope when its task finishes

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancellation token for one task, registered with its `TaskScope`
/// until dropped
#[derive(Debug)]
pub struct TaskToken {
    token: CancellationToken,
    registration: Option<(u64, Weak<ScopeInner>)>,
}

impl TaskToken {
    /// Underlying cancellation token
    #[inline]
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl From<CancellationToken> for TaskToken {
    fn from(token: CancellationToken) -> Self {
        Self {
            token,
            registration: None,
        }
    }
}

impl Drop for TaskToken {
    fn drop(&mut self) {
        if let Some((id, scope)) = &self.registration {
            if let Some(scope) = scope.upgrade() {
                scope.outstanding.lock().retain(|(entry, _)| entry != id);
            }
        }
    }
}

/// Handle to a spawned operation whose result may be discarded
#[derive(Debug)]
pub struct Cancelable<T> {
    token: CancellationToken,
    handle: JoinHandle<Option<T>>,
}

impl<T: Send + 'static> Cancelable<T> {
    /// Spawn `fut`; its output is kept only if the token is still live when
    /// it completes.
    pub fn spawn<F>(token: impl Into<TaskToken>, fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let task = token.into();
        let token = task.token().clone();
        let handle = tokio::spawn(async move {
            let output = fut.await;
            if task.is_cancelled() {
                tracing::debug!("discarding result of cancelled task");
                return None;
            }
            Some(output)
        });
        Self { token, handle }
    }

    /// Spawn `fut`, then hand its output to `settle` while holding `state`.
    ///
    /// `settle` never runs if the token was cancelled before the lock was
    /// acquired.
    pub fn spawn_guarded<S, F, O, G>(
        token: impl Into<TaskToken>,
        state: Arc<Mutex<S>>,
        fut: F,
        settle: G,
    ) -> Self
    where
        S: Send + 'static,
        F: Future<Output = O> + Send + 'static,
        O: Send + 'static,
        G: FnOnce(&mut S, O) -> T + Send + 'static,
    {
        Self::spawn_settled(token, state, fut, settle, |_: &mut S| {}, |_: &T| {})
    }

    /// Like [`Cancelable::spawn_guarded`], with two extra steps:
    ///
    /// - `discard` runs under the lock instead of `settle` when the token
    ///   was cancelled, so the owner can roll back in-flight markers
    /// - `deliver` runs after the lock is released, only if the token is
    ///   still live, and may call back into the owner
    pub fn spawn_settled<S, F, O, G, D, H>(
        token: impl Into<TaskToken>,
        state: Arc<Mutex<S>>,
        fut: F,
        settle: G,
        discard: D,
        deliver: H,
    ) -> Self
    where
        S: Send + 'static,
        F: Future<Output = O> + Send + 'static,
        O: Send + 'static,
        G: FnOnce(&mut S, O) -> T + Send + 'static,
        D: FnOnce(&mut S) + Send + 'static,
        H: FnOnce(&T) + Send + 'static,
    {
        let task = token.into();
        let token = task.token().clone();
        let handle = tokio::spawn(async move {
            let output = fut.await;
            let settled = {
                let mut state = state.lock();
                if task.is_cancelled() {
                    discard(&mut state);
                    None
                } else {
                    Some(settle(&mut state, output))
                }
            };
            let Some(settled) = settled else {
                tracing::debug!("discarding result of cancelled task");
                return None;
            };
            if !task.is_cancelled() {
                deliver(&settled);
            }
            Some(settled)
        });
        Self { token, handle }
    }

    /// Request cancellation; the eventual result will be discarded
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the underlying task has finished
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task.
    ///
    /// Returns `None` if it was cancelled before settling or if the runtime
    /// aborted it. Panics inside the task are propagated.
    pub async fn join(self) -> Option<T> {
        match self.handle.await {
            Ok(output) => output,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct ScopeInner {
    root: CancellationToken,
    outstanding: Mutex<Vec<(u64, CancellationToken)>>,
    next_id: AtomicU64,
    torn_down: AtomicBool,
}

/// Owner of the tokens for one session's outstanding tasks
#[derive(Debug, Default)]
pub struct TaskScope {
    inner: Arc<ScopeInner>,
}

impl TaskScope {
    /// Create an empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a new task; already cancelled if the scope is torn down
    #[must_use]
    pub fn token(&self) -> TaskToken {
        let token = self.inner.root.child_token();
        if self.is_torn_down() {
            return TaskToken::from(token);
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.outstanding.lock().push((id, token.clone()));
        TaskToken {
            token,
            registration: Some((id, Arc::downgrade(&self.inner))),
        }
    }

    /// Cancel every outstanding token.
    ///
    /// Idempotent; returns how many tokens this call cancelled.
    pub fn teardown(&self) -> usize {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let tokens = std::mem::take(&mut *self.inner.outstanding.lock());
        let mut cancelled = 0;
        for (_, token) in tokens {
            if !token.is_cancelled() {
                token.cancel();
                cancelled += 1;
            }
        }
        self.inner.root.cancel();
        tracing::debug!(cancelled, "task scope torn down");
        cancelled
    }

    /// Whether `teardown` has run
    #[inline]
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    /// Tokens whose task is still running and not yet cancelled
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner
            .outstanding
            .lock()
            .iter()
            .filter(|(_, t)| !t.is_cancelled())
            .count()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let scope = TaskScope::new();
        let task = Cancelable::spawn(scope.token(), async { 42 });
        assert_eq!(task.join().await, Some(42));
    }

    #[tokio::test]
    async fn cancelled_result_is_discarded() {
        let scope = TaskScope::new();
        let (tx, rx) = oneshot::channel::<u32>();
        let task = Cancelable::spawn(scope.token(), async move { rx.await.unwrap_or(0) });

        task.cancel();
        tx.send(7).unwrap();
        assert!(task.is_cancelled());
        assert_eq!(task.join().await, None);
    }

    #[tokio::test]
    async fn guarded_settle_skipped_after_teardown() {
        let scope = TaskScope::new();
        let state = Arc::new(Mutex::new(Vec::<u32>::new()));
        let (tx, rx) = oneshot::channel::<u32>();

        let task = Cancelable::spawn_guarded(
            scope.token(),
            Arc::clone(&state),
            async move { rx.await.unwrap_or(0) },
            |log: &mut Vec<u32>, value| {
                log.push(value);
                value
            },
        );

        {
            let _held = state.lock();
            assert_eq!(scope.teardown(), 1);
        }
        tx.send(5).unwrap();

        assert_eq!(task.join().await, None);
        assert!(state.lock().is_empty());
    }

    #[tokio::test]
    async fn guarded_settle_runs_under_lock() {
        let scope = TaskScope::new();
        let state = Arc::new(Mutex::new(0u32));
        let task = Cancelable::spawn_guarded(
            scope.token(),
            Arc::clone(&state),
            async { 3 },
            |total: &mut u32, value: u32| {
                *total += value;
                *total
            },
        );
        assert_eq!(task.join().await, Some(3));
        assert_eq!(*state.lock(), 3);
    }

    #[tokio::test]
    async fn discard_runs_instead_of_settle_when_cancelled() {
        let scope = TaskScope::new();
        let state = Arc::new(Mutex::new(String::from("pending")));
        let delivered = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel::<u32>();

        let task = Cancelable::spawn_settled(
            scope.token(),
            Arc::clone(&state),
            async move { rx.await.unwrap_or(0) },
            |s: &mut String, _| *s = "settled".into(),
            |s: &mut String| *s = "rolled back".into(),
            {
                let delivered = Arc::clone(&delivered);
                move |_: &()| delivered.store(true, Ordering::SeqCst)
            },
        );
        task.cancel();
        tx.send(1).unwrap();

        assert_eq!(task.join().await, None);
        assert_eq!(*state.lock(), "rolled back");
        assert!(!delivered.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn deliver_runs_outside_the_lock() {
        let scope = TaskScope::new();
        let state = Arc::new(Mutex::new(0u32));

        let task = Cancelable::spawn_settled(
            scope.token(),
            Arc::clone(&state),
            async { 4 },
            |total: &mut u32, value: u32| {
                *total = value;
                value
            },
            |_: &mut u32| {},
            {
                let state = Arc::clone(&state);
                move |value: &u32| *state.lock() += value
            },
        );

        assert_eq!(task.join().await, Some(4));
        assert_eq!(*state.lock(), 8);
    }

    #[tokio::test]
    async fn finished_tasks_leave_the_scope() {
        let scope = TaskScope::new();
        for value in 0..3u32 {
            let task = Cancelable::spawn(scope.token(), async move { value });
            assert_eq!(task.join().await, Some(value));
        }
        assert_eq!(scope.outstanding(), 0);
        assert_eq!(scope.teardown(), 0);
    }

    #[test]
    fn teardown_cancels_each_token_once() {
        let scope = TaskScope::new();
        let a = scope.token();
        let b = scope.token();
        b.cancel();
        assert_eq!(scope.outstanding(), 1);

        assert_eq!(scope.teardown(), 1);
        assert!(a.is_cancelled());
        assert_eq!(scope.teardown(), 0);
        assert!(scope.is_torn_down());
    }

    #[test]
    fn dropped_token_is_forgotten() {
        let scope = TaskScope::new();
        let kept = scope.token();
        drop(scope.token());
        assert_eq!(scope.outstanding(), 1);
        assert_eq!(scope.teardown(), 1);
        assert!(kept.is_cancelled());
    }

    #[test]
    fn tokens_after_teardown_are_born_cancelled() {
        let scope = TaskScope::new();
        scope.teardown();
        assert!(scope.token().is_cancelled());
        assert_eq!(scope.outstanding(), 0);
    }

    #[test]
    fn drop_cancels_outstanding() {
        let token = {
            let scope = TaskScope::new();
            scope.token()
        };
        assert!(token.is_cancelled());
    }
}
