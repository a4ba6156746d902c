//! # Activation scheduling.
//!
//! [`Dispatch`] is the single binary policy knob for when an activation's work
//! actually starts: `Eager` spawns it immediately, `Idle` yields to the
//! runtime once first — the embedded stand-in for host idle/next-paint
//! scheduling. Stateless; not a task scheduler.
//!
//! This is deliberately distinct from the per-definition `defer` option, which
//! gates activation behind *visibility* and has nothing to do with timing.

use std::future::Future;

use tokio::task::JoinHandle;

/// When an activation's work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Start immediately.
    Eager,
    /// Yield to the runtime once before starting.
    Idle,
}

/// Runs `fut` under the given dispatch policy.
pub(crate) fn run<F>(dispatch: Dispatch, fut: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    match dispatch {
        Dispatch::Eager => tokio::spawn(fut),
        Dispatch::Idle => tokio::spawn(async move {
            tokio::task::yield_now().await;
            fut.await;
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_both_policies_run_the_work() {
        for dispatch in [Dispatch::Eager, Dispatch::Idle] {
            let ran = Arc::new(AtomicBool::new(false));
            let flag = ran.clone();
            run(dispatch, async move {
                flag.store(true, Ordering::SeqCst);
            })
            .await
            .expect("task completes");
            assert!(ran.load(Ordering::SeqCst), "{dispatch:?} never ran");
        }
    }
}
