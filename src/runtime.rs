//! Runtime abstraction layer for async operations
//!
//! Background work (cache prefetching) is spawned through the `AsyncSpawner`
//! returned by `runtime()`. When no executor is running, spawning logs a
//! warning and skips the work instead of failing the caller.

use crate::prelude::{Duration, Future, Pin};

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(
        &self,
        future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Handle for work that was never started
pub struct SkippedHandle;

impl AsyncHandle for SkippedHandle {
    fn is_finished(&self) -> bool {
        true
    }

    fn cancel(&self) {}
}

/// Spawn a future on the available runtime
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::super::*;
        use ::tokio::runtime::Handle;
        use ::tokio::task::JoinHandle;

        /// Spawns onto the tokio runtime of the calling context
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Box<dyn AsyncHandle> {
                match Handle::try_current() {
                    Ok(handle) => Box::new(TokioHandle(handle.spawn(future))),
                    Err(err) => {
                        log::warn!("skipping background task: {}", err);
                        Box::new(SkippedHandle)
                    }
                }
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }

    /// Used when no executor feature is enabled
    pub struct NoRuntime;

    impl AsyncSpawner for NoRuntime {
        fn spawn_boxed(
            &self,
            _future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
        ) -> Box<dyn AsyncHandle> {
            log::warn!("skipping background task: no async runtime enabled");
            Box::new(SkippedHandle)
        }
    }
}

/// Unified async delay function that works across runtimes
pub async fn async_delay(duration: Duration) {
    #[cfg(feature = "tokio-runtime")]
    {
        if ::tokio::runtime::Handle::try_current().is_ok() {
            ::tokio::time::sleep(duration).await;
            return;
        }
    }

    // Sleep on a helper thread so the executor thread is never blocked
    let (tx, rx) = futures::channel::oneshot::channel();
    std::thread::spawn(move || {
        std::thread::sleep(duration);
        let _ = tx.send(());
    });
    let _ = rx.await;
}

/// The spawner background work goes through
pub fn runtime() -> &'static dyn AsyncSpawner {
    #[cfg(feature = "tokio-runtime")]
    {
        &spawners::tokio_impl::TokioSpawner
    }

    #[cfg(not(feature = "tokio-runtime"))]
    {
        &spawners::NoRuntime
    }
}
