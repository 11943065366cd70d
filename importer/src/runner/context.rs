use crate::runner::progress::{Progress, TracingProgress};
use std::{
    fmt::Debug,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Notify;

pub trait RunContext: Debug + Send {
    /// Get the name of the import run
    fn name(&self) -> &str;

    /// Check if the run is canceled.
    ///
    /// This is a cooperative way to check if the run needs to be terminated.
    fn is_canceled(&self) -> impl Future<Output = bool>;

    /// Resolves once the run got canceled, never resolves by default.
    ///
    /// Used to abort requests which are still in flight.
    fn canceled(&self) -> impl Future<Output = ()> {
        std::future::pending()
    }

    fn check_canceled<E, F>(&self, f: F) -> impl Future<Output = Result<(), E>>
    where
        F: FnOnce() -> E,
    {
        async {
            match self.is_canceled().await {
                true => Err(f()),
                false => Ok(()),
            }
        }
    }

    fn progress(&self, #[allow(unused)] message: String) -> impl Progress + Send + 'static {}
}

// Handy for testing
impl RunContext for () {
    fn name(&self) -> &str {
        ""
    }
    async fn is_canceled(&self) -> bool {
        false
    }
    fn progress(&self, _message: String) -> impl Progress + Send + 'static {}
}

#[derive(Debug, Default)]
struct Cancellation {
    flag: AtomicBool,
    notify: Notify,
}

/// A context which can be canceled through a shared flag, reporting progress to tracing.
#[derive(Clone, Debug)]
pub struct CancelableContext {
    name: String,
    canceled: Arc<Cancellation>,
    period: Duration,
}

impl CancelableContext {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            canceled: Default::default(),
            period,
        }
    }

    /// Request the run to stop, aborting a pending request.
    pub fn cancel(&self) {
        self.canceled.flag.store(true, Ordering::Release);
        self.canceled.notify.notify_waiters();
    }

    /// Cancel the context once the process receives Ctrl-C.
    ///
    /// **NOTE:** Requires to be called from a Tokio context.
    pub fn cancel_on_ctrl_c(&self) {
        let context = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Received Ctrl-C, canceling the import");
                context.cancel();
            }
        });
    }
}

impl RunContext for CancelableContext {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_canceled(&self) -> bool {
        self.canceled.flag.load(Ordering::Acquire)
    }

    async fn canceled(&self) {
        let notified = self.canceled.notify.notified();
        tokio::pin!(notified);
        // register before checking the flag, so that a concurrent cancel isn't lost
        notified.as_mut().enable();

        if self.canceled.flag.load(Ordering::Acquire) {
            return;
        }

        notified.await;
    }

    fn progress(&self, message: String) -> impl Progress + Send + 'static {
        TracingProgress::new(message, self.period)
    }
}
