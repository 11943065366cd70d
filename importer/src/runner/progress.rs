use std::{
    fmt::Display,
    future::Future,
    time::{Duration, Instant},
};

/// A sink for the progress of a run.
///
/// The walker announces what it is doing through [`Progress::message`] and then starts one
/// work package, sized to the number of index entries.
pub trait Progress {
    type Instance: ProgressInstance;

    fn start(&self, total: usize) -> Self::Instance;

    fn message(&self, message: impl Display) -> impl Future<Output = ()>;
}

/// A single, running work package.
pub trait ProgressInstance: Sized {
    /// One entry got processed, no matter if it was collected or skipped.
    fn tick(&mut self) -> impl Future<Output = ()> {
        self.increment(1)
    }

    fn increment(&mut self, done: usize) -> impl Future<Output = ()>;

    fn finish(self) -> impl Future<Output = ()>;
}

impl Progress for () {
    type Instance = ();

    fn start(&self, _total: usize) -> Self::Instance {}

    async fn message(&self, _message: impl Display) {}
}

impl ProgressInstance for () {
    async fn increment(&mut self, _done: usize) {}

    async fn finish(self) {}
}

/// Logs the progress, at most once per period.
#[derive(Clone, Debug)]
pub struct TracingProgress {
    name: String,
    period: Duration,
}

impl TracingProgress {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
        }
    }
}

pub struct TracingProgressInstance {
    name: String,
    period: Duration,

    total: usize,
    done: usize,

    started: Instant,
    /// When progress was logged the last time, `None` until the first tick.
    logged: Option<Instant>,
}

impl Progress for TracingProgress {
    type Instance = TracingProgressInstance;

    fn start(&self, total: usize) -> Self::Instance {
        tracing::info!(total, "{}: {total} entries", self.name);

        TracingProgressInstance {
            name: self.name.clone(),
            period: self.period,
            total,
            done: 0,
            started: Instant::now(),
            logged: None,
        }
    }

    async fn message(&self, message: impl Display) {
        tracing::info!("{message}");
    }
}

impl ProgressInstance for TracingProgressInstance {
    async fn increment(&mut self, done: usize) {
        self.done = self.done.saturating_add(done).min(self.total);

        if self.total == 0 || !self.due() {
            return;
        }
        self.logged = Some(Instant::now());

        let percent = self.done as f64 * 100.0 / self.total as f64;
        let eta = self
            .remaining()
            .map(|eta| humantime::Duration::from(Duration::from_secs(eta.as_secs())).to_string())
            .unwrap_or_else(|| "?".into());

        tracing::info!(
            done = self.done,
            total = self.total,
            percent,
            "{}: {}/{} ({percent:.2}%, ETA: {eta})",
            self.name,
            self.done,
            self.total,
        );
    }

    async fn finish(self) {
        tracing::info!(
            done = self.done,
            total = self.total,
            "{}: done, {} entries in {}",
            self.name,
            self.done,
            humantime::Duration::from(Duration::from_secs(self.started.elapsed().as_secs())),
        );
    }
}

impl TracingProgressInstance {
    fn due(&self) -> bool {
        self.logged
            .is_none_or(|logged| logged.elapsed() >= self.period)
    }

    /// Estimate the remaining time, assuming the remaining entries take as long as the done ones.
    fn remaining(&self) -> Option<Duration> {
        if self.done == 0 {
            return None;
        }

        let per_entry = self.started.elapsed().as_secs_f64() / self.done as f64;
        Duration::try_from_secs_f64(per_entry * (self.total - self.done) as f64).ok()
    }
}
