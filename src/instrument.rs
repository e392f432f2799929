use std::{
    future::Future,
    time::{Duration, Instant},
};

use crate::{
    client::GstatClient,
    config::{ConfigSource, EnvConfig},
    transport::{Transport, UdpTransport},
};

/// Times an operation and emits the elapsed wall-clock seconds once it
/// completes. The operation's return value comes back untouched, and if it
/// panics nothing is emitted.
///
/// ```
/// let timer = gstat::time_and_emit("app.report.build");
/// let mut build = timer.wrap(|(rows, title): (usize, String)| format!("{title}: {rows}"));
/// assert_eq!(build((3, "rows".to_string())), "rows: 3");
/// ```
#[derive(Clone, Debug)]
pub struct Elapsed<C = EnvConfig, T = UdpTransport> {
    client: GstatClient<C, T>,
    metric: String,
}

impl<C: ConfigSource, T: Transport> Elapsed<C, T> {
    pub(crate) fn new(client: GstatClient<C, T>, metric: String) -> Self {
        Self { client, metric }
    }
    pub fn metric(&self) -> &str {
        &self.metric
    }
    fn record(&self, duration: Duration) {
        let _ = self.client.emit(&self.metric, duration, None);
    }
    pub fn measure_sync_fn<R, F: FnOnce() -> R>(&self, f: F) -> R {
        let (result, duration) = Self::measure_sync_fn_(f);
        self.record(duration);
        result
    }
    pub fn measure_sync_fn_<R, F: FnOnce() -> R>(f: F) -> (R, Duration) {
        let start_time = Instant::now();
        let result = f();
        let duration = start_time.elapsed();
        (result, duration)
    }
    /// Awaits `f` on the caller's task, no runtime is spawned.
    pub async fn measure_async_fut<R, F: Future<Output = R>>(&self, f: F) -> R {
        let (result, duration) = Self::measure_async_fut_(f).await;
        self.record(duration);
        result
    }
    pub async fn measure_async_fut_<R, F: Future<Output = R>>(f: F) -> (R, Duration) {
        let start_time = Instant::now();
        let result = f.await;
        let duration = start_time.elapsed();
        (result, duration)
    }
    /// Turns `f` into an equivalent function that is timed on every call.
    /// Arguments go through as-is; bundle several into a tuple.
    pub fn wrap<A, R, F: FnMut(A) -> R>(self, mut f: F) -> impl FnMut(A) -> R {
        move |args| self.measure_sync_fn(|| f(args))
    }
}
