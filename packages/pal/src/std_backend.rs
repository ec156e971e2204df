use futures_timer::Delay;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// A future that sleeps for a fixed duration, or never resolves if `None`.
///
/// Mirrors `zwave_core::util::MaybeSleep`, but built on `futures-timer` so it
/// works without a tokio runtime present (the `std` feature of this crate
/// has no tokio dependency).
pub struct MaybeSleep {
    sleep: Option<Delay>,
}

impl MaybeSleep {
    pub fn new(duration: Option<Duration>) -> Self {
        Self {
            sleep: duration.map(Delay::new),
        }
    }
}

impl Future for MaybeSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.sleep.as_mut() {
            Some(sleep) => Pin::new(sleep).poll(cx),
            None => Poll::Pending,
        }
    }
}

pub fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
