//! Process-lifetime reconnect loop with exponential backoff.
//!
//! Sessions run strictly one at a time. After each failure the supervisor
//! sleeps for the current backoff and doubles it, capped at the maximum.
//! A session that stayed up for at least `stable_session` resets the backoff
//! to the minimum first.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info};

use super::session::{SessionError, StreamSession};
use crate::config::FeedConfig;

/// Exponential reconnect delay: `min, 2*min, 4*min, ...` capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { current: min, min, max }
    }

    /// Delay to wait before the next attempt.
    #[cfg(test)]
    fn current(&self) -> Duration {
        self.current
    }

    /// Take the current delay and double the one after it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}

/// Repeatedly opens and runs [`StreamSession`]s against one endpoint.
pub struct ReconnectSupervisor {
    url: String,
    ping_interval: Duration,
    stable_session: Duration,
    backoff: Backoff,
}

impl ReconnectSupervisor {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            url: config.ws_url.clone(),
            ping_interval: config.ping_interval(),
            stable_session: config.stable_session(),
            backoff: Backoff::new(config.min_backoff(), config.max_backoff()),
        }
    }

    /// Run sessions forever, feeding every text frame to `on_text`.
    ///
    /// Only returns if the future is dropped (e.g. on shutdown).
    pub async fn run<F>(&mut self, mut on_text: F)
    where
        F: FnMut(&str),
    {
        loop {
            info!("connecting to {}", self.url);

            let (reason, connected_for) = match StreamSession::open(&self.url, self.ping_interval).await {
                Ok(session) => {
                    info!("connected");
                    let started = Instant::now();
                    let reason = session.run(&mut on_text).await;
                    (reason, Some(started.elapsed()))
                }
                Err(e) => (e, None),
            };

            let delay = self.on_session_end(&reason, connected_for);
            tokio::time::sleep(delay).await;
        }
    }

    /// Log a finished session and pick the delay before the next attempt.
    ///
    /// `connected_for` is `None` when the dial itself failed.
    pub fn on_session_end(&mut self, reason: &SessionError, connected_for: Option<Duration>) -> Duration {
        error!("client error: {reason}");

        if connected_for.is_some_and(|up| up >= self.stable_session) {
            self.backoff.reset();
        }

        let delay = self.backoff.next_delay();
        info!("reconnecting in {delay:?}...");
        delay
    }

    #[cfg(test)]
    fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(secs(1), secs(60));
        let delays: Vec<u64> = (0..9).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60, 60]);
    }

    #[test]
    fn backoff_reset_returns_to_min() {
        let mut backoff = Backoff::new(secs(1), secs(60));
        for _ in 0..5 {
            backoff.next_delay();
        }
        assert_eq!(backoff.current(), secs(32));
        backoff.reset();
        assert_eq!(backoff.current(), secs(1));
    }

    #[test]
    fn short_sessions_keep_growing() {
        let mut sup = ReconnectSupervisor::new(&FeedConfig::default());
        let dial = SessionError::Dial("refused".into());
        let read_err = SessionError::Read("reset".into());

        assert_eq!(sup.on_session_end(&dial, None), secs(1));
        assert_eq!(sup.on_session_end(&read_err, Some(secs(5))), secs(2));
        assert_eq!(sup.on_session_end(&dial, None), secs(4));
        assert_eq!(sup.backoff().current(), secs(8));
    }

    #[test]
    fn stable_session_resets_backoff() {
        let mut sup = ReconnectSupervisor::new(&FeedConfig::default());
        let dial = SessionError::Dial("refused".into());
        for _ in 0..8 {
            sup.on_session_end(&dial, None);
        }
        assert_eq!(sup.backoff().current(), secs(60));

        let closed = SessionError::Closed(None);
        assert_eq!(sup.on_session_end(&closed, Some(secs(3600))), secs(1));
        assert_eq!(sup.backoff().current(), secs(2));
    }
}
