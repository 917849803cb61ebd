//! Polling a page until its stat block has rendered.
//!
//! [`ReadinessWait`] is the pure state machine; [`wait_until_ready`] drives it
//! with a [`Probe`] that re-reads the page and a [`Clock`] that sleeps between
//! attempts. Both are traits so tests can run without real time passing.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            max_attempts: 40,
            interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Waiting { attempts: u32 },
    Ready,
    TimedOut { attempts: u32 },
}

impl WaitState {
    pub fn is_finished(self) -> bool {
        !matches!(self, WaitState::Waiting { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ReadinessWait {
    policy: PollPolicy,
    state: WaitState,
}

impl ReadinessWait {
    pub fn new(policy: PollPolicy) -> Self {
        ReadinessWait {
            policy,
            state: WaitState::Waiting { attempts: 0 },
        }
    }

    pub fn state(&self) -> WaitState {
        self.state
    }

    /// Record one probe result. Finished states are sticky.
    pub fn observe(&mut self, ready: bool) -> WaitState {
        if let WaitState::Waiting { attempts } = self.state {
            self.state = if ready {
                WaitState::Ready
            } else {
                let attempts = attempts + 1;
                if attempts >= self.policy.max_attempts {
                    WaitState::TimedOut { attempts }
                } else {
                    WaitState::Waiting { attempts }
                }
            };
        }
        self.state
    }

    /// Give up early; the wait ends as timed out with the attempts made so far.
    pub fn cancel(&mut self) -> WaitState {
        if let WaitState::Waiting { attempts } = self.state {
            self.state = WaitState::TimedOut { attempts };
        }
        self.state
    }
}

pub trait Clock {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Re-reads the current state of a page.
pub trait Probe {
    fn fetch(&mut self) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Probe until `is_ready` accepts the page, the policy runs out, or `cancel` fires.
pub async fn wait_until_ready<P, C, F>(
    probe: &mut P,
    is_ready: F,
    clock: &C,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Result<String, ExtractError>
where
    P: Probe,
    C: Clock,
    F: Fn(&str) -> bool,
{
    let mut wait = ReadinessWait::new(policy);

    loop {
        if cancel.is_cancelled() {
            if let WaitState::TimedOut { attempts } = wait.cancel() {
                info!(attempts, "readiness wait cancelled");
                return Err(ExtractError::ReadinessTimeout { attempts });
            }
        }

        let page = match probe.fetch().await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("Probe failed: {:#}", e);
                None
            }
        };
        let ready = page.as_deref().is_some_and(&is_ready);

        match wait.observe(ready) {
            WaitState::Ready => {
                if let Some(page) = page {
                    return Ok(page);
                }
            }
            WaitState::TimedOut { attempts } => {
                warn!(attempts, "content never became ready");
                return Err(ExtractError::ReadinessTimeout { attempts });
            }
            WaitState::Waiting { attempts } => {
                debug!(attempts, max = policy.max_attempts, "page not ready yet");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = clock.sleep(policy.interval) => {}
        }
    }
}
