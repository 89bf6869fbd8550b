//! Circuit breaker pattern implementation.
//!
//! The circuit breaker fails fast when the upstream is judged unhealthy,
//! giving it time to recover instead of piling on more load. Three states:
//! Closed (normal), Open (rejecting), HalfOpen (probing with one call).
//! The Open to HalfOpen transition happens lazily on the next call attempt,
//! not via a background timer.

use bridge_core::{BridgeError, BridgeEvent, BridgeResult, EventBus};
use parking_lot::Mutex;
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Requests are rejected without contacting the upstream
    Open,
    /// A single probe request is allowed through
    HalfOpen,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Time the circuit stays open before allowing a probe
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,
    /// Multiplier applied to the cooldown after each failed probe
    ///
    /// 1.0 disables cooldown extension. Values above 1.0 stretch the
    /// cooldown after repeated Open -> HalfOpen -> Open cycles, capped at
    /// `max_cooldown`.
    pub cooldown_multiplier: f64,
    /// Upper bound on the extended cooldown
    #[serde(with = "humantime_serde")]
    pub max_cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            cooldown_multiplier: 1.0,
            max_cooldown: Duration::from_secs(300),
        }
    }
}

/// Mutable breaker record, guarded by one mutex
///
/// Invariant: `state == Open` implies `last_failure_time.is_some()`.
#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    probe_in_flight: bool,
    failed_probes: u32,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            probe_in_flight: false,
            failed_probes: 0,
        }
    }
}

/// Point-in-time view of the breaker for administrative inspection
#[derive(Debug, Clone)]
pub struct CircuitBreakerSnapshot {
    /// Current state
    pub state: CircuitState,
    /// Consecutive failure count
    pub failure_count: u32,
    /// When the most recent failure was recorded
    pub last_failure_time: Option<Instant>,
}

/// Circuit breaker guarding one upstream service
pub struct CircuitBreaker {
    /// Service identifier, used for diagnostics and events
    service: String,
    /// Configuration
    config: CircuitBreakerConfig,
    /// Guarded state record
    state: Mutex<BreakerState>,
    /// Optional event sink for state transitions
    events: Option<EventBus>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(service: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            service: service.into(),
            config,
            state: Mutex::new(BreakerState::new()),
            events: None,
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(service: impl Into<String>) -> Self {
        Self::new(service, CircuitBreakerConfig::default())
    }

    /// Attach an event bus that receives state transitions
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Get the service identifier
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Get the current state without side effects
    ///
    /// An elapsed cooldown is only acted on by the next call attempt, so
    /// this may report `Open` even when a probe would be admitted.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Check whether a call may proceed
    ///
    /// Performs the lazy Open -> HalfOpen transition when the cooldown has
    /// elapsed. In HalfOpen, admits exactly one probe; concurrent callers
    /// are rejected as if the circuit were open.
    ///
    /// # Errors
    /// Returns [`BridgeError::CircuitOpen`] if the call must be rejected.
    pub fn check(&self) -> BridgeResult<()> {
        let mut s = self.state.lock();
        match s.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let cooldown = self.current_cooldown(s.failed_probes);
                let cooled_down = s
                    .last_failure_time
                    .is_some_and(|t| t.elapsed() >= cooldown);

                if cooled_down {
                    s.state = CircuitState::HalfOpen;
                    s.probe_in_flight = true;
                    info!(service = %self.service, "Circuit breaker half-open, probing upstream");
                    self.publish(BridgeEvent::CircuitHalfOpen {
                        service: self.service.clone(),
                    });
                    Ok(())
                } else {
                    Err(BridgeError::circuit_open(&self.service))
                }
            }
            CircuitState::HalfOpen => {
                if s.probe_in_flight {
                    Err(BridgeError::circuit_open(&self.service))
                } else {
                    s.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut s = self.state.lock();
        match s.state {
            CircuitState::Closed => {
                s.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                *s = BreakerState::new();
                info!(service = %self.service, "Circuit breaker closed after successful probe");
                self.publish(BridgeEvent::CircuitClosed {
                    service: self.service.clone(),
                });
            }
            CircuitState::Open => {
                // Stale outcome from a call admitted before the trip
            }
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let mut s = self.state.lock();
        match s.state {
            CircuitState::Closed => {
                s.failure_count += 1;
                if s.failure_count >= self.config.failure_threshold {
                    s.state = CircuitState::Open;
                    s.last_failure_time = Some(Instant::now());
                    warn!(
                        service = %self.service,
                        failures = s.failure_count,
                        threshold = self.config.failure_threshold,
                        "Circuit breaker opened"
                    );
                    self.publish(BridgeEvent::CircuitOpened {
                        service: self.service.clone(),
                    });
                } else {
                    s.last_failure_time = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                s.state = CircuitState::Open;
                s.last_failure_time = Some(Instant::now());
                s.probe_in_flight = false;
                s.failed_probes += 1;
                warn!(
                    service = %self.service,
                    failed_probes = s.failed_probes,
                    "Circuit breaker probe failed, reopening"
                );
                self.publish(BridgeEvent::CircuitOpened {
                    service: self.service.clone(),
                });
            }
            CircuitState::Open => {
                // Already open, nothing to do
            }
        }
    }

    /// Execute an operation guarded by this breaker
    ///
    /// The operation's outcome is recorded as a single success or failure.
    ///
    /// # Errors
    /// Returns [`BridgeError::CircuitOpen`] without invoking the operation
    /// when the circuit rejects the call, or the operation's own error.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> BridgeResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        self.check()?;
        match operation().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => {
                self.record_failure();
                Err(error)
            }
        }
    }

    /// Force a transition back to Closed, clearing all counters
    ///
    /// Administrative escape hatch, not part of the automatic state machine.
    pub fn reset(&self) {
        let mut s = self.state.lock();
        let was_closed = s.state == CircuitState::Closed;
        *s = BreakerState::new();
        if !was_closed {
            info!(service = %self.service, "Circuit breaker manually reset");
            self.publish(BridgeEvent::CircuitClosed {
                service: self.service.clone(),
            });
        }
    }

    /// Force the circuit open (manual intervention)
    pub fn force_open(&self) {
        let mut s = self.state.lock();
        if s.state != CircuitState::Open {
            s.state = CircuitState::Open;
            s.last_failure_time = Some(Instant::now());
            s.probe_in_flight = false;
            warn!(service = %self.service, "Circuit breaker forced open");
            self.publish(BridgeEvent::CircuitOpened {
                service: self.service.clone(),
            });
        }
    }

    /// Point-in-time snapshot for administrative inspection
    #[must_use]
    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let s = self.state.lock();
        CircuitBreakerSnapshot {
            state: s.state,
            failure_count: s.failure_count,
            last_failure_time: s.last_failure_time,
        }
    }

    /// Cooldown in effect, accounting for repeated failed probes
    fn current_cooldown(&self, failed_probes: u32) -> Duration {
        if self.config.cooldown_multiplier <= 1.0 || failed_probes == 0 {
            return self.config.cooldown;
        }
        let exponent = failed_probes.min(i32::MAX as u32) as i32;
        let scaled =
            self.config.cooldown.as_millis() as f64 * self.config.cooldown_multiplier.powi(exponent);
        let capped = scaled.min(self.config.max_cooldown.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    fn publish(&self, event: BridgeEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}
