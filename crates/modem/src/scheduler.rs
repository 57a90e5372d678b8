//! Drift-compensated emission of modulated symbols
//!
//! A [`Transmission`] emits one [`TimedEvent`] per symbol on a tokio timer.
//! After every emission the [`DriftCompensator`] compares the measured gap
//! with the delay that was requested for it and shortens or lengthens the
//! next delay by the difference, so late timer wakeups do not accumulate
//! over a long frame.
//!
//! Only one transmission per [`Scheduler`] may be in flight. Starting another
//! one fails with [`ModemError::TransmissionInProgress`] until the first has
//! finished, been cancelled or been dropped.

use crate::common::{LinkConfig, Symbol};
use crate::{ModemError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of a transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
    Done,
}

/// Proportional timing corrector.
///
/// Timestamps are offsets from the start of the transmission.
#[derive(Debug, Clone)]
pub struct DriftCompensator {
    nominal: Duration,
    last_emission: Option<Duration>,
    last_requested: Duration,
}

impl DriftCompensator {
    /// Create a compensator for the given nominal period
    pub fn new(nominal: Duration) -> Self {
        Self {
            nominal,
            last_emission: None,
            last_requested: nominal,
        }
    }

    /// Nominal period between emissions
    pub fn nominal(&self) -> Duration {
        self.nominal
    }

    /// Forget the previous emission
    pub fn reset(&mut self) {
        self.last_emission = None;
        self.last_requested = self.nominal;
    }

    /// Record an emission at `now` and return the delay to request before the
    /// next one.
    ///
    /// The first emission yields the nominal period. Later ones yield
    /// `nominal + (requested - measured_gap)`, clamped at zero: a gap longer
    /// than `nominal + requested` is only partly made up, which caps the
    /// catch-up rate at one immediate emission.
    pub fn on_emission(&mut self, now: Duration) -> Duration {
        let delay = match self.last_emission {
            None => self.nominal,
            Some(last) => {
                let gap = now.saturating_sub(last);
                let budget = self.nominal + self.last_requested;
                if gap > budget {
                    debug!("Emission {:?} late beyond correction range", gap - budget);
                }
                budget.saturating_sub(gap)
            }
        };

        self.last_emission = Some(now);
        self.last_requested = delay;
        delay
    }
}

/// Shared flag that stops a transmission before its next emission
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every transmission holding a clone of this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One symbol as presented to the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Position in the symbol sequence
    pub index: usize,
    pub symbol: Symbol,
    /// Emission time relative to the start of the transmission
    pub at: Duration,
    /// Delay that was requested before this emission
    pub requested_delay: Duration,
}

/// Receiver of emitted symbols (the display collaborator)
pub trait LevelSink {
    /// Present one event; failures are reported but never stop the transmission
    fn present(&mut self, event: &TimedEvent) -> Result<()>;
}

impl<F> LevelSink for F
where
    F: FnMut(&TimedEvent) -> Result<()>,
{
    fn present(&mut self, event: &TimedEvent) -> Result<()> {
        self(event)
    }
}

/// Summary of a finished transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionReport {
    pub emitted: usize,
    pub total: usize,
    pub sink_failures: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Issues transmissions for one output channel
#[derive(Debug, Clone)]
pub struct Scheduler {
    period: Duration,
    in_flight: Arc<AtomicBool>,
}

impl Scheduler {
    /// Create a scheduler with a nominal period per symbol
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(ModemError::InvalidConfig {
                msg: "Symbol period must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            period,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create a scheduler for a link configuration
    pub fn from_config(config: &LinkConfig) -> Result<Self> {
        Self::new(config.nominal_period())
    }

    /// Nominal period per symbol
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a transmission is currently in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Prepare a transmission of `symbols`; nothing is emitted until it is polled
    pub fn schedule(&self, symbols: Vec<Symbol>, cancel: CancelToken) -> Result<Transmission> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ModemError::TransmissionInProgress);
        }

        debug!("Scheduled {} symbols at {:?} per symbol", symbols.len(), self.period);

        Ok(Transmission {
            total: symbols.len(),
            symbols: symbols.into_iter(),
            index: 0,
            compensator: DriftCompensator::new(self.period),
            next_delay: self.period,
            state: SchedulerState::Idle,
            cancel,
            cancelled: false,
            in_flight: Arc::clone(&self.in_flight),
            started: None,
        })
    }
}

/// Lazy, finite, non-restartable sequence of timed emissions
#[derive(Debug)]
pub struct Transmission {
    total: usize,
    symbols: std::vec::IntoIter<Symbol>,
    index: usize,
    compensator: DriftCompensator,
    next_delay: Duration,
    state: SchedulerState,
    cancel: CancelToken,
    cancelled: bool,
    in_flight: Arc<AtomicBool>,
    started: Option<Instant>,
}

impl Transmission {
    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Symbols not yet emitted
    pub fn remaining(&self) -> usize {
        self.symbols.len()
    }

    /// Token that cancels this transmission
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for and emit the next symbol.
    ///
    /// Returns `None` once every symbol has been emitted or the transmission
    /// was cancelled.
    pub async fn next_event(&mut self) -> Option<TimedEvent> {
        if self.state == SchedulerState::Done {
            return None;
        }

        let started = match self.started {
            Some(started) => started,
            None => {
                let now = Instant::now();
                self.started = Some(now);
                self.state = SchedulerState::Running;
                self.compensator.reset();
                info!("Transmission started: {} symbols", self.total);
                now
            }
        };

        if self.symbols.len() == 0 || self.check_cancelled() {
            self.finish();
            return None;
        }

        let requested_delay = self.next_delay;
        sleep(requested_delay).await;

        if self.check_cancelled() {
            self.finish();
            return None;
        }

        let symbol = self.symbols.next()?;
        let at = started.elapsed();
        self.next_delay = self.compensator.on_emission(at);

        let event = TimedEvent {
            index: self.index,
            symbol,
            at,
            requested_delay,
        };
        self.index += 1;

        if self.symbols.len() == 0 {
            self.finish();
        }

        Some(event)
    }

    /// Emit every remaining symbol into `sink`
    pub async fn run<S>(mut self, sink: &mut S) -> TransmissionReport
    where
        S: LevelSink + ?Sized,
    {
        let mut emitted = 0;
        let mut sink_failures = 0;

        while let Some(event) = self.next_event().await {
            emitted += 1;
            if let Err(e) = sink.present(&event) {
                sink_failures += 1;
                warn!("Symbol {} not presented: {}", event.index, e);
            }
        }

        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        let report = TransmissionReport {
            emitted,
            total: self.total,
            sink_failures,
            cancelled: self.cancelled,
            elapsed,
        };

        info!(
            "Transmission finished: {}/{} symbols in {:?} ({} sink failures{})",
            report.emitted,
            report.total,
            report.elapsed,
            report.sink_failures,
            if report.cancelled { ", cancelled" } else { "" }
        );
        report
    }

    fn check_cancelled(&mut self) -> bool {
        if self.cancel.is_cancelled() && !self.cancelled {
            self.cancelled = true;
            info!("Transmission cancelled with {} symbols left", self.symbols.len());
        }
        self.cancelled
    }

    fn finish(&mut self) {
        if self.state != SchedulerState::Done {
            self.state = SchedulerState::Done;
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for Transmission {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Level;
    use quickcheck_macros::quickcheck;

    const NOMINAL: Duration = Duration::from_millis(100);

    fn symbols(n: usize) -> Vec<Symbol> {
        (0..n).map(|i| Symbol::plain(Level::Binary(i % 2 == 0))).collect()
    }

    #[test]
    fn test_first_emission_uses_nominal() {
        let mut compensator = DriftCompensator::new(NOMINAL);
        assert_eq!(compensator.on_emission(Duration::from_millis(100)), NOMINAL);
    }

    #[test]
    fn test_late_emission_shortens_next_delay() {
        let mut compensator = DriftCompensator::new(NOMINAL);
        compensator.on_emission(Duration::ZERO);
        let delay = compensator.on_emission(Duration::from_millis(130));
        assert_eq!(delay, Duration::from_millis(70));

        // Firing on time afterwards returns to the nominal period.
        let delay = compensator.on_emission(Duration::from_millis(200));
        assert_eq!(delay, NOMINAL);
    }

    #[test]
    fn test_early_emission_lengthens_next_delay() {
        let mut compensator = DriftCompensator::new(NOMINAL);
        compensator.on_emission(Duration::ZERO);
        assert_eq!(
            compensator.on_emission(Duration::from_millis(90)),
            Duration::from_millis(110)
        );
    }

    #[test]
    fn test_delay_clamped_at_zero() {
        let mut compensator = DriftCompensator::new(NOMINAL);
        compensator.on_emission(Duration::ZERO);
        assert_eq!(compensator.on_emission(Duration::from_millis(450)), Duration::ZERO);
    }

    #[test]
    fn test_reset_forgets_previous_emission() {
        let mut compensator = DriftCompensator::new(NOMINAL);
        compensator.on_emission(Duration::ZERO);
        compensator.reset();
        assert_eq!(compensator.on_emission(Duration::from_secs(10)), NOMINAL);
    }

    #[quickcheck]
    fn prop_total_duration_locked_to_nominal(jitter_ms: Vec<u8>) -> bool {
        // Timer wakeups late by 0..=99 ms; the emission time of symbol k stays
        // within the first and the latest jitter of k * nominal.
        let jitters: Vec<Duration> = jitter_ms
            .iter()
            .map(|&j| Duration::from_millis(u64::from(j) % 100))
            .collect();
        if jitters.is_empty() {
            return true;
        }

        let mut compensator = DriftCompensator::new(NOMINAL);
        let mut now = NOMINAL + jitters[0];
        let mut delay = compensator.on_emission(now);
        for jitter in &jitters[1..] {
            now += delay + *jitter;
            delay = compensator.on_emission(now);
        }

        let ideal = NOMINAL * jitters.len() as u32;
        now >= ideal && now <= ideal + Duration::from_millis(200)
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(matches!(
            Scheduler::new(Duration::ZERO),
            Err(ModemError::InvalidConfig { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_spaced_by_nominal_period() {
        let scheduler = Scheduler::new(NOMINAL).unwrap();
        let transmission = scheduler.schedule(symbols(5), CancelToken::new()).unwrap();

        let mut events = Vec::new();
        let mut sink = |event: &TimedEvent| -> Result<()> {
            events.push(*event);
            Ok(())
        };
        let report = transmission.run(&mut sink).await;

        assert_eq!(report.emitted, 5);
        assert!(!report.cancelled);
        assert_eq!(events.len(), 5);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.index, i);
            assert_eq!(event.symbol.level, Level::Binary(i % 2 == 0));
            assert_eq!(event.at, NOMINAL * (i as u32 + 1));
            assert_eq!(event.requested_delay, NOMINAL);
        }
        assert_eq!(report.elapsed, NOMINAL * 5);
        assert!(!scheduler.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_transmission_rejected_while_running() {
        let scheduler = Scheduler::new(NOMINAL).unwrap();
        let mut first = scheduler.schedule(symbols(2), CancelToken::new()).unwrap();

        assert!(first.next_event().await.is_some());
        assert_eq!(first.state(), SchedulerState::Running);
        assert!(matches!(
            scheduler.schedule(symbols(1), CancelToken::new()),
            Err(ModemError::TransmissionInProgress)
        ));

        assert!(first.next_event().await.is_some());
        assert_eq!(first.state(), SchedulerState::Done);
        assert!(first.next_event().await.is_none());
        assert!(scheduler.schedule(symbols(1), CancelToken::new()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_transmission_releases_scheduler() {
        let scheduler = Scheduler::new(NOMINAL).unwrap();
        let transmission = scheduler.schedule(symbols(3), CancelToken::new()).unwrap();
        assert!(scheduler.is_busy());
        drop(transmission);
        assert!(!scheduler.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_emission() {
        let scheduler = Scheduler::new(NOMINAL).unwrap();
        let cancel = CancelToken::new();
        let mut transmission = scheduler.schedule(symbols(10), cancel.clone()).unwrap();

        assert!(transmission.next_event().await.is_some());
        assert!(transmission.next_event().await.is_some());
        cancel.cancel();
        assert!(transmission.next_event().await.is_none());
        assert_eq!(transmission.state(), SchedulerState::Done);
        assert_eq!(transmission.remaining(), 8);
        assert!(!scheduler.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_from_sink_reports_partial_run() {
        let scheduler = Scheduler::new(NOMINAL).unwrap();
        let transmission = scheduler.schedule(symbols(10), CancelToken::new()).unwrap();
        let cancel = transmission.cancel_token();

        let mut sink = |event: &TimedEvent| -> Result<()> {
            if event.index == 3 {
                cancel.cancel();
            }
            Ok(())
        };
        let report = transmission.run(&mut sink).await;

        assert_eq!(report.emitted, 4);
        assert_eq!(report.total, 10);
        assert!(report.cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failures_are_not_fatal() {
        let scheduler = Scheduler::new(NOMINAL).unwrap();
        let transmission = scheduler.schedule(symbols(4), CancelToken::new()).unwrap();

        let mut sink = |event: &TimedEvent| -> Result<()> {
            if event.index % 2 == 0 {
                Err(ModemError::Sink {
                    msg: "no output surface".to_string(),
                })
            } else {
                Ok(())
            }
        };
        let report = transmission.run(&mut sink).await;

        assert_eq!(report.emitted, 4);
        assert_eq!(report.sink_failures, 2);
        assert_eq!(report.elapsed, NOMINAL * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_transmission_finishes_immediately() {
        let scheduler = Scheduler::new(NOMINAL).unwrap();
        let mut transmission = scheduler.schedule(Vec::new(), CancelToken::new()).unwrap();
        assert_eq!(transmission.state(), SchedulerState::Idle);
        assert!(transmission.next_event().await.is_none());
        assert_eq!(transmission.state(), SchedulerState::Done);
    }
}
