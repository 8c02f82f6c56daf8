//! The fixed-interval polling loop.
//!
//! The loop body is an explicit `tick` so tests can drive it with synthetic
//! timestamps; `run` wraps it with the real clock and a blocking sleep.

use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};
use sysinfo::Pid;

use crate::config::RunConfig;
use crate::error::Result;
use crate::metrics::series::{Sample, Series, SeriesStore, TrackId};
use crate::metrics::{MetricSource, ProcessHandle};
use crate::signal::CancelFlag;

/// Why the polling loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Both tracked processes are gone.
    AllGone,
    /// The configured maximum run duration elapsed.
    DurationReached,
    /// A series reached the configured sample limit.
    SampleLimitReached,
    /// The user interrupted the run.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Sampling,
    Stopped(StopReason),
}

/// What a completed run hands to the renderer: both labeled series plus the
/// reason the loop stopped. Partial results are always renderable.
#[derive(Debug)]
pub struct SamplerOutput {
    pub label_a: String,
    pub series_a: Series,
    pub label_b: String,
    pub series_b: Series,
    pub reason: StopReason,
}

struct Track {
    id: TrackId,
    pid: Option<Pid>,
    finalized: bool,
}

impl Track {
    fn new(id: TrackId, handle: Option<&ProcessHandle>) -> Self {
        Self {
            id,
            pid: handle.map(|h| h.pid),
            // A query that never resolved leaves an empty series behind.
            finalized: handle.is_none(),
        }
    }
}

/// Polls two tracked processes through a [`MetricSource`] and accumulates
/// their series. One of the two handles may be absent (unresolvable at
/// startup); the caller guarantees at least one is present.
pub struct Sampler<S> {
    source: S,
    config: RunConfig,
    cancel: CancelFlag,
    store: SeriesStore,
    tracks: [Track; 2],
    state: RunState,
}

impl<S: MetricSource> Sampler<S> {
    pub fn new(
        source: S,
        config: RunConfig,
        handle_a: Option<ProcessHandle>,
        label_a: String,
        handle_b: Option<ProcessHandle>,
        label_b: String,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            source,
            config,
            cancel,
            store: SeriesStore::new(label_a, label_b),
            tracks: [
                Track::new(TrackId::A, handle_a.as_ref()),
                Track::new(TrackId::B, handle_b.as_ref()),
            ],
            state: RunState::Sampling,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// One pass over both tracks at the given run-relative timestamp.
    /// Cancellation is observed here, once per tick, never mid-read.
    pub fn tick(&mut self, elapsed: Duration) -> Result<RunState> {
        if let RunState::Stopped(_) = self.state {
            return Ok(self.state);
        }
        if self.cancel.is_cancelled() {
            info!("interrupted, finishing with {} samples", self.sample_count());
            self.state = RunState::Stopped(StopReason::Cancelled);
            return Ok(self.state);
        }

        for i in 0..self.tracks.len() {
            let (id, pid) = match &self.tracks[i] {
                Track {
                    finalized: false,
                    pid: Some(pid),
                    id,
                } => (*id, *pid),
                _ => continue,
            };
            match self.source.sample(pid) {
                Ok(reading) => {
                    self.store.append(id, Sample::new(elapsed, reading))?;
                }
                Err(gone) => {
                    warn!("{gone}; no more samples for \"{}\"", self.store.label(id));
                    self.tracks[i].finalized = true;
                }
            }
        }

        if self.tracks.iter().all(|t| t.finalized) {
            self.state = RunState::Stopped(StopReason::AllGone);
        } else if let Some(limit) = self.config.max_samples {
            let longest = TrackId::BOTH
                .iter()
                .map(|&id| self.store.series(id).len())
                .max()
                .unwrap_or(0);
            if longest >= limit {
                self.state = RunState::Stopped(StopReason::SampleLimitReached);
            }
        }
        Ok(self.state)
    }

    /// Runs the loop to completion: tick, sleep, repeat. Ticks land at
    /// approximately 0, I, 2I, ... so a max duration D yields at most
    /// floor(D/I) + 1 samples per series.
    pub fn run(mut self) -> Result<SamplerOutput> {
        let started = Instant::now();
        let reason = loop {
            let elapsed = started.elapsed();
            if let Some(max) = self.config.max_duration {
                if elapsed > max {
                    self.state = RunState::Stopped(StopReason::DurationReached);
                }
            }
            if let RunState::Stopped(reason) = self.tick(elapsed)? {
                break reason;
            }
            let tick_cost = started.elapsed() - elapsed;
            if tick_cost > self.config.interval {
                warn!(
                    "metric collection took {tick_cost:?}, longer than the {:?} interval",
                    self.config.interval
                );
            }
            thread::sleep(self.config.interval);
        };

        info!(
            "sampling stopped ({reason:?}) after {:?}, {} samples",
            started.elapsed(),
            self.sample_count()
        );
        let ((label_a, series_a), (label_b, series_b)) = self.store.into_series();
        Ok(SamplerOutput {
            label_a,
            series_a,
            label_b,
            series_b,
            reason,
        })
    }

    fn sample_count(&self) -> usize {
        TrackId::BOTH
            .iter()
            .map(|&id| self.store.series(id).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    use crate::metrics::{ProcessGone, Reading};

    fn pid_a() -> Pid {
        Pid::from_u32(100)
    }

    fn pid_b() -> Pid {
        Pid::from_u32(200)
    }

    /// Replays canned readings per pid; once a pid's queue is drained every
    /// further sample reports the process as gone.
    struct FakeSource {
        readings: HashMap<Pid, VecDeque<Reading>>,
    }

    impl FakeSource {
        fn new(per_pid: Vec<(Pid, Vec<Reading>)>) -> Self {
            Self {
                readings: per_pid
                    .into_iter()
                    .map(|(pid, r)| (pid, r.into_iter().collect()))
                    .collect(),
            }
        }
    }

    impl MetricSource for FakeSource {
        fn sample(&mut self, pid: Pid) -> std::result::Result<Reading, ProcessGone> {
            self.readings
                .get_mut(&pid)
                .and_then(VecDeque::pop_front)
                .ok_or(ProcessGone(pid))
        }
    }

    fn reading(cpu: f32, mem_mb: u64) -> Reading {
        Reading {
            cpu_percent: cpu,
            memory_bytes: mem_mb * 1024 * 1024,
        }
    }

    fn handle(pid: Pid, label: &str) -> Option<ProcessHandle> {
        Some(ProcessHandle {
            pid,
            label: label.to_string(),
        })
    }

    fn sampler(source: FakeSource, config: RunConfig, cancel: CancelFlag) -> Sampler<FakeSource> {
        Sampler::new(
            source,
            config,
            handle(pid_a(), "a"),
            "a".to_string(),
            handle(pid_b(), "b"),
            "b".to_string(),
            cancel,
        )
    }

    fn config(interval_secs: f64) -> RunConfig {
        RunConfig::new(interval_secs, None, None).unwrap()
    }

    #[test]
    fn five_ticks_fill_both_series() {
        let source = FakeSource::new(vec![
            (pid_a(), vec![reading(10.0, 100); 5]),
            (pid_b(), vec![reading(50.0, 200); 5]),
        ]);
        let mut sampler = sampler(source, config(1.0), CancelFlag::new());

        for i in 0..5 {
            let state = sampler.tick(Duration::from_secs(i)).unwrap();
            assert_eq!(state, RunState::Sampling);
        }

        let store = sampler.store();
        assert_eq!(store.series(TrackId::A).len(), 5);
        assert_eq!(store.series(TrackId::B).len(), 5);
        let last_a = store.series(TrackId::A).last().unwrap();
        assert_eq!(last_a.cpu_percent, 10.0);
        assert_eq!(last_a.memory_bytes, 100 * 1024 * 1024);
        let last_b = store.series(TrackId::B).last().unwrap();
        assert_eq!(last_b.cpu_percent, 50.0);
    }

    #[test]
    fn one_process_dying_finalizes_only_its_series() {
        let source = FakeSource::new(vec![
            (pid_a(), vec![reading(10.0, 100); 5]),
            (pid_b(), vec![reading(50.0, 200); 2]),
        ]);
        let mut sampler = sampler(source, config(1.0), CancelFlag::new());

        for i in 0..5 {
            sampler.tick(Duration::from_secs(i)).unwrap();
        }

        assert_eq!(sampler.state(), RunState::Sampling);
        assert_eq!(sampler.store().series(TrackId::A).len(), 5);
        assert_eq!(sampler.store().series(TrackId::B).len(), 2);

        // A's readings run out on the next tick; with B already gone the
        // whole run stops.
        let state = sampler.tick(Duration::from_secs(5)).unwrap();
        assert_eq!(state, RunState::Stopped(StopReason::AllGone));
    }

    #[test]
    fn both_gone_at_start_stops_on_first_tick() {
        let source = FakeSource::new(vec![]);
        let mut sampler = sampler(source, config(1.0), CancelFlag::new());

        let state = sampler.tick(Duration::ZERO).unwrap();
        assert_eq!(state, RunState::Stopped(StopReason::AllGone));
        assert!(sampler.store().series(TrackId::A).is_empty());
        assert!(sampler.store().series(TrackId::B).is_empty());
    }

    #[test]
    fn unresolved_track_starts_finalized() {
        let source = FakeSource::new(vec![(pid_b(), vec![reading(50.0, 200); 3])]);
        let mut sampler = Sampler::new(
            source,
            config(1.0),
            None,
            "a".to_string(),
            handle(pid_b(), "b"),
            "b".to_string(),
            CancelFlag::new(),
        );

        for i in 0..3 {
            sampler.tick(Duration::from_secs(i)).unwrap();
        }
        assert!(sampler.store().series(TrackId::A).is_empty());
        assert_eq!(sampler.store().series(TrackId::B).len(), 3);
    }

    #[test]
    fn sample_limit_stops_the_run() {
        let source = FakeSource::new(vec![
            (pid_a(), vec![reading(10.0, 100); 10]),
            (pid_b(), vec![reading(50.0, 200); 10]),
        ]);
        let config = RunConfig::new(1.0, None, Some(3)).unwrap();
        let mut sampler = sampler(source, config, CancelFlag::new());

        let mut state = RunState::Sampling;
        for i in 0..10 {
            state = sampler.tick(Duration::from_secs(i)).unwrap();
            if state != RunState::Sampling {
                break;
            }
        }
        assert_eq!(state, RunState::Stopped(StopReason::SampleLimitReached));
        assert_eq!(sampler.store().series(TrackId::A).len(), 3);
    }

    #[test]
    fn cancellation_is_observed_before_sampling() {
        let source = FakeSource::new(vec![(pid_a(), vec![reading(10.0, 100); 5])]);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut sampler = sampler(source, config(1.0), cancel);

        let state = sampler.tick(Duration::ZERO).unwrap();
        assert_eq!(state, RunState::Stopped(StopReason::Cancelled));
        assert!(sampler.store().series(TrackId::A).is_empty());
    }

    #[test]
    fn run_respects_the_duration_bound() {
        let source = FakeSource::new(vec![
            (pid_a(), vec![reading(10.0, 100); 100]),
            (pid_b(), vec![reading(50.0, 200); 100]),
        ]);
        // 10ms interval, 35ms cap: at most floor(35/10) + 1 = 4 ticks.
        let config = RunConfig::new(0.010, Some(0.035), None).unwrap();
        let output = sampler(source, config, CancelFlag::new()).run().unwrap();

        assert_eq!(output.reason, StopReason::DurationReached);
        assert!(!output.series_a.is_empty());
        assert!(output.series_a.len() <= 4 + 1);

        // Timestamps come out strictly increasing.
        let times: Vec<_> = output.series_a.iter().map(|s| s.elapsed).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn run_reports_labels() {
        let source = FakeSource::new(vec![]);
        let config = RunConfig::new(0.001, None, None).unwrap();
        let output = sampler(source, config, CancelFlag::new()).run().unwrap();
        assert_eq!(output.label_a, "a");
        assert_eq!(output.label_b, "b");
        assert_eq!(output.reason, StopReason::AllGone);
    }
}
