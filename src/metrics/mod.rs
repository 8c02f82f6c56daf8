//! Process metric collection.
//!
//! `MetricSource` is the narrow port over OS process accounting; the
//! production implementation sits on top of `sysinfo`, tests replay canned
//! readings through a fake.

pub mod sampler;
pub mod series;

pub use sampler::{RunState, Sampler, SamplerOutput, StopReason};
pub use series::{Sample, Series, SeriesStore, TrackId};

use std::fmt;

use sysinfo::{Pid, ProcessesToUpdate, System};
use thiserror::Error;

/// A tracked process: OS-assigned pid plus the label shown in the chart
/// legend. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: Pid,
    pub label: String,
}

/// One instantaneous reading for a process.
///
/// `cpu_percent` is a percentage of a single core, as reported by the OS: a
/// process saturating two cores reads as ~200. `memory_bytes` is the resident
/// set size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub cpu_percent: f32,
    pub memory_bytes: u64,
}

/// The tracked pid no longer resolves to a live process. Recoverable at the
/// sampler level: it finalizes that series and keeps sampling the other.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("process {0} no longer exists")]
pub struct ProcessGone(pub Pid);

/// OS process-accounting port consumed by the sampler.
pub trait MetricSource {
    fn sample(&mut self, pid: Pid) -> Result<Reading, ProcessGone>;
}

/// How a tracked process is located at startup: a bare pid (`1234` or
/// `pid:1234`) or a process name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessQuery {
    Pid(Pid),
    Name(String),
}

impl From<&str> for ProcessQuery {
    fn from(s: &str) -> Self {
        if let Some(rest) = s.strip_prefix("pid:") {
            if let Ok(pid) = rest.parse::<u32>() {
                return ProcessQuery::Pid(Pid::from_u32(pid));
            }
        }
        if let Ok(pid) = s.parse::<u32>() {
            return ProcessQuery::Pid(Pid::from_u32(pid));
        }
        ProcessQuery::Name(s.to_string())
    }
}

impl fmt::Display for ProcessQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessQuery::Pid(pid) => write!(f, "pid:{pid}"),
            ProcessQuery::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Production `MetricSource` backed by `sysinfo`.
///
/// CPU deltas need a prior observation, so construction primes the process
/// table; the first sample taken after one poll interval already carries a
/// valid percentage.
pub struct SysinfoSource {
    system: System,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
        }
    }

    /// Looks a query up in the process table. Name queries match the first
    /// process with that exact name; the label defaults to `"name (pid)"`.
    pub fn resolve(&self, query: &ProcessQuery) -> Option<ProcessHandle> {
        match query {
            ProcessQuery::Pid(pid) => self.system.process(*pid).map(|p| ProcessHandle {
                pid: *pid,
                label: format!("{} ({})", p.name().to_string_lossy(), pid),
            }),
            ProcessQuery::Name(name) => self
                .system
                .processes()
                .values()
                .find(|p| p.name().to_string_lossy() == *name)
                .map(|p| ProcessHandle {
                    pid: p.pid(),
                    label: format!("{} ({})", name, p.pid()),
                }),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for SysinfoSource {
    fn sample(&mut self, pid: Pid) -> Result<Reading, ProcessGone> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = self.system.process(pid).ok_or(ProcessGone(pid))?;
        Ok(Reading {
            cpu_percent: process.cpu_usage(),
            memory_bytes: process.memory(),
        })
    }
}
