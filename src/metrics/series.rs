//! In-memory time series storage for one sampling run.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::metrics::Reading;

/// Which of the two tracked processes a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackId {
    A,
    B,
}

impl TrackId {
    pub const BOTH: [TrackId; 2] = [TrackId::A, TrackId::B];

    fn index(self) -> usize {
        match self {
            TrackId::A => 0,
            TrackId::B => 1,
        }
    }
}

/// One timestamped reading. `elapsed` is measured from run start; samples are
/// never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub elapsed: Duration,
    pub cpu_percent: f32,
    pub memory_bytes: u64,
}

impl Sample {
    pub fn new(elapsed: Duration, reading: Reading) -> Self {
        Self {
            elapsed,
            cpu_percent: reading.cpu_percent,
            memory_bytes: reading.memory_bytes,
        }
    }

    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Append-only history for one tracked process, strictly ordered by
/// `elapsed`. Only the [`SeriesStore`] can push into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

/// Owns the two series of a run. Single writer (the sampler) while the loop
/// runs, single reader (the renderer) afterwards, so no locking.
#[derive(Debug, Default)]
pub struct SeriesStore {
    labels: [String; 2],
    series: [Series; 2],
}

impl SeriesStore {
    pub fn new(label_a: impl Into<String>, label_b: impl Into<String>) -> Self {
        Self {
            labels: [label_a.into(), label_b.into()],
            series: [Series::default(), Series::default()],
        }
    }

    pub fn label(&self, track: TrackId) -> &str {
        &self.labels[track.index()]
    }

    pub fn series(&self, track: TrackId) -> &Series {
        &self.series[track.index()]
    }

    /// Appends a sample, enforcing strict timestamp monotonicity within the
    /// track. An out-of-order append is a bug in the caller, surfaced as an
    /// error rather than silently corrupting the series.
    pub fn append(&mut self, track: TrackId, sample: Sample) -> Result<()> {
        let series = &mut self.series[track.index()];
        if let Some(last) = series.samples.last() {
            if sample.elapsed <= last.elapsed {
                return Err(Error::NonMonotonicSample {
                    label: self.labels[track.index()].clone(),
                    at: sample.elapsed,
                    last: last.elapsed,
                });
            }
        }
        series.samples.push(sample);
        Ok(())
    }

    /// Borrows both series in track order.
    pub fn snapshot(&self) -> (&Series, &Series) {
        (&self.series[0], &self.series[1])
    }

    pub fn into_series(self) -> ((String, Series), (String, Series)) {
        let [label_a, label_b] = self.labels;
        let [series_a, series_b] = self.series;
        ((label_a, series_a), (label_b, series_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(secs: f64, cpu: f32, mem: u64) -> Sample {
        Sample {
            elapsed: Duration::from_secs_f64(secs),
            cpu_percent: cpu,
            memory_bytes: mem,
        }
    }

    #[test]
    fn appends_in_order() {
        let mut store = SeriesStore::new("a", "b");
        store.append(TrackId::A, sample(0.0, 10.0, 100)).unwrap();
        store.append(TrackId::A, sample(1.0, 12.0, 110)).unwrap();
        store.append(TrackId::B, sample(0.5, 50.0, 200)).unwrap();

        assert_eq!(store.series(TrackId::A).len(), 2);
        assert_eq!(store.series(TrackId::B).len(), 1);
        assert_eq!(
            store.series(TrackId::A).last().unwrap().elapsed,
            Duration::from_secs(1)
        );
    }

    #[test]
    fn rejects_equal_timestamp() {
        let mut store = SeriesStore::new("a", "b");
        store.append(TrackId::A, sample(1.0, 10.0, 100)).unwrap();
        let err = store.append(TrackId::A, sample(1.0, 11.0, 100)).unwrap_err();
        assert!(matches!(err, Error::NonMonotonicSample { .. }));
    }

    #[test]
    fn rejects_decreasing_timestamp() {
        let mut store = SeriesStore::new("a", "b");
        store.append(TrackId::A, sample(2.0, 10.0, 100)).unwrap();
        assert!(store.append(TrackId::A, sample(1.0, 10.0, 100)).is_err());
        // The series is untouched by the failed append.
        assert_eq!(store.series(TrackId::A).len(), 1);
    }

    #[test]
    fn tracks_are_independent() {
        let mut store = SeriesStore::new("a", "b");
        store.append(TrackId::A, sample(5.0, 10.0, 100)).unwrap();
        // B may lag behind A; only within-track order is enforced.
        store.append(TrackId::B, sample(1.0, 50.0, 200)).unwrap();
        assert_eq!(store.series(TrackId::B).len(), 1);
    }

    #[test]
    fn memory_mb_conversion() {
        let s = sample(0.0, 0.0, 100 * 1024 * 1024);
        assert!((s.memory_mb() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn into_series_keeps_labels() {
        let mut store = SeriesStore::new("left", "right");
        store.append(TrackId::B, sample(0.0, 1.0, 1)).unwrap();
        let ((label_a, series_a), (label_b, series_b)) = store.into_series();
        assert_eq!(label_a, "left");
        assert_eq!(label_b, "right");
        assert!(series_a.is_empty());
        assert_eq!(series_b.len(), 1);
    }
}
