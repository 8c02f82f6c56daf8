//! Chart construction and rendering.
//!
//! A [`ChartScene`] is a pure description of the artifact: two stacked panels
//! (CPU %, RSS MB), each overlaying both processes against their own
//! timestamps. Backends only draw what the scene says, so identical series
//! always produce structurally identical output.

pub mod svg;
pub mod window;

use crate::config::OutputTarget;
use crate::error::{Error, Result};
use crate::metrics::sampler::SamplerOutput;
use crate::metrics::Series;

/// One labeled curve: `[elapsed seconds, value]` points in sample order. No
/// resampling or interpolation between the two processes' timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLine {
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

/// One panel of the chart with its autoscaled axis ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub y_label: String,
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    pub lines: Vec<SeriesLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartScene {
    pub cpu: Panel,
    pub memory: Panel,
    pub x_label: String,
}

impl ChartScene {
    /// Lays the two series out into the CPU and memory panels. Empty or
    /// single-point series yield a degenerate but valid scene.
    pub fn build(series_a: &Series, label_a: &str, series_b: &Series, label_b: &str) -> Self {
        let cpu_lines = vec![
            cpu_line(series_a, label_a),
            cpu_line(series_b, label_b),
        ];
        let memory_lines = vec![
            memory_line(series_a, label_a),
            memory_line(series_b, label_b),
        ];

        // Both panels share the time axis.
        let x_range = axis_range(
            cpu_lines
                .iter()
                .flat_map(|l| l.points.iter().map(|p| p[0])),
        );
        let cpu_range = axis_range(
            cpu_lines
                .iter()
                .flat_map(|l| l.points.iter().map(|p| p[1])),
        );
        let memory_range = axis_range(
            memory_lines
                .iter()
                .flat_map(|l| l.points.iter().map(|p| p[1])),
        );

        Self {
            cpu: Panel {
                title: "CPU usage over time".to_string(),
                y_label: "CPU (%)".to_string(),
                x_range,
                y_range: cpu_range,
                lines: cpu_lines,
            },
            memory: Panel {
                title: "Memory usage (RSS) over time".to_string(),
                y_label: "RSS (MB)".to_string(),
                x_range,
                y_range: memory_range,
                lines: memory_lines,
            },
            x_label: "Time (seconds)".to_string(),
        }
    }

    pub fn from_output(output: &SamplerOutput) -> Self {
        Self::build(
            &output.series_a,
            &output.label_a,
            &output.series_b,
            &output.label_b,
        )
    }
}

fn cpu_line(series: &Series, label: &str) -> SeriesLine {
    SeriesLine {
        label: label.to_string(),
        points: series
            .iter()
            .map(|s| [s.elapsed.as_secs_f64(), f64::from(s.cpu_percent)])
            .collect(),
    }
}

fn memory_line(series: &Series, label: &str) -> SeriesLine {
    SeriesLine {
        label: label.to_string(),
        points: series
            .iter()
            .map(|s| [s.elapsed.as_secs_f64(), s.memory_mb()])
            .collect(),
    }
}

/// Autoscaled range with a 5% margin; no forced zero baseline. Falls back to
/// a unit range when there is no data, and widens flat data so a constant
/// curve still sits inside a visible span.
fn axis_range(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        return [0.0, 1.0];
    }
    let span = max - min;
    let pad = if span == 0.0 {
        (min.abs() * 0.05).max(0.5)
    } else {
        span * 0.05
    };
    [min - pad, max + pad]
}

/// The thin drawing interface the core depends on: a backend consumes one
/// scene and produces exactly one artifact or fails.
pub trait ChartBackend {
    fn render(&mut self, scene: &ChartScene) -> Result<()>;
}

/// Picks a backend for the configured destination and renders the scene.
pub fn render(target: &OutputTarget, scene: &ChartScene) -> Result<()> {
    match target {
        OutputTarget::Display => window::ChartWindow::default().render(scene),
        OutputTarget::File(path) => match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => {
                svg::SvgBackend::new(path.clone()).render(scene)
            }
            _ => Err(Error::UnsupportedFormat(path.clone())),
        },
    }
}
