//! File backend: emits the scene as a standalone SVG.
//!
//! The document is assembled entirely in memory and written with a single
//! `fs::write`, so a failed render leaves no partial artifact behind. Output
//! is a pure function of the scene.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use crate::chart::{ChartBackend, ChartScene, Panel};
use crate::error::{Error, Result};

const WIDTH: f64 = 1100.0;
const HEIGHT: f64 = 700.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 25.0;
const PANEL_TOP: f64 = 40.0;
const PANEL_BOTTOM: f64 = 45.0;

// Blue and orange, one per tracked process.
const LINE_COLORS: [&str; 2] = ["#1f77b4", "#ff7f0e"];

pub struct SvgBackend {
    path: PathBuf,
}

impl SvgBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ChartBackend for SvgBackend {
    fn render(&mut self, scene: &ChartScene) -> Result<()> {
        let svg = scene_to_svg(scene);
        fs::write(&self.path, svg).map_err(|source| Error::ChartWrite {
            path: self.path.clone(),
            source,
        })
    }
}

struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Renders the whole scene into an SVG document string.
pub fn scene_to_svg(scene: &ChartScene) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(out, r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/>"#);

    let panel_h = HEIGHT / 2.0;
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = panel_h - PANEL_TOP - PANEL_BOTTOM;

    let cpu_rect = Rect {
        x: MARGIN_LEFT,
        y: PANEL_TOP,
        w: plot_w,
        h: plot_h,
    };
    let memory_rect = Rect {
        x: MARGIN_LEFT,
        y: panel_h + PANEL_TOP,
        w: plot_w,
        h: plot_h,
    };

    panel_to_svg(&mut out, &scene.cpu, &cpu_rect, None);
    panel_to_svg(&mut out, &scene.memory, &memory_rect, Some(&scene.x_label));

    out.push_str("</svg>\n");
    out
}

fn panel_to_svg(out: &mut String, panel: &Panel, rect: &Rect, x_label: Option<&str>) {
    let map_x = |v: f64| rect.x + (v - panel.x_range[0]) / span(panel.x_range) * rect.w;
    let map_y = |v: f64| rect.y + rect.h - (v - panel.y_range[0]) / span(panel.y_range) * rect.h;

    // Title.
    let _ = writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="16">{}</text>"#,
        rect.x + rect.w / 2.0,
        rect.y - 14.0,
        escape(&panel.title)
    );

    // Grid and tick labels.
    for t in ticks(panel.x_range, 8) {
        let x = map_x(t);
        let _ = writeln!(
            out,
            r##"<line x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}" stroke="#dddddd"/>"##,
            rect.y,
            rect.y + rect.h
        );
        let _ = writeln!(
            out,
            r#"<text x="{x:.2}" y="{:.2}" text-anchor="middle" font-size="11">{}</text>"#,
            rect.y + rect.h + 16.0,
            tick_label(t, panel.x_range)
        );
    }
    for t in ticks(panel.y_range, 5) {
        let y = map_y(t);
        let _ = writeln!(
            out,
            r##"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="#dddddd"/>"##,
            rect.x,
            rect.x + rect.w
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="end" font-size="11">{}</text>"#,
            rect.x - 6.0,
            y + 4.0,
            tick_label(t, panel.y_range)
        );
    }

    // Frame.
    let _ = writeln!(
        out,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black"/>"#,
        rect.x, rect.y, rect.w, rect.h
    );

    // Axis labels.
    let _ = writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="13" transform="rotate(-90 {0:.2} {1:.2})">{2}</text>"#,
        rect.x - 48.0,
        rect.y + rect.h / 2.0,
        escape(&panel.y_label)
    );
    if let Some(label) = x_label {
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="13">{}</text>"#,
            rect.x + rect.w / 2.0,
            rect.y + rect.h + 36.0,
            escape(label)
        );
    }

    // Curves. A single sample has no line to draw, so it becomes a marker.
    for (line, color) in panel.lines.iter().zip(LINE_COLORS.iter().cycle()) {
        match line.points.as_slice() {
            [] => {}
            [p] => {
                let _ = writeln!(
                    out,
                    r#"<circle cx="{:.2}" cy="{:.2}" r="3" fill="{color}"/>"#,
                    map_x(p[0]),
                    map_y(p[1])
                );
            }
            points => {
                let mut path = String::new();
                for p in points {
                    let _ = write!(path, "{:.2},{:.2} ", map_x(p[0]), map_y(p[1]));
                }
                let _ = writeln!(
                    out,
                    r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="1.5"/>"#,
                    path.trim_end()
                );
            }
        }
    }

    // Legend, top-right inside the frame.
    for (i, (line, color)) in panel.lines.iter().zip(LINE_COLORS.iter().cycle()).enumerate() {
        let y = rect.y + 16.0 + i as f64 * 18.0;
        let x = rect.x + rect.w - 180.0;
        let _ = writeln!(
            out,
            r#"<line x1="{x:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{color}" stroke-width="2"/>"#,
            x + 22.0
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" font-size="12">{}</text>"#,
            x + 28.0,
            y + 4.0,
            escape(&line.label)
        );
    }
}

fn span(range: [f64; 2]) -> f64 {
    range[1] - range[0]
}

/// Tick positions at a "nice" step (1/2/5 times a power of ten) covering the
/// range with roughly `target` divisions.
fn ticks(range: [f64; 2], target: usize) -> Vec<f64> {
    let raw = span(range) / target as f64;
    let pow = 10f64.powf(raw.log10().floor());
    let step = match raw / pow {
        m if m <= 1.0 => pow,
        m if m <= 2.0 => 2.0 * pow,
        m if m <= 5.0 => 5.0 * pow,
        _ => 10.0 * pow,
    };
    let mut t = (range[0] / step).ceil() * step;
    let mut out = Vec::new();
    while t <= range[1] + step * 1e-9 {
        // Avoid "-0" labels.
        out.push(if t == 0.0 { 0.0 } else { t });
        t += step;
    }
    out
}

fn tick_label(value: f64, range: [f64; 2]) -> String {
    let decimals = if span(range) >= 10.0 {
        0
    } else if span(range) >= 1.0 {
        1
    } else {
        2
    };
    format!("{value:.decimals$}")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
