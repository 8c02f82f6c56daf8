//! procplot entry point.
//!
//! Resolves the two tracked processes, runs the sampling loop, and renders
//! the comparison chart.

use std::process::ExitCode;

use clap::Parser;
use log::{info, warn};

use procplot::chart::{self, ChartScene};
use procplot::metrics::{ProcessQuery, Sampler, SysinfoSource};
use procplot::signal;
use procplot::{Error, OutputTarget, RunConfig};

#[derive(Parser)]
#[command(name = "procplot")]
#[command(
    version,
    about = "Samples CPU and memory of two processes and renders a comparison chart",
    after_help = "EXAMPLES:
    # Compare two pids in an interactive window
    procplot 1234 5678

    # Locate by name, sample every 500ms for a minute, write an SVG
    procplot firefox mpv -i 0.5 -d 60 -o compare.svg

CPU percentages are per core, as reported by the OS: a process saturating
two cores reads as ~200%."
)]
struct Cli {
    /// First process: a pid, pid:N, or a process name
    process_a: String,

    /// Second process: a pid, pid:N, or a process name
    process_b: String,

    /// Seconds between samples
    #[arg(short, long, default_value_t = 1.0)]
    interval: f64,

    /// Stop sampling after this many seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Stop once either series holds this many samples
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// "display" for an interactive window, or a .svg path
    #[arg(short, long, default_value = "display")]
    output: String,

    /// Legend label for the first process (defaults to "name (pid)")
    #[arg(long)]
    label_a: Option<String>,

    /// Legend label for the second process (defaults to "name (pid)")
    #[arg(long)]
    label_b: Option<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> procplot::Result<()> {
    let config = RunConfig::new(cli.interval, cli.duration, cli.samples)?;
    let target = OutputTarget::parse(&cli.output);

    let source = SysinfoSource::new();
    let query_a = ProcessQuery::from(cli.process_a.as_str());
    let query_b = ProcessQuery::from(cli.process_b.as_str());
    let handle_a = source.resolve(&query_a);
    let handle_b = source.resolve(&query_b);
    if handle_a.is_none() && handle_b.is_none() {
        return Err(Error::NoProcessesResolvable(cli.process_a, cli.process_b));
    }
    for (query, handle) in [(&query_a, &handle_a), (&query_b, &handle_b)] {
        if handle.is_none() {
            warn!("\"{query}\" does not match a running process; its series will stay empty");
        }
    }

    let label_a = cli
        .label_a
        .or_else(|| handle_a.as_ref().map(|h| h.label.clone()))
        .unwrap_or_else(|| query_a.to_string());
    let label_b = cli
        .label_b
        .or_else(|| handle_b.as_ref().map(|h| h.label.clone()))
        .unwrap_or_else(|| query_b.to_string());

    info!(
        "sampling \"{label_a}\" and \"{label_b}\" every {:?} (Ctrl+C to stop and render)",
        config.interval
    );

    let cancel = signal::install_handler()?;
    let sampler = Sampler::new(source, config, handle_a, label_a, handle_b, label_b, cancel);
    let output = sampler.run()?;

    let scene = ChartScene::from_output(&output);
    chart::render(&target, &scene)?;
    if let OutputTarget::File(path) = &target {
        info!("chart written to {}", path.display());
    }
    Ok(())
}
