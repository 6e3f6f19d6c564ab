//! Replay one or more binary traces through a perceptron BTB and write the
//! end-of-run report.

use std::path::PathBuf;

use anyhow::{ Context, Result };
use clap::Parser;
use tracing_subscriber::EnvFilter;

use synapse::*;

#[derive(Parser)]
#[command(
    name = "simulate",
    version,
    about = "Collect BTB and perceptron prediction statistics for branch traces"
)]
struct Cli {
    /// Binary trace files, replayed in order as one stream
    #[arg(required = true, value_name = "TRACE")]
    traces: Vec<PathBuf>,

    /// Report file name
    #[arg(short, long, default_value = "output.out")]
    output: PathBuf,

    /// Append the process id to the report file name
    #[arg(short = 'i', long)]
    pid: bool,

    /// Stop after this many branches (0 means no limit)
    #[arg(short, long, default_value_t = 0)]
    limit: u64,

    /// JSON simulator configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of BTB entries (power of two)
    #[arg(long)]
    btb_size: Option<usize>,

    /// Length of the global history register
    #[arg(long)]
    history_length: Option<usize>,

    /// Perceptron training threshold
    #[arg(long)]
    theta: Option<f32>,

    /// Clear a slot's weights when a different branch takes it over
    #[arg(long)]
    reset_weights: bool,

    /// Also write the report as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

impl Cli {
    fn sim_config(&self) -> Result<SimConfig> {
        let mut cfg = match &self.config {
            Some(path) => SimConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SimConfig::default(),
        };
        if let Some(n) = self.btb_size { cfg.btb_size = n; }
        if let Some(n) = self.history_length { cfg.history_length = n; }
        if let Some(t) = self.theta { cfg.theta = Some(t); }
        if self.reset_weights { cfg.weight_policy = WeightPolicy::Reset; }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Load every trace, naming the offending file on failure.
fn load_traces(paths: &[PathBuf]) -> Result<Vec<BinaryTrace>> {
    let set = BinaryTraceSet::new_from_slice(paths);
    paths.iter().zip(set)
        .map(|(path, trace)| trace.with_context(|| {
            format!("Failed to load trace {}", path.display())
        }))
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = cli.sim_config()?;
    let mut sim = Simulator::new(cfg)?;

    let traces = load_traces(&cli.traces)?;
    for trace in traces.iter() {
        println!("[*] {}, {} records", trace.name(), trace.num_entries());
        if trace.num_invalid() != 0 {
            println!("    {} records with invalid flags will be skipped",
                trace.num_invalid());
        }
    }

    let events = traces.iter().flat_map(|t| t.events());
    let reason = sim.run(events, cli.limit);
    let report = Report::new(reason, sim.snapshot());

    let path = output_path(&cli.output, cli.pid);
    report.save_text(&path)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    if let Some(json) = &cli.json {
        report.save_json(json)
            .with_context(|| format!("Failed to write report {}", json.display()))?;
    }

    let snapshot = sim.snapshot();
    let c = &report.counters;
    let pct = |r: Option<f64>| r.map(|r| format!("{:.2}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    println!("Reason:            {}", report.reason);
    println!("Branches:          {} ({} taken)", c.seen, c.taken);
    println!("Accuracy:          {} ({} mispredicted)",
        pct(report.accuracy), c.mispredicted());
    println!("BTB hit rate:      {}", pct(report.hit_rate));
    println!("BTB occupancy:     {}/{}", snapshot.occupancy(), snapshot.slots.len());
    println!("BTB replacements:  {}", c.replaced);
    println!("Most replaced slots:");
    for (idx, slot) in snapshot.most_replaced(4) {
        println!("  {:4}: {}", idx, slot.replace_count);
    }
    println!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn load_errors_name_the_trace() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.trace");
        let missing = dir.path().join("missing.trace");
        BinaryTrace::from_records("good", vec![
            BranchRecord::new(0x1000, 0x1100, BranchKind::DirectBranch, Outcome::T),
        ]).save(&good).unwrap();

        let traces = load_traces(&[good.clone()]).unwrap();
        assert_eq!(traces[0].num_entries(), 1);

        let err = load_traces(&[good, missing.clone()]).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains(&missing.display().to_string()), "{}", msg);
    }
}
