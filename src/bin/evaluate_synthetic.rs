//! Evaluate the perceptron BTB against static baselines on a few
//! synthetic workloads.

use std::path::{ Path, PathBuf };

use anyhow::{ Context, Result };
use clap::Parser;
use tracing_subscriber::EnvFilter;

use synapse::*;
use synapse::trace::synthetic::*;

#[derive(Parser)]
#[command(name = "evaluate-synthetic", version)]
struct Cli {
    /// Passes over each workload's branches
    #[arg(short = 'n', long, default_value_t = 1000)]
    iterations: usize,

    /// Seed for random outcomes and the random baseline
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Optional JSON simulator configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn workloads(cfg: &SimConfig, seed: u64) -> Vec<(&'static str, SyntheticTrace)> {
    use synapse::Outcome::*;
    let mut res = Vec::new();

    let mut t = SyntheticTrace::new(seed);
    t.branch(0x4000_1000, BranchPattern::NotTakenPeriodic(8));
    res.push(("loop", t));

    let mut t = SyntheticTrace::new(seed);
    t.branch(0x4000_1000, BranchPattern::TakenPeriodic(2))
     .branch(0x4000_1010, BranchPattern::Pattern(vec![T, T, N]))
     .branch(0x4000_1020, BranchPattern::AlwaysTaken);
    res.push(("periodic", t));

    // Two always-taken branches that share a slot
    let mut t = SyntheticTrace::new(seed);
    t.branch(0x4000_1000, BranchPattern::AlwaysTaken)
     .branch(0x4000_1000 + cfg.btb_size, BranchPattern::AlwaysTaken);
    res.push(("aliasing", t));

    let mut t = SyntheticTrace::new(seed);
    t.branch(0x4000_2000, BranchPattern::Random(0.5))
     .branch(0x4000_3000, BranchPattern::AlwaysTaken);
    res.push(("random", t));

    res
}

fn baseline(records: &[BranchRecord], p: &mut impl SimplePredictor) -> (String, f64) {
    let correct = records.iter()
        .filter(|r| p.predict(r.pc) == r.outcome())
        .count();
    (p.name().to_string(), correct as f64 / records.len().max(1) as f64)
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    for (name, mut workload) in workloads(&cfg, cli.seed) {
        let trace = workload.compile(name, cli.iterations);
        let mut sim = Simulator::new(cfg.clone())?;
        sim.run(trace.events(), 0);
        let c = *sim.counters();

        println!("[*] {} ({} branches, {} records)",
            name, workload.branches().len(), trace.num_entries());
        println!("  {:20} {:6.2}% correct, BTB hit rate {:6.2}%, {} replacements",
            "PerceptronBTB",
            c.accuracy().unwrap_or(0.0) * 100.0,
            c.hit_rate().unwrap_or(0.0) * 100.0,
            c.replaced,
        );

        let records = trace.as_slice();
        let results = [
            baseline(records, &mut StaticPredictor::taken()),
            baseline(records, &mut StaticPredictor::not_taken()),
            baseline(records, &mut RandomPredictor::seeded(cli.seed)),
        ];
        for (pname, rate) in results {
            println!("  {:20} {:6.2}% correct", pname, rate * 100.0);
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_errors_name_the_file() {
        assert_eq!(load_config(None).unwrap(), SimConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "btb_size": 3 }"#).unwrap();
        let msg = format!("{:#}", load_config(Some(path.as_path())).unwrap_err());
        assert!(msg.contains(&path.display().to_string()), "{}", msg);
        assert!(msg.contains("power of two"), "{}", msg);
    }
}
