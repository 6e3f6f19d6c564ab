//! Writing the end-of-run report.

use std::fs::File;
use std::io::{ BufWriter, Write };
use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };
use tracing::info;

use crate::error::Result;
use crate::stats::*;

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The event source was exhausted.
    Fini,
    /// The configured branch limit was reached.
    LimitReached,
}
impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::Fini => "fini",
            Self::LimitReached => "limit reached",
        };
        write!(f, "{}", s)
    }
}

/// Everything written out at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub reason: StopReason,
    pub counters: Counters,
    pub hit_rate: Option<f64>,
    pub miss_rate: Option<f64>,
    pub accuracy: Option<f64>,
    pub slots: Vec<SlotStats>,
}
impl Report {
    pub fn new(reason: StopReason, snapshot: Snapshot) -> Self {
        let c = snapshot.counters;
        Self {
            reason,
            counters: c,
            hit_rate: c.hit_rate(),
            miss_rate: c.miss_rate(),
            accuracy: c.accuracy(),
            slots: snapshot.slots,
        }
    }

    /// Write the plain-text report: aggregate counters, derived
    /// percentages, then one `BTB entry: <index>;<valid>;<replacements>`
    /// line per slot. Undefined percentages are written as `nan`.
    pub fn write_text(&self, w: &mut impl Write) -> std::io::Result<()> {
        let c = &self.counters;
        writeln!(w, "Reason: {}", self.reason)?;
        writeln!(w, "Count Seen: {}", c.seen)?;
        writeln!(w, "Count Taken: {}", c.taken)?;
        writeln!(w, "Count Correct: {}", c.correct)?;
        writeln!(w, "Count Replaced: {}", c.replaced)?;
        writeln!(w, "BTB Hit: {}", c.hits)?;
        writeln!(w, "BTB Miss: {}", c.misses)?;
        writeln!(w, "BTB Miss Rate: {}", percent(self.miss_rate))?;
        writeln!(w, "Prediction Accuracy Percentage: {}", percent(self.accuracy))?;
        for (idx, slot) in self.slots.iter().enumerate() {
            writeln!(w, "BTB entry: {};{};{}",
                idx, slot.valid as u8, slot.replace_count
            )?;
        }
        Ok(())
    }

    pub fn write_json(&self, w: &mut impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *w, self)?;
        writeln!(w)?;
        Ok(())
    }

    /// Write the text report to 'path'.
    pub fn save_text(&self, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_text(&mut w)?;
        w.flush()?;
        info!(path = %path.display(), "wrote report");
        Ok(())
    }

    /// Write the JSON report to 'path'.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_json(&mut w)?;
        w.flush()?;
        info!(path = %path.display(), "wrote JSON report");
        Ok(())
    }
}

fn percent(rate: Option<f64>) -> String {
    match rate {
        Some(r) => general((r * 100.0) as f32, 6),
        None => "nan".to_string(),
    }
}

/// Format 'v' with 'digits' significant digits and no trailing zeros,
/// switching to an exponent for very large or small magnitudes (the
/// same rules as C's `%g`).
fn general(v: f32, digits: usize) -> String {
    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp) as usize;
        trim_zeros(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// The report path, with `.<pid>` appended when 'with_pid' is set.
pub fn output_path(base: &Path, with_pid: bool) -> PathBuf {
    if !with_pid {
        return base.to_path_buf();
    }
    let mut s = base.as_os_str().to_owned();
    s.push(format!(".{}", std::process::id()));
    PathBuf::from(s)
}
