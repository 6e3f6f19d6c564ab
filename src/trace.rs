
pub mod synthetic;

use std::fs::File;
use std::io::{ BufWriter, Write };
use std::path::{ Path, PathBuf };

use tracing::{ debug, warn };

use crate::branch::*;
use crate::error::{ Result, TraceError };

/// A list of trace files, loaded one at a time.
pub struct BinaryTraceSet {
    /// A list of filenames
    pub files: Vec<PathBuf>,

    cur: usize,
}
impl BinaryTraceSet {
    pub fn new() -> Self {
        Self { files: Vec::new(), cur: 0 }
    }

    pub fn new_from_slice(paths: &[PathBuf]) -> Self {
        Self { files: paths.to_vec(), cur: 0 }
    }

    pub fn add_file(&mut self, p: impl Into<PathBuf>) {
        self.files.push(p.into());
    }
}
impl Default for BinaryTraceSet {
    fn default() -> Self { Self::new() }
}
impl Iterator for BinaryTraceSet {
    type Item = Result<BinaryTrace>;
    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.get(self.cur)?;
        self.cur += 1;
        Some(BinaryTrace::from_file(path))
    }
}


/// A sequence of [BranchRecord] loaded from (or destined for) a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryTrace {
    records: Vec<BranchRecord>,
    name: String,
}
impl BinaryTrace {
    pub fn from_records(name: impl ToString, records: Vec<BranchRecord>) -> Self {
        Self { records, name: name.to_string() }
    }

    /// Create a [BinaryTrace] from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let records = decode(path, &data)?;
        debug!(path = %path.display(), records = records.len(), "loaded trace");
        Ok(Self { records, name })
    }

    /// Decode a trace from a buffer. 'name' is used in error messages.
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<Self> {
        let records = decode(Path::new(name), data)?;
        Ok(Self { records, name: name.to_string() })
    }

    /// Return the number of records
    pub fn num_entries(&self) -> usize { self.records.len() }

    pub fn name(&self) -> &str { &self.name }

    /// Return a slice of records.
    pub fn as_slice(&self) -> &[BranchRecord] { &self.records }

    /// Number of records whose flags don't name a [BranchKind].
    ///
    /// Traces read by [BinaryTrace::from_file] never have any, but one
    /// built with [BinaryTrace::from_records] might.
    pub fn num_invalid(&self) -> usize {
        self.records.iter().filter(|r| r.kind().is_none()).count()
    }

    /// Iterate over the records as [BranchEvent]s, skipping (and logging)
    /// records counted by [BinaryTrace::num_invalid].
    pub fn events(&self) -> impl Iterator<Item = BranchEvent> + '_ {
        self.records.iter().enumerate().filter_map(|(idx, r)| {
            match BranchEvent::try_from(r) {
                Ok(ev) => Some(ev),
                Err(flags) => {
                    warn!(file = %self.name, idx, flags, "skipping record with invalid flags");
                    None
                },
            }
        })
    }

    pub fn write_to(&self, w: &mut impl Write) -> std::io::Result<()> {
        for r in self.records.iter() {
            w.write_all(&r.to_bytes())?;
        }
        Ok(())
    }

    /// Write the trace to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }
}

fn decode(path: &Path, data: &[u8]) -> std::result::Result<Vec<BranchRecord>, TraceError> {
    if data.len() % BranchRecord::SIZE != 0 {
        return Err(TraceError::Truncated {
            path: path.to_path_buf(),
            len: data.len(),
        });
    }
    data.chunks_exact(BranchRecord::SIZE).enumerate()
        .map(|(idx, chunk)| {
            let mut buf = [0u8; BranchRecord::SIZE];
            buf.copy_from_slice(chunk);
            BranchRecord::from_bytes(&buf).ok_or(TraceError::InvalidFlags {
                flags: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
                offset: idx * BranchRecord::SIZE,
            })
        })
        .collect()
}
