use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::stats::Stats;
use crate::table::Table;

/// Final per-key results, sorted byte-wise by key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    entries: Vec<(Box<[u8]>, Stats)>,
}

impl Summary {
    pub fn from_table(table: Table) -> Self {
        let mut entries: Vec<_> = table.into_entries().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Option<&Stats> {
        self.entries
            .binary_search_by(|(k, _)| (**k).cmp(key))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&[u8], &Stats)> {
        self.entries.iter().map(|(key, stats)| (&**key, stats))
    }

    /// Write the rendered report plus a trailing newline.
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "{}", self)?;
        out.flush()
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        let to_error = |source| Error::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(to_error)?;
        self.write_to(BufWriter::new(file)).map_err(to_error)
    }
}

/// A tenths quantity printed with one decimal. Rounds half away from zero and
/// never prints `-0.0`.
struct Tenths(f64);

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round() / 10.0;
        let rounded = if rounded == 0.0 { 0.0 } else { rounded };
        write!(f, "{:.1}", rounded)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, stats)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{}={}/{}/{}",
                String::from_utf8_lossy(key),
                Tenths(stats.min() as f64),
                Tenths(stats.mean()),
                Tenths(stats.max() as f64)
            )?;
        }
        f.write_str("}")
    }
}
