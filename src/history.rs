use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use log::{debug, error, info, warn};

pub mod errors {
    use error_chain::error_chain;
    error_chain! {
        foreign_links {
            Io(std::io::Error);
        }
    }
}

use errors::*;

/// Separator between the expression and the result in the history log.
/// Not escaped, a field containing it will not survive a reload.
pub const DELIMITER: &str = ";;;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationEntry {
    pub expression: String,
    pub result: String,
}

impl CalculationEntry {
    pub fn new<E: Into<String>, R: Into<String>>(expression: E, result: R) -> CalculationEntry {
        CalculationEntry {
            expression: expression.into(),
            result: result.into(),
        }
    }

    /// Trailing empty fields are dropped before counting, so `a;;;` is
    /// malformed while `a;;;b;;;` still reads as `a`, `b`.
    fn from_line(line: &str) -> Option<CalculationEntry> {
        let mut fields: Vec<&str> = line.split(DELIMITER).collect();
        while fields.last() == Some(&"") {
            let _ = fields.pop();
        }
        match fields.as_slice() {
            [expression, result] => Some(CalculationEntry::new(*expression, *result)),
            _ => None,
        }
    }

    fn to_line(&self) -> String {
        format!("{}{}{}", self.expression, DELIMITER, self.result)
    }
}

/// Human readable form used by the history view and exports.
impl fmt::Display for CalculationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.expression, self.result)
    }
}

/// Ordered calculation history mirrored to a flat file.
///
/// The whole file is rewritten after every [`record`](HistoryStore::record),
/// there is no atomicity: a crash mid-write can leave it truncated.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<CalculationEntry>,
}

impl HistoryStore {

    /// Loads the log at `path`. A missing file gives an empty history, a file
    /// that cannot be opened is logged and also leaves the history empty.
    pub fn open<P: Into<PathBuf>>(path: P) -> HistoryStore {
        let path = path.into();
        let entries = match load(&path) {
            Ok(entries) => entries,
            Err(Error(ErrorKind::Io(ref e), _)) if e.kind() == IoErrorKind::NotFound => {
                debug!("no history at {}", path.display());
                Vec::new()
            }
            Err(e) => {
                error!("failed to load history: {}", e);
                Vec::new()
            }
        };
        info!("loaded {} history entries from {}", entries.len(), path.display());
        HistoryStore { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry and rewrites the log. The entry is kept in memory
    /// even when the rewrite fails.
    pub fn record(&mut self, entry: CalculationEntry) -> Result<()> {
        self.entries.push(entry);
        self.save().map_err(|e| {
            error!("failed to save history: {}", e);
            e
        })
    }

    /// Snapshot of the current entries, insertion ordered.
    pub fn list(&self) -> Vec<CalculationEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        let file = File::create(&self.path)
            .chain_err(|| format!("cannot open {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        for entry in &self.entries {
            writeln!(writer, "{}", entry.to_line())?;
        }
        writer.flush()?;
        debug!("wrote {} entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

/// Invalid UTF-8 is decoded lossily. A read failure part way through keeps
/// whatever was parsed before it.
fn load(path: &Path) -> Result<Vec<CalculationEntry>> {
    let file = File::open(path)?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).split(b'\n') {
        let bytes = match line {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("stopped reading {} after {} entries: {}", path.display(), entries.len(), e);
                break;
            }
        };
        let line = String::from_utf8_lossy(&bytes);
        let line = line.strip_suffix('\r').unwrap_or(&*line);
        match CalculationEntry::from_line(line) {
            Some(entry) => entries.push(entry),
            None => warn!("discarding malformed history line {:?}", line),
        }
    }
    Ok(entries)
}

/// Absolute form of `path` without touching the filesystem.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
