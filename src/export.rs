use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use lazy_static::lazy_static;
use regex::Regex;
use log::{debug, info};

use crate::history::{self, CalculationEntry, HistoryStore};

pub mod errors {
    use error_chain::error_chain;
    error_chain! {
        errors {
            MissingDestination {
                description("No destination given"),
                display("a file name or path is required for saving"),
            }
        }

        foreign_links {
            Io(std::io::Error);
        }
    }
}

use errors::*;

lazy_static! {
    static ref FILE_EXTENSION: Regex = Regex::new(r"(?i)\.(txt|log|md)$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Written { path: PathBuf, count: usize },
    /// Blank destination on a full export: nothing written, this is where
    /// the persisted history already lives.
    LogLocation(PathBuf),
    NothingSelected,
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportOutcome::Written { path, .. } => {
                write!(f, "History saved to file: {}", path.display())
            }
            ExportOutcome::LogLocation(path) => {
                write!(f, "The persistent history file is stored here: {}", path.display())
            }
            ExportOutcome::NothingSelected => {
                f.write_str("No valid entries were selected for export.")
            }
        }
    }
}

/// Writes history entries to user-chosen files.
#[derive(Debug, Clone)]
pub struct Exporter {
    file_name: String,
}

impl Exporter {

    /// `file_name` is used when a destination resolves to a directory.
    pub fn new<S: Into<String>>(file_name: S) -> Exporter {
        Exporter { file_name: file_name.into() }
    }

    /// Turns free-form input into a destination file:
    /// absolute paths are kept, a trailing separator means a directory,
    /// a `.txt`/`.log`/`.md` suffix means a file relative to the working
    /// directory, and anything else is taken as a directory name.
    pub fn resolve_path(&self, input: &str) -> PathBuf {
        let path = Path::new(input);
        if path.is_absolute() {
            path.to_path_buf()
        } else if input.ends_with('/') || input.ends_with('\\') {
            path.join(&self.file_name)
        } else if FILE_EXTENSION.is_match(input) {
            path.to_path_buf()
        } else {
            path.join(&self.file_name)
        }
    }

    pub fn export_all(&self, history: &HistoryStore, destination: &str) -> Result<ExportOutcome> {
        if destination.trim().is_empty() {
            return Ok(ExportOutcome::LogLocation(history::absolute(history.path())));
        }
        self.write(destination, &history.list())
    }

    /// `indices` are 1-based; positions outside the history are dropped.
    pub fn export_selected(
        &self,
        history: &HistoryStore,
        destination: &str,
        indices: &[i32],
    ) -> Result<ExportOutcome> {
        if destination.trim().is_empty() {
            return Err(ErrorKind::MissingDestination.into());
        }

        let entries = history.list();
        let selected: Vec<CalculationEntry> = indices
            .iter()
            .filter(|&&i| i >= 1 && i as usize <= entries.len())
            .map(|&i| entries[i as usize - 1].clone())
            .collect();
        debug!("selected {} of {} requested entries", selected.len(), indices.len());

        if selected.is_empty() {
            return Ok(ExportOutcome::NothingSelected);
        }
        self.write(destination, &selected)
    }

    fn write(&self, destination: &str, entries: &[CalculationEntry]) -> Result<ExportOutcome> {
        let path = self.resolve_path(destination);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .chain_err(|| format!("cannot create directory {}", parent.display()))?;
        }

        let file = File::create(&path)
            .chain_err(|| format!("cannot create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()?;

        let path = history::absolute(&path);
        info!("exported {} entries to {}", entries.len(), path.display());
        Ok(ExportOutcome::Written { path, count: entries.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn store_with(dir: &Path, count: usize) -> HistoryStore {
        let mut store = HistoryStore::open(dir.join("history.log"));
        for i in 1..=count {
            store.record(CalculationEntry::new(format!("{}+{}", i, i), (2 * i).to_string())).unwrap();
        }
        store
    }

    #[test]
    fn test_resolve_path() {
        let exporter = Exporter::new("log.log");
        let cases = vec![
            ("out/", PathBuf::from("out/log.log")),
            ("report.txt", PathBuf::from("report.txt")),
            ("NOTES.MD", PathBuf::from("NOTES.MD")),
            ("logs/run.Log", PathBuf::from("logs/run.Log")),
            ("myfolder", PathBuf::from("myfolder/log.log")),
            ("data.csv", PathBuf::from("data.csv/log.log")),
            ("/abs/path/x.log", PathBuf::from("/abs/path/x.log")),
            ("/abs/path/dir", PathBuf::from("/abs/path/dir")),
        ];
        for (input, expected) in cases {
            assert_eq!(exporter.resolve_path(input), expected, "input {:?}", input);
        }
    }

    #[test]
    fn export_all_writes_every_entry() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), 3);
        let target = dir.path().join("nested/deeper/all.txt");
        let outcome = Exporter::new("log.log")
            .export_all(&store, target.to_str().unwrap())
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Written { path: target.clone(), count: 3 });
        assert_eq!(fs::read_to_string(&target).unwrap(), "1+1 -> 2\n2+2 -> 4\n3+3 -> 6\n");
    }

    #[test]
    fn export_all_blank_reports_log_location() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), 1);
        let outcome = Exporter::new("log.log").export_all(&store, "   ").unwrap();
        assert_eq!(outcome, ExportOutcome::LogLocation(dir.path().join("history.log")));
        assert!(outcome.to_string().contains("history.log"));
    }

    #[test]
    fn export_selected_drops_out_of_range() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), 4);
        let target = dir.path().join("picked.md");
        let outcome = Exporter::new("log.log")
            .export_selected(&store, target.to_str().unwrap(), &[1, 3, 5])
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Written { path: target.clone(), count: 2 });
        assert_eq!(fs::read_to_string(&target).unwrap(), "1+1 -> 2\n3+3 -> 6\n");
    }

    #[test]
    fn export_selected_nothing_selected() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), 2);
        let target = dir.path().join("none.txt");
        let outcome = Exporter::new("log.log")
            .export_selected(&store, target.to_str().unwrap(), &[10, 0, -1])
            .unwrap();
        assert_eq!(outcome, ExportOutcome::NothingSelected);
        assert!(!target.exists());
    }

    #[test]
    fn export_selected_requires_destination() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), 2);
        match Exporter::new("log.log").export_selected(&store, "", &[1]) {
            Err(Error(ErrorKind::MissingDestination, _)) => (),
            other => panic!("expected missing destination, got {:?}", other),
        }
    }

    #[test]
    fn export_write_failure_is_an_error() {
        init_log();
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), 1);
        let blocker = dir.path().join("blocker.txt");
        fs::write(&blocker, "").unwrap();
        let target = blocker.join("x.txt");
        assert!(Exporter::new("log.log").export_all(&store, target.to_str().unwrap()).is_err());
    }
}
