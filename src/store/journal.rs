//! Durable repository: in-memory state plus an append-only journal.
//!
//! Every successful mutation appends one JSON line to the journal and
//! flushes it. Opening a journal replays it line by line into a fresh
//! [`MemoryStore`]. Rows are never rewritten; deleting an experiment appends
//! an `experiment_deleted` event and replay applies the cascade again.
//!
//! A crash in the middle of an append leaves an unterminated last line.
//! Opening such a journal drops that line (truncating the file back to the
//! last complete event) instead of refusing to open.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ExperimentRepository, MemoryStore};
use crate::experiment::{
    AssignmentRecord, ConversionRecord, ExperimentRecord, SubjectId, VariantRecord,
};
use crate::{Error, Result};

/// One line of the journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEvent {
    /// An experiment was registered.
    ExperimentCreated(ExperimentRecord),
    /// A variant was appended to an experiment.
    VariantAdded(VariantRecord),
    /// An experiment was registered together with its variants.
    ExperimentInstalled {
        /// Experiment record
        experiment: ExperimentRecord,
        /// Variants in declaration order
        variants: Vec<VariantRecord>,
    },
    /// An experiment and everything it owns was removed.
    ExperimentDeleted {
        /// Experiment name
        name: String,
    },
    /// A subject was assigned to a variant.
    Assigned(AssignmentRecord),
    /// An assignment converted.
    Converted(ConversionRecord),
}

impl JournalEvent {
    fn apply(self, store: &MemoryStore) -> Result<()> {
        match self {
            Self::ExperimentCreated(record) => store.create_experiment(record),
            Self::VariantAdded(record) => store.add_variant(record),
            Self::ExperimentInstalled {
                experiment,
                variants,
            } => store.install_experiment(experiment, variants),
            Self::ExperimentDeleted { name } => store.delete_experiment(&name).map(|_| ()),
            Self::Assigned(record) => store.insert_assignment(record),
            Self::Converted(record) => store.insert_conversion(record),
        }
    }
}

/// Fix-up needed for a journal whose last line has no newline.
#[derive(Debug, PartialEq, Eq)]
enum TailRepair {
    /// Unparseable tail: cut the file back to this length.
    Truncate(u64),
    /// Complete event missing its newline: terminate it before appending.
    Terminate,
}

/// Replay journal bytes into `state`, returning the number of events applied
/// and the repair the file tail needs, if any.
fn replay(bytes: &[u8], state: &MemoryStore) -> Result<(usize, Option<TailRepair>)> {
    let terminated = bytes.is_empty() || bytes.ends_with(b"\n");
    let lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    let last = lines.len() - 1;

    let mut replayed = 0usize;
    let mut offset = 0usize;
    for (idx, line) in lines.iter().enumerate() {
        let start = offset;
        offset += line.len() + 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let torn = idx == last && !terminated;
        let event: JournalEvent = match serde_json::from_slice(line) {
            Ok(event) => event,
            Err(_) if torn => return Ok((replayed, Some(TailRepair::Truncate(start as u64)))),
            Err(e) => {
                return Err(Error::Corrupt {
                    line: idx + 1,
                    reason: e.to_string(),
                })
            }
        };
        event.apply(state).map_err(|e| Error::Corrupt {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        replayed += 1;
        if torn {
            return Ok((replayed, Some(TailRepair::Terminate)));
        }
    }
    Ok((replayed, None))
}

/// Repository persisted as a JSON-lines journal.
///
/// Reads are served from memory. Writes are serialized through the journal
/// writer lock so the file order matches the order the in-memory state
/// accepted them in.
///
/// # Example
///
/// ```rust,no_run
/// use pal_abtest::experiment::ExperimentRecord;
/// use pal_abtest::store::{ExperimentRepository, JournalStore};
///
/// # fn example() -> pal_abtest::Result<()> {
/// let store = JournalStore::open("/var/lib/pal/abtest.jsonl")?;
/// store.create_experiment(ExperimentRecord::new("onboarding_flow"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JournalStore {
    path: PathBuf,
    state: MemoryStore,
    writer: Mutex<BufWriter<File>>,
}

impl JournalStore {
    /// Open (or create) the journal at `path` and replay it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or read and
    /// [`Error::Corrupt`] if a complete line cannot be parsed or replayed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = MemoryStore::new();

        let (replayed, repair) = if path.exists() {
            replay(&fs::read(&path)?, &state)?
        } else {
            (0, None)
        };

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        match repair {
            Some(TailRepair::Truncate(len)) => {
                warn!(path = %path.display(), len, "Dropped torn journal tail");
                file.set_len(len)?;
            }
            Some(TailRepair::Terminate) => {
                file.write_all(b"\n")?;
                file.flush()?;
            }
            None => {}
        }
        info!(path = %path.display(), events = replayed, "Opened experiment journal");

        Ok(Self {
            path,
            state,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// In-memory view of the replayed state.
    #[must_use]
    pub const fn state(&self) -> &MemoryStore {
        &self.state
    }

    fn lock(&self) -> Result<MutexGuard<'_, BufWriter<File>>> {
        self.writer
            .lock()
            .map_err(|_| Error::Other("journal writer lock poisoned".into()))
    }

    /// Apply `event` in memory, then append it to the journal.
    fn commit(&self, event: JournalEvent) -> Result<()> {
        let mut writer = self.lock()?;
        let line = serde_json::to_string(&event)?;
        event.apply(&self.state)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        debug!(path = %self.path.display(), "Journal event appended");
        Ok(())
    }
}

impl ExperimentRepository for JournalStore {
    fn experiment(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        self.state.experiment(name)
    }

    fn experiments(&self) -> Result<Vec<ExperimentRecord>> {
        self.state.experiments()
    }

    fn variants(&self, experiment: &str) -> Result<Vec<VariantRecord>> {
        self.state.variants(experiment)
    }

    fn assignment(
        &self,
        subject: &SubjectId,
        experiment: &str,
    ) -> Result<Option<AssignmentRecord>> {
        self.state.assignment(subject, experiment)
    }

    fn insert_assignment(&self, record: AssignmentRecord) -> Result<()> {
        self.commit(JournalEvent::Assigned(record))
    }

    fn insert_conversion(&self, record: ConversionRecord) -> Result<()> {
        self.commit(JournalEvent::Converted(record))
    }

    fn assignments(&self, experiment: &str) -> Result<Vec<AssignmentRecord>> {
        self.state.assignments(experiment)
    }

    fn conversions(&self, experiment: &str) -> Result<Vec<ConversionRecord>> {
        self.state.conversions(experiment)
    }

    fn create_experiment(&self, record: ExperimentRecord) -> Result<()> {
        self.commit(JournalEvent::ExperimentCreated(record))
    }

    fn add_variant(&self, record: VariantRecord) -> Result<()> {
        self.commit(JournalEvent::VariantAdded(record))
    }

    fn install_experiment(
        &self,
        record: ExperimentRecord,
        variants: Vec<VariantRecord>,
    ) -> Result<()> {
        self.commit(JournalEvent::ExperimentInstalled {
            experiment: record,
            variants,
        })
    }

    fn delete_experiment(&self, name: &str) -> Result<bool> {
        if self.state.experiment(name)?.is_none() {
            return Ok(false);
        }
        self.commit(JournalEvent::ExperimentDeleted {
            name: name.to_string(),
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_line_format() {
        let event = JournalEvent::ExperimentDeleted {
            name: "exp".into(),
        };
        let line = serde_json::to_string(&event).unwrap();
        assert_eq!(line, r#"{"event":"experiment_deleted","name":"exp"}"#);
    }

    #[test]
    fn test_replay_torn_tail() {
        let good = serde_json::to_string(&JournalEvent::ExperimentCreated(
            ExperimentRecord::new("exp"),
        ))
        .unwrap();
        let bytes = format!("{good}\n{{\"event\":\"assigned\",\"id\":\"ab");
        let state = MemoryStore::new();
        let (replayed, repair) = replay(bytes.as_bytes(), &state).unwrap();
        assert_eq!(replayed, 1);
        assert_eq!(repair, Some(TailRepair::Truncate(good.len() as u64 + 1)));
        assert!(state.experiment("exp").unwrap().is_some());
    }

    #[test]
    fn test_replay_unterminated_complete_event() {
        let good = serde_json::to_string(&JournalEvent::ExperimentCreated(
            ExperimentRecord::new("exp"),
        ))
        .unwrap();
        let state = MemoryStore::new();
        let (replayed, repair) = replay(good.as_bytes(), &state).unwrap();
        assert_eq!(replayed, 1);
        assert_eq!(repair, Some(TailRepair::Terminate));
    }

    #[test]
    fn test_replay_empty() {
        assert_eq!(replay(b"", &MemoryStore::new()).unwrap(), (0, None));
    }

    #[test]
    fn test_event_tagged_record() {
        let event = JournalEvent::ExperimentCreated(ExperimentRecord::new("exp"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "experiment_created");
        assert_eq!(value["name"], "exp");

        let back: JournalEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
