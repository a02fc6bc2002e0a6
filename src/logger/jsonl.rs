//! JSONL journal of flow transitions.
//!
//! Each line is one transition:
//! ```json
//! {"ts":"2026-03-02T10:30:00.120Z","session":3,"event":"accept","from":"decide","to":"result","top_label":"a soft drink, juice, or water","tier":"low","severity":"danger","block_enrichment":true}
//! ```
//!
//! Writes never fail the caller. The first IO failure is logged, the journal
//! flips to degraded, and later appends become no-ops.

#![allow(missing_docs)]

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::analysis::{ConfidenceTier, Severity};
use crate::core::errors::{BevError, Result};
use crate::flow::session::{SessionState, Step, UserDecision};

/// One journaled transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub ts: String,
    pub session: u64,
    pub event: String,
    pub from: Step,
    pub to: Step,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<ConfidenceTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_enrichment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_decision: Option<UserDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JournalEntry {
    /// Describe the transition that produced `after`.
    #[must_use]
    pub fn transition(
        at: DateTime<Utc>,
        session: u64,
        event: &str,
        from: Step,
        after: &SessionState,
    ) -> Self {
        let report = after.report();
        Self {
            ts: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            session,
            event: event.to_string(),
            from,
            to: after.step(),
            top_label: report.map(|r| r.top_label.clone()),
            tier: report.map(|r| r.confidence_tier),
            severity: report.map(|r| r.severity),
            block_enrichment: report.map(|r| r.block_enrichment),
            user_decision: after.user_decision(),
            error: after.error().map(str::to_string),
        }
    }
}

/// Shared append-only writer. Safe to use from many sessions at once.
#[derive(Debug)]
pub struct DecisionJournal {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    degraded: AtomicBool,
    written: AtomicU64,
}

impl DecisionJournal {
    /// Open (or create) the journal at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| BevError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BevError::io(&path, e))?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            degraded: AtomicBool::new(false),
            written: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Lines successfully written since open.
    #[must_use]
    pub fn entries_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Append one entry. Failures degrade the journal instead of propagating.
    pub fn append(&self, entry: &JournalEntry) {
        if self.is_degraded() {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "journal entry could not be serialized");
                return;
            }
        };
        let mut writer = self.writer.lock();
        let outcome = writeln!(writer, "{line}").and_then(|()| writer.flush());
        match outcome {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.degraded.store(true, Ordering::Release);
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "decision journal degraded; further entries dropped"
                );
            }
        }
    }
}

/// Read every entry back. Blank lines are skipped; malformed lines are errors.
pub fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    let file = File::open(path).map_err(|e| BevError::io(path, e))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| BevError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(session: u64, event: &str) -> JournalEntry {
        JournalEntry::transition(Utc::now(), session, event, Step::Upload, &SessionState::new())
    }

    #[test]
    fn open_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("journal.jsonl");
        let journal = DecisionJournal::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(journal.path(), path);
        assert!(!journal.is_degraded());
    }

    #[test]
    fn appended_entries_read_back_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.jsonl");
        let journal = DecisionJournal::open(&path).unwrap();
        journal.append(&entry(1, "submit_image"));
        journal.append(&entry(1, "reset"));
        assert_eq!(journal.entries_written(), 2);

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, "submit_image");
        assert_eq!(entries[1].event, "reset");
        assert!(entries[0].top_label.is_none());
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let line = serde_json::to_string(&entry(9, "restart")).unwrap();
        assert!(line.contains("\"session\":9"));
        assert!(!line.contains("top_label"));
        assert!(!line.contains("error"));
    }

    #[test]
    fn reopening_appends_rather_than_truncates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.jsonl");
        DecisionJournal::open(&path).unwrap().append(&entry(1, "continue"));
        DecisionJournal::open(&path).unwrap().append(&entry(2, "continue"));
        let sessions: Vec<u64> = read_entries(&path).unwrap().iter().map(|e| e.session).collect();
        assert_eq!(sessions, [1, 2]);
    }

    #[test]
    fn concurrent_appends_produce_whole_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.jsonl");
        let journal = Arc::new(DecisionJournal::open(&path).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|session| {
                let journal = Arc::clone(&journal);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        journal.append(&entry(session, "continue"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(read_entries(&path).unwrap().len(), 100);
    }
}
