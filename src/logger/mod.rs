//! Append-only JSONL decision journal with graceful degradation.

pub mod jsonl;

pub use jsonl::{DecisionJournal, JournalEntry};
