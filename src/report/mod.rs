//! Run-result reporting: append-only JSONL records + aggregate summaries.

pub mod jsonl;
pub mod summary;
