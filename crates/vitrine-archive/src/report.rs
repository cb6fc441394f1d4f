use std::path::PathBuf;

/// Outcome for a single archive entry, in processing order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryOutcome {
    Written,
    SkippedDisallowedType,
}

#[derive(Clone, Debug)]
pub struct EntryRecord {
    pub path: PathBuf,
    pub size: u64,
    pub outcome: EntryOutcome,
}

/// Ordered log of what one extraction attempt did.
///
/// Rejections never appear here: a traversal, scanner, or encoding hit
/// aborts the attempt with an error before a report exists.
#[derive(Clone, Debug, Default)]
pub struct ExtractionReport {
    pub entries: Vec<EntryRecord>,
    pub written_bytes: u64,
}

impl ExtractionReport {
    pub fn written_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == EntryOutcome::Written)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == EntryOutcome::SkippedDisallowedType)
            .count()
    }
}
