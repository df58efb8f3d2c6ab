use crate::models::{AuditEntry, ModerationAction};
use std::collections::VecDeque;

/// Newest-first, append-only record of moderation actions.
///
/// With a capacity set, the oldest entries are evicted first.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    capacity: Option<usize>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.filter(|&c| c > 0),
        }
    }

    pub fn append(&mut self, entry: AuditEntry) {
        tracing::debug!(
            entry_id = %entry.id,
            user_id = %entry.user_id,
            final_action = %entry.final_action,
            "Audit entry appended"
        );

        self.entries.push_front(entry);

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                if let Some(evicted) = self.entries.pop_back() {
                    tracing::debug!(entry_id = %evicted.id, "Audit entry evicted");
                }
            }
        }
    }

    /// Snapshot, newest first
    pub fn all(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&AuditEntry> {
        self.entries.front()
    }

    /// Entries about one user, newest first
    pub fn for_user(&self, user_id: &str) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn count_action(&self, action: ModerationAction) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.final_action == action)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
