//! Bounded conversation memory.
//!
//! Two tiers: a short-term window holding the most recent entries, and a
//! long-term store that only admits entries whose importance clears a
//! configured threshold. Long-term entries expire after a decay window;
//! expired entries are purged on every mutation.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use revu_core::config::MemoryConfig;

// =============================================================================
// MemoryEntry
// =============================================================================

/// A single remembered item.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    /// Remembered text.
    pub content: String,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Importance score in `[0.0, 1.0]`.
    pub importance: f64,
    /// Short label for where the entry came from (e.g. a role name).
    pub context: String,
}

impl MemoryEntry {
    /// Create an entry stamped with the current time. Importance is
    /// clamped into `[0.0, 1.0]`.
    pub fn new(content: impl Into<String>, importance: f64, context: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: Utc::now(),
            importance: importance.clamp(0.0, 1.0),
            context: context.into(),
        }
    }
}

// =============================================================================
// ConversationMemory
// =============================================================================

/// Bounded two-tier memory for a conversation session.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    short_term: VecDeque<MemoryEntry>,
    long_term: Vec<MemoryEntry>,
    config: MemoryConfig,
}

impl ConversationMemory {
    /// Create an empty memory with the given bounds.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            short_term: VecDeque::new(),
            long_term: Vec::new(),
            config,
        }
    }

    /// Record a new item.
    ///
    /// The entry always enters the short-term window (evicting the oldest
    /// entry when full). It also enters long-term storage when its
    /// importance meets the admission threshold; when long-term storage is
    /// full, the lowest-importance entry is evicted first, oldest on ties.
    pub fn record(
        &mut self,
        content: impl Into<String>,
        importance: f64,
        context: impl Into<String>,
    ) {
        self.insert(MemoryEntry::new(content, importance, context));
    }

    fn insert(&mut self, entry: MemoryEntry) {
        self.purge_expired();

        if entry.importance >= self.config.importance_threshold {
            self.long_term.push(entry.clone());
            while self.long_term.len() > self.config.max_long_term {
                if let Some(evict) = self
                    .long_term
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        a.importance
                            .partial_cmp(&b.importance)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a.timestamp.cmp(&b.timestamp))
                    })
                    .map(|(i, _)| i)
                {
                    self.long_term.remove(evict);
                }
            }
        }

        self.short_term.push_back(entry);
        while self.short_term.len() > self.config.max_short_term {
            self.short_term.pop_front();
        }
    }

    /// Drop long-term entries older than the decay window.
    pub fn purge_expired(&mut self) {
        let cutoff = Utc::now() - Duration::days(self.config.decay_days);
        self.long_term.retain(|e| e.timestamp >= cutoff);
    }

    /// Most recent short-term entries, oldest first.
    pub fn short_term(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.short_term.iter()
    }

    /// Long-term entries in insertion order.
    pub fn long_term(&self) -> &[MemoryEntry] {
        &self.long_term
    }

    /// Number of short-term entries currently held.
    pub fn short_term_len(&self) -> usize {
        self.short_term.len()
    }

    /// Render a compact text block of remembered items for prompting.
    ///
    /// Includes up to `max_entries` of the most recent short-term items
    /// plus any long-term items not already in the window. Returns an
    /// empty string when nothing is remembered.
    pub fn summary(&self, max_entries: usize) -> String {
        let mut lines: Vec<String> = Vec::new();

        for entry in self.long_term.iter() {
            if !self.short_term.iter().any(|s| s.content == entry.content) {
                lines.push(format!("- ({}) {}", entry.context, entry.content));
            }
        }

        let recent = self
            .short_term
            .iter()
            .rev()
            .take(max_entries)
            .collect::<Vec<_>>();
        for entry in recent.into_iter().rev() {
            lines.push(format!("- ({}) {}", entry.context, entry.content));
        }

        lines.join("\n")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MemoryConfig {
        MemoryConfig {
            max_short_term: 3,
            max_long_term: 2,
            decay_days: 30,
            importance_threshold: 0.7,
        }
    }

    #[test]
    fn test_short_term_keeps_most_recent() {
        let mut mem = ConversationMemory::new(small_config());
        for i in 0..5 {
            mem.record(format!("entry {}", i), 0.1, "user");
        }
        assert_eq!(mem.short_term_len(), 3);
        let contents: Vec<_> = mem.short_term().map(|e| e.content.clone()).collect();
        assert_eq!(contents, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_long_term_admission_threshold() {
        let mut mem = ConversationMemory::new(small_config());
        mem.record("trivial", 0.2, "user");
        mem.record("important", 0.9, "user");
        assert_eq!(mem.long_term().len(), 1);
        assert_eq!(mem.long_term()[0].content, "important");
    }

    #[test]
    fn test_long_term_admits_at_exact_threshold() {
        let mut mem = ConversationMemory::new(small_config());
        mem.record("boundary", 0.7, "user");
        assert_eq!(mem.long_term().len(), 1);
    }

    #[test]
    fn test_long_term_evicts_lowest_importance() {
        let mut mem = ConversationMemory::new(small_config());
        mem.record("a", 0.7, "user");
        mem.record("b", 0.9, "user");
        mem.record("c", 0.8, "user");
        assert_eq!(mem.long_term().len(), 2);
        let contents: Vec<_> = mem.long_term().iter().map(|e| e.content.clone()).collect();
        assert!(contents.contains(&"b".to_string()));
        assert!(contents.contains(&"c".to_string()));
    }

    #[test]
    fn test_expired_entries_purged_on_mutation() {
        let mut mem = ConversationMemory::new(small_config());
        let mut stale = MemoryEntry::new("stale", 0.9, "user");
        stale.timestamp = Utc::now() - Duration::days(31);
        mem.long_term.push(stale);

        mem.record("fresh", 0.9, "user");
        let contents: Vec<_> = mem.long_term().iter().map(|e| e.content.clone()).collect();
        assert_eq!(contents, vec!["fresh"]);
    }

    #[test]
    fn test_entry_within_decay_window_retained() {
        let mut mem = ConversationMemory::new(small_config());
        let mut recent = MemoryEntry::new("recent", 0.9, "user");
        recent.timestamp = Utc::now() - Duration::days(29);
        mem.long_term.push(recent);

        mem.purge_expired();
        assert_eq!(mem.long_term().len(), 1);
    }

    #[test]
    fn test_importance_clamped() {
        let entry = MemoryEntry::new("x", 3.5, "user");
        assert_eq!(entry.importance, 1.0);
        let entry = MemoryEntry::new("x", -1.0, "user");
        assert_eq!(entry.importance, 0.0);
    }

    #[test]
    fn test_summary_empty_when_no_entries() {
        let mem = ConversationMemory::new(small_config());
        assert!(mem.summary(10).is_empty());
    }

    #[test]
    fn test_summary_includes_recent_entries() {
        let mut mem = ConversationMemory::new(small_config());
        mem.record("first", 0.1, "user");
        mem.record("second", 0.1, "assistant");
        let summary = mem.summary(10);
        assert!(summary.contains("first"));
        assert!(summary.contains("second"));
        assert!(summary.contains("(assistant)"));
    }

    #[test]
    fn test_summary_respects_max_entries() {
        let mut mem = ConversationMemory::new(MemoryConfig {
            max_short_term: 10,
            ..small_config()
        });
        for i in 0..6 {
            mem.record(format!("entry {}", i), 0.1, "user");
        }
        let summary = mem.summary(2);
        assert!(summary.contains("entry 4"));
        assert!(summary.contains("entry 5"));
        assert!(!summary.contains("entry 3"));
    }
}
