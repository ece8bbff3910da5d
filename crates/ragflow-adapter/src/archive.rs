//! Periodic conversation archiving.
//!
//! The adapter counts messages per session and, every N messages, snapshots
//! the recent history. Archiving is a side effect of request processing and
//! follows the same rule as everything else here: it degrades silently,
//! never blocking or failing the request that triggered it.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::inject::ContextMessage;

/// Per-session message counter. Threshold N triggers at every Nth message;
/// 0 disables archiving entirely.
pub struct SessionCounter {
    counts: DashMap<String, u64>,
    threshold: u64,
}

impl SessionCounter {
    pub fn new(threshold: u64) -> Self {
        Self {
            counts: DashMap::new(),
            threshold,
        }
    }

    /// Record one message for the session. Returns the new count and
    /// whether the archive threshold was just crossed.
    pub fn bump(&self, session_id: &str) -> (u64, bool) {
        let mut entry = self.counts.entry(session_id.to_string()).or_insert(0);
        *entry += 1;
        let count = *entry;
        let crossed = self.threshold > 0 && count % self.threshold == 0;
        (count, crossed)
    }

    pub fn reset(&self, session_id: &str) {
        self.counts.remove(session_id);
    }
}

/// Snapshot of the messages selected for one archiving pass.
#[derive(Debug, Clone)]
pub struct ArchiveRecord {
    pub session_id: String,
    pub archived_at: DateTime<Utc>,
    pub messages: Vec<ContextMessage>,
}

/// Archive the most recent `threshold` messages of a session's history.
pub fn archive_recent(
    session_id: &str,
    history: &[ContextMessage],
    threshold: usize,
) -> ArchiveRecord {
    let start = history.len().saturating_sub(threshold);
    let recent = &history[start..];

    tracing::info!(
        session = %session_id,
        messages = recent.len(),
        threshold,
        "Archiving recent conversation history"
    );
    for (i, msg) in recent.iter().enumerate() {
        tracing::debug!(
            index = i + 1,
            role = %msg.role,
            content = %truncate_for_log(&msg.content, 200),
            "Archived message"
        );
    }

    ArchiveRecord {
        session_id: session_id.to_string(),
        archived_at: Utc::now(),
        messages: recent.to_vec(),
    }
}

fn truncate_for_log(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let head: String = content.chars().take(max_chars).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_triggers_at_every_threshold_multiple() {
        let counter = SessionCounter::new(3);
        assert_eq!(counter.bump("s1"), (1, false));
        assert_eq!(counter.bump("s1"), (2, false));
        assert_eq!(counter.bump("s1"), (3, true));
        assert_eq!(counter.bump("s1"), (4, false));
        assert_eq!(counter.bump("s1"), (5, false));
        assert_eq!(counter.bump("s1"), (6, true));
    }

    #[test]
    fn test_counter_sessions_are_independent() {
        let counter = SessionCounter::new(2);
        counter.bump("a");
        assert_eq!(counter.bump("b"), (1, false));
        assert_eq!(counter.bump("a"), (2, true));
    }

    #[test]
    fn test_zero_threshold_never_triggers() {
        let counter = SessionCounter::new(0);
        for _ in 0..10 {
            let (_, crossed) = counter.bump("s");
            assert!(!crossed);
        }
    }

    #[test]
    fn test_reset_restarts_counting() {
        let counter = SessionCounter::new(2);
        counter.bump("s");
        counter.reset("s");
        assert_eq!(counter.bump("s"), (1, false));
    }

    #[test]
    fn test_archive_takes_recent_messages_only() {
        let history: Vec<ContextMessage> = (0..5)
            .map(|i| ContextMessage::new("user", format!("消息{i}")))
            .collect();
        let record = archive_recent("s", &history, 3);
        assert_eq!(record.messages.len(), 3);
        assert_eq!(record.messages[0].content, "消息2");
        assert_eq!(record.messages[2].content, "消息4");
    }

    #[test]
    fn test_archive_short_history_takes_everything() {
        let history = vec![ContextMessage::new("user", "只有一条")];
        let record = archive_recent("s", &history, 10);
        assert_eq!(record.messages.len(), 1);
    }

    #[test]
    fn test_truncate_for_log_is_char_safe() {
        let long = "好".repeat(250);
        let truncated = truncate_for_log(&long, 200);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_for_log("short", 200), "short");
    }
}
