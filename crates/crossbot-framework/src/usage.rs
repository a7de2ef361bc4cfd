//! Tracks which users have successfully passed validation.

use std::collections::HashSet;

use parking_lot::RwLock;

/// Set of user IDs that have used the bot since startup.
#[derive(Debug, Default)]
pub struct UsageTracker {
    users: RwLock<HashSet<String>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user. Returns `true` the first time the user is seen.
    pub fn record(&self, user_id: &str) -> bool {
        if self.users.read().contains(user_id) {
            return false;
        }
        self.users.write().insert(user_id.to_string())
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.users.read().contains(user_id)
    }

    /// Number of distinct users recorded.
    pub fn count(&self) -> usize {
        self.users.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent() {
        let tracker = UsageTracker::new();
        assert!(tracker.record("u1"));
        assert!(!tracker.record("u1"));
        assert!(tracker.record("u2"));
        assert_eq!(tracker.count(), 2);
        assert!(tracker.contains("u1"));
        assert!(!tracker.contains("u3"));
    }
}
