use chrono::NaiveDate;
use eod_reminder_domain::{SentRecord, UserId};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::info;

/// Remembers which members already got today's prompt.
///
/// Records are keyed on (member, UTC date), so entries from earlier days
/// never answer for today even before the daily reset has run.
pub struct DedupTracker {
    records: Mutex<HashSet<SentRecord>>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_sent(&self, user_id: &UserId, date: NaiveDate) -> bool {
        self.records
            .lock()
            .unwrap()
            .contains(&SentRecord::new(user_id.clone(), date))
    }

    pub fn mark_sent(&self, user_id: &UserId, date: NaiveDate) {
        self.records
            .lock()
            .unwrap()
            .insert(SentRecord::new(user_id.clone(), date));
    }

    /// Drop all records. Runs at the UTC day boundary and is idempotent.
    pub fn reset(&self) {
        let mut records = self.records.lock().unwrap();
        if !records.is_empty() {
            info!("Clearing {} delivery records for the new day", records.len());
        }
        records.clear();
    }
}

impl Default for DedupTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd(2021, 1, d)
    }

    #[test]
    fn marking_makes_a_member_sent_for_that_date_only() {
        let tracker = DedupTracker::new();
        let user = UserId::from("U1");

        assert!(!tracker.is_sent(&user, day(15)));
        tracker.mark_sent(&user, day(15));
        assert!(tracker.is_sent(&user, day(15)));
        assert!(!tracker.is_sent(&user, day(16)));
        assert!(!tracker.is_sent(&UserId::from("U2"), day(15)));
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let tracker = DedupTracker::new();
        let user = UserId::from("U1");

        tracker.mark_sent(&user, day(15));
        tracker.mark_sent(&user, day(15));
        assert!(tracker.is_sent(&user, day(15)));
    }

    #[test]
    fn reset_makes_everyone_eligible_again() {
        let tracker = DedupTracker::new();
        let user = UserId::from("U1");

        tracker.mark_sent(&user, day(15));
        tracker.reset();
        assert!(!tracker.is_sent(&user, day(15)));

        // Resetting an empty tracker is fine
        tracker.reset();
        assert!(!tracker.is_sent(&user, day(15)));
    }
}
