//! Monotonic `createdAt` assignment.

use chrono::{DateTime, Duration, Utc};
use message_core::Provenance;

/// Hands out strictly increasing creation times for non-memory messages.
///
/// Memory messages keep the time they were stored with; everything else is
/// placed after the latest time the list has seen, so messages produced in
/// the same millisecond still sort in arrival order.
#[derive(Debug, Clone, Default)]
pub struct TimestampSequencer {
    high_water: Option<DateTime<Utc>>,
}

impl TimestampSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn high_water(&self) -> Option<DateTime<Utc>> {
        self.high_water
    }

    /// Raise the high-water mark to a time assigned outside `assign`, such as
    /// the advanced `createdAt` of an appended message.
    pub fn observe(&mut self, created_at: DateTime<Utc>) {
        if self.high_water.map_or(true, |high| created_at > high) {
            self.high_water = Some(created_at);
        }
    }

    /// Pick the `createdAt` for an incoming message.
    ///
    /// `latest_stored` is the greatest `createdAt` currently in the store.
    pub fn assign(
        &mut self,
        supplied: Option<DateTime<Utc>>,
        provenance: Provenance,
        latest_stored: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        self.assign_at(supplied, provenance, latest_stored, Utc::now())
    }

    fn assign_at(
        &mut self,
        supplied: Option<DateTime<Utc>>,
        provenance: Provenance,
        latest_stored: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let candidate = supplied.unwrap_or(now);
        if provenance == Provenance::Memory {
            return candidate;
        }

        let last_known = match (self.high_water, latest_stored) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        let assigned = match last_known {
            Some(last) if candidate <= last => last + Duration::milliseconds(1),
            _ => candidate,
        };
        self.high_water = Some(assigned);
        assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    #[test]
    fn test_first_message_uses_supplied_time() {
        let mut seq = TimestampSequencer::new();
        assert_eq!(seq.assign_at(Some(at(1_000)), Provenance::User, None, at(5_000)), at(1_000));
        assert_eq!(seq.high_water(), Some(at(1_000)));
    }

    #[test]
    fn test_collisions_bump_by_one_millisecond() {
        let mut seq = TimestampSequencer::new();
        let now = at(1_000);
        let a = seq.assign_at(None, Provenance::User, None, now);
        let b = seq.assign_at(None, Provenance::Response, Some(a), now);
        let c = seq.assign_at(None, Provenance::Response, Some(b), now);
        assert_eq!(a, at(1_000));
        assert_eq!(b, at(1_001));
        assert_eq!(c, at(1_002));
    }

    #[test]
    fn test_past_supplied_time_is_moved_forward() {
        let mut seq = TimestampSequencer::new();
        let t = seq.assign_at(Some(at(10)), Provenance::User, Some(at(500)), at(1_000));
        assert_eq!(t, at(501));
    }

    #[test]
    fn test_memory_keeps_its_time() {
        let mut seq = TimestampSequencer::new();
        seq.assign_at(None, Provenance::User, None, at(1_000));
        let t = seq.assign_at(Some(at(10)), Provenance::Memory, Some(at(1_000)), at(2_000));
        assert_eq!(t, at(10));
        assert_eq!(seq.high_water(), Some(at(1_000)));
    }

    #[test]
    fn test_high_water_covers_removed_history() {
        let mut seq = TimestampSequencer::new();
        seq.assign_at(Some(at(900)), Provenance::User, None, at(100));
        let t = seq.assign_at(None, Provenance::User, None, at(100));
        assert_eq!(t, at(901));
    }
}
