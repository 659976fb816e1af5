//! Trip windows and guide availability for custom tours.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::BookingError;

/// The closed span of time a trip occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TripWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BookingError> {
        if end < start {
            return Err(BookingError::ReturnBeforeDeparture);
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days, from midnight of `first` to the last instant of `last`.
    pub fn from_days(first: NaiveDate, last: NaiveDate) -> Result<Self, BookingError> {
        Self::new(day_start(first), day_end(last))
    }

    /// Two trips collide when they share at least one instant, ends included.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Midnight UTC at the start of `date`.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last millisecond of `date` in UTC.
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + TimeDelta::days(1) - TimeDelta::milliseconds(1)
}

/// A guide and the trips they are already assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideSchedule {
    pub guide_id: i64,
    pub busy: Vec<TripWindow>,
}

impl GuideSchedule {
    pub fn is_free_during(&self, window: &TripWindow) -> bool {
        !self.busy.iter().any(|trip| trip.overlaps(window))
    }
}

/// Build one schedule per guide, ordered by guide id.
///
/// Guides without any assignment get an empty schedule; commitments of ids
/// missing from `guide_ids` are ignored.
pub fn build_schedules(
    guide_ids: &[i64],
    commitments: impl IntoIterator<Item = (i64, TripWindow)>,
) -> Vec<GuideSchedule> {
    let mut busy: BTreeMap<i64, Vec<TripWindow>> =
        guide_ids.iter().map(|&id| (id, Vec::new())).collect();

    for (guide_id, window) in commitments {
        if let Some(trips) = busy.get_mut(&guide_id) {
            trips.push(window);
        }
    }

    busy.into_iter()
        .map(|(guide_id, busy)| GuideSchedule { guide_id, busy })
        .collect()
}

/// Lowest-id guide with nothing overlapping `window`.
pub fn first_free_guide(guides: &[GuideSchedule], window: &TripWindow) -> Option<i64> {
    guides
        .iter()
        .filter(|guide| guide.is_free_during(window))
        .map(|guide| guide.guide_id)
        .min()
}
