//! Read-side statistics over guestbook entries.
//!
//! Every view is computed against the clock at call time; nothing is
//! cached between requests.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Timelike};

use crate::clock::Clock;
use crate::error::StoreError;
use crate::models::{CategoryCounts, Gender, SchoolLevel, TimelineBucket};
use crate::store::EntryStore;

/// Categorical entry columns that can be broken down by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Gender,
    SchoolLevel,
}

impl GroupField {
    pub fn column(&self) -> &'static str {
        match self {
            GroupField::Gender => "gender",
            GroupField::SchoolLevel => "school_level",
        }
    }

    /// Whether `code` belongs to this field's fixed vocabulary.
    pub fn accepts(&self, code: &str) -> bool {
        match self {
            GroupField::Gender => Gender::from_code(code).is_some(),
            GroupField::SchoolLevel => SchoolLevel::from_code(code).is_some(),
        }
    }
}

/// One local calendar day expressed as a half-open UTC range, plus the
/// offset used to label hours inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub utc_offset_secs: i32,
}

impl DayWindow {
    /// The local day containing `now`.
    pub fn containing(now: DateTime<FixedOffset>) -> Self {
        let utc_offset_secs = now.offset().local_minus_utc();
        let local_midnight = now.date_naive().and_time(NaiveTime::MIN);
        let start = local_midnight - Duration::seconds(i64::from(utc_offset_secs));

        DayWindow {
            start,
            end: start + Duration::days(1),
            utc_offset_secs,
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }

    /// `"HH:00"` label of the local hour a UTC timestamp falls in.
    pub fn hour_label(&self, at: NaiveDateTime) -> String {
        let local = at + Duration::seconds(i64::from(self.utc_offset_secs));
        format!("{:02}:00", local.hour())
    }
}

/// Computes counts, breakdowns and timelines for an optional booth filter.
pub struct Aggregator<'a, S: EntryStore + ?Sized> {
    store: &'a mut S,
    clock: &'a dyn Clock,
}

impl<'a, S: EntryStore + ?Sized> Aggregator<'a, S> {
    pub fn new(store: &'a mut S, clock: &'a dyn Clock) -> Self {
        Aggregator { store, clock }
    }

    pub fn count_all(&mut self, booth: Option<i32>) -> Result<i64, StoreError> {
        self.store.count_entries(booth)
    }

    /// Entries for `booth` created within the last `window` of wall-clock time.
    pub fn count_recent(&mut self, booth: i32, window: Duration) -> Result<i64, StoreError> {
        let since = self.clock.now().naive_utc() - window;
        self.store.count_entries_since(booth, since)
    }

    /// Sparse breakdown of `field`. Values outside the field's vocabulary are
    /// dropped, so callers only ever see known keys.
    pub fn group_by(&mut self, field: GroupField, booth: Option<i32>) -> Result<CategoryCounts, StoreError> {
        let mut counts = CategoryCounts::new();
        for (code, count) in self.store.group_counts(field, booth)? {
            if count <= 0 {
                continue;
            }
            if !field.accepts(&code) {
                log::warn!("ignoring unknown {} value {:?} in statistics", field.column(), code);
                continue;
            }
            *counts.entry(code).or_insert(0) += count;
        }

        Ok(counts)
    }

    /// Hour-bucketed counts for the current local day, ascending, zero hours omitted.
    pub fn timeline_today(&mut self, booth: Option<i32>) -> Result<Vec<TimelineBucket>, StoreError> {
        let window = DayWindow::containing(self.clock.now());
        let mut buckets: Vec<TimelineBucket> = self
            .store
            .hourly_counts(&window, booth)?
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(hour, count)| TimelineBucket { hour, count })
            .collect();
        buckets.sort_by(|a, b| a.hour.cmp(&b.hour));

        Ok(buckets)
    }
}
