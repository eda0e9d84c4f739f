use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::aggregator::{DayWindow, GroupField};
use crate::error::StoreError;
use crate::models::{AdminUser, Booth, NewAdminUser, NewGuestbookEntry, Session};

mod postgres;

/// Booths and guestbook entries.
///
/// Aggregates are requested from the store rather than computed over loaded
/// rows, so implementations are free to push grouping and window filters
/// down into the database.
pub trait EntryStore {
    /// Number of entries, optionally restricted to one booth.
    fn count_entries(&mut self, booth: Option<i32>) -> Result<i64, StoreError>;

    /// Number of entries for `booth` whose `created_at` is at or after `since` (UTC).
    fn count_entries_since(&mut self, booth: i32, since: NaiveDateTime) -> Result<i64, StoreError>;

    /// `(code, count)` pairs for every value of `field` present in matching rows.
    fn group_counts(&mut self, field: GroupField, booth: Option<i32>) -> Result<Vec<(String, i64)>, StoreError>;

    /// `("HH:00", count)` pairs for entries inside `window`, bucketed by the
    /// window's local hour and sorted by label.
    fn hourly_counts(&mut self, window: &DayWindow, booth: Option<i32>) -> Result<Vec<(String, i64)>, StoreError>;

    /// Inserts one entry and returns its assigned id. Fails with
    /// `ForeignKeyViolation` when the booth does not exist.
    fn insert_entry(&mut self, entry: &NewGuestbookEntry) -> Result<i32, StoreError>;

    fn count_booths(&mut self) -> Result<i64, StoreError>;

    /// All booths ordered by name.
    fn list_booths(&mut self) -> Result<Vec<Booth>, StoreError>;

    /// Fails with `UniqueViolation` when the name is taken.
    fn insert_booth(&mut self, name: &str, created_at: NaiveDateTime) -> Result<Booth, StoreError>;

    /// Returns `false` when no booth had that id. Fails with
    /// `ForeignKeyViolation` while entries still reference the booth.
    fn delete_booth(&mut self, id: i32) -> Result<bool, StoreError>;
}

/// Operator accounts and their login sessions.
pub trait AccountStore {
    fn find_user(&mut self, username: &str) -> Result<Option<AdminUser>, StoreError>;

    /// Fails with `UniqueViolation` when the username is taken.
    fn insert_user(&mut self, user: &NewAdminUser) -> Result<AdminUser, StoreError>;

    fn insert_session(&mut self, session: &Session) -> Result<(), StoreError>;

    /// Session for `token` together with its owner, expired or not.
    fn find_session(&mut self, token: Uuid) -> Result<Option<(Session, AdminUser)>, StoreError>;

    /// Deletes sessions that expired at or before `now`; returns how many were removed.
    fn purge_sessions(&mut self, now: NaiveDateTime) -> Result<usize, StoreError>;
}
