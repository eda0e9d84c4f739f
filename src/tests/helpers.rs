//! In-memory store, controllable clock and fixtures shared by the tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use uuid::Uuid;

use crate::access::Caller;
use crate::aggregator::{DayWindow, GroupField};
use crate::clock::Clock;
use crate::config::Context;
use crate::error::StoreError;
use crate::models::{
    AdminUser, Booth, BoothRef, EntryRequest, GuestbookEntry, NewAdminUser, NewGuestbookEntry, Role, Session,
    UserSummary,
};
use crate::store::{AccountStore, EntryStore};

pub const TEST_BCRYPT_COST: u32 = 4;

pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn at(now: DateTime<FixedOffset>) -> Arc<Self> {
        Arc::new(ManualClock { now: Mutex::new(now) })
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap()
    }
}

/// Local time at a UTC+9 festival site.
pub fn kst(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
}

pub fn context(clock: Arc<ManualClock>) -> Context {
    Context {
        clock,
        recent_window: Duration::minutes(10),
        session_ttl: Duration::hours(24),
    }
}

pub fn admin() -> Caller {
    Caller::Authenticated(UserSummary {
        id: 1,
        username: "admin".to_string(),
        role: Role::Admin,
        booth_id: None,
    })
}

pub fn booth_staff(booth_id: i32) -> Caller {
    Caller::Authenticated(UserSummary {
        id: 2,
        username: "staff".to_string(),
        role: Role::BoothStaff,
        booth_id: Some(booth_id),
    })
}

pub fn entry_request(booth_id: i64, gender: &str, school_level: &str) -> EntryRequest {
    EntryRequest {
        booth_id: Some(BoothRef::Id(booth_id)),
        name: Some("Kim".to_string()),
        gender: Some(gender.to_string()),
        school_level: Some(school_level.to_string()),
        birth_date: Some("20100101".to_string()),
    }
}

/// Store backed by vectors; mirrors the constraint behaviour of the
/// database schema (unique names, restricted booth deletion).
#[derive(Default)]
pub struct MemoryStore {
    pub booths: Vec<Booth>,
    pub entries: Vec<GuestbookEntry>,
    pub users: Vec<AdminUser>,
    pub sessions: Vec<Session>,
    /// Extra grouped rows returned verbatim, to simulate legacy data.
    pub stray_group_rows: Vec<(GroupField, String, i64)>,
    next_id: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn with_booths(names: &[&str]) -> Self {
        let mut store = Self::new();
        for name in names {
            store.insert_booth(name, NaiveDateTime::default()).unwrap();
        }
        store
    }

    /// Inserts an entry stamped at `at`, bypassing validation.
    pub fn seed_entry(&mut self, booth_id: i32, gender: &str, school_level: &str, at: DateTime<FixedOffset>) -> i32 {
        let req = entry_request(i64::from(booth_id), gender, school_level);
        let entry = crate::validation::validate_entry(&req, at.naive_utc()).unwrap();
        self.insert_entry(&entry).unwrap()
    }

    fn matching(&self, booth: Option<i32>) -> impl Iterator<Item = &GuestbookEntry> {
        self.entries.iter().filter(move |e| booth.map_or(true, |b| e.booth_id == b))
    }
}

impl EntryStore for MemoryStore {
    fn count_entries(&mut self, booth: Option<i32>) -> Result<i64, StoreError> {
        Ok(self.matching(booth).count() as i64)
    }

    fn count_entries_since(&mut self, booth: i32, since: NaiveDateTime) -> Result<i64, StoreError> {
        Ok(self.matching(Some(booth)).filter(|e| e.created_at >= since).count() as i64)
    }

    fn group_counts(&mut self, field: GroupField, booth: Option<i32>) -> Result<Vec<(String, i64)>, StoreError> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for entry in self.matching(booth) {
            let code = match field {
                GroupField::Gender => entry.gender.as_code(),
                GroupField::SchoolLevel => entry.school_level.as_code(),
            };
            *counts.entry(code.to_string()).or_insert(0) += 1;
        }
        let mut rows: Vec<(String, i64)> = counts.into_iter().collect();
        rows.extend(
            self.stray_group_rows
                .iter()
                .filter(|(f, _, _)| *f == field)
                .map(|(_, code, count)| (code.clone(), *count)),
        );
        Ok(rows)
    }

    fn hourly_counts(&mut self, window: &DayWindow, booth: Option<i32>) -> Result<Vec<(String, i64)>, StoreError> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for entry in self.matching(booth).filter(|e| window.contains(e.created_at)) {
            *counts.entry(window.hour_label(entry.created_at)).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    fn insert_entry(&mut self, entry: &NewGuestbookEntry) -> Result<i32, StoreError> {
        if !self.booths.iter().any(|b| b.id == entry.booth_id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        let id = self.next_id();
        self.entries.push(GuestbookEntry {
            id,
            booth_id: entry.booth_id,
            name: entry.name.clone(),
            gender: entry.gender,
            school_level: entry.school_level,
            birth_date: entry.birth_date.clone(),
            created_at: entry.created_at,
        });
        Ok(id)
    }

    fn count_booths(&mut self) -> Result<i64, StoreError> {
        Ok(self.booths.len() as i64)
    }

    fn list_booths(&mut self) -> Result<Vec<Booth>, StoreError> {
        let mut booths = self.booths.clone();
        booths.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(booths)
    }

    fn insert_booth(&mut self, name: &str, created_at: NaiveDateTime) -> Result<Booth, StoreError> {
        if self.booths.iter().any(|b| b.name == name) {
            return Err(StoreError::UniqueViolation);
        }
        let booth = Booth {
            id: self.next_id(),
            name: name.to_string(),
            created_at,
        };
        self.booths.push(booth.clone());
        Ok(booth)
    }

    fn delete_booth(&mut self, id: i32) -> Result<bool, StoreError> {
        if self.entries.iter().any(|e| e.booth_id == id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        let before = self.booths.len();
        self.booths.retain(|b| b.id != id);
        Ok(self.booths.len() < before)
    }
}

impl AccountStore for MemoryStore {
    fn find_user(&mut self, username: &str) -> Result<Option<AdminUser>, StoreError> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    fn insert_user(&mut self, user: &NewAdminUser) -> Result<AdminUser, StoreError> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation);
        }
        if let Some(booth_id) = user.booth_id {
            if !self.booths.iter().any(|b| b.id == booth_id) {
                return Err(StoreError::ForeignKeyViolation);
            }
        }
        let created = AdminUser {
            id: self.next_id(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            booth_id: user.booth_id,
            created_at: user.created_at,
        };
        self.users.push(created.clone());
        Ok(created)
    }

    fn insert_session(&mut self, session: &Session) -> Result<(), StoreError> {
        if self.sessions.iter().any(|s| s.token == session.token) {
            return Err(StoreError::UniqueViolation);
        }
        self.sessions.push(session.clone());
        Ok(())
    }

    fn find_session(&mut self, token: Uuid) -> Result<Option<(Session, AdminUser)>, StoreError> {
        let Some(session) = self.sessions.iter().find(|s| s.token == token) else {
            return Ok(None);
        };
        let user = self.users.iter().find(|u| u.id == session.user_id).cloned();
        Ok(user.map(|u| (session.clone(), u)))
    }

    fn purge_sessions(&mut self, now: NaiveDateTime) -> Result<usize, StoreError> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.expires_at > now);
        Ok(before - self.sessions.len())
    }
}
