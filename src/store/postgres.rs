use chrono::NaiveDateTime;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Nullable, Text, Timestamp};
use uuid::Uuid;

use super::{AccountStore, EntryStore};
use crate::aggregator::{DayWindow, GroupField};
use crate::error::StoreError;
use crate::models::{AdminUser, Booth, NewAdminUser, NewBooth, NewGuestbookEntry, Session};

#[derive(QueryableByName)]
struct HourRow {
    #[diesel(sql_type = Text)]
    hour: String,
    #[diesel(sql_type = BigInt)]
    count: i64,
}

// Shift into the window's local offset before truncating to the hour so
// that half-hour offsets still land in the right bucket.
const HOURLY_COUNTS_SQL: &str = "\
    SELECT to_char(created_at + ($1 * INTERVAL '1 second'), 'HH24') || ':00' AS hour, \
           COUNT(*) AS count \
    FROM guestbook_entries \
    WHERE created_at >= $2 AND created_at < $3 \
      AND ($4::int4 IS NULL OR booth_id = $4) \
    GROUP BY 1 \
    ORDER BY 1";

impl EntryStore for PgConnection {
    fn count_entries(&mut self, booth: Option<i32>) -> Result<i64, StoreError> {
        use crate::schema::guestbook_entries::dsl::{booth_id, guestbook_entries};

        let mut query = guestbook_entries.select(count_star()).into_boxed();
        if let Some(b) = booth {
            query = query.filter(booth_id.eq(b));
        }

        Ok(query.get_result(self)?)
    }

    fn count_entries_since(&mut self, booth: i32, since: NaiveDateTime) -> Result<i64, StoreError> {
        use crate::schema::guestbook_entries::dsl::{booth_id, created_at, guestbook_entries};

        let count = guestbook_entries
            .filter(booth_id.eq(booth))
            .filter(created_at.ge(since))
            .count()
            .get_result(self)?;

        Ok(count)
    }

    fn group_counts(&mut self, field: GroupField, booth: Option<i32>) -> Result<Vec<(String, i64)>, StoreError> {
        use crate::schema::guestbook_entries::dsl::{booth_id, gender, guestbook_entries, school_level};

        macro_rules! grouped {
            ($conn:expr, $column:expr) => {
                match booth {
                    Some(b) => guestbook_entries
                        .filter(booth_id.eq(b))
                        .group_by($column)
                        .select(($column, count_star()))
                        .order_by($column)
                        .load::<(String, i64)>($conn)?,
                    None => guestbook_entries
                        .group_by($column)
                        .select(($column, count_star()))
                        .order_by($column)
                        .load::<(String, i64)>($conn)?,
                }
            };
        }

        let rows = match field {
            GroupField::Gender => grouped!(self, gender),
            GroupField::SchoolLevel => grouped!(self, school_level),
        };

        Ok(rows)
    }

    fn hourly_counts(&mut self, window: &DayWindow, booth: Option<i32>) -> Result<Vec<(String, i64)>, StoreError> {
        let rows = diesel::sql_query(HOURLY_COUNTS_SQL)
            .bind::<Integer, _>(window.utc_offset_secs)
            .bind::<Timestamp, _>(window.start)
            .bind::<Timestamp, _>(window.end)
            .bind::<Nullable<Integer>, _>(booth)
            .load::<HourRow>(self)?;

        Ok(rows.into_iter().map(|row| (row.hour, row.count)).collect())
    }

    fn insert_entry(&mut self, entry: &NewGuestbookEntry) -> Result<i32, StoreError> {
        use crate::schema::guestbook_entries::dsl::{guestbook_entries, id};

        let new_id = diesel::insert_into(guestbook_entries)
            .values(entry)
            .returning(id)
            .get_result::<i32>(self)?;

        Ok(new_id)
    }

    fn count_booths(&mut self) -> Result<i64, StoreError> {
        use crate::schema::booths::dsl::booths;

        Ok(booths.count().get_result(self)?)
    }

    fn list_booths(&mut self) -> Result<Vec<Booth>, StoreError> {
        use crate::schema::booths::dsl::{booths, id, name};

        let all = booths
            .order_by((name, id))
            .select(Booth::as_select())
            .load(self)?;

        Ok(all)
    }

    fn insert_booth(&mut self, booth_name: &str, now: NaiveDateTime) -> Result<Booth, StoreError> {
        use crate::schema::booths::dsl::booths;

        let booth = diesel::insert_into(booths)
            .values(&NewBooth { name: booth_name, created_at: now })
            .returning(Booth::as_returning())
            .get_result(self)?;

        Ok(booth)
    }

    fn delete_booth(&mut self, booth_id: i32) -> Result<bool, StoreError> {
        use crate::schema::booths::dsl::booths;

        let deleted = diesel::delete(booths.find(booth_id)).execute(self)?;

        Ok(deleted > 0)
    }
}

impl AccountStore for PgConnection {
    fn find_user(&mut self, login: &str) -> Result<Option<AdminUser>, StoreError> {
        use crate::schema::admin_users::dsl::{admin_users, username};

        let user = admin_users
            .filter(username.eq(login))
            .select(AdminUser::as_select())
            .first(self)
            .optional()?;

        Ok(user)
    }

    fn insert_user(&mut self, user: &NewAdminUser) -> Result<AdminUser, StoreError> {
        use crate::schema::admin_users::dsl::admin_users;

        let created = diesel::insert_into(admin_users)
            .values(user)
            .returning(AdminUser::as_returning())
            .get_result(self)?;

        Ok(created)
    }

    fn insert_session(&mut self, session: &Session) -> Result<(), StoreError> {
        use crate::schema::sessions::dsl::sessions;

        diesel::insert_into(sessions).values(session).execute(self)?;

        Ok(())
    }

    fn find_session(&mut self, session_token: Uuid) -> Result<Option<(Session, AdminUser)>, StoreError> {
        use crate::schema::{admin_users, sessions};

        let found = sessions::table
            .inner_join(admin_users::table)
            .filter(sessions::token.eq(session_token))
            .select((Session::as_select(), AdminUser::as_select()))
            .first(self)
            .optional()?;

        Ok(found)
    }

    fn purge_sessions(&mut self, now: NaiveDateTime) -> Result<usize, StoreError> {
        use crate::schema::sessions::dsl::{expires_at, sessions};

        let removed = diesel::delete(sessions.filter(expires_at.le(now))).execute(self)?;

        Ok(removed)
    }
}
