use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use diesel::{
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{admin_users, booths, guestbook_entries, sessions};

/// Implements the TEXT column mapping shared by every fixed vocabulary
/// column (`gender`, `school_level`, `role`).
macro_rules! text_enum_sql {
    ($ty:ident, $what:literal) => {
        impl ToSql<Text, Pg> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                <str as ToSql<Text, Pg>>::to_sql(self.as_code(), out)
            }
        }

        impl FromSql<Text, Pg> for $ty {
            fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
                let code = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                $ty::from_code(&code).ok_or_else(|| format!("Unrecognized {}: {}", $what, code).into())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_code())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_code(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_code() == code)
    }

    /// Accepts the stored code or the label shown on the check-in form.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "남성" => Some(Gender::Male),
            "여성" => Some(Gender::Female),
            other => Self::from_code(other),
        }
    }
}

text_enum_sql!(Gender, "gender");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum SchoolLevel {
    Elementary,
    Middle,
    High,
    Other,
}

impl SchoolLevel {
    pub const ALL: [SchoolLevel; 4] = [
        SchoolLevel::Elementary,
        SchoolLevel::Middle,
        SchoolLevel::High,
        SchoolLevel::Other,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            SchoolLevel::Elementary => "elementary",
            SchoolLevel::Middle => "middle",
            SchoolLevel::High => "high",
            SchoolLevel::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_code() == code)
    }

    /// Accepts the stored code or the label shown on the check-in form.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "초등" => Some(SchoolLevel::Elementary),
            "중등" => Some(SchoolLevel::Middle),
            "고등" => Some(SchoolLevel::High),
            "기타" => Some(SchoolLevel::Other),
            other => Self::from_code(other),
        }
    }
}

text_enum_sql!(SchoolLevel, "school level");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    BoothStaff,
}

impl Role {
    pub fn as_code(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::BoothStaff => "booth_staff",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "admin" => Some(Role::Admin),
            "booth_staff" => Some(Role::BoothStaff),
            _ => None,
        }
    }
}

text_enum_sql!(Role, "role");

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = booths)]
pub struct Booth {
    pub id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = booths)]
pub struct NewBooth<'a> {
    pub name: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = guestbook_entries)]
pub struct GuestbookEntry {
    pub id: i32,
    pub booth_id: i32,
    pub name: String,
    pub gender: Gender,
    pub school_level: SchoolLevel,
    pub birth_date: String,
    pub created_at: NaiveDateTime,
}

/// A validated entry; `created_at` is always stamped by the server.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = guestbook_entries)]
pub struct NewGuestbookEntry {
    pub booth_id: i32,
    pub name: String,
    pub gender: Gender,
    pub school_level: SchoolLevel,
    pub birth_date: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = admin_users)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub booth_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = admin_users)]
pub struct NewAdminUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub booth_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = sessions)]
pub struct Session {
    pub token: Uuid,
    pub user_id: i32,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

// Request/Response models for API

/// Booth reference as posted by clients: a JSON number, or the string value
/// of an HTML select.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoothRef {
    Id(i64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryRequest {
    pub booth_id: Option<BoothRef>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub school_level: Option<String>,
    pub birth_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryCreated {
    pub id: i32,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BoothRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub booth_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: UserSummary,
}

/// Category value to count; categories with no matching rows are absent.
pub type CategoryCounts = BTreeMap<String, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBucket {
    pub hour: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_participants: i64,
    pub total_booths: i64,
    pub gender_stats: CategoryCounts,
    pub school_level_stats: CategoryCounts,
    pub timeline_stats: Vec<TimelineBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothStats {
    pub total_participants: i64,
    pub recent_participants: i64,
    pub gender_stats: CategoryCounts,
    pub school_level_stats: CategoryCounts,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}
