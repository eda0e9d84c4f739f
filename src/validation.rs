use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::ApiError;
use crate::models::{BoothRef, EntryRequest, Gender, NewGuestbookEntry, SchoolLevel};

// ASCII only; `\d` would also admit other Unicode digits.
static BIRTH_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{8}$").expect("birth date pattern"));

const MISSING_FIELDS: &str = "모든 필드를 입력해주세요.";

fn present<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::validation(field, MISSING_FIELDS)),
    }
}

// Matches the VARCHAR(255) name columns; Postgres counts characters.
pub const MAX_NAME_CHARS: usize = 255;

fn booth_ref(value: Option<&BoothRef>) -> Result<&BoothRef, ApiError> {
    match value {
        None | Some(BoothRef::Id(0)) => Err(ApiError::validation("booth_id", MISSING_FIELDS)),
        Some(BoothRef::Text(s)) if s.trim().is_empty() => Err(ApiError::validation("booth_id", MISSING_FIELDS)),
        Some(booth) => Ok(booth),
    }
}

fn booth_id(booth: &BoothRef) -> Result<i32, ApiError> {
    let id = match booth {
        BoothRef::Id(n) => i32::try_from(*n).ok(),
        BoothRef::Text(s) => s.trim().parse::<i32>().ok(),
    };

    match id {
        Some(n) if n > 0 => Ok(n),
        _ => Err(ApiError::validation("booth_id", "올바른 부스를 선택해주세요.")),
    }
}

fn within_limit<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ApiError> {
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::validation(field, format!("이름은 {}자 이하로 입력해주세요.", MAX_NAME_CHARS)));
    }
    Ok(value)
}

/// Checks a guestbook submission and builds the row to insert. Presence of
/// all five fields is checked before any of their formats.
pub fn validate_entry(req: &EntryRequest, created_at: NaiveDateTime) -> Result<NewGuestbookEntry, ApiError> {
    let booth = booth_ref(req.booth_id.as_ref())?;
    let name = present("name", req.name.as_deref())?;
    let gender = present("gender", req.gender.as_deref())?;
    let school_level = present("school_level", req.school_level.as_deref())?;
    present("birth_date", req.birth_date.as_deref())?;
    // Matched untrimmed: the stored value is exactly what was typed.
    let birth_date = req.birth_date.as_deref().unwrap_or_default();

    let booth_id = booth_id(booth)?;
    let name = within_limit("name", name)?;
    let gender = Gender::parse(gender).ok_or_else(|| ApiError::validation("gender", "올바른 성별을 선택해주세요."))?;
    let school_level = SchoolLevel::parse(school_level)
        .ok_or_else(|| ApiError::validation("school_level", "올바른 교급을 선택해주세요."))?;

    if !BIRTH_DATE.is_match(birth_date) {
        return Err(ApiError::validation("birth_date", "생년월일을 YYYYMMDD 형식으로 입력해주세요."));
    }

    Ok(NewGuestbookEntry {
        booth_id,
        name: name.to_string(),
        gender,
        school_level,
        birth_date: birth_date.to_string(),
        created_at,
    })
}

/// Trimmed booth name; blank names are rejected.
pub fn validate_booth_name(name: Option<&str>) -> Result<String, ApiError> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(within_limit("name", n)?.to_string()),
        _ => Err(ApiError::validation("name", "부스 이름을 입력해주세요.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EntryRequest {
        EntryRequest {
            booth_id: Some(BoothRef::Id(1)),
            name: Some("Kim".to_string()),
            gender: Some("남성".to_string()),
            school_level: Some("고등".to_string()),
            birth_date: Some("20100101".to_string()),
        }
    }

    fn field_of(err: ApiError) -> &'static str {
        match err {
            ApiError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn birth_date_must_be_exactly_eight_ascii_digits() {
        for bad in [" 20100101", "2010011", "201001011", "2010-01-01", "2010010a", "٢٠١٠٠١٠١", "２０１００１０１"] {
            let mut req = request();
            req.birth_date = Some(bad.to_string());
            let err = validate_entry(&req, NaiveDateTime::default()).unwrap_err();
            assert_eq!(field_of(err), "birth_date", "{bad} should be rejected");
        }
    }

    #[test]
    fn booth_id_may_be_a_numeric_string() {
        let mut req = request();
        req.booth_id = Some(BoothRef::Text(" 7 ".to_string()));
        assert_eq!(validate_entry(&req, NaiveDateTime::default()).unwrap().booth_id, 7);

        req.booth_id = Some(BoothRef::Text("seven".to_string()));
        assert_eq!(field_of(validate_entry(&req, NaiveDateTime::default()).unwrap_err()), "booth_id");

        req.booth_id = Some(BoothRef::Id(0));
        assert_eq!(field_of(validate_entry(&req, NaiveDateTime::default()).unwrap_err()), "booth_id");
    }

    #[test]
    fn missing_fields_win_over_a_malformed_booth_id() {
        let mut req = request();
        req.booth_id = Some(BoothRef::Text("seven".to_string()));
        req.name = None;
        match validate_entry(&req, NaiveDateTime::default()).unwrap_err() {
            ApiError::Validation { field, message } => {
                assert_eq!(field, "name");
                assert_eq!(message, MISSING_FIELDS);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn names_longer_than_the_column_are_rejected() {
        let mut req = request();
        req.name = Some("가".repeat(MAX_NAME_CHARS));
        assert!(validate_entry(&req, NaiveDateTime::default()).is_ok());

        req.name = Some("가".repeat(MAX_NAME_CHARS + 1));
        assert_eq!(field_of(validate_entry(&req, NaiveDateTime::default()).unwrap_err()), "name");

        assert!(validate_booth_name(Some("B".repeat(MAX_NAME_CHARS).as_str())).is_ok());
        assert_eq!(field_of(validate_booth_name(Some("B".repeat(300).as_str())).unwrap_err()), "name");
    }

    #[test]
    fn booth_name_is_trimmed() {
        assert_eq!(validate_booth_name(Some("  Robotics ")).unwrap(), "Robotics");
        assert!(validate_booth_name(Some("   ")).is_err());
        assert!(validate_booth_name(None).is_err());
    }
}
