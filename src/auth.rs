//! Operator login and bearer session resolution.

use uuid::Uuid;

use crate::access::Caller;
use crate::config::Context;
use crate::error::{ApiError, StoreError};
use crate::models::{AdminUser, LoginResponse, NewAdminUser, Role, Session, UserSummary};
use crate::store::AccountStore;
use crate::validation::MAX_NAME_CHARS;

impl From<&AdminUser> for UserSummary {
    fn from(user: &AdminUser) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            booth_id: user.booth_id,
        }
    }
}

/// Verifies a username/password pair and opens a new session.
pub fn login<S: AccountStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    username: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    let user = match store.find_user(username)? {
        Some(user) => user,
        None => {
            log::warn!("login rejected for unknown user {:?}", username);
            return Err(ApiError::BadLogin);
        }
    };

    let matches = bcrypt::verify(password, &user.password_hash).map_err(|e| {
        log::error!("unreadable password hash for {:?}: {:?}", user.username, e);
        ApiError::Internal(e.to_string())
    })?;
    if !matches {
        log::warn!("login rejected for {:?}: wrong password", username);
        return Err(ApiError::BadLogin);
    }

    let now = ctx.clock.now().naive_utc();
    let purged = store.purge_sessions(now)?;
    if purged > 0 {
        log::debug!("purged {} expired sessions", purged);
    }

    let session = Session {
        token: Uuid::new_v4(),
        user_id: user.id,
        created_at: now,
        expires_at: now + ctx.session_ttl,
    };
    store.insert_session(&session)?;

    log::info!("{} ({}) logged in", user.username, user.role);
    Ok(LoginResponse {
        token: session.token,
        user: UserSummary::from(&user),
    })
}

/// Extracts the token from an `Authorization` header value.
///
/// Returns `None` when there is no usable token, which callers treat as an
/// anonymous request.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Maps a bearer token to the caller it identifies.
pub fn resolve_caller<S: AccountStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    token: Option<&str>,
) -> Result<Caller, StoreError> {
    let Some(raw) = token else {
        return Ok(Caller::Anonymous);
    };
    let Ok(token) = Uuid::parse_str(raw) else {
        log::debug!("malformed bearer token");
        return Ok(Caller::Invalid);
    };

    match store.find_session(token)? {
        Some((session, user)) if session.expires_at > ctx.clock.now().naive_utc() => {
            Ok(Caller::Authenticated(UserSummary::from(&user)))
        }
        Some(_) => {
            log::debug!("expired session presented");
            Ok(Caller::Invalid)
        }
        None => Ok(Caller::Invalid),
    }
}

/// Creates an operator account. Booth staff must be tied to a booth.
pub fn register_user<S: AccountStore + ?Sized>(
    store: &mut S,
    ctx: &Context,
    username: &str,
    password: &str,
    role: Role,
    booth_id: Option<i32>,
    bcrypt_cost: u32,
) -> Result<UserSummary, ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("username", "사용자명을 입력해주세요."));
    }
    if username.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::validation("username", "사용자명이 너무 깁니다."));
    }
    if password.is_empty() {
        return Err(ApiError::validation("password", "비밀번호를 입력해주세요."));
    }
    if role == Role::BoothStaff && booth_id.is_none() {
        return Err(ApiError::validation("booth_id", "부스 담당자는 부스를 지정해야 합니다."));
    }

    let password_hash = bcrypt::hash(password, bcrypt_cost).map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = NewAdminUser {
        username: username.to_string(),
        password_hash,
        role,
        booth_id,
        created_at: ctx.clock.now().naive_utc(),
    };

    match store.insert_user(&user) {
        Ok(created) => Ok(UserSummary::from(&created)),
        Err(StoreError::UniqueViolation) => Err(ApiError::validation("username", "이미 존재하는 사용자명입니다.")),
        Err(StoreError::ForeignKeyViolation) => Err(ApiError::NotFound("booth")),
        Err(e) => Err(e.into()),
    }
}
