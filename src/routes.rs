use std::future::{ready, Ready};

use actix_cors::Cors;
use actix_web::{
    delete, dev::Payload, error, get, http::header, middleware, post, web, FromRequest, HttpRequest, HttpResponse,
    Responder,
};

use crate::access::Caller;
use crate::auth;
use crate::config::Context;
use crate::db::DbPool;
use crate::error::{ApiError, ErrorBody};
use crate::models::{ApiResponse, BoothRequest, EntryRequest, HealthResponse, LoginRequest};
use crate::stats;

/// Shared across workers; cloned cheaply into each blocking task.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub ctx: Context,
}

/// Bearer token from the `Authorization` header. Extraction fails with 401
/// when no token is present; wrap in `Option` for routes that accept
/// anonymous callers.
#[derive(Debug, Clone)]
pub struct Bearer(pub String);

impl FromRequest for Bearer {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let value = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
        ready(
            auth::bearer_token(value)
                .map(|token| Bearer(token.to_string()))
                .ok_or(ApiError::Unauthenticated),
        )
    }
}

fn token(bearer: &Option<Bearer>) -> Option<&str> {
    bearer.as_ref().map(|b| b.0.as_str())
}

#[post("/login")]
async fn login(state: web::Data<AppState>, form: web::Json<LoginRequest>) -> Result<impl Responder, ApiError> {
    let response = web::block(move || -> Result<_, ApiError> {
        let mut conn = state.pool.get()?;
        auth::login(&mut *conn, &state.ctx, &form.username, &form.password)
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

#[get("/booths")]
async fn list_booths(state: web::Data<AppState>) -> Result<impl Responder, ApiError> {
    let booths = web::block(move || -> Result<_, ApiError> {
        let mut conn = state.pool.get()?;
        stats::list_booths(&mut *conn)
    })
    .await??;

    Ok(HttpResponse::Ok().json(booths))
}

#[post("/booths")]
async fn create_booth(
    state: web::Data<AppState>,
    bearer: Bearer,
    form: web::Json<BoothRequest>,
) -> Result<impl Responder, ApiError> {
    let booth = web::block(move || -> Result<_, ApiError> {
        let mut conn = state.pool.get()?;
        let caller = auth::resolve_caller(&mut *conn, &state.ctx, Some(&bearer.0))?;
        stats::create_booth(&mut *conn, &state.ctx, &caller, form.name.as_deref())
    })
    .await??;

    Ok(HttpResponse::Created().json(booth))
}

#[delete("/booths/{id}")]
async fn delete_booth(
    state: web::Data<AppState>,
    bearer: Bearer,
    path: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let booth_id = path.into_inner();

    web::block(move || -> Result<_, ApiError> {
        let mut conn = state.pool.get()?;
        let caller = auth::resolve_caller(&mut *conn, &state.ctx, Some(&bearer.0))?;
        stats::delete_booth(&mut *conn, &caller, booth_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(ApiResponse {
        message: "부스가 삭제되었습니다.".to_string(),
    }))
}

#[post("/guestbook")]
async fn submit_entry(state: web::Data<AppState>, form: web::Json<EntryRequest>) -> Result<impl Responder, ApiError> {
    let created = web::block(move || -> Result<_, ApiError> {
        let mut conn = state.pool.get()?;
        stats::submit_entry(&mut *conn, &state.ctx, &form)
    })
    .await??;

    Ok(HttpResponse::Created().json(created))
}

#[get("/stats/all")]
async fn global_stats(state: web::Data<AppState>, bearer: Bearer) -> Result<impl Responder, ApiError> {
    let result = web::block(move || -> Result<_, ApiError> {
        let mut conn = state.pool.get()?;
        let caller = auth::resolve_caller(&mut *conn, &state.ctx, Some(&bearer.0))?;
        stats::global_stats(&mut *conn, &state.ctx, &caller)
    })
    .await??;

    Ok(HttpResponse::Ok().json(result))
}

#[get("/stats/booth/{booth_id}")]
async fn booth_stats(
    state: web::Data<AppState>,
    bearer: Option<Bearer>,
    path: web::Path<i32>,
) -> Result<impl Responder, ApiError> {
    let booth_id = path.into_inner();

    let result = web::block(move || -> Result<_, ApiError> {
        let mut conn = state.pool.get()?;
        let caller = match token(&bearer) {
            Some(t) => auth::resolve_caller(&mut *conn, &state.ctx, Some(t))?,
            None => Caller::Anonymous,
        };
        stats::booth_stats(&mut *conn, &state.ctx, &caller, booth_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(result))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody { error: message })
}

/// Body and path extractors report malformed input as `{"error": ...}` 400s.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = match err {
            error::JsonPayloadError::ContentType => {
                HttpResponse::UnsupportedMediaType().json(ErrorBody { error: "JSON 형식으로 요청해주세요.".to_string() })
            }
            error::JsonPayloadError::Deserialize(ref e) => {
                log::debug!("rejected request body: {}", e);
                bad_request("요청 형식이 올바르지 않습니다.".to_string())
            }
            error::JsonPayloadError::Overflow { .. } | error::JsonPayloadError::OverflowKnownLength { .. } => {
                HttpResponse::PayloadTooLarge().json(ErrorBody { error: "요청 본문이 너무 큽니다.".to_string() })
            }
            ref other => {
                log::debug!("unreadable request body: {}", other);
                bad_request("요청 형식이 올바르지 않습니다.".to_string())
            }
        };
        error::InternalError::from_response(err, response).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        error::InternalError::from_response(err, bad_request("잘못된 요청 경로입니다.".to_string())).into()
    }));
}

// Same directives the booth pages were served with: CDN scripts and fonts.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' https://cdn.tailwindcss.com https://cdn.jsdelivr.net; \
    style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
    font-src 'self' https://fonts.gstatic.com; \
    img-src 'self' data: https:; \
    connect-src 'self'";

/// Hardening headers added to every response.
pub fn security_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add((header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY))
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "SAMEORIGIN"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add((header::STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"))
        .add((header::X_DNS_PREFETCH_CONTROL, "off"))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Cross-Origin-Resource-Policy", "same-origin"))
        .add(("X-Permitted-Cross-Domain-Policies", "none"))
}

/// Display screens and kiosks load from other origins; the API answers any of them.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope("/api")
            .configure(extractor_config)
            .service(login)
            .service(list_booths)
            .service(create_booth)
            .service(delete_booth)
            .service(submit_entry)
            .service(global_stats)
            .service(booth_stats),
    );
}
