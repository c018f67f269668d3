//! Shared helpers for the HTTP integration tests.
//!
//! The server decides "today" from the wall clock, so fixtures here are built
//! relative to [`today`] instead of fixed dates. Schedules run every day of
//! the week so any future date is an operating day.

#![allow(dead_code)]

use std::sync::Arc;

use academy_api::auth::jwt::{sign_token, JwtConfig};
use academy_api::config::ServerConfig;
use academy_api::router::build_app_router;
use academy_api::state::AppState;
use academy_core::roles::{ROLE_ADMIN, ROLE_CUSTOMER};
use academy_core::types::{Date, DbId};
use academy_db::models::course::{CreateCourse, CreateCourseSchedule};
use academy_db::models::master_package::{CreateMasterPackage, CreateMasterPackageCourse};
use academy_db::repositories::{CourseRepo, MasterPackageRepo, ScheduleRepo};
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Days, FixedOffset};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

pub const CUSTOMER: DbId = 501;
pub const OTHER_CUSTOMER: DbId = 502;
pub const ADMIN: DbId = 9001;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and the academy on UTC.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        academy_utc_offset: FixedOffset::east_opt(0).unwrap(),
        booking_sweep_interval_secs: 900,
        max_body_bytes: 64 * 1024,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: Some("academy-test".to_string()),
            leeway_secs: 0,
        },
    }
}

/// Build the full application router, using the same middleware stack as
/// production.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub fn customer_token(user_id: DbId) -> String {
    sign_token(user_id, ROLE_CUSTOMER, 15, &test_config().jwt).unwrap()
}

pub fn admin_token() -> String {
    sign_token(ADMIN, ROLE_ADMIN, 15, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn today() -> Date {
    test_config().today()
}

pub fn days_from_today(days: u64) -> Date {
    today().checked_add_days(Days::new(days)).unwrap()
}

pub fn days_before_today(days: u64) -> Date {
    today().checked_sub_days(Days::new(days)).unwrap()
}

/// Catalog built by [`seed_catalog`].
pub struct Catalog {
    pub swimming: DbId,
    pub tennis: DbId,
    /// Course outside every package.
    pub archery: DbId,
    pub swim_schedule: DbId,
    pub archery_schedule: DbId,
    /// 3 swimming + 2 tennis sessions, valid 60 days.
    pub combo_package: DbId,
}

pub async fn seed_catalog(pool: &PgPool, capacity_per_day: i32) -> Catalog {
    let swimming = course(pool, "Swimming").await;
    let tennis = course(pool, "Tennis").await;
    let archery = course(pool, "Archery").await;

    let swim_schedule = daily_schedule(pool, swimming, capacity_per_day).await;
    let archery_schedule = daily_schedule(pool, archery, capacity_per_day).await;

    let combo = MasterPackageRepo::create(
        pool,
        &CreateMasterPackage {
            name: "Swim & Tennis".to_string(),
            validity_days: 60,
            courses: vec![
                CreateMasterPackageCourse {
                    course_id: swimming,
                    sessions: 3,
                },
                CreateMasterPackageCourse {
                    course_id: tennis,
                    sessions: 2,
                },
            ],
        },
    )
    .await
    .unwrap();

    Catalog {
        swimming,
        tennis,
        archery,
        swim_schedule,
        archery_schedule,
        combo_package: combo.id,
    }
}

async fn course(pool: &PgPool, name: &str) -> DbId {
    CourseRepo::create(
        pool,
        &CreateCourse {
            name: name.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn daily_schedule(pool: &PgPool, course_id: DbId, capacity_per_day: i32) -> DbId {
    ScheduleRepo::create(
        pool,
        &CreateCourseSchedule {
            course_id,
            name: "Every day".to_string(),
            days_of_week: vec![1, 2, 3, 4, 5, 6, 7],
            capacity_per_day,
            starts_on: days_before_today(120),
            ends_on: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// Buy the combo package over HTTP and return its id.
pub async fn buy_combo(pool: &PgPool, catalog: &Catalog, customer: DbId) -> DbId {
    let app = build_test_app(pool.clone());
    let uri = format!("/api/v1/booking/package-booking/{}", catalog.combo_package);
    let response = post_auth(app, &uri, &customer_token(customer)).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Body of a swimming booking request.
pub fn swim_request(package_id: DbId, catalog: &Catalog, dates: &[Date]) -> Value {
    json!({
        "purchasedPackageId": package_id,
        "courseId": catalog.swimming,
        "scheduleId": catalog.swim_schedule,
        "bookedDates": dates.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "participants": [{ "firstName": "Ana", "lastName": "Silva" }],
    })
}

/// Remaining sessions of a package as reported by the API.
pub async fn remaining_sessions(pool: &PgPool, customer: DbId, package_id: DbId) -> i64 {
    let app = build_test_app(pool.clone());
    let uri = format!("/api/v1/users/me/packages/{package_id}");
    let response = get_auth(app, &uri, &customer_token(customer)).await;
    body_json(response).await["data"]["remainingSessions"]
        .as_i64()
        .unwrap()
}
