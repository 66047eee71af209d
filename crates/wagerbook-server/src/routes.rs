//! HTTP routes.
//!
//! Every response carries a JSON envelope: `status` is `0` on success or the
//! ledger error code, `desc` is a human-readable message, and `data` holds the
//! payload when there is one.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use wagerbook_ledger::engine::{Authorization, Profile, ReconcileReport};
use wagerbook_ledger::storage::{
    Bet, Match, MatchFields, MatchResult, MatchStage, RewardGrant, Standing, User,
};
use wagerbook_ledger::{Ledger, LedgerError};

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub ledger: Ledger,
}

/// Build the router with all ledger endpoints.
pub fn build_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/new_schedule", put(new_schedule))
        .route("/schedules", get(schedules))
        .route("/update_schedule", post(update_schedule))
        .route("/close_betting", post(close_betting))
        .route("/bet", get(bet).post(place_bet))
        .route("/authorize", post(authorize))
        .route("/daily_reward", post(daily_reward))
        .route("/reset_password", post(reset_password))
        .route("/grant_reset_password", post(grant_reset_password))
        .route("/add_new_user", post(add_new_user))
        .route("/rank", get(rank))
        .route("/betting_history", get(betting_history))
        .route("/reward_history", get(reward_history))
        .route("/my", get(my))
        .route("/reconcile", post(reconcile))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =========================================================================
// Envelope and errors
// =========================================================================

#[derive(Debug, Serialize)]
struct Envelope<T: Serialize> {
    status: u16,
    desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: 0,
        desc: "ok".to_string(),
        data: Some(data),
    })
}

fn done() -> Json<Envelope<()>> {
    Json(Envelope {
        status: 0,
        desc: "ok".to_string(),
        data: None,
    })
}

/// A ledger failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self(LedgerError::invalid(e.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self(LedgerError::invalid(e.body_text()))
    }
}

/// HTTP status for each ledger failure kind.
pub const fn http_status(e: &LedgerError) -> StatusCode {
    match e {
        LedgerError::InvalidInput(_)
        | LedgerError::InsufficientFunds { .. }
        | LedgerError::BettingClosed(_) => StatusCode::BAD_REQUEST,
        LedgerError::IncorrectPassword => StatusCode::UNAUTHORIZED,
        LedgerError::NotWhitelisted | LedgerError::ResetNotAllowed => StatusCode::FORBIDDEN,
        LedgerError::MatchNotFound(_)
        | LedgerError::UserNotFound
        | LedgerError::BetNotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::DuplicateBet { .. }
        | LedgerError::AlreadyClaimed { .. }
        | LedgerError::ResultAlreadyPosted { .. } => StatusCode::CONFLICT,
        LedgerError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = http_status(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = Envelope::<()> {
            status: self.0.code(),
            desc: self.0.to_string(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

fn parse_result(raw: i64) -> Result<MatchResult, ApiError> {
    MatchResult::try_from(raw).map_err(|e| ApiError(LedgerError::invalid(e.to_string())))
}

// =========================================================================
// Schedule
// =========================================================================

#[derive(Debug, Serialize)]
struct CreatedMatch {
    #[serde(rename = "match")]
    fixture: Match,
    created: bool,
}

/// `PUT /new_schedule`
async fn new_schedule(
    State(state): State<AppState>,
    body: Result<Json<MatchFields>, JsonRejection>,
) -> ApiResult<CreatedMatch> {
    let Json(fields) = body?;
    let (fixture, created) = state.ledger.create_match(&fields).await?;
    Ok(ok(CreatedMatch { fixture, created }))
}

#[derive(Debug, Deserialize)]
struct ScheduleQuery {
    #[serde(rename = "type")]
    stage: Option<i64>,
    #[serde(default)]
    all: bool,
}

/// `GET /schedules?type=<stage>&all=<bool>`
async fn schedules(
    State(state): State<AppState>,
    query: Result<Query<ScheduleQuery>, QueryRejection>,
) -> ApiResult<Vec<Match>> {
    let Query(q) = query?;
    let stage = q
        .stage
        .map(MatchStage::try_from)
        .transpose()
        .map_err(|e| ApiError(LedgerError::invalid(e.to_string())))?;
    Ok(ok(state.ledger.list_matches(stage, q.all).await?))
}

#[derive(Debug, Deserialize)]
struct UpdateScheduleRequest {
    match_id: i64,
    #[serde(default)]
    result: i64,
    fields: Option<MatchFields>,
}

/// `POST /update_schedule`
///
/// A decisive `result` posts it and settles the match. Result `0` only edits
/// the fields of a match that has not finished.
async fn update_schedule(
    State(state): State<AppState>,
    body: Result<Json<UpdateScheduleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let result = parse_result(req.result)?;

    if result.is_decisive() {
        let summary = state
            .ledger
            .post_result(req.match_id, result, req.fields.as_ref())
            .await?;
        return Ok(ok(summary).into_response());
    }

    let Some(fields) = req.fields else {
        return Err(LedgerError::invalid("fields are required when result is 0").into());
    };
    let updated = state.ledger.amend_match(req.match_id, &fields).await?;
    Ok(ok(updated).into_response())
}

#[derive(Debug, Deserialize)]
struct CloseBettingRequest {
    match_id: i64,
    #[serde(default = "default_closed")]
    closed: bool,
}

const fn default_closed() -> bool {
    true
}

/// `POST /close_betting`
async fn close_betting(
    State(state): State<AppState>,
    body: Result<Json<CloseBettingRequest>, JsonRejection>,
) -> ApiResult<Match> {
    let Json(req) = body?;
    Ok(ok(state
        .ledger
        .set_betting_closed(req.match_id, req.closed)
        .await?))
}

// =========================================================================
// Bets and rewards
// =========================================================================

#[derive(Debug, Deserialize)]
struct BetRequest {
    user_id: i64,
    match_id: i64,
    stake: i64,
    predicted: i64,
}

/// `POST /bet`
async fn place_bet(
    State(state): State<AppState>,
    body: Result<Json<BetRequest>, JsonRejection>,
) -> ApiResult<Bet> {
    let Json(req) = body?;
    let predicted = parse_result(req.predicted)?;
    let bet = state
        .ledger
        .place_bet(req.user_id, req.match_id, req.stake, predicted)
        .await?;
    Ok(ok(bet))
}

#[derive(Debug, Deserialize)]
struct BetQuery {
    user_id: i64,
    match_id: i64,
}

/// `GET /bet?user_id=<id>&match_id=<id>`
async fn bet(
    State(state): State<AppState>,
    query: Result<Query<BetQuery>, QueryRejection>,
) -> ApiResult<Bet> {
    let Query(q) = query?;
    Ok(ok(state.ledger.bet(q.user_id, q.match_id).await?))
}

#[derive(Debug, Deserialize)]
struct UserRequest {
    user_id: i64,
}

/// `POST /daily_reward`
async fn daily_reward(
    State(state): State<AppState>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult<RewardGrant> {
    let Json(req) = body?;
    Ok(ok(state.ledger.claim_daily_reward(req.user_id).await?))
}

// =========================================================================
// Accounts
// =========================================================================

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    chinese_name: String,
    english_name: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct NamesRequest {
    chinese_name: String,
    english_name: String,
}

/// `POST /authorize`
async fn authorize(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Authorization> {
    let Json(req) = body?;
    let auth = state
        .ledger
        .authorize(&req.chinese_name, &req.english_name, &req.password)
        .await?;
    Ok(ok(auth))
}

/// `POST /reset_password`
async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(req) = body?;
    state
        .ledger
        .reset_password(&req.chinese_name, &req.english_name, &req.password)
        .await?;
    Ok(done())
}

/// `POST /grant_reset_password`
async fn grant_reset_password(
    State(state): State<AppState>,
    body: Result<Json<NamesRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(req) = body?;
    let user = state
        .ledger
        .grant_reset_password(&req.chinese_name, &req.english_name)
        .await?;
    Ok(ok(user))
}

/// `POST /add_new_user`
async fn add_new_user(
    State(state): State<AppState>,
    body: Result<Json<NamesRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(req) = body?;
    state
        .ledger
        .add_whitelist_entry(&req.chinese_name, &req.english_name)?;
    Ok(done())
}

// =========================================================================
// Views
// =========================================================================

#[derive(Debug, Deserialize)]
struct RankQuery {
    limit: Option<u32>,
}

/// `GET /rank?limit=<n>`
async fn rank(
    State(state): State<AppState>,
    query: Result<Query<RankQuery>, QueryRejection>,
) -> ApiResult<Vec<Standing>> {
    let Query(q) = query?;
    Ok(ok(state.ledger.leaderboard(q.limit).await?))
}

/// `GET /betting_history?user_id=<id>`
async fn betting_history(
    State(state): State<AppState>,
    query: Result<Query<UserRequest>, QueryRejection>,
) -> ApiResult<Vec<Bet>> {
    let Query(q) = query?;
    Ok(ok(state.ledger.bet_history(q.user_id).await?))
}

/// `GET /reward_history?user_id=<id>`
async fn reward_history(
    State(state): State<AppState>,
    query: Result<Query<UserRequest>, QueryRejection>,
) -> ApiResult<Vec<RewardGrant>> {
    let Query(q) = query?;
    Ok(ok(state.ledger.reward_history(q.user_id).await?))
}

/// `GET /my?user_id=<id>`
async fn my(
    State(state): State<AppState>,
    query: Result<Query<UserRequest>, QueryRejection>,
) -> ApiResult<Profile> {
    let Query(q) = query?;
    Ok(ok(state.ledger.profile(q.user_id).await?))
}

/// `POST /reconcile`
async fn reconcile(State(state): State<AppState>) -> ApiResult<ReconcileReport> {
    Ok(ok(state.ledger.reconcile().await?))
}
