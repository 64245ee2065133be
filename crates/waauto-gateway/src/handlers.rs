// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the dashboard REST API.

use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use waauto_bus::DashboardEvent;
use waauto_core::WaautoError;
use waauto_core::types::{
    AutoReplyRule, LogStats, MatchMode, MediaRef, MessageLog, ScheduledMessage, StatusSnapshot,
};
use waauto_engine::{BulkRequest, RuleUpdate};
use waauto_storage::queries::{logs, scheduled, settings};

use crate::server::GatewayState;

/// Timestamp format shared with the storage layer.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Generic success acknowledgment.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Pipeline errors mapped onto HTTP statuses.
///
/// `NotConnected` is the operator's problem to fix (503), a protocol-layer
/// rejection is the bridge's (502), validation is the request's (400), and
/// storage trouble is ours (500).
pub struct ApiError(WaautoError);

impl From<WaautoError> for ApiError {
    fn from(e: WaautoError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WaautoError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            WaautoError::Send { .. } => StatusCode::BAD_GATEWAY,
            WaautoError::Internal(_) | WaautoError::Config(_) => StatusCode::BAD_REQUEST,
            WaautoError::Storage { .. } | WaautoError::Channel { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn success() -> Response {
    Json(SuccessResponse { success: true }).into_response()
}

// --- Status ---

/// GET /api/status
pub async fn get_status(State(state): State<GatewayState>) -> Json<StatusSnapshot> {
    Json(state.transport.status())
}

// --- Single send ---

/// Request body for POST /api/send.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub phone: String,
    pub message: String,
}

/// POST /api/send
pub async fn post_send(
    State(state): State<GatewayState>,
    Json(body): Json<SendRequest>,
) -> Result<Response, ApiError> {
    if body.phone.trim().is_empty() || body.message.trim().is_empty() {
        return Ok(bad_request("phone and message are required"));
    }
    state.dispatcher.send(&body.phone, &body.message, None).await?;
    Ok(success())
}

// --- Bulk send ---

/// Response body for POST /api/bulk-send.
#[derive(Debug, Serialize)]
pub struct BulkQueuedResponse {
    pub queued: usize,
    pub status: &'static str,
}

/// POST /api/bulk-send (multipart form data)
///
/// Fields: `phones` (newline-separated), `message`, `delay` (ms), optional
/// single `media` file. Replies immediately with the queued count; the run
/// continues as a detached task and reports only through the event bus.
pub async fn post_bulk_send(
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut phones_text = String::new();
    let mut message = String::new();
    let mut delay_text = String::new();
    let mut media: Option<MediaRef> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WaautoError::Internal(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "phones" => {
                phones_text = field
                    .text()
                    .await
                    .map_err(|e| WaautoError::Internal(format!("bad phones field: {e}")))?;
            }
            "message" => {
                message = field
                    .text()
                    .await
                    .map_err(|e| WaautoError::Internal(format!("bad message field: {e}")))?;
            }
            "delay" => {
                delay_text = field
                    .text()
                    .await
                    .map_err(|e| WaautoError::Internal(format!("bad delay field: {e}")))?;
            }
            "media" => {
                let filename = field.file_name().map(|s| s.to_string());
                let mime_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| WaautoError::Internal(format!("bad media field: {e}")))?;
                if data.is_empty() {
                    continue;
                }
                media = Some(stage_upload(&state, filename, mime_type, &data).await?);
            }
            _ => {}
        }
    }

    let phones: Vec<String> = phones_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if phones.is_empty() {
        return Ok(bad_request("no valid phone numbers provided"));
    }
    if message.trim().is_empty() && media.is_none() {
        return Ok(bad_request("message or media is required"));
    }

    let requested_delay = delay_text.trim().parse::<i64>().ok();
    let delay_ms = state.bulk.resolve_delay(requested_delay).await;

    let queued = phones.len();
    let request = BulkRequest {
        phones,
        message,
        media,
        delay_ms,
    };
    let bulk = state.bulk.clone();
    tokio::spawn(async move {
        if let Err(e) = bulk.run(request).await {
            tracing::error!(error = %e, "bulk run aborted");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(BulkQueuedResponse {
            queued,
            status: "processing",
        }),
    )
        .into_response())
}

/// Persist an uploaded media file under the staging directory.
async fn stage_upload(
    state: &GatewayState,
    filename: Option<String>,
    mime_type: Option<String>,
    data: &[u8],
) -> Result<MediaRef, WaautoError> {
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| WaautoError::Internal(format!("cannot create upload dir: {e}")))?;

    let extension = filename
        .as_deref()
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let path = state
        .upload_dir
        .join(format!("{}{extension}", uuid::Uuid::new_v4()));

    tokio::fs::write(&path, data)
        .await
        .map_err(|e| WaautoError::Internal(format!("cannot stage upload: {e}")))?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "media upload staged");
    Ok(MediaRef {
        path,
        mime_type,
        filename,
    })
}

// --- Auto-reply rules ---

/// Response body for GET /api/auto-replies.
#[derive(Debug, Serialize)]
pub struct AutoRepliesResponse {
    pub enabled: bool,
    pub rules: Vec<AutoReplyRule>,
}

/// GET /api/auto-replies
pub async fn get_auto_replies(
    State(state): State<GatewayState>,
) -> Result<Json<AutoRepliesResponse>, ApiError> {
    let rules = waauto_storage::queries::rules::list_rules(&state.db).await?;
    Ok(Json(AutoRepliesResponse {
        enabled: state.autoreply.is_enabled(),
        rules,
    }))
}

/// Request body for POST /api/auto-replies.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub keyword: String,
    pub reply: String,
    #[serde(default)]
    pub match_mode: Option<MatchMode>,
}

/// Response body for POST /api/auto-replies and POST /api/scheduled.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub success: bool,
}

/// POST /api/auto-replies
pub async fn post_auto_reply(
    State(state): State<GatewayState>,
    Json(body): Json<CreateRuleRequest>,
) -> Result<Response, ApiError> {
    if body.keyword.trim().is_empty() || body.reply.trim().is_empty() {
        return Ok(bad_request("keyword and reply are required"));
    }
    let mode = body.match_mode.unwrap_or(MatchMode::Contains);
    let id = state
        .autoreply
        .add_rule(&body.keyword, &body.reply, mode, true)
        .await?;
    Ok(Json(CreatedResponse { id, success: true }).into_response())
}

/// Request body for PUT /api/auto-replies/{id}. Absent fields keep their
/// stored values.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateRuleRequest {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub match_mode: Option<MatchMode>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// PUT /api/auto-replies/{id}
pub async fn put_auto_reply(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRuleRequest>,
) -> Result<Response, ApiError> {
    let update = RuleUpdate {
        keyword: body.keyword,
        reply: body.reply,
        match_mode: body.match_mode,
        enabled: body.enabled,
    };
    if state.autoreply.update_rule(id, update).await? {
        Ok(success())
    } else {
        Ok(not_found("rule not found"))
    }
}

/// DELETE /api/auto-replies/{id}
pub async fn delete_auto_reply(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    if state.autoreply.delete_rule(id).await? {
        Ok(success())
    } else {
        Ok(not_found("rule not found"))
    }
}

/// Request body for POST /api/auto-replies/toggle.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Response body for POST /api/auto-replies/toggle.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}

/// POST /api/auto-replies/toggle
pub async fn post_auto_reply_toggle(
    State(state): State<GatewayState>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ApiError> {
    state.autoreply.set_enabled(body.enabled).await?;
    Ok(Json(ToggleResponse {
        enabled: state.autoreply.is_enabled(),
    }))
}

// --- Scheduled messages ---

/// GET /api/scheduled
pub async fn get_scheduled(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<ScheduledMessage>>, ApiError> {
    let messages = scheduled::list_scheduled(&state.db).await?;
    Ok(Json(messages))
}

/// Request body for POST /api/scheduled.
#[derive(Debug, Deserialize)]
pub struct CreateScheduledRequest {
    pub phone: String,
    pub message: String,
    pub scheduled_at: String,
}

/// POST /api/scheduled
pub async fn post_scheduled(
    State(state): State<GatewayState>,
    Json(body): Json<CreateScheduledRequest>,
) -> Result<Response, ApiError> {
    if body.phone.trim().is_empty() || body.message.trim().is_empty() {
        return Ok(bad_request("phone, message, and scheduled_at are required"));
    }
    let Some(scheduled_at) = parse_scheduled_at(&body.scheduled_at) else {
        return Ok(bad_request("scheduled_at is not a recognizable timestamp"));
    };

    let id = scheduled::insert_scheduled(&state.db, &body.phone, &body.message, &scheduled_at)
        .await?;
    Ok(Json(CreatedResponse { id, success: true }).into_response())
}

/// DELETE /api/scheduled/{id}
///
/// Only pending rows are deletable; terminal rows report not found.
pub async fn delete_scheduled(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    if scheduled::delete_scheduled(&state.db, id).await? {
        Ok(success())
    } else {
        Ok(not_found("no pending scheduled message with that id"))
    }
}

/// Normalize an operator-supplied timestamp to the canonical column format.
///
/// Accepts RFC 3339 (offset preserved, converted to UTC) and the naive
/// `datetime-local` forms the dashboard produces (treated as UTC).
fn parse_scheduled_at(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(
            dt.with_timezone(&chrono::Utc)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        );
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().format(TIMESTAMP_FORMAT).to_string());
        }
    }
    None
}

// --- Logs and stats ---

/// Query parameters for GET /api/logs.
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// GET /api/logs?limit=
pub async fn get_logs(
    State(state): State<GatewayState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<MessageLog>>, ApiError> {
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(100);
    let rows = logs::list_logs(&state.db, limit).await?;
    Ok(Json(rows))
}

/// GET /api/stats
pub async fn get_stats(State(state): State<GatewayState>) -> Result<Json<LogStats>, ApiError> {
    let stats = logs::log_stats(&state.db).await?;
    Ok(Json(stats))
}

// --- Settings ---

/// Response body for GET /api/settings.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub bulk_delay_ms: u64,
    pub auto_reply_enabled: bool,
}

/// GET /api/settings
pub async fn get_settings(
    State(state): State<GatewayState>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let bulk_delay_ms = settings::get_setting(&state.db, "bulk_delay_ms")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    Ok(Json(SettingsResponse {
        bulk_delay_ms,
        auto_reply_enabled: state.autoreply.is_enabled(),
    }))
}

/// Request body for PUT /api/settings.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub bulk_delay_ms: Option<u64>,
    #[serde(default)]
    pub auto_reply_enabled: Option<bool>,
}

/// PUT /api/settings
pub async fn put_settings(
    State(state): State<GatewayState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Response, ApiError> {
    if let Some(delay) = body.bulk_delay_ms {
        settings::set_setting(&state.db, "bulk_delay_ms", &delay.to_string()).await?;
    }
    if let Some(enabled) = body.auto_reply_enabled {
        state.autoreply.set_enabled(enabled).await?;
    }
    Ok(success())
}

// --- Logout ---

/// POST /api/logout
pub async fn post_logout(State(state): State<GatewayState>) -> Result<Response, ApiError> {
    state.transport.logout().await?;
    let snapshot = state.transport.status();
    state.bus.publish(DashboardEvent::Status {
        status: snapshot.status,
        info: snapshot.info,
        error: snapshot.error,
    });
    Ok(success())
}
