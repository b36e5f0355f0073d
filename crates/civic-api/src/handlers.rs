//! API Handlers
use crate::auth::CurrentAuthority;
use crate::error::{ApiError, ApiResult};
use crate::views::{
    AuthorityView, PublicReport, ReportList, ResolutionUpdated, Submitted, Verified,
};
use crate::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use civic_core::{CivicError, ReportId, SubmissionForm, CIVIC_VERSION};
use civic_service::ListRequest;
use civic_store::{ImageUpload, DEFAULT_LIMIT, MAX_LIMIT};
use serde::Deserialize;
use serde_json::{json, Value};

/// `POST /v1/reports` (multipart, public)
pub async fn submit_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Submitted>)> {
    let mut form = SubmissionForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(malformed)?;
            upload = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(malformed)?;
        match name.as_str() {
            "issue_type" => form.issue_type = Some(value),
            "region" | "pincode" => form.region = Some(value),
            "address" => form.address = Some(value),
            "description" => form.description = Some(value),
            "latitude" => form.latitude = Some(value),
            "longitude" => form.longitude = Some(value),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    let report = state.service.submit(form, upload).await?;
    state.metrics.report_submitted();
    Ok((StatusCode::CREATED, Json(Submitted::from(&report))))
}

fn malformed(err: axum::extract::multipart::MultipartError) -> ApiError {
    CivicError::validation(format!("malformed form: {}", err.body_text())).into()
}

/// `GET /v1/track/{tracking_code}` (public)
pub async fn track_report(
    State(state): State<AppState>,
    Path(tracking_code): Path<String>,
) -> ApiResult<Json<PublicReport>> {
    let report = state.service.track(&tracking_code).await?;
    Ok(Json(PublicReport::from(&report)))
}

/// `GET /v1/reports`
pub async fn list_reports(
    State(state): State<AppState>,
    CurrentAuthority(principal): CurrentAuthority,
    Query(request): Query<ListRequest>,
) -> ApiResult<Json<ReportList>> {
    let page = state
        .service
        .list(&principal, &request)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(ReportList {
        reports: page.items,
        total: page.total,
        limit: request.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        skip: request.skip.unwrap_or(0),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResolutionRequest {
    pub status: String,
}

/// `PUT /v1/reports/{id}/resolution`
pub async fn update_resolution(
    State(state): State<AppState>,
    CurrentAuthority(principal): CurrentAuthority,
    Path(id): Path<String>,
    Json(body): Json<ResolutionRequest>,
) -> ApiResult<Json<ResolutionUpdated>> {
    let id: ReportId = id.parse()?;
    let report = state
        .service
        .set_resolution(&principal, id, &body.status)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(ResolutionUpdated {
        message: "Status updated successfully",
        report,
    }))
}

/// `POST /v1/reports/{id}/verify`
pub async fn verify_report(
    State(state): State<AppState>,
    CurrentAuthority(principal): CurrentAuthority,
    Path(id): Path<String>,
) -> ApiResult<Json<Verified>> {
    let id: ReportId = id.parse()?;
    let (outcome, result) = state.service.verify_with_outcome(&principal, id).await;
    state.metrics.verification(outcome);

    let verified = result.map_err(|e| state.reject(e))?;
    Ok(Json(Verified::from(verified)))
}

/// `GET /v1/auth/me`
pub async fn me(CurrentAuthority(principal): CurrentAuthority) -> Json<AuthorityView> {
    Json(AuthorityView::from(&principal))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "version": CIVIC_VERSION })))
}

/// `GET /metrics` in the Prometheus text format
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
