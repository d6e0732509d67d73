//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        AddFilesRequest, AddFilesResponse, BalanceResponse, ErrorResponse, HealthResponse,
        IssueRequest, ListingsResponse, MAX_FILE_SIZE, ProjectJson, ProjectListParams,
        ProjectListResponse, PurchaseRequest, PurchaseResponse, RetireRequest, RetireResponse,
        ReviewRequest, StatusResponse, StepResponse, WizardCreated, WizardSnapshot,
    },
    wallet::require_wallet,
};
use crate::orchestrator::{self, WizardSession};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bluecarbon_core::{
    Cid, FileSelection, MarketError, ProjectFilter, ProjectId, ProjectStatus, ProjectType,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Map a core error to the HTTP status the dashboard expects.
fn error_status(err: &MarketError) -> StatusCode {
    match err {
        MarketError::ProjectNotFound(_) | MarketError::EntryNotFound(_) => StatusCode::NOT_FOUND,
        MarketError::UploadsIncomplete
        | MarketError::EntryNotIn(_, _)
        | MarketError::InvalidStatus { .. } => StatusCode::CONFLICT,
        MarketError::InsufficientCredits { .. }
        | MarketError::InsufficientBalance { .. }
        | MarketError::ZeroAmount
        | MarketError::UnknownProjectType(_)
        | MarketError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
        MarketError::SerializationError(_) | MarketError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        MarketError::GatewayError(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: &MarketError) -> Response {
    (
        error_status(err),
        Json(ErrorResponse::new(err.to_string())),
    )
        .into_response()
}

// =============================================================================
// HEALTH & STATUS HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Get registry status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let response = StatusResponse::from(registry.stats());
    (StatusCode::OK, Json(response))
}

// =============================================================================
// PROJECT HANDLERS
// =============================================================================

/// Build a filter from the explorer's query parameters.
///
/// Unknown status or type tags are a client error, not an empty list.
fn build_filter(params: &ProjectListParams) -> Result<ProjectFilter, MarketError> {
    let mut filter = ProjectFilter::all();
    if let Some(query) = &params.query {
        filter = filter.with_query(query.clone());
    }
    if let Some(status) = &params.status {
        filter = filter.with_status(ProjectStatus::from_str(status)?);
    }
    if let Some(project_type) = &params.project_type {
        filter = filter.with_type(ProjectType::from_str(project_type)?);
    }
    Ok(filter)
}

/// List projects, optionally filtered by query text, status, and type.
pub async fn projects_handler(
    State(state): State<AppState>,
    Query(params): Query<ProjectListParams>,
) -> Response {
    let filter = match build_filter(&params) {
        Ok(f) => f,
        Err(e) => return error_response(&e),
    };

    let registry = state.registry.read().await;
    let projects = filter
        .apply(registry.projects())
        .into_iter()
        .map(ProjectJson::from)
        .collect();

    (StatusCode::OK, Json(ProjectListResponse { projects })).into_response()
}

/// Fetch one project.
pub async fn project_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Response {
    let registry = state.registry.read().await;
    match registry.project(ProjectId(id)) {
        Some(project) => (StatusCode::OK, Json(ProjectJson::from(project))).into_response(),
        None => error_response(&MarketError::ProjectNotFound(ProjectId(id))),
    }
}

/// Projects awaiting verifier review.
pub async fn pending_reviews_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let projects = registry.pending_reviews().map(ProjectJson::from).collect();
    (StatusCode::OK, Json(ProjectListResponse { projects }))
}

/// Verifier decision: approve or reject a registered project.
pub async fn review_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(request): Json<ReviewRequest>,
) -> Response {
    let verifier = match require_wallet(&headers) {
        Ok(address) => address,
        Err(status) => {
            return (status, Json(ErrorResponse::new("Wallet session required"))).into_response();
        }
    };

    let mut registry = state.registry.write().await;
    let id = ProjectId(id);
    let result = match &request {
        ReviewRequest::Approve { notes } => {
            tracing::info!(project = %id, verifier = verifier.as_str(), ?notes, "project approved");
            registry.approve(id, orchestrator::today())
        }
        ReviewRequest::Reject { notes } => {
            tracing::info!(project = %id, verifier = verifier.as_str(), ?notes, "project rejected");
            registry.reject(id)
        }
    };

    match result.and_then(|()| {
        registry
            .project(id)
            .ok_or(MarketError::ProjectNotFound(id))
    }) {
        Ok(project) => (StatusCode::OK, Json(ProjectJson::from(project))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Issue and list the credits of a verified project.
pub async fn issue_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(request): Json<IssueRequest>,
) -> Response {
    if let Err(status) = require_wallet(&headers) {
        return (status, Json(ErrorResponse::new("Wallet session required"))).into_response();
    }

    let mut registry = state.registry.write().await;
    let id = ProjectId(id);
    match registry
        .issue(id, request.price_per_credit, orchestrator::today())
        .and_then(|()| {
            registry
                .project(id)
                .ok_or(MarketError::ProjectNotFound(id))
        }) {
        Ok(project) => (StatusCode::OK, Json(ProjectJson::from(project))).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// MARKET HANDLERS
// =============================================================================

/// Active credit listings.
pub async fn listings_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    (
        StatusCode::OK,
        Json(ListingsResponse {
            listings: registry.listings(),
        }),
    )
}

/// Purchase credits from a listing.
pub async fn purchase_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PurchaseRequest>,
) -> Response {
    let buyer = match require_wallet(&headers) {
        Ok(address) => address,
        Err(status) => {
            return (status, Json(ErrorResponse::new("Wallet session required"))).into_response();
        }
    };

    let mut registry = state.registry.write().await;
    match orchestrator::purchase(
        &mut registry,
        &state.gateways,
        buyer.clone(),
        request.project_id,
        request.amount,
    )
    .await
    {
        Ok(tx) => {
            let new_balance = registry.balance(&buyer);
            (
                StatusCode::OK,
                Json(PurchaseResponse {
                    success: true,
                    tx_hash: Some(tx.tx_hash),
                    new_balance,
                    error: None,
                }),
            )
                .into_response()
        }
        Err(e) => (
            error_status(&e),
            Json(PurchaseResponse {
                success: false,
                tx_hash: None,
                new_balance: registry.balance(&buyer),
                error: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// Retire credits for a certificate.
pub async fn retire_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RetireRequest>,
) -> Response {
    let account = match require_wallet(&headers) {
        Ok(address) => address,
        Err(status) => {
            return (status, Json(ErrorResponse::new("Wallet session required"))).into_response();
        }
    };

    let mut registry = state.registry.write().await;
    match orchestrator::retire(
        &mut registry,
        &state.gateways,
        account.clone(),
        request.project_id,
        request.amount,
        &request.reason,
    )
    .await
    {
        Ok(record) => {
            let new_balance = registry.balance(&account);
            (
                StatusCode::OK,
                Json(RetireResponse {
                    success: true,
                    certificate: Some(record.certificate),
                    tx_hash: Some(record.tx_hash),
                    new_balance,
                    error: None,
                }),
            )
                .into_response()
        }
        Err(e) => (
            error_status(&e),
            Json(RetireResponse {
                success: false,
                certificate: None,
                tx_hash: None,
                new_balance: registry.balance(&account),
                error: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// The caller's holdings: credits, token balance, history.
pub async fn balance_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let account = match require_wallet(&headers) {
        Ok(address) => address,
        Err(status) => {
            return (status, Json(ErrorResponse::new("Wallet session required"))).into_response();
        }
    };

    let token_balance = match state.gateways.ledger.token_balance(&account).await {
        Ok(balance) => balance,
        Err(e) => return error_response(&e.into()),
    };

    let registry = state.registry.read().await;
    let response = BalanceResponse {
        account: account.as_str().to_string(),
        credits: registry.balance(&account),
        token_balance,
        transactions: registry
            .transactions(&account)
            .into_iter()
            .cloned()
            .collect(),
        retirements: registry
            .retirements(&account)
            .into_iter()
            .cloned()
            .collect(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Fetch a stored project metadata document.
///
/// Missing or unparseable objects are a 404; the dashboard shows a
/// placeholder card in that case.
pub async fn metadata_handler(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Response {
    match state.gateways.storage.fetch_metadata(&Cid::new(cid)).await {
        Ok(Some(metadata)) => (StatusCode::OK, Json(metadata)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Metadata not found")),
        )
            .into_response(),
        Err(e) => error_response(&e.into()),
    }
}

// =============================================================================
// WIZARD HANDLERS
// =============================================================================

/// Create a registration wizard.
pub async fn wizard_create_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut wizards = state.wizards.write().await;
    let wizard_id = state
        .next_wizard
        .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    wizards.insert(wizard_id, Arc::new(Mutex::new(WizardSession::new())));
    tracing::info!(wizard = wizard_id, "wizard created");
    (StatusCode::CREATED, Json(WizardCreated { wizard_id }))
}

fn wizard_not_found(id: u64) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Wizard not found: {id}"))),
    )
        .into_response()
}

/// Look a session up, holding the map lock only for the lookup. The
/// per-session mutex is what gateway awaits are allowed to span.
async fn wizard_session(state: &AppState, id: u64) -> Option<Arc<Mutex<WizardSession>>> {
    state.wizards.read().await.get(&id).cloned()
}

/// Fetch the current wizard state.
pub async fn wizard_get_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Response {
    let Some(session) = wizard_session(&state, id).await else {
        return wizard_not_found(id);
    };
    let session = session.lock().await;
    (StatusCode::OK, Json(WizardSnapshot::capture(id, &session.wizard))).into_response()
}

/// Patch the draft fields on the details step.
pub async fn wizard_draft_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<super::types::DraftPatch>,
) -> Response {
    let Some(session) = wizard_session(&state, id).await else {
        return wizard_not_found(id);
    };
    let mut session = session.lock().await;
    patch.apply(session.wizard.draft_mut());
    (StatusCode::OK, Json(WizardSnapshot::capture(id, &session.wizard))).into_response()
}

/// Add files to the upload step; content travels base64-encoded.
pub async fn wizard_files_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<AddFilesRequest>,
) -> Response {
    // Decode everything before touching the wizard so a bad payload
    // leaves no half-added batch behind.
    let mut decoded = Vec::with_capacity(request.files.len());
    for file in &request.files {
        match BASE64.decode(&file.content_base64) {
            Ok(bytes) if bytes.len() <= MAX_FILE_SIZE => decoded.push((file.name.clone(), bytes)),
            Ok(_) => {
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(ErrorResponse::new(format!(
                        "File too large: {} (limit {} bytes)",
                        file.name, MAX_FILE_SIZE
                    ))),
                )
                    .into_response();
            }
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(format!(
                        "Invalid base64 in {}: {}",
                        file.name, e
                    ))),
                )
                    .into_response();
            }
        }
    }

    let Some(session) = wizard_session(&state, id).await else {
        return wizard_not_found(id);
    };
    let mut session = session.lock().await;

    let selections: Vec<FileSelection> = decoded
        .iter()
        .map(|(name, bytes)| FileSelection {
            name: name.clone(),
            size_bytes: bytes.len() as u64,
        })
        .collect();
    let entry_ids = session.wizard.add_files(selections, request.kind);
    for (entry_id, (_, bytes)) in entry_ids.iter().zip(decoded) {
        session.payloads.insert(*entry_id, bytes);
    }

    (StatusCode::OK, Json(AddFilesResponse { entry_ids })).into_response()
}

/// Upload every pending file through the storage gateway.
pub async fn wizard_upload_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Response {
    let Some(session) = wizard_session(&state, id).await else {
        return wizard_not_found(id);
    };
    let mut session = session.lock().await;

    match orchestrator::upload_pending(&mut session, &state.gateways).await {
        Ok(_) => {
            (StatusCode::OK, Json(WizardSnapshot::capture(id, &session.wizard))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Advance to the next step. Gated: leaving the upload step with
/// incomplete uploads is a 409.
pub async fn wizard_advance_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Response {
    let Some(session) = wizard_session(&state, id).await else {
        return wizard_not_found(id);
    };
    let mut session = session.lock().await;

    match session.wizard.advance() {
        Ok(step) => (
            StatusCode::OK,
            Json(StepResponse {
                step: step.index(),
                step_label: step.label().to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Step back. A no-op on the first step.
pub async fn wizard_retreat_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Response {
    let Some(session) = wizard_session(&state, id).await else {
        return wizard_not_found(id);
    };
    let mut session = session.lock().await;

    let step = session.wizard.retreat();
    (
        StatusCode::OK,
        Json(StepResponse {
            step: step.index(),
            step_label: step.label().to_string(),
        }),
    )
        .into_response()
}

/// Submit the wizard: metadata to storage, registration to the ledger,
/// project into the registry, verification trigger.
pub async fn wizard_submit_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let owner = match require_wallet(&headers) {
        Ok(address) => address,
        Err(status) => {
            return (status, Json(ErrorResponse::new("Wallet session required"))).into_response();
        }
    };

    let Some(session) = wizard_session(&state, id).await else {
        return wizard_not_found(id);
    };
    let mut session = session.lock().await;

    match orchestrator::submit(&mut session, &state.registry, &state.gateways, owner).await {
        Ok(outcome) => {
            let status = if outcome.registered {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, Json(outcome)).into_response()
        }
        Err(e) => error_response(&e),
    }
}
