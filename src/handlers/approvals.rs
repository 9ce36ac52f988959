// src/handlers/approvals.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::SignedInUser,
    models::finance::{ActionKind, RequestKind},
    models::queues::CompletedView,
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QueuesParams {
    /// Modo da fila de concluídas: "relevant" (padrão) ou "all"
    pub completed: Option<CompletedView>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    pub kind: RequestKind,

    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,

    #[validate(length(min = 1, message = "O departamento é obrigatório."))]
    pub department: String,

    #[validate(custom(function = validate_not_negative))]
    #[schema(example = "350.00")]
    pub amount_estimated: Decimal,

    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitActionPayload {
    pub action: ActionKind,

    #[validate(length(max = 500, message = "A observação pode ter no máximo 500 caracteres."))]
    pub note: Option<String>,
}

// ---
// Handlers
// ---

// GET /api/approvals/queues
#[utoipa::path(
    get,
    path = "/api/approvals/queues",
    tag = "Approvals",
    params(QueuesParams),
    responses(
        (status = 200, description = "As quatro filas da tela de aprovações", body = crate::models::queues::QueuesResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_queues(
    State(app_state): State<AppState>,
    SignedInUser(actor): SignedInUser,
    Query(params): Query<QueuesParams>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Resolve a identidade (melhor esforço, nunca falha)
    let identity = app_state.identity_service.resolve(&actor).await;

    // 2. Monta o snapshot e particiona
    let completed_view = params.completed.unwrap_or_default();
    let response = app_state
        .queue_service
        .build_queues(identity, completed_view)
        .await?;

    Ok(Json(response))
}

// POST /api/approvals
#[utoipa::path(
    post,
    path = "/api/approvals",
    tag = "Approvals",
    request_body = CreateRequestPayload,
    responses(
        (status = 201, description = "Solicitação criada no primeiro degrau da cadeia", body = crate::models::finance::FinanceRequest),
        (status = 400, description = "Payload inválido"),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    SignedInUser(actor): SignedInUser,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let identity = app_state.identity_service.resolve(&actor).await;

    let request = app_state
        .approval_service
        .create_request(
            &identity,
            payload.kind,
            &payload.title,
            &payload.department,
            payload.amount_estimated,
            &payload.attachments,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

// GET /api/approvals/{id}/actions
#[utoipa::path(
    get,
    path = "/api/approvals/{id}/actions",
    tag = "Approvals",
    params(
        ("id" = Uuid, Path, description = "ID da solicitação")
    ),
    responses(
        (status = 200, description = "Trilha de auditoria da solicitação", body = Vec<crate::models::finance::FinanceAction>),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_request_actions(
    State(app_state): State<AppState>,
    SignedInUser(_actor): SignedInUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let actions = app_state
        .approval_service
        .actions_for_request(request_id)
        .await?;

    Ok(Json(actions))
}

// POST /api/approvals/{id}/actions
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/actions",
    tag = "Approvals",
    params(
        ("id" = Uuid, Path, description = "ID da solicitação")
    ),
    request_body = SubmitActionPayload,
    responses(
        (status = 200, description = "Ação registrada; solicitação com o novo status", body = crate::models::finance::FinanceRequest),
        (status = 403, description = "Ator sem alçada para esta solicitação"),
        (status = 404, description = "Solicitação não encontrada"),
        (status = 409, description = "Solicitação já avançou de status")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn submit_action(
    State(app_state): State<AppState>,
    SignedInUser(actor): SignedInUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<SubmitActionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let identity = app_state.identity_service.resolve(&actor).await;

    let updated = app_state
        .approval_service
        .submit(request_id, &identity, payload.action, payload.note)
        .await?;

    Ok(Json(updated))
}
