// src/handlers/identity.rs

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::SignedInUser,
    models::person::{ActorIdentity, PrivilegeSet},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub identity: ActorIdentity,
    pub privileges: PrivilegeSet,
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Identidade resolvida e privilégios derivados do ator", body = ProfileResponse),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    SignedInUser(actor): SignedInUser,
) -> Result<impl IntoResponse, AppError> {
    let identity = app_state.identity_service.resolve(&actor).await;
    let privileges = app_state.approval_service.privileges_for(&identity).await?;

    Ok(Json(ProfileResponse {
        identity,
        privileges,
    }))
}
