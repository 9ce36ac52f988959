use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState};

// As claims que o provedor de login externo assina. O mínimo garantido
// é o e-mail; o id da pessoa ("sub") pode vir ou não.
#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: Option<Uuid>,
    pub email: String,
    pub name: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// O ator autenticado, como veio do token. A resolução contra o roster
/// acontece depois, no IdentityService.
#[derive(Debug, Clone)]
pub struct SignedInActor {
    pub person_id: Option<Uuid>,
    pub email: String,
    pub display_name: String,
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::InvalidToken)?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(app_state.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    let claims = token_data.claims;
    let display_name = claims.name.unwrap_or_else(|| claims.email.clone());
    let actor = SignedInActor {
        person_id: claims.sub,
        email: claims.email,
        display_name,
    };

    // Insere o ator nos "extensions" da requisição
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

// Extrator para obter o ator autenticado diretamente nos handlers
pub struct SignedInUser(pub SignedInActor);

impl<S> FromRequestParts<S> for SignedInUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SignedInActor>()
            .cloned()
            .map(SignedInUser)
            .ok_or(AppError::InvalidToken)
    }
}
