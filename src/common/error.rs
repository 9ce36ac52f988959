use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
//
// Importante: as funções puras do motor de elegibilidade NUNCA produzem
// este tipo. Dado malformado vira "não elegível", não erro. AppError é
// só para a camada HTTP e de banco.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Solicitação não encontrada")]
    RequestNotFound,

    // O ator não tem nenhum papel que case com o status atual
    #[error("Ator não elegível para agir nesta solicitação")]
    NotEligible,

    // A solicitação saiu do estado pendente (ex.: outra aprovação chegou
    // primeiro). O cliente pode recarregar e tentar de novo.
    #[error("Solicitação não está mais em um status acionável")]
    RequestNotActionable,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.")
            }
            AppError::RequestNotFound => {
                (StatusCode::NOT_FOUND, "Solicitação não encontrada.")
            }
            AppError::NotEligible => (
                StatusCode::FORBIDDEN,
                "Você não tem alçada para agir nesta solicitação.",
            ),
            AppError::RequestNotActionable => (
                StatusCode::CONFLICT,
                "A solicitação já avançou de status. Recarregue a fila e tente novamente.",
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
