// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Taxonomia única de erros da aplicação. Os serviços devolvem estas variantes
// e a tradução para status HTTP acontece só aqui.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Telefone já cadastrado")]
    PhoneAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Permissão insuficiente")]
    Forbidden,

    // Também usado quando o registro existe mas pertence a outro usuário
    #[error("{0} não encontrado")]
    ResourceNotFound(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Produto indisponível: {0}")]
    ProductUnavailable(String),

    #[error("Transição de status inválida: {0}")]
    InvalidTransition(String),

    #[error("Número de pedido duplicado")]
    DuplicateOrderNumber,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::ResourceNotFound(what.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::ProductUnavailable(_)
            | AppError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PhoneAlreadyExists
            | AppError::Conflict(_)
            | AppError::DuplicateOrderNumber => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            // Devolve os detalhes de cada campo inválido
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidInput(message) => message,
            AppError::PhoneAlreadyExists => "Phone number already registered".to_string(),
            // Mesma mensagem para telefone desconhecido e senha errada
            AppError::InvalidCredentials => "Invalid phone number or password".to_string(),
            AppError::InvalidToken => "Invalid or expired token".to_string(),
            AppError::Forbidden => "Unauthorized: Admin access required".to_string(),
            AppError::ResourceNotFound(what) => format!("{what} not found"),
            AppError::Conflict(message) => message,
            AppError::ProductUnavailable(name) => format!("Product {name} is not available"),
            AppError::InvalidTransition(message) => message,
            AppError::DuplicateOrderNumber => {
                "Could not allocate a unique order number, please retry".to_string()
            }
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "An unexpected error occurred.".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_boundary_status_codes() {
        assert_eq!(AppError::invalid("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("Order").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PhoneAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidTransition("no".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let response =
            AppError::InternalServerError(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
