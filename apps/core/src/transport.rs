use serde::{Deserialize, Serialize};

use crate::contract::{CoreRequest, CoreResponse};
use crate::core_service::{CatalogService, ServiceError};
use crate::error::SourceError;

const ENCODE_FAILURE: &str =
    r#"{"status":"err","error":{"code":"internal","message":"failed to encode response"}}"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
    SourceNotFound,
    SourceNotReady,
    Source,
    Config,
    Cancelled,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: CoreResponse },
    Err { error: ErrorResponse },
}

pub fn handle_request(service: &CatalogService, request: CoreRequest) -> TransportResponse {
    match service.handle_command(request) {
        Ok(response) => TransportResponse::Ok { response },
        Err(error) => TransportResponse::Err {
            error: map_service_error(error),
        },
    }
}

pub fn handle_json(service: &CatalogService, payload: &str) -> String {
    let response = match serde_json::from_str::<CoreRequest>(payload) {
        Ok(request) => handle_request(service, request),
        Err(error) => TransportResponse::Err {
            error: ErrorResponse {
                code: ErrorCode::InvalidJson,
                message: error.to_string(),
            },
        },
    };

    serde_json::to_string(&response).unwrap_or_else(|error| {
        log::error!("failed to encode transport response: {error}");
        ENCODE_FAILURE.to_string()
    })
}

fn map_service_error(error: ServiceError) -> ErrorResponse {
    let message = error.to_string();
    let code = match error {
        ServiceError::InvalidRequest(_) => ErrorCode::InvalidRequest,
        ServiceError::SourceNotFound(_) => ErrorCode::SourceNotFound,
        ServiceError::Source(SourceError::NotReady { .. } | SourceError::ConfigInvalid(_)) => {
            ErrorCode::SourceNotReady
        }
        ServiceError::Source(_) => ErrorCode::Source,
        ServiceError::Config(_) => ErrorCode::Config,
        ServiceError::Cancelled(_) => ErrorCode::Cancelled,
    };
    ErrorResponse { code, message }
}
