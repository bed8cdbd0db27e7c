use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};

pub const AUTHN_ERROR: &str = "Authentication failed";
pub const AUTHZ_ERROR: &str = "Authorization failed";
pub const DATABASE_ERROR: &str = "Database error";

/// Body of every non-empty response the gate writes.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CommonResponse {
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A wrapper struct for the responses emitted when the gate short-circuits
/// a request.
pub struct Response {
    http_response: HttpResponse,
}

impl Response {
    /// CORS preflight answer: status 200, empty body.
    pub fn preflight() -> Self {
        Self {
            http_response: HttpResponse::Ok().finish(),
        }
    }

    pub fn unauthenticated(message: impl AsRef<str>) -> Self {
        let message = format!("Unauthenticated: {}", message.as_ref());
        Self::err_response(StatusCode::UNAUTHORIZED, message)
    }

    pub fn unauthorized(message: impl AsRef<str>) -> Self {
        let message = format!("Unauthorized: {}", message.as_ref());
        Self::err_response(StatusCode::FORBIDDEN, message)
    }

    fn err_response(status: StatusCode, message: String) -> Self {
        let resp = CommonResponse {
            code: status.into(),
            message: Some(message),
        };
        Self {
            http_response: HttpResponseBuilder::new(status).json(resp),
        }
    }
}

impl From<Response> for HttpResponse {
    fn from(val: Response) -> Self {
        val.http_response
    }
}
