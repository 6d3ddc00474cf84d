//! Member endpoints.
//!
//! POST /join, POST /login, GET /profile/:code, GET /downline/:side/:code
//!
//! Every failure uses the `{ "status": "error", "msg": ... }` envelope.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::common::{MemberCode, Side};
use crate::domains::member::actions::{self, JoinRequest};
use crate::domains::member::{MemberProfile, TreeError};
use crate::server::app::AxumAppState;

// =============================================================================
// Envelopes
// =============================================================================

#[derive(Serialize)]
pub struct JoinResponse {
    status: &'static str,
    msg: &'static str,
    member_code: MemberCode,
}

#[derive(Serialize)]
pub struct LoginResponse {
    status: &'static str,
    member: MemberProfile,
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    msg: String,
}

/// Handler error rendered as the error envelope
#[derive(Debug)]
pub enum ApiError {
    MissingFields,
    InvalidPosition(String),
    InvalidSide(String),
    BadRequest(String),
    Tree(TreeError),
}

impl From<TreeError> for ApiError {
    fn from(err: TreeError) -> Self {
        ApiError::Tree(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::MissingFields => {
                (StatusCode::BAD_REQUEST, "Missing required fields.".to_string())
            }
            ApiError::InvalidPosition(value) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid position: {} (expected Left or Right)", value),
            ),
            ApiError::InvalidSide(value) => (
                StatusCode::NOT_FOUND,
                format!("Invalid side: {} (expected left or right)", value),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Tree(err) => {
                let status = match &err {
                    TreeError::InvalidSponsor => StatusCode::BAD_REQUEST,
                    TreeError::DuplicateEmail | TreeError::RootExists => StatusCode::CONFLICT,
                    TreeError::NotFound => StatusCode::NOT_FOUND,
                    TreeError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
                    TreeError::Hashing(_) | TreeError::Storage(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let msg = match &err {
                    TreeError::Hashing(_) | TreeError::Storage(_) => {
                        error!(error = %err, "Request failed on internal error");
                        "Server Error".to_string()
                    }
                    _ => err.to_string(),
                };
                (status, msg)
            }
        };

        (
            status,
            Json(ErrorBody {
                status: "error",
                msg,
            }),
        )
            .into_response()
    }
}

// =============================================================================
// Join
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct JoinBody {
    name: Option<String>,
    email: Option<String>,
    mobile: Option<String>,
    sponsor_code: Option<MemberCode>,
    position: Option<String>,
    password: Option<String>,
}

fn required(value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::MissingFields)
}

impl TryFrom<JoinBody> for JoinRequest {
    type Error = ApiError;

    fn try_from(body: JoinBody) -> Result<Self, Self::Error> {
        let name = required(body.name)?;
        let email = required(body.email)?;
        let position = required(body.position)?;
        let password = required(body.password)?;
        let sponsor_code = body.sponsor_code.ok_or(ApiError::MissingFields)?;
        let side = position
            .parse::<Side>()
            .map_err(|_| ApiError::InvalidPosition(position.clone()))?;

        Ok(JoinRequest {
            name,
            email,
            mobile: body.mobile.filter(|m| !m.trim().is_empty()),
            sponsor_code,
            side,
            password,
        })
    }
}

/// POST /join
pub async fn join_handler(
    Extension(state): Extension<AxumAppState>,
    body: Result<Json<JoinBody>, JsonRejection>,
) -> Result<Json<JoinResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = JoinRequest::try_from(body)?;

    let member_code = actions::join(request, &state.deps).await?;

    Ok(Json(JoinResponse {
        status: "success",
        msg: "Member Added Successfully",
        member_code,
    }))
}

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

/// POST /login
pub async fn login_handler(
    Extension(state): Extension<AxumAppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    // Missing credentials fail like wrong ones
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(TreeError::AuthenticationFailed.into());
    };

    let member = actions::authenticate(&email, &password, &state.deps).await?;

    Ok(Json(LoginResponse {
        status: "success",
        member,
    }))
}

// =============================================================================
// Profile / downline
// =============================================================================

/// GET /profile/:code
pub async fn profile_handler(
    Extension(state): Extension<AxumAppState>,
    Path(code): Path<String>,
) -> Result<Json<MemberProfile>, ApiError> {
    let code = code
        .parse::<MemberCode>()
        .map_err(|_| ApiError::Tree(TreeError::NotFound))?;

    let profile = actions::get_profile(code, &state.deps).await?;
    Ok(Json(profile))
}

/// GET /downline/:side/:code
///
/// Unknown or malformed codes yield an empty list.
pub async fn downline_handler(
    Extension(state): Extension<AxumAppState>,
    Path((side, code)): Path<(String, String)>,
) -> Result<Json<Vec<MemberProfile>>, ApiError> {
    let side = side
        .parse::<Side>()
        .map_err(|_| ApiError::InvalidSide(side.clone()))?;
    let Ok(code) = code.parse::<MemberCode>() else {
        return Ok(Json(Vec::new()));
    };

    let members = actions::downline(code, side, &state.deps).await?;
    Ok(Json(members))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> JoinBody {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn join_body_requires_core_fields() {
        let missing_password = body(serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "sponsor_code": 1,
            "position": "Left"
        }));
        assert!(matches!(
            JoinRequest::try_from(missing_password),
            Err(ApiError::MissingFields)
        ));

        let blank_name = body(serde_json::json!({
            "name": "  ",
            "email": "ada@example.com",
            "sponsor_code": 1,
            "position": "Left",
            "password": "pw"
        }));
        assert!(matches!(
            JoinRequest::try_from(blank_name),
            Err(ApiError::MissingFields)
        ));
    }

    #[test]
    fn join_body_converts_with_optional_mobile() {
        let request = JoinRequest::try_from(body(serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "sponsor_code": "7",
            "position": "Right",
            "password": "pw"
        })))
        .unwrap();

        assert_eq!(request.sponsor_code, MemberCode(7));
        assert_eq!(request.side, Side::Right);
        assert_eq!(request.mobile, None);
    }

    #[test]
    fn internal_failures_hide_details() {
        let response = ApiError::from(TreeError::Hashing("bad cost".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::InvalidSide("up".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_position_is_rejected() {
        let result = JoinRequest::try_from(body(serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "sponsor_code": 1,
            "position": "Middle",
            "password": "pw"
        })));
        assert!(matches!(result, Err(ApiError::InvalidPosition(_))));
    }
}
