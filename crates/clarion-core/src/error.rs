//! Error taxonomy shared by every clarion service (§7 of the design).
//!
//! Each variant maps to one of the kinds from the error handling design:
//! `InputMissing`, `UpstreamUnreachable`, `UpstreamRejected`, `StateConflict`,
//! `DataIntegrity`, `SynthesisFailure`, `Fatal`. Services that expose an HTTP
//! surface implement `axum::response::IntoResponse` for their own error type
//! wrapping this one; this crate only carries the taxonomy, not the HTTP
//! framing, since not every consumer (e.g. the Recaller) is an HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required query parameter or form field was absent.
    #[error("missing required parameter: {0}")]
    InputMissing(&'static str),

    /// A peer service (PBX, Call Register, Address Book, Audio Cache) refused
    /// the connection or timed out.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// A peer service responded with a non-success status.
    #[error("upstream rejected request ({status}): {body}")]
    UpstreamRejected { status: u16, body: String },

    /// The request conflicts with the current state (e.g. an acknowledgement
    /// arriving outside the firing window). Not a bug — a 400 by design.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// A database constraint was violated.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    /// TTS synthesis or resampling failed; no artifact was produced.
    #[error("audio synthesis failed: {0}")]
    SynthesisFailure(String),

    /// Unrecoverable at this process's scope; the caller should exit non-zero
    /// and let a supervisor restart it.
    #[error("fatal: {0}")]
    Fatal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InputMissing(_) => StatusCode::BAD_REQUEST,
            Error::StateConflict(_) => StatusCode::BAD_REQUEST,
            Error::DataIntegrity(_) => StatusCode::CONFLICT,
            Error::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            Error::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
            Error::SynthesisFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every service's JSON error body is `{"status": <int>, "message": "..."}`,
/// matching the `{"status": <int>, ...}` shape the rest of the system's
/// success responses use (§6).
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        (status, Json(json!({ "status": status.as_u16(), "message": self.to_string() }))).into_response()
    }
}
