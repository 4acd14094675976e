use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Failure talking to the traffic-control backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid backend url {0}")]
    Url(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status} {status_text}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
        code: Option<i64>,
        message: Option<String>,
        body: String,
    },

    #[error("{url} failed with code {code}")]
    Backend {
        url: String,
        status: u16,
        code: i64,
        message: Option<String>,
        body: String,
    },

    #[error("unexpected response from {url}: {reason}")]
    Decode {
        url: String,
        reason: String,
        body: String,
    },
}

impl ApiError {
    pub fn url(&self) -> Option<&str> {
        match self {
            ApiError::Url(_) => None,
            ApiError::Transport { url, .. }
            | ApiError::Status { url, .. }
            | ApiError::Backend { url, .. }
            | ApiError::Decode { url, .. } => Some(url),
        }
    }
}

/// What the page's error panel shows. Field names follow the browser side.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ErrorReport {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: "validation",
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            kind: "fault",
            message: message.into(),
            ..Self::default()
        }
    }
}

impl From<&ApiError> for ErrorReport {
    fn from(err: &ApiError) -> Self {
        let mut report = ErrorReport {
            kind: "backend",
            message: err.to_string(),
            request: err.url().map(str::to_string),
            ..ErrorReport::default()
        };
        match err {
            ApiError::Status {
                status,
                status_text,
                code,
                message,
                body,
                ..
            } => {
                report.status = Some(*status);
                report.status_text = Some(status_text.clone());
                report.code = *code;
                if let Some(msg) = message {
                    report.message = msg.clone();
                }
                report.body = Some(body.clone());
            }
            ApiError::Backend {
                status,
                code,
                message,
                body,
                ..
            } => {
                report.status = Some(*status);
                report.code = Some(*code);
                if let Some(msg) = message {
                    report.message = msg.clone();
                }
                report.body = Some(body.clone());
            }
            ApiError::Decode { body, .. } => {
                report.body = Some(body.clone());
            }
            ApiError::Url(_) | ApiError::Transport { .. } => {}
        }
        report
    }
}

/// Errors a console handler hands back to the browser.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0}")]
    Validation(String),

    #[error("another request is still running")]
    Busy,

    #[error(transparent)]
    Backend(#[from] ApiError),

    #[error("preference store: {0}")]
    Store(#[from] crate::prefs::StoreError),
}

impl ConsoleError {
    pub fn report(&self) -> (StatusCode, ErrorReport) {
        match self {
            ConsoleError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorReport::validation(msg))
            }
            ConsoleError::Busy => (
                StatusCode::CONFLICT,
                ErrorReport {
                    kind: "busy",
                    message: self.to_string(),
                    ..ErrorReport::default()
                },
            ),
            ConsoleError::Backend(err) => (StatusCode::BAD_GATEWAY, ErrorReport::from(err)),
            ConsoleError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorReport::fault(self.to_string()),
            ),
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let (status, report) = self.report();
        if status.is_server_error() {
            tracing::warn!("console request failed: {self}");
        }
        (status, Json(report)).into_response()
    }
}
