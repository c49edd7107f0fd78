//! Status-plus-outcome result for every wiki operation.
//!
//! # Design
//! Callers get the received status and the decoded value (or failure) side by
//! side. A status other than the endpoint's documented one does not become an
//! error: `result` is `Ok(None)` and the caller inspects `status` itself.
//! `into_result` is the opt-in strict view for callers that want a single
//! error channel.

use crate::error::ApiError;

#[derive(Debug)]
#[must_use]
pub struct ApiResponse<T> {
    /// Status received from the server; `None` when no response arrived.
    pub status: Option<u16>,
    /// Status the endpoint documents for success.
    pub expected: u16,
    /// Decoded value when `status == expected`, `Ok(None)` on any other
    /// status, `Err` on transport, encode or decode failure.
    pub result: Result<Option<T>, ApiError>,
    /// Messages from a Redmine `{"errors":[...]}` body, if one came back.
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    /// The exchange never produced a response.
    pub(crate) fn failed(expected: u16, error: ApiError) -> Self {
        Self {
            status: None,
            expected,
            result: Err(error),
            errors: Vec::new(),
        }
    }

    /// Whether the server answered with the documented status.
    pub fn is_success(&self) -> bool {
        self.status == Some(self.expected)
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok().and_then(Option::as_ref)
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.result.as_ref().err()
    }

    /// Collapse into a single `Result`, turning a status mismatch into
    /// `ApiError::UnexpectedStatus`.
    pub fn into_result(self) -> Result<T, ApiError> {
        match self.result? {
            Some(value) => Ok(value),
            None => match self.status {
                Some(status) => Err(ApiError::UnexpectedStatus {
                    status,
                    expected: self.expected,
                    errors: self.errors,
                }),
                None => Err(ApiError::NoResponse),
            },
        }
    }
}
