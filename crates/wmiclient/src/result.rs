//! The record of a completed request.

use std::net::IpAddr;

use serde::Serialize;

/// Outcome of one request: the agent's result code and captured lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestResult {
    host: IpAddr,
    code: i64,
    output: Vec<String>,
    error: Vec<String>,
}

impl RequestResult {
    /// Creates a result for `host`.
    #[must_use]
    pub const fn new(host: IpAddr, code: i64, output: Vec<String>, error: Vec<String>) -> Self {
        Self {
            host,
            code,
            output,
            error,
        }
    }

    /// Address of the host the request was sent to.
    #[must_use]
    pub const fn host(&self) -> IpAddr {
        self.host
    }

    /// Raw result code; zero means success.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Output lines.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Error lines (messages or stack traces).
    #[must_use]
    pub fn error(&self) -> &[String] {
        &self.error
    }

    /// Returns true when the result code is zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }
}
