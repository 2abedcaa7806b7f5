//! Classification of agent result codes.
//!
//! The agent reports Windows status values (Win32 errors, NTSTATUS and
//! HRESULT codes). [`CodeTable`] maps the ones the client knows about to an
//! [`ErrorKind`] and a fixed explanation; anything else is
//! [`ErrorKind::Unknown`]. Vendor codes accrue over time, so the table is
//! data rather than branches and callers can extend it with
//! [`CodeTable::with_entry`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::result::RequestResult;

/// Sentinel for results whose code could not be determined.
pub const UNKNOWN_CODE: i64 = -1;
/// `ERROR_TIMEOUT`.
pub const ERROR_TIMEOUT: i64 = 0x0000_05B4;
/// `WAIT_TIMEOUT`.
pub const WAIT_TIMEOUT: i64 = 0x0000_0102;
/// `ERROR_FILE_NOT_FOUND`, also used for missing registry keys and values.
pub const ERROR_FILE_NOT_FOUND: i64 = 0x0000_0002;
/// `ERROR_ACCESS_DENIED`, reported by older agents instead of a logon failure.
pub const ERROR_ACCESS_DENIED: i64 = 0x0000_0005;
/// `STATUS_LOGON_FAILURE`.
pub const STATUS_LOGON_FAILURE: i64 = 0xC000_006D;
/// `E_ACCESSDENIED`, the HRESULT form of an access failure.
pub const E_ACCESSDENIED: i64 = 0x8007_0005;
/// `ERROR_WRONG_PASSWORD`.
pub const ERROR_WRONG_PASSWORD: i64 = 0x0000_052B;
/// `ERROR_INTERNAL_ERROR`.
pub const ERROR_INTERNAL_ERROR: i64 = 0x0000_054F;
/// `WBEM_E_FAILED`, the generic WMI call failure.
pub const WBEM_E_FAILED: i64 = 0x8004_1001;

const TIMEOUT_MESSAGE: &str = "Timeout waiting for a response.";
const ACCESS_DENIED_MESSAGE: &str = "The credentials provided do not have permission to access \
     the requested resource. Windows 2008 R2 and later systems need additional configuration \
     before remote WMI access is allowed.";
const UNKNOWN_MESSAGE: &str = "Undefined error code.";

struct CodeEntry {
    code: i64,
    kind: ErrorKind,
    explanation: &'static str,
}

static KNOWN_CODES: &[CodeEntry] = &[
    CodeEntry {
        code: ERROR_TIMEOUT,
        kind: ErrorKind::Timeout,
        explanation: TIMEOUT_MESSAGE,
    },
    CodeEntry {
        code: WAIT_TIMEOUT,
        kind: ErrorKind::Timeout,
        explanation: TIMEOUT_MESSAGE,
    },
    CodeEntry {
        code: ERROR_FILE_NOT_FOUND,
        kind: ErrorKind::NotFound,
        explanation: "The file or registry key/value pair cannot be found.",
    },
    CodeEntry {
        code: STATUS_LOGON_FAILURE,
        kind: ErrorKind::AccessDenied,
        explanation: ACCESS_DENIED_MESSAGE,
    },
    CodeEntry {
        code: ERROR_ACCESS_DENIED,
        kind: ErrorKind::AccessDenied,
        explanation: ACCESS_DENIED_MESSAGE,
    },
    CodeEntry {
        code: E_ACCESSDENIED,
        kind: ErrorKind::AccessDenied,
        explanation: ACCESS_DENIED_MESSAGE,
    },
    CodeEntry {
        code: ERROR_WRONG_PASSWORD,
        kind: ErrorKind::BadCredentials,
        explanation: "The username, password, or domain is invalid.",
    },
    CodeEntry {
        code: ERROR_INTERNAL_ERROR,
        kind: ErrorKind::InternalError,
        explanation: "The remote system reported an internal error.",
    },
    CodeEntry {
        code: WBEM_E_FAILED,
        kind: ErrorKind::OperationFailed,
        explanation: "The remote operation failed.",
    },
    CodeEntry {
        code: UNKNOWN_CODE,
        kind: ErrorKind::Unknown,
        explanation: UNKNOWN_MESSAGE,
    },
];

/// Semantic category of a non-zero result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The agent or the remote system timed out.
    Timeout,
    /// A file, registry key, or value does not exist.
    NotFound,
    /// The credentials were rejected for the requested resource.
    AccessDenied,
    /// The user name, password, or domain is wrong.
    BadCredentials,
    /// The remote system failed internally.
    InternalError,
    /// The remote operation was attempted and failed.
    OperationFailed,
    /// Any code without a table entry.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::NotFound => "not found",
            Self::AccessDenied => "access denied",
            Self::BadCredentials => "bad credentials",
            Self::InternalError => "internal error",
            Self::OperationFailed => "operation failed",
            Self::Unknown => "unknown",
        };
        formatter.write_str(label)
    }
}

/// Kind and explanation for one result code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    kind: ErrorKind,
    explanation: Cow<'static, str>,
}

impl Classification {
    /// The semantic kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable explanation.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    const fn unknown() -> Self {
        Self {
            kind: ErrorKind::Unknown,
            explanation: Cow::Borrowed(UNKNOWN_MESSAGE),
        }
    }
}

/// Classifies `code` against the built-in table.
#[must_use]
pub fn classify(code: i64) -> Classification {
    KNOWN_CODES
        .iter()
        .find(|entry| entry.code == code)
        .map_or_else(Classification::unknown, |entry| Classification {
            kind: entry.kind,
            explanation: Cow::Borrowed(entry.explanation),
        })
}

/// Lookup table from result code to classification.
///
/// [`CodeTable::default`] holds the built-in entries.
#[derive(Debug, Clone)]
pub struct CodeTable {
    entries: HashMap<i64, Classification>,
}

impl Default for CodeTable {
    fn default() -> Self {
        let entries = KNOWN_CODES
            .iter()
            .map(|entry| {
                (
                    entry.code,
                    Classification {
                        kind: entry.kind,
                        explanation: Cow::Borrowed(entry.explanation),
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

impl CodeTable {
    /// Adds or replaces the entry for `code`.
    #[must_use]
    pub fn with_entry(
        mut self,
        code: i64,
        kind: ErrorKind,
        explanation: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.entries.insert(
            code,
            Classification {
                kind,
                explanation: explanation.into(),
            },
        );
        self
    }

    /// Returns true when `code` has an entry.
    #[must_use]
    pub fn contains(&self, code: i64) -> bool {
        self.entries.contains_key(&code)
    }

    /// Classifies `code`; absent codes are [`ErrorKind::Unknown`].
    #[must_use]
    pub fn classify(&self, code: i64) -> Classification {
        self.entries
            .get(&code)
            .cloned()
            .unwrap_or_else(Classification::unknown)
    }

    /// Builds the typed failure for a non-zero result.
    #[must_use]
    pub fn error(&self, result: RequestResult) -> ClassifiedError {
        let classification = self.classify(result.code());
        let message = format!(
            "client returned code {}: {}",
            result.code(),
            classification.explanation()
        );
        ClassifiedError::new(classification.kind(), message, result)
    }
}

/// A well-formed response whose result code is non-zero.
///
/// Carries the full [`RequestResult`] so callers can still read the agent's
/// output and error lines after classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    result: Box<RequestResult>,
}

impl ClassifiedError {
    /// Creates a failure with an explicit kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, result: RequestResult) -> Self {
        Self {
            kind,
            message: message.into(),
            result: Box::new(result),
        }
    }

    /// The classified kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The composed message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The result that produced this failure.
    #[must_use]
    pub fn result(&self) -> &RequestResult {
        &self.result
    }

    /// Consumes the failure and returns the underlying result.
    #[must_use]
    pub fn into_result(self) -> RequestResult {
        *self.result
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use rstest::rstest;

    use super::*;

    fn result_with_code(code: i64) -> RequestResult {
        RequestResult::new(IpAddr::V4(Ipv4Addr::LOCALHOST), code, Vec::new(), Vec::new())
    }

    #[rstest]
    #[case::error_timeout(0x5B4, ErrorKind::Timeout)]
    #[case::wait_timeout(0x102, ErrorKind::Timeout)]
    #[case::file_not_found(0x2, ErrorKind::NotFound)]
    #[case::logon_failure(0xC000_006D, ErrorKind::AccessDenied)]
    #[case::access_denied_win32(0x5, ErrorKind::AccessDenied)]
    #[case::access_denied_hresult(0x8007_0005, ErrorKind::AccessDenied)]
    #[case::wrong_password(0x52B, ErrorKind::BadCredentials)]
    #[case::internal_error(0x54F, ErrorKind::InternalError)]
    #[case::wbem_failed(0x8004_1001, ErrorKind::OperationFailed)]
    #[case::unknown_sentinel(-1, ErrorKind::Unknown)]
    fn known_codes_map_to_documented_kinds(#[case] code: i64, #[case] expected: ErrorKind) {
        assert_eq!(classify(code).kind(), expected);
        assert_eq!(CodeTable::default().classify(code).kind(), expected);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(42)]
    #[case(0x8004_1002)]
    #[case(i64::MAX)]
    #[case(i64::MIN)]
    fn other_codes_are_unknown(#[case] code: i64) {
        let classification = classify(code);

        assert_eq!(classification.kind(), ErrorKind::Unknown);
        assert_eq!(classification.explanation(), UNKNOWN_MESSAGE);
        assert!(!CodeTable::default().contains(code));
    }

    #[rstest]
    fn error_message_names_code_and_explanation() {
        let error = CodeTable::default().error(result_with_code(0x52B));

        assert_eq!(error.kind(), ErrorKind::BadCredentials);
        assert_eq!(
            error.message(),
            "client returned code 1323: The username, password, or domain is invalid."
        );
        assert_eq!(error.to_string(), error.message());
    }

    #[rstest]
    fn error_keeps_the_full_result() {
        let result = RequestResult::new(
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            2,
            vec!["partial".to_owned()],
            vec!["key missing".to_owned()],
        );

        let error = CodeTable::default().error(result.clone());

        assert_eq!(error.result(), &result);
        assert_eq!(error.into_result(), result);
    }

    #[rstest]
    fn entries_can_be_added_and_overridden() {
        let table = CodeTable::default()
            .with_entry(0x8004_1002, ErrorKind::NotFound, "WMI object not found.")
            .with_entry(0x5, ErrorKind::OperationFailed, String::from("custom"));

        assert_eq!(table.classify(0x8004_1002).kind(), ErrorKind::NotFound);
        assert_eq!(table.classify(0x5).kind(), ErrorKind::OperationFailed);
        assert_eq!(table.classify(0x5).explanation(), "custom");
        assert_eq!(classify(0x5).kind(), ErrorKind::AccessDenied);
    }
}
