// ──────────────────────────────────────────────────────────────────────────────
// nc-api · error
// ──────────────────────────────────────────────────────────────────────────────
// Structured error taxonomy for every operation in the crate. Each variant
// carries enough machine-readable context (operation, path, status, server
// body) to diagnose a failure without a retry.
// ──────────────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type NcResult<T> = Result<T, NcError>;

/// All failure modes of the client library.
#[derive(Debug, Error)]
pub enum NcError {
    /// Network-level failure (DNS, connection refused, timeout, aborted
    /// request). Never a protocol response.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status code the operation does not map to
    /// a more specific outcome. Carries the server-supplied body verbatim.
    #[error("{op}: unexpected status {status}: {body}")]
    Remote { op: String, status: u16, body: String },

    /// 404 on an operation where absence is an error.
    #[error("resource not found: {path}")]
    NotFound { path: String },

    /// 403 on rename or delete.
    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    /// The parent directory of the target path does not exist (409 on MKCOL,
    /// or a failed existence probe before an upload).
    #[error("parent directory missing: {path}")]
    MissingParent { path: String },

    /// Malformed XML or JSON in a response body.
    #[error("malformed response body: {0}")]
    Parse(String),

    /// Caller contract violation (empty path, invalid method name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure of the local-filesystem collaborator (file read source, write
    /// sink, directory-tree walker).
    #[error("local I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl NcError {
    /// Build a `Remote` error from an operation label and a raw response.
    pub(crate) fn remote(op: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            op: op.into(),
            status,
            body: body.into(),
        }
    }
}

impl From<serde_json::Error> for NcError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("json: {}", e))
    }
}

impl From<quick_xml::Error> for NcError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Parse(format!("xml: {}", e))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_display_includes_context() {
        let e = NcError::remote("PUT /a.txt", 507, "insufficient storage");
        let s = format!("{}", e);
        assert!(s.contains("PUT /a.txt"));
        assert!(s.contains("507"));
        assert!(s.contains("insufficient storage"));
    }

    #[test]
    fn not_found_names_the_path() {
        let e = NcError::NotFound {
            path: "/gone.txt".into(),
        };
        assert_eq!(format!("{}", e), "resource not found: /gone.txt");
    }

    #[test]
    fn missing_parent_names_the_parent() {
        let e = NcError::MissingParent {
            path: "/no/such".into(),
        };
        assert!(format!("{}", e).contains("/no/such"));
    }

    #[test]
    fn json_error_becomes_parse() {
        let bad: Result<serde_json::Value, _> = serde_json::from_str("{");
        let e: NcError = bad.unwrap_err().into();
        assert!(matches!(e, NcError::Parse(_)));
    }

    #[test]
    fn xml_error_becomes_parse() {
        let e: NcError = quick_xml::Error::UnexpectedEof("multistatus".to_string()).into();
        assert!(matches!(e, NcError::Parse(_)));
        assert!(format!("{}", e).contains("xml:"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let e: NcError = io.into();
        assert!(matches!(e, NcError::Io(_)));
    }
}
