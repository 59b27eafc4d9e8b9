// ──────────────────────────────────────────────────────────────────────────────
// nc-api · types
// ──────────────────────────────────────────────────────────────────────────────
// Type catalogue for the client library:
//  • Endpoint configuration
//  • WebDAV request/response primitives
//  • File metadata record (open property map)
//  • OCS envelope & user record
//  • Upload source selection
// ──────────────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Configuration ────────────────────────────────────────────────────────────

/// Endpoint configuration shared by every operation. Immutable after
/// construction; clone freely, mutate never.
#[derive(Debug, Clone)]
pub struct NextcloudConfig {
    /// Base URL of the instance, e.g. `https://cloud.example.com`.
    base_url: String,
    /// Principal (username) under which file-storage paths are rooted.
    username: String,
    /// App password / regular password for basic auth.
    password: String,
}

impl NextcloudConfig {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

// ── WebDAV request/response primitives ──────────────────────────────────────

/// Depth header value for PROPFIND requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropfindDepth {
    Zero,
    One,
}

impl PropfindDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
        }
    }
}

/// Per-request options accepted by the transport. The transport applies them
/// verbatim; it never inspects or interprets them.
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Request body, sent as-is.
    pub body: Option<Vec<u8>>,
    /// Extra headers as (name, value) pairs.
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
    /// Target the administrative root (`<base><path>`) instead of the
    /// file-storage root (`<base>/remote.php/dav/files/<user><path>`).
    pub rest_root: bool,
    /// Optional per-call deadline. Expiry surfaces as a transport error.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn rest() -> Self {
        Self {
            rest_root: true,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Raw outcome of one transport round-trip: status, headers, body. Status
/// interpretation belongs to the operation layers, never to the transport.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body decoded as UTF-8, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ── File metadata ────────────────────────────────────────────────────────────

/// Metadata of a single remote resource, produced from a multistatus body.
/// The property set is open: unknown properties are carried through verbatim
/// with their namespace prefix stripped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMetadata {
    /// `href` of the first response entry.
    pub href: String,
    /// Flattened property map; missing text content defaults to `""`.
    pub properties: BTreeMap<String, String>,
}

impl FileMetadata {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// The entity tag, if the server sent one.
    pub fn etag(&self) -> Option<&str> {
        self.get("getetag")
    }

    /// Content length in bytes, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.get("getcontentlength").and_then(|v| v.parse().ok())
    }
}

// ── Upload source ────────────────────────────────────────────────────────────

/// Where upload bytes come from. Exactly one source per upload; the enum
/// makes supplying both or neither unrepresentable.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// In-memory payload.
    Bytes(Vec<u8>),
    /// Path to a local file, read through the filesystem collaborator.
    LocalFile(PathBuf),
}

// ── Directory probe ──────────────────────────────────────────────────────────

/// Outcome of the strict directory probe. Anything other than a confirmed
/// 207 or 404 propagates as an error instead of collapsing to "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryProbe {
    Present,
    Absent,
}

// ── OCS envelope ─────────────────────────────────────────────────────────────

/// Standard OCS JSON response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcsResponse<T> {
    pub ocs: OcsEnvelope<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcsEnvelope<T> {
    pub meta: OcsMeta,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcsMeta {
    pub status: String,
    pub statuscode: u32,
    pub message: Option<String>,
    #[serde(rename = "totalitems")]
    pub total_items: Option<String>,
    #[serde(rename = "itemsperpage")]
    pub items_per_page: Option<String>,
}

/// Embedded OCS status code signalling success.
pub const OCS_STATUS_OK: u32 = 100;

// ── Users ────────────────────────────────────────────────────────────────────

/// Which administrative-protocol variant user operations speak. Selected at
/// construction; JSON is canonical, the XML envelope is the legacy
/// compatibility mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserEndpoint {
    #[default]
    Json,
    OcsXml,
}

/// A single user as returned by the provisioning API, flattened into a
/// string map plus the ordered group list. The field set depends on the
/// protocol variant and server version; unknown fields are carried through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub fields: BTreeMap<String, String>,
    pub groups: Vec<String>,
}

impl UserRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

/// Filter parameters for `list_users`.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_strips_trailing_slash() {
        let c = NextcloudConfig::new("https://nc.test/", "alice", "pw");
        assert_eq!(c.base_url(), "https://nc.test");
        assert_eq!(c.username(), "alice");
    }

    #[test]
    fn propfind_depth_as_str() {
        assert_eq!(PropfindDepth::Zero.as_str(), "0");
        assert_eq!(PropfindDepth::One.as_str(), "1");
    }

    #[test]
    fn request_options_builders() {
        let o = RequestOptions::rest()
            .header("Depth", "1")
            .query("format", "json")
            .body(b"payload".to_vec());
        assert!(o.rest_root);
        assert_eq!(o.headers, vec![("Depth".to_string(), "1".to_string())]);
        assert_eq!(o.query, vec![("format".to_string(), "json".to_string())]);
        assert_eq!(o.body.as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn raw_response_body_text_lossy() {
        let r = RawResponse {
            status: 200,
            headers: reqwest::header::HeaderMap::new(),
            body: b"ok".to_vec(),
        };
        assert_eq!(r.body_text(), "ok");
    }

    #[test]
    fn metadata_accessors() {
        let mut m = FileMetadata::default();
        m.properties.insert("getetag".into(), "\"abc\"".into());
        m.properties.insert("getcontentlength".into(), "42".into());
        assert_eq!(m.etag(), Some("\"abc\""));
        assert_eq!(m.content_length(), Some(42));
        assert_eq!(m.get("missing"), None);
    }

    #[test]
    fn user_record_id() {
        let mut u = UserRecord::default();
        u.fields.insert("id".into(), "admin".into());
        assert_eq!(u.id(), Some("admin"));
    }

    #[test]
    fn user_endpoint_default_is_json() {
        assert_eq!(UserEndpoint::default(), UserEndpoint::Json);
    }

    #[test]
    fn ocs_meta_round_trips() {
        let json = r#"{"status":"ok","statuscode":100,"message":"OK"}"#;
        let meta: OcsMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.statuscode, OCS_STATUS_OK);
        assert_eq!(meta.message.as_deref(), Some("OK"));
    }
}
