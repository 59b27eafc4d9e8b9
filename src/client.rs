// ──────────────────────────────────────────────────────────────────────────────
// nc-api · client
// ──────────────────────────────────────────────────────────────────────────────
// Transport layer: builds and issues exactly one authenticated HTTP request
// against either the WebDAV file-storage root or the administrative (OCS)
// root, and hands the raw status/headers/body back to the caller. Status
// codes are never interpreted here; protocol semantics live in the operation
// modules.
// ──────────────────────────────────────────────────────────────────────────────

use reqwest::{Client, Method};

use crate::error::{NcError, NcResult};
use crate::types::{NextcloudConfig, RawResponse, RequestOptions};

/// Shared transport handle. Cheap to clone; clones share the connection pool
/// and the immutable endpoint configuration.
#[derive(Debug, Clone)]
pub struct NextcloudClient {
    http: Client,
    config: NextcloudConfig,
}

impl NextcloudClient {
    pub fn new(config: NextcloudConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &NextcloudConfig {
        &self.config
    }

    // ── URL builders ─────────────────────────────────────────────────────

    /// WebDAV endpoint for the configured principal, e.g.
    /// `https://cloud.example.com/remote.php/dav/files/USERNAME`.
    pub fn dav_base(&self) -> String {
        format!(
            "{}/remote.php/dav/files/{}",
            self.config.base_url(),
            encode_segment(self.config.username())
        )
    }

    /// Absolute WebDAV URL for a remote path.
    pub fn dav_url(&self, path: &str) -> String {
        format!("{}/{}", self.dav_base(), encode_dav_path(path))
    }

    /// Absolute URL under the administrative root.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url(),
            path.trim_start_matches('/')
        )
    }

    // ── Request dispatch ─────────────────────────────────────────────────

    /// Issue one authenticated request. `method` accepts the WebDAV verbs
    /// (PROPFIND, MKCOL, MOVE, ...) as well as the standard ones. The
    /// per-call deadline and caller-side cancellation (dropping the future)
    /// both surface as `NcError::Transport`.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        opts: RequestOptions,
    ) -> NcResult<RawResponse> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| NcError::InvalidArgument(format!("invalid HTTP method: {}", method)))?;

        let url = if opts.rest_root {
            self.api_url(path)
        } else {
            self.dav_url(path)
        };

        let mut req = self
            .http
            .request(method, &url)
            .basic_auth(self.config.username(), Some(self.config.password()));

        for (name, value) in &opts.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !opts.query.is_empty() {
            req = req.query(&opts.query);
        }
        if let Some(body) = opts.body {
            req = req.body(body);
        }
        if let Some(deadline) = opts.timeout {
            req = req.timeout(deadline);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Statuses the file protocol treats as success for read/write operations.
pub(crate) fn is_dav_success(status: u16) -> bool {
    matches!(status, 200 | 201 | 206 | 207)
}

/// URL-encode a remote path for WebDAV URLs, segment by segment.
pub fn encode_dav_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_segment(seg: &str) -> String {
    url::form_urlencoded::byte_serialize(seg.as_bytes()).collect()
}

/// Extract the local name from a possibly-namespaced XML tag.
pub(crate) fn local_name(raw: &[u8]) -> String {
    let s = String::from_utf8_lossy(raw);
    match s.rfind(':') {
        Some(pos) => s[pos + 1..].to_string(),
        None => s.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NextcloudConfig;

    fn client() -> NextcloudClient {
        NextcloudClient::new(NextcloudConfig::new("https://nc.test", "alice", "pw"))
    }

    #[test]
    fn dav_base_includes_principal() {
        assert_eq!(
            client().dav_base(),
            "https://nc.test/remote.php/dav/files/alice"
        );
    }

    #[test]
    fn dav_url_encodes_path() {
        assert_eq!(
            client().dav_url("/Documents/hello world.pdf"),
            "https://nc.test/remote.php/dav/files/alice/Documents/hello+world.pdf"
        );
    }

    #[test]
    fn api_url_trims_leading_slash() {
        assert_eq!(
            client().api_url("/ocs/v1.php/cloud/users"),
            "https://nc.test/ocs/v1.php/cloud/users"
        );
    }

    #[test]
    fn encode_dav_path_basic() {
        assert_eq!(
            encode_dav_path("Documents/hello world.pdf"),
            "Documents/hello+world.pdf"
        );
    }

    #[test]
    fn encode_dav_path_leading_slash() {
        assert_eq!(encode_dav_path("/Photos"), "Photos");
    }

    #[test]
    fn dav_success_set() {
        for s in [200, 201, 206, 207] {
            assert!(is_dav_success(s), "{} should be success", s);
        }
        for s in [204, 401, 403, 404, 409, 500] {
            assert!(!is_dav_success(s), "{} should not be success", s);
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let c = NextcloudClient::new(NextcloudConfig::new("http://127.0.0.1:9", "alice", "pw"));
        let err = c
            .request("GET", "/x", RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NcError::Transport(_)));
    }

    #[tokio::test]
    async fn invalid_method_is_rejected_before_dispatch() {
        let err = client()
            .request("NOT A VERB", "/x", RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NcError::InvalidArgument(_)));
    }

    #[test]
    fn local_name_strips_prefix() {
        assert_eq!(local_name(b"d:getetag"), "getetag");
        assert_eq!(local_name(b"href"), "href");
        assert_eq!(local_name(b"oc:owner-display-name"), "owner-display-name");
    }
}
