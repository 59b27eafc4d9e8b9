// ──────────────────────────────────────────────────────────────────────────────
// nc-api · directories
// ──────────────────────────────────────────────────────────────────────────────
// Directory operations over WebDAV:
//  • Existence probe (fail-safe and strict variants)
//  • Idempotent creation (MKCOL)
//  • Remote-path helpers shared by the file and path layers
// ──────────────────────────────────────────────────────────────────────────────

use log::debug;

use crate::client::NextcloudClient;
use crate::error::{NcError, NcResult};
use crate::types::{DirectoryProbe, PropfindDepth, RequestOptions};

// ── Existence ────────────────────────────────────────────────────────────────

/// Fail-safe existence check: 207 means present, everything else (404,
/// unexpected statuses, transport failures) collapses to `false`. Callers
/// that must distinguish "confirmed absent" from "indeterminate" use
/// [`probe_directory`] instead.
pub async fn directory_exists(client: &NextcloudClient, path: &str) -> bool {
    match probe_directory(client, path).await {
        Ok(DirectoryProbe::Present) => true,
        Ok(DirectoryProbe::Absent) => false,
        Err(err) => {
            debug!("existence probe for {} degraded to absent: {}", path, err);
            false
        }
    }
}

/// Strict existence probe: PROPFIND with `Depth: 1`. 207 is `Present`, 404
/// is `Absent`, any other status or transport failure propagates.
pub async fn probe_directory(
    client: &NextcloudClient,
    path: &str,
) -> NcResult<DirectoryProbe> {
    let resp = client
        .request(
            "PROPFIND",
            path,
            RequestOptions::default().header("Depth", PropfindDepth::One.as_str()),
        )
        .await?;
    probe_outcome(path, resp.status, resp.body_text())
}

/// Status mapping for the existence probe: 207 present, 404 absent,
/// anything else unexpected.
fn probe_outcome(path: &str, status: u16, body: String) -> NcResult<DirectoryProbe> {
    match status {
        207 => Ok(DirectoryProbe::Present),
        404 => Ok(DirectoryProbe::Absent),
        status => Err(NcError::remote(format!("PROPFIND {}", path), status, body)),
    }
}

// ── Creation ─────────────────────────────────────────────────────────────────

/// Create a collection via MKCOL. Idempotent: a 405 (collection already
/// present) counts as success, so calling this twice on the same path
/// succeeds both times.
pub async fn create_directory(client: &NextcloudClient, path: &str) -> NcResult<()> {
    if path.trim_matches('/').is_empty() {
        return Err(NcError::InvalidArgument(
            "directory path must not be empty".into(),
        ));
    }

    let resp = client
        .request("MKCOL", path, RequestOptions::default())
        .await?;
    mkcol_outcome(path, resp.status, resp.body_text())
}

/// Status mapping for MKCOL: 201 created, 405 already exists (both success),
/// 409 parent missing, anything else unexpected.
fn mkcol_outcome(path: &str, status: u16, body: String) -> NcResult<()> {
    match status {
        201 | 405 => Ok(()),
        409 => Err(NcError::MissingParent {
            path: parent_path(path),
        }),
        status => Err(NcError::remote(format!("MKCOL {}", path), status, body)),
    }
}

// ── Remote-path helpers ──────────────────────────────────────────────────────

/// Parent of a remote path: everything before the final slash segment.
/// Returns `""` for top-level entries (the storage root).
pub fn parent_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => trimmed[..pos].to_string(),
        None => String::new(),
    }
}

/// Final slash segment of a remote path.
pub fn file_name(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

/// Join two remote path fragments with a single slash.
pub fn join_path(base: &str, child: &str) -> String {
    let b = base.trim_end_matches('/');
    let c = child.trim_start_matches('/');
    if c.is_empty() {
        b.to_string()
    } else {
        format!("{}/{}", b, c)
    }
}

/// Whether a parent path refers to the storage root (which always exists,
/// so no probe is needed before writing directly under it).
pub(crate) fn is_storage_root(parent: &str) -> bool {
    parent.trim_matches('/').is_empty()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NextcloudConfig;

    fn unreachable_client() -> NextcloudClient {
        NextcloudClient::new(NextcloudConfig::new("http://127.0.0.1:9", "alice", "pw"))
    }

    #[test]
    fn probe_207_is_present() {
        let probe = probe_outcome("/Documents", 207, String::new()).unwrap();
        assert_eq!(probe, DirectoryProbe::Present);
    }

    #[test]
    fn probe_404_is_absent() {
        let probe = probe_outcome("/never-created", 404, String::new()).unwrap();
        assert_eq!(probe, DirectoryProbe::Absent);
    }

    #[test]
    fn probe_other_status_is_remote() {
        let err = probe_outcome("/x", 503, "maintenance".into()).unwrap_err();
        match err {
            NcError::Remote { op, status, body } => {
                assert_eq!(op, "PROPFIND /x");
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn exists_collapses_transport_failure_to_false() {
        // Fail-safe policy: a path that was never created (and a server that
        // cannot even be reached) both read as absent, never as an error.
        assert!(!directory_exists(&unreachable_client(), "/never-created").await);
    }

    #[tokio::test]
    async fn strict_probe_propagates_transport_failure() {
        let err = probe_directory(&unreachable_client(), "/never-created")
            .await
            .unwrap_err();
        assert!(matches!(err, NcError::Transport(_)));
    }

    #[test]
    fn mkcol_created_is_ok() {
        assert!(mkcol_outcome("/new", 201, String::new()).is_ok());
    }

    #[test]
    fn mkcol_already_exists_is_ok() {
        // Idempotence: a second MKCOL on an existing collection answers 405.
        assert!(mkcol_outcome("/new", 405, String::new()).is_ok());
    }

    #[test]
    fn mkcol_conflict_is_missing_parent() {
        let err = mkcol_outcome("/a/b/c", 409, String::new()).unwrap_err();
        match err {
            NcError::MissingParent { path } => assert_eq!(path, "/a/b"),
            other => panic!("expected MissingParent, got {:?}", other),
        }
    }

    #[test]
    fn mkcol_other_status_is_remote() {
        let err = mkcol_outcome("/x", 507, "full".into()).unwrap_err();
        match err {
            NcError::Remote { op, status, body } => {
                assert_eq!(op, "MKCOL /x");
                assert_eq!(status, 507);
                assert_eq!(body, "full");
            }
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[test]
    fn parent_path_nested() {
        assert_eq!(parent_path("/a/b/c.txt"), "/a/b");
    }

    #[test]
    fn parent_path_top_level() {
        assert_eq!(parent_path("/Documents"), "");
    }

    #[test]
    fn parent_path_no_slash() {
        assert_eq!(parent_path("file.txt"), "");
    }

    #[test]
    fn file_name_basic() {
        assert_eq!(file_name("/path/to/file.txt"), "file.txt");
        assert_eq!(file_name("/path/to/folder/"), "folder");
    }

    #[test]
    fn join_path_normalizes_slashes() {
        assert_eq!(join_path("/a/b/", "/c/d"), "/a/b/c/d");
        assert_eq!(join_path("/a/b", "c"), "/a/b/c");
        assert_eq!(join_path("/a/b", ""), "/a/b");
    }

    #[test]
    fn storage_root_detection() {
        assert!(is_storage_root(""));
        assert!(is_storage_root("/"));
        assert!(!is_storage_root("/Documents"));
    }
}
