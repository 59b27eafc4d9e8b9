// ──────────────────────────────────────────────────────────────────────────────
// nc-api · paths
// ──────────────────────────────────────────────────────────────────────────────
// Path-level operations:
//  • Rename / move (WebDAV MOVE with a Destination header)
//  • Delete
//  • Recursive folder upload from the local filesystem, fail-fast
// ──────────────────────────────────────────────────────────────────────────────

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::client::{is_dav_success, NextcloudClient};
use crate::directories::{
    create_directory, directory_exists, is_storage_root, join_path, parent_path,
};
use crate::error::{NcError, NcResult};
use crate::files::{put, read_source};
use crate::types::{RequestOptions, UploadSource};

// ── Rename / Delete ──────────────────────────────────────────────────────────

/// Move a file or directory to a new path on the same storage. The
/// destination's parent is created best-effort beforehand; a failure there is
/// only logged, because the MOVE itself reports the authoritative outcome.
pub async fn rename(client: &NextcloudClient, old_path: &str, new_path: &str) -> NcResult<()> {
    if old_path.trim_matches('/').is_empty() || new_path.trim_matches('/').is_empty() {
        return Err(NcError::InvalidArgument(
            "rename requires non-empty source and destination paths".into(),
        ));
    }

    let parent = parent_path(new_path);
    if !is_storage_root(&parent) {
        if let Err(e) = create_directory(client, &parent).await {
            log::debug!("pre-creating {} before rename failed: {}", parent, e);
        }
    }

    let destination = client.dav_url(new_path);
    let resp = client
        .request(
            "MOVE",
            old_path,
            RequestOptions::default().header("Destination", &destination),
        )
        .await?;
    path_op_outcome("MOVE", old_path, resp.status, resp.body_text())
}

/// Delete a file or directory. Directories are removed recursively by the
/// server; there is no separate recursive flag.
pub async fn delete(client: &NextcloudClient, remote_path: &str) -> NcResult<()> {
    if remote_path.trim_matches('/').is_empty() {
        return Err(NcError::InvalidArgument(
            "refusing to DELETE the storage root".into(),
        ));
    }

    let resp = client
        .request("DELETE", remote_path, RequestOptions::default())
        .await?;
    path_op_outcome("DELETE", remote_path, resp.status, resp.body_text())
}

/// Shared status mapping for MOVE and DELETE.
fn path_op_outcome(op: &str, path: &str, status: u16, body: String) -> NcResult<()> {
    if is_dav_success(status) {
        Ok(())
    } else if status == 404 {
        Err(NcError::NotFound {
            path: path.to_string(),
        })
    } else if status == 403 {
        Err(NcError::PermissionDenied {
            path: path.to_string(),
        })
    } else {
        Err(NcError::remote(format!("{} {}", op, path), status, body))
    }
}

// ── Folder upload ────────────────────────────────────────────────────────────

/// Upload a local directory tree onto `remote_root`, recreating its
/// structure there. Existing remote files are overwritten. Fail-fast: the
/// first failing entry aborts the walk with an error naming the local file,
/// leaving already-transferred entries in place.
///
/// A PUT answered with 409 is retried once; the retry must answer 201.
pub async fn upload_folder(
    client: &NextcloudClient,
    local_dir: &Path,
    remote_root: &str,
) -> NcResult<()> {
    if !local_dir.is_dir() {
        return Err(NcError::InvalidArgument(format!(
            "{} is not a local directory",
            local_dir.display()
        )));
    }

    if !is_storage_root(remote_root) {
        ensure_remote_dir(client, remote_root).await?;
    }

    let tree = walk_local_tree(local_dir)?;
    for dir in &tree.dirs {
        ensure_remote_dir(client, &join_path(remote_root, &relative_remote(dir))).await?;
    }

    for file in &tree.files {
        let remote_path = join_path(remote_root, &relative_remote(file));
        let local_file = local_dir.join(file);
        let data = read_source(UploadSource::LocalFile(local_file.clone()))?;
        let resp = put(client, &remote_path, data.clone()).await?;
        match folder_put_outcome(&local_file, &remote_path, resp.status, resp.body_text())? {
            FolderPutStep::Done => {}
            FolderPutStep::RetryConflict => {
                log::debug!("conflict on {}, retrying once", remote_path);
                let retry = put(client, &remote_path, data).await?;
                folder_retry_outcome(&local_file, &remote_path, retry.status, retry.body_text())?;
            }
        }
    }
    Ok(())
}

/// Check-then-create for one remote directory. MKCOL is idempotent anyway,
/// so losing the race between probe and create is harmless.
async fn ensure_remote_dir(client: &NextcloudClient, remote_path: &str) -> NcResult<()> {
    if directory_exists(client, remote_path).await {
        return Ok(());
    }
    create_directory(client, remote_path).await
}

/// Outcome of the first PUT of one tree entry.
#[derive(Debug, PartialEq, Eq)]
enum FolderPutStep {
    Done,
    RetryConflict,
}

fn folder_put_outcome(
    local_file: &Path,
    remote_path: &str,
    status: u16,
    body: String,
) -> NcResult<FolderPutStep> {
    if is_dav_success(status) {
        Ok(FolderPutStep::Done)
    } else if status == 409 {
        Ok(FolderPutStep::RetryConflict)
    } else {
        Err(NcError::remote(
            format!("PUT {} (local {})", remote_path, local_file.display()),
            status,
            body,
        ))
    }
}

/// The conflict retry is only accepted when the server answers 201.
fn folder_retry_outcome(
    local_file: &Path,
    remote_path: &str,
    status: u16,
    body: String,
) -> NcResult<()> {
    if status == 201 {
        Ok(())
    } else {
        Err(NcError::remote(
            format!(
                "PUT {} retry after conflict (local {})",
                remote_path,
                local_file.display()
            ),
            status,
            body,
        ))
    }
}

// ── Local tree walk ──────────────────────────────────────────────────────────

/// Relative directory and file paths below a walk root, breadth-first with
/// sorted siblings, so parents always precede their children.
#[derive(Debug, Default)]
pub(crate) struct LocalTree {
    pub dirs: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

pub(crate) fn walk_local_tree(root: &Path) -> NcResult<LocalTree> {
    let mut tree = LocalTree::default();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(PathBuf::new());

    while let Some(rel) = queue.pop_front() {
        let mut entries: Vec<_> = std::fs::read_dir(root.join(&rel))?
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let child = rel.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                tree.dirs.push(child.clone());
                queue.push_back(child);
            } else {
                tree.files.push(child);
            }
        }
    }
    Ok(tree)
}

/// Render a relative local path as a forward-slash remote suffix.
fn relative_remote(rel: &Path) -> String {
    rel.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
