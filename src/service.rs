// ──────────────────────────────────────────────────────────────────────────────
// nc-api · service
// ──────────────────────────────────────────────────────────────────────────────
// High-level facade over the operation modules. One `NextcloudService` owns
// the configured client and exposes every operation as a method, so callers
// do not thread the client through free functions themselves.
// ──────────────────────────────────────────────────────────────────────────────

use std::path::Path;

use crate::client::NextcloudClient;
use crate::error::NcResult;
use crate::types::{
    DirectoryProbe, FileMetadata, NextcloudConfig, UploadSource, UserEndpoint, UserQuery,
    UserRecord,
};
use crate::{directories, files, paths, users};

/// Storage service facade bound to one account on one server.
#[derive(Clone)]
pub struct NextcloudService {
    client: NextcloudClient,
    user_endpoint: UserEndpoint,
}

impl NextcloudService {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            client: NextcloudClient::new(NextcloudConfig::new(base_url, username, password)),
            user_endpoint: UserEndpoint::default(),
        }
    }

    /// Switch the administrative-protocol variant user operations speak.
    pub fn with_user_endpoint(mut self, endpoint: UserEndpoint) -> Self {
        self.user_endpoint = endpoint;
        self
    }

    /// Direct access to the underlying client, for callers composing their
    /// own requests.
    pub fn client(&self) -> &NextcloudClient {
        &self.client
    }

    // ── Directories ──────────────────────────────────────────────────────────

    pub async fn directory_exists(&self, path: &str) -> bool {
        directories::directory_exists(&self.client, path).await
    }

    pub async fn probe_directory(&self, path: &str) -> NcResult<DirectoryProbe> {
        directories::probe_directory(&self.client, path).await
    }

    pub async fn create_directory(&self, path: &str) -> NcResult<()> {
        directories::create_directory(&self.client, path).await
    }

    // ── Files ────────────────────────────────────────────────────────────────

    pub async fn upload(&self, source: UploadSource, remote_path: &str) -> NcResult<()> {
        files::upload(&self.client, source, remote_path).await
    }

    pub async fn download(&self, remote_path: &str) -> NcResult<Vec<u8>> {
        files::download(&self.client, remote_path).await
    }

    pub async fn download_to_file(&self, remote_path: &str, local_path: &Path) -> NcResult<()> {
        files::download_to_file(&self.client, remote_path, local_path).await
    }

    pub async fn get_metadata(&self, remote_path: &str) -> NcResult<FileMetadata> {
        files::get_metadata(&self.client, remote_path).await
    }

    // ── Paths ────────────────────────────────────────────────────────────────

    pub async fn rename(&self, old_path: &str, new_path: &str) -> NcResult<()> {
        paths::rename(&self.client, old_path, new_path).await
    }

    pub async fn delete(&self, remote_path: &str) -> NcResult<()> {
        paths::delete(&self.client, remote_path).await
    }

    pub async fn upload_folder(&self, local_dir: &Path, remote_root: &str) -> NcResult<()> {
        paths::upload_folder(&self.client, local_dir, remote_root).await
    }

    // ── Users ────────────────────────────────────────────────────────────────

    pub async fn list_users(&self, query: &UserQuery) -> NcResult<Vec<String>> {
        users::list_users(&self.client, self.user_endpoint, query).await
    }

    pub async fn get_user(&self, user_id: &str) -> NcResult<UserRecord> {
        users::get_user(&self.client, self.user_endpoint, user_id).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
