// ──────────────────────────────────────────────────────────────────────────────
// nc-api
// ──────────────────────────────────────────────────────────────────────────────
// Client library for a Nextcloud-style remote file storage:
//  • WebDAV file and directory operations (PROPFIND, MKCOL, PUT, GET, MOVE,
//    DELETE) against `<base>/remote.php/dav/files/<user>`
//  • OCS provisioning reads (user listing and detail) in the JSON or legacy
//    XML envelope
//  • A thin transport that dispatches requests verbatim and leaves status
//    interpretation to the operation layers
// ──────────────────────────────────────────────────────────────────────────────

pub mod client;
pub mod directories;
pub mod error;
pub mod files;
pub mod paths;
pub mod service;
pub mod types;
pub mod users;

pub use client::{encode_dav_path, NextcloudClient};
pub use error::{NcError, NcResult};
pub use service::NextcloudService;
pub use types::{
    DirectoryProbe, FileMetadata, NextcloudConfig, PropfindDepth, RawResponse, RequestOptions,
    UploadSource, UserEndpoint, UserQuery, UserRecord,
};
