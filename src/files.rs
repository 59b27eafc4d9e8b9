// ──────────────────────────────────────────────────────────────────────────────
// nc-api · files
// ──────────────────────────────────────────────────────────────────────────────
// File operations over WebDAV:
//  • Upload (in-memory bytes or a local file read source)
//  • Download (raw bytes; persisting is the caller's job)
//  • Metadata fetch (PROPFIND depth-0) with multistatus XML parsing
// ──────────────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::client::{is_dav_success, local_name, NextcloudClient};
use crate::directories::{directory_exists, is_storage_root, parent_path};
use crate::error::{NcError, NcResult};
use crate::types::{FileMetadata, PropfindDepth, RawResponse, RequestOptions, UploadSource};

/// Fixed property set requested by the metadata probe.
const METADATA_PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns">
  <d:prop>
    <d:getlastmodified />
    <d:getetag />
    <d:getcontenttype />
    <d:resourcetype />
    <oc:fileid />
    <oc:permissions />
    <oc:size />
    <d:getcontentlength />
    <nc:has-preview />
    <oc:favorite />
    <oc:comments-unread />
    <oc:owner-display-name />
    <oc:share-types />
    <nc:contained-folder-count />
    <nc:contained-file-count />
  </d:prop>
</d:propfind>"#;

// ── Upload / Download ────────────────────────────────────────────────────────

/// Upload a file. The parent directory must already exist; it is probed with
/// the fail-safe existence check, so an indeterminate probe also reports
/// `MissingParent`.
pub async fn upload(
    client: &NextcloudClient,
    source: UploadSource,
    remote_path: &str,
) -> NcResult<()> {
    if remote_path.trim_matches('/').is_empty() {
        return Err(NcError::InvalidArgument(
            "remote upload path must not be empty".into(),
        ));
    }

    let parent = parent_path(remote_path);
    if !is_storage_root(&parent) && !directory_exists(client, &parent).await {
        return Err(NcError::MissingParent { path: parent });
    }

    let data = read_source(source)?;
    let resp = put(client, remote_path, data).await?;
    put_outcome(remote_path, resp.status, resp.body_text())
}

/// Download a file. Returns the raw body bytes; writing them anywhere is the
/// caller's responsibility.
pub async fn download(client: &NextcloudClient, remote_path: &str) -> NcResult<Vec<u8>> {
    let resp = client
        .request("GET", remote_path, RequestOptions::default())
        .await?;
    if is_dav_success(resp.status) {
        Ok(resp.body)
    } else {
        Err(NcError::remote(
            format!("GET {}", remote_path),
            resp.status,
            resp.body_text(),
        ))
    }
}

/// Download a file and persist it through the local write sink.
pub async fn download_to_file(
    client: &NextcloudClient,
    remote_path: &str,
    local_path: &Path,
) -> NcResult<()> {
    let data = download(client, remote_path).await?;
    std::fs::write(local_path, data)?;
    Ok(())
}

// ── Metadata ─────────────────────────────────────────────────────────────────

/// Fetch metadata of a single resource via a depth-0 PROPFIND with the fixed
/// property list, flattened into an open property map.
pub async fn get_metadata(
    client: &NextcloudClient,
    remote_path: &str,
) -> NcResult<FileMetadata> {
    let resp = client
        .request(
            "PROPFIND",
            remote_path,
            RequestOptions::default()
                .header("Depth", PropfindDepth::Zero.as_str())
                .header("Content-Type", "application/xml")
                .body(METADATA_PROPFIND_BODY.as_bytes().to_vec()),
        )
        .await?;

    let text = metadata_response(remote_path, resp.status, resp.body_text())?;
    parse_file_metadata(&text)
}

/// Status mapping for the metadata probe.
fn metadata_response(path: &str, status: u16, body: String) -> NcResult<String> {
    if is_dav_success(status) {
        Ok(body)
    } else if status == 404 {
        Err(NcError::NotFound {
            path: path.to_string(),
        })
    } else {
        Err(NcError::remote(format!("PROPFIND {}", path), status, body))
    }
}

/// Parse a multistatus body into a `FileMetadata` record: the `href` of the
/// first `<response>` entry plus every property under its success propstat,
/// with namespace prefixes stripped and missing text content defaulting to
/// the empty string. Nested children of a property (e.g. the elements under
/// `resourcetype` or `share-types`) do not overwrite the property's value.
pub fn parse_file_metadata(xml: &str) -> NcResult<FileMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut href = String::new();
    let mut properties: BTreeMap<String, String> = BTreeMap::new();

    let mut saw_response = false;
    let mut in_response = false;
    let mut in_propstat = false;
    let mut in_prop = false;
    let mut in_href = false;
    let mut in_status = false;
    let mut current_prop: Option<String> = None;
    let mut nested_depth = 0usize;
    let mut pending: BTreeMap<String, String> = BTreeMap::new();
    let mut status_line = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "response" => {
                        in_response = true;
                        saw_response = true;
                    }
                    "propstat" if in_response => {
                        in_propstat = true;
                        pending.clear();
                        status_line.clear();
                    }
                    "prop" if in_propstat => in_prop = true,
                    "href" if in_response && !in_propstat => in_href = true,
                    "status" if in_propstat && !in_prop => in_status = true,
                    _ if in_prop => {
                        if current_prop.is_none() {
                            pending.insert(local.clone(), String::new());
                            current_prop = Some(local);
                        } else {
                            nested_depth += 1;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let local = local_name(e.name().as_ref());
                if in_prop && current_prop.is_none() {
                    pending.insert(local, String::new());
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape()?.to_string();
                if in_href && href.is_empty() {
                    href = text;
                } else if in_status {
                    status_line = text;
                } else if nested_depth == 0 {
                    if let Some(ref tag) = current_prop {
                        pending.insert(tag.clone(), text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "response" => {
                        // Only the first response entry is of interest.
                        break;
                    }
                    "propstat" => {
                        in_propstat = false;
                        if propstat_is_success(&status_line) {
                            properties.append(&mut pending);
                        }
                    }
                    "prop" => in_prop = false,
                    "href" => in_href = false,
                    "status" => in_status = false,
                    _ => {
                        if nested_depth > 0 {
                            nested_depth -= 1;
                        } else if current_prop.as_deref() == Some(local.as_str()) {
                            current_prop = None;
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    if !saw_response {
        return Err(NcError::Parse(
            "no response entry in multistatus body".into(),
        ));
    }

    Ok(FileMetadata { href, properties })
}

/// A propstat without a status line is treated as the success group.
fn propstat_is_success(status_line: &str) -> bool {
    status_line.is_empty() || status_line.contains("200")
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Resolve an upload source into its byte payload.
pub(crate) fn read_source(source: UploadSource) -> NcResult<Vec<u8>> {
    match source {
        UploadSource::Bytes(data) => Ok(data),
        UploadSource::LocalFile(path) => Ok(std::fs::read(&path)?),
    }
}

/// Issue a PUT with a full body and hand the raw response back.
pub(crate) async fn put(
    client: &NextcloudClient,
    remote_path: &str,
    data: Vec<u8>,
) -> NcResult<RawResponse> {
    client
        .request("PUT", remote_path, RequestOptions::default().body(data))
        .await
}

/// Status mapping for a single PUT.
pub(crate) fn put_outcome(path: &str, status: u16, body: String) -> NcResult<()> {
    if is_dav_success(status) {
        Ok(())
    } else {
        Err(NcError::remote(format!("PUT {}", path), status, body))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns">
  <d:response>
    <d:href>/remote.php/dav/files/alice/it_dir/a.txt</d:href>
    <d:propstat>
      <d:prop>
        <d:getlastmodified>Mon, 24 Aug 2026 10:00:00 GMT</d:getlastmodified>
        <d:getetag>"5d3c8e1f2a"</d:getetag>
        <d:getcontenttype>text/plain</d:getcontenttype>
        <d:resourcetype/>
        <oc:fileid>4711</oc:fileid>
        <oc:permissions>RGDNVW</oc:permissions>
        <d:getcontentlength>5</d:getcontentlength>
        <nc:has-preview>false</nc:has-preview>
        <oc:favorite>0</oc:favorite>
        <oc:share-types>
          <oc:share-type>0</oc:share-type>
        </oc:share-types>
        <x:vendor-extension xmlns:x="urn:x">opaque</x:vendor-extension>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
    <d:propstat>
      <d:prop>
        <oc:comments-unread/>
      </d:prop>
      <d:status>HTTP/1.1 404 Not Found</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn metadata_body_lists_fixed_properties() {
        for prop in [
            "d:getlastmodified",
            "d:getetag",
            "oc:fileid",
            "oc:share-types",
            "nc:contained-folder-count",
            "nc:contained-file-count",
            "oc:comments-unread",
            "oc:owner-display-name",
        ] {
            assert!(
                METADATA_PROPFIND_BODY.contains(prop),
                "missing {} in propfind body",
                prop
            );
        }
    }

    #[test]
    fn parse_extracts_href_and_properties() {
        let m = parse_file_metadata(FIXTURE).unwrap();
        assert_eq!(m.href, "/remote.php/dav/files/alice/it_dir/a.txt");
        assert_eq!(m.get("getcontenttype"), Some("text/plain"));
        assert_eq!(m.get("fileid"), Some("4711"));
        assert_eq!(m.content_length(), Some(5));
    }

    #[test]
    fn parse_yields_non_empty_etag() {
        let m = parse_file_metadata(FIXTURE).unwrap();
        let etag = m.etag().unwrap();
        assert!(!etag.is_empty());
    }

    #[test]
    fn parse_strips_namespace_prefixes() {
        let m = parse_file_metadata(FIXTURE).unwrap();
        assert!(m.properties.contains_key("has-preview"));
        assert!(!m.properties.keys().any(|k| k.contains(':')));
    }

    #[test]
    fn parse_defaults_missing_text_to_empty() {
        let m = parse_file_metadata(FIXTURE).unwrap();
        assert_eq!(m.get("resourcetype"), Some(""));
    }

    #[test]
    fn parse_ignores_nested_property_children() {
        // The share-type child must not overwrite share-types itself.
        let m = parse_file_metadata(FIXTURE).unwrap();
        assert_eq!(m.get("share-types"), Some(""));
    }

    #[test]
    fn parse_carries_unknown_properties_verbatim() {
        let m = parse_file_metadata(FIXTURE).unwrap();
        assert_eq!(m.get("vendor-extension"), Some("opaque"));
    }

    #[test]
    fn parse_skips_failed_propstat_group() {
        let m = parse_file_metadata(FIXTURE).unwrap();
        assert!(!m.properties.contains_key("comments-unread"));
    }

    #[test]
    fn parse_bad_entity_is_parse_error() {
        let xml = r#"<d:multistatus xmlns:d="DAV:"><d:response>
            <d:href>/f</d:href>
            <d:propstat><d:prop><d:getetag>&nope;</d:getetag></d:prop>
            <d:status>HTTP/1.1 200 OK</d:status></d:propstat>
        </d:response></d:multistatus>"#;
        assert!(matches!(
            parse_file_metadata(xml).unwrap_err(),
            NcError::Parse(_)
        ));
    }

    #[test]
    fn parse_malformed_xml_is_parse_error() {
        let err = parse_file_metadata("<d:multistatus><unclosed").unwrap_err();
        assert!(matches!(err, NcError::Parse(_)));
    }

    #[test]
    fn parse_without_response_entry_is_parse_error() {
        let err = parse_file_metadata(r#"<d:multistatus xmlns:d="DAV:"/>"#).unwrap_err();
        assert!(matches!(err, NcError::Parse(_)));
    }

    #[test]
    fn metadata_response_maps_404_to_not_found() {
        let err = metadata_response("/gone", 404, String::new()).unwrap_err();
        match err {
            NcError::NotFound { path } => assert_eq!(path, "/gone"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn metadata_response_passes_success_body_through() {
        let body = metadata_response("/x", 207, "xml".into()).unwrap();
        assert_eq!(body, "xml");
    }

    #[test]
    fn metadata_response_other_status_is_remote() {
        let err = metadata_response("/x", 500, "boom".into()).unwrap_err();
        assert!(matches!(err, NcError::Remote { status: 500, .. }));
    }

    #[test]
    fn put_outcome_success_set() {
        for s in [200, 201, 206, 207] {
            assert!(put_outcome("/f", s, String::new()).is_ok());
        }
        assert!(matches!(
            put_outcome("/f", 423, String::new()).unwrap_err(),
            NcError::Remote { status: 423, .. }
        ));
    }

    #[test]
    fn read_source_bytes_passthrough() {
        let data = read_source(UploadSource::Bytes(b"hello".to_vec())).unwrap();
        assert_eq!(data, b"hello");
    }

    #[test]
    fn read_source_local_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"from disk").unwrap();
        let data = read_source(UploadSource::LocalFile(f.path().to_path_buf())).unwrap();
        assert_eq!(data, b"from disk");
    }

    #[test]
    fn read_source_missing_file_is_io() {
        let err =
            read_source(UploadSource::LocalFile("/no/such/file.bin".into())).unwrap_err();
        assert!(matches!(err, NcError::Io(_)));
    }

    #[test]
    fn propstat_without_status_counts_as_success() {
        assert!(propstat_is_success(""));
        assert!(propstat_is_success("HTTP/1.1 200 OK"));
        assert!(!propstat_is_success("HTTP/1.1 404 Not Found"));
    }
}
