// ──────────────────────────────────────────────────────────────────────────────
// nc-api · users
// ──────────────────────────────────────────────────────────────────────────────
// Provisioning API reads over OCS:
//  • List user ids, with optional search / pagination filters
//  • Fetch one user's detail record
// Both the canonical JSON variant and the legacy XML envelope are supported;
// the variant is chosen per client, not per call.
// ──────────────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::client::{local_name, NextcloudClient};
use crate::error::{NcError, NcResult};
use crate::types::{
    OcsResponse, RequestOptions, UserEndpoint, UserQuery, UserRecord, OCS_STATUS_OK,
};

const USERS_PATH: &str = "/ocs/v1.php/cloud/users";

/// Embedded OCS codes the provisioning API uses for "no such user".
const OCS_NOT_FOUND_CODES: [u32; 2] = [404, 998];

#[derive(Debug, Deserialize)]
struct UserListData {
    users: Vec<String>,
}

// ── Operations ───────────────────────────────────────────────────────────────

/// List user ids visible to the authenticated account. The embedded OCS
/// status code decides success; the outer HTTP status alone does not.
pub async fn list_users(
    client: &NextcloudClient,
    endpoint: UserEndpoint,
    query: &UserQuery,
) -> NcResult<Vec<String>> {
    let resp = client
        .request("GET", USERS_PATH, user_request_options(endpoint, query))
        .await?;
    if !(200..300).contains(&resp.status) {
        return Err(NcError::remote(
            format!("GET {}", USERS_PATH),
            resp.status,
            resp.body_text(),
        ));
    }

    match endpoint {
        UserEndpoint::Json => {
            let parsed: OcsResponse<UserListData> = serde_json::from_slice(&resp.body)?;
            check_ocs_code(
                USERS_PATH,
                resp.status,
                parsed.ocs.meta.statuscode,
                parsed.ocs.meta.message.as_deref().unwrap_or(""),
            )?;
            Ok(parsed.ocs.data.users)
        }
        UserEndpoint::OcsXml => {
            let doc = parse_ocs_xml(&resp.body_text())?;
            check_ocs_code(USERS_PATH, resp.status, doc.statuscode, &doc.message)?;
            Ok(doc.users)
        }
    }
}

/// Fetch one user's detail record. An unknown id surfaces as `NotFound`,
/// whether the server signals it via HTTP 404 or an embedded OCS code.
pub async fn get_user(
    client: &NextcloudClient,
    endpoint: UserEndpoint,
    user_id: &str,
) -> NcResult<UserRecord> {
    if user_id.is_empty() {
        return Err(NcError::InvalidArgument("user id must not be empty".into()));
    }

    let path = format!("{}/{}", USERS_PATH, encode_user_id(user_id));
    let resp = client
        .request(
            "GET",
            &path,
            user_request_options(endpoint, &UserQuery::default()),
        )
        .await?;
    if resp.status == 404 {
        return Err(NcError::NotFound {
            path: user_id.to_string(),
        });
    }
    if !(200..300).contains(&resp.status) {
        return Err(NcError::remote(
            format!("GET {}", path),
            resp.status,
            resp.body_text(),
        ));
    }

    match endpoint {
        UserEndpoint::Json => {
            let parsed: OcsResponse<serde_json::Value> = serde_json::from_slice(&resp.body)?;
            user_lookup_code(
                user_id,
                &path,
                resp.status,
                parsed.ocs.meta.statuscode,
                parsed.ocs.meta.message.as_deref().unwrap_or(""),
            )?;
            flatten_user_json(&parsed.ocs.data)
        }
        UserEndpoint::OcsXml => {
            let doc = parse_ocs_xml(&resp.body_text())?;
            user_lookup_code(user_id, &path, resp.status, doc.statuscode, &doc.message)?;
            Ok(UserRecord {
                fields: doc.fields,
                groups: doc.groups,
            })
        }
    }
}

// ── Request shaping ──────────────────────────────────────────────────────────

/// Headers and query parameters shared by every provisioning call.
fn user_request_options(endpoint: UserEndpoint, query: &UserQuery) -> RequestOptions {
    let mut opts = RequestOptions::rest().header("OCS-APIRequest", "true");
    if endpoint == UserEndpoint::Json {
        opts = opts.query("format", "json");
    }
    if let Some(search) = &query.search {
        opts = opts.query("search", search);
    }
    if let Some(limit) = query.limit {
        opts = opts.query("limit", &limit.to_string());
    }
    if let Some(offset) = query.offset {
        opts = opts.query("offset", &offset.to_string());
    }
    opts
}

fn encode_user_id(user_id: &str) -> String {
    url::form_urlencoded::byte_serialize(user_id.as_bytes()).collect()
}

// ── Embedded status interpretation ───────────────────────────────────────────

fn check_ocs_code(path: &str, http_status: u16, code: u32, message: &str) -> NcResult<()> {
    if code == OCS_STATUS_OK {
        Ok(())
    } else {
        Err(NcError::remote(
            format!("GET {}", path),
            http_status,
            format!("ocs statuscode {}: {}", code, message),
        ))
    }
}

/// Like `check_ocs_code`, but maps the provisioning API's "no such user"
/// codes to `NotFound`.
fn user_lookup_code(
    user_id: &str,
    path: &str,
    http_status: u16,
    code: u32,
    message: &str,
) -> NcResult<()> {
    if OCS_NOT_FOUND_CODES.contains(&code) {
        return Err(NcError::NotFound {
            path: user_id.to_string(),
        });
    }
    check_ocs_code(path, http_status, code, message)
}

// ── JSON flattening ──────────────────────────────────────────────────────────

/// Flatten a user detail object into the open string map. Strings are kept
/// verbatim, scalars are rendered, nested structures are carried as compact
/// JSON, nulls are dropped. `groups` gets the dedicated ordered list.
fn flatten_user_json(data: &serde_json::Value) -> NcResult<UserRecord> {
    let obj = data
        .as_object()
        .ok_or_else(|| NcError::Parse("user detail payload is not an object".into()))?;

    let mut record = UserRecord::default();
    for (key, value) in obj {
        if key == "groups" {
            if let Some(items) = value.as_array() {
                record.groups = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
            }
            continue;
        }
        let rendered = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => serde_json::to_string(other)?,
        };
        record.fields.insert(key.clone(), rendered);
    }
    Ok(record)
}

// ── Legacy XML envelope ──────────────────────────────────────────────────────

/// One parsed OCS XML envelope. List responses fill `users`, detail
/// responses fill `fields` and `groups`; the meta block is always present.
#[derive(Debug, Default)]
struct OcsXmlDoc {
    statuscode: u32,
    message: String,
    users: Vec<String>,
    fields: BTreeMap<String, String>,
    groups: Vec<String>,
}

/// Parse the legacy envelope with an element-path stack. Only direct
/// children of `<data>` become detail fields; `<users>` and `<groups>`
/// collect their `<element>` children in document order.
fn parse_ocs_xml(xml: &str) -> NcResult<OcsXmlDoc> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut doc = OcsXmlDoc::default();
    let mut stack: Vec<String> = Vec::new();
    let mut saw_ocs = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = local_name(e.name().as_ref());
                if local == "ocs" {
                    saw_ocs = true;
                }
                stack.push(local.clone());
                // An opened detail field defaults to the empty string so
                // that e.g. <email></email> still appears in the record.
                if is_detail_field(&stack) {
                    doc.fields.entry(local).or_default();
                }
            }
            Ok(Event::Empty(ref e)) => {
                let local = local_name(e.name().as_ref());
                stack.push(local.clone());
                if is_detail_field(&stack) {
                    doc.fields.entry(local).or_default();
                }
                stack.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape()?.to_string();
                match path_suffix(&stack) {
                    ["meta", "statuscode"] => {
                        doc.statuscode = text.parse().map_err(|_| {
                            NcError::Parse(format!("non-numeric ocs statuscode {:?}", text))
                        })?;
                    }
                    ["meta", "message"] => doc.message = text,
                    ["users", "element"] => doc.users.push(text),
                    ["groups", "element"] => doc.groups.push(text),
                    _ => {
                        if is_detail_field(&stack) {
                            if let Some(field) = stack.last() {
                                doc.fields.insert(field.clone(), text);
                            }
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    if !saw_ocs {
        return Err(NcError::Parse("no ocs envelope in response body".into()));
    }
    Ok(doc)
}

/// True when the stack points at a direct child of `<data>` other than the
/// list containers.
fn is_detail_field(stack: &[String]) -> bool {
    match path_suffix(stack) {
        ["data", field] => field != "users" && field != "groups",
        _ => false,
    }
}

fn path_suffix(stack: &[String]) -> [&str; 2] {
    match stack {
        [.., a, b] => [a.as_str(), b.as_str()],
        [a] => ["", a.as_str()],
        [] => ["", ""],
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
