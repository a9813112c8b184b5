//! File attachments: a secondary entity bound to one named field of one
//! owning record.
//!
//! An attachment has its own upload/delete lifecycle against the backend's
//! file service, independent of the owner's attribute encoding until save
//! time. Raw bytes travel only over the attachment's own upload call; the
//! owner's payload ever carries just the `{__type: File, name, url}`
//! handle.

use serde_json::Value;

use crate::client::Client;
use crate::encoded::{self, Encoded};
use crate::error::{violation_from_body, Error, Violations};
use crate::transport::{Method, Request};

/// Characters replaced by `_` when sanitizing an uploaded filename. These
/// are the URL-unsafe characters the file endpoint rejects.
pub const RESTRICTED_FILENAME_CHARS: &[char] = &[
    '&', '$', '+', ',', '/', ':', ';', '=', '?', '@', '<', '>', '[', ']', '{', '}', '|', '\\',
    '^', '~', '%', '#', ' ',
];

/// An uploaded file handed to [`FileAttachment::assign`]: the original
/// filename, its content type, and the raw bytes.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Read an upload from disk, guessing the content type from the
    /// extension.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("txt") => "text/plain",
            Some("pdf") => "application/pdf",
            Some("json") => "application/json",
            _ => "application/octet-stream",
        };
        Ok(Self::new(filename, content_type, data))
    }
}

/// The file bound to one field of one record.
///
/// Unbound (no remote name/url) until a successful upload adopts the
/// remote-assigned name and URL and marks the attachment dirty; a dirty
/// attachment's handle is folded into the owner's pending attributes
/// before the owner saves.
#[derive(Debug)]
pub struct FileAttachment {
    field: String,
    name: Option<String>,
    url: Option<String>,
    data: Option<Vec<u8>>,
    content_type: Option<String>,
    extension: Option<String>,
    size: u64,
    original_filename: Option<String>,
    dirty: bool,
    errors: Violations,
}

impl FileAttachment {
    pub(crate) fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            name: None,
            url: None,
            data: None,
            content_type: None,
            extension: None,
            size: 0,
            original_filename: None,
            dirty: false,
            errors: Violations::new(),
        }
    }

    /// Seed an attachment from a File-tagged attribute value the backend
    /// returned for the owning record.
    pub(crate) fn from_attr(field: &str, value: &Value) -> Self {
        let mut attachment = Self::new(field);
        if let Encoded::File { name, url } = Encoded::classify(value) {
            attachment.name = name;
            attachment.url = url;
        }
        attachment
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Remote-assigned name; absent until uploaded.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Remote URL; absent until uploaded.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    /// True only after a successful upload in the current process.
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn errors(&self) -> &Violations {
        &self.errors
    }

    /// Capture an upload locally: sanitize the filename, derive the
    /// extension, trim the content type, record the byte size. No network
    /// call. A `None` input is a no-op.
    pub fn assign(&mut self, upload: impl Into<Option<FileUpload>>) {
        let Some(upload) = upload.into() else {
            return;
        };

        let cleaned = sanitize_filename(&upload.filename);
        self.extension = extension_of(&cleaned);
        self.content_type = Some(upload.content_type.trim().to_string());
        self.size = upload.data.len() as u64;
        self.original_filename = Some(cleaned);
        self.data = Some(upload.data);
    }

    /// Upload the captured bytes to the file service.
    ///
    /// No-op when nothing was assigned. On success the attachment adopts
    /// the remote name and URL and becomes dirty. A 400 maps the backend
    /// error into this attachment's violations and returns `Ok(false)`.
    /// Any other status is left as a logged no-op.
    pub fn save(&mut self, client: &Client) -> Result<bool, Error> {
        let Some(data) = self.data.clone() else {
            return Ok(true);
        };
        let Some(filename) = self.original_filename.clone() else {
            return Ok(true);
        };
        let content_type = self
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let path = format!("files/{}", urlencoding::encode(&filename));
        let request = Request::new(Method::Post, path).with_raw(data, content_type);
        let response = client.execute(&request)?;

        if response.status == 400 {
            self.errors.add(violation_from_body(&response.body));
            return Ok(false);
        }

        if response.is_success() {
            let body = response.json()?;
            self.name = body.get("name").and_then(Value::as_str).map(str::to_string);
            self.url = body.get("url").and_then(Value::as_str).map(str::to_string);
            self.dirty = true;
            return Ok(true);
        }

        tracing::warn!(
            status = response.status,
            field = %self.field,
            "unexpected file upload status, attachment left unsent"
        );
        Ok(true)
    }

    /// Delete the remote file resource, unconditionally. A never-uploaded
    /// attachment has nothing to address and no-ops.
    pub fn destroy(&self, client: &Client) -> Result<(), Error> {
        let Some(name) = self.name.as_deref() else {
            return Ok(());
        };
        let path = format!("files/{}", urlencoding::encode(name));
        client.execute(&Request::new(Method::Delete, path))?;
        Ok(())
    }

    /// The field's encoded form for transmission, usable in any state: an
    /// unbound attachment encodes with null name/url, which clears the
    /// field on the backend.
    pub fn to_attr(&self) -> Value {
        encoded::file_value(self.name.as_deref(), self.url.as_deref())
    }
}

fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if RESTRICTED_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_with, StubTransport};
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my file:name?.png"), "my_file_name_.png");
        assert_eq!(sanitize_filename("a&b$c+d.txt"), "a_b_c_d.txt");
        assert_eq!(sanitize_filename("clean.png"), "clean.png");
    }

    #[test]
    fn test_assign_captures_metadata() {
        let mut attachment = FileAttachment::new("avatar");
        attachment.assign(FileUpload::new(
            "my file:name?.png",
            "  image/png  ",
            vec![1, 2, 3],
        ));

        assert_eq!(attachment.original_filename(), Some("my_file_name_.png"));
        assert_eq!(attachment.extension(), Some("png"));
        assert_eq!(attachment.content_type(), Some("image/png"));
        assert_eq!(attachment.size(), 3);
        assert!(!attachment.dirty());
        assert!(attachment.name().is_none());
    }

    #[test]
    fn test_assign_none_is_noop() {
        let mut attachment = FileAttachment::new("avatar");
        attachment.assign(None);
        assert!(attachment.original_filename().is_none());
        assert_eq!(attachment.size(), 0);
    }

    #[test]
    fn test_extension_edge_cases() {
        assert_eq!(extension_of("photo.PNG"), Some("PNG".to_string()));
        assert_eq!(extension_of("no-extension"), None);
        assert_eq!(extension_of(".hidden"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_save_noop_without_assignment() {
        let stub = StubTransport::new();
        let client = client_with(&stub);

        let mut attachment = FileAttachment::new("avatar");
        assert!(attachment.save(&client).unwrap());
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn test_save_adopts_remote_name_and_url() {
        let stub = StubTransport::new();
        stub.push_json(201, json!({"name": "srv-a.png", "url": "http://files/srv-a.png"}));
        let client = client_with(&stub);

        let mut attachment = FileAttachment::new("avatar");
        attachment.assign(FileUpload::new("a.png", "image/png", b"bytes".to_vec()));
        assert!(attachment.save(&client).unwrap());

        assert!(attachment.dirty());
        assert_eq!(attachment.name(), Some("srv-a.png"));
        assert_eq!(attachment.url(), Some("http://files/srv-a.png"));

        let requests = stub.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].path, "files/a.png");
        match &requests[0].body {
            crate::transport::RequestBody::Raw { data, content_type } => {
                assert_eq!(data, b"bytes");
                assert_eq!(content_type, "image/png");
            }
            other => panic!("expected raw body, got {:?}", other),
        }
    }

    #[test]
    fn test_save_400_records_violation() {
        let stub = StubTransport::new();
        stub.push_json(400, json!({"code": 122, "error": "bad file name"}));
        let client = client_with(&stub);

        let mut attachment = FileAttachment::new("avatar");
        attachment.assign(FileUpload::new("a.png", "image/png", b"bytes".to_vec()));

        assert!(!attachment.save(&client).unwrap());
        assert!(!attachment.dirty());
        assert_eq!(attachment.errors().on("file_name").len(), 1);
    }

    #[test]
    fn test_save_other_status_is_noop() {
        let stub = StubTransport::new();
        stub.push_json(503, json!({"error": "maintenance"}));
        let client = client_with(&stub);

        let mut attachment = FileAttachment::new("avatar");
        attachment.assign(FileUpload::new("a.png", "image/png", b"bytes".to_vec()));

        assert!(attachment.save(&client).unwrap());
        assert!(!attachment.dirty());
        assert!(attachment.errors().is_empty());
    }

    #[test]
    fn test_to_attr_unbound_clears_field() {
        let attachment = FileAttachment::new("avatar");
        assert_eq!(
            attachment.to_attr(),
            json!({"__type": "File", "name": null, "url": null})
        );
    }

    #[test]
    fn test_destroy_unbound_is_local_noop() {
        let stub = StubTransport::new();
        let client = client_with(&stub);

        let attachment = FileAttachment::new("avatar");
        attachment.destroy(&client).unwrap();
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn test_from_attr_adopts_handle() {
        let attachment = FileAttachment::from_attr(
            "avatar",
            &json!({"__type": "File", "name": "srv-a.png", "url": "http://files/srv-a.png"}),
        );
        assert_eq!(attachment.name(), Some("srv-a.png"));
        assert_eq!(attachment.url(), Some("http://files/srv-a.png"));
        assert!(!attachment.dirty());
    }

    #[test]
    fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "hello").unwrap();

        let upload = FileUpload::from_path(&path).unwrap();
        assert_eq!(upload.filename, "note.txt");
        assert_eq!(upload.content_type, "text/plain");
        assert_eq!(upload.data, b"hello");
    }
}
