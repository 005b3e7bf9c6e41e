//! Multipart body builder with full control over part order and headers.

use bytes::Bytes;

pub const BOUNDARY: &str = "depot-integration-boundary";

/// Content type header value matching [`BOUNDARY`].
pub fn content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn field(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }

    /// File part named `file`; `content_type` of `None` omits the header.
    pub fn file(content_type: Option<&str>, data: &[u8]) -> Self {
        Self {
            name: "file".to_string(),
            content_type: content_type.map(str::to_string),
            data: data.to_vec(),
        }
    }
}

pub fn encode(parts: &[Part]) -> Bytes {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        out.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
        );
        if let Some(ct) = &part.content_type {
            out.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&part.data);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Bytes::from(out)
}

/// The complete, valid form for `file`, fields in the documented order.
pub fn valid_parts(file: &[u8]) -> Vec<Part> {
    vec![
        Part::field("name", "name"),
        Part::field("description", "description"),
        Part::field("size", &file.len().to_string()),
        Part::field("device_types_compatible", "Beagle Bone"),
        Part::field("type", "single_file"),
        Part::field("args", "args"),
        Part::file(Some("application/octet-stream"), file),
    ]
}
