// crates/network/src/response.rs
//! Buffered HTTP responses

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};

/// A fully-read successful response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
    /// File name from a `Content-Disposition: attachment` header
    pub filename: Option<String>,
}

impl HttpResponse {
    /// Body as UTF-8 text, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Extracts `filename` from a `Content-Disposition` header
pub fn attachment_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    parse_disposition_filename(value)
}

fn parse_disposition_filename(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            parse_disposition_filename("attachment; filename=\"demo.zip\""),
            Some("demo.zip".to_string())
        );
    }

    #[test]
    fn test_bare_filename() {
        assert_eq!(
            parse_disposition_filename("attachment;filename=abc123.zip"),
            Some("abc123.zip".to_string())
        );
    }

    #[test]
    fn test_missing_filename() {
        assert_eq!(parse_disposition_filename("inline"), None);
        assert_eq!(parse_disposition_filename("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_from_header_map() {
        let mut headers = HeaderMap::new();
        assert_eq!(attachment_filename(&headers), None);
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"p.zip\""),
        );
        assert_eq!(attachment_filename(&headers).as_deref(), Some("p.zip"));
    }

    #[test]
    fn test_text_lossy() {
        let response = HttpResponse {
            status: 201,
            body: Bytes::from_static(b"{\"ids\": [1]}"),
            filename: None,
        };
        assert_eq!(response.text(), "{\"ids\": [1]}");
        assert!(!response.is_empty());
    }
}
