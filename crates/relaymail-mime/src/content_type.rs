//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

/// Fallback type for unknown or missing file extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// One `key=value` content type parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter value, unquoted.
    pub value: String,
    /// Always write the value in double quotes.
    pub quoted: bool,
}

/// MIME content type with parameters in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=UTF-8, boundary="xxx").
    pub parameters: Vec<Parameter>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "UTF-8")
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "UTF-8")
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_quoted_parameter("boundary", boundary)
    }

    /// Creates an `application/octet-stream` content type.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Resolves a content type from a file extension, case-insensitively.
    ///
    /// Unknown extensions resolve to `application/octet-stream`.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        let essence = match extension.to_ascii_lowercase().as_str() {
            // Text
            "txt" | "text" | "log" => "text/plain",
            "htm" | "html" => "text/html",
            "css" => "text/css",
            "csv" => "text/csv",
            "ics" => "text/calendar",
            "md" => "text/markdown",
            "xml" => "application/xml",
            "json" => "application/json",
            // Documents
            "pdf" => "application/pdf",
            "rtf" => "application/rtf",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "xls" => "application/vnd.ms-excel",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "ppt" => "application/vnd.ms-powerpoint",
            "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "odt" => "application/vnd.oasis.opendocument.text",
            "ods" => "application/vnd.oasis.opendocument.spreadsheet",
            "eml" => "message/rfc822",
            // Images
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "ico" => "image/vnd.microsoft.icon",
            "tif" | "tiff" => "image/tiff",
            // Archives
            "zip" => "application/zip",
            "gz" => "application/gzip",
            "tar" => "application/x-tar",
            "7z" => "application/x-7z-compressed",
            "rar" => "application/vnd.rar",
            // Audio and video
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "ogg" => "audio/ogg",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "avi" => "video/x-msvideo",
            "mov" => "video/quicktime",
            _ => OCTET_STREAM,
        };

        match essence.split_once('/') {
            Some((main, sub)) => Self::new(main, sub),
            None => Self::octet_stream(),
        }
    }

    /// Resolves a content type from the extension of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or_else(Self::octet_stream, Self::from_extension)
    }

    /// Adds a parameter, quoted only when the value requires it.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            value: value.into(),
            quoted: false,
        });
        self
    }

    /// Adds a parameter that is always written in double quotes.
    #[must_use]
    pub fn with_quoted_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            value: value.into(),
            quoted: true,
        });
        self
    }

    /// Returns the value of the first parameter named `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing, or the text
    /// contains a line break.
    pub fn parse(s: &str) -> Result<Self> {
        if s.contains(['\r', '\n']) {
            return Err(Error::InvalidContentType(format!(
                "Line break in content type: {s:?}"
            )));
        }

        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .map(|(main, sub)| (main.trim(), sub.trim()))
            .filter(|(main, sub)| !main.is_empty() && !sub.is_empty())
            .ok_or_else(|| Error::InvalidContentType(format!("Expected type/subtype: {s}")))?;

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());

        for param in parts {
            if let Some((name, value)) = param.trim().split_once('=') {
                let value = value.trim();
                let quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
                content_type.parameters.push(Parameter {
                    name: name.trim().to_lowercase(),
                    value: value.trim_matches('"').to_string(),
                    quoted,
                });
            }
        }

        Ok(content_type)
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::octet_stream()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for Parameter {
            name,
            value,
            quoted,
        } in &self.parameters
        {
            // Quote value if asked to or if it contains special characters
            let special = value.is_empty()
                || value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c));
            if *quoted || special {
                write!(f, "; {name}=\"{value}\"")?;
            } else {
                write!(f, "; {name}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_new() {
        let ct = ContentType::new("text", "plain");
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn test_text_plain_display() {
        assert_eq!(
            ContentType::text_plain().to_string(),
            "text/plain; charset=UTF-8"
        );
        assert_eq!(
            ContentType::text_html().to_string(),
            "text/html; charset=UTF-8"
        );
    }

    #[test]
    fn test_multipart_mixed() {
        let ct = ContentType::multipart_mixed("boundary123");
        assert_eq!(ct.boundary(), Some("boundary123"));
        assert!(ct.is_multipart());
        assert_eq!(
            ct.to_string(),
            "multipart/mixed; boundary=\"boundary123\""
        );
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ContentType::from_extension("pdf").essence(), "application/pdf");
        assert_eq!(ContentType::from_extension("JPG").essence(), "image/jpeg");
        assert_eq!(ContentType::from_extension("csv").essence(), "text/csv");
        assert_eq!(ContentType::from_extension("unknownext").essence(), OCTET_STREAM);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            ContentType::from_path(Path::new("/tmp/report.final.xlsx")).essence(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(ContentType::from_path(Path::new("Makefile")).essence(), OCTET_STREAM);
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/Plain; charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
        assert_eq!(ct.to_string(), "multipart/mixed; boundary=\"----=_Part_123\"");
    }

    #[test]
    fn test_content_type_parse_rejects() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("text/").is_err());
        assert!(ContentType::parse("text/plain\r\nBcc: x@y.com").is_err());
    }

    #[test]
    fn test_parameters_keep_order() {
        let ct = ContentType::new("text", "plain")
            .with_parameter("charset", "iso-8859-1")
            .with_parameter("format", "flowed");

        assert_eq!(ct.to_string(), "text/plain; charset=iso-8859-1; format=flowed");
        assert_eq!(ct.parameter("FORMAT"), Some("flowed"));
    }
}
