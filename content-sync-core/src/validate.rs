use serde::de::IgnoredAny;
use std::fmt;

/// Where and why a payload failed to parse as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// 1-based line of the error, 0 when the parser could not locate it.
    pub line: usize,
    /// 1-based column of the error, 0 when the parser could not locate it.
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "invalid JSON: {}", self.message)
        } else {
            write!(
                f,
                "invalid JSON at line {} column {}: {}",
                self.line, self.column, self.message
            )
        }
    }
}

impl std::error::Error for ValidationError {}

/// Accepts any syntactically valid JSON document, rejecting trailing garbage.
pub fn validate(content: &[u8]) -> Result<(), ValidationError> {
    serde_json::from_slice::<IgnoredAny>(content)
        .map(|_| ())
        .map_err(|e| {
            let message = e.to_string();
            // serde_json appends " at line X column Y"; the fields carry that already.
            let message = match message.rfind(" at line ") {
                Some(idx) if e.line() > 0 => message[..idx].to_string(),
                _ => message,
            };
            ValidationError {
                line: e.line(),
                column: e.column(),
                message,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_objects_arrays_and_scalars() {
        assert!(validate(r#"{"title": "الدرس"}"#.as_bytes()).is_ok());
        assert!(validate(b"[1, 2, 3]").is_ok());
        assert!(validate(b"  \"just a string\"\n").is_ok());
    }

    #[test]
    fn accepts_utf8_arabic_text() {
        assert!(validate("{\"عنوان\": \"المتغيرات في بايثون\"}".as_bytes()).is_ok());
    }

    #[test]
    fn truncated_document_reports_location() {
        let err = validate(b"{\n  \"lessons\": [1, 2").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.column > 0);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_trailing_characters() {
        let err = validate(b"{} {}").unwrap_err();
        assert!(err.message.contains("trailing"), "got: {}", err.message);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(validate(b"").is_err());
    }
}
