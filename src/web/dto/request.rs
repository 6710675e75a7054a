//! Request DTOs for the file API.
//!
//! Every field is optional so a missing field reaches the handler, which
//! decides between 400 and 401. Handlers read the query string first and
//! fill the rest from the form body with `or`.

use serde::Deserialize;

/// `primary` unless it is absent or empty.
fn first_set(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary.filter(|value| !value.is_empty()).or(fallback)
}

/// Rename request (PATCH).
#[derive(Debug, Default, Deserialize)]
pub struct RenameRequest {
    /// Destination path relative to the storage root.
    #[serde(rename = "newPath", default)]
    pub new_path: Option<String>,
}

impl RenameRequest {
    /// Fill fields missing or empty here from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            new_path: first_set(self.new_path, fallback.new_path),
        }
    }
}

/// Delete request (DELETE).
#[derive(Debug, Default, Deserialize)]
pub struct DeleteRequest {
    /// Delete secret.
    #[serde(default)]
    pub password: Option<String>,
    /// `"true"` deletes folders recursively.
    #[serde(default)]
    pub force: Option<String>,
}

impl DeleteRequest {
    /// Fill fields missing or empty here from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            password: first_set(self.password, fallback.password),
            force: first_set(self.force, fallback.force),
        }
    }

    /// Whether recursive deletion was requested.
    pub fn is_forced(&self) -> bool {
        self.force.as_deref() == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_prefers_own_fields() {
        let query = DeleteRequest {
            password: Some("from-query".to_string()),
            force: None,
        };
        let body = DeleteRequest {
            password: Some("from-body".to_string()),
            force: Some("true".to_string()),
        };

        let merged = query.or(body);
        assert_eq!(merged.password.as_deref(), Some("from-query"));
        assert!(merged.is_forced());
    }

    #[test]
    fn test_or_skips_empty_values() {
        let query = DeleteRequest {
            password: Some(String::new()),
            force: None,
        };
        let body = DeleteRequest {
            password: Some("from-body".to_string()),
            force: None,
        };

        assert_eq!(query.or(body).password.as_deref(), Some("from-body"));
    }

    #[test]
    fn test_rename_field_name() {
        let request: RenameRequest = serde_json::from_str(r#"{"newPath":"a/b.txt"}"#).unwrap();
        assert_eq!(request.new_path.as_deref(), Some("a/b.txt"));

        let empty = RenameRequest::default().or(request);
        assert_eq!(empty.new_path.as_deref(), Some("a/b.txt"));
    }

    #[test]
    fn test_is_forced() {
        let forced = DeleteRequest {
            password: None,
            force: Some("true".to_string()),
        };
        assert!(forced.is_forced());

        for value in [None, Some("TRUE"), Some("1"), Some("")] {
            let request = DeleteRequest {
                password: None,
                force: value.map(str::to_string),
            };
            assert!(!request.is_forced());
        }
    }
}
