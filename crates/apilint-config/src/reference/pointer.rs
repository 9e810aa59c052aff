//! JSON pointer and `$ref` target helpers

/// Key that marks a reference node
pub const REF_KEY: &str = "$ref";

/// Escape one reference token (RFC 6901)
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Append an already unescaped token to a pointer
pub fn join(pointer: &str, token: &str) -> String {
    format!("{pointer}/{}", escape_token(token))
}

/// Render a pointer as a `#/...` fragment for messages
pub fn display(pointer: &str) -> String {
    format!("#{pointer}")
}

/// Parsed `$ref` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTarget {
    /// File part; `None` for same-document references
    pub path: Option<String>,
    /// Pointer into the target document (`""` is the root)
    pub pointer: String,
}

impl RefTarget {
    /// Parse `"<path>#<pointer>"`, `"<path>"` or `"#<pointer>"`
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (path, fragment) = match raw.split_once('#') {
            Some((path, fragment)) => (path, fragment),
            None => (raw, ""),
        };

        if !fragment.is_empty() && !fragment.starts_with('/') {
            return Err(format!("Invalid JSON pointer '{fragment}' in '{raw}'"));
        }

        let pointer = if fragment == "/" { "" } else { fragment };
        let path = (!path.is_empty()).then(|| path.to_string());
        if path.is_none() && pointer.is_empty() && raw != "#" && raw != "#/" {
            return Err("Empty $ref".to_string());
        }

        Ok(Self {
            path,
            pointer: pointer.to_string(),
        })
    }

    pub fn is_remote(&self) -> bool {
        self.path
            .as_deref()
            .is_some_and(|p| p.starts_with("http://") || p.starts_with("https://"))
    }
}

/// Extract the `$ref` string if `value` is a reference node: a mapping with
/// the single key `$ref` holding a string
pub fn ref_string(value: &serde_json::Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(REF_KEY)?.as_str()
}
