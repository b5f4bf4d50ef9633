//! Header collection with RFC 2822 unfolding.
//!
//! Headers keep arrival order and allow duplicates; lookup returns the
//! first case-insensitive match. Both properties matter: the derived-field
//! pass in [`crate::Message`] depends on iteration order, and `Received`
//! chains only make sense with duplicates preserved.

/// One message header, name and unfolded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Header name as it appeared, case preserved.
    pub name: String,
    /// Unfolded value with continuation lines joined by single spaces.
    pub value: String,
}

/// Ordered, duplicate-preserving header collection.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: Vec<Header>,
}

impl Headers {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, keeping any existing ones with the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
    }

    /// First value whose name matches case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// All headers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// True when no headers were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parses folded headers from `lines`, stopping at the first blank
    /// line. Returns the collection and the index of that blank line (or
    /// `lines.len()` if input ended first).
    ///
    /// A continuation line (leading space or tab) extends the previous
    /// value, joined with a single space regardless of the original
    /// indentation. Lines without a colon that are not continuations are
    /// skipped.
    #[must_use]
    pub fn parse_folded(lines: &[String]) -> (Self, usize) {
        let mut headers = Self::new();
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            if line.is_empty() {
                break;
            }

            if let Some((name, value)) = line.split_once(':') {
                let mut value = value.trim().to_string();
                while i + 1 < lines.len()
                    && (lines[i + 1].starts_with(' ') || lines[i + 1].starts_with('\t'))
                {
                    i += 1;
                    value.push(' ');
                    value.push_str(lines[i].trim());
                }
                headers.push(name.trim(), value);
            }
            i += 1;
        }

        (headers, i)
    }
}
