//! Path keys for hierarchical document access.
//!
//! A [`PathKey`] is the external, dotted/bracketed address of a location in a
//! document tree: `server.hosts[2].name` names the `name` field of the third
//! element of the `hosts` sequence under `server`. Keys are parsed once into
//! an ordered chain of [`Element`]s and then consumed stepwise by the walker:
//! the key acts as a cursor that is [`shift`](PathKey::shift)ed past one
//! element per tree level.
//!
//! The consumed prefix stays reconstructable via
//! [`element_path`](PathKey::element_path) / [`simple_path`](PathKey::simple_path)
//! so errors raised deep in a traversal can still reference the original key.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Error type for path key parsing failures.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The key text does not match the path grammar.
    #[error("malformed key '{key}': {reason}")]
    Malformed { key: String, reason: String },
}

impl KeyError {
    pub(crate) fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        KeyError::Malformed {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<KeyError> for crate::Error {
    fn from(err: KeyError) -> Self {
        crate::Error::Key(err)
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// One segment of a path key: a simple name plus an optional 0-based index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    name: String,
    index: Option<usize>,
}

impl Element {
    /// The segment name without its index suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 0-based sequence index, if the segment carries one.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns true if the segment addresses a sequence slot.
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{i}]", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A parsed path key with a consumption cursor.
///
/// The cursor starts on the first element. [`current`](PathKey::current)
/// exposes the first unconsumed element, [`has_more`](PathKey::has_more)
/// reports whether further elements follow it, and [`shift`](PathKey::shift)
/// advances past it. The original text is retained for error reporting and is
/// never rebuilt from the elements.
///
/// # Examples
///
/// ```
/// use pathdoc::key::PathKey;
///
/// let mut key = PathKey::parse("hosts[2].name")?;
/// let first = key.current().unwrap();
/// assert_eq!(first.name(), "hosts");
/// assert_eq!(first.index(), Some(2));
/// assert!(key.has_more());
///
/// key.shift();
/// assert_eq!(key.simple_key(), Some("name"));
/// assert!(!key.has_more());
/// # Ok::<(), pathdoc::key::KeyError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    original: String,
    elements: Vec<Element>,
    pos: usize,
}

impl PathKey {
    /// Parses the external text form of a key.
    ///
    /// Grammar: dot-separated segment names from `[A-Za-z0-9_-]`, each
    /// optionally suffixed with `[` + non-negative decimal integer + `]`.
    /// Empty keys, empty segments, and empty/negative/non-numeric indexes are
    /// rejected with [`KeyError::Malformed`].
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        if key.is_empty() {
            return Err(KeyError::malformed(key, "key is empty"));
        }

        let mut elements = Vec::new();
        for segment in key.split('.') {
            elements.push(Self::parse_segment(key, segment)?);
        }

        Ok(PathKey {
            original: key.to_string(),
            elements,
            pos: 0,
        })
    }

    fn parse_segment(key: &str, segment: &str) -> Result<Element, KeyError> {
        let (name, index) = match segment.find('[') {
            Some(open) => {
                let Some(rest) = segment[open..].strip_prefix('[') else {
                    unreachable!()
                };
                let Some(digits) = rest.strip_suffix(']') else {
                    return Err(KeyError::malformed(
                        key,
                        format!("segment '{segment}' has an unterminated index"),
                    ));
                };
                if digits.is_empty() {
                    return Err(KeyError::malformed(
                        key,
                        format!("segment '{segment}' has an empty index"),
                    ));
                }
                if !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(KeyError::malformed(
                        key,
                        format!("segment '{segment}' has a non-numeric index"),
                    ));
                }
                let index: usize = digits.parse().map_err(|_| {
                    KeyError::malformed(key, format!("index in '{segment}' is out of range"))
                })?;
                (&segment[..open], Some(index))
            }
            None => (segment, None),
        };

        if name.is_empty() {
            return Err(KeyError::malformed(key, "key contains an empty segment"));
        }
        if let Some(bad) = name.chars().find(|c| !is_key_char(*c)) {
            return Err(KeyError::malformed(
                key,
                format!("segment '{name}' contains illegal character '{bad}'"),
            ));
        }

        Ok(Element {
            name: name.to_string(),
            index,
        })
    }

    /// The first unconsumed element, or `None` once the key is exhausted.
    pub fn current(&self) -> Option<&Element> {
        self.elements.get(self.pos)
    }

    /// The current element's name without its index.
    pub fn simple_key(&self) -> Option<&str> {
        self.current().map(Element::name)
    }

    /// The current element's index, if any.
    pub fn index(&self) -> Option<usize> {
        self.current().and_then(Element::index)
    }

    /// Returns true if the current element carries an index.
    pub fn has_index(&self) -> bool {
        self.index().is_some()
    }

    /// Returns true if elements remain after the current one.
    pub fn has_more(&self) -> bool {
        self.pos + 1 < self.elements.len()
    }

    /// Advances the cursor past the current element.
    pub fn shift(&mut self) {
        if self.pos < self.elements.len() {
            self.pos += 1;
        }
    }

    /// The absolute prefix consumed so far, including the current element,
    /// with indexes. Used for error messages raised mid-traversal.
    pub fn element_path(&self) -> String {
        let end = (self.pos + 1).min(self.elements.len());
        self.elements[..end]
            .iter()
            .map(Element::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The absolute prefix consumed so far, without indexes.
    pub fn simple_path(&self) -> String {
        let end = (self.pos + 1).min(self.elements.len());
        self.elements[..end]
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The original, full key text.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Total number of elements in the key, consumed or not.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the key has no elements. Never true for a parsed key.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl FromStr for PathKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathKey::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let key = PathKey::parse("name").unwrap();
        assert_eq!(key.simple_key(), Some("name"));
        assert_eq!(key.index(), None);
        assert!(!key.has_more());
    }

    #[test]
    fn test_parse_nested_with_indexes() {
        let key = PathKey::parse("root[0].child.field[2]").unwrap();
        assert_eq!(key.len(), 3);
        assert_eq!(key.simple_key(), Some("root"));
        assert_eq!(key.index(), Some(0));
        assert!(key.has_more());
    }

    #[test]
    fn test_shift_and_paths() {
        let mut key = PathKey::parse("a[1].b.c[3]").unwrap();
        assert_eq!(key.element_path(), "a[1]");
        assert_eq!(key.simple_path(), "a");

        key.shift();
        assert_eq!(key.simple_key(), Some("b"));
        assert_eq!(key.element_path(), "a[1].b");
        assert_eq!(key.simple_path(), "a.b");
        assert!(key.has_more());

        key.shift();
        assert_eq!(key.simple_key(), Some("c"));
        assert_eq!(key.index(), Some(3));
        assert_eq!(key.element_path(), "a[1].b.c[3]");
        assert!(!key.has_more());

        // The original text is always available in full.
        assert_eq!(key.as_str(), "a[1].b.c[3]");
    }

    #[test]
    fn test_rejects_bad_keys() {
        let bad = [
            "",
            ".",
            "a..b",
            "a.",
            ".a",
            "a[",
            "a[]",
            "a[-1]",
            "a[x]",
            "a[1",
            "a[1]b",
            "a b",
            "a.b[1.5]",
        ];
        for key in bad {
            assert!(
                matches!(PathKey::parse(key), Err(KeyError::Malformed { .. })),
                "key '{key}' should be rejected"
            );
        }
    }

    #[test]
    fn test_allowed_characters() {
        assert!(PathKey::parse("snake_case.kebab-case.Mixed0").is_ok());
        assert!(PathKey::parse("with space").is_err());
        assert!(PathKey::parse("with/slash").is_err());
    }

    #[test]
    fn test_large_index() {
        let key = PathKey::parse("a[4096]").unwrap();
        assert_eq!(key.index(), Some(4096));
    }

    #[test]
    fn test_display_round_trip() {
        let key = PathKey::parse("a[1].b").unwrap();
        assert_eq!(format!("{key}"), "a[1].b");
        let again: PathKey = "a[1].b".parse().unwrap();
        assert_eq!(key, again);
    }
}
