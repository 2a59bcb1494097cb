//! `.properties` file reader
//!
//! Parses the line-oriented key/value format understood by Gradle for
//! `key.properties` and Flutter's `local.properties`:
//!
//! - `#` and `!` start comment lines
//! - keys end at the first unescaped `=`, `:` or whitespace
//! - a trailing odd run of backslashes continues the logical line
//! - `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are decoded, with UTF-16
//!   surrogate pairs combined into one character
//!
//! Files are decoded as ISO-8859-1, one byte per character, so any byte
//! sequence loads. Values are never logged; `Debug` prints key names only.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while reading a properties source
#[derive(Debug, Error)]
pub enum PropertiesError {
    /// The file could not be opened or read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A `\u` escape was not followed by four hex digits, or encodes an
    /// unpaired surrogate
    #[error("malformed \\uXXXX escape on line {line}")]
    InvalidEscape {
        /// 1-based line where the logical line starts
        line: usize,
    },
}

/// Parsed key/value pairs
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Properties")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Properties {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties from an in-memory string
    pub fn parse(input: &str) -> Result<Self, PropertiesError> {
        let mut props = Self::new();
        let mut logical = String::new();
        let mut start_line = 0;
        let mut continuing = false;

        // `\r\n`, `\n` and a lone `\r` all end a line
        let normalized = input.replace("\r\n", "\n");
        for (idx, line) in normalized.split(['\n', '\r']).enumerate() {
            let trimmed = line.trim_start_matches(is_blank);

            if !continuing {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                start_line = idx + 1;
            }

            if ends_with_continuation(trimmed) {
                logical.push_str(&trimmed[..trimmed.len() - 1]);
                continuing = true;
                continue;
            }

            logical.push_str(trimmed);
            continuing = false;
            props.insert_logical_line(&logical, start_line)?;
            logical.clear();
        }

        // Continuation on the last line of the input
        if continuing {
            props.insert_logical_line(&logical, start_line)?;
        }

        Ok(props)
    }

    /// Parse properties from a byte stream decoded as ISO-8859-1.
    /// `origin` only labels IO errors.
    pub fn from_reader<R: Read>(mut reader: R, origin: &Path) -> Result<Self, PropertiesError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|source| PropertiesError::Io {
            path: origin.to_path_buf(),
            source,
        })?;

        let text: String = bytes.iter().copied().map(char::from).collect();
        Self::parse(&text)
    }

    /// Load a properties file. The handle is closed before returning.
    pub fn load_file(path: &Path) -> Result<Self, PropertiesError> {
        let file = File::open(path).map_err(|source| PropertiesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path)
    }

    /// Load a properties file, returning `None` when it does not exist
    pub fn load_optional(path: &Path) -> Result<Option<Self>, PropertiesError> {
        match Self::load_file(path) {
            Ok(props) => Ok(Some(props)),
            Err(PropertiesError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether a key is present (an empty value still counts)
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn insert_logical_line(&mut self, raw: &str, line: usize) -> Result<(), PropertiesError> {
        let (key, value) = split_key_value(raw);
        let key = unescape(key, line)?;
        let value = unescape(value, line)?;
        self.entries.insert(key, value);
        Ok(())
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(raw: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = raw.len();
    let mut hit_separator = false;

    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                hit_separator = true;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &raw[..key_end];
    let mut rest = &raw[key_end..];
    if hit_separator {
        rest = rest[1..].trim_start_matches(is_blank);
    } else {
        rest = rest.trim_start_matches(is_blank);
        if let Some(stripped) = rest.strip_prefix(|c: char| c == '=' || c == ':') {
            rest = stripped.trim_start_matches(is_blank);
        }
    }

    (key, rest)
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_utf16_unit(&mut chars, line)?;
                let decoded = if (0xD800..0xDC00).contains(&unit) {
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_utf16_unit(&mut chars, line)?,
                        _ => return Err(PropertiesError::InvalidEscape { line }),
                    };
                    char::decode_utf16([unit, low]).next().and_then(Result::ok)
                } else {
                    char::from_u32(u32::from(unit))
                };
                out.push(decoded.ok_or(PropertiesError::InvalidEscape { line })?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Read the four hex digits of a `\uXXXX` escape
fn read_utf16_unit(chars: &mut std::str::Chars<'_>, line: usize) -> Result<u16, PropertiesError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
        return Err(PropertiesError::InvalidEscape { line });
    }
    u16::from_str_radix(&hex, 16).map_err(|_| PropertiesError::InvalidEscape { line })
}
