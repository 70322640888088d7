// crates/mockgate-core/src/core/headers.rs
// ============================================================================
// Module: Mockgate Headers
// Description: Ordered, case-insensitive header and cookie collections.
// Purpose: Carry multi-valued HTTP headers through matching, forwarding, and writing.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Headers`] keeps headers in insertion order with one entry per distinct name.
//! Name comparisons are ASCII case-insensitive; values are compared exactly.
//! Invariants:
//! - At most one [`Header`] exists per case-insensitive name.
//! - Adding a value for an existing name appends to that entry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Header Types
// ============================================================================

/// A single header name with one or more values.
///
/// # Invariants
/// - `name` keeps the casing it was first inserted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name as received or configured.
    pub name: String,
    /// Header values in order.
    pub values: Vec<String>,
}

impl Header {
    /// Creates a header with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Returns true when the header name matches `name` ignoring ASCII case.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Ordered multi-map of headers.
///
/// # Invariants
/// - Entries are unique by case-insensitive name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers {
    /// Header entries in insertion order.
    entries: Vec<Header>,
}

impl Headers {
    /// Creates an empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns a collection with `value` appended under `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// Appends a value under `name`, creating the entry when missing.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.is_named(&name)) {
            entry.values.push(value);
        } else {
            self.entries.push(Header::new(name, value));
        }
    }

    /// Replaces every value stored under the header's name with the header's values.
    ///
    /// The replaced entry keeps its position; new names are appended.
    pub fn replace(&mut self, header: Header) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.is_named(&header.name)) {
            *entry = header;
        } else {
            self.entries.push(header);
        }
    }

    /// Removes the entry for `name`. Returns true when an entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_named(name));
        before != self.entries.len()
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Header) -> bool) {
        self.entries.retain(keep);
    }

    /// Returns the entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Header> {
        self.entries.iter().find(|entry| entry.is_named(name))
    }

    /// Returns the first value stored under `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|entry| entry.values.first()).map(String::as_str)
    }

    /// Returns true when an entry exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns true when `name` carries exactly `value` among its values.
    #[must_use]
    pub fn contains_entry(&self, name: &str, value: &str) -> bool {
        self.get(name).is_some_and(|entry| entry.values.iter().any(|candidate| candidate == value))
    }

    /// Iterates header entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        let mut headers = Self::new();
        for header in iter {
            for value in header.values {
                headers.append(header.name.clone(), value);
            }
        }
        headers
    }
}

// ============================================================================
// SECTION: Cookies
// ============================================================================

/// A single cookie name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl Cookie {
    /// Creates a cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Merges `overrides` into `cookies`, replacing same-named cookies in place.
pub(crate) fn merge_cookies(cookies: &mut Vec<Cookie>, overrides: &[Cookie]) {
    for cookie in overrides {
        if let Some(existing) = cookies.iter_mut().find(|existing| existing.name == cookie.name) {
            existing.value.clone_from(&cookie.value);
        } else {
            cookies.push(cookie.clone());
        }
    }
}

/// Merges `overrides` into `headers`, replacing same-named entries.
pub(crate) fn merge_headers(headers: &mut Headers, overrides: &Headers) {
    for header in overrides.iter() {
        headers.replace(header.clone());
    }
}
