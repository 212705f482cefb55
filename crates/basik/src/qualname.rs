//! Qualified names for compiled units.
//!
//! A qualified name packs three parts into one string key:
//!
//! ```text
//! <kind>;<hierarchy>/<tag1>/<tag2>/...
//! ```
//!
//! - `kind` is an optional category prefix, e.g. `file` for units that belong
//!   to a source file.
//! - `hierarchy` is a `::`-joined path that grows by one segment per nested
//!   function definition.
//! - `tags` mark special roles such as the module's entry unit. They behave
//!   as an ordered set: appending skips tags already present, removal drops
//!   the first match and keeps the rest in order.
//!
//! The string form is the one written into the container and referenced by
//! `LoadFunction`, so [`join`] must be the exact inverse of [`split`] for any
//! value without `;` or `/` in the kind or hierarchy and without `/` in tags.

use std::{convert::Infallible, fmt, str::FromStr};

use smallvec::SmallVec;

/// Separates the kind prefix from the hierarchy. Only the first one counts.
pub const KIND_SEPARATOR: char = ';';
/// Starts the tag list; every further occurrence starts a new tag.
pub const TAG_SEPARATOR: char = '/';
/// Joins hierarchy segments.
pub const SEGMENT_SEPARATOR: &str = "::";

/// Parsed form of a qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualName {
    kind: Option<String>,
    hierarchy: String,
    tags: SmallVec<[String; 2]>,
}

impl QualName {
    /// Creates a name with no tags.
    #[must_use]
    pub fn new(kind: Option<&str>, hierarchy: impl Into<String>) -> Self {
        Self {
            kind: kind.map(str::to_owned),
            hierarchy: hierarchy.into(),
            tags: SmallVec::new(),
        }
    }

    /// Parses the string form. Every string is accepted.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let (head, tags) = match name.split_once(TAG_SEPARATOR) {
            Some((head, tags)) => (head, tags.split(TAG_SEPARATOR).map(str::to_owned).collect()),
            None => (name, SmallVec::new()),
        };
        let (kind, hierarchy) = match head.split_once(KIND_SEPARATOR) {
            Some((kind, hierarchy)) => (Some(kind.to_owned()), hierarchy),
            None => (None, head),
        };
        Self {
            kind,
            hierarchy: hierarchy.to_owned(),
            tags,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    #[must_use]
    pub fn hierarchy(&self) -> &str {
        &self.hierarchy
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Iterates the `::`-separated hierarchy segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.hierarchy.split(SEGMENT_SEPARATOR).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Appends `::segment` to the hierarchy, keeping kind and tags.
    #[must_use]
    pub fn with_segment(mut self, segment: &str) -> Self {
        if !self.hierarchy.is_empty() {
            self.hierarchy.push_str(SEGMENT_SEPARATOR);
        }
        self.hierarchy.push_str(segment);
        self
    }

    /// Appends `tag` unless it is already present.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_owned());
        }
        self
    }

    /// Removes the first occurrence of `tag`; the remaining tags keep their order.
    #[must_use]
    pub fn without_tag(mut self, tag: &str) -> Self {
        if let Some(index) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(index);
        }
        self
    }

    /// Breaks the name into its owned parts.
    #[must_use]
    pub fn into_parts(self) -> (Option<String>, String, Vec<String>) {
        (self.kind, self.hierarchy, self.tags.into_vec())
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = &self.kind {
            write!(f, "{kind}{KIND_SEPARATOR}")?;
        }
        f.write_str(&self.hierarchy)?;
        for tag in &self.tags {
            write!(f, "{TAG_SEPARATOR}{tag}")?;
        }
        Ok(())
    }
}

impl FromStr for QualName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Splits a qualified name into `(kind, hierarchy, tags)`.
#[must_use]
pub fn split(name: &str) -> (Option<String>, String, Vec<String>) {
    QualName::parse(name).into_parts()
}

/// Builds the string form from its parts. Inverse of [`split`].
#[must_use]
pub fn join<S: AsRef<str>>(kind: Option<&str>, hierarchy: &str, tags: &[S]) -> String {
    let mut name = QualName::new(kind, hierarchy);
    name.tags = tags.iter().map(|t| t.as_ref().to_owned()).collect();
    name.to_string()
}

/// Appends `::segment` to the hierarchy part of `name`.
#[must_use]
pub fn append_segment(name: &str, segment: &str) -> String {
    QualName::parse(name).with_segment(segment).to_string()
}

/// Removes the first `tag` from `name`.
#[must_use]
pub fn remove_tag(name: &str, tag: &str) -> String {
    QualName::parse(name).without_tag(tag).to_string()
}

/// Appends `tag` to `name` unless it is already present.
#[must_use]
pub fn add_tag(name: &str, tag: &str) -> String {
    QualName::parse(name).with_tag(tag).to_string()
}
