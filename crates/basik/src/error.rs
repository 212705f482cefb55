use std::{borrow::Cow, fmt};

use crate::parse::CodeLoc;

/// Category of a compilation failure.
///
/// Every variant aborts the whole compilation; there is no recovery and no
/// partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum CompileErrorKind {
    /// The source text could not be parsed by the front end.
    Syntax,
    /// A statement or expression kind the compiler has no lowering for.
    UnknownNodeKind,
    /// A binary operator other than `+`, `-`, `*` or `/`.
    UnsupportedBinaryOperator,
    /// A unary operator other than `-`.
    UnsupportedUnaryOperator,
    /// Anything but a single `==`, including chained comparisons.
    UnsupportedComparison,
    /// A literal that is not a string, an `i64` integer or `None`.
    UnsupportedConstantKind,
    /// Assignment without exactly one plain-name target.
    InvalidAssignmentTarget,
    /// A jump references a label that was never placed.
    UnresolvedLabel,
    /// A label was placed more than once.
    DuplicateLabel,
    /// The constant pool holds a value the unit header cannot encode.
    UnsupportedConstantPoolType,
    /// The input tree nests deeper than `CompileOptions::max_nesting_depth`.
    NestingTooDeep,
}

/// Where a compilation error occurred.
///
/// `line` is 1-based and `column` is a 0-based byte offset into the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<String>, loc: CodeLoc) -> Self {
        Self {
            file: file.into(),
            line: loc.line,
            column: loc.column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Error raised while compiling a module.
///
/// Carries the failure category, a human readable cause and the source
/// location of the offending node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    kind: CompileErrorKind,
    message: Cow<'static, str>,
    location: SourceLocation,
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind, message: impl Into<Cow<'static, str>>, location: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CompileErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.location, self.message, self.kind)
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_and_kind() {
        let err = CompileError::new(
            CompileErrorKind::UnsupportedComparison,
            "only `==` is supported",
            SourceLocation::new("main.py", CodeLoc::new(3, 4)),
        );
        assert_eq!(
            err.to_string(),
            "main.py:3:4: only `==` is supported (unsupported-comparison)"
        );
    }
}
