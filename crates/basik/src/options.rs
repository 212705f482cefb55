/// Maximum nesting depth of statements and expressions in the input tree.
///
/// Lower in debug mode to avoid stack overflow (debug builds use more stack
/// space per call frame).
#[cfg(debug_assertions)]
pub const MAX_NESTING_DEPTH: u16 = 35;

/// Maximum nesting depth of statements and expressions in the input tree.
#[cfg(not(debug_assertions))]
pub const MAX_NESTING_DEPTH: u16 = 200;

/// Default kind prefix of the module's qualified name.
pub const DEFAULT_UNIT_KIND: &str = "file";

/// Default tag marking the module's entry unit.
pub const DEFAULT_ENTRY_TAG: &str = "entry";

/// Encoding chosen for integer literals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntWidth {
    /// Every integer is a `PushI64`.
    #[default]
    Fixed64,
    /// The smallest of `PushI16`, `PushI32` and `PushI64` that holds the value.
    Narrowest,
}

/// Configuration for a compilation.
///
/// Use `CompileOptions::default()` for the standard container layout, or
/// adjust it with the builder methods. Every field has a default, so a
/// partial JSON document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Kind prefix of the root qualified name; `None` omits the `kind;` part.
    pub unit_kind: Option<String>,
    /// Tag marking the entry unit. Removed again from nested function names.
    pub entry_tag: String,
    pub int_width: IntWidth,
    /// Nesting limit enforced while converting the syntax tree.
    pub max_nesting_depth: u16,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            unit_kind: Some(DEFAULT_UNIT_KIND.to_owned()),
            entry_tag: DEFAULT_ENTRY_TAG.to_owned(),
            int_width: IntWidth::default(),
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the kind prefix of the root qualified name.
    #[must_use]
    pub fn unit_kind(mut self, kind: Option<&str>) -> Self {
        self.unit_kind = kind.map(str::to_owned);
        self
    }

    /// Sets the entry tag.
    #[must_use]
    pub fn entry_tag(mut self, tag: impl Into<String>) -> Self {
        self.entry_tag = tag.into();
        self
    }

    /// Sets the integer literal encoding.
    #[must_use]
    pub fn int_width(mut self, width: IntWidth) -> Self {
        self.int_width = width;
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn max_nesting_depth(mut self, depth: u16) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
