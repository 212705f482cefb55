//! Labels and jump relocation.
//!
//! Lowering allocates labels in a [`LabelArena`] and emits jumps that refer
//! to them by [`LabelId`]. Addresses are only known once the unit is laid out,
//! so the encoder writes a zero `u64` placeholder for every label operand,
//! records it in a [`Relocations`] table, and patches all placeholders after
//! the last instruction is written.

use super::op::LabelId;
use crate::parse::CodeRange;

/// Labels allocated while lowering one unit.
///
/// Each label remembers the range of the construct that allocated it, so a
/// label that is never placed can still be reported at a source location.
#[derive(Debug, Clone, Default)]
pub struct LabelArena {
    origins: Vec<CodeRange>,
}

impl LabelArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, unplaced label.
    pub fn allocate(&mut self, origin: CodeRange) -> LabelId {
        let id = LabelId::new(self.origins.len());
        self.origins.push(origin);
        id
    }

    /// Returns the range of the construct that allocated `label`.
    #[must_use]
    pub fn origin(&self, label: LabelId) -> Option<CodeRange> {
        self.origins.get(label.index()).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.origins.len()
    }
}

/// Failure to resolve a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocError {
    /// A jump refers to a label that was never placed.
    Unresolved(LabelId),
    /// A label was placed a second time.
    Duplicate(LabelId),
}

/// A pending jump operand: the `u64` at `offset` must become the label's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    pub label: LabelId,
    pub offset: usize,
}

/// Label placements and pending patches for one unit's bytecode.
#[derive(Debug, Clone, Default)]
pub struct Relocations {
    /// Address of each label, indexed by `LabelId`; `None` until placed.
    placements: Vec<Option<u64>>,
    patches: Vec<Patch>,
}

impl Relocations {
    /// Creates a table sized for every label in `arena`.
    #[must_use]
    pub fn new(arena: &LabelArena) -> Self {
        Self {
            placements: vec![None; arena.len()],
            patches: Vec::new(),
        }
    }

    /// Records `address` as the location of `label`. A label is placed at most once.
    pub fn place(&mut self, label: LabelId, address: u64) -> Result<(), RelocError> {
        let index = label.index();
        if index >= self.placements.len() {
            self.placements.resize(index + 1, None);
        }
        let slot = &mut self.placements[index];
        if slot.is_some() {
            return Err(RelocError::Duplicate(label));
        }
        *slot = Some(address);
        Ok(())
    }

    /// Records a placeholder at `offset` that refers to `label`.
    pub fn reference(&mut self, label: LabelId, offset: usize) {
        self.patches.push(Patch { label, offset });
    }

    #[must_use]
    pub fn address(&self, label: LabelId) -> Option<u64> {
        self.placements.get(label.index()).copied().flatten()
    }

    /// Overwrites every placeholder in `bytecode` with its label's address.
    ///
    /// `on_patch` is called for each applied patch. Fails on the first patch
    /// whose label was never placed; `bytecode` may then be partially patched.
    pub fn apply(
        &self,
        bytecode: &mut [u8],
        mut on_patch: impl FnMut(&Patch, u64),
    ) -> Result<(), RelocError> {
        for patch in &self.patches {
            let address = self.address(patch.label).ok_or(RelocError::Unresolved(patch.label))?;
            let end = patch.offset + size_of::<u64>();
            bytecode[patch.offset..end].copy_from_slice(&address.to_le_bytes());
            on_patch(patch, address);
        }
        Ok(())
    }
}
