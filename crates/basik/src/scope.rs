//! Name classification for loads and stores.
//!
//! Every name reference resolves, at the moment it is lowered, to one of
//! three storage classes, checked in order:
//!
//! 1. a fixed slot, when the name is in the unit's local variable list;
//! 2. a global, when the name is in the shared global set;
//! 3. a dynamic name lookup performed by the VM at runtime.
//!
//! Only function parameters become slots. The global set is shared by all
//! units of a module and only grows, so a `global` statement or a function
//! definition affects every reference lowered after it.

use indexmap::IndexSet;

use crate::bytecode::Op;

/// Storage class of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameAccess {
    Slot(u32),
    Global,
    Dynamic,
}

/// Variables of one unit plus a borrow of the module-wide global set.
#[derive(Debug)]
pub struct Scope<'g> {
    /// Local variable names; the index is the slot.
    locals: IndexSet<String>,
    globals: &'g mut IndexSet<String>,
}

impl<'g> Scope<'g> {
    pub fn new(globals: &'g mut IndexSet<String>) -> Self {
        Self {
            locals: IndexSet::new(),
            globals,
        }
    }

    /// Registers `name` as a local and returns its slot.
    ///
    /// Registering a name twice returns the existing slot.
    pub fn declare_local(&mut self, name: &str) -> u32 {
        let index = match self.locals.get_index_of(name) {
            Some(index) => index,
            None => self.locals.insert_full(name.to_owned()).0,
        };
        u32::try_from(index).unwrap_or(u32::MAX)
    }

    /// Adds `name` to the shared global set.
    pub fn declare_global(&mut self, name: &str) {
        if !self.globals.contains(name) {
            self.globals.insert(name.to_owned());
        }
    }

    /// Classifies `name` against the current state.
    #[must_use]
    pub fn classify(&self, name: &str) -> NameAccess {
        if let Some(index) = self.locals.get_index_of(name) {
            NameAccess::Slot(u32::try_from(index).unwrap_or(u32::MAX))
        } else if self.globals.contains(name) {
            NameAccess::Global
        } else {
            NameAccess::Dynamic
        }
    }

    /// Returns the instruction that pushes the value of `name`.
    #[must_use]
    pub fn load(&self, name: &str) -> Op {
        match self.classify(name) {
            NameAccess::Slot(slot) => Op::LoadSimple(slot),
            NameAccess::Global => Op::LoadGlobal(name.to_owned()),
            NameAccess::Dynamic => Op::LoadDynamic(name.to_owned()),
        }
    }

    /// Returns the instruction that pops the top of stack into `name`.
    #[must_use]
    pub fn store(&self, name: &str) -> Op {
        match self.classify(name) {
            NameAccess::Slot(slot) => Op::StoreSimple(slot),
            NameAccess::Global => Op::StoreGlobal(name.to_owned()),
            NameAccess::Dynamic => Op::StoreDynamic(name.to_owned()),
        }
    }

    /// Gives access to the shared global set for a nested unit.
    pub fn globals_mut(&mut self) -> &mut IndexSet<String> {
        self.globals
    }

    #[must_use]
    pub fn into_locals(self) -> Vec<String> {
        self.locals.into_iter().collect()
    }
}
