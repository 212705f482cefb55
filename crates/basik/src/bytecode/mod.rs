//! Basik bytecode representation.
//!
//! # Module Structure
//!
//! - `op` - Opcode numbering, typed instructions and structural markers
//! - `reloc` - Label arena and jump relocation table
//! - `encoder` - Encodes a lowered unit into `header + bytecode`
//! - `disasm` - Decodes a `.bsk` container back into instructions

pub use encoder::{Constant, PoolEntry};
pub use op::{Instr, JumpTarget, LabelId, Op, Opcode};
pub use reloc::{LabelArena, Patch, RelocError, Relocations};

pub mod disasm;
pub(crate) mod encoder;
mod op;
mod reloc;
