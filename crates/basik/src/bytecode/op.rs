//! Opcode numbering and the typed instruction stream.
//!
//! [`Opcode`] is the one-byte wire value the Basik VM dispatches on. [`Op`]
//! pairs an opcode with its typed operand, and [`Instr`] adds the structural
//! markers that exist only between lowering and encoding.

use std::fmt;

/// Basik VM opcodes.
///
/// Discriminants are the stable wire encoding and must never be reordered.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::FromRepr, strum::EnumIter)]
pub enum Opcode {
    Terminate = 0,
    StoreSimple = 1,
    LoadSimple = 2,
    StoreDynamic = 3,
    LoadDynamic = 4,
    StoreGlobal = 5,
    LoadGlobal = 6,
    PushString = 7,
    PushChar = 8,
    PushI16 = 9,
    PushI32 = 10,
    PushI64 = 11,
    ListBegin = 12,
    ListEnd = 13,
    ListExpand = 14,
    RemoveDynamic = 15,
    Add = 16,
    Sub = 17,
    Div = 18,
    Mul = 19,
    Pop = 20,
    Dup = 21,
    Jump = 22,
    JumpIf = 23,
    JumpIfNot = 24,
    Return = 25,
    Call = 26,
    PushNull = 27,
    Equals = 28,
    LoadFunction = 29,
}

/// Index of a label in its Program's label arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(u32);

impl LabelId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Destination of a jump: a label resolved at encoding time, or a literal address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    Label(LabelId),
    Address(u64),
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "{label}"),
            Self::Address(addr) => write!(f, "@{addr}"),
        }
    }
}

/// A real VM instruction with its operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Terminate,
    StoreSimple(u32),
    LoadSimple(u32),
    StoreDynamic(String),
    LoadDynamic(String),
    StoreGlobal(String),
    LoadGlobal(String),
    PushString(u32),
    PushChar(u8),
    PushI16(i16),
    PushI32(i32),
    PushI64(i64),
    ListBegin,
    ListEnd,
    ListExpand,
    RemoveDynamic(String),
    Add,
    Sub,
    Div,
    Mul,
    Pop,
    Dup,
    Jump(JumpTarget),
    JumpIf(JumpTarget),
    JumpIfNot(JumpTarget),
    Return,
    Call,
    PushNull,
    Equals,
    LoadFunction(String),
}

impl Op {
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Terminate => Opcode::Terminate,
            Self::StoreSimple(_) => Opcode::StoreSimple,
            Self::LoadSimple(_) => Opcode::LoadSimple,
            Self::StoreDynamic(_) => Opcode::StoreDynamic,
            Self::LoadDynamic(_) => Opcode::LoadDynamic,
            Self::StoreGlobal(_) => Opcode::StoreGlobal,
            Self::LoadGlobal(_) => Opcode::LoadGlobal,
            Self::PushString(_) => Opcode::PushString,
            Self::PushChar(_) => Opcode::PushChar,
            Self::PushI16(_) => Opcode::PushI16,
            Self::PushI32(_) => Opcode::PushI32,
            Self::PushI64(_) => Opcode::PushI64,
            Self::ListBegin => Opcode::ListBegin,
            Self::ListEnd => Opcode::ListEnd,
            Self::ListExpand => Opcode::ListExpand,
            Self::RemoveDynamic(_) => Opcode::RemoveDynamic,
            Self::Add => Opcode::Add,
            Self::Sub => Opcode::Sub,
            Self::Div => Opcode::Div,
            Self::Mul => Opcode::Mul,
            Self::Pop => Opcode::Pop,
            Self::Dup => Opcode::Dup,
            Self::Jump(_) => Opcode::Jump,
            Self::JumpIf(_) => Opcode::JumpIf,
            Self::JumpIfNot(_) => Opcode::JumpIfNot,
            Self::Return => Opcode::Return,
            Self::Call => Opcode::Call,
            Self::PushNull => Opcode::PushNull,
            Self::Equals => Opcode::Equals,
            Self::LoadFunction(_) => Opcode::LoadFunction,
        }
    }

    /// Returns the jump target if this is a jump instruction.
    #[must_use]
    pub fn jump_target(&self) -> Option<JumpTarget> {
        match self {
            Self::Jump(target) | Self::JumpIf(target) | Self::JumpIfNot(target) => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opcode = self.opcode();
        match self {
            Self::StoreSimple(slot) | Self::LoadSimple(slot) => write!(f, "{opcode} {slot}"),
            Self::StoreDynamic(name)
            | Self::LoadDynamic(name)
            | Self::StoreGlobal(name)
            | Self::LoadGlobal(name)
            | Self::RemoveDynamic(name)
            | Self::LoadFunction(name) => write!(f, "{opcode} {name:?}"),
            Self::PushString(index) => write!(f, "{opcode} #{index}"),
            Self::PushChar(c) => write!(f, "{opcode} {c}"),
            Self::PushI16(v) => write!(f, "{opcode} {v}"),
            Self::PushI32(v) => write!(f, "{opcode} {v}"),
            Self::PushI64(v) => write!(f, "{opcode} {v}"),
            Self::Jump(target) | Self::JumpIf(target) | Self::JumpIfNot(target) => write!(f, "{opcode} {target}"),
            _ => write!(f, "{opcode}"),
        }
    }
}

/// Element of a Program's instruction stream.
///
/// `Label` and `EmitChildUnit` are structural markers and produce no bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Op(Op),
    /// Places the label at the current bytecode offset.
    Label(LabelId),
    /// Position of the child unit list at this index in the parent's output.
    EmitChildUnit(usize),
}

impl From<Op> for Instr {
    fn from(op: Op) -> Self {
        Self::Op(op)
    }
}
