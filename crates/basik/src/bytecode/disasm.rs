//! Disassembler for `.bsk` containers.
//!
//! Decodes the container written by [`crate::CompiledModule::to_bytes`] back
//! into units, their constant pools, variable tables and instructions. Jump
//! operands come back as [`JumpTarget::Address`].

use std::fmt;

use super::op::{JumpTarget, Op, Opcode};

/// Error decoding a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended while `wanted` more bytes were expected at `offset`.
    UnexpectedEof { offset: usize, wanted: usize },
    /// A string ran to the end of its region without a `\0`.
    MissingTerminator { offset: usize },
    InvalidUtf8 { offset: usize },
    InvalidOpcode { offset: usize, byte: u8 },
    /// A constant's declared length disagrees with its terminator position.
    BadConstantLength { offset: usize, declared: u32 },
    /// Bytes left over after the last object.
    TrailingBytes { offset: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { offset, wanted } => {
                write!(f, "unexpected end of input at byte {offset} (wanted {wanted} more)")
            }
            Self::MissingTerminator { offset } => write!(f, "unterminated string at byte {offset}"),
            Self::InvalidUtf8 { offset } => write!(f, "invalid UTF-8 in string at byte {offset}"),
            Self::InvalidOpcode { offset, byte } => write!(f, "invalid opcode {byte} at byte {offset}"),
            Self::BadConstantLength { offset, declared } => {
                write!(f, "constant at byte {offset} declares length {declared}")
            }
            Self::TrailingBytes { offset } => write!(f, "trailing bytes after last object at byte {offset}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// One decoded unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUnit {
    pub name: String,
    pub constants: Vec<String>,
    pub variables: Vec<String>,
    /// Instructions with their byte offset from the start of the bytecode.
    pub instructions: Vec<(usize, Op)>,
}

impl DecodedUnit {
    /// Returns the instructions without offsets.
    #[must_use]
    pub fn ops(&self) -> Vec<&Op> {
        self.instructions.iter().map(|(_, op)| op).collect()
    }
}

impl fmt::Display for DecodedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "unit {}", self.name)?;
        for (index, constant) in self.constants.iter().enumerate() {
            writeln!(f, "  const #{index} = {constant:?}")?;
        }
        for (slot, name) in self.variables.iter().enumerate() {
            writeln!(f, "  var {slot} = {name}")?;
        }
        for (offset, op) in &self.instructions {
            writeln!(f, "  [{offset:>5}] {op}")?;
        }
        Ok(())
    }
}

/// Decodes a whole container.
pub fn decode_module(bytes: &[u8]) -> Result<Vec<DecodedUnit>, DecodeError> {
    let mut reader = Reader::new(bytes, 0);
    let count = reader.read_u32()?;
    let mut units = Vec::new();
    for _ in 0..count {
        let length = reader.read_u64()?;
        let start = reader.pos;
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        let object = reader.take(length)?;
        units.push(decode_object(object, start)?);
    }
    if !reader.is_at_end() {
        return Err(DecodeError::TrailingBytes { offset: reader.pos });
    }
    Ok(units)
}

/// Renders a text listing of every unit in a container.
pub fn listing(bytes: &[u8]) -> Result<String, DecodeError> {
    let units = decode_module(bytes)?;
    Ok(units.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))
}

/// Decodes `qualified_name \0 payload`; `base` is the object's container offset.
fn decode_object(object: &[u8], base: usize) -> Result<DecodedUnit, DecodeError> {
    let mut reader = Reader::new(object, base);
    let name = reader.read_cstr()?;

    let mut constants = Vec::new();
    for _ in 0..reader.read_u32()? {
        let offset = reader.offset();
        let declared = reader.read_u32()?;
        let value = reader.read_cstr()?;
        if u32::try_from(value.len() + 1).ok() != Some(declared) {
            return Err(DecodeError::BadConstantLength { offset, declared });
        }
        constants.push(value);
    }

    let mut variables = Vec::new();
    for _ in 0..reader.read_u32()? {
        variables.push(reader.read_cstr()?);
    }

    let code = reader.rest();
    let instructions = decode_code(code, base + (object.len() - code.len()))?;
    Ok(DecodedUnit {
        name,
        constants,
        variables,
        instructions,
    })
}

fn decode_code(code: &[u8], base: usize) -> Result<Vec<(usize, Op)>, DecodeError> {
    let mut reader = Reader::new(code, base);
    let mut instructions = Vec::new();
    while !reader.is_at_end() {
        let offset = reader.pos;
        let byte = reader.read_u8()?;
        let opcode = Opcode::from_repr(byte).ok_or(DecodeError::InvalidOpcode {
            offset: reader.base + offset,
            byte,
        })?;
        instructions.push((offset, decode_op(opcode, &mut reader)?));
    }
    Ok(instructions)
}

fn decode_op(opcode: Opcode, reader: &mut Reader<'_>) -> Result<Op, DecodeError> {
    let op = match opcode {
        Opcode::Terminate => Op::Terminate,
        Opcode::StoreSimple => Op::StoreSimple(reader.read_u32()?),
        Opcode::LoadSimple => Op::LoadSimple(reader.read_u32()?),
        Opcode::StoreDynamic => Op::StoreDynamic(reader.read_cstr()?),
        Opcode::LoadDynamic => Op::LoadDynamic(reader.read_cstr()?),
        Opcode::StoreGlobal => Op::StoreGlobal(reader.read_cstr()?),
        Opcode::LoadGlobal => Op::LoadGlobal(reader.read_cstr()?),
        Opcode::PushString => Op::PushString(reader.read_u32()?),
        Opcode::PushChar => Op::PushChar(reader.read_u8()?),
        Opcode::PushI16 => Op::PushI16(i16::from_le_bytes(reader.read_array()?)),
        Opcode::PushI32 => Op::PushI32(i32::from_le_bytes(reader.read_array()?)),
        Opcode::PushI64 => Op::PushI64(i64::from_le_bytes(reader.read_array()?)),
        Opcode::ListBegin => Op::ListBegin,
        Opcode::ListEnd => Op::ListEnd,
        Opcode::ListExpand => Op::ListExpand,
        Opcode::RemoveDynamic => Op::RemoveDynamic(reader.read_cstr()?),
        Opcode::Add => Op::Add,
        Opcode::Sub => Op::Sub,
        Opcode::Div => Op::Div,
        Opcode::Mul => Op::Mul,
        Opcode::Pop => Op::Pop,
        Opcode::Dup => Op::Dup,
        Opcode::Jump => Op::Jump(JumpTarget::Address(reader.read_u64()?)),
        Opcode::JumpIf => Op::JumpIf(JumpTarget::Address(reader.read_u64()?)),
        Opcode::JumpIfNot => Op::JumpIfNot(JumpTarget::Address(reader.read_u64()?)),
        Opcode::Return => Op::Return,
        Opcode::Call => Op::Call,
        Opcode::PushNull => Op::PushNull,
        Opcode::Equals => Op::Equals,
        Opcode::LoadFunction => Op::LoadFunction(reader.read_cstr()?),
    };
    Ok(op)
}

/// Bounds-checked little-endian reader over a byte slice.
///
/// `base` is added to positions in errors so they refer to the whole container.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], base: usize) -> Self {
        Self { bytes, pos: 0, base }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.bytes.len() - self.pos;
        if n > remaining {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset(),
                wanted: n - remaining,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_cstr(&mut self) -> Result<String, DecodeError> {
        let start = self.offset();
        let rest = self.rest();
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::MissingTerminator { offset: start })?;
        let s = std::str::from_utf8(&rest[..len]).map_err(|_| DecodeError::InvalidUtf8 { offset: start })?;
        self.pos += len + 1;
        Ok(s.to_owned())
    }
}
