//! Unit encoder: turns one lowered Program into `header + bytecode`.
//!
//! The header lists the string constants and the local variable names. The
//! bytecode is the instruction stream with label operands resolved through
//! [`Relocations`]. Child units referenced by `EmitChildUnit` markers are
//! appended after the unit itself, in marker order.

use std::mem;

use super::{
    op::{Instr, JumpTarget, LabelId, Op},
    reloc::{LabelArena, RelocError, Relocations},
};
use crate::{
    error::{CompileError, CompileErrorKind, SourceLocation},
    module::CompiledUnit,
    parse::CodeRange,
    tracer::CompileTracer,
};

/// Value stored in a unit's constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Str(String),
    Int(i64),
}

impl Constant {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Int(_) => "int",
        }
    }
}

/// A constant pool entry with the range of the literal that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    pub value: Constant,
    pub position: CodeRange,
}

/// Everything the encoder needs from a finished Program.
#[derive(Debug)]
pub struct UnitSource<'a> {
    pub name: &'a str,
    pub filename: &'a str,
    pub constants: &'a [PoolEntry],
    pub variables: &'a [String],
    pub instructions: &'a [Instr],
    pub labels: &'a LabelArena,
}

/// Encodes `unit` and returns it followed by its children's units.
///
/// `children[i]` holds the units produced for the `EmitChildUnit(i)` marker.
pub fn encode_unit(
    unit: &UnitSource<'_>,
    mut children: Vec<Vec<CompiledUnit>>,
    tracer: &mut impl CompileTracer,
) -> Result<Vec<CompiledUnit>, CompileError> {
    let mut payload = encode_header(unit)?;
    let mut code = CodeWriter::new(unit.labels);
    let mut descendants = Vec::new();

    for instr in unit.instructions {
        match instr {
            Instr::Op(op) => {
                tracer.on_instruction(code.offset(), op.opcode());
                code.write_op(op);
            }
            Instr::Label(label) => {
                let address = code.offset() as u64;
                code.relocs
                    .place(*label, address)
                    .map_err(|e| reloc_error(unit, e))?;
                tracer.on_label_placed(*label, address);
            }
            Instr::EmitChildUnit(index) => {
                let Some(units) = children.get_mut(*index) else {
                    continue;
                };
                for child in units.iter() {
                    tracer.on_child_unit(unit.name, child.name());
                }
                descendants.append(&mut mem::take(units));
            }
        }
    }

    let CodeWriter { mut bytes, relocs } = code;
    relocs
        .apply(&mut bytes, |patch, address| tracer.on_patch(patch.label, patch.offset, address))
        .map_err(|e| reloc_error(unit, e))?;

    payload.extend_from_slice(&bytes);
    tracer.on_unit_finished(unit.name, payload.len());

    let mut units = Vec::with_capacity(descendants.len() + 1);
    units.push(CompiledUnit::new(unit.name.to_owned(), payload));
    units.append(&mut descendants);
    Ok(units)
}

/// Writes the constant pool and the variable table.
fn encode_header(unit: &UnitSource<'_>) -> Result<Vec<u8>, CompileError> {
    let mut out = Vec::new();

    put_u32(&mut out, count(unit.constants.len()));
    for entry in unit.constants {
        let Constant::Str(s) = &entry.value else {
            return Err(CompileError::new(
                CompileErrorKind::UnsupportedConstantPoolType,
                format!("constant pool cannot hold a value of type `{}`", entry.value.type_name()),
                SourceLocation::new(unit.filename, entry.position.start()),
            ));
        };
        let len = u32::try_from(s.len() + 1).map_err(|_| {
            CompileError::new(
                CompileErrorKind::UnsupportedConstantPoolType,
                "string constant is too long",
                SourceLocation::new(unit.filename, entry.position.start()),
            )
        })?;
        put_u32(&mut out, len);
        put_cstr(&mut out, s);
    }

    put_u32(&mut out, count(unit.variables.len()));
    for name in unit.variables {
        put_cstr(&mut out, name);
    }
    Ok(out)
}

fn reloc_error(unit: &UnitSource<'_>, err: RelocError) -> CompileError {
    let (kind, label, msg) = match err {
        RelocError::Unresolved(label) => (CompileErrorKind::UnresolvedLabel, label, "is never placed"),
        RelocError::Duplicate(label) => (CompileErrorKind::DuplicateLabel, label, "is placed more than once"),
    };
    let origin = unit.labels.origin(label).unwrap_or_default();
    CompileError::new(
        kind,
        format!("jump label {label} in `{}` {msg}", unit.name),
        SourceLocation::new(unit.filename, origin.start()),
    )
}

/// Bytecode buffer plus the relocation table for its label operands.
struct CodeWriter {
    bytes: Vec<u8>,
    relocs: Relocations,
}

impl CodeWriter {
    fn new(labels: &LabelArena) -> Self {
        Self {
            bytes: Vec::new(),
            relocs: Relocations::new(labels),
        }
    }

    fn offset(&self) -> usize {
        self.bytes.len()
    }

    fn write_op(&mut self, op: &Op) {
        self.bytes.push(op.opcode() as u8);
        match op {
            Op::StoreSimple(slot) | Op::LoadSimple(slot) | Op::PushString(slot) => put_u32(&mut self.bytes, *slot),
            Op::StoreDynamic(name)
            | Op::LoadDynamic(name)
            | Op::StoreGlobal(name)
            | Op::LoadGlobal(name)
            | Op::RemoveDynamic(name)
            | Op::LoadFunction(name) => put_cstr(&mut self.bytes, name),
            Op::PushChar(c) => self.bytes.push(*c),
            Op::PushI16(v) => self.bytes.extend_from_slice(&v.to_le_bytes()),
            Op::PushI32(v) => self.bytes.extend_from_slice(&v.to_le_bytes()),
            Op::PushI64(v) => self.bytes.extend_from_slice(&v.to_le_bytes()),
            Op::Jump(target) | Op::JumpIf(target) | Op::JumpIfNot(target) => self.write_target(*target),
            _ => {}
        }
    }

    fn write_target(&mut self, target: JumpTarget) {
        match target {
            JumpTarget::Address(address) => self.bytes.extend_from_slice(&address.to_le_bytes()),
            JumpTarget::Label(label) => self.write_placeholder(label),
        }
    }

    fn write_placeholder(&mut self, label: LabelId) {
        self.relocs.reference(label, self.bytes.len());
        self.bytes.extend_from_slice(&0u64.to_le_bytes());
    }
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_cstr(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
