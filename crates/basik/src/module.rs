//! Module assembly and the `.bsk` container.
//!
//! ```text
//! u32 object_count
//! object_count x { u64 object_length ; qualified_name '\0' unit_payload }
//! ```
//!
//! All integers are little-endian. `object_length` counts the name, its
//! terminator and the payload.

use std::{io, path::Path};

use indexmap::IndexSet;

use crate::{
    error::CompileError,
    expressions::Node,
    options::CompileOptions,
    program::Program,
    qualname::QualName,
    tracer::CompileTracer,
};

/// One encoded unit: its qualified name and `header + bytecode` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    name: String,
    payload: Vec<u8>,
}

impl CompiledUnit {
    pub(crate) fn new(name: String, payload: Vec<u8>) -> Self {
        Self { name, payload }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Length of the container object: name, terminator and payload.
    #[must_use]
    pub fn object_len(&self) -> usize {
        self.name.len() + 1 + self.payload.len()
    }
}

/// All units of one compiled source file, entry unit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    units: Vec<CompiledUnit>,
}

impl CompiledModule {
    #[must_use]
    pub fn units(&self) -> &[CompiledUnit] {
        &self.units
    }

    /// Looks up a unit by qualified name.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&CompiledUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// The module body's unit.
    #[must_use]
    pub fn entry(&self) -> Option<&CompiledUnit> {
        self.units.first()
    }

    /// Serializes the container.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = 4 + self.units.iter().map(|u| 8 + u.object_len()).sum::<usize>();
        let mut out = Vec::with_capacity(size);
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    /// Writes the container to `writer`.
    pub fn write_to(&self, writer: &mut impl io::Write) -> io::Result<()> {
        let count = u32::try_from(self.units.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many units for one container"))?;
        writer.write_all(&count.to_le_bytes())?;
        for unit in &self.units {
            writer.write_all(&(unit.object_len() as u64).to_le_bytes())?;
            writer.write_all(unit.name.as_bytes())?;
            writer.write_all(&[0])?;
            writer.write_all(&unit.payload)?;
        }
        Ok(())
    }
}

/// Qualified name of the module body: `<kind>;<file name>/<entry tag>`.
#[must_use]
pub fn root_name(path: &str, options: &CompileOptions) -> String {
    let file_name = Path::new(path)
        .file_name()
        .map_or_else(|| path.to_owned(), |name| name.to_string_lossy().into_owned());
    QualName::new(options.unit_kind.as_deref(), file_name)
        .with_tag(&options.entry_tag)
        .to_string()
}

/// Compiles an already parsed module body.
///
/// `path` names the source in the root qualified name and in error locations.
pub fn compile_module(
    nodes: &[Node],
    path: &str,
    options: &CompileOptions,
    tracer: &mut impl CompileTracer,
) -> Result<CompiledModule, CompileError> {
    let mut globals = IndexSet::new();
    let mut program = Program::new(root_name(path, options), path, options, &mut globals, tracer);
    program.compile_block(nodes)?;
    let units = program.finish()?;
    Ok(CompiledModule { units })
}
