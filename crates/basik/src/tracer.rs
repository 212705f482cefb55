//! Compilation tracing.
//!
//! The compiler reports key events (unit boundaries, instruction encoding,
//! label placement and jump patching) through the [`CompileTracer`] trait.
//! Lowering and encoding are generic over the tracer, so [`NoopTracer`]
//! compiles away entirely via monomorphization.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | No-op (library default) |
//! | [`StderrTracer`] | Human-readable compilation log to stderr |
//! | [`RecordingTracer`] | Collects every event, mainly for tests |
//!
//! ```ignore
//! let mut tracer = RecordingTracer::new();
//! let module = compile_source_traced(source, "main.py", &CompileOptions::default(), &mut tracer)?;
//! for event in tracer.events() { /* ... */ }
//! ```

use crate::bytecode::{LabelId, Opcode};

/// Trace event emitted during compilation.
///
/// Used by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Lowering of a unit body started.
    UnitStart {
        name: String,
        /// Number of enclosing units (0 for the module body).
        depth: usize,
    },
    /// An instruction was written at `offset` of the unit's bytecode.
    Instruction { offset: usize, opcode: Opcode },
    /// A label marker was reached while encoding.
    LabelPlaced { label: LabelId, address: u64 },
    /// A jump operand at `offset` was overwritten with `address`.
    Patch { label: LabelId, offset: usize, address: u64 },
    /// A nested unit was routed into its parent's output.
    ChildUnit { parent: String, child: String },
    /// A unit payload is complete.
    UnitFinished { name: String, payload_len: usize },
}

/// Trait for compilation tracing.
///
/// All methods have default no-op implementations; implementations only
/// override the hooks they care about.
pub trait CompileTracer: std::fmt::Debug {
    /// Called before a unit body is lowered.
    #[inline(always)]
    fn on_unit_start(&mut self, _name: &str, _depth: usize) {}

    /// Called for every real instruction as it is encoded.
    #[inline(always)]
    fn on_instruction(&mut self, _offset: usize, _opcode: Opcode) {}

    /// Called when a label's address becomes known.
    #[inline(always)]
    fn on_label_placed(&mut self, _label: LabelId, _address: u64) {}

    /// Called when a jump placeholder is patched.
    #[inline(always)]
    fn on_patch(&mut self, _label: LabelId, _offset: usize, _address: u64) {}

    /// Called when a child's units are attached to the parent's output.
    #[inline(always)]
    fn on_child_unit(&mut self, _parent: &str, _child: &str) {}

    /// Called once the unit payload (header plus bytecode) is complete.
    #[inline(always)]
    fn on_unit_finished(&mut self, _name: &str, _payload_len: usize) {}
}

impl<T: CompileTracer + ?Sized> CompileTracer for &mut T {
    fn on_unit_start(&mut self, name: &str, depth: usize) {
        (**self).on_unit_start(name, depth);
    }

    fn on_instruction(&mut self, offset: usize, opcode: Opcode) {
        (**self).on_instruction(offset, opcode);
    }

    fn on_label_placed(&mut self, label: LabelId, address: u64) {
        (**self).on_label_placed(label, address);
    }

    fn on_patch(&mut self, label: LabelId, offset: usize, address: u64) {
        (**self).on_patch(label, offset, address);
    }

    fn on_child_unit(&mut self, parent: &str, child: &str) {
        (**self).on_child_unit(parent, child);
    }

    fn on_unit_finished(&mut self, name: &str, payload_len: usize) {
        (**self).on_unit_finished(name, payload_len);
    }
}

// ============================================================================
// NoopTracer
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl CompileTracer for NoopTracer {}

// ============================================================================
// StderrTracer
// ============================================================================

/// Tracer that prints a human-readable compilation log to stderr.
///
/// Output format:
/// ```text
/// === unit file;main.py/entry (depth 0)
/// [    0] LoadGlobal
///   L0 = 27
///   patch [   10] L0 -> 27
/// === done file;main.py/entry (54 bytes)
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Skip per-instruction lines and only log units and labels.
    quiet_instructions: bool,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer that only logs unit boundaries, labels and patches.
    #[must_use]
    pub fn units_only() -> Self {
        Self {
            quiet_instructions: true,
        }
    }
}

impl CompileTracer for StderrTracer {
    fn on_unit_start(&mut self, name: &str, depth: usize) {
        eprintln!("=== unit {name} (depth {depth})");
    }

    #[inline]
    fn on_instruction(&mut self, offset: usize, opcode: Opcode) {
        if !self.quiet_instructions {
            eprintln!("[{offset:>5}] {opcode}");
        }
    }

    fn on_label_placed(&mut self, label: LabelId, address: u64) {
        eprintln!("  {label} = {address}");
    }

    fn on_patch(&mut self, label: LabelId, offset: usize, address: u64) {
        eprintln!("  patch [{offset:>5}] {label} -> {address}");
    }

    fn on_child_unit(&mut self, parent: &str, child: &str) {
        eprintln!("  +++ {parent} owns {child}");
    }

    fn on_unit_finished(&mut self, name: &str, payload_len: usize) {
        eprintln!("=== done {name} ({payload_len} bytes)");
    }
}

// ============================================================================
// RecordingTracer
// ============================================================================

/// Tracer that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the tracer and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl CompileTracer for RecordingTracer {
    fn on_unit_start(&mut self, name: &str, depth: usize) {
        self.events.push(TraceEvent::UnitStart {
            name: name.to_owned(),
            depth,
        });
    }

    fn on_instruction(&mut self, offset: usize, opcode: Opcode) {
        self.events.push(TraceEvent::Instruction { offset, opcode });
    }

    fn on_label_placed(&mut self, label: LabelId, address: u64) {
        self.events.push(TraceEvent::LabelPlaced { label, address });
    }

    fn on_patch(&mut self, label: LabelId, offset: usize, address: u64) {
        self.events.push(TraceEvent::Patch { label, offset, address });
    }

    fn on_child_unit(&mut self, parent: &str, child: &str) {
        self.events.push(TraceEvent::ChildUnit {
            parent: parent.to_owned(),
            child: child.to_owned(),
        });
    }

    fn on_unit_finished(&mut self, name: &str, payload_len: usize) {
        self.events.push(TraceEvent::UnitFinished {
            name: name.to_owned(),
            payload_len,
        });
    }
}
