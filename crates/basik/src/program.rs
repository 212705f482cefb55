//! Lowering of one function or module body into Basik instructions.
//!
//! A [`Program`] walks a body once and appends to its instruction stream.
//! Jumps target labels from the Program's own [`LabelArena`]; addresses are
//! only assigned when the finished Program is encoded.
//!
//! Nested function definitions are lowered depth-first: the child body is
//! lowered and encoded to completion in a fresh Program sharing the module's
//! global set, and its units are kept aside. The parent emits an
//! `EmitChildUnit` marker at the definition point so the encoder can put the
//! child units right after the parent unit, in definition order.

use std::borrow::Cow;

use indexmap::IndexSet;

use crate::{
    bytecode::{
        Constant, Instr, JumpTarget, LabelArena, LabelId, Op, PoolEntry,
        encoder::{UnitSource, encode_unit},
    },
    error::{CompileError, CompileErrorKind, SourceLocation},
    expressions::{CmpOperator, Expr, ExprLoc, FunctionDef, Literal, Node, Operator, UnaryOperator},
    module::CompiledUnit,
    options::{CompileOptions, IntWidth},
    parse::CodeRange,
    qualname::QualName,
    scope::Scope,
    tracer::CompileTracer,
};

/// Lowering state of one compilation unit.
///
/// Created per body, populated by one lowering pass and consumed by
/// [`Program::finish`].
#[derive(Debug)]
pub struct Program<'a, Tr: CompileTracer> {
    /// Qualified name of the unit.
    name: String,
    /// Source path used in error locations.
    filename: &'a str,
    options: &'a CompileOptions,
    /// Number of enclosing units.
    depth: usize,
    /// String constants; the index is the `PushString` operand.
    constants: Vec<PoolEntry>,
    scope: Scope<'a>,
    instructions: Vec<Instr>,
    labels: LabelArena,
    /// Units of nested definitions, indexed by `EmitChildUnit` operand.
    children: Vec<Vec<CompiledUnit>>,
    tracer: &'a mut Tr,
}

impl<'a, Tr: CompileTracer> Program<'a, Tr> {
    /// Creates a top-level Program.
    pub fn new(
        name: impl Into<String>,
        filename: &'a str,
        options: &'a CompileOptions,
        globals: &'a mut IndexSet<String>,
        tracer: &'a mut Tr,
    ) -> Self {
        Self::with_depth(name.into(), filename, options, globals, tracer, 0)
    }

    fn with_depth(
        name: String,
        filename: &'a str,
        options: &'a CompileOptions,
        globals: &'a mut IndexSet<String>,
        tracer: &'a mut Tr,
        depth: usize,
    ) -> Self {
        tracer.on_unit_start(&name, depth);
        Self {
            name,
            filename,
            options,
            depth,
            constants: Vec::new(),
            scope: Scope::new(globals),
            instructions: Vec::new(),
            labels: LabelArena::new(),
            children: Vec::new(),
            tracer,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instructions emitted so far, markers included.
    #[must_use]
    pub fn instructions(&self) -> &[Instr] {
        &self.instructions
    }

    #[must_use]
    pub fn constants(&self) -> &[PoolEntry] {
        &self.constants
    }

    /// Registers the parameters as slots and emits the argument prologue.
    ///
    /// Arguments arrive as one list. `ListExpand` pushes its elements, so the
    /// last parameter is on top and is stored first.
    pub fn compile_params<'n>(&mut self, params: impl IntoIterator<Item = &'n str>) {
        let slots: Vec<u32> = params.into_iter().map(|p| self.scope.declare_local(p)).collect();
        self.emit(Op::ListExpand);
        for slot in slots.into_iter().rev() {
            self.emit(Op::StoreSimple(slot));
        }
    }

    /// Lowers a sequence of statements.
    pub fn compile_block(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        for node in nodes {
            self.compile_stmt(node)?;
        }
        Ok(())
    }

    /// Appends the implicit `return None` when needed and encodes the unit.
    ///
    /// Returns this unit followed by all nested units.
    pub fn finish(mut self) -> Result<Vec<CompiledUnit>, CompileError> {
        if !matches!(self.instructions.last(), Some(Instr::Op(Op::Return))) {
            self.emit(Op::PushNull);
            self.emit(Op::Return);
        }
        let Self {
            name,
            filename,
            constants,
            scope,
            instructions,
            labels,
            children,
            tracer,
            ..
        } = self;
        let variables = scope.into_locals();
        let source = UnitSource {
            name: &name,
            filename,
            constants: &constants,
            variables: &variables,
            instructions: &instructions,
            labels: &labels,
        };
        encode_unit(&source, children, tracer)
    }

    // ========================================================================
    // Statement Compilation
    // ========================================================================

    fn compile_stmt(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Pass => {}
            // The value stays on the stack; the VM does not expect a pop here.
            Node::Expr(expr) => self.compile_expr(expr)?,
            Node::Return { value, .. } => {
                match value {
                    Some(value) => self.compile_expr(value)?,
                    None => self.emit(Op::PushNull),
                }
                self.emit(Op::Return);
            }
            Node::Assign {
                targets,
                value,
                position,
            } => self.compile_assign(targets, value, *position)?,
            Node::If {
                test,
                body,
                or_else,
                position,
            } => self.compile_if(test, body, or_else, *position)?,
            Node::FunctionDef(def) => self.compile_function_def(def)?,
            Node::Global { names, .. } => {
                for name in names {
                    self.scope.declare_global(name);
                }
            }
            Node::Unsupported { kind, position } => {
                return Err(self.error(
                    CompileErrorKind::UnknownNodeKind,
                    format!("unsupported statement `{kind}`"),
                    *position,
                ));
            }
        }
        Ok(())
    }

    fn compile_assign(&mut self, targets: &[ExprLoc], value: &ExprLoc, position: CodeRange) -> Result<(), CompileError> {
        let name = match targets {
            [
                ExprLoc {
                    expr: Expr::Name(ident), ..
                },
            ] => &ident.name,
            [target] => {
                return Err(self.error(
                    CompileErrorKind::InvalidAssignmentTarget,
                    "assignment target must be a plain name",
                    target.position,
                ));
            }
            _ => {
                return Err(self.error(
                    CompileErrorKind::InvalidAssignmentTarget,
                    format!("expected exactly one assignment target, got {}", targets.len()),
                    position,
                ));
            }
        };
        self.compile_expr(value)?;
        let store = self.scope.store(name);
        self.emit(store);
        Ok(())
    }

    /// Lowers `if test: body else: or_else`.
    ///
    /// ```text
    ///     <test>
    ///     JumpIfNot else
    ///     <body>
    ///     Jump end
    /// else:
    ///     <or_else>
    /// end:
    /// ```
    fn compile_if(
        &mut self,
        test: &ExprLoc,
        body: &[Node],
        or_else: &[Node],
        position: CodeRange,
    ) -> Result<(), CompileError> {
        let end = self.labels.allocate(position);
        let else_ = self.labels.allocate(position);

        self.compile_expr(test)?;
        self.emit(Op::JumpIfNot(JumpTarget::Label(else_)));
        self.compile_block(body)?;
        self.emit(Op::Jump(JumpTarget::Label(end)));
        self.place_label(else_);
        self.compile_block(or_else)?;
        self.place_label(end);
        Ok(())
    }

    fn compile_function_def(&mut self, def: &FunctionDef) -> Result<(), CompileError> {
        if let Some((what, position)) = def.unsupported {
            return Err(self.error(
                CompileErrorKind::UnknownNodeKind,
                format!("unsupported construct: {what}"),
                position,
            ));
        }
        let simple_name = def.name.name.as_str();
        // Registered before the body is lowered so recursive calls resolve as globals.
        self.scope.declare_global(simple_name);

        let qualified = QualName::parse(&self.name)
            .without_tag(&self.options.entry_tag)
            .with_segment(simple_name)
            .to_string();

        let mut child = Program::with_depth(
            qualified.clone(),
            self.filename,
            self.options,
            self.scope.globals_mut(),
            &mut *self.tracer,
            self.depth + 1,
        );
        child.compile_params(def.params.iter().map(|p| p.name.as_str()));
        child.compile_block(&def.body)?;
        let units = child.finish()?;

        let index = self.children.len();
        self.children.push(units);
        self.instructions.push(Instr::EmitChildUnit(index));
        self.emit(Op::LoadFunction(qualified));
        self.emit(Op::StoreGlobal(simple_name.to_owned()));
        Ok(())
    }

    // ========================================================================
    // Expression Compilation
    // ========================================================================

    /// Lowers an expression, leaving its value on the stack.
    fn compile_expr(&mut self, expr_loc: &ExprLoc) -> Result<(), CompileError> {
        let position = expr_loc.position;
        match &expr_loc.expr {
            Expr::Literal(literal) => self.compile_literal(literal, position)?,
            Expr::Name(ident) => {
                let load = self.scope.load(&ident.name);
                self.emit(load);
            }
            Expr::Call { callable, args } => {
                self.compile_expr(callable)?;
                self.compile_list(args)?;
                self.emit(Op::Call);
            }
            Expr::List(elements) => self.compile_list(elements)?,
            Expr::Op { left, op, right } => {
                let op = binary_op(*op).ok_or_else(|| {
                    self.error(
                        CompileErrorKind::UnsupportedBinaryOperator,
                        format!("unsupported binary operator `{op}`"),
                        position,
                    )
                })?;
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(op);
            }
            Expr::Unary {
                op: UnaryOperator::Neg,
                operand,
            } => self.compile_negate(operand, position)?,
            Expr::Unary { op, .. } => {
                return Err(self.error(
                    CompileErrorKind::UnsupportedUnaryOperator,
                    format!("unsupported unary operator `{op}`"),
                    position,
                ));
            }
            Expr::Compare {
                left,
                ops,
                comparators,
            } => match (ops.as_slice(), comparators.as_slice()) {
                ([CmpOperator::Eq], [right]) => {
                    self.compile_expr(left)?;
                    self.compile_expr(right)?;
                    self.emit(Op::Equals);
                }
                ([op], _) => {
                    return Err(self.error(
                        CompileErrorKind::UnsupportedComparison,
                        format!("unsupported comparison operator `{op}`"),
                        position,
                    ));
                }
                _ => {
                    return Err(self.error(
                        CompileErrorKind::UnsupportedComparison,
                        "chained comparisons are not supported",
                        position,
                    ));
                }
            },
            Expr::Unsupported(kind) => {
                return Err(self.error(
                    CompileErrorKind::UnknownNodeKind,
                    format!("unsupported expression `{kind}`"),
                    position,
                ));
            }
        }
        Ok(())
    }

    /// `ListBegin`, each element, `ListEnd`.
    fn compile_list(&mut self, elements: &[ExprLoc]) -> Result<(), CompileError> {
        self.emit(Op::ListBegin);
        for element in elements {
            self.compile_expr(element)?;
        }
        self.emit(Op::ListEnd);
        Ok(())
    }

    /// Integer literals are negated at compile time. Anything else becomes
    /// `0 - operand` since the VM has no negate instruction.
    fn compile_negate(&mut self, operand: &ExprLoc, position: CodeRange) -> Result<(), CompileError> {
        match &operand.expr {
            Expr::Literal(Literal::Int(value)) => match value.checked_neg() {
                Some(negated) => self.push_int(negated),
                None => {
                    return Err(self.error(
                        CompileErrorKind::UnsupportedConstantKind,
                        format!("integer literal `-{value}` does not fit in 64 bits"),
                        position,
                    ));
                }
            },
            // `-9223372036854775808` is only representable after negation
            Expr::Literal(Literal::LongInt(digits)) => match negate_long_int(digits) {
                Some(negated) => self.push_int(negated),
                None => {
                    return Err(self.error(
                        CompileErrorKind::UnsupportedConstantKind,
                        format!("integer literal `-{digits}` does not fit in 64 bits"),
                        position,
                    ));
                }
            },
            _ => {
                self.push_int(0);
                self.compile_expr(operand)?;
                self.emit(Op::Sub);
            }
        }
        Ok(())
    }

    fn compile_literal(&mut self, literal: &Literal, position: CodeRange) -> Result<(), CompileError> {
        match literal {
            // The VM reads pool strings up to the first NUL
            Literal::Str(s) if s.contains('\0') => {
                return Err(self.error(
                    CompileErrorKind::UnsupportedConstantKind,
                    "string constant contains a NUL character",
                    position,
                ));
            }
            Literal::Str(s) => {
                let index = self.add_constant(Constant::Str(s.clone()), position);
                self.emit(Op::PushString(index));
            }
            Literal::Int(value) => self.push_int(*value),
            Literal::None => self.emit(Op::PushNull),
            Literal::LongInt(digits) => {
                return Err(self.error(
                    CompileErrorKind::UnsupportedConstantKind,
                    format!("integer literal `{digits}` does not fit in 64 bits"),
                    position,
                ));
            }
            other => {
                return Err(self.error(
                    CompileErrorKind::UnsupportedConstantKind,
                    format!("unsupported constant of type `{}`", other.type_name()),
                    position,
                ));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Emission Helpers
    // ========================================================================

    fn emit(&mut self, op: Op) {
        self.instructions.push(Instr::Op(op));
    }

    fn place_label(&mut self, label: LabelId) {
        self.instructions.push(Instr::Label(label));
    }

    fn push_int(&mut self, value: i64) {
        let op = match self.options.int_width {
            IntWidth::Fixed64 => Op::PushI64(value),
            IntWidth::Narrowest => {
                if let Ok(v) = i16::try_from(value) {
                    Op::PushI16(v)
                } else if let Ok(v) = i32::try_from(value) {
                    Op::PushI32(v)
                } else {
                    Op::PushI64(value)
                }
            }
        };
        self.emit(op);
    }

    /// Appends to the constant pool and returns the new index. Equal values are not merged.
    pub fn add_constant(&mut self, value: Constant, position: CodeRange) -> u32 {
        let index = u32::try_from(self.constants.len()).unwrap_or(u32::MAX);
        self.constants.push(PoolEntry { value, position });
        index
    }

    fn error(&self, kind: CompileErrorKind, msg: impl Into<Cow<'static, str>>, position: CodeRange) -> CompileError {
        CompileError::new(kind, msg, SourceLocation::new(self.filename, position.start()))
    }
}

fn binary_op(op: Operator) -> Option<Op> {
    match op {
        Operator::Add => Some(Op::Add),
        Operator::Sub => Some(Op::Sub),
        Operator::Mult => Some(Op::Mul),
        Operator::Div => Some(Op::Div),
        _ => None,
    }
}

/// Parses the negation of a decimal literal that overflowed `i64`.
fn negate_long_int(digits: &str) -> Option<i64> {
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    format!("-{digits}").parse().ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        parse::parse,
        tracer::{NoopTracer, RecordingTracer, TraceEvent},
    };

    const ROOT: &str = "file;t.py/entry";

    fn lower_with(code: &str, options: &CompileOptions) -> Result<Vec<Instr>, CompileError> {
        let nodes = parse(code, "t.py", options.max_nesting_depth)?;
        let mut globals = IndexSet::new();
        let mut tracer = NoopTracer;
        let mut program = Program::new(ROOT, "t.py", options, &mut globals, &mut tracer);
        program.compile_block(&nodes)?;
        Ok(program.instructions().to_vec())
    }

    fn lower(code: &str) -> Vec<Instr> {
        lower_with(code, &CompileOptions::default()).unwrap()
    }

    fn ops(code: &str) -> Vec<Op> {
        lower(code)
            .into_iter()
            .filter_map(|i| match i {
                Instr::Op(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    fn label(n: usize) -> LabelId {
        LabelId::new(n)
    }

    #[test]
    fn call_wraps_arguments_in_list() {
        assert_eq!(
            ops("print('hi', x)"),
            vec![
                Op::LoadDynamic("print".to_owned()),
                Op::ListBegin,
                Op::PushString(0),
                Op::LoadDynamic("x".to_owned()),
                Op::ListEnd,
                Op::Call,
            ]
        );
    }

    #[test]
    fn if_else_shape() {
        assert_eq!(
            lower("if x:\n    y = 1\nelse:\n    y = 2\n"),
            vec![
                Instr::Op(Op::LoadDynamic("x".to_owned())),
                Instr::Op(Op::JumpIfNot(JumpTarget::Label(label(1)))),
                Instr::Op(Op::PushI64(1)),
                Instr::Op(Op::StoreDynamic("y".to_owned())),
                Instr::Op(Op::Jump(JumpTarget::Label(label(0)))),
                Instr::Label(label(1)),
                Instr::Op(Op::PushI64(2)),
                Instr::Op(Op::StoreDynamic("y".to_owned())),
                Instr::Label(label(0)),
            ]
        );
    }

    #[test]
    fn if_without_else_places_both_labels() {
        let instrs = lower("if x:\n    pass\n");
        assert_eq!(
            &instrs[2..],
            &[
                Instr::Op(Op::Jump(JumpTarget::Label(label(0)))),
                Instr::Label(label(1)),
                Instr::Label(label(0)),
            ]
        );
    }

    #[test]
    fn elif_nests_in_else_branch() {
        let instrs = lower("if a:\n    pass\nelif b:\n    pass\n");
        let label_count = instrs.iter().filter(|i| matches!(i, Instr::Label(_))).count();
        assert_eq!(label_count, 4);
        assert_eq!(instrs[3], Instr::Label(label(1)));
        assert_eq!(instrs[4], Instr::Op(Op::LoadDynamic("b".to_owned())));
    }

    #[test]
    fn binary_operators() {
        assert_eq!(
            ops("a + b * 2 - 6 / c"),
            vec![
                Op::LoadDynamic("a".to_owned()),
                Op::LoadDynamic("b".to_owned()),
                Op::PushI64(2),
                Op::Mul,
                Op::Add,
                Op::PushI64(6),
                Op::LoadDynamic("c".to_owned()),
                Op::Div,
                Op::Sub,
            ]
        );
    }

    #[test]
    fn negative_literal_is_one_push() {
        assert_eq!(ops("-5"), vec![Op::PushI64(-5)]);
    }

    #[test]
    fn negative_i64_min_literal() {
        assert_eq!(ops("-9223372036854775808"), vec![Op::PushI64(i64::MIN)]);
    }

    #[test]
    fn negated_name_subtracts_from_zero() {
        assert_eq!(
            ops("-x"),
            vec![Op::PushI64(0), Op::LoadDynamic("x".to_owned()), Op::Sub]
        );
    }

    #[test]
    fn narrow_ints_pick_smallest_width() {
        let options = CompileOptions::default().int_width(IntWidth::Narrowest);
        let instrs = lower_with("[1, -40000, 3000000000]", &options).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instr::Op(Op::ListBegin),
                Instr::Op(Op::PushI16(1)),
                Instr::Op(Op::PushI32(-40000)),
                Instr::Op(Op::PushI64(3_000_000_000)),
                Instr::Op(Op::ListEnd),
            ]
        );
    }

    #[test]
    fn string_constants_are_not_merged() {
        let nodes = parse("a = 'x'\nb = 'x'\n", "t.py", 200).unwrap();
        let mut globals = IndexSet::new();
        let mut tracer = NoopTracer;
        let options = CompileOptions::default();
        let mut program = Program::new(ROOT, "t.py", &options, &mut globals, &mut tracer);
        program.compile_block(&nodes).unwrap();
        assert_eq!(program.constants().len(), 2);
        assert_eq!(program.instructions()[2], Instr::Op(Op::PushString(1)));
    }

    #[test]
    fn global_declaration_switches_to_global_ops() {
        assert_eq!(
            ops("x = 1\nglobal x\nx = 2\n"),
            vec![
                Op::PushI64(1),
                Op::StoreDynamic("x".to_owned()),
                Op::PushI64(2),
                Op::StoreGlobal("x".to_owned()),
            ]
        );
    }

    #[test]
    fn function_definition_emits_marker_and_store() {
        assert_eq!(
            lower("def f(a, b):\n    return b\n"),
            vec![
                Instr::EmitChildUnit(0),
                Instr::Op(Op::LoadFunction("file;t.py::f".to_owned())),
                Instr::Op(Op::StoreGlobal("f".to_owned())),
            ]
        );
    }

    #[test]
    fn function_prologue_and_parameter_slots() {
        let nodes = parse("def f(a, b):\n    return b\n", "t.py", 200).unwrap();
        let Node::FunctionDef(def) = &nodes[0] else {
            panic!("expected function definition");
        };
        let mut globals = IndexSet::new();
        let mut tracer = NoopTracer;
        let options = CompileOptions::default();
        let mut program = Program::new("file;t.py::f", "t.py", &options, &mut globals, &mut tracer);
        program.compile_params(def.params.iter().map(|p| p.name.as_str()));
        program.compile_block(&def.body).unwrap();
        assert_eq!(
            program.instructions(),
            &[
                Instr::Op(Op::ListExpand),
                Instr::Op(Op::StoreSimple(1)),
                Instr::Op(Op::StoreSimple(0)),
                Instr::Op(Op::LoadSimple(1)),
                Instr::Op(Op::Return),
            ]
        );
    }

    #[test]
    fn recursive_call_resolves_to_global() {
        let options = CompileOptions::default();
        let nodes = parse("def f(n):\n    return f(n)\n", "t.py", 200).unwrap();
        let mut globals = IndexSet::new();
        let mut tracer = NoopTracer;
        let mut program = Program::new(ROOT, "t.py", &options, &mut globals, &mut tracer);
        program.compile_block(&nodes).unwrap();
        let units = program.finish().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].name(), "file;t.py::f");
        assert!(globals.contains("f"));
    }

    #[test]
    fn implicit_return_is_appended_once() {
        let options = CompileOptions::default();
        let mut globals = IndexSet::new();
        let mut tracer = RecordingTracer::new();
        let nodes = parse("return 1\n", "t.py", 200).unwrap();
        let mut program = Program::new(ROOT, "t.py", &options, &mut globals, &mut tracer);
        program.compile_block(&nodes).unwrap();
        program.finish().unwrap();
        let opcodes: Vec<_> = tracer
            .events()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Instruction { opcode, .. } => Some(*opcode),
                _ => None,
            })
            .collect();
        assert_eq!(
            opcodes,
            vec![crate::bytecode::Opcode::PushI64, crate::bytecode::Opcode::Return]
        );
    }

    #[test]
    fn trailing_label_still_gets_implicit_return() {
        let options = CompileOptions::default();
        let mut globals = IndexSet::new();
        let mut tracer = RecordingTracer::new();
        let nodes = parse("if x:\n    return 1\n", "t.py", 200).unwrap();
        let mut program = Program::new(ROOT, "t.py", &options, &mut globals, &mut tracer);
        program.compile_block(&nodes).unwrap();
        program.finish().unwrap();
        let last = tracer
            .events()
            .iter()
            .rev()
            .find_map(|e| match e {
                TraceEvent::Instruction { opcode, .. } => Some(*opcode),
                _ => None,
            });
        assert_eq!(last, Some(crate::bytecode::Opcode::Return));
        let count = tracer
            .events()
            .iter()
            .filter(|e| matches!(e, TraceEvent::Instruction { opcode: crate::bytecode::Opcode::PushNull, .. }))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn error_kinds() {
        let cases = [
            ("a % b", CompileErrorKind::UnsupportedBinaryOperator),
            ("not a", CompileErrorKind::UnsupportedUnaryOperator),
            ("a != b", CompileErrorKind::UnsupportedComparison),
            ("a == b == c", CompileErrorKind::UnsupportedComparison),
            ("1.5", CompileErrorKind::UnsupportedConstantKind),
            ("True", CompileErrorKind::UnsupportedConstantKind),
            ("99999999999999999999", CompileErrorKind::UnsupportedConstantKind),
            ("a = b = 1", CompileErrorKind::InvalidAssignmentTarget),
            ("a.b = 1", CompileErrorKind::InvalidAssignmentTarget),
            ("x = {}", CompileErrorKind::UnknownNodeKind),
            ("while x:\n    pass\n", CompileErrorKind::UnknownNodeKind),
            ("f(a=1)", CompileErrorKind::UnknownNodeKind),
            ("f(*a)", CompileErrorKind::UnknownNodeKind),
        ];
        for (code, kind) in cases {
            let err = lower_with(code, &CompileOptions::default()).unwrap_err();
            assert_eq!(err.kind(), kind, "{code:?}: {err}");
        }
    }

    #[test]
    fn string_with_nul_is_rejected() {
        let err = lower_with("x = 'a\\x00b'\n", &CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UnsupportedConstantKind);
        assert_eq!((err.location().line, err.location().column), (1, 4));
    }

    #[test]
    fn error_location_points_at_node() {
        let err = lower_with("x = 1\ny = 1 < 2\n", &CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UnsupportedComparison);
        assert_eq!(err.location().file, "t.py");
        assert_eq!((err.location().line, err.location().column), (2, 4));
    }
}
