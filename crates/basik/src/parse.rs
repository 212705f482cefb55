//! Front end: converts ruff's Python syntax tree into [`crate::expressions`].
//!
//! The conversion is total for well-formed source. Statement and expression
//! kinds without a lowering are kept as `Unsupported` nodes carrying the
//! construct name so that the compiler reports them with the proper error
//! kind, in source order. Only syntax errors and excessive nesting fail here.

use std::{borrow::Cow, fmt};

use ruff_python_ast::{
    self as ast, CmpOp, ElifElseClause, Expr as AstExpr, Number, Operator as AstOperator, Stmt, UnaryOp,
};
use ruff_python_parser::parse_module;
use ruff_text_size::{Ranged, TextRange};

use crate::{
    error::{CompileError, CompileErrorKind, SourceLocation},
    expressions::{CmpOperator, Expr, ExprLoc, FunctionDef, Identifier, Literal, Node, Operator, UnaryOperator},
};

/// Parses `code` and converts it to the compiler's node set.
///
/// `filename` is only used for error locations.
pub fn parse(code: &str, filename: &str, max_nesting_depth: u16) -> Result<Vec<Node>, CompileError> {
    let mut parser = Parser::new(code, filename, max_nesting_depth);
    let parsed = parse_module(code).map_err(|e| parser.error(CompileErrorKind::Syntax, e.to_string(), e.range()))?;
    let module = parsed.into_syntax();
    parser.parse_statements(module.body)
}

/// Converter from ruff nodes to [`Node`]s.
///
/// Keeps the byte offsets of line ends to translate ruff's text ranges into
/// line and column positions.
struct Parser<'a> {
    line_ends: Vec<usize>,
    code: &'a str,
    filename: &'a str,
    /// Remaining nesting depth budget for recursive structures.
    depth_remaining: u16,
}

impl<'a> Parser<'a> {
    fn new(code: &'a str, filename: &'a str, max_nesting_depth: u16) -> Self {
        // Byte offset of each newline, to convert offsets to line and column numbers
        let line_ends = code
            .char_indices()
            .filter_map(|(i, c)| (c == '\n').then_some(i))
            .collect();
        Self {
            line_ends,
            code,
            filename,
            depth_remaining: max_nesting_depth,
        }
    }

    fn parse_statements(&mut self, statements: Vec<Stmt>) -> Result<Vec<Node>, CompileError> {
        statements.into_iter().map(|s| self.parse_statement(s)).collect()
    }

    /// Folds `elif`/`else` clauses into the else branch of nested `If` nodes.
    ///
    /// Every `elif` adds one level to the resulting tree and is charged to the
    /// nesting budget like any other nested construct.
    fn parse_elif_else_clauses(&mut self, clauses: Vec<ElifElseClause>) -> Result<Vec<Node>, CompileError> {
        let mut branches = Vec::new();
        let mut tail = Vec::new();
        for clause in clauses {
            let range = clause.range;
            match clause.test {
                Some(test) => {
                    self.decr_depth_remaining(|| range)?;
                    let test = self.parse_expression(test)?;
                    let body = self.parse_statements(clause.body)?;
                    branches.push((test, body, self.convert_range(range)));
                }
                None => tail = self.parse_statements(clause.body)?,
            }
        }
        self.depth_remaining += to_u16(branches.len());

        for (test, body, position) in branches.into_iter().rev() {
            tail = vec![Node::If {
                test,
                body,
                or_else: tail,
                position,
            }];
        }
        Ok(tail)
    }

    fn parse_statement(&mut self, statement: Stmt) -> Result<Node, CompileError> {
        self.decr_depth_remaining(|| statement.range())?;
        let result = self.parse_statement_impl(statement);
        self.depth_remaining += 1;
        result
    }

    fn parse_statement_impl(&mut self, statement: Stmt) -> Result<Node, CompileError> {
        match statement {
            Stmt::FunctionDef(function) => self.parse_function_def(function),
            Stmt::Return(ast::StmtReturn { value, range, .. }) => Ok(Node::Return {
                value: value.map(|v| self.parse_expression(*v)).transpose()?,
                position: self.convert_range(range),
            }),
            Stmt::Assign(ast::StmtAssign {
                targets, value, range, ..
            }) => Ok(Node::Assign {
                targets: targets
                    .into_iter()
                    .map(|t| self.parse_expression(t))
                    .collect::<Result<_, _>>()?,
                value: self.parse_expression(*value)?,
                position: self.convert_range(range),
            }),
            Stmt::If(ast::StmtIf {
                test,
                body,
                elif_else_clauses,
                range,
                ..
            }) => {
                let test = self.parse_expression(*test)?;
                let body = self.parse_statements(body)?;
                let or_else = self.parse_elif_else_clauses(elif_else_clauses)?;
                Ok(Node::If {
                    test,
                    body,
                    or_else,
                    position: self.convert_range(range),
                })
            }
            Stmt::Global(ast::StmtGlobal { names, range, .. }) => Ok(Node::Global {
                names: names.iter().map(|id| self.code[id.range].to_owned()).collect(),
                position: self.convert_range(range),
            }),
            Stmt::Expr(ast::StmtExpr { value, .. }) => self.parse_expression(*value).map(Node::Expr),
            Stmt::Pass(_) => Ok(Node::Pass),
            other => Ok(Node::Unsupported {
                kind: stmt_kind(&other),
                position: self.convert_range(other.range()),
            }),
        }
    }

    /// Signature problems are kept on the node and reported when the
    /// definition is lowered, so earlier statements fail first.
    fn parse_function_def(&mut self, function: ast::StmtFunctionDef) -> Result<Node, CompileError> {
        let name = Identifier::new(function.name.id.to_string(), self.convert_range(function.name.range));
        let position = self.convert_range(function.range);
        if let Some((what, range)) = unsupported_signature(&function) {
            return Ok(Node::FunctionDef(FunctionDef {
                name,
                params: Vec::new(),
                body: Vec::new(),
                position,
                unsupported: Some((what, self.convert_range(range))),
            }));
        }
        let params = function
            .parameters
            .posonlyargs
            .iter()
            .chain(function.parameters.args.iter())
            .map(|p| {
                let name = &p.parameter.name;
                Identifier::new(name.id.to_string(), self.convert_range(name.range))
            })
            .collect();
        let body = self.parse_statements(function.body)?;
        Ok(Node::FunctionDef(FunctionDef {
            name,
            params,
            body,
            position,
            unsupported: None,
        }))
    }

    fn parse_expression(&mut self, expression: AstExpr) -> Result<ExprLoc, CompileError> {
        self.decr_depth_remaining(|| expression.range())?;
        let result = self.parse_expression_impl(expression);
        self.depth_remaining += 1;
        result
    }

    fn parse_expression_impl(&mut self, expression: AstExpr) -> Result<ExprLoc, CompileError> {
        match expression {
            AstExpr::BinOp(ast::ExprBinOp {
                left, op, right, range, ..
            }) => {
                let left = Box::new(self.parse_expression(*left)?);
                let right = Box::new(self.parse_expression(*right)?);
                Ok(ExprLoc::new(
                    self.convert_range(range),
                    Expr::Op {
                        left,
                        op: convert_op(op),
                        right,
                    },
                ))
            }
            AstExpr::UnaryOp(ast::ExprUnaryOp { op, operand, range, .. }) => {
                let operand = Box::new(self.parse_expression(*operand)?);
                let op = match op {
                    UnaryOp::USub => UnaryOperator::Neg,
                    UnaryOp::UAdd => UnaryOperator::Pos,
                    UnaryOp::Not => UnaryOperator::Not,
                    UnaryOp::Invert => UnaryOperator::Invert,
                };
                Ok(ExprLoc::new(self.convert_range(range), Expr::Unary { op, operand }))
            }
            AstExpr::Compare(ast::ExprCompare {
                left,
                ops,
                comparators,
                range,
                ..
            }) => {
                let left = Box::new(self.parse_expression(*left)?);
                let comparators = comparators
                    .into_vec()
                    .into_iter()
                    .map(|c| self.parse_expression(c))
                    .collect::<Result<_, _>>()?;
                Ok(ExprLoc::new(
                    self.convert_range(range),
                    Expr::Compare {
                        left,
                        ops: ops.iter().copied().map(convert_compare_op).collect(),
                        comparators,
                    },
                ))
            }
            AstExpr::Call(ast::ExprCall {
                func, arguments, range, ..
            }) => {
                let position = self.convert_range(range);
                let ast::Arguments { args, keywords, .. } = arguments;
                if !keywords.is_empty() {
                    return Ok(ExprLoc::new(position, Expr::Unsupported("keyword arguments")));
                }
                let callable = Box::new(self.parse_expression(*func)?);
                let args = args
                    .into_vec()
                    .into_iter()
                    .map(|a| self.parse_expression(a))
                    .collect::<Result<_, _>>()?;
                Ok(ExprLoc::new(position, Expr::Call { callable, args }))
            }
            AstExpr::StringLiteral(ast::ExprStringLiteral { value, range, .. }) => Ok(ExprLoc::new(
                self.convert_range(range),
                Expr::Literal(Literal::Str(value.to_string())),
            )),
            AstExpr::BytesLiteral(ast::ExprBytesLiteral { value, range, .. }) => {
                let bytes: Cow<'_, [u8]> = Cow::from(&value);
                Ok(ExprLoc::new(
                    self.convert_range(range),
                    Expr::Literal(Literal::Bytes(bytes.into_owned())),
                ))
            }
            AstExpr::NumberLiteral(ast::ExprNumberLiteral { value, range, .. }) => {
                let literal = match value {
                    Number::Int(i) => match i.as_i64() {
                        Some(i) => Literal::Int(i),
                        None => Literal::LongInt(i.to_string()),
                    },
                    Number::Float(f) => Literal::Float(f),
                    Number::Complex { real, imag } => Literal::Complex { real, imag },
                };
                Ok(ExprLoc::new(self.convert_range(range), Expr::Literal(literal)))
            }
            AstExpr::BooleanLiteral(ast::ExprBooleanLiteral { value, range, .. }) => {
                Ok(ExprLoc::new(self.convert_range(range), Expr::Literal(Literal::Bool(value))))
            }
            AstExpr::NoneLiteral(ast::ExprNoneLiteral { range, .. }) => {
                Ok(ExprLoc::new(self.convert_range(range), Expr::Literal(Literal::None)))
            }
            AstExpr::EllipsisLiteral(ast::ExprEllipsisLiteral { range, .. }) => {
                Ok(ExprLoc::new(self.convert_range(range), Expr::Literal(Literal::Ellipsis)))
            }
            AstExpr::Name(ast::ExprName { id, range, .. }) => {
                let position = self.convert_range(range);
                Ok(ExprLoc::new(position, Expr::Name(Identifier::new(id.to_string(), position))))
            }
            AstExpr::List(ast::ExprList { elts, range, .. }) => {
                let elements = elts
                    .into_iter()
                    .map(|e| self.parse_expression(e))
                    .collect::<Result<_, _>>()?;
                Ok(ExprLoc::new(self.convert_range(range), Expr::List(elements)))
            }
            other => Ok(ExprLoc::new(
                self.convert_range(other.range()),
                Expr::Unsupported(expr_kind(&other)),
            )),
        }
    }

    fn convert_range(&self, range: TextRange) -> CodeRange {
        let start = self.index_to_position(range.start().into());
        let end = self.index_to_position(range.end().into());
        CodeRange::new(start, end)
    }

    fn index_to_position(&self, index: usize) -> CodeLoc {
        let line_no = self.line_ends.partition_point(|&end| end < index);
        let line_start = match line_no {
            0 => 0,
            n => self.line_ends[n - 1] + 1,
        };
        CodeLoc::new(to_u32(line_no + 1), to_u32(index - line_start))
    }

    /// Decrements the depth remaining for nested constructs.
    /// Returns an error if the depth remaining goes to zero.
    fn decr_depth_remaining(&mut self, get_range: impl FnOnce() -> TextRange) -> Result<(), CompileError> {
        if let Some(depth_remaining) = self.depth_remaining.checked_sub(1) {
            self.depth_remaining = depth_remaining;
            Ok(())
        } else {
            Err(self.error(CompileErrorKind::NestingTooDeep, "too many nested constructs", get_range()))
        }
    }

    fn error(&self, kind: CompileErrorKind, msg: impl Into<Cow<'static, str>>, range: TextRange) -> CompileError {
        let position = self.convert_range(range);
        CompileError::new(kind, msg, SourceLocation::new(self.filename, position.start()))
    }
}

/// Returns the first signature feature without a lowering, and where it is.
fn unsupported_signature(function: &ast::StmtFunctionDef) -> Option<(&'static str, TextRange)> {
    let params = &function.parameters;
    if function.is_async {
        Some(("async function definitions", function.range))
    } else if !function.decorator_list.is_empty() {
        Some(("function decorators", function.range))
    } else if params.vararg.is_some() || params.kwarg.is_some() || !params.kwonlyargs.is_empty() {
        Some(("variadic or keyword-only parameters", params.range))
    } else {
        params
            .posonlyargs
            .iter()
            .chain(params.args.iter())
            .find(|p| p.default.is_some())
            .map(|p| ("parameter default values", p.range))
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn convert_op(op: AstOperator) -> Operator {
    match op {
        AstOperator::Add => Operator::Add,
        AstOperator::Sub => Operator::Sub,
        AstOperator::Mult => Operator::Mult,
        AstOperator::MatMult => Operator::MatMult,
        AstOperator::Div => Operator::Div,
        AstOperator::Mod => Operator::Mod,
        AstOperator::Pow => Operator::Pow,
        AstOperator::LShift => Operator::LShift,
        AstOperator::RShift => Operator::RShift,
        AstOperator::BitOr => Operator::BitOr,
        AstOperator::BitXor => Operator::BitXor,
        AstOperator::BitAnd => Operator::BitAnd,
        AstOperator::FloorDiv => Operator::FloorDiv,
    }
}

fn convert_compare_op(op: CmpOp) -> CmpOperator {
    match op {
        CmpOp::Eq => CmpOperator::Eq,
        CmpOp::NotEq => CmpOperator::NotEq,
        CmpOp::Lt => CmpOperator::Lt,
        CmpOp::LtE => CmpOperator::LtE,
        CmpOp::Gt => CmpOperator::Gt,
        CmpOp::GtE => CmpOperator::GtE,
        CmpOp::Is => CmpOperator::Is,
        CmpOp::IsNot => CmpOperator::IsNot,
        CmpOp::In => CmpOperator::In,
        CmpOp::NotIn => CmpOperator::NotIn,
    }
}

/// Source construct name of a statement, for unknown-node errors.
fn stmt_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::FunctionDef(_) => "FunctionDef",
        Stmt::ClassDef(_) => "ClassDef",
        Stmt::Return(_) => "Return",
        Stmt::Delete(_) => "Delete",
        Stmt::TypeAlias(_) => "TypeAlias",
        Stmt::Assign(_) => "Assign",
        Stmt::AugAssign(_) => "AugAssign",
        Stmt::AnnAssign(_) => "AnnAssign",
        Stmt::For(_) => "For",
        Stmt::While(_) => "While",
        Stmt::If(_) => "If",
        Stmt::With(_) => "With",
        Stmt::Match(_) => "Match",
        Stmt::Raise(_) => "Raise",
        Stmt::Try(_) => "Try",
        Stmt::Assert(_) => "Assert",
        Stmt::Import(_) => "Import",
        Stmt::ImportFrom(_) => "ImportFrom",
        Stmt::Global(_) => "Global",
        Stmt::Nonlocal(_) => "Nonlocal",
        Stmt::Expr(_) => "Expr",
        Stmt::Pass(_) => "Pass",
        Stmt::Break(_) => "Break",
        Stmt::Continue(_) => "Continue",
        _ => "statement",
    }
}

/// Source construct name of an expression, for unknown-node errors.
fn expr_kind(expr: &AstExpr) -> &'static str {
    match expr {
        AstExpr::BoolOp(_) => "BoolOp",
        AstExpr::Named(_) => "NamedExpr",
        AstExpr::BinOp(_) => "BinOp",
        AstExpr::UnaryOp(_) => "UnaryOp",
        AstExpr::Lambda(_) => "Lambda",
        AstExpr::If(_) => "IfExp",
        AstExpr::Dict(_) => "Dict",
        AstExpr::Set(_) => "Set",
        AstExpr::ListComp(_) => "ListComp",
        AstExpr::SetComp(_) => "SetComp",
        AstExpr::DictComp(_) => "DictComp",
        AstExpr::Generator(_) => "GeneratorExp",
        AstExpr::Await(_) => "Await",
        AstExpr::Yield(_) => "Yield",
        AstExpr::YieldFrom(_) => "YieldFrom",
        AstExpr::Compare(_) => "Compare",
        AstExpr::Call(_) => "Call",
        AstExpr::FString(_) => "JoinedStr",
        AstExpr::TString(_) => "TemplateStr",
        AstExpr::Attribute(_) => "Attribute",
        AstExpr::Subscript(_) => "Subscript",
        AstExpr::Starred(_) => "Starred",
        AstExpr::Tuple(_) => "Tuple",
        AstExpr::Slice(_) => "Slice",
        _ => "expression",
    }
}

/// A line and column position in source.
///
/// `line` is 1-based, `column` is the 0-based byte offset within the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl CodeLoc {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Source range of a node.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CodeRange {
    start: CodeLoc,
    end: CodeLoc,
}

/// Custom Debug implementation to make displaying code much less verbose.
impl fmt::Debug for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

impl CodeRange {
    #[must_use]
    pub const fn new(start: CodeLoc, end: CodeLoc) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn start(&self) -> CodeLoc {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> CodeLoc {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(code: &str) -> Vec<Node> {
        parse(code, "test.py", 200).unwrap()
    }

    #[test]
    fn positions_are_line_and_byte_column() {
        let nodes = parse_ok("x = 1\nif x:\n    y = 'é' + 2\n");
        let Node::If { body, position, .. } = &nodes[1] else {
            panic!("expected if, got {:?}", nodes[1]);
        };
        assert_eq!(position.start(), CodeLoc::new(2, 0));
        let Node::Assign { value, .. } = &body[0] else {
            panic!("expected assign");
        };
        assert_eq!(value.position.start(), CodeLoc::new(3, 8));
        let Expr::Op { right, .. } = &value.expr else {
            panic!("expected binary op");
        };
        // 'é' is two bytes in UTF-8
        assert_eq!(right.position.start(), CodeLoc::new(3, 15));
    }

    #[test]
    fn elif_becomes_nested_if() {
        let nodes = parse_ok("if a:\n    pass\nelif b:\n    pass\nelse:\n    x = 1\n");
        let Node::If { or_else, .. } = &nodes[0] else {
            panic!("expected if");
        };
        assert_eq!(or_else.len(), 1);
        let Node::If { or_else: inner, .. } = &or_else[0] else {
            panic!("expected nested if");
        };
        assert!(matches!(inner[0], Node::Assign { .. }));
    }

    #[test]
    fn unsupported_statement_keeps_kind() {
        let nodes = parse_ok("while x:\n    pass\n");
        assert!(matches!(nodes[0], Node::Unsupported { kind: "While", .. }));
    }

    #[test]
    fn chained_comparison_keeps_all_operators() {
        let nodes = parse_ok("1 < 2 < 3");
        let Node::Expr(ExprLoc {
            expr: Expr::Compare { ops, comparators, .. },
            ..
        }) = &nodes[0]
        else {
            panic!("expected comparison");
        };
        assert_eq!(ops, &[CmpOperator::Lt, CmpOperator::Lt]);
        assert_eq!(comparators.len(), 2);
    }

    #[test]
    fn function_parameters_in_declaration_order() {
        let nodes = parse_ok("def f(a, b, /, c):\n    return a\n");
        let Node::FunctionDef(def) = &nodes[0] else {
            panic!("expected function def");
        };
        let names: Vec<_> = def.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn default_parameter_is_kept_for_lowering() {
        let nodes = parse_ok("def f(a, b=1):\n    pass\n");
        let Node::FunctionDef(def) = &nodes[0] else {
            panic!("expected function def");
        };
        let (what, position) = def.unsupported.expect("signature should be flagged");
        assert_eq!(what, "parameter default values");
        assert_eq!(position.start(), CodeLoc::new(1, 9));
        assert!(def.body.is_empty());
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = parse("def (:\n", "test.py", 200).unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::Syntax);
        assert_eq!(err.location().file, "test.py");
    }

    #[test]
    fn elif_chain_counts_towards_nesting_limit() {
        let mut code = "if x == 0:\n    pass\n".to_owned();
        for i in 1..40 {
            code.push_str(&format!("elif x == {i}:\n    pass\n"));
        }
        let err = parse(&code, "test.py", 20).unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::NestingTooDeep);
        assert!(parse(&code, "test.py", 60).is_ok());
    }

    #[test]
    fn elif_budget_is_restored() {
        let mut code = String::new();
        for _ in 0..3 {
            code.push_str("if a:\n    pass\nelif b:\n    pass\nelif c:\n    pass\n");
        }
        assert_eq!(parse(&code, "test.py", 6).unwrap().len(), 3);
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let code = format!("x = {}1{}", "[".repeat(50), "]".repeat(50));
        let err = parse(&code, "test.py", 20).unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::NestingTooDeep);
    }
}
