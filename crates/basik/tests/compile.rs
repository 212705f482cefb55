use basik::{
    CompileOptions, CompiledModule, IntWidth, compile_source,
    bytecode::{JumpTarget, Op},
    disasm::{DecodedUnit, decode_module},
};
use pretty_assertions::assert_eq;

fn compile(code: &str) -> CompiledModule {
    compile_source(code, "main.py", &CompileOptions::default()).expect("should compile")
}

fn decode(code: &str) -> Vec<DecodedUnit> {
    decode_module(&compile(code).to_bytes()).expect("output should decode")
}

fn ops(unit: &DecodedUnit) -> Vec<Op> {
    unit.instructions.iter().map(|(_, op)| op.clone()).collect()
}

fn s(value: &str) -> String {
    value.to_owned()
}

#[test]
fn hello_world() {
    let units = decode("print('hello world')\n");
    assert_eq!(units.len(), 1);
    let entry = &units[0];
    assert_eq!(entry.name, "file;main.py/entry");
    assert_eq!(entry.constants, vec![s("hello world")]);
    assert!(entry.variables.is_empty());
    assert_eq!(
        ops(entry),
        vec![
            Op::LoadDynamic(s("print")),
            Op::ListBegin,
            Op::PushString(0),
            Op::ListEnd,
            Op::Call,
            Op::PushNull,
            Op::Return,
        ]
    );
}

#[test]
fn function_definition_and_call() {
    let units = decode("def f(x):\n    return x\nf(3)\n");
    assert_eq!(units.len(), 2);

    let entry = &units[0];
    assert_eq!(
        ops(entry),
        vec![
            Op::LoadFunction(s("file;main.py::f")),
            Op::StoreGlobal(s("f")),
            Op::LoadGlobal(s("f")),
            Op::ListBegin,
            Op::PushI64(3),
            Op::ListEnd,
            Op::Call,
            Op::PushNull,
            Op::Return,
        ]
    );

    let function = &units[1];
    assert_eq!(function.name, "file;main.py::f");
    assert_eq!(function.variables, vec![s("x")]);
    assert_eq!(
        ops(function),
        vec![Op::ListExpand, Op::StoreSimple(0), Op::LoadSimple(0), Op::Return]
    );
}

#[test]
fn parameters_use_declaration_order_slots() {
    let units = decode("def f(a, b, c):\n    return c - a\n");
    let function = &units[1];
    assert_eq!(function.variables, vec![s("a"), s("b"), s("c")]);
    assert_eq!(
        ops(function),
        vec![
            Op::ListExpand,
            Op::StoreSimple(2),
            Op::StoreSimple(1),
            Op::StoreSimple(0),
            Op::LoadSimple(2),
            Op::LoadSimple(0),
            Op::Sub,
            Op::Return,
        ]
    );
}

#[test]
fn if_else_jump_addresses() {
    let units = decode("if x:\n    y = 1\nelse:\n    y = 2\nz = 3\n");
    let entry = &units[0];
    let offsets: Vec<usize> = entry.instructions.iter().map(|(offset, _)| *offset).collect();
    // LoadDynamic "x" (3), JumpIfNot (9), PushI64 (9), StoreDynamic "y" (3), Jump (9), ...
    assert_eq!(&offsets[..8], &[0, 3, 12, 21, 24, 33, 42, 45]);
    assert_eq!(entry.instructions[1].1, Op::JumpIfNot(JumpTarget::Address(33)));
    assert_eq!(entry.instructions[4].1, Op::Jump(JumpTarget::Address(45)));
    assert_eq!(entry.instructions[7].1, Op::PushI64(3));
}

#[test]
fn elif_chain() {
    let units = decode("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
    let entry = &units[0];
    let jumps: Vec<_> = entry
        .instructions
        .iter()
        .filter_map(|(_, op)| op.jump_target())
        .collect();
    assert_eq!(jumps.len(), 4);
    let end = entry.instructions.last().map(|(offset, _)| *offset - 1);
    // Both `Jump end` instructions land on the implicit return's PushNull
    assert_eq!(jumps[1], JumpTarget::Address(end.unwrap() as u64));
    assert_eq!(jumps[3], JumpTarget::Address(end.unwrap() as u64));
}

#[test]
fn global_declaration_in_function() {
    let units = decode("def f():\n    global counter\n    counter = 1\n    other = 2\n");
    assert_eq!(
        ops(&units[1]),
        vec![
            Op::ListExpand,
            Op::PushI64(1),
            Op::StoreGlobal(s("counter")),
            Op::PushI64(2),
            Op::StoreDynamic(s("other")),
            Op::PushNull,
            Op::Return,
        ]
    );
}

#[test]
fn functions_are_globals_in_later_units() {
    let units = decode("def g():\n    return 1\ndef f():\n    return g()\n");
    assert_eq!(units.len(), 3);
    assert_eq!(units[2].name, "file;main.py::f");
    assert_eq!(ops(&units[2])[1], Op::LoadGlobal(s("g")));
}

#[test]
fn nested_functions_are_emitted_depth_first() {
    let code = "def outer():\n    def inner():\n        pass\n    inner()\ndef after():\n    pass\n";
    let units = decode(code);
    let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "file;main.py/entry",
            "file;main.py::outer",
            "file;main.py::outer::inner",
            "file;main.py::after",
        ]
    );
    assert_eq!(ops(&units[1])[1], Op::LoadFunction(s("file;main.py::outer::inner")));
}

#[test]
fn enclosing_locals_are_looked_up_dynamically() {
    let units = decode("def outer(a):\n    def inner():\n        return a\n    return inner\n");
    let inner = &units[2];
    assert!(inner.variables.is_empty());
    assert_eq!(ops(inner)[1], Op::LoadDynamic(s("a")));
}

#[test]
fn negative_literal_is_single_push() {
    let units = decode("x = -5\n");
    assert_eq!(ops(&units[0])[0], Op::PushI64(-5));
    assert_eq!(ops(&units[0]).len(), 4);
}

#[test]
fn narrow_int_option() {
    let options = CompileOptions::default().int_width(IntWidth::Narrowest);
    let module = compile_source("x = 7\ny = 70000\n", "main.py", &options).unwrap();
    let units = decode_module(&module.to_bytes()).unwrap();
    let entry = ops(&units[0]);
    assert_eq!(entry[0], Op::PushI16(7));
    assert_eq!(entry[2], Op::PushI32(70000));
}

#[test]
fn lists_and_expression_statements() {
    let units = decode("[1, 'a', None]\n");
    assert_eq!(
        ops(&units[0]),
        vec![
            Op::ListBegin,
            Op::PushI64(1),
            Op::PushString(0),
            Op::PushNull,
            Op::ListEnd,
            Op::PushNull,
            Op::Return,
        ]
    );
}

#[test]
fn equality_comparison() {
    let units = decode("if a == 'x':\n    pass\n");
    assert_eq!(
        &ops(&units[0])[..3],
        &[Op::LoadDynamic(s("a")), Op::PushString(0), Op::Equals]
    );
}

#[test]
fn path_directory_is_not_part_of_name() {
    let module = compile_source("pass\n", "tests/python/01-pass.py", &CompileOptions::default()).unwrap();
    assert_eq!(module.entry().map(basik::CompiledUnit::name), Some("file;01-pass.py/entry"));
}

#[test]
fn custom_kind_and_entry_tag() {
    let options = CompileOptions::default().unit_kind(Some("lib")).entry_tag("start");
    let module = compile_source("def f():\n    pass\n", "m.py", &options).unwrap();
    let names: Vec<_> = module.units().iter().map(basik::CompiledUnit::name).collect();
    assert_eq!(names, ["lib;m.py/start", "lib;m.py::f"]);
    assert!(module.unit("lib;m.py::f").is_some());
}
