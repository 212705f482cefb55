use basik::{
    CompileOptions, RecordingTracer, TraceEvent, compile_source, compile_source_traced,
    bytecode::Opcode,
    disasm::{self, DecodeError},
};
use pretty_assertions::assert_eq;

const SOURCE: &str = "def f(a):\n    return a\nprint(f('x'))\n";

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

#[test]
fn object_table_layout() {
    let module = compile_source(SOURCE, "main.py", &CompileOptions::default()).unwrap();
    let bytes = module.to_bytes();

    assert_eq!(&bytes[..4], &2u32.to_le_bytes());

    let mut at = 4;
    for unit in module.units() {
        let len = read_u64(&bytes, at) as usize;
        assert_eq!(len, unit.object_len());
        let object = &bytes[at + 8..at + 8 + len];
        let name_end = object.iter().position(|b| *b == 0).unwrap();
        assert_eq!(&object[..name_end], unit.name().as_bytes());
        assert_eq!(&object[name_end + 1..], unit.payload());
        at += 8 + len;
    }
    assert_eq!(at, bytes.len());
}

#[test]
fn write_to_matches_to_bytes() {
    let module = compile_source(SOURCE, "main.py", &CompileOptions::default()).unwrap();
    let mut written = Vec::new();
    module.write_to(&mut written).unwrap();
    assert_eq!(written, module.to_bytes());
}

#[test]
fn listing_names_every_unit() {
    let module = compile_source(SOURCE, "main.py", &CompileOptions::default()).unwrap();
    let text = disasm::listing(&module.to_bytes()).unwrap();
    assert!(text.contains("unit file;main.py/entry"), "{text}");
    assert!(text.contains("unit file;main.py::f"), "{text}");
    assert!(text.contains("LoadFunction \"file;main.py::f\""), "{text}");
}

#[test]
fn truncated_container_is_rejected() {
    let module = compile_source(SOURCE, "main.py", &CompileOptions::default()).unwrap();
    let bytes = module.to_bytes();
    let err = disasm::decode_module(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof { .. }), "{err}");
}

#[test]
fn trace_event_order() {
    let mut tracer = RecordingTracer::new();
    compile_source_traced("def f():\n    pass\n", "main.py", &CompileOptions::default(), &mut tracer).unwrap();

    let entry = "file;main.py/entry".to_owned();
    let f = "file;main.py::f".to_owned();
    assert_eq!(
        tracer.into_events(),
        vec![
            TraceEvent::UnitStart {
                name: entry.clone(),
                depth: 0
            },
            TraceEvent::UnitStart { name: f.clone(), depth: 1 },
            TraceEvent::Instruction {
                offset: 0,
                opcode: Opcode::ListExpand
            },
            TraceEvent::Instruction {
                offset: 1,
                opcode: Opcode::PushNull
            },
            TraceEvent::Instruction {
                offset: 2,
                opcode: Opcode::Return
            },
            TraceEvent::UnitFinished {
                name: f.clone(),
                payload_len: 11
            },
            TraceEvent::ChildUnit {
                parent: entry.clone(),
                child: f,
            },
            TraceEvent::Instruction {
                offset: 0,
                opcode: Opcode::LoadFunction
            },
            TraceEvent::Instruction {
                offset: 17,
                opcode: Opcode::StoreGlobal
            },
            TraceEvent::Instruction {
                offset: 20,
                opcode: Opcode::PushNull
            },
            TraceEvent::Instruction {
                offset: 21,
                opcode: Opcode::Return
            },
            TraceEvent::UnitFinished {
                name: entry,
                payload_len: 30
            },
        ]
    );
}

#[test]
fn trace_reports_patches() {
    let mut tracer = RecordingTracer::new();
    compile_source_traced("if x:\n    pass\n", "main.py", &CompileOptions::default(), &mut tracer).unwrap();
    let patches: Vec<_> = tracer
        .events()
        .iter()
        .filter(|event| matches!(event, TraceEvent::Patch { .. }))
        .collect();
    // `JumpIfNot else` and `Jump end`
    assert_eq!(patches.len(), 2);
}
