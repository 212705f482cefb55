use std::{env, fs, process::ExitCode, time::Instant};

use basik::{CompileOptions, IntWidth, StderrTracer, compile_source, compile_source_traced, disasm};

const USAGE: &str = "usage: basikc <input.py> <output.bsk> [--trace | --trace-units] [--disasm] [--narrow-ints] [--config <options.json>]";

/// Parsed command line.
#[derive(Debug, Default)]
struct Args {
    input: String,
    output: String,
    trace: Option<Trace>,
    disasm: bool,
    narrow_ints: bool,
    config: Option<String>,
}

/// How much of the compilation to log to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trace {
    /// Every event, one line per encoded instruction.
    Full,
    /// Unit boundaries, labels and patches.
    Units,
}

fn main() -> ExitCode {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let mut options = match load_options(args.config.as_deref()) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if args.narrow_ints {
        options = options.int_width(IntWidth::Narrowest);
    }

    let code = match read_file(&args.input) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let result = match args.trace {
        Some(Trace::Full) => compile_source_traced(&code, &args.input, &options, &mut StderrTracer::new()),
        Some(Trace::Units) => compile_source_traced(&code, &args.input, &options, &mut StderrTracer::units_only()),
        None => compile_source(&code, &args.input, &options),
    };
    let module = match result {
        Ok(module) => module,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();

    let bytes = module.to_bytes();
    if let Err(err) = fs::write(&args.output, &bytes) {
        eprintln!("error: writing {}: {err}", args.output);
        return ExitCode::FAILURE;
    }
    eprintln!(
        "compiled {} unit(s), {} bytes in {elapsed:?}",
        module.units().len(),
        bytes.len()
    );

    if args.disasm {
        match disasm::listing(&bytes) {
            Ok(text) => print!("{text}"),
            Err(err) => {
                eprintln!("error: disassembling output: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut positional = Vec::new();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--trace" => args.trace = Some(Trace::Full),
            "--trace-units" => args.trace = Some(Trace::Units),
            "--disasm" => args.disasm = true,
            "--narrow-ints" => args.narrow_ints = true,
            "--config" => {
                args.config = Some(raw.next().ok_or("--config requires a file path")?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(input), Some(output), None) => {
            args.input = input;
            args.output = output;
            Ok(args)
        }
        (_, _, Some(extra)) => Err(format!("unexpected argument {extra}")),
        _ => Err("expected an input and an output path".to_owned()),
    }
}

fn load_options(config: Option<&str>) -> Result<CompileOptions, String> {
    let Some(path) = config else {
        return Ok(CompileOptions::default());
    };
    let text = read_file(path)?;
    serde_json::from_str(&text).map_err(|err| format!("invalid options in {path}: {err}"))
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("reading {file_path}: {err}"));
        }
    }
    fs::read_to_string(file_path).map_err(|err| format!("reading {file_path}: {err}"))
}
