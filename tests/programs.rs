use std::path::PathBuf;

use color_eyre::eyre::Result;
use ls8::memory::parse::ParseErrorKind;
use ls8::{Config, LoadError, Processor, Program, StdMem};

fn path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn run_file(relative: &str) -> Result<(Processor, StdMem, String)> {
    let program = Program::from_file(path(relative))?;
    let mut mem = StdMem::default();
    let mut cpu = Processor::new();
    let mut out: Vec<u8> = Vec::new();

    cpu.load(&mut mem, &program)?;
    cpu.execute_until_hlt(&mut mem, &mut out, &Config::default())?;

    Ok((cpu, mem, String::from_utf8(out)?))
}

#[test]
fn print8() -> Result<()> {
    let (cpu, _, out) = run_file("programs/print8.ls8")?;

    assert_eq!(out, "8\n");
    assert!(!cpu.running);

    Ok(())
}

#[test]
fn mult() -> Result<()> {
    let (cpu, _, out) = run_file("programs/mult.ls8")?;

    assert_eq!(out, "72\n");
    assert_eq!(cpu.reg[1], 9);

    Ok(())
}

#[test]
fn stack() -> Result<()> {
    let (cpu, _, out) = run_file("programs/stack.ls8")?;

    assert_eq!(out, "2\n4\n1\n");
    assert_eq!(cpu.sp, ls8::processor::STACK_START);

    Ok(())
}

#[test]
fn call() -> Result<()> {
    let (cpu, _, out) = run_file("programs/call.ls8")?;

    assert_eq!(out, "20\n30\n36\n60\n");
    assert_eq!(cpu.sp, ls8::processor::STACK_START);

    Ok(())
}

#[test]
fn sctest() -> Result<()> {
    let (_, _, out) = run_file("programs/sctest.ls8")?;

    assert_eq!(out, "1\n2\n3\n");

    Ok(())
}

#[test]
fn hello() -> Result<()> {
    let (_, _, out) = run_file("programs/hello.ls8")?;

    assert_eq!(out, "Hi!\n");

    Ok(())
}

#[test]
fn runs_are_deterministic() -> Result<()> {
    let first = run_file("programs/call.ls8")?;
    let second = run_file("programs/call.ls8")?;

    assert_eq!(first, second);

    Ok(())
}

#[test]
fn malformed_program_names_file_and_line() {
    let err = Program::from_file(path("tests/fixtures/malformed.ls8")).unwrap_err();

    match &err {
        LoadError::Parse { errors, .. } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].kind(), ParseErrorKind::InvalidLiteral);
            assert_eq!(errors[0].line_nr(), 4);
        }
        other => panic!("unexpected error: {}", other),
    }

    let message = err.to_string();
    assert!(message.contains("malformed.ls8"));
    assert!(message.contains("line 4"));
    assert!(message.contains("0000100x"));
}

#[test]
fn missing_program() {
    let err = Program::from_file(path("programs/missing.ls8")).unwrap_err();

    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("missing.ls8"));
}
