//! End-to-end tests driving the compiled `loxi` binary.

use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

/// Path to the loxi binary under test.
fn loxi_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_loxi"))
}

/// Writes a script to a temp file and returns the handle (the file is
/// deleted when dropped).
fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp script");
    file.write_all(source.as_bytes())
        .expect("failed to write temp script");
    file
}

#[test]
fn arithmetic_precedence() {
    let file = script("print 1 + 2 * 3;");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn shadowing_in_blocks() {
    let file = script("var a = 1; { var a = 2; print a; } print a;");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout("2\n1\n");
}

#[test]
fn counter_closure() {
    let file = script(
        "fun makeCounter(){ var i = 0; fun count(){ i = i + 1; return i; } return count; }\n\
         var c = makeCounter(); print c(); print c();",
    );
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[test]
fn class_method_call() {
    let file = script("class A { greet(){ print \"hi\"; } } A().greet();");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout("hi\n");
}

#[test]
fn inheritance_and_super() {
    let file = script(
        "class A { init(x){ this.x = x; } }\n\
         class B < A { init(x,y){ super.init(x); this.y = y; } }\n\
         var b = B(1,2); print b.x; print b.y;",
    );
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[test]
fn for_loop() {
    let file = script("for (var i = 0; i < 3; i = i + 1) print i;");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout("0\n1\n2\n");
}

#[test]
fn parse_error_exits_65_and_reports() {
    let file = script("var a = ;");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("[line 1] Error"))
        .stderr(predicate::str::contains("Expect expression."));
}

#[test]
fn parser_recovers_and_reports_later_errors_too() {
    let file = script("var a = ;\nvar b = ;\n");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("[line 1]"))
        .stderr(predicate::str::contains("[line 2]"));
}

#[test]
fn resolve_error_exits_65() {
    let file = script("return 1;");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains(
            "Error at 'return': Can't return from top-level code.",
        ));
}

#[test]
fn static_errors_skip_evaluation() {
    let file = script("print 1;\nvar bad = ;\n");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .code(65)
        // Nothing may run when any static error was reported.
        .stdout("");
}

#[test]
fn runtime_error_exits_70_with_line() {
    let file = script("print 1;\n1 + \"a\";");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .code(70)
        .stdout("1\n")
        .stderr(predicate::str::contains(
            "Operands must be two numbers or two strings.",
        ))
        .stderr(predicate::str::contains("[line 2]"));
}

#[test]
fn arity_mismatch_is_a_runtime_error() {
    let file = script("fun f(){} f(1);");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .code(70)
        .stderr(predicate::str::contains("Expected 0 arguments but got 1."));
}

#[test]
fn unterminated_string_reports_lex_error() {
    let file = script("var s = \"oops;\n");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Unterminated string."));
}

#[test]
fn usage_error_exits_64() {
    Command::new(loxi_bin())
        .args(["one.lox", "two.lox"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Usage: loxi [script]"));
}

#[test]
fn missing_script_file_fails_with_context() {
    Command::new(loxi_bin())
        .arg("does-not-exist.lox")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read script"));
}

#[test]
fn repl_evaluates_lines() {
    Command::new(loxi_bin())
        .write_stdin("print 1 + 1;\nprint \"done\";\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2\n"))
        .stdout(predicate::str::contains("done\n"));
}

#[test]
fn repl_state_persists_across_lines() {
    Command::new(loxi_bin())
        .write_stdin("var a = 5;\nfun twice(x) { return 2 * x; }\nprint twice(a);\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("10\n"));
}

#[test]
fn repl_survives_errors() {
    Command::new(loxi_bin())
        .write_stdin("ghost;\nvar a = ;\nprint \"still here\";\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("still here\n"))
        .stderr(predicate::str::contains("Undefined variable 'ghost'."))
        .stderr(predicate::str::contains("Expect expression."));
}

#[test]
fn clock_is_available() {
    let file = script("var t = clock(); print t > 0;");
    Command::new(loxi_bin())
        .arg(file.path())
        .assert()
        .success()
        .stdout("true\n");
}
