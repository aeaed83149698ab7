use crate::common::*;
use pretty_assertions::assert_eq;

mod common;

// Sticks to features every POSIX sh has: no `${VAR/...}` replacement here.
const PROGRAM: &str = r#"# exercise the generated script under a real shell
let a = 10
let b = a * 3 + 2
print(b)

let name = "report-2024"
print(len(name))
print(remove_suffix(name, '-*'))
print(remove_prefix(name, '*-'))
print(len("two words"))

if b > 30 {
    print("big")
} else {
    print("small")
}

if (a - 10) == 0 {
    print(:zero)
}
"#;

#[test]
fn generated_script_runs_under_sh() {
    if !shell_available() {
        eprintln!("skipping: /bin/sh not found");
        return;
    }

    let script = compile_ok(PROGRAM);
    let (stdout, stderr, code) = run_sh(&script);

    assert_eq!(code, 0, "script failed:\n{}\nstderr:\n{}", script, stderr);
    assert_eq!(stdout, "");
    assert_eq!(stderr, "32\n11\nreport\n2024\n9\nbig\nzero\n");
}

#[test]
fn command_substitution_captures_output() {
    if !shell_available() {
        eprintln!("skipping: /bin/sh not found");
        return;
    }

    let script = compile_ok("let greeting = echo(:hi)\nprint(greeting)\nlet n = len(echo(:four))\nprint(n)\n");
    let (_, stderr, code) = run_sh(&script);
    assert_eq!(code, 0, "{}", script);
    assert_eq!(stderr, "hi\n4\n");
}

#[test]
fn quote_and_glob_characters_survive() {
    if !shell_available() {
        eprintln!("skipping: /bin/sh not found");
        return;
    }

    let script = compile_ok("print(\"it's\")\nlet g = \"a*\"\nprint(len(g))\nprint(\"[x]\")\n");
    assert!(script.contains("G=\"a*\""), "{}", script);
    let (_, stderr, code) = run_sh(&script);
    assert_eq!(code, 0, "{}", script);
    assert_eq!(stderr, "it's\n2\n[x]\n");
}
