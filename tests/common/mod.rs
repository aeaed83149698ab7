#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use yokc::span::SourceMap;
use yokc::CompileError;

pub fn fixture_path(name: &str, ext: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.{}", name, ext))
}

pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name, "yok");
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

/// One rendered diagnostic per line, as a CLI would print them.
pub fn render_errors(src: &str, err: &CompileError) -> String {
    let sm = SourceMap::new(src.as_bytes());
    err.diagnostics()
        .iter()
        .map(|d| d.render(&sm))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn compile_ok(src: &str) -> String {
    yokc::compile(src.as_bytes())
        .unwrap_or_else(|e| panic!("compile failed: {}\n{}", e, render_errors(src, &e)))
}

pub fn compile_err(src: &str) -> CompileError {
    match yokc::compile(src.as_bytes()) {
        Ok(out) => panic!("expected compile to fail, got:\n{}", out),
        Err(e) => e,
    }
}

pub fn assert_codegen_matches_snapshot(name: &str) {
    let output = compile_ok(&read_fixture(name));
    let expected_path = fixture_path(name, "sh.expected");

    let expected = if std::env::var("YOKC_UPDATE_SNAPSHOTS").is_ok() {
        fs::write(&expected_path, &output).expect("Failed to update snapshot");
        output.clone()
    } else {
        fs::read_to_string(&expected_path).expect("Failed to read expected codegen fixture")
    };

    pretty_assertions::assert_eq!(output, expected, "Codegen mismatch for {}", name);
}

pub fn shell_available() -> bool {
    Path::new("/bin/sh").exists()
}

/// Runs `script` with `/bin/sh` from a scratch directory. Returns stdout, stderr and the
/// exit code.
pub fn run_sh(script: &str) -> (String, String, i32) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script_path = dir.path().join("script.sh");
    fs::write(&script_path, script).expect("Failed to write temp script");

    let output = Command::new("/bin/sh")
        .arg(&script_path)
        .current_dir(dir.path())
        .output()
        .expect("Failed to execute /bin/sh");

    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.code().unwrap_or(-1),
    )
}
