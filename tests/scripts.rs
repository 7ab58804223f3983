mod common;

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use common::run;

struct Expectations {
    output: Vec<String>,
    errors: Vec<String>,
    exit_code: i32,
}

fn parse_expectations(test_file: &Path) -> Result<Expectations, std::io::Error> {
    let content = fs::read_to_string(test_file)?;

    let expect_regex = Regex::new(r"// expect:\s?(.*)$").unwrap();
    let error_regex = Regex::new(r"// error:\s*(.+)$").unwrap();
    let exit_regex = Regex::new(r"// exit:\s*(\d+)").unwrap();

    let mut expectations = Expectations {
        output: Vec::new(),
        errors: Vec::new(),
        exit_code: 0,
    };

    for line in content.lines() {
        if let Some(captures) = expect_regex.captures(line) {
            expectations.output.push(captures[1].to_string());
        }

        if let Some(captures) = error_regex.captures(line) {
            expectations.errors.push(captures[1].trim().to_string());
        }

        if let Some(captures) = exit_regex.captures(line) {
            expectations.exit_code = captures[1].parse().unwrap();
        }
    }

    Ok(expectations)
}

fn script_files() -> Vec<PathBuf> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/scripts");

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .expect("tests/scripts is missing")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "lox"))
        .collect();

    files.sort();
    files
}

fn run_lox_test(test_file: &Path) {
    println!("Running test: {}", test_file.display());

    let expected = parse_expectations(test_file).expect("Failed to parse test expectations");
    let source = fs::read_to_string(test_file).expect("Failed to read script");

    let (stdout, stderr, code) = run(&source);
    let actual: Vec<&str> = stdout.lines().collect();

    assert_eq!(
        actual,
        expected.output,
        "stdout mismatch in {}",
        test_file.display()
    );

    for error in &expected.errors {
        assert!(
            stderr.contains(error.as_str()),
            "Expected error '{}' not found in stderr of {}: {}",
            error,
            test_file.display(),
            stderr
        );
    }

    if expected.errors.is_empty() {
        assert_eq!(stderr, "", "unexpected stderr in {}", test_file.display());
    }

    assert_eq!(code, expected.exit_code, "exit code of {}", test_file.display());
}

#[test]
fn run_all_scripts() {
    let files = script_files();
    assert!(!files.is_empty(), "no .lox scripts found");

    for file in &files {
        run_lox_test(file);
    }
}
