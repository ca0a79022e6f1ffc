//! Scenario test runner CLI
//!
//! Usage:
//!   cargo run --bin test-scenarios              # Run all tests
//!   cargo run --bin test-scenarios -- contacts/ # Run category
//!   cargo run --bin test-scenarios -- floor/bounce_loses_energy  # Run single test
//!   cargo run --bin test-scenarios -- --verbose # Show details on failure
//!   cargo run --bin test-scenarios -- --list    # List scenario files

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ballroom::testing::{SCENARIOS_DIR, TestResult, parse_test_file, run_test};

fn main() {
    let args: Vec<String> = env::args().collect();

    let verbose = args.iter().skip(1).any(|a| a == "--verbose" || a == "-v");
    let list_only = args.iter().skip(1).any(|a| a == "--list");
    let filter = args.iter().skip(1).find(|a| !a.starts_with('-')).cloned();

    let scenarios_path = Path::new(SCENARIOS_DIR);
    if !scenarios_path.is_dir() {
        eprintln!("No scenarios directory found at {}", SCENARIOS_DIR);
        std::process::exit(1);
    }

    let tests = discover_tests(scenarios_path, filter.as_deref());
    if tests.is_empty() {
        eprintln!(
            "No scenario files found{}",
            filter.map(|f| format!(" matching '{}'", f)).unwrap_or_default()
        );
        std::process::exit(1);
    }

    if list_only {
        for path in &tests {
            println!("{}", path.strip_prefix(scenarios_path).unwrap_or(path).display());
        }
        return;
    }

    println!("Ballroom Scenarios");
    println!("==================\n");

    let started = Instant::now();
    let mut failures: Vec<String> = Vec::new();
    let mut passed = 0;
    let mut current_category = String::new();

    for test_path in &tests {
        let rel_path = test_path.strip_prefix(scenarios_path).unwrap_or(test_path);

        let category = rel_path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        if category != current_category && !category.is_empty() {
            println!("{}/", category);
            current_category = category;
        }

        let test_name = rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let result = match parse_test_file(test_path) {
            Ok(def) => {
                if verbose && let Some(description) = &def.description {
                    println!("  # {}", description.trim());
                }
                run_test(&def)
            }
            Err(message) => TestResult::Error { message },
        };

        print_result(&test_name, &result, verbose);
        if result.is_pass() {
            passed += 1;
        } else {
            failures.push(rel_path.display().to_string());
        }
    }

    println!("\n==================");
    println!(
        "Results: {} passed, {} not passing ({:.2}s)",
        passed,
        failures.len(),
        started.elapsed().as_secs_f32()
    );
    for failure in &failures {
        println!("  - {}", failure);
    }

    if !failures.is_empty() {
        std::process::exit(1);
    }
}

fn discover_tests(base: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut tests = Vec::new();
    discover_tests_recursive(base, base, filter, &mut tests);
    tests.sort();
    tests
}

fn discover_tests_recursive(
    base: &Path,
    current: &Path,
    filter: Option<&str>,
    tests: &mut Vec<PathBuf>,
) {
    let entries = match fs::read_dir(current) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            discover_tests_recursive(base, &path, filter, tests);
        } else if path.extension().is_some_and(|e| e == "toml") {
            let rel = path.strip_prefix(base).unwrap_or(&path).to_string_lossy();
            if filter.is_some_and(|f| !rel.contains(f)) {
                continue;
            }
            tests.push(path);
        }
    }
}

fn print_result(name: &str, result: &TestResult, verbose: bool) {
    let dots = ".".repeat(40 - name.len().min(39));

    match result {
        TestResult::Pass { frames } => {
            println!("  {} {} PASS ({} frames)", name, dots, frames);
        }
        TestResult::Fail { error } => {
            println!("  {} {} FAIL", name, dots);
            if verbose {
                println!("    {}", error);
            } else {
                println!("    {}", error.message);
            }
        }
        TestResult::Error { message } => {
            println!("  {} {} ERROR", name, dots);
            println!("    {}", message);
        }
    }
}
