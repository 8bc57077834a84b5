//! Shared test utilities for prepcat.

pub mod fixtures;

use std::fmt::Debug;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

impl<I, E> TestCase<I, E> {
    pub const fn new(name: &'static str, input: I, expected: E) -> Self {
        Self {
            name,
            input,
            expected,
        }
    }
}

/// Run every case and report all mismatches together.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F) -> Result<(), String>
where
    I: Debug,
    E: Debug + PartialEq,
    F: Fn(&I) -> E,
{
    let mut failures = Vec::new();
    for case in &cases {
        let actual = test_fn(&case.input);
        if actual == case.expected {
            println!("[TEST] PASSED: {}", case.name);
        } else {
            failures.push(format!(
                "'{}' with input {:?}: expected {:?}, got {:?}",
                case.name, case.input, case.expected, actual
            ));
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} of {} cases failed:\n{}", failures.len(), cases.len(), failures.join("\n")))
    }
}
