//! Integration test runner
//!
//! Runs every lifecycle suite in turn and prints a summary table.
//!
//! # Usage
//!
//! Run all suites:
//! ```text
//! cargo run -p integration-tests
//! ```
//!
//! Run one suite:
//! ```text
//! cargo test -p integration-tests --test registry_tests
//! cargo test -p integration-tests --test composition_tests
//! ```
//!
//! Every suite logs lifecycle steps at debug level through the test
//! writer; show them with:
//! ```text
//! cargo test -p integration-tests --test destroyable_tests -- --nocapture
//! ```

use std::process::Command;
use std::time::{Duration, Instant};

struct Suite {
    test_name: &'static str,
    description: &'static str,
}

const SUITES: &[Suite] = &[
    Suite {
        test_name: "naming_tests",
        description: "Directory enumeration across nested contexts",
    },
    Suite {
        test_name: "registry_tests",
        description: "Servant slot register/unregister lifecycle and the request loop",
    },
    Suite {
        test_name: "resolver_tests",
        description: "Eager resolution, caching and re-resolution of named services",
    },
    Suite {
        test_name: "multi_client_tests",
        description: "Runtime-growable replica connections",
    },
    Suite {
        test_name: "destroyable_tests",
        description: "Exactly-once destroy of transient objects",
    },
    Suite {
        test_name: "composition_tests",
        description: "Provided/consumed role composition over one session",
    },
];

fn run_suite(suite: &Suite) -> (bool, Duration) {
    println!("\n{}", "=".repeat(72));
    println!("{} - {}", suite.test_name, suite.description);
    println!("{}", "=".repeat(72));

    let start = Instant::now();
    let status = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", suite.test_name])
        .status();
    let elapsed = start.elapsed();

    match status {
        Ok(status) => (status.success(), elapsed),
        Err(e) => {
            eprintln!("cannot run cargo: {}", e);
            (false, elapsed)
        }
    }
}

fn main() {
    let started = Instant::now();
    let results: Vec<_> = SUITES.iter().map(|suite| (suite, run_suite(suite))).collect();

    println!("\n{}", "=".repeat(72));
    println!("{:<24} {:<8} {}", "Suite", "Status", "Duration");
    println!("{}", "-".repeat(72));
    for (suite, (passed, elapsed)) in &results {
        let status = if *passed { "PASS" } else { "FAIL" };
        println!("{:<24} {:<8} {:?}", suite.test_name, status, elapsed);
    }
    println!("{}", "=".repeat(72));
    println!("Total: {:?}", started.elapsed());

    let failed = results.iter().filter(|(_, (passed, _))| !passed).count();
    if failed > 0 {
        println!("{} suite(s) failed", failed);
        std::process::exit(1);
    }
}
