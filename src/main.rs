#![forbid(unsafe_code)]

//! rmguard — policy hook entry point.
//!
//! Reads the invocation envelope from stdin, runs it through
//! [`rmguard::pipeline::run`], and maps the outcome to the process exit
//! code. The whole call is wrapped in `catch_unwind`: any panic inside the
//! pipeline still allows the command through (spec §4.5, fail-open).

use std::io::Read;
use std::panic::{self, AssertUnwindSafe};

use rmguard::pipeline;

fn main() {
    let mut stdin = String::new();
    if std::io::stdin().read_to_string(&mut stdin).is_err() {
        std::process::exit(0);
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pipeline::run(&stdin)));

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(_) => {
            eprintln!("rmguard: internal error, allowing command");
            std::process::exit(0);
        }
    };

    for line in &outcome.stdout_lines {
        println!("{line}");
    }
    for line in &outcome.stderr_lines {
        eprintln!("{line}");
    }

    std::process::exit(i32::from(outcome.exit_code));
}
