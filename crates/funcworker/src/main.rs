//! Binary entrypoint for the function worker.

use std::io::{self, Write};

use funcworker::{SystemConfigLoader, WORKER_TARGET, run_stdio};
use tracing::error;

fn main() {
    if let Err(failure) = run_stdio(&SystemConfigLoader) {
        error!(target: WORKER_TARGET, error = %failure, "worker stopped");
        writeln!(io::stderr().lock(), "{failure}").ok();
        std::process::exit(1);
    }
}
