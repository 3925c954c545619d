//! vm - personal knowledge and task tree

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = vmgr::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
