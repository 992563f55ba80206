use std::process::ExitCode;

use porticod::AccessMode;

fn main() -> ExitCode {
    porticod::run_proxy(AccessMode::Admin)
}
