use std::process::ExitCode;

fn main() -> ExitCode {
    launderly_cli::run()
}
