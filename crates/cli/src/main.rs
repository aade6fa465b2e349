use std::process::ExitCode;

fn main() -> ExitCode {
    agrilink_cli::run()
}
