use std::process::ExitCode;

fn main() -> ExitCode {
    loa_dashboard_lib::run()
}
