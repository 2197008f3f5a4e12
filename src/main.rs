use std::process::ExitCode;

fn main() -> ExitCode {
    mclibs_lib::run()
}
