use std::process::ExitCode;

fn main() -> ExitCode {
    match fluid_tokens::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err.kind();
            eprintln!("error[{kind}]: {:#}", anyhow::Error::new(err));
            ExitCode::FAILURE
        }
    }
}
