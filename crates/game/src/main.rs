mod app;

use std::env;
use std::process::ExitCode;

use app::Startup;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match app::build_app(&args) {
        Ok(Startup::Run(wiring)) => app::run(wiring),
        Ok(Startup::Help) => {
            println!("{}", app::usage_text());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("gridpush: {err}");
            ExitCode::FAILURE
        }
    }
}
