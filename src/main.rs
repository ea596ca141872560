use std::process::ExitCode;

use clap::Parser;

use ci_excellence::ci::{CiEnv, CiReport};
use ci_excellence::cli::orchestration::{self, Context};
use ci_excellence::cli::Cli;
use ci_excellence::config;
use ci_excellence::error::CiError;
use ci_excellence::logging;
use ci_excellence::ui;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = CiEnv::from_process();
    logging::init(env.get(logging::LOG_ENV), cli.verbose);

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            return ExitCode::from(e.exit_code());
        }
    };

    let mut report = CiReport::new();
    let ctx = Context::new(&env, &config);
    let result = orchestration::run(&cli.command, &ctx, &mut report);

    // Outputs are written even when the command failed
    if let Err(e) = report.write(&env) {
        ui::display_error(&format!("Failed to write CI report: {}", e));
        if result.is_ok() {
            return ExitCode::from(e.exit_code());
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            let code = e.downcast_ref::<CiError>().map_or(1, CiError::exit_code);
            ExitCode::from(code)
        }
    }
}
