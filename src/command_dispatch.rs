//! Purpose: Hold top-level CLI command dispatch for `userdesk`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Config is validated before a runtime is started.

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "userdesk", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Serve { subcommand, run } => {
            let config = serve_config_from_run_args(run)?;
            match subcommand {
                Some(ServeSubcommand::Check { json }) => {
                    serve::preflight_config(&config)?;
                    emit_serve_check_report(&config, json);
                    Ok(RunOutcome::ok())
                }
                None => {
                    let runtime = build_runtime()?;
                    runtime.block_on(serve::serve(config))?;
                    Ok(RunOutcome::ok())
                }
            }
        }
        Command::Ui(args) => {
            let config = ui_config_from_args(args)?;
            let runtime = build_runtime()?;
            runtime.block_on(ui_serve::serve_ui(config))?;
            Ok(RunOutcome::ok())
        }
    }
}
