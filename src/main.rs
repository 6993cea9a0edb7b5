use anyhow::Result;
use clap::Parser;

use tick::logging::LogTarget;

fn main() -> Result<()> {
    let cli = tick::cli::Cli::parse();

    match cli.command.clone() {
        Some(tick::cli::CliCommand::Tui) | None => {
            let config = tick::config::from_cli(&cli)?;
            tick::logging::init(
                cli.log_filter.as_deref(),
                LogTarget::File(config.log_path()),
            )?;
            tick::tui::run(config)?;
        }
        Some(command) => {
            tick::logging::init(cli.log_filter.as_deref(), LogTarget::Stderr)?;
            let config = tick::config::from_cli(&cli)?;
            let stdout = std::io::stdout();
            let handle = stdout.lock();
            tick::commands::execute_blocking(&config, command, handle)?;
        }
    }

    Ok(())
}
