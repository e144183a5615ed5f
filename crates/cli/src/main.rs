use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Book review API
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve HTTP until interrupted
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry);
    let settings = settings.resolve_secrets()?;

    match cli.command {
        Command::Serve => {
            tracing::info!(env = ?settings.environment, "starting shelf server");
            shelf_app::serve(&settings).await
        }
        Command::Migrate => {
            let applied = shelf_app::migrate(&settings).await?;
            tracing::info!(applied, "migrations complete");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["shelf", "migrate"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate));

        let cli = Cli::try_parse_from(["shelf", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));

        assert!(Cli::try_parse_from(["shelf"]).is_err());
    }
}
