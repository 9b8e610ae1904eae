//! Command-name contract for logging.

use crate::cli::parse::Commands;

/// Stable command name (e.g. "run", "posts").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Run { .. } => "run",
        Commands::Summary { .. } => "summary",
        Commands::Posts { .. } => "posts",
        Commands::Validate { .. } => "validate",
    }
}
