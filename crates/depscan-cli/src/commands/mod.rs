//! Command dispatch and handler modules.

mod scan;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scan {
            dir,
            json,
            offline,
            depth,
            conflicts,
            config,
        } => {
            let args = scan::ScanArgs {
                json,
                offline,
                depth,
                conflicts,
                config,
            };
            scan::exec(&dir, &args).await
        }
    }
}
