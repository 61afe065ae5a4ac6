//! `afetch fetch` command implementation

use crate::app::App;
use crate::batch::{self, BatchReport, FetchArgs};
use crate::error::{CliError, Result};
use crate::fetch::FetchStatus;
use crate::session::Session;
use colored::Colorize;

/// Fetch one or more identifiers and report what was loaded
pub async fn run(args: &FetchArgs, app: &App) -> Result<()> {
    let report = batch::dispatch(args, app).await?.wait().await?;
    print_report(&report, app.session());

    if report.status().is_failed() {
        let code = report.entries.last().map(|(code, _)| code.as_str()).unwrap_or("");
        return Err(CliError::load(format!("no AlphaFold model could be fetched for '{}'", code)));
    }
    Ok(())
}

/// One line per identifier on stderr; stdout may carry structure content
fn print_report(report: &BatchReport, session: &Session) {
    for (code, status) in &report.entries {
        match status {
            FetchStatus::Loaded { name, version, path } => {
                let version = version.map(|v| format!("v{}", v)).unwrap_or_else(|| "local".to_string());
                let (atoms, plddt) = session
                    .get(name)
                    .map(|o| (o.atoms(), o.mean_bfactor()))
                    .unwrap_or_default();
                eprintln!(
                    "{} {} -> {} ({}, {} atoms, mean pLDDT {:.1})",
                    "✓".green(),
                    code,
                    name.cyan(),
                    version,
                    atoms,
                    plddt
                );
                if let Some(path) = path {
                    eprintln!("  {}", path.display().to_string().dimmed());
                }
            },
            FetchStatus::Written { version, bytes } => {
                let version = version.map(|v| format!("v{}", v)).unwrap_or_default();
                eprintln!("{} {} {} written to stdout ({} bytes)", "✓".green(), code, version, bytes);
            },
            FetchStatus::Failed => {
                eprintln!("{} {}", "✗".red(), code);
            },
        }
    }
}
