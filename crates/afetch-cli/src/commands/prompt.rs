//! `afetch prompt` command implementation
//!
//! Interactive form for fetching entries one after another. The form keeps
//! the last identifier, object name and format between rounds.

use crate::app::{App, DialogState, DIALOG_FORMATS};
use crate::batch::FetchArgs;
use crate::commands::fetch;
use crate::error::Result;
use afetch_common::StructureFormat;
use colored::Colorize;
use inquire::{Confirm, InquireError, Select, Text};
use tracing::debug;

/// Values entered in one round of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogForm {
    pub code: String,
    pub name: String,
    pub format: StructureFormat,
}

impl DialogForm {
    pub fn from_state(state: &DialogState) -> Self {
        Self {
            code: state.code.clone(),
            name: state.name.clone(),
            format: state.format,
        }
    }

    /// Fetch arguments for this form; `None` without an identifier
    pub fn to_args(&self) -> Option<FetchArgs> {
        let code = self.code.trim();
        if code.is_empty() {
            return None;
        }
        Some(FetchArgs {
            name: self.name.trim().to_string(),
            format: self.format.to_string(),
            ..FetchArgs::new(code)
        })
    }

    pub fn remember(&self, state: &mut DialogState) {
        state.code = self.code.trim().to_string();
        state.name = self.name.trim().to_string();
        state.format = self.format;
    }
}

fn is_cancel(e: &InquireError) -> bool {
    matches!(e, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

fn ask(state: &DialogState) -> std::result::Result<DialogForm, InquireError> {
    let code = Text::new("UniProt ID(s):")
        .with_default(&state.code)
        .with_help_message("Separate several identifiers with spaces")
        .prompt()?;
    let name = Text::new("Object name:")
        .with_default(&state.name)
        .with_help_message("Leave empty to name objects after their identifier")
        .prompt()?;
    let cursor = DIALOG_FORMATS.iter().position(|f| *f == state.format).unwrap_or(0);
    let format = Select::new("Format:", DIALOG_FORMATS.to_vec())
        .with_starting_cursor(cursor)
        .prompt()?;

    Ok(DialogForm { code, name, format })
}

/// Show the form until the user stops
pub async fn run(app: &mut App) -> Result<()> {
    println!("{}", "AlphaFold2 structure fetch".cyan().bold());
    println!();

    loop {
        app.dialog_mut().shown += 1;
        let form = match ask(app.dialog()) {
            Ok(form) => form,
            Err(e) if is_cancel(&e) => break,
            Err(e) => return Err(e.into()),
        };
        form.remember(app.dialog_mut());

        match form.to_args() {
            Some(args) => {
                debug!(code = %args.code, format = %args.format, "Fetching from dialog");
                if let Err(e) = fetch::run(&args, app).await {
                    eprintln!("{} {}", "Error:".red(), e);
                }
            },
            None => eprintln!("{}", "Enter at least one UniProt ID.".yellow()),
        }

        match Confirm::new("Fetch another?").with_default(true).prompt() {
            Ok(true) => continue,
            Ok(false) => break,
            Err(e) if is_cancel(&e) => break,
            Err(e) => return Err(e.into()),
        }
    }

    let loaded = app.session().object_names();
    if !loaded.is_empty() {
        println!("Loaded objects: {}", loaded.join(", "));
    }
    Ok(())
}
