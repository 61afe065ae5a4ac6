//! Application context
//!
//! Holds everything a command needs: configuration, the fetcher, the session
//! structures are loaded into, and the state of the interactive dialog. One
//! `App` lives for the whole process.

use crate::config::Config;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::session::Session;
use afetch_common::StructureFormat;
use std::sync::Arc;

/// Formats offered by the interactive dialog
pub const DIALOG_FORMATS: &[StructureFormat] = &[StructureFormat::Cif, StructureFormat::Pdb];

/// Values remembered between dialog rounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogState {
    pub code: String,
    pub name: String,
    pub format: StructureFormat,
    /// Number of times the dialog was shown
    pub shown: usize,
}

impl DialogState {
    pub fn new(default_format: StructureFormat) -> Self {
        let format = if DIALOG_FORMATS.contains(&default_format) {
            default_format
        } else {
            StructureFormat::Cif
        };
        Self {
            code: String::new(),
            name: String::new(),
            format,
            shown: 0,
        }
    }
}

/// Process-wide context
#[derive(Debug)]
pub struct App {
    config: Config,
    fetcher: Arc<Fetcher>,
    session: Arc<Session>,
    dialog: DialogState,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::from_config(&config)?;
        Ok(Self {
            dialog: DialogState::new(config.default_format),
            fetcher: Arc::new(fetcher),
            session: Arc::new(Session::new()),
            config,
        })
    }

    /// Build from the config file and `AFETCH_*` overrides
    pub fn from_env() -> Result<Self> {
        Self::new(Config::load()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn fetcher_handle(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut DialogState {
        &mut self.dialog
    }
}
