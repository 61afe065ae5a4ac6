//! Versioned fetch of a single AlphaFold model
//!
//! Resolution order for one identifier:
//!
//! 1. a file already on disk at the destination (no network at all)
//! 2. the newest model version the server answers 200 for
//!
//! The content is then written to the destination and handed to the loader.
//! Retrieval, write and load problems are reported as warnings and end in
//! [`FetchStatus::Failed`]; they never abort a batch.

use crate::api::AlphaFoldClient;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::progress;
use crate::session::{ContentKind, LoadOptions, StructureLoader, PLDDT_PALETTE};
use crate::store::LocalStore;
use afetch_common::types::validate_identifier;
use afetch_common::StructureFormat;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

/// Number of leading bytes inspected for an HTML error page
const HTML_SNIFF_BYTES: usize = 500;

/// Where fetched content goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    /// `{fetch_path}/{id}-AF-v{version}.{ext}`
    #[default]
    Auto,
    /// An explicit file path
    File(PathBuf),
    /// Standard output; nothing is loaded
    Stdout,
}

impl Destination {
    /// Interpret the `file` argument of the fetch command
    ///
    /// Empty, `1` and `auto` select the automatic path, `-` selects stdout.
    pub fn from_arg(file: Option<&str>) -> Self {
        match file.map(str::trim) {
            None | Some("") | Some("1") | Some("auto") => Destination::Auto,
            Some("-") => Destination::Stdout,
            Some(path) => Destination::File(PathBuf::from(path)),
        }
    }
}

/// One identifier to fetch
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub code: String,
    pub name: String,
    pub format: StructureFormat,
    pub fetch_path: PathBuf,
    pub destination: Destination,
    pub load: LoadOptions,
    pub quiet: bool,
}

/// Outcome of fetching one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Loaded into the session as `name`
    Loaded {
        name: String,
        version: Option<u32>,
        path: Option<PathBuf>,
    },
    /// Written to stdout
    Written { version: Option<u32>, bytes: usize },
    /// Nothing could be fetched or loaded
    Failed,
}

impl FetchStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchStatus::Failed)
    }
}

/// Error pages sometimes come back with status 200
pub fn looks_like_html(contents: &[u8]) -> bool {
    let head = &contents[..contents.len().min(HTML_SNIFF_BYTES)];
    head.windows(5).any(|w| w.eq_ignore_ascii_case(b"<html"))
}

/// Fetches single identifiers against one server
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: AlphaFoldClient,
    max_version: u32,
}

impl Fetcher {
    pub fn new(client: AlphaFoldClient, max_version: u32) -> Self {
        Self { client, max_version }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(AlphaFoldClient::from_config(config)?, config.max_version))
    }

    /// Versions in probing order, newest first
    pub fn versions(&self) -> impl Iterator<Item = u32> {
        (1..=self.max_version).rev()
    }

    /// Fetch one identifier and load it through `loader`
    #[instrument(skip(self, request, loader), fields(code = %request.code, format = %request.format))]
    pub async fn fetch<L>(&self, request: &FetchRequest, loader: &L) -> FetchStatus
    where
        L: StructureLoader + ?Sized,
    {
        if let Err(e) = validate_identifier(&request.code) {
            warn!(error = %e, "Skipping identifier");
            return FetchStatus::Failed;
        }

        let store = LocalStore::new(&request.fetch_path);
        let code = request.code.as_str();
        let format = request.format;

        // A file already at the destination is reused without any request.
        let existing = match &request.destination {
            Destination::Auto => store.find_existing(code, format, self.versions()),
            Destination::File(path) if path.is_file() => Some((0, path.clone())),
            _ => None,
        };

        let (version, file, contents) = match existing {
            Some((version, path)) => {
                debug!(path = %path.display(), "Reusing stored structure");
                ((version > 0).then_some(version), Some(path), None)
            },
            None => {
                let Some((version, contents)) = self.download(code, format, request.quiet).await else {
                    return FetchStatus::Failed;
                };
                let file = self.write(&store, request, version, &contents);
                if request.destination == Destination::Stdout {
                    return FetchStatus::Written {
                        version: Some(version),
                        bytes: contents.len(),
                    };
                }
                (Some(version), file, Some(contents))
            },
        };

        let loaded = match (&file, &contents) {
            (Some(path), _) if path.is_file() => loader.load_file(path, &request.name, &request.load),
            (_, Some(contents)) => {
                let kind = if format.is_pdb_like() {
                    ContentKind::Pdb
                } else {
                    ContentKind::Mmcif
                };
                loader.load_bytes(contents, kind, &request.name, &request.load)
            },
            _ => Err(CliError::load("no content available")),
        };

        if let Err(e) = loader.color_by_bfactor(&request.name, PLDDT_PALETTE) {
            debug!(error = %e, "Coloring by B-factor skipped");
        }

        match loaded {
            Ok(()) => FetchStatus::Loaded {
                name: request.name.clone(),
                version,
                path: file.filter(|p| p.is_file()),
            },
            Err(e) => {
                error!(error = %e, "unable to load '{}'", code);
                FetchStatus::Failed
            },
        }
    }

    /// Probe versions and return the first usable content
    async fn download(&self, code: &str, format: StructureFormat, quiet: bool) -> Option<(u32, Vec<u8>)> {
        let spinner = (!quiet).then(|| progress::create_spinner(&format!("Fetching AF-{} ({})", code, format)));

        let probe = self.client.probe_versions(code, format, self.versions()).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let Some(hit) = probe.hit else {
            if !quiet {
                warn!(
                    code = %code,
                    tried = ?probe.tried_versions(),
                    "failed to fetch AF-{}: no model version available",
                    code
                );
            }
            return None;
        };

        if looks_like_html(&hit.contents) {
            if !quiet {
                warn!(url = %hit.url, "failed to fetch from {}: server returned an HTML page", hit.url);
            }
            return None;
        }

        info!(code = %code, version = hit.version, bytes = hit.contents.len(), "Fetched model");
        Some((hit.version, hit.contents))
    }

    /// Persist content; a failure is a warning and the content stays in memory
    fn write(&self, store: &LocalStore, request: &FetchRequest, version: u32, contents: &[u8]) -> Option<PathBuf> {
        let path = match &request.destination {
            Destination::Auto => store.path_for(&request.code, version, request.format),
            Destination::File(path) => path.clone(),
            Destination::Stdout => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(contents).and_then(|_| stdout.flush()) {
                    warn!(error = %e, "Cannot write to stdout");
                }
                return None;
            },
        };

        match store.write(&path, contents) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(error = %e, "Cannot write to \"{}\"", path.display());
                None
            },
        }
    }
}
