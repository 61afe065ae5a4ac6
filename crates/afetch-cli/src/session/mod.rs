//! Structure loading seam and the in-memory session
//!
//! [`StructureLoader`] is what the fetcher hands content to. [`Session`] is
//! the in-process implementation: an object table keyed by object name,
//! holding a summary of every loaded state.

pub mod summary;

pub use summary::{ContentKind, ModelSummary};

use crate::error::{CliError, Result};
use afetch_common::checksum::sha256_hex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Palette used to color AlphaFold models by confidence
pub const PLDDT_PALETTE: &str = "red_white_blue";

/// Options forwarded to every load call
///
/// Integer conventions follow the classic viewer command: negative values
/// mean "use the default".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Target state (1-based); 0 appends after the existing states
    pub state: i32,
    /// Refresh the view once the load completes
    pub finish: i32,
    /// Discrete multi-state object
    pub discrete: i32,
    /// Split a multi-model file into one object per model
    pub multiplex: i32,
    /// Zoom onto the new object (negative: only when it is the first one)
    pub zoom: i32,
    pub quiet: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            state: 0,
            finish: 1,
            discrete: -1,
            multiplex: -2,
            zoom: -1,
            quiet: true,
        }
    }
}

/// Something that can take fetched structures
pub trait StructureLoader: Send + Sync {
    /// Load a structure file into object `name`
    fn load_file(&self, path: &Path, name: &str, options: &LoadOptions) -> Result<()>;

    /// Load in-memory content into object `name`
    fn load_bytes(&self, contents: &[u8], kind: ContentKind, name: &str, options: &LoadOptions) -> Result<()>;

    /// Color `name` (or the objects split from it) by B-factor
    fn color_by_bfactor(&self, name: &str, palette: &str) -> Result<()>;
}

/// A loaded object
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedObject {
    pub name: String,
    pub kind: ContentKind,
    pub states: Vec<ModelSummary>,
    pub discrete: bool,
    pub source: Option<PathBuf>,
    pub checksum: String,
    pub coloring: Option<String>,
}

impl LoadedObject {
    /// Atoms in the first state
    pub fn atoms(&self) -> usize {
        self.states.first().map(|s| s.atoms).unwrap_or(0)
    }

    /// Mean B-factor over every atom of every state
    pub fn mean_bfactor(&self) -> f64 {
        let atoms: usize = self.states.iter().map(|s| s.atoms).sum();
        if atoms == 0 {
            return 0.0;
        }
        self.states.iter().map(|s| s.bfactor_sum).sum::<f64>() / atoms as f64
    }
}

#[derive(Debug, Default)]
struct SessionState {
    objects: BTreeMap<String, LoadedObject>,
    zoomed_on: Option<String>,
    flush_depth: usize,
    refresh_pending: bool,
    refreshes: usize,
}

impl SessionState {
    fn request_refresh(&mut self) {
        if self.flush_depth > 0 {
            self.refresh_pending = true;
        } else {
            self.refreshes += 1;
        }
    }
}

/// In-memory object table
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<SessionState>,
}

/// Defers view refreshes until dropped
///
/// Guards nest; the deferred refresh runs when the last one is dropped.
#[must_use = "flushing resumes as soon as the guard is dropped"]
pub struct FlushGuard<'a> {
    session: &'a Session,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.session.lock();
        state.flush_depth = state.flush_depth.saturating_sub(1);
        if state.flush_depth == 0 && state.refresh_pending {
            state.refresh_pending = false;
            state.refreshes += 1;
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // a panic while holding the lock leaves the table itself consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Block view refreshes until the returned guard is dropped
    pub fn block_flush(&self) -> FlushGuard<'_> {
        self.lock().flush_depth += 1;
        FlushGuard { session: self }
    }

    pub fn is_flush_blocked(&self) -> bool {
        self.lock().flush_depth > 0
    }

    /// Number of view refreshes performed so far
    pub fn refresh_count(&self) -> usize {
        self.lock().refreshes
    }

    pub fn get(&self, name: &str) -> Option<LoadedObject> {
        self.lock().objects.get(name).cloned()
    }

    /// Loaded objects sorted by name
    pub fn objects(&self) -> Vec<LoadedObject> {
        self.lock().objects.values().cloned().collect()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    /// Object the view was last zoomed onto
    pub fn zoomed_on(&self) -> Option<String> {
        self.lock().zoomed_on.clone()
    }

    fn load_text(
        &self,
        contents: &[u8],
        kind: ContentKind,
        name: &str,
        options: &LoadOptions,
        source: Option<PathBuf>,
    ) -> Result<()> {
        let text = std::str::from_utf8(contents)
            .map_err(|e| CliError::load(format!("'{}' is not UTF-8 text: {}", name, e)))?;
        let models = summary::summarize(text, kind)?;
        let checksum = sha256_hex(contents);

        let mut state = self.lock();
        let first_object = state.objects.is_empty();
        let split = options.multiplex > 0 && models.len() > 1;

        if !split && options.state > 0 {
            // states are placed contiguously: at most one past the last one
            let existing = state.objects.get(name).map_or(0, |o| o.states.len());
            if options.state as usize > existing + 1 {
                return Err(CliError::invalid_argument(
                    "state",
                    options.state.to_string(),
                    format!(
                        "'{}' has {} state(s); use 0 to append or a state up to {}.",
                        name,
                        existing,
                        existing + 1
                    ),
                ));
            }
        }

        let placed: Vec<String> = if split {
            models
                .into_iter()
                .enumerate()
                .map(|(i, model)| {
                    let split_name = format!("{}_{:04}", name, i + 1);
                    state.objects.insert(
                        split_name.clone(),
                        LoadedObject {
                            name: split_name.clone(),
                            kind,
                            states: vec![model],
                            discrete: options.discrete > 0,
                            source: source.clone(),
                            checksum: checksum.clone(),
                            coloring: None,
                        },
                    );
                    split_name
                })
                .collect()
        } else {
            match state.objects.get_mut(name) {
                Some(existing) => {
                    place_states(&mut existing.states, models, options.state);
                    existing.discrete |= options.discrete > 0;
                    existing.kind = kind;
                    existing.source = source;
                    existing.checksum = checksum;
                    existing.coloring = None;
                },
                None => {
                    let mut states = Vec::new();
                    place_states(&mut states, models, options.state);
                    state.objects.insert(
                        name.to_string(),
                        LoadedObject {
                            name: name.to_string(),
                            kind,
                            states,
                            discrete: options.discrete > 0,
                            source,
                            checksum,
                            coloring: None,
                        },
                    );
                },
            }
            vec![name.to_string()]
        };

        if options.zoom > 0 || (options.zoom < 0 && first_object) {
            state.zoomed_on = placed.first().cloned();
        }
        if options.finish != 0 {
            state.request_refresh();
        }

        if !options.quiet {
            for object in &placed {
                if let Some(loaded) = state.objects.get(object) {
                    info!(
                        object = %object,
                        states = loaded.states.len(),
                        atoms = loaded.atoms(),
                        "Loaded structure"
                    );
                }
            }
        }

        Ok(())
    }
}

/// Put `models` into `states` starting at 1-based `state`, or append when 0
///
/// `state` must be at most one past the last existing state.
fn place_states(states: &mut Vec<ModelSummary>, models: Vec<ModelSummary>, state: i32) {
    let start = if state <= 0 { states.len() } else { (state - 1) as usize };
    for (offset, model) in models.into_iter().enumerate() {
        match states.get_mut(start + offset) {
            Some(slot) => *slot = model,
            None => states.push(model),
        }
    }
}

impl StructureLoader for Session {
    fn load_file(&self, path: &Path, name: &str, options: &LoadOptions) -> Result<()> {
        let contents = std::fs::read(path)?;
        let extension = path.extension().and_then(|e| e.to_str());
        let kind = ContentKind::detect(extension, &contents);
        debug!(path = %path.display(), kind = ?kind, "Loading structure file");
        self.load_text(&contents, kind, name, options, Some(path.to_path_buf()))
    }

    fn load_bytes(&self, contents: &[u8], kind: ContentKind, name: &str, options: &LoadOptions) -> Result<()> {
        self.load_text(contents, kind, name, options, None)
    }

    fn color_by_bfactor(&self, name: &str, palette: &str) -> Result<()> {
        let mut state = self.lock();
        let split_prefix = format!("{}_", name);
        let mut colored = 0;

        for (object_name, object) in state.objects.iter_mut() {
            let split_from_name = object_name
                .strip_prefix(&split_prefix)
                .is_some_and(|rest| rest.len() == 4 && rest.bytes().all(|b| b.is_ascii_digit()));
            if object_name == name || split_from_name {
                object.coloring = Some(format!("spectrum b, {}", palette));
                colored += 1;
            }
        }

        if colored == 0 {
            return Err(CliError::load(format!("no object matches '{}'", name)));
        }
        Ok(())
    }
}
