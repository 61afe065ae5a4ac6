//! Light structure readers for the session
//!
//! Only what the session reports is extracted: models, atom counts and
//! B-factors. AlphaFold writes the per-residue pLDDT confidence into the
//! B-factor column, so the mean B-factor is the model's mean pLDDT.

use crate::error::{CliError, Result};

/// Text format of structure content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdb,
    Mmcif,
}

impl ContentKind {
    /// Guess from a file extension, falling back to sniffing the content
    pub fn detect(extension: Option<&str>, contents: &[u8]) -> Self {
        match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("pdb" | "ent" | "bio") => ContentKind::Pdb,
            Some("cif" | "mmcif") => ContentKind::Mmcif,
            _ => {
                let head = String::from_utf8_lossy(&contents[..contents.len().min(512)]);
                if head.trim_start().starts_with("data_") {
                    ContentKind::Mmcif
                } else {
                    ContentKind::Pdb
                }
            },
        }
    }
}

/// One model (state) of a structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSummary {
    pub atoms: usize,
    pub bfactor_sum: f64,
}

impl ModelSummary {
    fn add_atom(&mut self, bfactor: f64) {
        self.atoms += 1;
        self.bfactor_sum += bfactor;
    }

    pub fn mean_bfactor(&self) -> f64 {
        if self.atoms == 0 {
            0.0
        } else {
            self.bfactor_sum / self.atoms as f64
        }
    }
}

/// Parse content of the given kind into per-model summaries
///
/// Content without any atom is an error.
pub fn summarize(text: &str, kind: ContentKind) -> Result<Vec<ModelSummary>> {
    let models = match kind {
        ContentKind::Pdb => summarize_pdb(text),
        ContentKind::Mmcif => summarize_mmcif(text)?,
    };

    if models.iter().all(|m| m.atoms == 0) {
        return Err(CliError::load("no atom records found"));
    }
    Ok(models)
}

fn summarize_pdb(text: &str) -> Vec<ModelSummary> {
    let mut models: Vec<ModelSummary> = Vec::new();
    let mut current: Option<ModelSummary> = None;

    for line in text.lines() {
        if line.starts_with("MODEL") {
            if let Some(done) = current.take() {
                models.push(done);
            }
            current = Some(ModelSummary::default());
        } else if line.starts_with("ENDMDL") {
            if let Some(done) = current.take() {
                models.push(done);
            }
        } else if line.starts_with("ATOM  ") || line.starts_with("HETATM") {
            // columns 61-66
            let bfactor = line
                .get(60..66)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            current.get_or_insert_with(ModelSummary::default).add_atom(bfactor);
        }
    }

    if let Some(done) = current {
        models.push(done);
    }
    models
}

/// Split a CIF data line into tokens, honouring single and double quotes
fn cif_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let quote = bytes[i];
        if quote == b'\'' || quote == b'"' {
            let start = i + 1;
            let mut end = start;
            // a quote only closes when followed by whitespace or end of line
            while end < bytes.len()
                && !(bytes[end] == quote && (end + 1 == bytes.len() || bytes[end + 1].is_ascii_whitespace()))
            {
                end += 1;
            }
            tokens.push(&line[start..end.min(bytes.len())]);
            i = end + 1;
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            tokens.push(&line[start..i]);
        }
    }

    tokens
}

fn summarize_mmcif(text: &str) -> Result<Vec<ModelSummary>> {
    let mut lines = text.lines().peekable();
    let mut models: Vec<(String, ModelSummary)> = Vec::new();

    while let Some(line) = lines.next() {
        if line.trim() != "loop_" {
            continue;
        }

        let mut columns = Vec::new();
        while let Some(next) = lines.peek() {
            let next = next.trim();
            if let Some(column) = next.strip_prefix('_') {
                columns.push(column.to_string());
                lines.next();
            } else {
                break;
            }
        }

        if !columns.first().is_some_and(|c| c.starts_with("atom_site.")) {
            continue;
        }

        let position = |name: &str| columns.iter().position(|c| c == name);
        let bfactor_col = position("atom_site.B_iso_or_equiv")
            .ok_or_else(|| CliError::load("_atom_site loop has no B_iso_or_equiv column"))?;
        let model_col = position("atom_site.pdbx_PDB_model_num");

        while let Some(row) = lines.peek() {
            let row = row.trim();
            if row.is_empty() || row.starts_with('#') || row.starts_with('_') || row.starts_with("loop_") || row.starts_with("data_") {
                break;
            }
            lines.next();

            let tokens = cif_tokens(row);
            if tokens.len() < columns.len() {
                return Err(CliError::load(format!(
                    "_atom_site row has {} values, expected {}",
                    tokens.len(),
                    columns.len()
                )));
            }

            let bfactor = tokens[bfactor_col].parse::<f64>().unwrap_or(0.0);
            let model = model_col.map(|c| tokens[c]).unwrap_or("1");

            match models.iter_mut().find(|(id, _)| id == model) {
                Some((_, summary)) => summary.add_atom(bfactor),
                None => {
                    let mut summary = ModelSummary::default();
                    summary.add_atom(bfactor);
                    models.push((model.to_string(), summary));
                },
            }
        }
    }

    Ok(models.into_iter().map(|(_, summary)| summary).collect())
}
