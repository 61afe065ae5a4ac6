//! AlphaFold database URL builders

use afetch_common::StructureFormat;

/// Entry name of the first fragment of a model, e.g. `AF-P69905-F1`
pub fn entry_id(code: &str) -> String {
    format!("AF-{}-F1", code)
}

/// Build the download URL for one model version
///
/// `{base}/AF-{id}-F1-model_v{version}.{ext}`
pub fn model_url(base_url: &str, code: &str, version: u32, format: StructureFormat) -> String {
    format!(
        "{}/{}-model_v{}.{}",
        base_url.trim_end_matches('/'),
        entry_id(code),
        version,
        format.remote_extension()
    )
}
