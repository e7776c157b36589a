//! Input filtering and output naming

use std::path::{Path, PathBuf};
use crate::config::OutputFormat;

/// Extensions accepted as batch input (compared case-insensitively)
pub fn supported_input_formats() -> &'static [&'static str] {
    &["png", "jpg", "jpeg"]
}

/// Check if a file extension is supported for input
pub fn is_supported_input_format(extension: &str) -> bool {
    supported_input_formats()
        .iter()
        .any(|&fmt| fmt.eq_ignore_ascii_case(extension))
}

/// Check a file name or path by its extension
pub fn has_supported_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, is_supported_input_format)
}

/// Output file name for a source: its base name with the output extension
pub fn output_file_name(source_name: &str, format: OutputFormat) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_name);

    format!("{}.{}", stem, format.extension())
}

/// Output path for a source inside `output_dir`
pub fn output_path_for(source_name: &str, output_dir: &Path, format: OutputFormat) -> PathBuf {
    output_dir.join(output_file_name(source_name, format))
}

/// Reduce a client-supplied file name to its last path component.
///
/// Returns `None` for names that carry no usable component.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    match name {
        "" | "." | ".." => None,
        _ => Some(name.to_string()),
    }
}
