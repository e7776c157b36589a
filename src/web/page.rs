//! HTML for the upload form and the result page

use std::fmt::Write;

use crate::config::{BackgroundColor, TargetBox};
use crate::parallel::{BatchResult, ItemOutcome};

/// Raw form values, echoed back when the form is re-rendered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub width: String,
    pub height: String,
    pub bgcolor: String,
}

/// Outcome of a successful upload request
#[derive(Debug, Clone)]
pub struct UploadSummary {
    pub target: TargetBox,
    pub background: BackgroundColor,
    pub result: BatchResult,
    /// Uploaded files ignored because of their extension
    pub skipped: Vec<String>,
}

const STYLE: &str = "body{font-family:sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin:.6rem 0}\
.error{background:#fde8e8;border:1px solid #e02424;padding:.6rem}\
.failed{color:#e02424}";

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head>\n<body>\n{}\n</body></html>\n",
        escape(title),
        STYLE,
        body
    )
}

/// The upload form, optionally with an error message above it
pub fn render_form(error: Option<&str>, values: &FormValues) -> String {
    let mut body = String::from("<h1>Resize and pad images</h1>\n");

    if let Some(message) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape(message));
    }

    let bgcolor = if values.bgcolor.is_empty() {
        BackgroundColor::WHITE.to_string()
    } else {
        values.bgcolor.clone()
    };

    let _ = write!(
        body,
        "<form method=\"post\" action=\"/resize\" enctype=\"multipart/form-data\">\n\
         <label>Images <input type=\"file\" name=\"files\" accept=\".png,.jpg,.jpeg\" multiple required></label>\n\
         <label>Width <input type=\"text\" name=\"width\" value=\"{}\" required></label>\n\
         <label>Height <input type=\"text\" name=\"height\" value=\"{}\" required></label>\n\
         <label>Background color <input type=\"text\" name=\"bgcolor\" value=\"{}\" pattern=\"#[0-9a-fA-F]{{6}}\"></label>\n\
         <button type=\"submit\">Process</button>\n\
         </form>",
        escape(&values.width),
        escape(&values.height),
        escape(&bgcolor)
    );

    layout("padresize", &body)
}

/// Per-file outcomes of a processed upload
pub fn render_summary(summary: &UploadSummary) -> String {
    let result = &summary.result;
    let mut body = String::from("<h1>Processing complete</h1>\n");

    let _ = writeln!(
        body,
        "<p>{} of {} images resized to {} on {} ({} failed).</p>",
        result.succeeded,
        result.total,
        summary.target,
        summary.background,
        result.failed
    );

    body.push_str("<ul>\n");
    for report in &result.items {
        match &report.outcome {
            ItemOutcome::Written { output_path, .. } => {
                let file_name = output_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let _ = writeln!(
                    body,
                    "<li>{} &rarr; <a href=\"/processed/{}\">{}</a></li>",
                    escape(&report.identifier),
                    escape(&file_name),
                    escape(&file_name)
                );
            }
            ItemOutcome::Failed { error, .. } => {
                let _ = writeln!(
                    body,
                    "<li class=\"failed\">{}: {}</li>",
                    escape(&report.identifier),
                    escape(error)
                );
            }
        }
    }
    body.push_str("</ul>\n");

    if !summary.skipped.is_empty() {
        let skipped: Vec<String> = summary.skipped.iter().map(|name| escape(name)).collect();
        let _ = writeln!(
            body,
            "<p>Skipped (not .png, .jpg or .jpeg): {}</p>",
            skipped.join(", ")
        );
    }

    body.push_str("<p><a href=\"/\">Process more images</a></p>");

    layout("padresize: results", &body)
}
