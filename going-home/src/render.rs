//! Presentation of a [`DerivedResult`] for the different front ends.

use std::fmt::Display;

use askama::Template;
use serde_json::json;

use crate::duration::format_duration;
use crate::fetcher::DerivedResult;

/// Shown by text channels when every listed connection has already left.
pub const NO_UPCOMING: &str = "No upcoming connection found.";

/// Header line, e.g. `"Start from home in 10m."`.
pub fn render_header(location: impl Display, in_seconds: u64, delay_mins: i64) -> String {
    let duration = format_duration(in_seconds);
    if delay_mins == 0 {
        format!("Start from {location} in {duration}.")
    } else {
        format!("Start from {location} in {duration} (Delay: {delay_mins} min)")
    }
}

/// Short header for the embedded display.
pub fn render_arduino_header(in_seconds: u64, delay_mins: i64) -> String {
    let duration = format_duration(in_seconds);
    if delay_mins == 0 {
        format!("Start in {duration}")
    } else {
        format!("Start in {duration} +{delay_mins} min")
    }
}

/// `"Olten: 3;Aarau: 1"`
pub fn render_delay_line(delays: &[(String, i64)]) -> String {
    delays
        .iter()
        .map(|(location, delay)| format!("{location}: {delay}"))
        .collect::<Vec<_>>()
        .join(";")
}

pub fn render_time_line(in_seconds: u64, from: &str, to: &str) -> String {
    format!("In {} from {from} to {to}", format_duration(in_seconds))
}

/// Where a result is going to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Plain text on a terminal.
    Cli,
    /// Desktop panel widget (argos/bitbar markup).
    Argos,
    /// Minimal web page.
    Html,
    /// Restricted JSON for the embedded display.
    Arduino,
    /// The whole result as JSON.
    Json,
}

impl Channel {
    pub fn content_type(&self) -> &'static str {
        match self {
            Channel::Cli | Channel::Argos => "text/plain; charset=utf-8",
            Channel::Html => "text/html; charset=utf-8",
            Channel::Arduino | Channel::Json => "application/json",
        }
    }
}

/// A rendered result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub body: String,
    /// Whether the underlying result was an error.
    pub failed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Template)]
#[template(
    source = "<html><head><title>Going Home</title></head><body>\
<h2>{{ header }}</h2>\
{% if let Some(delay) = delay %}{{ delay }}<br>{% endif %}\
<pre>{% for line in details %}{{ line }}\n{% endfor %}</pre>\
{% if let Some(payload) = payload %}<pre>{{ payload }}</pre>{% endif %}\
</body></html>",
    ext = "html"
)]
struct PageTemplate<'a> {
    header: &'a str,
    delay: Option<&'a str>,
    details: &'a [String],
    /// The raw API payload, pretty-printed.
    payload: Option<String>,
}

/// Render `result` for `channel`.
pub fn render(channel: Channel, result: &DerivedResult) -> Result<Rendered, RenderError> {
    let failed = result.is_error();
    let body = match channel {
        Channel::Cli => render_cli(result),
        Channel::Argos => render_argos(result),
        Channel::Html => render_html(result)?,
        Channel::Arduino => serde_json::to_string(&json!({ "arduino": result.arduino_header }))?,
        Channel::Json => serde_json::to_string(result)?,
    };
    Ok(Rendered { body, failed })
}

fn render_cli(result: &DerivedResult) -> String {
    if let Some(error) = &result.error {
        return error.clone();
    }
    let Some(header) = &result.header else {
        return NO_UPCOMING.to_string();
    };

    std::iter::once(header.as_str())
        .chain(result.detail_lines.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

// Argos shows the first line in the panel and everything after `---` in the
// dropdown; the details go on one line with literal `\n` escapes.
fn render_argos(result: &DerivedResult) -> String {
    if let Some(error) = &result.error {
        return format!("{error}\n---");
    }
    let header = result.header.as_deref().unwrap_or(NO_UPCOMING);

    let mut lines = vec![header.to_string(), "---".to_string()];
    if !result.detail_lines.is_empty() {
        lines.push(result.detail_lines.join("\\n"));
    }
    format!("{}| font = monospace", lines.join("\n"))
}

fn render_html(result: &DerivedResult) -> Result<String, RenderError> {
    let header = result
        .error
        .as_deref()
        .or(result.header.as_deref())
        .unwrap_or(NO_UPCOMING);

    let payload = result
        .full_payload
        .as_ref()
        .map(serde_json::to_string_pretty)
        .transpose()?;

    let page = PageTemplate {
        header,
        delay: result.delay_summary.as_deref(),
        details: &result.detail_lines,
        payload,
    }
    .render()?;
    Ok(page)
}
