//! Azure Pipelines logging commands (`##vso[...]`) written to stdout.
//!
//! The agent scans task output for these lines to pick up the task result,
//! warnings and errors, and PATH changes that later steps should see.

use crate::types::TelemetryRecord;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded,
    Failed,
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskResult::Succeeded => f.write_str("Succeeded"),
            TaskResult::Failed => f.write_str("Failed"),
        }
    }
}

pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(']', "%5D").replace(';', "%3B")
}

pub fn format_command(command: &str, properties: &[(&str, &str)], data: &str) -> String {
    let mut line = format!("##vso[{}", command);
    if !properties.is_empty() {
        line.push(' ');
        for (key, value) in properties {
            line.push_str(key);
            line.push('=');
            line.push_str(&escape_property(value));
            line.push(';');
        }
    }
    line.push(']');
    line.push_str(&escape_data(data));
    line
}

fn emit(line: String) {
    println!("{}", line);
}

pub fn log_warning(message: &str) {
    emit(format_command("task.logissue", &[("type", "warning")], message));
}

pub fn log_error(message: &str) {
    emit(format_command("task.logissue", &[("type", "error")], message));
}

/// Makes `dir` the first PATH entry for the remaining steps of the job.
pub fn prepend_path(dir: &Path) {
    emit(format_command("task.prependpath", &[], &dir.to_string_lossy()));
}

pub fn set_result(result: TaskResult, message: &str) {
    if result == TaskResult::Failed && !message.is_empty() {
        log_error(message);
    }
    let result = result.to_string();
    emit(format_command("task.complete", &[("result", result.as_str())], message));
}

pub fn publish_telemetry(area: &str, feature: &str, record: &TelemetryRecord) {
    match serde_json::to_string(record) {
        Ok(json) => emit(format_command(
            "telemetry.publish",
            &[("area", area), ("feature", feature)],
            &json,
        )),
        Err(e) => tracing::debug!("Skipping telemetry: {}", e),
    }
}
