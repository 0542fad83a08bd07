//! Human-readable rendering of the shared statistics.
//!
//! The text layout follows the driver's procfs entry: bytes read, bytes written, one line
//! per minor, one line per response string. Only field order and labels are stable; the
//! output is advisory.

use booga_core::{DeviceStats, Response};
use serde::Serialize;
use std::fmt::Write;

/// Renders a [`DeviceStats`] snapshot for a driver with `device_count` minors.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    device_name: String,
    device_count: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    bytes_read: u64,
    bytes_written: u64,
    opens: Vec<JsonOpen<'a>>,
    responses: Vec<JsonResponse>,
}

#[derive(Serialize)]
struct JsonOpen<'a> {
    device: &'a str,
    minor: usize,
    count: u64,
}

#[derive(Serialize)]
struct JsonResponse {
    response: Response,
    text: &'static str,
    count: u64,
}

impl ReportRenderer {
    /// Renderer labelling minors `/dev/<device_name><minor>`.
    pub fn new(device_name: impl Into<String>, device_count: usize) -> Self {
        Self {
            device_name: device_name.into(),
            device_count,
        }
    }

    /// Text report in fixed order.
    pub fn render(&self, stats: &DeviceStats) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "bytes read = {}", stats.bytes_read());
        let _ = writeln!(out, "bytes written = {}", stats.bytes_written());
        let _ = writeln!(out, "number of opens:");
        for minor in 0..self.device_count {
            let _ = writeln!(
                out,
                "\t/dev/{}{} = {} times",
                self.device_name,
                minor,
                stats.open_count(minor)
            );
        }
        let _ = writeln!(out, "strings output:");
        for response in Response::ALL {
            let _ = writeln!(
                out,
                "\t{} = {} times",
                response.text().trim_end(),
                stats.response_count(response)
            );
        }
        out
    }

    /// The same fields as [`render`](Self::render), as pretty-printed JSON.
    pub fn render_json(&self, stats: &DeviceStats) -> serde_json::Result<String> {
        let devices: Vec<String> = (0..self.device_count)
            .map(|minor| format!("/dev/{}{}", self.device_name, minor))
            .collect();
        let report = JsonReport {
            bytes_read: stats.bytes_read(),
            bytes_written: stats.bytes_written(),
            opens: devices
                .iter()
                .enumerate()
                .map(|(minor, device)| JsonOpen {
                    device,
                    minor,
                    count: stats.open_count(minor),
                })
                .collect(),
            responses: Response::ALL
                .into_iter()
                .map(|response| JsonResponse {
                    response,
                    text: response.text(),
                    count: stats.response_count(response),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&report)
    }
}
