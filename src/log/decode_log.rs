//! Per-session record of every decode.
//!
//! Each capture, file load, save and screenshot leaves one record holding
//! what was decoded (dialect, data bits, channels, points, sample bytes)
//! or why it failed. Saved as tab-separated text or JSON.

use chrono::{DateTime, Local};
use dso_core::AcquisitionSet;
use dso_image::ImageBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Connect,
    Capture,
    Load,
    Save,
    Screenshot,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Ok,
    Failed(String),
}

/// What one operation decoded. Fields that do not apply stay empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeRecord {
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub operation: Operation,
    /// File path, or instrument model for a connect.
    pub target: String,
    pub dialect: Option<String>,
    pub data_bits: Option<u8>,
    pub channels: Vec<String>,
    /// Points per channel, or pixels for a screenshot.
    pub points: usize,
    /// Decoded sample or pixel bytes.
    pub bytes: usize,
    pub outcome: Outcome,
}

impl DecodeRecord {
    fn row(&self) -> String {
        let outcome = match &self.outcome {
            Outcome::Ok => "ok".to_string(),
            Outcome::Failed(reason) => format!("failed: {}", reason),
        };
        [
            self.sequence.to_string(),
            self.timestamp.format("%H:%M:%S%.3f").to_string(),
            self.operation.to_string(),
            self.target.clone(),
            self.dialect.clone().unwrap_or_else(|| "-".into()),
            self.data_bits.map_or("-".into(), |b| b.to_string()),
            if self.channels.is_empty() { "-".into() } else { self.channels.join(",") },
            self.points.to_string(),
            self.bytes.to_string(),
            outcome,
        ]
        .join("\t")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeLog {
    pub session_id: String,
    pub started: DateTime<Local>,
    pub records: Vec<DecodeRecord>,
}

impl DecodeLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            started: Local::now(),
            records: Vec::new(),
        }
    }

    fn push(&mut self, operation: Operation, target: &str, outcome: Outcome) -> &mut DecodeRecord {
        let sequence = self.records.len() + 1;
        self.records.push(DecodeRecord {
            sequence,
            timestamp: Local::now(),
            operation,
            target: target.to_string(),
            dialect: None,
            data_bits: None,
            channels: Vec::new(),
            points: 0,
            bytes: 0,
            outcome,
        });
        let last = self.records.len() - 1;
        &mut self.records[last]
    }

    /// Successful operation with nothing decoded, such as a connect.
    pub fn record_ok(&mut self, operation: Operation, target: &str) {
        self.push(operation, target, Outcome::Ok);
        log::debug!("{} {}: ok", operation, target);
    }

    pub fn record_set(&mut self, operation: Operation, target: &str, set: &AcquisitionSet) {
        let record = self.push(operation, target, Outcome::Ok);
        record.dialect = set.dialect.map(|d| d.to_string());
        record.data_bits = Some(set.calibration.data_bits);
        record.channels = set.channels.iter().map(|c| c.source.clone()).collect();
        record.points = set.points();
        record.bytes = set.len() * set.points() * std::mem::size_of::<i16>();
        log::debug!(
            "{} {}: {} channel(s) x {} points",
            operation,
            target,
            set.len(),
            set.points()
        );
    }

    pub fn record_image(&mut self, operation: Operation, target: &str, img: &ImageBuffer) {
        let record = self.push(operation, target, Outcome::Ok);
        record.points = img.width as usize * img.height as usize;
        record.bytes = img.data.len();
    }

    pub fn record_failure(&mut self, operation: Operation, target: &str, error: &dyn fmt::Display) {
        let reason = error.to_string();
        log::warn!("{} {} failed: {}", operation, target, reason);
        self.push(operation, target, Outcome::Failed(reason));
    }

    /// Pass `result` through, recording a failure when it is an error.
    pub fn check<T, E: fmt::Display>(
        &mut self,
        operation: Operation,
        target: &str,
        result: Result<T, E>,
    ) -> Result<T, E> {
        if let Err(e) = &result {
            self.record_failure(operation, target, e);
        }
        result
    }

    pub fn failures(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
            .count()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = format!(
            "# session {} started {}\n",
            self.session_id,
            self.started.to_rfc3339()
        );
        out.push_str("seq\ttime\toperation\ttarget\tdialect\tbits\tchannels\tpoints\tbytes\toutcome\n");
        for record in &self.records {
            out.push_str(&record.row());
            out.push('\n');
        }
        out
    }

    /// Save as JSON when the extension is `.json`, tab-separated otherwise.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let text = if is_json {
            serde_json::to_string_pretty(self)?
        } else {
            self.to_tsv()
        };
        std::fs::write(path, text)
    }
}

impl Default for DecodeLog {
    fn default() -> Self {
        Self::new()
    }
}
