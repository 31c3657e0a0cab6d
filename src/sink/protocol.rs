//! Wire format for frames sent to the telemetry relay.
//!
//! Each frame is one JSON object terminated by `\n`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SinkError;
use crate::report::{Metric, ReportState};

/// Upper bound on a single encoded frame, delimiter included.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Frame delimiter.
pub const DELIMITER: u8 = b'\n';

/// Messages understood by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkEnvelope {
    /// First frame on every connection.
    Hello {
        session_id: String,
        hostname: String,
        pid: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instrumentation_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ingestion_url: Option<String>,
    },
    Report {
        sent_at: DateTime<Utc>,
        report: ReportState,
    },
    Metric {
        sent_at: DateTime<Utc>,
        metric: Metric,
    },
}

impl SinkEnvelope {
    pub fn report(report: &ReportState) -> Self {
        Self::Report {
            sent_at: Utc::now(),
            report: report.clone(),
        }
    }

    pub fn metric(metric: &Metric) -> Self {
        Self::Metric {
            sent_at: Utc::now(),
            metric: metric.clone(),
        }
    }
}

/// Encode an envelope as a delimited frame.
pub fn encode_frame(envelope: &SinkEnvelope) -> Result<Vec<u8>, SinkError> {
    let mut frame = serde_json::to_vec(envelope)?;
    frame.push(DELIMITER);
    if frame.len() > MAX_FRAME_SIZE {
        return Err(SinkError::MessageTooLarge {
            size: frame.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(frame)
}

/// Decode a single frame, with or without its trailing delimiter.
pub fn decode_frame(bytes: &[u8]) -> Result<SinkEnvelope, SinkError> {
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(SinkError::MessageTooLarge {
            size: bytes.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    let body = bytes.strip_suffix(&[DELIMITER]).unwrap_or(bytes);
    Ok(serde_json::from_slice(body)?)
}
