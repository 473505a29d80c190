//! Capture sequence file loading.
//!
//! A sequence file describes one target's capture plan: an optional
//! in-sequence autofocus flag and a list of capture sets (filter, count,
//! exposure, storage signature). The duration estimator loads it on every
//! evaluation pass; a file that cannot be read or parsed is a
//! configuration fault and moves the owning job to the INVALID state.

use std::path::Path;

use crate::error::PlanningError;
use crate::models::{FrameType, SequenceQueue};

/// Load and validate a sequence file.
pub fn load_sequence_queue(path: &Path) -> Result<SequenceQueue, PlanningError> {
    let text = std::fs::read_to_string(path).map_err(|e| PlanningError::InvalidSequence {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_sequence_queue(&text).map_err(|reason| PlanningError::InvalidSequence {
        path: path.display().to_string(),
        reason,
    })
}

/// Parse sequence JSON. Subjobs without an explicit signature get a
/// deterministic one derived from frame type, filter and exposure, the
/// same discriminators the capture module's storage paths carry. The
/// captured-frames ledger then has a stable key for every capture set,
/// and sets that share storage also share a signature.
pub fn parse_sequence_queue(text: &str) -> Result<SequenceQueue, String> {
    let mut queue: SequenceQueue = serde_json::from_str(text).map_err(|e| e.to_string())?;
    if queue.jobs.is_empty() {
        return Err("sequence contains no capture sets".into());
    }
    for subjob in &mut queue.jobs {
        if subjob.count == 0 {
            return Err(format!("capture set '{}' has zero count", subjob.filter));
        }
        if subjob.exposure_secs < 0.0 || subjob.delay_secs < 0.0 {
            return Err(format!("capture set '{}' has a negative duration", subjob.filter));
        }
        if subjob.signature.is_empty() {
            let kind = match subjob.frame_type {
                FrameType::Light => "Light",
                FrameType::Dark => "Dark",
                FrameType::Flat => "Flat",
                FrameType::Bias => "Bias",
                FrameType::DarkFlat => "DarkFlat",
            };
            subjob.signature = format!("{}/{}_{}s", kind, subjob.filter, subjob.exposure_secs);
        }
    }
    Ok(queue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadMode;
    use std::io::Write;

    const SEQ: &str = r#"{
        "autofocus": true,
        "jobs": [
            { "filter": "Lum", "exposure_secs": 60.0, "count": 6,
              "signature": "/imgs/Target/Light/Lum" },
            { "filter": "Red", "exposure_secs": 90.0, "count": 7, "delay_secs": 1.5,
              "upload_mode": "remote" }
        ]
    }"#;

    #[test]
    fn parses_sequence_and_fills_missing_signatures() {
        let queue = parse_sequence_queue(SEQ).unwrap();
        assert!(queue.autofocus);
        assert_eq!(queue.jobs.len(), 2);
        assert_eq!(queue.jobs[0].signature, "/imgs/Target/Light/Lum");
        assert_eq!(queue.jobs[1].signature, "Light/Red_90s");
        assert_eq!(queue.jobs[1].upload_mode, UploadMode::Remote);
        assert_eq!(queue.initial_filter(), Some("Lum"));
    }

    #[test]
    fn rejects_empty_and_zero_count_sequences() {
        assert!(parse_sequence_queue(r#"{"jobs": []}"#).is_err());
        assert!(parse_sequence_queue(
            r#"{"jobs": [{"filter": "L", "exposure_secs": 10.0, "count": 0}]}"#
        )
        .is_err());
    }

    #[test]
    fn load_reports_missing_file_as_invalid_sequence() {
        let err = load_sequence_queue(Path::new("/nonexistent/seq.json")).unwrap_err();
        assert!(matches!(err, PlanningError::InvalidSequence { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEQ.as_bytes()).unwrap();
        let queue = load_sequence_queue(file.path()).unwrap();
        assert_eq!(queue.jobs.len(), 2);
    }
}
