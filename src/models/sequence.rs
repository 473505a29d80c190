//! Capture sequences and the captured-frames ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Frame type of one capture set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    #[default]
    Light,
    Dark,
    Flat,
    Bias,
    #[serde(rename = "darkflat")]
    DarkFlat,
}

/// Where the camera stores captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Files land on the machine running the planner.
    #[default]
    Local,
    /// Files are transferred to the controlling client.
    Client,
    /// Files stay on a remote camera host; progress is not observable here.
    Remote,
}

/// One capture set of a sequence file: how many frames of which exposure
/// through which filter, and the storage signature they accumulate under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSubjob {
    pub filter: String,
    pub exposure_secs: f64,
    pub count: u32,
    #[serde(default)]
    pub delay_secs: f64,
    #[serde(default)]
    pub frame_type: FrameType,
    #[serde(default)]
    pub upload_mode: UploadMode,
    /// Storage-location key; frames captured for this subjob are counted
    /// under this signature on disk.
    #[serde(default)]
    pub signature: String,
    /// Whether this calibration set demands the mount be parked first.
    #[serde(default)]
    pub park_mount: bool,
}

impl CaptureSubjob {
    /// Seconds one capture takes, exposure plus inter-frame delay.
    pub fn secs_per_capture(&self) -> f64 {
        self.exposure_secs + self.delay_secs
    }
}

/// A parsed sequence file: the capture sets plus whether in-sequence
/// autofocus is enabled for the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceQueue {
    #[serde(default)]
    pub autofocus: bool,
    pub jobs: Vec<CaptureSubjob>,
}

impl SequenceQueue {
    /// Filter name of the first LIGHT capture set, if any. Passed to the
    /// executor's focus phase as the starting filter.
    pub fn initial_filter(&self) -> Option<&str> {
        self.jobs
            .iter()
            .find(|j| j.frame_type == FrameType::Light)
            .map(|j| j.filter.as_str())
    }
}

/// Counts of already-captured frames on disk, keyed by capture signature.
/// Built externally by scanning the output directory; consumed by the
/// duration estimator to resume interrupted work.
pub type CapturedFramesMap = HashMap<String, u32>;
