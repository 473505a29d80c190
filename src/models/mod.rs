//! Data model: jobs, capture sequences, obstruction horizon.

pub mod horizon;
pub mod job;
pub mod sequence;
pub mod types;

pub use horizon::{ArtificialHorizon, HorizonPoint};
pub use job::{
    setup_job, Job, JobId, JobList, JobSchedule, JobSetup, StartTimeCache, Timestamp,
    UNDEFINED_ALTITUDE,
};
pub use sequence::{CaptureSubjob, CapturedFramesMap, FrameType, SequenceQueue, UploadMode};
pub use types::{
    CompletionCondition, EstimatedDuration, JobStage, JobState, StartupCondition, StepPipeline,
};
