//! Sequence-file loading.

pub mod loaders;

pub use loaders::load_sequence_queue;
