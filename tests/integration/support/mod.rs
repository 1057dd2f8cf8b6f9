
pub use recording_extractor::RecordingExtractor;
