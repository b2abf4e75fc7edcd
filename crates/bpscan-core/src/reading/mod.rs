//! Blood-pressure reading extraction from recognized text.

mod extractor;
pub mod rules;

pub use extractor::{
    extract_reading, ExtractionResult, ExtractionWarning, PulseSource, ReadingExtractor,
};
pub use rules::Strategy;
