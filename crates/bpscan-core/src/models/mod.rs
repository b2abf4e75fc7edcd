//! Data models shared across the pipeline.

pub mod config;
pub mod reading;

pub use config::{BpscanConfig, ExtractionConfig, PromptMode, ProviderKind, ServerConfig, VisionConfig};
pub use reading::{Bounds, Field, Reading, DIA_BOUNDS, PULSE_BOUNDS, SYS_BOUNDS};
