pub mod device_finder;
pub mod pipeline;

pub use device_finder::DeviceFinder;
pub use pipeline::{AccessSnapshot, PipelineConfig, PipelineError, PipelineOutcome, RequestPipeline};
