pub mod constants;
pub mod filename;
pub mod progress;
pub mod rounding;

pub use constants::*;
pub use filename::generate_default_output_dir;
pub use progress::ProgressReporter;
pub use rounding::round_to;
