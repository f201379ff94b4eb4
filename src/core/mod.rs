pub mod samples;
pub mod traits;
