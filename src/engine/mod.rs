pub mod engine;
pub mod json_reader;
