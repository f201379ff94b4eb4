pub mod cylinder;
pub mod environment;
