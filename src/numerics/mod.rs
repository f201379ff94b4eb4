//! Numerical helpers shared by the physics modules
pub mod units;
