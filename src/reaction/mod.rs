pub mod gas;
pub mod stroke;
