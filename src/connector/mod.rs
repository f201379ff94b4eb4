pub mod flow;
pub mod manifold;
pub mod valve;
