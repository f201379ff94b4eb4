//! # cylinder_cycle_sim
//!
//! The `cylinder_cycle_sim` crate simulates the thermodynamic state of a single
//! four-stroke cylinder over one 720° cycle, one crank degree per step, and
//! reduces it to a mean effective pressure.
//!
//! ```no_run
//! use cylinder_cycle_sim::{Controls, Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! let out = engine.simulate_tick(&Controls::new(1.0, 3000.0).unwrap()).unwrap();
//! println!("MEP = {:.2}", out.mep);
//! ```

mod connector;
mod core;
mod engine;
mod error;
mod numerics;
mod reaction;
mod zero_dim;

// Re-exporting
pub use crate::connector::flow;
pub use crate::connector::manifold::{
    moody_friction_coeff, Duct, ExhaustGeometry, FrictionCoeffs, IntakeGeometry, Muffler,
};
pub use crate::connector::valve::{ActiveStrokes, Stroke, ValveTiming, CYCLE_DEGREES};
pub use crate::core::samples::{SampleRecord, SampleSeries};
pub use crate::core::traits::{SampleSink, SaveData};
pub use crate::engine::engine::Engine;
pub use crate::engine::json_reader::{Controls, EngineConfig, RPM_RANGE};
pub use crate::error::SimError;
pub use crate::numerics::units;
pub use crate::reaction::gas;
pub use crate::reaction::stroke::{
    default_stroke_models, exhaust_flow, intake_flow, CombustionStroke, CompressionStroke,
    ExhaustFlow, ExhaustStroke, IntakeFlow, IntakeStroke, StrokeContext, StrokeModel,
    COMBUSTION_PRESSURE_RISE,
};
pub use crate::zero_dim::cylinder::{
    angular_velocity, crank_angle_after, CycleOutput, CycleState, Cylinder, EngineGeometry,
    STEPS_PER_CYCLE,
};
pub use crate::zero_dim::environment::{
    absolute_humidity, barometric_pressure, AmbientConditions, AmbientInputs, AtmosphericLayer,
};
