//! Per-stroke update rules applied to the chamber charge on every crank step.
//!
//! The polytropic volume change has already been applied when a stroke runs, so each
//! model only adds what its stroke contributes: gas flowing through the intake or
//! exhaust passage, or the combustion pressure rise.

use super::gas::{self, GasState};
use crate::connector::flow;
use crate::connector::manifold::Duct;
use crate::connector::valve::Stroke;
use crate::zero_dim::cylinder::CycleState;
use crate::zero_dim::environment::AmbientConditions;
use dyn_clone::DynClone;

/// Pressure added while the combustion stroke is active [Pa]
pub const COMBUSTION_PRESSURE_RISE: f64 = 10000.0;
/// Extra weight of the friction velocity loss in the exhaust passage
const EXHAUST_FRICTION_LOSS_SCALE: f64 = 100.0;

/// Inputs that stay fixed while one crank step is being resolved.
#[derive(Debug, Clone, Copy)]
pub struct StrokeContext<'a> {
    pub throttle: f64,       // [0, 1]
    pub dt: f64,             // [s] - time of one crank degree
    pub chamber_volume: f64, // [m³] - at the current crank angle
    pub ambient: &'a AmbientConditions,
    pub intake: &'a Duct,
    pub exhaust: &'a Duct,
}

pub trait StrokeModel: DynClone {
    fn model_name<'a>(&'a self) -> &'a str;
    /// Stroke this model is applied on
    fn stroke(&self) -> Stroke;
    /// Updates `state` in place. Returns the friction force sample for plotting, if the
    /// model computes one.
    fn apply(&self, state: &mut CycleState, ctx: &StrokeContext) -> Option<f64>;
}

dyn_clone::clone_trait_object!(StrokeModel);

/// The default models, one per stroke, in application order.
pub fn default_stroke_models() -> Vec<Box<dyn StrokeModel>> {
    vec![
        Box::new(IntakeStroke::new()) as Box<dyn StrokeModel>,
        Box::new(CompressionStroke::new()),
        Box::new(CombustionStroke::new(COMBUSTION_PRESSURE_RISE)),
        Box::new(ExhaustStroke::new()),
    ]
}

/// Result of the intake update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntakeFlow {
    pub pressure: f64,        // [Pa]
    pub temperature: f64,     // [K] - chamber, after mixing
    pub velocity: f64,        // [m/s] - positive into the chamber
    pub friction_sample: f64, // friction force x 1000
    pub gas_mass: f64,        // [kg] - drawn in during this step
    pub gas_temp: f64,        // [K] - of the drawn gas
    pub reynolds: f64,
}

/// Result of the exhaust update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExhaustFlow {
    pub pressure: f64,        // [Pa]
    pub velocity: f64,        // [m/s] - positive into the chamber
    pub friction_sample: f64, // friction pressure drop x 1000
    pub gas_mass: f64,        // [kg] - negative when gas leaves the chamber
    pub reynolds: f64,
}

/// Gas slug in the intake manifold accelerated by the ambient-to-chamber pressure difference.
///
/// Throttle does not model a valve: it scales how much of the net acceleration reaches
/// the flow, the rest is lost together with the friction deceleration. The lost kinetic
/// energy heats the incoming gas.
pub fn intake_flow(
    charge: GasState,
    velocity: f64,
    friction_coeff: f64,
    ctx: &StrokeContext,
) -> IntakeFlow {
    let duct = ctx.intake;
    let density = ctx.ambient.density();
    let dt = ctx.dt;

    let press_diff = ctx.ambient.pressure() - charge.pressure;
    let mut accel_force = press_diff * duct.area;
    let reynolds = flow::reynolds_number(
        velocity.abs(),
        density,
        ctx.ambient.viscosity(),
        duct.diameter,
    );
    let friction_force =
        gas::friction_pressure_drop(friction_coeff, density, velocity, duct.length, duct.diameter)
            * duct.area;
    accel_force -= friction_force;

    let manifold_mass = duct.volume * density;
    let accel = accel_force / density;
    let accel_lost = friction_force / density;

    let mut velocity = velocity + (accel * dt) * ctx.throttle;
    let velocity_lost = (accel_lost * dt) + ((accel * dt) * (1.0 - ctx.throttle));
    velocity -= velocity_lost;

    let gas_mass = velocity * duct.area * dt * density;

    let volume_flow_lost = velocity_lost * duct.area;
    let energy_lost = 0.5 * manifold_mass * volume_flow_lost * volume_flow_lost;
    let temp_gain = (energy_lost / (manifold_mass * gas::AIR_SPECIFIC_HEAT)).abs();
    let gas_temp = ctx.ambient.temperature() + temp_gain;

    let mixed = gas::mix_into_chamber(charge, ctx.chamber_volume, gas_mass, gas_temp);
    IntakeFlow {
        pressure: mixed.pressure(),
        temperature: mixed.temperature,
        velocity,
        friction_sample: friction_force * 1000.0,
        gas_mass,
        gas_temp,
        reynolds,
    }
}

/// Exhaust counterpart of `intake_flow`.
///
/// Differs from the intake on purpose: no throttle, friction is not taken off the
/// accelerating force, and the friction loss always pulls the velocity towards zero,
/// weighted by `EXHAUST_FRICTION_LOSS_SCALE`. Chamber temperature is left unchanged.
pub fn exhaust_flow(
    charge: GasState,
    velocity: f64,
    friction_coeff: f64,
    ctx: &StrokeContext,
) -> ExhaustFlow {
    let duct = ctx.exhaust;
    let density = ctx.ambient.density();
    let dt = ctx.dt;

    let press_diff = ctx.ambient.pressure() - charge.pressure;
    let accel_force = press_diff * duct.area;
    let reynolds = flow::reynolds_number(
        velocity.abs(),
        density,
        ctx.ambient.viscosity(),
        duct.diameter,
    );
    let friction_force =
        gas::friction_pressure_drop(friction_coeff, density, velocity, duct.length, duct.diameter);

    let accel = accel_force / density;
    let accel_lost = friction_force / density;

    let mut velocity = velocity + accel * dt;
    let velocity_lost = accel_lost * dt * EXHAUST_FRICTION_LOSS_SCALE;
    if velocity > 0.0 {
        velocity -= velocity_lost;
    } else {
        velocity += velocity_lost;
    }

    let gas_mass = velocity * duct.area * dt * density;
    let mixed = gas::mix_into_chamber(charge, ctx.chamber_volume, gas_mass, charge.temperature);
    ExhaustFlow {
        pressure: gas::pressure_at_density(mixed.density, charge.temperature),
        velocity,
        friction_sample: friction_force * 1000.0,
        gas_mass,
        reynolds,
    }
}

#[derive(Debug, Clone)]
pub struct IntakeStroke {
    model_name: String,
}

impl IntakeStroke {
    pub fn new() -> IntakeStroke {
        IntakeStroke {
            model_name: "manifold momentum intake".to_string(),
        }
    }
}

impl StrokeModel for IntakeStroke {
    fn model_name<'a>(&'a self) -> &'a str {
        &self.model_name
    }
    fn stroke(&self) -> Stroke {
        Stroke::Intake
    }
    fn apply(&self, state: &mut CycleState, ctx: &StrokeContext) -> Option<f64> {
        let intake = intake_flow(
            state.gas(),
            state.intake_velocity,
            state.friction.intake,
            ctx,
        );
        log::trace!(
            "step {}: intake Re = {:.0}, {:.3e} kg at {:.1} K",
            state.step,
            intake.reynolds,
            intake.gas_mass,
            intake.gas_temp
        );
        state.pressure = intake.pressure;
        state.temperature = intake.temperature;
        state.intake_velocity = intake.velocity;
        Some(intake.friction_sample)
    }
}

/// Pass-through: the compression itself comes from the polytropic volume step.
#[derive(Debug, Clone)]
pub struct CompressionStroke {
    model_name: String,
}

impl CompressionStroke {
    pub fn new() -> CompressionStroke {
        CompressionStroke {
            model_name: "adiabatic compression".to_string(),
        }
    }
}

impl StrokeModel for CompressionStroke {
    fn model_name<'a>(&'a self) -> &'a str {
        &self.model_name
    }
    fn stroke(&self) -> Stroke {
        Stroke::Compression
    }
    fn apply(&self, _: &mut CycleState, _: &StrokeContext) -> Option<f64> {
        None
    }
}

/// Flat pressure rise on every combustion step, independent of throttle and mixture.
#[derive(Debug, Clone)]
pub struct CombustionStroke {
    model_name: String,
    pressure_rise: f64, // [Pa]
}

impl CombustionStroke {
    pub fn new(pressure_rise: f64) -> CombustionStroke {
        CombustionStroke {
            model_name: "constant pressure rise".to_string(),
            pressure_rise,
        }
    }
}

impl StrokeModel for CombustionStroke {
    fn model_name<'a>(&'a self) -> &'a str {
        &self.model_name
    }
    fn stroke(&self) -> Stroke {
        Stroke::Combustion
    }
    fn apply(&self, state: &mut CycleState, _: &StrokeContext) -> Option<f64> {
        state.pressure += self.pressure_rise;
        None
    }
}

#[derive(Debug, Clone)]
pub struct ExhaustStroke {
    model_name: String,
}

impl ExhaustStroke {
    pub fn new() -> ExhaustStroke {
        ExhaustStroke {
            model_name: "pipe momentum exhaust".to_string(),
        }
    }
}

impl StrokeModel for ExhaustStroke {
    fn model_name<'a>(&'a self) -> &'a str {
        &self.model_name
    }
    fn stroke(&self) -> Stroke {
        Stroke::Exhaust
    }
    fn apply(&self, state: &mut CycleState, ctx: &StrokeContext) -> Option<f64> {
        let exhaust = exhaust_flow(
            state.gas(),
            state.exhaust_velocity,
            state.friction.exhaust,
            ctx,
        );
        log::trace!(
            "step {}: exhaust Re = {:.0}, {:.3e} kg",
            state.step,
            exhaust.reynolds,
            exhaust.gas_mass
        );
        state.pressure = exhaust.pressure;
        state.exhaust_velocity = exhaust.velocity;
        Some(exhaust.friction_sample)
    }
}
