use crate::connector::flow;
use crate::connector::manifold::{Duct, FrictionCoeffs};
use crate::connector::valve::{ValveTiming, CYCLE_DEGREES};
use crate::core::samples::{SampleRecord, SampleSeries};
use crate::engine::json_reader::{Controls, EngineConfig};
use crate::error::SimError;
use crate::numerics::units;
use crate::reaction::gas::{self, GasState};
use crate::reaction::stroke::{self, StrokeContext, StrokeModel};
use crate::zero_dim::environment::AmbientConditions;
use ansi_term::Style;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One step per crank degree
pub const STEPS_PER_CYCLE: usize = 720;

/// Bottom end of the engine. Lengths in m.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineGeometry {
    pub stroke: f64,            // [m]
    pub bore: f64,              // [m]
    pub compression_ratio: f64, // [-]
    pub rod_length: f64,        // [m]
}

impl Default for EngineGeometry {
    fn default() -> Self {
        EngineGeometry {
            stroke: 0.0634,
            bore: 0.095,
            compression_ratio: 11.9,
            rod_length: 0.114,
        }
    }
}

impl EngineGeometry {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.stroke <= 0.0 || self.bore <= 0.0 {
            return Err(SimError::config(format!(
                "stroke ({} m) and bore ({} m) must be greater than zero",
                self.stroke, self.bore
            )));
        }
        if self.compression_ratio <= 1.0 {
            return Err(SimError::config(format!(
                "compression ratio must be greater than one, got {}",
                self.compression_ratio
            )));
        }
        if self.rod_length <= self.crank_radius() {
            return Err(SimError::config(format!(
                "rod length ({} m) must exceed the crank radius ({} m)",
                self.rod_length,
                self.crank_radius()
            )));
        }
        Ok(())
    }

    pub fn crank_radius(&self) -> f64 {
        self.stroke / 2.0
    }

    /// [m²]
    pub fn bore_area(&self) -> f64 {
        units::radius_to_area(self.bore / 2.0)
    }

    /// Swept volume [m³]
    pub fn displacement_volume(&self) -> f64 {
        PI * (self.bore / 2.0).powi(2) * self.stroke
    }

    /// Chamber volume left at TDC [m³]
    pub fn clearance_volume(&self) -> f64 {
        self.displacement_volume() / (self.compression_ratio - 1.0)
    }

    /// Chamber volume at BDC [m³]
    pub fn total_volume(&self) -> f64 {
        self.displacement_volume() + self.clearance_volume()
    }

    /// Distance from the crank axis to the piston pin at TDC [m]
    pub fn max_piston_extension(&self) -> f64 {
        self.crank_radius() + self.rod_length
    }

    /// Distance from the crank axis to the piston pin. `angle` in CA rad, zero at TDC.
    pub fn piston_position(&self, angle: f64) -> f64 {
        let r = self.crank_radius();
        let l = self.rod_length;
        r * angle.cos() + (l * l - r * r * angle.sin() * angle.sin()).sqrt()
    }

    /// Piston travel from TDC [m]
    pub fn piston_displacement(&self, angle: f64) -> f64 {
        self.max_piston_extension() - self.piston_position(angle)
    }

    /// Time derivative of `piston_position` [m/s], positive towards TDC.
    pub fn piston_velocity(&self, angle: f64, rpm: f64) -> f64 {
        let r = self.crank_radius();
        let l = self.rod_length;
        let (sin, cos) = angle.sin_cos();
        let d_position = -r * sin - (r * r * sin * cos) / (l * l - r * r * sin * sin).sqrt();
        d_position * angular_velocity(rpm)
    }

    /// [m³]
    pub fn chamber_volume(&self, angle: f64) -> f64 {
        self.piston_displacement(angle) * self.bore_area() + self.clearance_volume()
    }

    /// Rate at which the piston sweeps volume [m³/s]; negative while the chamber grows.
    pub fn chamber_volume_velocity(&self, angle: f64, rpm: f64) -> f64 {
        self.piston_velocity(angle, rpm) * self.bore_area()
    }

    /// Gas velocity the piston alone would drive through a passage of `area` [m²].
    /// Negative is into the cylinder.
    pub fn piston_driven_gas_velocity(&self, angle: f64, rpm: f64, area: f64) -> f64 {
        flow::linear_velocity_through_orifice(self.chamber_volume_velocity(angle, rpm), area)
    }
}

/// Crank angular velocity [rad/s]
pub fn angular_velocity(rpm: f64) -> f64 {
    2.0 * PI * rpm / 60.0
}

/// Crank angle [rad] reached from `angle` after `secs` at constant `rpm`.
pub fn crank_angle_after(rpm: f64, angle: f64, secs: f64) -> f64 {
    angle + angular_velocity(rpm) * secs
}

/// Running state of one cylinder through one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleState {
    pub step: usize,            // [CA deg]
    pub pressure: f64,          // [Pa]
    pub temperature: f64,       // [K]
    pub intake_velocity: f64,   // [m/s]
    pub exhaust_velocity: f64,  // [m/s]
    pub friction: FrictionCoeffs,
}

impl CycleState {
    /// Chamber filled with still ambient air.
    pub fn initial(ambient: &AmbientConditions, friction: FrictionCoeffs) -> CycleState {
        CycleState {
            step: 0,
            pressure: ambient.pressure(),
            temperature: ambient.temperature(),
            intake_velocity: 0.0,
            exhaust_velocity: 0.0,
            friction,
        }
    }

    pub fn gas(&self) -> GasState {
        GasState {
            pressure: self.pressure,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CycleOutput {
    /// Mean of the absolute chamber pressure over the cycle, in kPa
    pub mep: f64,
    pub samples: SampleSeries,
    pub final_state: CycleState,
}

/// One cylinder and its passages, integrated one crank degree at a time.
#[derive(Clone)]
pub struct Cylinder {
    name: String,
    index: usize,
    geometry: EngineGeometry,
    timing: ValveTiming,
    intake: Duct,
    exhaust: Duct,
    models: Vec<Box<dyn StrokeModel>>,
}

impl Cylinder {
    /// Cylinder `index` of `config`. The whole configuration is validated first.
    pub fn new(name: String, index: usize, config: &EngineConfig) -> Result<Cylinder, SimError> {
        config.validate()?;
        if index >= config.cylinders {
            return Err(SimError::config(format!(
                "cylinder {} requested, but only {} configured",
                index, config.cylinders
            )));
        }
        Ok(Cylinder {
            name,
            index,
            geometry: config.bottom_end.clone(),
            timing: config.top_end.clone(),
            intake: config.intake.duct(index),
            exhaust: config.exhaust.duct(index),
            models: stroke::default_stroke_models(),
        })
    }

    pub fn name<'a>(&'a self) -> &'a str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn geometry(&self) -> &EngineGeometry {
        &self.geometry
    }

    pub fn timing(&self) -> &ValveTiming {
        &self.timing
    }

    pub fn intake_duct(&self) -> &Duct {
        &self.intake
    }

    pub fn exhaust_duct(&self) -> &Duct {
        &self.exhaust
    }

    pub fn stroke_models(&self) -> &[Box<dyn StrokeModel>] {
        &self.models
    }

    /// Replaces the model of the stroke `model` handles.
    pub fn set_stroke_model(&mut self, model: Box<dyn StrokeModel>) {
        match self.models.iter().position(|m| m.stroke() == model.stroke()) {
            Some(i) => self.models[i] = model,
            None => self.models.push(model),
        }
    }

    /// Integrates one full cycle from a chamber at ambient state.
    ///
    /// Every step first applies the polytropic change from the previous crank degree,
    /// then the models of all active strokes in intake, compression, combustion,
    /// exhaust order.
    pub fn run_cycle(
        &self,
        ambient: &AmbientConditions,
        friction: FrictionCoeffs,
        controls: &Controls,
    ) -> Result<CycleOutput, SimError> {
        let dt = (60.0 / controls.rpm()) / CYCLE_DEGREES; // [s]
        let ambient_press = ambient.pressure();
        let mut state = CycleState::initial(ambient, friction);
        let mut samples = SampleSeries::with_capacity(STEPS_PER_CYCLE);
        let mut pressure_sum = 0.0;

        for step in 0..STEPS_PER_CYCLE {
            state.step = step;
            let angle = step as f64; // [CA deg]
            let prev_angle = if step == 0 { CYCLE_DEGREES } else { angle - 1.0 };
            let angle_rad = units::degrees_to_radians(angle);
            let prev_volume = self
                .geometry
                .chamber_volume(units::degrees_to_radians(prev_angle));
            let volume = self.geometry.chamber_volume(angle_rad);

            let gas = gas::state_after_volume_step(state.gas(), prev_volume, volume);
            state.pressure = gas.pressure;
            state.temperature = gas.temperature;

            let active = self.timing.active_strokes(angle);
            log::trace!("{} step {}: {}", self.name, step, active);
            let ctx = StrokeContext {
                throttle: controls.throttle(),
                dt,
                chamber_volume: volume,
                ambient,
                intake: &self.intake,
                exhaust: &self.exhaust,
            };
            let mut friction_sample = 0.0;
            for stroke in active.iter() {
                for model in self.models.iter().filter(|m| m.stroke() == stroke) {
                    if let Some(sample) = model.apply(&mut state, &ctx) {
                        friction_sample = sample;
                    }
                }
            }

            pressure_sum += state.pressure;
            samples.push(SampleRecord {
                displacement: self.geometry.piston_displacement(angle_rad),
                pressure_delta: state.pressure - ambient_press,
                temperature: state.temperature,
                friction: friction_sample,
            });
        }

        let mep = pressure_sum / CYCLE_DEGREES / 1000.0;
        if !mep.is_finite() {
            return Err(SimError::degenerate(format!(
                "{} produced a non-finite MEP at {} RPM, throttle {}",
                self.name,
                controls.rpm(),
                controls.throttle()
            )));
        }
        Ok(CycleOutput {
            mep,
            samples,
            final_state: state,
        })
    }
}

impl std::fmt::Display for Cylinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let models: Vec<&str> = self.models.iter().map(|m| m.model_name()).collect();
        write!(
            f,
            "{} (#{}):
        {} \t\t\t {}
        bore: {:.1} [mm] \t\t\t intake open/close: {:.0}/{:.0} [CA deg]
        stroke: {:.1} [mm] \t\t\t exhaust open/close: {:.0}/{:.0} [CA deg]
        rod length: {:.1} [mm] \t\t ignition: {:.0} [CA deg]
        displacement: {:.1} [cm³]
        compression ratio: {:.1}
        intake duct: {:.3} [m] x {:.1} [mm]
        exhaust duct: {:.3} [m] x {:.1} [mm]
        models: {}",
            Style::new().bold().paint(&self.name),
            self.index,
            Style::new().underline().paint("     Geometry     "),
            Style::new().underline().paint("      Timing      "),
            self.geometry.bore * 1e3,
            self.timing.intake_open,
            self.timing.intake_close,
            self.geometry.stroke * 1e3,
            self.timing.exhaust_open,
            self.timing.exhaust_close,
            self.geometry.rod_length * 1e3,
            self.timing.ignition_timing,
            units::m3_to_cm3(self.geometry.displacement_volume()),
            self.geometry.compression_ratio,
            self.intake.length,
            self.intake.diameter * 1e3,
            self.exhaust.length,
            self.exhaust.diameter * 1e3,
            models.join(", "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::stroke::CombustionStroke;
    use crate::zero_dim::environment::AmbientInputs;

    fn rel_err(a: f64, b: f64) -> f64 {
        ((a - b) / b).abs()
    }

    fn setup() -> (Cylinder, AmbientConditions, FrictionCoeffs) {
        let config = EngineConfig::default();
        let cylinder = Cylinder::new("cyl_1".to_string(), 0, &config).unwrap();
        let ambient = AmbientConditions::new(&AmbientInputs::default()).unwrap();
        let friction = FrictionCoeffs {
            intake: config.intake.friction_coeff(0),
            exhaust: config.exhaust.friction_coeff(0),
        };
        (cylinder, ambient, friction)
    }

    #[test]
    fn chamber_volume_at_dead_centers() {
        let geo = EngineGeometry::default();
        assert!(rel_err(geo.chamber_volume(0.0), geo.clearance_volume()) < 1e-9);
        assert!(rel_err(geo.chamber_volume(PI), geo.total_volume()) < 1e-9);
        assert!(rel_err(geo.chamber_volume(4.0 * PI), geo.clearance_volume()) < 1e-9);
        assert!(geo.piston_displacement(0.0).abs() < 1e-12);
        assert!(rel_err(geo.total_volume() / geo.clearance_volume(), 11.9) < 1e-12);
    }

    #[test]
    fn piston_velocity_is_derivative_of_position() {
        let geo = EngineGeometry::default();
        let rpm = 3000.0;
        let omega = angular_velocity(rpm);
        for deg in [10.0, 75.0, 160.0, 250.0, 330.0].iter() {
            let angle = units::degrees_to_radians(*deg);
            let h = 1e-6;
            let numeric = (geo.piston_position(angle + h) - geo.piston_position(angle - h))
                / (2.0 * h)
                * omega;
            assert!(
                (geo.piston_velocity(angle, rpm) - numeric).abs() < 1e-5,
                "at {} deg",
                deg
            );
        }
        assert!(geo.piston_velocity(0.0, rpm).abs() < 1e-12);
        assert_eq!(
            geo.chamber_volume_velocity(1.0, rpm),
            geo.piston_velocity(1.0, rpm) * geo.bore_area()
        );
        let area = 0.002;
        assert!(
            (geo.piston_driven_gas_velocity(1.0, rpm, area)
                - geo.chamber_volume_velocity(1.0, rpm) / area)
                .abs()
                < 1e-12
        );
    }

    #[test]
    fn crank_turns_once_per_revolution_time() {
        let after = crank_angle_after(3000.0, 0.0, 60.0 / 3000.0);
        assert!((after - 2.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn geometry_validation() {
        assert!(EngineGeometry::default().validate().is_ok());
        let short_rod = EngineGeometry {
            rod_length: 0.03,
            ..EngineGeometry::default()
        };
        assert!(short_rod.validate().is_err());
        let flat = EngineGeometry {
            compression_ratio: 1.0,
            ..EngineGeometry::default()
        };
        assert!(flat.validate().is_err());
    }

    #[test]
    fn full_cycle_gives_positive_mep() {
        let (cylinder, ambient, friction) = setup();
        let controls = Controls::new(1.0, 3000.0).unwrap();
        let out = cylinder.run_cycle(&ambient, friction, &controls).unwrap();
        assert!(out.mep.is_finite() && out.mep > 0.0);
        assert_eq!(out.samples.len(), STEPS_PER_CYCLE);
        assert_eq!(out.samples.pressure_channel().len(), STEPS_PER_CYCLE);
        assert_eq!(out.samples.temperature_channel().len(), STEPS_PER_CYCLE);
        assert_eq!(out.samples.friction_channel().len(), STEPS_PER_CYCLE);
        assert_eq!(out.final_state.step, STEPS_PER_CYCLE - 1);

        let first = out.samples.records()[0];
        assert!(first.displacement.abs() < 1e-12);
        // both passages start at rest
        assert_eq!(first.friction, 0.0);
        // closed valves on the compression stroke
        assert_eq!(out.samples.records()[300].friction, 0.0);
    }

    #[test]
    fn identical_inputs_are_reproducible() {
        let (cylinder, ambient, friction) = setup();
        let controls = Controls::new(0.6, 4200.0).unwrap();
        let a = cylinder.run_cycle(&ambient, friction, &controls).unwrap();
        let b = cylinder.run_cycle(&ambient, friction, &controls).unwrap();
        assert_eq!(a.mep, b.mep);
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn throttle_raises_mep() {
        let (cylinder, ambient, friction) = setup();
        let closed = cylinder
            .run_cycle(&ambient, friction, &Controls::new(0.0, 3000.0).unwrap())
            .unwrap();
        let open = cylinder
            .run_cycle(&ambient, friction, &Controls::new(1.0, 3000.0).unwrap())
            .unwrap();
        assert!(open.mep > closed.mep);
    }

    #[test]
    fn combustion_model_can_be_swapped() {
        let (mut cylinder, ambient, friction) = setup();
        let controls = Controls::new(1.0, 3000.0).unwrap();
        let fired = cylinder.run_cycle(&ambient, friction, &controls).unwrap();
        cylinder.set_stroke_model(Box::new(CombustionStroke::new(0.0)));
        assert_eq!(cylinder.stroke_models().len(), 4);
        let motored = cylinder.run_cycle(&ambient, friction, &controls).unwrap();
        assert!(motored.mep < fired.mep);
    }

    #[test]
    fn unknown_cylinder_is_rejected() {
        let config = EngineConfig::default();
        assert!(Cylinder::new("cyl_2".to_string(), 1, &config).is_err());
    }

    #[test]
    fn unvalidated_config_is_an_error_not_a_panic() {
        let config = EngineConfig {
            cylinders: 2,
            ..EngineConfig::default()
        };
        match Cylinder::new("cyl_2".to_string(), 1, &config) {
            Err(SimError::Configuration(_)) => (),
            Err(err) => panic!("expected a configuration error, got {}", err),
            Ok(_) => panic!("two cylinders accepted with single-entry manifold arrays"),
        }
    }
}
