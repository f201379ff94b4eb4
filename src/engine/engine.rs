use crate::connector::manifold::FrictionCoeffs;
use crate::core::traits::SampleSink;
use crate::engine::json_reader::{Controls, EngineConfig, RPM_RANGE};
use crate::error::SimError;
use crate::zero_dim::cylinder::{CycleOutput, Cylinder};
use crate::zero_dim::environment::{AmbientConditions, AmbientInputs};
use ansi_term::Style;

/// Per-tick driver: keeps ambient air and passage friction up to date and runs
/// one full cycle of the requested cylinder.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    cylinders: Vec<Cylinder>,
    ambient: AmbientConditions,
    friction: Vec<FrictionCoeffs>, // one per cylinder
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Engine, SimError> {
        config.validate()?;
        let ambient = AmbientConditions::new(&config.environment)?;
        let cylinders = (0..config.cylinders)
            .map(|i| Cylinder::new(format!("cyl_{}", i + 1), i, &config))
            .collect::<Result<Vec<_>, _>>()?;
        let mut engine = Engine {
            config,
            cylinders,
            ambient,
            friction: Vec::new(),
        };
        engine.refresh_friction_coefficients();
        log::debug!(
            "engine with {} cylinder(s), {:.1} cm³ each",
            engine.cylinders.len(),
            engine.config.bottom_end.displacement_volume() * 1e6
        );
        Ok(engine)
    }

    pub fn from_json_file(file_name: &str) -> Result<Engine, SimError> {
        Engine::new(EngineConfig::from_json_file(file_name)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cylinders(&self) -> &[Cylinder] {
        &self.cylinders
    }

    /// Mutable access, e.g. to swap a stroke model.
    pub fn cylinder_mut(&mut self, index: usize) -> Option<&mut Cylinder> {
        self.cylinders.get_mut(index)
    }

    pub fn ambient(&self) -> &AmbientConditions {
        &self.ambient
    }

    /// Friction coefficients of the first cylinder's passages.
    pub fn friction_coefficients(&self) -> FrictionCoeffs {
        self.friction[0]
    }

    pub fn cylinder_friction_coefficients(&self, index: usize) -> Option<FrictionCoeffs> {
        self.friction.get(index).copied()
    }

    /// Re-derives the passage friction coefficients from the manifold geometry.
    pub fn refresh_friction_coefficients(&mut self) {
        let intake = &self.config.intake;
        let exhaust = &self.config.exhaust;
        self.friction = (0..self.config.cylinders)
            .map(|i| FrictionCoeffs {
                intake: intake.friction_coeff(i),
                exhaust: exhaust.friction_coeff(i),
            })
            .collect();
    }

    /// Re-derives the ambient state from the stored inputs.
    pub fn refresh_ambient(&mut self) -> Result<(), SimError> {
        self.ambient = AmbientConditions::new(&self.config.environment)?;
        Ok(())
    }

    /// New outside-air inputs. On error the previous inputs are kept.
    pub fn set_ambient_inputs(&mut self, inputs: AmbientInputs) -> Result<(), SimError> {
        let ambient = AmbientConditions::new(&inputs)?;
        self.config.environment = inputs;
        self.ambient = ambient;
        Ok(())
    }

    /// One tick of the first cylinder.
    pub fn simulate_tick(&mut self, controls: &Controls) -> Result<CycleOutput, SimError> {
        self.simulate_cylinder(0, controls)
    }

    /// One tick of cylinder `index`, with a fresh cycle state.
    pub fn simulate_cylinder(
        &mut self,
        index: usize,
        controls: &Controls,
    ) -> Result<CycleOutput, SimError> {
        if index >= self.cylinders.len() {
            return Err(SimError::config(format!(
                "cylinder {} requested, but only {} configured",
                index,
                self.cylinders.len()
            )));
        }
        self.refresh_ambient()?;
        self.refresh_friction_coefficients();

        if controls.rpm() < RPM_RANGE.0 {
            log::warn!(
                "{} RPM is below {} RPM, the per-degree time step may make the passage flow unstable",
                controls.rpm(),
                RPM_RANGE.0
            );
        } else if !controls.in_host_range() {
            log::warn!(
                "controls outside the host range: throttle {}, {} RPM",
                controls.throttle(),
                controls.rpm()
            );
        }

        let friction = self.friction[index];
        log::debug!(
            "ambient {:.1} Pa, {:.4} kg/m³; friction intake {:.5}, exhaust {:.5}",
            self.ambient.pressure(),
            self.ambient.density(),
            friction.intake,
            friction.exhaust
        );
        let output = self.cylinders[index].run_cycle(&self.ambient, friction, controls)?;
        log::debug!(
            "{}: MEP {:.3} at throttle {}, {} RPM",
            self.cylinders[index].name(),
            output.mep,
            controls.throttle(),
            controls.rpm()
        );
        Ok(output)
    }

    /// Runs a tick, hands its samples to `sink` and returns the MEP.
    pub fn publish_tick(
        &mut self,
        controls: &Controls,
        sink: &mut dyn SampleSink,
    ) -> Result<f64, SimError> {
        let output = self.simulate_tick(controls)?;
        sink.publish(&output.samples)?;
        Ok(output.mep)
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", Style::new().bold().paint("Engine"))?;
        writeln!(f, "{}", self.ambient)?;
        for (cylinder, friction) in self.cylinders.iter().zip(self.friction.iter()) {
            writeln!(f, "{}", cylinder)?;
            writeln!(
                f,
                "        friction coeffs: intake {:.5} \t exhaust {:.5}",
                friction.intake, friction.exhaust
            )?;
        }
        Ok(())
    }
}
