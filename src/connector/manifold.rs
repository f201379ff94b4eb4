//! Intake manifold and exhaust header/pipe geometry, reduced to an equivalent straight duct per cylinder.

use crate::error::SimError;
use crate::numerics::units;
use serde::{Deserialize, Serialize};

/// Equivalent straight duct between the cylinder and the atmosphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duct {
    pub length: f64,   // [m]
    pub volume: f64,   // [m³]
    pub area: f64,     // [m²] - average cross section
    pub diameter: f64, // [m] - diameter of the average cross section
}

/// Friction coefficients of the intake and exhaust passages of one cylinder.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrictionCoeffs {
    pub intake: f64,
    pub exhaust: f64,
}

/// Moody friction coefficient of a manifold.
///
/// `design_quality` in [0, 1] corrects for bends and junctions; at the nominal 0.5 the
/// straight-pipe value is kept.
pub fn moody_friction_coeff(diameter: f64, roughness: f64, design_quality: f64) -> f64 {
    let quality_correction = (0.5 - design_quality) / 2.0 + 1.0;
    (1.14 + 2.0 * (diameter / roughness).log10()).powf(-2.0) * quality_correction
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct IntakeGeometry {
    pub length: Vec<f64>,            // per cylinder [m]
    pub individual_volume: Vec<f64>, // per cylinder [m³]
    pub shared_volume: f64,          // [m³]
    pub roughness: f64,              // [m]
    pub design_quality: f64,         // [0, 1]
}

impl Default for IntakeGeometry {
    fn default() -> Self {
        IntakeGeometry {
            length: vec![0.15],
            individual_volume: vec![0.0005],
            shared_volume: 0.00225,
            roughness: 0.00012,
            design_quality: 0.5,
        }
    }
}

impl IntakeGeometry {
    pub fn validate(&self, cylinders: usize) -> Result<(), SimError> {
        if self.length.len() < cylinders || self.individual_volume.len() < cylinders {
            return Err(SimError::config(format!(
                "intake `length` ({}) and `individual_volume` ({}) need one entry per cylinder ({})",
                self.length.len(),
                self.individual_volume.len(),
                cylinders
            )));
        }
        if self.length[..cylinders].iter().any(|l| *l <= 0.0) {
            return Err(SimError::config("intake `length` must be greater than zero"));
        }
        if self.individual_volume[..cylinders]
            .iter()
            .any(|v| self.shared_volume + v <= 0.0)
        {
            return Err(SimError::config("intake volume must be greater than zero"));
        }
        if self.roughness <= 0.0 {
            return Err(SimError::config("intake `roughness` must be greater than zero"));
        }
        Ok(())
    }

    /// Intake passage of `cylinder`: shared plus individual manifold volume spread over its length.
    pub fn duct(&self, cylinder: usize) -> Duct {
        let volume = self.shared_volume + self.individual_volume[cylinder];
        let length = self.length[cylinder];
        let area = volume / length;
        Duct {
            length,
            volume,
            area,
            diameter: 2.0 * units::area_to_radius(area),
        }
    }

    /// Friction coefficient of the intake passage, evaluated at the manifold radius.
    pub fn friction_coeff(&self, cylinder: usize) -> f64 {
        let radius = units::area_to_radius(self.duct(cylinder).area);
        moody_friction_coeff(radius, self.roughness, self.design_quality)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Muffler {
    None,
}

impl Default for Muffler {
    fn default() -> Self {
        Muffler::None
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExhaustGeometry {
    pub pipe_length: Vec<f64>,          // per pipe [m]
    pub cylinder_to_pipe: Vec<usize>,   // cylinder index -> pipe index
    pub pipe_diameter: f64,             // [m]
    pub header_length: Vec<f64>,        // per cylinder [m]
    pub header_diameter: f64,           // [m]
    pub muffler: Muffler,
    pub roughness: f64,                 // [m]
    pub design_quality: f64,            // [0, 1]
}

impl Default for ExhaustGeometry {
    fn default() -> Self {
        ExhaustGeometry {
            pipe_length: vec![1.5],
            cylinder_to_pipe: vec![0],
            pipe_diameter: 0.05,
            header_length: vec![0.2],
            header_diameter: 0.03,
            muffler: Muffler::None,
            roughness: 0.0007,
            design_quality: 0.5,
        }
    }
}

impl ExhaustGeometry {
    pub fn validate(&self, cylinders: usize) -> Result<(), SimError> {
        if self.cylinder_to_pipe.len() < cylinders || self.header_length.len() < cylinders {
            return Err(SimError::config(format!(
                "exhaust `cylinder_to_pipe` ({}) and `header_length` ({}) need one entry per cylinder ({})",
                self.cylinder_to_pipe.len(),
                self.header_length.len(),
                cylinders
            )));
        }
        if let Some(pipe) = self.cylinder_to_pipe[..cylinders]
            .iter()
            .find(|pipe| **pipe >= self.pipe_length.len())
        {
            return Err(SimError::config(format!(
                "exhaust pipe {} does not exist, only {} configured",
                pipe,
                self.pipe_length.len()
            )));
        }
        if self.pipe_diameter <= 0.0 || self.header_diameter <= 0.0 {
            return Err(SimError::config("exhaust diameters must be greater than zero"));
        }
        for cyl in 0..cylinders {
            if self.header_length[cyl] + self.pipe_length[self.cylinder_to_pipe[cyl]] <= 0.0 {
                return Err(SimError::config(format!(
                    "exhaust of cylinder {} has no length",
                    cyl
                )));
            }
        }
        if self.roughness <= 0.0 {
            return Err(SimError::config("exhaust `roughness` must be greater than zero"));
        }
        Ok(())
    }

    /// Exhaust passage of `cylinder`: its header followed by the pipe it is mapped to.
    pub fn duct(&self, cylinder: usize) -> Duct {
        let pipe_length = self.pipe_length[self.cylinder_to_pipe[cylinder]];
        let header_length = self.header_length[cylinder];
        let volume = units::radius_to_area(self.pipe_diameter / 2.0) * pipe_length
            + units::radius_to_area(self.header_diameter / 2.0) * header_length;
        let length = header_length + pipe_length;
        let area = volume / length;
        Duct {
            length,
            volume,
            area,
            diameter: 2.0 * units::area_to_radius(area),
        }
    }

    pub fn friction_coeff(&self, cylinder: usize) -> f64 {
        moody_friction_coeff(self.duct(cylinder).diameter, self.roughness, self.design_quality)
    }
}
