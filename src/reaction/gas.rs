//! Ideal-gas relations for the cylinder charge.
//!
//! The charge is treated as dry air: humidity only enters through the ambient density,
//! it is never re-derived here.

pub const SPECIFIC_GAS_CONST: f64 = 287.052; // dry air [J/(kg.K)]
pub const AIR_SPECIFIC_HEAT: f64 = 1.006; // [kJ/(kg.K)]
const POLYTROPIC_INDEX: f64 = 5.0 / 7.0; // diatomic gas

/// Pressure and temperature of the chamber charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasState {
    pub pressure: f64,    // [Pa]
    pub temperature: f64, // [K]
}

/// Chamber charge after a gas slug has been mixed in (or drawn out, for negative mass).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedCharge {
    pub density: f64,     // [kg/m³]
    pub temperature: f64, // [K]
}

impl MixedCharge {
    pub fn pressure(&self) -> f64 {
        pressure_at_density(self.density, self.temperature)
    }
}

/// `temp` in K
pub fn density_at_pressure(press: f64, temp: f64) -> f64 {
    press / (SPECIFIC_GAS_CONST * temp)
}

/// `temp` in K
pub fn pressure_at_density(density: f64, temp: f64) -> f64 {
    density * (SPECIFIC_GAS_CONST * temp)
}

/// Empirical fit of air viscosity against density, in kg/(m.s).
/// Only loosely accurate; it is not derived from kinetic theory.
pub fn air_viscosity_at_density(density: f64) -> f64 {
    ((1.0 / density) * 2.6).powf(0.78) * 1e-5
}

/// Darcy–Weisbach pressure drop along a duct of `length` and `diameter`.
pub fn friction_pressure_drop(
    friction_coeff: f64,
    density: f64,
    velocity: f64,
    length: f64,
    diameter: f64,
) -> f64 {
    (friction_coeff * density * velocity * velocity * length) / (2.0 * diameter)
}

/// Inverse of `friction_pressure_drop`: flow speed that produces `delta_press`.
pub fn velocity_for_pressure_drop(
    delta_press: f64,
    diameter: f64,
    density: f64,
    length: f64,
    friction_coeff: f64,
) -> f64 {
    ((delta_press * 2.0 * diameter) / (length * density * friction_coeff)).sqrt()
}

/// Adiabatic temperature after the charge goes from `prev_vol` to `vol`.
pub fn temperature_after_volume_change(prev_vol: f64, vol: f64, temp: f64) -> f64 {
    let ratio = vol / prev_vol;
    temp * ratio.powf(1.0 - 1.0 / POLYTROPIC_INDEX)
}

/// Polytropic compression/expansion of a closed charge between two chamber volumes.
/// The mass is conserved; temperature follows `temperature_after_volume_change`.
pub fn state_after_volume_step(prev: GasState, prev_vol: f64, vol: f64) -> GasState {
    let mass = prev_vol * density_at_pressure(prev.pressure, prev.temperature);
    let temperature = temperature_after_volume_change(prev_vol, vol, prev.temperature);
    GasState {
        pressure: pressure_at_density(mass / vol, temperature),
        temperature,
    }
}

/// Mass-weighted mix of `incoming_mass` at `incoming_temp` into the chamber charge.
pub fn mix_into_chamber(
    chamber: GasState,
    chamber_vol: f64,
    incoming_mass: f64,
    incoming_temp: f64,
) -> MixedCharge {
    let chamber_mass = density_at_pressure(chamber.pressure, chamber.temperature) * chamber_vol;
    let total_mass = chamber_mass + incoming_mass;
    let temperature = chamber.temperature * (chamber_mass / total_mass)
        + incoming_temp * (incoming_mass / total_mass);
    MixedCharge {
        density: total_mass / chamber_vol,
        temperature,
    }
}
