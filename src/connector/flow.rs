//! Bulk-flow relations for ducts and orifices.

/// Reynolds number of a flow through a pipe of `diameter`.
///
/// Only used for diagnostics: the intake and exhaust passages are always assumed turbulent.
pub fn reynolds_number(velocity: f64, density: f64, viscosity: f64, diameter: f64) -> f64 {
    diameter * velocity * density / viscosity
}

/// Average linear velocity [m/s] of `volume_flow` [m³/s] through a hole of `area` [m²].
pub fn linear_velocity_through_orifice(volume_flow: f64, area: f64) -> f64 {
    volume_flow / area
}
