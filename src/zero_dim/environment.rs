//! Ambient air around the engine: layered standard atmosphere with a humidity correction.

use crate::error::SimError;
use crate::numerics::units;
use crate::reaction::gas;
use ansi_term::Style;
use serde::{Deserialize, Serialize};

const GAS_CONST: f64 = 8.31432e-3; // universal gas constant, scaled so altitudes can be given in km
const GRAVITY: f64 = 9.81; // [m/s²]
const AIR_MOLAR_MASS: f64 = 0.0289644; // [kg/mol]
const WATER_VAPOUR_GAS_CONST: f64 = 461.5; // [J/(kg.K)]

// Standard atmosphere layers. Altitudes in km, pressures in Pa, temperatures in K, lapse rates in K/km
const LAYER_CEILING: [f64; 8] = [11.0, 20.0, 32.0, 47.0, 51.0, 71.0, 85.0, 800.0];
const BASE_ALTITUDE: [f64; 8] = [0.0, 11.0, 20.0, 32.0, 47.0, 51.0, 71.0, 85.0];
const BASE_PRESSURE: [f64; 8] = [
    101325.0, 22632.06, 5474.889, 868.0187, 110.9063, 66.93887, 3.956420, 0.3734,
];
const BASE_TEMPERATURE: [f64; 8] = [
    288.15, 216.65, 216.65, 228.65, 270.65, 270.65, 214.65, 186.87,
];
const LAPSE_RATE: [f64; 8] = [-6.5, 0.0, 1.0, 2.8, 0.0, -2.8, -2.0, 0.0];

/// Layer of the standard atmosphere an altitude falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtmosphericLayer {
    Troposphere,
    Tropopause,
    StratosphereII,
    StratosphereIII,
    Stratopause,
    MesosphereII,
    MesosphereIII,
    Thermosphere,
}

impl AtmosphericLayer {
    const ALL: [AtmosphericLayer; 8] = [
        AtmosphericLayer::Troposphere,
        AtmosphericLayer::Tropopause,
        AtmosphericLayer::StratosphereII,
        AtmosphericLayer::StratosphereIII,
        AtmosphericLayer::Stratopause,
        AtmosphericLayer::MesosphereII,
        AtmosphericLayer::MesosphereIII,
        AtmosphericLayer::Thermosphere,
    ];

    /// Classifies `altitude` in meters. Everything above 85 km is `Thermosphere`.
    pub fn from_altitude(altitude: f64) -> AtmosphericLayer {
        let altitude_km = altitude / 1000.0;
        let index = LAYER_CEILING
            .iter()
            .position(|ceiling| altitude_km < *ceiling)
            .unwrap_or(LAYER_CEILING.len() - 1);
        AtmosphericLayer::ALL[index]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            AtmosphericLayer::Troposphere => "Troposphere",
            AtmosphericLayer::Tropopause => "Tropopause (Stratosphere I)",
            AtmosphericLayer::StratosphereII => "Stratosphere II",
            AtmosphericLayer::StratosphereIII => "Stratosphere III",
            AtmosphericLayer::Stratopause => "Stratopause (Mesosphere I)",
            AtmosphericLayer::MesosphereII => "Mesosphere II",
            AtmosphericLayer::MesosphereIII => "Mesosphere III",
            AtmosphericLayer::Thermosphere => "Thermosphere",
        }
    }

    /// Base geopotential altitude [km]
    pub fn base_altitude(&self) -> f64 {
        BASE_ALTITUDE[self.index()]
    }

    /// Static pressure at the layer base [Pa]
    pub fn base_pressure(&self) -> f64 {
        BASE_PRESSURE[self.index()]
    }

    /// Temperature at the layer base [K]
    pub fn base_temperature(&self) -> f64 {
        BASE_TEMPERATURE[self.index()]
    }

    /// Temperature lapse rate [K/km]
    pub fn lapse_rate(&self) -> f64 {
        LAPSE_RATE[self.index()]
    }
}

/// Static pressure in Pa from the barometric formula. `altitude` in m, `air_temp` in °C.
///
/// The measured air temperature is used only inside the troposphere; higher layers
/// use their tabulated base temperature.
pub fn barometric_pressure(altitude: f64, air_temp: f64) -> f64 {
    let height = altitude / 1000.0; // [km]
    let layer = AtmosphericLayer::from_altitude(altitude);
    let base_press = layer.base_pressure();
    let lapse = layer.lapse_rate();
    let delta_height = height - layer.base_altitude();
    let temp = match layer {
        AtmosphericLayer::Troposphere => units::celsius_to_kelvin(air_temp),
        _ => layer.base_temperature(),
    };

    if lapse == 0.0 {
        base_press * ((-GRAVITY * AIR_MOLAR_MASS * delta_height) / (GAS_CONST * temp)).exp()
    } else {
        base_press
            * (temp / (temp + lapse * delta_height))
                .powf((GRAVITY * AIR_MOLAR_MASS) / (GAS_CONST * lapse))
    }
}

/// Absolute humidity from a Magnus-type saturation vapour pressure.
/// `air_temp` in °C, `relative_humidity` in [0, 1], `press` in Pa.
pub fn absolute_humidity(air_temp: f64, relative_humidity: f64, press: f64) -> f64 {
    let press = units::pa_to_mmhg(press);
    let saturation = 6.112 * ((17.62 * air_temp) / (243.12 + air_temp)).exp();
    let enhancement = 1.0016 + 3.15e-6 * press - 0.074 / press;
    let vapour_press = saturation * enhancement * relative_humidity;
    100.0 * vapour_press / (WATER_VAPOUR_GAS_CONST * units::celsius_to_kelvin(air_temp))
}

/// Raw outside-air inputs, as set by the host.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AmbientInputs {
    pub altitude: f64,          // [m]
    pub air_temp: f64,          // [°C]
    pub relative_humidity: f64, // [0, 1]
}

impl Default for AmbientInputs {
    fn default() -> Self {
        AmbientInputs {
            altitude: 10.0,
            air_temp: 25.0,
            relative_humidity: 0.2,
        }
    }
}

/// Outside-air state derived from `AmbientInputs`. Holds no memory between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientConditions {
    layer: AtmosphericLayer,
    temperature: f64,       // [K]
    pressure: f64,          // [Pa]
    density: f64,           // [kg/m³]
    viscosity: f64,         // [kg/(m.s)]
    absolute_humidity: f64,
    density_ratio: f64,
}

impl AmbientConditions {
    /// Derives the ambient state. The humidity term is folded into the density,
    /// then pressure and viscosity are re-derived from the corrected density.
    pub fn new(inputs: &AmbientInputs) -> Result<AmbientConditions, SimError> {
        let temperature = units::celsius_to_kelvin(inputs.air_temp);
        let press = barometric_pressure(inputs.altitude, inputs.air_temp);
        let abs_humidity = absolute_humidity(inputs.air_temp, inputs.relative_humidity, press);
        let density = gas::density_at_pressure(press, temperature) + 0.5 * abs_humidity;
        if !(density.is_finite() && density > 0.0) {
            return Err(SimError::degenerate(format!(
                "ambient air density must be positive, got {} kg/m³ (altitude {} m, temperature {} °C)",
                density, inputs.altitude, inputs.air_temp
            )));
        }
        let pressure = gas::pressure_at_density(density, temperature);
        let viscosity = gas::air_viscosity_at_density(density);

        Ok(AmbientConditions {
            layer: AtmosphericLayer::from_altitude(inputs.altitude),
            temperature,
            pressure,
            density,
            viscosity,
            absolute_humidity: abs_humidity,
            density_ratio: (density - abs_humidity) / density,
        })
    }

    pub fn layer(&self) -> AtmosphericLayer {
        self.layer
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }

    pub fn absolute_humidity(&self) -> f64 {
        self.absolute_humidity
    }

    /// Share of the ambient density that is dry air.
    pub fn density_ratio(&self) -> f64 {
        self.density_ratio
    }
}

impl std::fmt::Display for AmbientConditions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({})
        temperature: {:.2} [K]
        pressure: {:.1} [Pa]
        density: {:.4} [kg/m³]
        viscosity: {:.3e} [kg/(m.s)]
        absolute humidity: {:.5}
        air density ratio: {:.4}",
            Style::new().bold().paint("ambient"),
            self.layer.name(),
            self.temperature,
            self.pressure,
            self.density,
            self.viscosity,
            self.absolute_humidity,
            self.density_ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_reference_pressure() {
        assert_eq!(barometric_pressure(0.0, 15.0), 101325.0);
        let dry = AmbientInputs {
            altitude: 0.0,
            air_temp: 15.0,
            relative_humidity: 0.0,
        };
        let amb = AmbientConditions::new(&dry).unwrap();
        assert!((amb.pressure() - 101325.0).abs() < 1e-6);
        assert!((amb.density() - 1.225).abs() < 1e-3);
        assert_eq!(amb.absolute_humidity(), 0.0);
        assert_eq!(amb.density_ratio(), 1.0);
    }

    #[test]
    fn pressure_never_increases_with_altitude() {
        let mut previous = barometric_pressure(0.0, 15.0);
        let mut altitude = 250.0;
        while altitude <= 85000.0 {
            let press = barometric_pressure(altitude, 15.0);
            assert!(
                press <= previous,
                "pressure rose from {} to {} Pa at {} m",
                previous,
                press,
                altitude
            );
            previous = press;
            altitude += 250.0;
        }
    }

    #[test]
    fn layer_classification() {
        assert_eq!(AtmosphericLayer::from_altitude(0.0), AtmosphericLayer::Troposphere);
        assert_eq!(AtmosphericLayer::from_altitude(10999.0), AtmosphericLayer::Troposphere);
        assert_eq!(AtmosphericLayer::from_altitude(11000.0), AtmosphericLayer::Tropopause);
        assert_eq!(AtmosphericLayer::from_altitude(50000.0), AtmosphericLayer::Stratopause);
        assert_eq!(AtmosphericLayer::from_altitude(85000.0), AtmosphericLayer::Thermosphere);
        assert_eq!(AtmosphericLayer::from_altitude(2.0e6), AtmosphericLayer::Thermosphere);
        assert_eq!(AtmosphericLayer::from_altitude(30000.0).name(), "Stratosphere II");
    }

    #[test]
    fn isothermal_layer_uses_exponential_decay() {
        let layer = AtmosphericLayer::Tropopause;
        let expected = layer.base_pressure()
            * (-GRAVITY * AIR_MOLAR_MASS * 4.0 / (GAS_CONST * layer.base_temperature())).exp();
        assert!((barometric_pressure(15000.0, 25.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn humidity_lowers_dry_air_share() {
        let humid = AmbientConditions::new(&AmbientInputs {
            altitude: 10.0,
            air_temp: 25.0,
            relative_humidity: 0.8,
        })
        .unwrap();
        let dry = AmbientConditions::new(&AmbientInputs {
            altitude: 10.0,
            air_temp: 25.0,
            relative_humidity: 0.0,
        })
        .unwrap();
        assert!(humid.absolute_humidity() > 0.0);
        assert!(humid.density() > dry.density());
        assert!(humid.density_ratio() < 1.0);
        assert!(humid.viscosity() < dry.viscosity());
    }

    #[test]
    fn default_inputs_give_plausible_air() {
        let amb = AmbientConditions::new(&AmbientInputs::default()).unwrap();
        assert!(amb.pressure() > 95000.0 && amb.pressure() < 105000.0);
        assert!(amb.density() > 1.0 && amb.density() < 1.3);
        assert!(amb.viscosity() > 0.0);
        assert_eq!(amb.temperature(), 298.15);
    }

    #[test]
    fn non_physical_temperature_is_rejected() {
        let frozen = AmbientInputs {
            altitude: 0.0,
            air_temp: -273.15,
            relative_humidity: 0.0,
        };
        assert!(AmbientConditions::new(&frozen).is_err());
    }
}
