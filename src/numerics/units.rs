//! Unit conversions used across the crate. All other modules work in SI units.

use std::f64::consts::PI;

const ZERO_CELSIUS: f64 = 273.15; // [K]
const PA_PER_MMHG: f64 = 133.322;

pub fn celsius_to_kelvin(temp: f64) -> f64 {
    temp + ZERO_CELSIUS
}

pub fn kelvin_to_celsius(temp: f64) -> f64 {
    temp - ZERO_CELSIUS
}

/// `cm³` to `m³`
pub fn cm3_to_m3(vol: f64) -> f64 {
    vol * 1e-6
}

/// `m³` to `cm³`
pub fn m3_to_cm3(vol: f64) -> f64 {
    vol / 1e-6
}

pub fn radians_to_degrees(angle: f64) -> f64 {
    angle * 180.0 / PI
}

pub fn degrees_to_radians(angle: f64) -> f64 {
    angle / (180.0 / PI)
}

/// Radius of the circle with the given `area`.
pub fn area_to_radius(area: f64) -> f64 {
    (area / PI).sqrt()
}

/// Area of the circle with the given `radius`.
pub fn radius_to_area(radius: f64) -> f64 {
    PI * radius * radius
}

pub fn pa_to_mmhg(press: f64) -> f64 {
    press / PA_PER_MMHG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_round_trip() {
        let mut x = 0.0;
        while x < 2.0 * PI {
            let back = degrees_to_radians(radians_to_degrees(x));
            assert!((back - x).abs() < 1e-12, "{} came back as {}", x, back);
            x += 0.01;
        }
    }

    #[test]
    fn temperature_round_trip() {
        for x in [0.0, 15.0, 25.0, 273.15, 1000.5].iter() {
            assert_eq!(celsius_to_kelvin(kelvin_to_celsius(*x)), *x);
        }
        assert_eq!(celsius_to_kelvin(15.0), 288.15);
    }

    #[test]
    fn area_and_radius_are_inverse() {
        let r = 0.0475;
        assert!((area_to_radius(radius_to_area(r)) - r).abs() < 1e-15);
    }

    #[test]
    fn volume_and_pressure_units() {
        assert!((cm3_to_m3(449.4) - 4.494e-4).abs() < 1e-15);
        assert!((m3_to_cm3(4.494e-4) - 449.4).abs() < 1e-9);
        assert!((pa_to_mmhg(101325.0) - 760.0).abs() < 0.01);
    }
}
