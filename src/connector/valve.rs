use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Length of one four-stroke cycle [CA deg]
pub const CYCLE_DEGREES: f64 = 720.0;
/// Top-dead-center of the firing revolution [CA deg]
const FIRING_TDC: f64 = 360.0;

/// Valve events and ignition, in crank-angle degrees clockwise past TDC.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ValveTiming {
    pub intake_open: f64,            // [CA deg]
    pub intake_close: f64,           // [CA deg]
    pub exhaust_open: f64,           // [CA deg]
    pub exhaust_close: f64,          // [CA deg]
    pub ignition_timing: f64,        // [CA deg] - offset from firing TDC
    pub intake_valve_diameter: f64,  // [m]
    pub exhaust_valve_diameter: f64, // [m]
}

impl Default for ValveTiming {
    fn default() -> Self {
        ValveTiming {
            intake_open: 710.0,
            intake_close: 235.0,
            exhaust_open: 495.0,
            exhaust_close: 20.0,
            ignition_timing: 0.0,
            intake_valve_diameter: 0.0425,
            exhaust_valve_diameter: 0.0425,
        }
    }
}

impl ValveTiming {
    pub fn validate(&self) -> Result<(), SimError> {
        let events = [
            ("intake_open", self.intake_open),
            ("intake_close", self.intake_close),
            ("exhaust_open", self.exhaust_open),
            ("exhaust_close", self.exhaust_close),
        ];
        for (name, angle) in events.iter() {
            if !(0.0..CYCLE_DEGREES).contains(angle) {
                return Err(SimError::config(format!(
                    "`{}` must be within [0, 720) CA deg, got {}",
                    name, angle
                )));
            }
        }
        let ignition = FIRING_TDC + self.ignition_timing;
        if !(0.0..CYCLE_DEGREES).contains(&ignition) {
            return Err(SimError::config(format!(
                "`ignition_timing` {} moves the spark outside of the cycle",
                self.ignition_timing
            )));
        }
        if self.intake_valve_diameter <= 0.0 || self.exhaust_valve_diameter <= 0.0 {
            return Err(SimError::config("valve diameters must be greater than zero"));
        }
        Ok(())
    }

    /// Strokes active at crank `angle` [CA deg, 0-719].
    ///
    /// The four interval tests are independent: near TDC of the gas exchange the intake
    /// and exhaust strokes overlap, so more than one stroke may be active at once.
    pub fn active_strokes(&self, angle: f64) -> ActiveStrokes {
        let ignition = FIRING_TDC + self.ignition_timing;
        let mut active = ActiveStrokes::default();
        if angle > self.intake_open || angle <= self.intake_close {
            active.insert(Stroke::Intake);
        }
        if angle > self.intake_close && angle <= ignition {
            active.insert(Stroke::Compression);
        }
        if angle > ignition && angle <= self.exhaust_open {
            active.insert(Stroke::Combustion);
        }
        if angle > self.exhaust_open || angle <= self.exhaust_close {
            active.insert(Stroke::Exhaust);
        }
        active
    }
}

/// The four phases of the Otto cycle, in the order their updates are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Intake,
    Compression,
    Combustion,
    Exhaust,
}

impl Stroke {
    pub const ALL: [Stroke; 4] = [
        Stroke::Intake,
        Stroke::Compression,
        Stroke::Combustion,
        Stroke::Exhaust,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stroke::Intake => "intake",
            Stroke::Compression => "compression",
            Stroke::Combustion => "combustion",
            Stroke::Exhaust => "exhaust",
        }
    }
}

/// Set of strokes active on one crank step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveStrokes {
    flags: [bool; 4],
}

impl ActiveStrokes {
    pub fn insert(&mut self, stroke: Stroke) {
        self.flags[stroke as usize] = true;
    }

    pub fn contains(&self, stroke: Stroke) -> bool {
        self.flags[stroke as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.flags.iter().any(|f| *f)
    }

    /// Active strokes in application order: intake, compression, combustion, exhaust.
    pub fn iter(&self) -> impl Iterator<Item = Stroke> + '_ {
        Stroke::ALL.iter().copied().filter(move |s| self.contains(*s))
    }
}

impl std::fmt::Display for ActiveStrokes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(|s| s.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Stroke::*;

    fn strokes_at(timing: &ValveTiming, angle: f64) -> Vec<Stroke> {
        timing.active_strokes(angle).iter().collect()
    }

    #[test]
    fn default_timing_boundaries() {
        let timing = ValveTiming::default();
        let expected: [(f64, Vec<Stroke>); 14] = [
            (0.0, vec![Intake, Exhaust]),
            (20.0, vec![Intake, Exhaust]),
            (21.0, vec![Intake]),
            (235.0, vec![Intake]),
            (236.0, vec![Compression]),
            (300.0, vec![Compression]),
            (360.0, vec![Compression]),
            (361.0, vec![Combustion]),
            (495.0, vec![Combustion]),
            (496.0, vec![Exhaust]),
            (600.0, vec![Exhaust]),
            (710.0, vec![Exhaust]),
            (711.0, vec![Intake, Exhaust]),
            (719.0, vec![Intake, Exhaust]),
        ];
        for (angle, strokes) in expected.iter() {
            assert_eq!(&strokes_at(&timing, *angle), strokes, "at {} CA deg", angle);
        }
    }

    #[test]
    fn every_degree_has_a_stroke() {
        let timing = ValveTiming::default();
        for angle in 0..720 {
            assert!(!timing.active_strokes(angle as f64).is_empty(), "nothing at {}", angle);
        }
    }

    #[test]
    fn ignition_advance_shifts_combustion_start() {
        let timing = ValveTiming {
            ignition_timing: -10.0,
            ..ValveTiming::default()
        };
        assert_eq!(strokes_at(&timing, 350.0), vec![Compression]);
        assert_eq!(strokes_at(&timing, 351.0), vec![Combustion]);
    }

    #[test]
    fn display_lists_in_application_order() {
        let timing = ValveTiming::default();
        assert_eq!(timing.active_strokes(715.0).to_string(), "[intake, exhaust]");
    }

    #[test]
    fn timing_outside_cycle_is_rejected() {
        assert!(ValveTiming::default().validate().is_ok());
        let late = ValveTiming {
            exhaust_open: 720.0,
            ..ValveTiming::default()
        };
        assert!(late.validate().is_err());
        let early_spark = ValveTiming {
            ignition_timing: -400.0,
            ..ValveTiming::default()
        };
        assert!(early_spark.validate().is_err());
    }
}
