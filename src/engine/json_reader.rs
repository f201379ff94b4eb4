use crate::connector::manifold::{ExhaustGeometry, IntakeGeometry};
use crate::connector::valve::ValveTiming;
use crate::error::SimError;
use crate::zero_dim::cylinder::EngineGeometry;
use crate::zero_dim::environment::AmbientInputs;
use serde::{Deserialize, Serialize};

/// Lowest and highest engine speed the host is expected to request [RPM]
pub const RPM_RANGE: (f64, f64) = (450.0, 15000.0);

/// Everything that defines an engine and its surroundings. Every field may be
/// omitted from the JSON file, in which case its default is used.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub cylinders: usize,
    pub bottom_end: EngineGeometry,
    pub top_end: ValveTiming,
    pub intake: IntakeGeometry,
    pub exhaust: ExhaustGeometry,
    pub environment: AmbientInputs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cylinders: 1,
            bottom_end: EngineGeometry::default(),
            top_end: ValveTiming::default(),
            intake: IntakeGeometry::default(),
            exhaust: ExhaustGeometry::default(),
            environment: AmbientInputs::default(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates `file_name`.
    pub fn from_json_file(file_name: &str) -> Result<EngineConfig, SimError> {
        let json_file = std::fs::read_to_string(file_name)?;
        EngineConfig::from_json_str(&json_file)
    }

    pub fn from_json_str(json: &str) -> Result<EngineConfig, SimError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.cylinders == 0 {
            return Err(SimError::config("at least one cylinder is required"));
        }
        self.bottom_end.validate()?;
        self.top_end.validate()?;
        self.intake.validate(self.cylinders)?;
        self.exhaust.validate(self.cylinders)?;
        Ok(())
    }
}

/// Realtime inputs of one tick. The core does not clamp them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(try_from = "RawControls")]
pub struct Controls {
    throttle: f64, // [0, 1]
    rpm: f64,      // [RPM]
}

/// Unchecked form of `Controls` as read from JSON.
#[derive(Deserialize)]
struct RawControls {
    throttle: f64,
    rpm: f64,
}

impl std::convert::TryFrom<RawControls> for Controls {
    type Error = SimError;
    fn try_from(raw: RawControls) -> Result<Controls, SimError> {
        Controls::new(raw.throttle, raw.rpm)
    }
}

impl Controls {
    pub fn new(throttle: f64, rpm: f64) -> Result<Controls, SimError> {
        if !(rpm > 0.0) {
            return Err(SimError::config(format!(
                "engine speed must be greater than zero, got {} RPM",
                rpm
            )));
        }
        Ok(Controls { throttle, rpm })
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    /// Whether both inputs sit inside the range a host UI offers.
    pub fn in_host_range(&self) -> bool {
        (0.0..=1.0).contains(&self.throttle) && (RPM_RANGE.0..=RPM_RANGE.1).contains(&self.rpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::manifold::Muffler;

    #[test]
    fn empty_json_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.bottom_end.compression_ratio, 11.9);
        assert_eq!(config.top_end.intake_open, 710.0);
        assert_eq!(config.exhaust.muffler, Muffler::None);
        assert_eq!(config.environment.relative_humidity, 0.2);
    }

    #[test]
    fn partial_json_overrides_single_fields() {
        let json = r#"{
            "bottom_end": { "bore": 0.08 },
            "top_end": { "ignition_timing": -12.0 },
            "exhaust": { "muffler": "none" },
            "environment": { "altitude": 1500.0 }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.bottom_end.bore, 0.08);
        assert_eq!(config.bottom_end.stroke, 0.0634);
        assert_eq!(config.top_end.ignition_timing, -12.0);
        assert_eq!(config.environment.altitude, 1500.0);
        assert_eq!(config.environment.air_temp, 25.0);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let short_rod = r#"{ "bottom_end": { "rod_length": 0.01 } }"#;
        match EngineConfig::from_json_str(short_rod) {
            Err(SimError::Configuration(_)) => (),
            other => panic!("expected a configuration error, got {:?}", other),
        }
        let two_cylinders = r#"{ "cylinders": 2 }"#;
        assert!(EngineConfig::from_json_str(two_cylinders).is_err());
        match EngineConfig::from_json_str("{ \"cylinders\": ") {
            Err(SimError::Json(_)) => (),
            other => panic!("expected a JSON error, got {:?}", other),
        }
    }

    #[test]
    fn two_cylinders_sharing_one_pipe() {
        let json = r#"{
            "cylinders": 2,
            "intake": { "length": [0.15, 0.17], "individual_volume": [0.0005, 0.0004] },
            "exhaust": { "cylinder_to_pipe": [0, 0], "header_length": [0.2, 0.25] }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.cylinders, 2);
        assert!(config.exhaust.duct(1).length > config.exhaust.duct(0).length);
    }

    #[test]
    fn shipped_engine_file_matches_defaults() {
        let file = concat!(env!("CARGO_MANIFEST_DIR"), "/engine.json");
        assert_eq!(EngineConfig::from_json_file(file).unwrap(), EngineConfig::default());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        match EngineConfig::from_json_file("no/such/engine.json") {
            Err(SimError::Io(_)) => (),
            other => panic!("expected an IO error, got {:?}", other),
        }
    }

    #[test]
    fn controls_reject_non_positive_speed() {
        assert!(Controls::new(1.0, 0.0).is_err());
        assert!(Controls::new(1.0, -100.0).is_err());
        assert!(Controls::new(1.0, std::f64::NAN).is_err());
        let idle = Controls::new(0.0, 800.0).unwrap();
        assert!(idle.in_host_range());
        // outside the host range is accepted, only flagged
        let crawl = Controls::new(1.2, 100.0).unwrap();
        assert!(!crawl.in_host_range());
    }

    #[test]
    fn deserialized_controls_are_checked() {
        match serde_json::from_str::<Controls>(r#"{ "throttle": 1.0, "rpm": 0.0 }"#) {
            Err(err) => assert!(err.to_string().contains("greater than zero"), "{}", err),
            Ok(controls) => panic!("accepted {:?}", controls),
        }
        let cruise: Controls = serde_json::from_str(r#"{ "throttle": 0.5, "rpm": 3000.0 }"#).unwrap();
        assert_eq!(cruise, Controls::new(0.5, 3000.0).unwrap());
        let json = serde_json::to_string(&cruise).unwrap();
        assert_eq!(serde_json::from_str::<Controls>(&json).unwrap(), cruise);
    }
}
