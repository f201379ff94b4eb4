use crate::core::samples::SampleSeries;
use crate::error::SimError;
use ndarray::*;

/// Consumer of the per-degree samples of a cycle, typically a plotting front-end.
/// Each call carries a complete cycle; whatever the sink held before is replaced.
pub trait SampleSink {
    fn publish(&mut self, samples: &SampleSeries) -> Result<(), SimError>;
}

pub trait SaveData {
    fn get_headers(&self) -> String;
    fn num_storable_variables(&self) -> usize;
    fn get_storable_data(&self) -> Array1<f64>;
}
