//! Per-degree samples of one cycle, laid out for a pressure/temperature/friction
//! versus piston displacement plot.

use crate::core::traits::{SampleSink, SaveData};
use crate::error::SimError;
use ndarray::*;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub displacement: f64,   // [m] - piston travel from TDC
    pub pressure_delta: f64, // [Pa] - chamber minus ambient
    pub temperature: f64,    // [K]
    pub friction: f64,       // friction force sample, zero with both valves shut
}

impl SampleRecord {
    pub const HEADERS: &'static str =
        "displacement [m]\tpressure delta [Pa]\ttemperature [K]\tfriction [-]";
    pub const STORABLE_VARIABLES: usize = 4;
}

impl SaveData for SampleRecord {
    fn get_headers(&self) -> String {
        SampleRecord::HEADERS.to_string()
    }
    fn num_storable_variables(&self) -> usize {
        SampleRecord::STORABLE_VARIABLES
    }
    fn get_storable_data(&self) -> Array1<f64> {
        array![
            self.displacement,
            self.pressure_delta,
            self.temperature,
            self.friction
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    records: Vec<SampleRecord>,
}

impl SampleSeries {
    pub fn with_capacity(capacity: usize) -> SampleSeries {
        SampleSeries {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: SampleRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// (displacement, pressure relative to ambient)
    pub fn pressure_channel(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .map(|r| (r.displacement, r.pressure_delta))
            .collect()
    }

    /// (displacement, chamber temperature)
    pub fn temperature_channel(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .map(|r| (r.displacement, r.temperature))
            .collect()
    }

    /// (displacement, friction force sample)
    pub fn friction_channel(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .map(|r| (r.displacement, r.friction))
            .collect()
    }

    /// One row per crank step, columns as in `SampleRecord::HEADERS`.
    pub fn to_array(&self) -> Array2<f64> {
        let columns = self
            .records
            .first()
            .map_or(SampleRecord::STORABLE_VARIABLES, SampleRecord::num_storable_variables);
        let mut data = Array2::<f64>::zeros((self.records.len(), columns));
        for (mut row, record) in data.outer_iter_mut().zip(self.records.iter()) {
            row.assign(&record.get_storable_data());
        }
        data
    }

    /// Writes the series as tab-separated text, one crank step per line, with a header line.
    pub fn write_to_file(&self, file_name: &str) -> Result<(), SimError> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(file_name)?);
        writeln!(file, "crank angle [CA deg]\t{}", SampleRecord::HEADERS)?;
        for (step, row) in self.to_array().outer_iter().enumerate() {
            let line: Vec<String> = row.iter().map(|v| format!("{}", v)).collect();
            writeln!(file, "{}\t{}", step, line.join("\t"))?;
        }
        file.flush()?;
        Ok(())
    }
}

/// Keeps a copy of the last published cycle.
impl SampleSink for SampleSeries {
    fn publish(&mut self, samples: &SampleSeries) -> Result<(), SimError> {
        self.records.clear();
        self.records.extend_from_slice(&samples.records);
        Ok(())
    }
}
