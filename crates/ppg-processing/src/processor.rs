//! Core sample processor trait

/// A stateful single-channel processor fed one sample per frame
pub trait SampleProcessor: Send {
    /// Process the next sample and return the output
    fn process_value(&mut self, value: f64) -> f64;

    /// Clear all internal state
    fn reset(&mut self);

    /// Get processor name/identifier
    fn name(&self) -> &str;

    /// Run a whole sequence through the processor
    fn process_slice(&mut self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.process_value(v)).collect()
    }
}
