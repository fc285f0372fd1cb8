use super::*;

/// Running sum and count for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    pub sum: f64,
    pub count: u64,
}

impl MeanAccumulator {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// `None` until at least one value has been added.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Arithmetic mean of every valid value per field.
#[derive(Debug, Clone)]
pub struct MeanReducer {
    fields: Vec<String>,
}

impl MeanReducer {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl Reducer for MeanReducer {
    /// One accumulator per configured field, in configuration order.
    type State = Vec<MeanAccumulator>;

    fn initial(&self) -> Self::State {
        vec![MeanAccumulator::default(); self.fields.len()]
    }

    fn update(&self, state: &mut Self::State, record: &Record, rejected: &mut Vec<FieldRejection>) {
        for (name, acc) in self.fields.iter().zip(state.iter_mut()) {
            match numeric_field(record, name) {
                Ok(value) => acc.add(value),
                Err(rejection) => rejected.push(rejection),
            }
        }
    }

    fn finalize(&self, state: &Self::State) -> WindowResult {
        // Fields that never received a valid value are left out rather than reported as NaN.
        let means = self
            .fields
            .iter()
            .zip(state.iter())
            .filter_map(|(name, acc)| acc.mean().map(|m| (name.clone(), m)))
            .collect();
        WindowResult::Mean(means)
    }
}
