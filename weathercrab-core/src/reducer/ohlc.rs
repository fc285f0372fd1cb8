use super::*;

impl Ohlc {
    /// Summary of a series containing only `value`.
    pub fn new(value: f64) -> Self {
        Self {
            open: value,
            high: value,
            low: value,
            close: value,
        }
    }

    /// Extend the series with a later value. `open` never changes.
    pub fn push(&mut self, value: f64) {
        self.close = value;
        self.high = self.high.max(value);
        self.low = self.low.min(value);
    }
}

/// Open/high/low/close per field.
///
/// Each field is tracked independently: a field stays unset until its first
/// valid value, which becomes its `open`.
#[derive(Debug, Clone)]
pub struct OhlcReducer {
    fields: Vec<String>,
}

impl OhlcReducer {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl Reducer for OhlcReducer {
    type State = Vec<Option<Ohlc>>;

    fn initial(&self) -> Self::State {
        vec![None; self.fields.len()]
    }

    fn update(&self, state: &mut Self::State, record: &Record, rejected: &mut Vec<FieldRejection>) {
        for (name, slot) in self.fields.iter().zip(state.iter_mut()) {
            match numeric_field(record, name) {
                Ok(value) => match slot {
                    Some(ohlc) => ohlc.push(value),
                    None => *slot = Some(Ohlc::new(value)),
                },
                Err(rejection) => rejected.push(rejection),
            }
        }
    }

    fn finalize(&self, state: &Self::State) -> WindowResult {
        let summaries = self
            .fields
            .iter()
            .zip(state.iter())
            .filter_map(|(name, slot)| slot.as_ref().map(|ohlc| (name.clone(), *ohlc)))
            .collect();
        WindowResult::Ohlc(summaries)
    }
}
