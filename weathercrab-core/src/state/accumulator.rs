//! Window-keyed accumulator store.

use super::*;

/// Owns the live [`Reducer::State`] of every open window.
///
/// State is created by the reducer on the first record for a key and handed
/// back by [`remove`](Self::remove); callers never keep a reference to it
/// beyond a single call.
pub struct AccumulatorStore<R: Reducer> {
    reducer: R,
    windows: AHashMap<WindowKey, R::State>,
}

impl<R: Reducer> AccumulatorStore<R> {
    /// Create an empty store whose windows are aggregated by `reducer`.
    pub fn new(reducer: R) -> Self {
        Self {
            reducer,
            windows: AHashMap::new(),
        }
    }

    /// Return the state for `key`, creating it with [`Reducer::initial`] if absent.
    pub fn get_or_create(&mut self, key: WindowKey) -> &mut R::State {
        let reducer = &self.reducer;
        self.windows.entry(key).or_insert_with(|| reducer.initial())
    }

    /// Apply `record` to the window `key`.
    ///
    /// Returns `true` if this update opened the window. Rejected fields are
    /// appended to `rejected`.
    pub fn update(
        &mut self,
        key: WindowKey,
        record: &Record,
        rejected: &mut Vec<FieldRejection>,
    ) -> bool {
        let opened = !self.windows.contains_key(&key);
        let state = self
            .windows
            .entry(key)
            .or_insert_with(|| self.reducer.initial());
        self.reducer.update(state, record, rejected);
        opened
    }

    /// Compute the result for `key` without evicting it.
    pub fn finalize(&self, key: &WindowKey) -> Option<WindowResult> {
        self.windows.get(key).map(|state| self.reducer.finalize(state))
    }

    /// Remove and return the state for `key`.
    pub fn remove(&mut self, key: &WindowKey) -> Option<R::State> {
        self.windows.remove(key)
    }

    pub fn contains(&self, key: &WindowKey) -> bool {
        self.windows.contains_key(key)
    }

    /// Number of live windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/accumulator_tests.rs"]
mod tests;
