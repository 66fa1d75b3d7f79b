//! Shared test doubles

use infoecon_rs::{
    CustomVariable, ModelError, Quantity, RandomSource, Result, SimulationRun, Unit, VarKind,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Yields a fixed list of scalars in order, one per observation.
///
/// Observing more often than there are values fails, so a test notices when persistence
/// does not hold a value for the rest of the draw.
pub struct SequenceVariable {
    values: Mutex<VecDeque<f64>>,
}

impl SequenceVariable {
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: Mutex::new(values.iter().copied().collect()),
        }
    }
}

impl CustomVariable for SequenceVariable {
    fn observe(&self, _rng: &mut RandomSource, _run: &mut SimulationRun) -> Result<Quantity> {
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .map(Quantity::scalar)
            .ok_or(ModelError::EmptyData {
                what: "sequence values",
            })
    }

    fn unit(&self) -> Unit {
        Unit::scalar()
    }

    fn kind(&self) -> VarKind {
        VarKind::Distribution
    }
}
