use crate::error::{ModelError, Result};
use crate::quantity::Quantity;
use crate::var_id::VarId;
use std::collections::HashMap;

/// Structured intermediate state a variable keeps within one draw.
#[derive(Clone, Debug, PartialEq)]
pub enum PersistentObject {
    /// A running total, e.g. the revenue accrued for one future year.
    Accumulator(Quantity),
    /// An ordered list of realized values.
    Values(Vec<Quantity>),
}

/// Memo scope for exactly one Monte Carlo draw.
///
/// Persistent variables store their realized value here so that every path through the
/// expression graph sees the same value within the draw. Both stores are write-once per key;
/// a second write is a logic error in the calling variable.
#[derive(Debug, Default)]
pub struct SimulationRun {
    values: HashMap<VarId, Quantity>,
    value_order: Vec<VarId>,
    objects: HashMap<VarId, PersistentObject>,
}

impl SimulationRun {
    /// Create a new empty run
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_persistent_value(&self, id: &VarId) -> bool {
        self.values.contains_key(id)
    }

    /// Stores the value realized for `id` in this draw.
    ///
    /// # Errors
    /// Returns [`ModelError::AlreadyPersisted`] if `id` already holds a value.
    pub fn persist(&mut self, id: VarId, value: Quantity) -> Result<()> {
        if self.values.contains_key(&id) {
            return Err(ModelError::AlreadyPersisted(id));
        }
        self.value_order.push(id.clone());
        self.values.insert(id, value);
        Ok(())
    }

    /// # Errors
    /// Returns [`ModelError::NotPersisted`] if `id` holds no value.
    pub fn persistent_value(&self, id: &VarId) -> Result<&Quantity> {
        self.values
            .get(id)
            .ok_or_else(|| ModelError::NotPersisted(id.clone()))
    }

    /// Ids of all persisted values, in the order they were written.
    #[must_use]
    pub fn persistent_value_ids(&self) -> &[VarId] {
        &self.value_order
    }

    #[must_use]
    pub fn has_persistent_object(&self, id: &VarId) -> bool {
        self.objects.contains_key(id)
    }

    /// # Errors
    /// Returns [`ModelError::AlreadyPersisted`] if `id` already holds an object.
    pub fn persist_object(&mut self, id: VarId, object: PersistentObject) -> Result<()> {
        if self.objects.contains_key(&id) {
            return Err(ModelError::AlreadyPersisted(id));
        }
        self.objects.insert(id, object);
        Ok(())
    }

    /// # Errors
    /// Returns [`ModelError::NotPersisted`] if `id` holds no object.
    pub fn persistent_object(&self, id: &VarId) -> Result<&PersistentObject> {
        self.objects
            .get(id)
            .ok_or_else(|| ModelError::NotPersisted(id.clone()))
    }

    /// Mutable access for accumulating into an object that was already registered.
    ///
    /// # Errors
    /// Returns [`ModelError::NotPersisted`] if `id` holds no object.
    pub fn persistent_object_mut(&mut self, id: &VarId) -> Result<&mut PersistentObject> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| ModelError::NotPersisted(id.clone()))
    }

    /// Get the number of persisted values
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the run holds no values
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
