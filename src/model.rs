//! Named-variable definitions and their lazily resolved instances.

use crate::config::AnalysisConfig;
use crate::error::{ModelError, Result};
use crate::quantity::Quantity;
use crate::sampler::{SampleSet, SamplingPool};
use crate::var_id::VarId;
use crate::variable::RandomVariable;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Builds the variable for one id, resolving its dependencies through the instance.
pub type Producer = Arc<dyn Fn(&Instance<'_>) -> Result<RandomVariable> + Send + Sync>;

type AnyObject = Arc<dyn Any + Send + Sync>;
type ObjectProducer = Arc<dyn Fn(&Instance<'_>) -> Result<AnyObject> + Send + Sync>;

/// Wraps a closure as a [`Producer`].
pub fn producer<F>(f: F) -> Producer
where
    F: Fn(&Instance<'_>) -> Result<RandomVariable> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn object_producer<F>(f: F) -> ObjectProducer
where
    F: Fn(&Instance<'_>) -> Result<AnyObject> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Registers several related definitions derived from one base id.
pub trait MultiVariableFactory {
    /// Returns the definitions to register, in registration order.
    ///
    /// # Errors
    /// Implementations fail if their parameters cannot describe a variable.
    fn create(&self, base: &VarId) -> Result<Vec<(VarId, Producer)>>;
}

/// The definition registry of a decision model.
///
/// A model maps ids to producers. Nothing is built at registration time: an
/// [`Instance`] calls producers on first access and remembers the result. Ids can be
/// registered only once.
///
/// # Example
/// ```rust
/// use infoecon_rs::{Model, Quantity, RandomVariable, Unit};
///
/// let mut model = Model::new();
/// model.add_var("hours", RandomVariable::normal_95(10.0, 20.0, Unit::of("h")).unwrap()).unwrap();
/// model.add_var("rate", RandomVariable::fixed(Quantity::of(80.0, "EUR"))).unwrap();
/// model
///     .add("cost", |inst| Ok(inst.get("hours")? * inst.get("rate")?))
///     .unwrap();
///
/// let instance = model.instantiate();
/// assert_eq!(instance.get("cost").unwrap().unit().to_string(), "EUR*h");
/// assert!(model.add_var("hours", RandomVariable::scalar(1.0)).is_err());
/// ```
pub struct Model {
    definitions: HashMap<VarId, Producer>,
    order: Vec<VarId>,
    objects: HashMap<String, ObjectProducer>,
    config: AnalysisConfig,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    #[must_use]
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            definitions: HashMap::new(),
            order: Vec::new(),
            objects: HashMap::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AnalysisConfig {
        &mut self.config
    }

    /// Registers a producer whose variable persists under `id`.
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateDefinition`] if `id` is already registered.
    pub fn add<F>(&mut self, id: impl Into<VarId>, producer: F) -> Result<()>
    where
        F: Fn(&Instance<'_>) -> Result<RandomVariable> + Send + Sync + 'static,
    {
        let id = id.into();
        let producer = persistent_producer(id.clone(), self::producer(producer));
        self.insert(id, producer)
    }

    /// Registers a ready-made variable that persists under `id`.
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateDefinition`] if `id` is already registered.
    pub fn add_var(&mut self, id: impl Into<VarId>, variable: RandomVariable) -> Result<()> {
        self.add(id, move |_| Ok(variable.clone()))
    }

    /// Registers a producer as is, without making its variable persistent.
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateDefinition`] if `id` is already registered.
    pub fn add_raw<F>(&mut self, id: impl Into<VarId>, producer: F) -> Result<()>
    where
        F: Fn(&Instance<'_>) -> Result<RandomVariable> + Send + Sync + 'static,
    {
        self.insert(id.into(), self::producer(producer))
    }

    /// # Errors
    /// Returns [`ModelError::DuplicateDefinition`] if `id` is already registered.
    pub fn add_raw_var(&mut self, id: impl Into<VarId>, variable: RandomVariable) -> Result<()> {
        self.add_raw(id, move |_| Ok(variable.clone()))
    }

    /// Registers every definition of a factory, each persistent under its own id.
    ///
    /// Either all definitions are registered or none.
    ///
    /// # Errors
    /// Returns the factory's error, or [`ModelError::DuplicateDefinition`] if any of
    /// its ids is already registered.
    pub fn add_factory<M>(&mut self, base: impl Into<VarId>, factory: &M) -> Result<()>
    where
        M: MultiVariableFactory + ?Sized,
    {
        let products = factory
            .create(&base.into())?
            .into_iter()
            .map(|(id, producer)| (id.clone(), persistent_producer(id, producer)))
            .collect();
        self.insert_all(products)
    }

    /// [`Model::add_factory`] without persistence.
    ///
    /// # Errors
    /// Returns the factory's error, or [`ModelError::DuplicateDefinition`] if any of
    /// its ids is already registered.
    pub fn add_raw_factory<M>(&mut self, base: impl Into<VarId>, factory: &M) -> Result<()>
    where
        M: MultiVariableFactory + ?Sized,
    {
        let products = factory.create(&base.into())?;
        self.insert_all(products)
    }

    /// Registers an auxiliary object, built once per instance on first access.
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateObject`] if `name` is already registered.
    pub fn add_object<T, F>(&mut self, name: &str, producer: F) -> Result<()>
    where
        T: Any + Send + Sync,
        F: Fn(&Instance<'_>) -> Result<T> + Send + Sync + 'static,
    {
        if self.objects.contains_key(name) {
            return Err(ModelError::DuplicateObject(name.to_string()));
        }
        trace!(object = name, "Registering object");
        self.objects.insert(
            name.to_string(),
            object_producer(move |inst| Ok(Arc::new(producer(inst)?) as AnyObject)),
        );
        Ok(())
    }

    /// Ids in registration order.
    #[must_use]
    pub fn ids(&self) -> &[VarId] {
        &self.order
    }

    #[must_use]
    pub fn contains(&self, id: &VarId) -> bool {
        self.definitions.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// A fresh resolution scope.
    #[must_use]
    pub fn instantiate(&self) -> Instance<'_> {
        Instance::new(self)
    }

    /// An instance where `id` is pinned to `value` instead of its definition.
    pub(crate) fn instantiate_with_fixed(&self, id: &VarId, value: Quantity) -> Instance<'_> {
        let instance = Instance::new(self);
        instance.remember(id, RandomVariable::fixed(value));
        instance
    }

    /// Ids whose resolved variable is persistent, in registration order.
    ///
    /// # Errors
    /// Returns an error if a producer fails.
    pub fn persistent_variables(&self) -> Result<Vec<VarId>> {
        let instance = self.instantiate();
        let mut ids = Vec::new();
        for id in &self.order {
            if instance.get(id)?.is_persistent() {
                ids.push(id.clone());
            }
        }
        Ok(ids)
    }

    /// Builds a sampling pool from this model's configuration.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created.
    pub fn sampling_pool(&self) -> Result<SamplingPool> {
        SamplingPool::new(&self.config)
    }

    fn insert(&mut self, id: VarId, producer: Producer) -> Result<()> {
        if self.definitions.contains_key(&id) {
            return Err(ModelError::DuplicateDefinition(id));
        }
        trace!(variable = %id, "Registering variable");
        self.order.push(id.clone());
        self.definitions.insert(id, producer);
        Ok(())
    }

    fn insert_all(&mut self, products: Vec<(VarId, Producer)>) -> Result<()> {
        let mut seen = HashSet::new();
        for (id, _) in &products {
            if self.definitions.contains_key(id) || !seen.insert(id) {
                return Err(ModelError::DuplicateDefinition(id.clone()));
            }
        }
        for (id, producer) in products {
            self.insert(id, producer)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("variables", &self.order)
            .field("objects", &self.objects.len())
            .field("config", &self.config)
            .finish()
    }
}

fn persistent_producer(id: VarId, base: Producer) -> Producer {
    producer(move |inst| base(inst)?.ensure_persistent(&id))
}

/// One resolution of a [`Model`]'s definitions.
///
/// Each id is built at most once per instance and the same variable is returned on every
/// later access. Instances say which variable answers a name; the values drawn from it
/// live in a [`crate::SimulationRun`].
pub struct Instance<'m> {
    model: &'m Model,
    variables: RwLock<HashMap<VarId, RandomVariable>>,
    objects: RwLock<HashMap<String, AnyObject>>,
}

impl<'m> Instance<'m> {
    fn new(model: &'m Model) -> Self {
        Self {
            model,
            variables: RwLock::new(HashMap::new()),
            objects: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// Resolves `id`, building it on first access.
    ///
    /// # Errors
    /// Returns [`ModelError::UndefinedVariable`] if `id` has no definition, or the
    /// producer's error.
    pub fn get(&self, id: impl Into<VarId>) -> Result<RandomVariable> {
        let id = id.into();
        let cached = self
            .variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        if let Some(found) = cached {
            return Ok(found);
        }
        let producer = self
            .model
            .definitions
            .get(&id)
            .ok_or_else(|| ModelError::UndefinedVariable(id.clone()))?;
        let created = producer(self)?;
        Ok(self.remember(&id, created))
    }

    /// Resolves an auxiliary object, building it on first access.
    ///
    /// # Errors
    /// Returns [`ModelError::UndefinedObject`] if `name` has no definition,
    /// [`ModelError::ObjectTypeMismatch`] if it was registered with another type, or the
    /// producer's error.
    pub fn get_object<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let cached = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        let object = match cached {
            Some(object) => object,
            None => {
                let producer = self
                    .model
                    .objects
                    .get(name)
                    .ok_or_else(|| ModelError::UndefinedObject(name.to_string()))?;
                let created = producer(self)?;
                self.objects
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(name.to_string())
                    .or_insert(created)
                    .clone()
            }
        };
        object
            .downcast::<T>()
            .map_err(|_| ModelError::ObjectTypeMismatch(name.to_string()))
    }

    /// Draws `count` joint samples of `ids` on `pool`.
    ///
    /// # Errors
    /// Returns an error if an id cannot be resolved or any observation fails.
    pub fn create_samples(
        &self,
        pool: &SamplingPool,
        seed: u64,
        count: usize,
        ids: &[VarId],
    ) -> Result<SampleSet> {
        let variables = ids
            .iter()
            .map(|id| Ok((id.clone(), self.get(id)?)))
            .collect::<Result<Vec<_>>>()?;
        pool.sample(seed, count, &variables)
    }

    // first writer wins, so concurrent resolutions agree on one variable
    fn remember(&self, id: &VarId, variable: RandomVariable) -> RandomVariable {
        self.variables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_insert(variable)
            .clone()
    }
}

impl std::fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let resolved = self
            .variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Instance")
            .field("resolved", &resolved)
            .finish_non_exhaustive()
    }
}
