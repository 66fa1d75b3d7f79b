//! # infoecon-rs
//!
//! Monte Carlo decision analysis with unit-checked random variables.
//!
//! A decision model declares uncertain inputs as distributions with units, combines them
//! into the payoffs of competing alternatives and asks which input is worth learning more
//! about before deciding. The answer is the *value of information*: the expected gain from
//! deciding with the input known instead of unknown.
//!
//! ```rust
//! use infoecon_rs::{AnalysisConfig, Model, Quantity, RandomVariable, Unit, VarId};
//!
//! let mut model = Model::with_config(AnalysisConfig {
//!     value_samples: 2_000,
//!     overview_samples: 200,
//!     outer_iterations: 5,
//!     repeats_per_iteration: 2,
//!     reduced_samples: 500,
//!     ..AnalysisConfig::default()
//! });
//!
//! // Will the campaign pay for itself?
//! model.add_var("reach", RandomVariable::normal_95(1_000.0, 5_000.0, Unit::scalar()).unwrap()).unwrap();
//! model.add_var("margin", RandomVariable::block(0.5, 2.0, Unit::of("EUR")).unwrap()).unwrap();
//! model.add_var("cost", RandomVariable::fixed(Quantity::of(3_000.0, "EUR"))).unwrap();
//! model
//!     .add("campaign", |inst| Ok(inst.get("reach")? * inst.get("margin")? - inst.get("cost")?))
//!     .unwrap();
//! model.add_var("status_quo", RandomVariable::fixed(Quantity::of(0.0, "EUR"))).unwrap();
//!
//! let report = model
//!     .analyze(42, &[VarId::named("campaign"), VarId::named("status_quo")])
//!     .unwrap();
//! for estimate in report.ranked() {
//!     println!("{} {}: {}", estimate.kind, estimate.id, estimate.loss);
//! }
//! ```
//!
//! ## Layers
//!
//! - [`Unit`] and [`Quantity`]: numbers with dimensional units, checked on every sum
//! - [`RandomVariable`]: an immutable expression graph of distributions and combinators
//! - [`SimulationRun`]: the memo of one draw, so a shared variable takes one value per draw
//! - [`Model`] and [`Instance`]: named definitions, resolved lazily and at most once
//! - [`SamplingPool`]: reproducible batched sampling on a rayon pool
//! - [`Model::analyze`]: the value-of-information analysis
//! - [`series`]: time series composed from named variables

pub mod analysis;
pub mod config;
pub mod distributions;
pub mod error;
pub mod export;
pub mod model;
pub mod operations;
pub mod quantity;
pub mod random;
pub mod run;
pub mod sampler;
pub mod series;
pub mod statistics;
pub mod traits;
pub mod unit;
pub mod unknown;
pub mod var_id;
pub mod variable;

pub use analysis::{ResultHandler, TracingReporter, VoiEstimate, VoiReport};
pub use config::AnalysisConfig;
pub use distributions::{Between, NORMAL_TAIL_FACTOR, StdDist};
pub use error::{ModelError, Result};
pub use model::{Instance, Model, MultiVariableFactory, Producer, producer};
pub use operations::BinaryOperation;
pub use quantity::Quantity;
pub use random::RandomSource;
pub use run::{PersistentObject, SimulationRun};
pub use sampler::{SampleSet, SamplingPool};
pub use series::{
    CombinedSeries, ConcreteSeries, ConditionalSeries, DealsOverTimeSeries, DelayedSeries,
    DifferentialSeries, ExponentialGrowthSeries, LinearGrowthSeries, Repeat, ScaledSeries,
    ShrinkAfterSeries, TimeSeries,
};
pub use statistics::{Mean, Sample};
pub use traits::CustomVariable;
pub use unit::Unit;
pub use unknown::UnknownDistribution;
pub use var_id::VarId;
pub use variable::{RandomVariable, VarKind};
