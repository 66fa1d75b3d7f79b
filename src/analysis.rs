//! Value-of-information analysis over competing decision alternatives.
//!
//! The analysis samples the value variables under the full model to pick the best choice,
//! then repeatedly pins one input variable to a single draw and checks how much better the
//! decision would be with that knowledge. The mean of that improvement is the value of
//! information of the input.

use crate::error::{ModelError, Result};
use crate::model::{Instance, Model};
use crate::random::RandomSource;
use crate::run::SimulationRun;
use crate::sampler::{SampleSet, SamplingPool};
use crate::statistics::{self, Mean, Sample};
use crate::var_id::VarId;
use crate::variable::VarKind;
use std::time::Instant;
use tracing::{debug, info};

/// Value of information estimated for one input variable.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiEstimate {
    pub id: VarId,
    pub kind: VarKind,
    /// Running mean of the decision improvement, in the unit of the value variables
    pub loss: Mean,
}

/// Receives the intermediate and final results of [`Model::analyze_with`].
pub trait ResultHandler {
    /// Summary of every value variable under the full model, in request order.
    fn value_variables(&mut self, samples: &[(VarId, Sample)], best_choice: &VarId);

    /// Summary of every other variable, sorted by id.
    fn variable_overview(&mut self, samples: &[(VarId, Sample)]);

    /// Current estimates in registration order. `iteration` counts completed outer
    /// iterations; the final call passes the full iteration budget.
    fn value_of_information(&mut self, iteration: usize, estimates: &[VoiEstimate]);
}

/// Renders analysis results as `tracing` events at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ResultHandler for TracingReporter {
    fn value_variables(&mut self, samples: &[(VarId, Sample)], best_choice: &VarId) {
        for (id, sample) in samples {
            info!(
                variable = %id,
                mean = %sample.mean_quantity(),
                "Value variable\n{sample}"
            );
        }
        info!(best = %best_choice, "Choice with best expected value");
    }

    fn variable_overview(&mut self, samples: &[(VarId, Sample)]) {
        for (id, sample) in samples {
            info!(variable = %id, "Remaining variable\n{sample}");
        }
    }

    fn value_of_information(&mut self, iteration: usize, estimates: &[VoiEstimate]) {
        for estimate in ranked(estimates) {
            info!(
                iteration,
                kind = %estimate.kind,
                variable = %estimate.id,
                value = %estimate.loss,
                "Value of information"
            );
        }
    }
}

/// Final outcome of a value-of-information analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiReport {
    pub best_choice: VarId,
    /// Mean of each value variable under the full model, in request order
    pub value_means: Vec<(VarId, f64)>,
    /// One estimate per input variable, in registration order
    pub estimates: Vec<VoiEstimate>,
    pub iterations: usize,
}

impl VoiReport {
    #[must_use]
    pub fn estimate(&self, id: &VarId) -> Option<&VoiEstimate> {
        self.estimates.iter().find(|estimate| &estimate.id == id)
    }

    /// Estimates ordered from most to least valuable.
    #[must_use]
    pub fn ranked(&self) -> Vec<&VoiEstimate> {
        ranked(&self.estimates)
    }
}

fn ranked(estimates: &[VoiEstimate]) -> Vec<&VoiEstimate> {
    let mut sorted: Vec<&VoiEstimate> = estimates.iter().collect();
    sorted.sort_by(|a, b| b.loss.get().total_cmp(&a.loss.get()));
    sorted
}

impl Model {
    /// Runs the value-of-information analysis and reports through [`TracingReporter`].
    ///
    /// # Errors
    /// See [`Model::analyze_with`].
    pub fn analyze(&self, seed: u64, value_ids: &[VarId]) -> Result<VoiReport> {
        self.analyze_with(seed, &mut TracingReporter, value_ids)
    }

    /// Runs the value-of-information analysis for the alternatives `value_ids`.
    ///
    /// Every registered id that is not a value variable is treated as an input. The
    /// sampling pool lives for the duration of the call.
    ///
    /// # Errors
    /// Returns [`ModelError::TooFewValueVariables`] for fewer than two alternatives, an
    /// error if the configuration is invalid, or the first failure of any producer or
    /// observation.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{AnalysisConfig, Model, Quantity, RandomVariable, Unit, VarId};
    ///
    /// let mut model = Model::with_config(AnalysisConfig {
    ///     value_samples: 1_000,
    ///     overview_samples: 100,
    ///     outer_iterations: 2,
    ///     repeats_per_iteration: 2,
    ///     reduced_samples: 200,
    ///     ..AnalysisConfig::default()
    /// });
    /// model.add_var("gain", RandomVariable::normal(1.0, 5.0, Unit::of("EUR")).unwrap()).unwrap();
    /// model.add_var("nothing", RandomVariable::fixed(Quantity::of(0.0, "EUR"))).unwrap();
    /// model.add_raw("play", |inst| inst.get("gain")).unwrap();
    ///
    /// let report = model
    ///     .analyze(7, &[VarId::named("play"), VarId::named("nothing")])
    ///     .unwrap();
    /// assert_eq!(report.estimates.len(), 1);
    /// assert!(report.estimates[0].loss.get() >= 0.0);
    /// ```
    pub fn analyze_with<H>(
        &self,
        seed: u64,
        handler: &mut H,
        value_ids: &[VarId],
    ) -> Result<VoiReport>
    where
        H: ResultHandler + ?Sized,
    {
        if value_ids.len() < 2 {
            return Err(ModelError::TooFewValueVariables(value_ids.len()));
        }
        let config = self.config();
        config.validate()?;
        let pool = SamplingPool::new(config)?;
        let inputs: Vec<VarId> = self
            .ids()
            .iter()
            .filter(|id| !value_ids.contains(id))
            .cloned()
            .collect();
        info!(
            seed,
            alternatives = value_ids.len(),
            inputs = inputs.len(),
            threads = pool.threads(),
            "Starting value of information analysis"
        );

        let full = self.instantiate();
        let full_samples = full.create_samples(&pool, seed, config.value_samples, value_ids)?;
        let best = best_choice(&full_samples).ok_or(ModelError::TooFewValueVariables(0))?;
        let value_means = full_samples
            .iter()
            .map(|(id, column)| (id.clone(), Mean::of(column).get()))
            .collect();
        handler.value_variables(&with_units(&full, full_samples)?, &best);

        let mut overview_ids = inputs.clone();
        overview_ids.sort();
        let overview = full.create_samples(&pool, seed, config.overview_samples, &overview_ids)?;
        handler.variable_overview(&with_units(&full, overview)?);

        let mut estimates = inputs
            .iter()
            .map(|id| {
                Ok(VoiEstimate {
                    id: id.clone(),
                    kind: full.get(id)?.kind(),
                    loss: Mean::undefined(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sample_rng = RandomSource::seeded(seed);
        let mut last_report = Instant::now();
        for j in 0..config.outer_iterations {
            for estimate in &mut estimates {
                for i in 0..config.repeats_per_iteration {
                    let iteration_seed = seed
                        .wrapping_add(i as u64)
                        .wrapping_add(100 * j as u64);
                    let known = full
                        .get(&estimate.id)?
                        .observe(&mut sample_rng, &mut SimulationRun::new())
                        .map_err(|e| e.in_variable(&estimate.id))?;
                    let reduced = self.instantiate_with_fixed(&estimate.id, known);
                    let samples = reduced.create_samples(
                        &pool,
                        iteration_seed,
                        config.reduced_samples,
                        value_ids,
                    )?;
                    let informed = best_choice(&samples).unwrap_or_else(|| best.clone());
                    let loss: Vec<f64> = column(&samples, &informed)?
                        .iter()
                        .zip(column(&samples, &best)?)
                        .map(|(with_info, without)| with_info - without)
                        .collect();
                    estimate.loss = estimate.loss.add(&Mean::of(&loss));
                }
            }
            debug!(iteration = j + 1, "Outer iteration complete");
            if last_report.elapsed() >= config.report_interval {
                last_report = Instant::now();
                handler.value_of_information(j + 1, &estimates);
            }
        }
        handler.value_of_information(config.outer_iterations, &estimates);
        info!(
            iterations = config.outer_iterations,
            "Value of information analysis finished"
        );

        Ok(VoiReport {
            best_choice: best,
            value_means,
            estimates,
            iterations: config.outer_iterations,
        })
    }

    /// Expected cost of deciding on the sign of `id` without knowing it.
    ///
    /// # Errors
    /// Returns an error if `id` cannot be resolved or sampled.
    pub fn value_of_perfect_information(&self, seed: u64, id: impl Into<VarId>) -> Result<f64> {
        let id = id.into();
        let pool = self.sampling_pool()?;
        let samples = self.instantiate().create_samples(
            &pool,
            seed,
            self.config().value_samples,
            std::slice::from_ref(&id),
        )?;
        statistics::value_of_perfect_information(column(&samples, &id)?)
    }
}

/// The id with the highest sample mean; the first one wins ties.
fn best_choice(samples: &SampleSet) -> Option<VarId> {
    let mut best: Option<(&VarId, f64)> = None;
    for (id, numbers) in samples.iter() {
        let mean = Mean::of(numbers).get();
        if best.is_none_or(|(_, current)| mean > current) {
            best = Some((id, mean));
        }
    }
    best.map(|(id, _)| id.clone())
}

fn column<'s>(samples: &'s SampleSet, id: &VarId) -> Result<&'s [f64]> {
    samples
        .get(id)
        .ok_or_else(|| ModelError::UndefinedVariable(id.clone()))
}

fn with_units(instance: &Instance<'_>, samples: SampleSet) -> Result<Vec<(VarId, Sample)>> {
    samples
        .into_columns()
        .into_iter()
        .map(|(id, numbers)| {
            let unit = instance.get(&id)?.unit().clone();
            Ok((id, Sample::new(numbers, unit)?))
        })
        .collect()
}
