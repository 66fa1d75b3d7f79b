//! Parallel batched Monte Carlo sampling.

use crate::config::AnalysisConfig;
use crate::error::{ModelError, Result};
use crate::random::RandomSource;
use crate::run::SimulationRun;
use crate::var_id::VarId;
use crate::variable::RandomVariable;
use rayon::prelude::*;
use tracing::debug;

/// Worker pool for sampling, owned by whoever runs the analysis.
///
/// Draws are split into batches of `batch_size`. Each batch observes against its own
/// sub-stream, spawned from the caller's seed in batch order before any work starts, so
/// the result depends on the seed and never on scheduling.
pub struct SamplingPool {
    pool: rayon::ThreadPool,
    batch_size: usize,
}

impl SamplingPool {
    /// Builds a pool sized by `config.threads`.
    ///
    /// # Errors
    /// Returns an error if the batch size is zero or the threads cannot be spawned.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(ModelError::invalid_sample_count(
                config.batch_size,
                "batch_size must be positive",
            ));
        }
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("infoecon-sampler-{index}"));
        if config.threads > 0 {
            builder = builder.num_threads(config.threads);
        }
        Ok(Self {
            pool: builder.build()?,
            batch_size: config.batch_size,
        })
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Draws `count` joint samples of `variables`.
    ///
    /// Within one draw all variables share a fresh [`SimulationRun`], so a persistent
    /// variable reached from several of them takes one value. The first failing
    /// observation aborts the call, wrapped with the id of the variable being sampled.
    ///
    /// # Errors
    /// Returns an error if `count` is zero or any observation fails.
    pub fn sample(
        &self,
        seed: u64,
        count: usize,
        variables: &[(VarId, RandomVariable)],
    ) -> Result<SampleSet> {
        if count == 0 {
            return Err(ModelError::invalid_sample_count(count, "must be positive"));
        }
        let ids: Vec<VarId> = variables.iter().map(|(id, _)| id.clone()).collect();
        let width = variables.len();
        if width == 0 {
            return Ok(SampleSet::new(ids, Vec::new()));
        }

        let batches = count.div_ceil(self.batch_size);
        let mut parent = RandomSource::seeded(seed);
        let streams: Vec<RandomSource> = (0..batches).map(|_| parent.spawn_child()).collect();
        debug!(seed, count, batches, variables = width, "Sampling");

        // row-major: draw i, variable j lives at i * width + j
        let mut rows = vec![0.0; count * width];
        self.pool.install(|| {
            rows.par_chunks_mut(self.batch_size * width)
                .zip(streams.into_par_iter())
                .try_for_each(|(block, mut rng)| {
                    for row in block.chunks_mut(width) {
                        let mut run = SimulationRun::new();
                        for ((id, variable), slot) in variables.iter().zip(row.iter_mut()) {
                            *slot = variable
                                .observe(&mut rng, &mut run)
                                .map_err(|e| e.in_variable(id))?
                                .number();
                        }
                    }
                    Ok::<(), ModelError>(())
                })
        })?;

        let columns = (0..width)
            .map(|j| rows.iter().skip(j).step_by(width).copied().collect())
            .collect();
        Ok(SampleSet::new(ids, columns))
    }
}

impl std::fmt::Debug for SamplingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingPool")
            .field("threads", &self.threads())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// One column of draws per requested variable, in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSet {
    ids: Vec<VarId>,
    columns: Vec<Vec<f64>>,
}

impl SampleSet {
    fn new(ids: Vec<VarId>, columns: Vec<Vec<f64>>) -> Self {
        Self { ids, columns }
    }

    #[must_use]
    pub fn get(&self, id: &VarId) -> Option<&[f64]> {
        self.ids
            .iter()
            .position(|candidate| candidate == id)
            .map(|index| self.columns[index].as_slice())
    }

    #[must_use]
    pub fn ids(&self) -> &[VarId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &[f64])> {
        self.ids
            .iter()
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Number of draws per column.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn into_columns(self) -> Vec<(VarId, Vec<f64>)> {
        self.ids.into_iter().zip(self.columns).collect()
    }
}
