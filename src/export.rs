//! Semicolon-separated export of sampled distributions.

use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::quantity::format_decimal_comma;
use crate::random::RandomSource;
use crate::run::SimulationRun;
use crate::var_id::VarId;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const FRACTION_DIGITS: usize = 5;

impl Model {
    /// Writes every persistent variable, and every further value persisted along the way,
    /// to a file at `path`.
    ///
    /// Returns the exported columns.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written or an observation fails.
    pub fn export_distributions(&self, path: impl AsRef<Path>, seed: u64) -> Result<Vec<VarId>> {
        let columns = self.distribution_columns(seed)?;
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_distributions(&mut writer, seed, &columns)?;
        writer.flush()?;
        info!(
            path = %path.as_ref().display(),
            columns = columns.len(),
            rows = self.config().export_rows,
            "Exported distributions"
        );
        Ok(columns)
    }

    /// The persistent variables in registration order, followed by every other id a draw
    /// of them persists, sorted.
    ///
    /// # Errors
    /// Returns an error if a producer or an observation fails.
    pub fn distribution_columns(&self, seed: u64) -> Result<Vec<VarId>> {
        let mut columns = self.persistent_variables()?;
        let instance = self.instantiate();
        let mut rng = RandomSource::seeded(seed);
        let mut run = SimulationRun::new();
        for id in &columns {
            instance
                .get(id)?
                .observe(&mut rng, &mut run)
                .map_err(|e| e.in_variable(id))?;
        }
        let mut additional: Vec<VarId> = run
            .persistent_value_ids()
            .iter()
            .filter(|id| !columns.contains(id))
            .cloned()
            .collect();
        additional.sort();
        columns.extend(additional);
        Ok(columns)
    }

    /// Writes `export_rows` draws of `columns`, one line per draw.
    ///
    /// The header is `i` followed by `<id> (<unit>)` for each model definition and the bare
    /// id for any other column. Every row starts with its zero-based index. Values use a
    /// decimal comma and at most five fraction digits. Columns that are not definitions
    /// must be persisted while observing the definitions.
    ///
    /// # Errors
    /// Returns an error if writing fails, an observation fails, or a column has no value.
    ///
    /// # Example
    /// ```rust
    /// use infoecon_rs::{AnalysisConfig, Model, Quantity, RandomVariable, VarId};
    ///
    /// let mut model = Model::with_config(AnalysisConfig {
    ///     export_rows: 2,
    ///     ..AnalysisConfig::default()
    /// });
    /// model.add_var("fee", RandomVariable::fixed(Quantity::of(2.5, "EUR"))).unwrap();
    ///
    /// let mut out = Vec::new();
    /// model.write_distributions(&mut out, 1, &[VarId::named("fee")]).unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(), "i;fee (EUR)\n0;2,5\n1;2,5\n");
    /// ```
    pub fn write_distributions<W: Write>(
        &self,
        mut writer: W,
        seed: u64,
        columns: &[VarId],
    ) -> Result<()> {
        let instance = self.instantiate();
        let mut variables = Vec::with_capacity(columns.len());
        write!(writer, "i")?;
        for id in columns {
            if self.contains(id) {
                let variable = instance.get(id)?;
                write!(writer, ";{id} ({})", variable.unit())?;
                variables.push(Some(variable));
            } else {
                write!(writer, ";{id}")?;
                variables.push(None);
            }
        }
        writeln!(writer)?;

        let mut rng = RandomSource::seeded(seed);
        for row in 0..self.config().export_rows {
            let mut run = SimulationRun::new();
            let mut observed = Vec::with_capacity(columns.len());
            for (id, variable) in columns.iter().zip(&variables) {
                let value = match variable {
                    Some(variable) => Some(
                        variable
                            .observe(&mut rng, &mut run)
                            .map_err(|e| e.in_variable(id))?,
                    ),
                    None => None,
                };
                observed.push(value);
            }

            write!(writer, "{row}")?;
            for (id, value) in columns.iter().zip(observed) {
                let number = match run.persistent_value(id) {
                    Ok(persisted) => persisted.number(),
                    Err(_) => value
                        .ok_or_else(|| ModelError::NotPersisted(id.clone()))?
                        .number(),
                };
                write!(writer, ";{}", format_decimal_comma(number, FRACTION_DIGITS))?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}
