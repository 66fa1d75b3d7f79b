use crate::error::Result;
use crate::quantity::Quantity;
use crate::random::RandomSource;
use crate::run::SimulationRun;
use crate::unit::Unit;
use crate::variable::VarKind;

/// Caller-supplied observation logic for variables the built-in catalog does not cover.
///
/// Implementations must be shareable across sampling threads. Any state that has to stay
/// stable within one draw belongs in the [`SimulationRun`], never in `self`.
pub trait CustomVariable: Send + Sync {
    /// Observes one value.
    ///
    /// # Errors
    /// Implementations report their own failures; they are wrapped with the failing
    /// variable's id by the sampler.
    fn observe(&self, rng: &mut RandomSource, run: &mut SimulationRun) -> Result<Quantity>;

    /// The unit of every value [`CustomVariable::observe`] returns.
    fn unit(&self) -> Unit;

    fn kind(&self) -> VarKind {
        VarKind::Combined
    }
}
