use infoecon_rs::{
    AnalysisConfig, CustomVariable, Model, Quantity, RandomSource, RandomVariable, Result,
    SimulationRun, Unit, VarId, VarKind,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Uniformly distributed win probability between 0 and 1.
struct WinProbability;

impl CustomVariable for WinProbability {
    fn observe(&self, rng: &mut RandomSource, _run: &mut SimulationRun) -> Result<Quantity> {
        Ok(Quantity::scalar(rng.next_f64()))
    }

    fn unit(&self) -> Unit {
        Unit::scalar()
    }

    fn kind(&self) -> VarKind {
        VarKind::Distribution
    }
}

/// Play or Not: Value of Knowing the Odds
///
/// A game wins or loses 12 EUR with an unknown probability. Not playing is worth nothing.
/// The analysis shows how much it would be worth to learn the win probability before
/// deciding. Set `RUST_LOG=debug` to follow every outer iteration.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("🎲 Play or Not: Value of Information");
    println!("====================================\n");

    let mut model = Model::with_config(AnalysisConfig {
        value_samples: 20_000,
        overview_samples: 5_000,
        outer_iterations: 200,
        repeats_per_iteration: 5,
        reduced_samples: 2_000,
        report_interval: Duration::from_secs(2),
        ..AnalysisConfig::default()
    });

    model.add_raw_var("p", RandomVariable::custom(WinProbability))?;
    model.add_raw("play", |inst| {
        let win = RandomVariable::fixed(Quantity::of(12.0, "EUR"));
        let lose = RandomVariable::fixed(Quantity::of(-12.0, "EUR"));
        RandomVariable::conditional(&inst.get("p")?, &win, &lose)
    })?;
    model.add_raw_var("not_play", RandomVariable::fixed(Quantity::of(0.0, "EUR")))?;

    let report = model.analyze(1234, &[VarId::named("play"), VarId::named("not_play")])?;

    println!("\n📊 Expected values:");
    for (id, mean) in &report.value_means {
        println!("   {id}: {mean:.2} EUR");
    }
    println!("   Best choice without further information: {}", report.best_choice);

    println!("\n💡 Value of information after {} iterations:", report.iterations);
    for estimate in report.ranked() {
        println!(
            "   {} [{}]: {} EUR",
            estimate.id, estimate.kind, estimate.loss
        );
    }

    let vopi = model.value_of_perfect_information(1234, "play")?;
    println!("\n🔮 Value of perfect information on the outcome of playing: {vopi:.2} EUR");

    Ok(())
}
