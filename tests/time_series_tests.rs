//! Integration tests for time series built on model variables

#![allow(clippy::float_cmp)]

mod common;

use common::SequenceVariable;
use infoecon_rs::series::{self, value_at};
use infoecon_rs::{
    ConcreteSeries, DealsOverTimeSeries, ExponentialGrowthSeries, Instance, Model, Quantity,
    RandomSource, RandomVariable, Repeat, SimulationRun, TimeSeries, Unit,
};
use std::sync::Arc;

fn observe_year(
    series: &impl TimeSeries,
    year: usize,
    inst: &Instance<'_>,
    rng: &mut RandomSource,
    run: &mut SimulationRun,
) -> f64 {
    series.at(year, inst).unwrap().observe(rng, run).unwrap().number()
}

#[test]
fn test_exponential_growth_first_year_is_base() {
    let mut model = Model::new();
    model
        .add_var("base", RandomVariable::custom(SequenceVariable::new(&[10.0, 11.0])))
        .unwrap();
    model
        .add_var("exp", RandomVariable::custom(SequenceVariable::new(&[2.0, 4.0])))
        .unwrap();
    let growth = ExponentialGrowthSeries::new("base", "exp");
    let inst = model.instantiate();
    let mut rng = RandomSource::seeded(0);

    let mut run1 = SimulationRun::new();
    assert_eq!(observe_year(&growth, 0, &inst, &mut rng, &mut run1), 10.0);
    let mut run2 = SimulationRun::new();
    assert_eq!(observe_year(&growth, 0, &inst, &mut rng, &mut run2), 11.0);
}

#[test]
fn test_exponential_growth_shares_draws_across_years() {
    let mut model = Model::new();
    model
        .add_var("base", RandomVariable::custom(SequenceVariable::new(&[10.0, 6.0])))
        .unwrap();
    model
        .add_var("exp", RandomVariable::custom(SequenceVariable::new(&[2.0, 3.0])))
        .unwrap();
    let growth = ExponentialGrowthSeries::new("base", "exp");
    let inst = model.instantiate();
    let mut rng = RandomSource::seeded(0);

    let mut run1 = SimulationRun::new();
    assert_eq!(observe_year(&growth, 2, &inst, &mut rng, &mut run1), 40.0);
    assert_eq!(observe_year(&growth, 3, &inst, &mut rng, &mut run1), 80.0);
    assert_eq!(observe_year(&growth, 1, &inst, &mut rng, &mut run1), 20.0);

    let mut run2 = SimulationRun::new();
    assert_eq!(observe_year(&growth, 1, &inst, &mut rng, &mut run2), 18.0);
    assert_eq!(observe_year(&growth, 2, &inst, &mut rng, &mut run2), 54.0);
    assert_eq!(observe_year(&growth, 3, &inst, &mut rng, &mut run2), 162.0);
}

fn deals_model(counts: &[f64]) -> (Model, Arc<DealsOverTimeSeries>) {
    let mut model = Model::new();
    let mut ids = Vec::new();
    for (year, count) in counts.iter().enumerate() {
        let id = format!("count_{year}");
        model.add_var(id.as_str(), RandomVariable::scalar(*count)).unwrap();
        ids.push(id);
    }
    model
        .add_var("size", RandomVariable::fixed(Quantity::of(100.0, "EUR")))
        .unwrap();
    model
        .add_var("factor", RandomVariable::scalar(0.11))
        .unwrap();
    model
        .add_var("duration", RandomVariable::scalar(2.0))
        .unwrap();
    let counts = ConcreteSeries::new(Repeat::None, ids).unwrap();
    let deals = Arc::new(DealsOverTimeSeries::new(
        counts, "size", "factor", "duration",
    ));
    (model, deals)
}

#[test]
fn test_deals_accrue_initial_and_maintenance_payments() {
    let (mut model, deals) = deals_model(&[0.0, 1.0, 2.0, 0.0, 1.0, 1.0]);
    for year in 0..6 {
        model
            .add(format!("deals_{year}"), value_at(&deals, year))
            .unwrap();
    }
    let inst = model.instantiate();
    let mut rng = RandomSource::seeded(0);
    let mut run = SimulationRun::new();

    // out of order, and every year twice within the same run
    for (year, expected) in [(2, 211.0), (4, 122.0), (1, 100.0), (3, 33.0), (5, 111.0), (0, 0.0)] {
        let variable = inst.get(format!("deals_{year}")).unwrap();
        assert_eq!(variable.unit(), &Unit::of("EUR"));
        for _ in 0..2 {
            let q = variable.observe(&mut rng, &mut run).unwrap();
            assert!(
                (q.number() - expected).abs() < 1e-9,
                "year {year}: {q} instead of {expected}"
            );
        }
    }
}

#[test]
fn test_deals_totals_are_reproducible_per_run() {
    let (model, deals) = deals_model(&[0.0, 1.0, 2.0, 0.0, 1.0, 1.0]);
    let inst = model.instantiate();
    let year_three = deals.at(3, &inst).unwrap();
    let year_five = deals.at(5, &inst).unwrap();

    let mut rng = RandomSource::seeded(9);
    let mut run = SimulationRun::new();
    let five = year_five.observe(&mut rng, &mut run).unwrap();
    let three = year_three.observe(&mut rng, &mut run).unwrap();
    assert_eq!(three.number(), 33.0);
    assert!((five.number() - 111.0).abs() < 1e-9);
    assert_eq!(year_three.observe(&mut rng, &mut run).unwrap(), three);
}

#[test]
fn test_fractional_deal_counts_round_stochastically() {
    let (mut model, deals) = deals_model(&[0.5]);
    model.add("first_year", value_at(&deals, 0)).unwrap();
    let mean = model
        .instantiate()
        .get("first_year")
        .unwrap()
        .mean(3, 20_000)
        .unwrap()
        .get();
    assert!((mean - 50.0).abs() < 1.5, "mean {mean}");
}

#[test]
fn test_collapsed_deals() {
    let (mut model, deals) = deals_model(&[1.0, 1.0, 1.0]);
    model.add("total", series::sum_over(&deals, 0, 2)).unwrap();
    let q = model
        .instantiate()
        .get("total")
        .unwrap()
        .observe(&mut RandomSource::seeded(0), &mut SimulationRun::new())
        .unwrap();
    // 3 x 100 initial, 11 + 22 maintenance inside the range
    assert!((q.number() - 333.0).abs() < 1e-9, "{q}");
}
