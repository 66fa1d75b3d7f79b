//! Integration tests for parallel sampling
//!
//! Tests that batched sampling on a thread pool is reproducible and keeps the per-draw
//! semantics of persistent variables.

#![allow(clippy::float_cmp, clippy::cast_precision_loss)]

use infoecon_rs::{
    AnalysisConfig, Model, ModelError, Quantity, RandomVariable, SamplingPool, Unit, VarId,
};

fn pool(threads: usize, batch_size: usize) -> SamplingPool {
    SamplingPool::new(&AnalysisConfig {
        threads,
        batch_size,
        ..AnalysisConfig::default()
    })
    .unwrap()
}

fn cost_model() -> Model {
    let mut model = Model::new();
    model
        .add_var(
            "hours",
            RandomVariable::normal_95(10.0, 20.0, Unit::of("h")).unwrap(),
        )
        .unwrap();
    model
        .add_var(
            "rate",
            RandomVariable::block(50.0, 70.0, Unit::of("EUR").div(&Unit::of("h"))).unwrap(),
        )
        .unwrap();
    model
        .add("cost", |inst| Ok(inst.get("hours")? * inst.get("rate")?))
        .unwrap();
    model
}

#[test]
fn test_parallel_sampling_produces_valid_results() {
    let model = cost_model();
    let samples = model
        .instantiate()
        .create_samples(&pool(4, 100), 1, 10_000, &[VarId::named("hours")])
        .unwrap();
    let hours = samples.get(&VarId::named("hours")).unwrap();
    assert_eq!(hours.len(), 10_000);

    let mean = hours.iter().sum::<f64>() / hours.len() as f64;
    assert!((mean - 15.0).abs() < 0.2, "Mean {mean} is too far from 15");

    let inside = hours.iter().filter(|h| (10.0..20.0).contains(*h)).count();
    let share = inside as f64 / hours.len() as f64;
    assert!((share - 0.9).abs() < 0.02, "Share {share} inside the 90% range");
}

#[test]
fn test_reproducible_across_thread_counts() {
    let model = cost_model();
    let ids = [VarId::named("hours"), VarId::named("cost")];
    let single = model
        .instantiate()
        .create_samples(&pool(1, 100), 77, 5_000, &ids)
        .unwrap();
    for threads in [2, 3, 8] {
        let parallel = model
            .instantiate()
            .create_samples(&pool(threads, 100), 77, 5_000, &ids)
            .unwrap();
        assert_eq!(single, parallel, "{threads} threads diverged");
    }
}

#[test]
fn test_batch_size_changes_streams_but_not_statistics() {
    let model = cost_model();
    let ids = [VarId::named("cost")];
    let small = model
        .instantiate()
        .create_samples(&pool(2, 10), 5, 20_000, &ids)
        .unwrap();
    let large = model
        .instantiate()
        .create_samples(&pool(2, 1_000), 5, 20_000, &ids)
        .unwrap();

    let mean = |set: &infoecon_rs::SampleSet| {
        let column = set.get(&VarId::named("cost")).unwrap();
        column.iter().sum::<f64>() / column.len() as f64
    };
    assert_ne!(small, large);
    assert!(
        (mean(&small) - mean(&large)).abs() < 15.0,
        "{} vs {}",
        mean(&small),
        mean(&large)
    );
}

#[test]
fn test_persistent_inputs_are_consistent_within_each_draw() {
    let model = cost_model();
    let ids = [
        VarId::named("hours"),
        VarId::named("rate"),
        VarId::named("cost"),
    ];
    let samples = model
        .instantiate()
        .create_samples(&pool(4, 50), 3, 2_000, &ids)
        .unwrap();
    let hours = samples.get(&ids[0]).unwrap();
    let rate = samples.get(&ids[1]).unwrap();
    let cost = samples.get(&ids[2]).unwrap();
    for i in 0..samples.draws() {
        assert_eq!(hours[i] * rate[i], cost[i], "draw {i}");
    }
}

#[test]
fn test_failure_aborts_sampling_with_variable_name() {
    let mut model = Model::new();
    model
        .add_var("money", RandomVariable::fixed(Quantity::of(1.0, "EUR")))
        .unwrap();
    model
        .add_var("time", RandomVariable::fixed(Quantity::of(1.0, "h")))
        .unwrap();
    model
        .add("nonsense", |inst| Ok(inst.get("money")? + inst.get("time")?))
        .unwrap();

    let result = model.instantiate().create_samples(
        &pool(4, 100),
        0,
        1_000,
        &[VarId::named("money"), VarId::named("nonsense")],
    );
    match result {
        Err(ModelError::Sampling { variable, source }) => {
            assert_eq!(variable, VarId::named("nonsense"));
            assert!(matches!(*source, ModelError::IncompatibleUnits { .. }));
        }
        other => panic!("expected a sampling error, got {other:?}"),
    }
}
