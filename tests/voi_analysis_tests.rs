//! Integration tests for the value-of-information analysis

#![allow(clippy::float_cmp)]

use infoecon_rs::{
    AnalysisConfig, Mean, Model, Quantity, RandomVariable, ResultHandler, Sample, Unit, VarId,
    VarKind, VoiEstimate,
};
use std::time::Duration;

fn coin_model() -> Model {
    let mut model = Model::with_config(AnalysisConfig {
        value_samples: 10_000,
        overview_samples: 1_000,
        outer_iterations: 40,
        repeats_per_iteration: 5,
        reduced_samples: 2_000,
        report_interval: Duration::from_secs(3_600),
        ..AnalysisConfig::default()
    });
    model
        .add_var(
            "dir",
            RandomVariable::empirical(vec![-1.0, 1.0], Unit::scalar()).unwrap(),
        )
        .unwrap();
    model
        .add_var("val", RandomVariable::fixed(Quantity::of(10.0, "EUR")))
        .unwrap();
    model
        .add("combined", |inst| Ok(inst.get("dir")? * inst.get("val")?))
        .unwrap();
    model
        .add_var("zero", RandomVariable::fixed(Quantity::of(0.0, "EUR")))
        .unwrap();
    model
}

fn alternatives() -> [VarId; 2] {
    [VarId::named("combined"), VarId::named("zero")]
}

#[test]
fn test_value_of_knowing_the_direction() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let report = coin_model().analyze(42, &alternatives()).unwrap();

    let dir = report.estimate(&VarId::named("dir")).unwrap();
    assert_eq!(dir.kind, VarKind::Distribution);
    assert!(
        (dir.loss.get() - 5.0).abs() < 1.5,
        "value of information for dir: {}",
        dir.loss
    );

    let val = report.estimate(&VarId::named("val")).unwrap();
    assert_eq!(val.kind, VarKind::Fixed);
    assert!(val.loss.get() >= 0.0);
    assert!(
        val.loss.get() < 0.5,
        "value of information for val: {}",
        val.loss
    );

    let ranked = report.ranked();
    assert_eq!(ranked[0].id, VarId::named("dir"));
}

#[test]
fn test_best_choice_has_highest_mean() {
    let report = coin_model().analyze(7, &alternatives()).unwrap();
    let best_mean = report
        .value_means
        .iter()
        .find(|(id, _)| id == &report.best_choice)
        .map(|(_, mean)| *mean)
        .unwrap();
    for (_, mean) in &report.value_means {
        assert!(*mean <= best_mean);
    }
}

#[test]
fn test_same_seed_same_report() {
    let mut model = coin_model();
    model.config_mut().outer_iterations = 5;
    let first = model.analyze(3, &alternatives()).unwrap();
    let second = model.analyze(3, &alternatives()).unwrap();
    assert_eq!(first, second);
}

struct SummaryCollector {
    overview: Vec<(VarId, Sample)>,
    last: Vec<VoiEstimate>,
}

impl ResultHandler for SummaryCollector {
    fn value_variables(&mut self, samples: &[(VarId, Sample)], _best_choice: &VarId) {
        for (_, sample) in samples {
            assert_eq!(sample.unit(), &Unit::of("EUR"));
        }
    }

    fn variable_overview(&mut self, samples: &[(VarId, Sample)]) {
        self.overview = samples.to_vec();
    }

    fn value_of_information(&mut self, _iteration: usize, estimates: &[VoiEstimate]) {
        self.last = estimates.to_vec();
    }
}

#[test]
fn test_overview_describes_inputs() {
    let mut model = coin_model();
    model.config_mut().outer_iterations = 2;
    let mut collector = SummaryCollector {
        overview: Vec::new(),
        last: Vec::new(),
    };
    let report = model
        .analyze_with(1, &mut collector, &alternatives())
        .unwrap();

    let (dir_id, dir) = &collector.overview[0];
    assert_eq!(dir_id, &VarId::named("dir"));
    assert_eq!(dir.len(), 1_000);
    assert_eq!(dir.min(), -1.0);
    assert_eq!(dir.max(), 1.0);

    let (val_id, val) = &collector.overview[1];
    assert_eq!(val_id, &VarId::named("val"));
    assert_eq!(val.mean_quantity(), Quantity::of(10.0, "EUR"));

    assert_eq!(collector.last, report.estimates);
}

#[test]
fn test_value_of_perfect_information() {
    let mut model = Model::new();
    model
        .add_var(
            "payoff",
            RandomVariable::empirical(vec![-30.0, 10.0, 10.0, 10.0], Unit::of("EUR")).unwrap(),
        )
        .unwrap();
    // wrong on a quarter of the draws by 30, or on three quarters by 10
    let vopi = model.value_of_perfect_information(5, "payoff").unwrap();
    assert!((vopi - 7.5).abs() < 0.5, "{vopi}");

    let exact = infoecon_rs::statistics::value_of_perfect_information(&[-30.0, 10.0, 10.0, 10.0])
        .unwrap();
    assert_eq!(exact, 7.5);
    assert!(Mean::of(&[exact]).is_defined());
}
