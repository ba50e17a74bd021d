use autotab_core::preprocess::{FitOptions, Preprocessor};
use autotab_core::{FitError, fit_pipeline};
use autotab_model::{Column, FeatureType, ProblemType, RawValue, Table};

fn numbers(name: &str, values: &[f64]) -> Column {
    Column::new(name, values.iter().map(|v| RawValue::Number(*v)).collect())
}

fn texts(name: &str, values: &[&str]) -> Column {
    Column::new(
        name,
        values.iter().map(|v| RawValue::Text((*v).to_string())).collect(),
    )
}

/// The canonical upload: an id column, two numerics, a categorical, and a
/// binary target.
fn customer_table() -> Table {
    Table::new(vec![
        numbers("customer_id", &(1..=10).map(|i| i as f64).collect::<Vec<_>>()),
        numbers("age", &[25.0, 32.0, 47.0, 51.0, 38.0, 29.0, 41.0, 36.0, 58.0, 44.0]),
        numbers(
            "income",
            &[
                48000.0, 52000.0, 61000.0, 75000.0, 55000.0, 43000.0, 68000.0, 59000.0, 82000.0,
                64000.0,
            ],
        ),
        texts(
            "category",
            &["basic", "premium", "basic", "premium", "basic", "basic", "premium", "basic",
              "premium", "basic"],
        ),
        numbers("target", &[0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]),
    ])
}

#[test]
fn end_to_end_fit_on_customer_table() {
    let artifacts = fit_pipeline(&customer_table(), "target", &FitOptions::default()).unwrap();

    assert_eq!(artifacts.problem_type, ProblemType::Classification);
    assert_eq!(
        artifacts.contract.dropped_columns,
        vec!["customer_id".to_string()]
    );
    assert_eq!(
        artifacts.contract.feature_columns,
        vec!["age".to_string(), "income".to_string(), "category".to_string()]
    );
    assert_eq!(
        artifacts.contract.feature_type("category"),
        FeatureType::Categorical
    );
    let mapping = &artifacts.contract.categorical_mappings["category"];
    assert_eq!(mapping["basic"], 0);
    assert_eq!(mapping["premium"], 1);

    // Numeric target: no inverse label mapping.
    assert!(artifacts.contract.target_mapping.is_none());

    // Stats reflect the original training distribution.
    let age_stats = &artifacts.contract.numeric_stats["age"];
    assert_eq!(age_stats.min, 25.0);
    assert_eq!(age_stats.max, 58.0);
    assert!(age_stats.is_integer);

    // 10 rows at 20% held out.
    assert_eq!(artifacts.train_features.n_rows(), 8);
    assert_eq!(artifacts.test_features.n_rows(), 2);
    assert_eq!(artifacts.train_features.n_features(), 3);
    assert_eq!(artifacts.train_labels.len(), 8);

    artifacts.contract.validate().unwrap();
}

#[test]
fn fit_is_deterministic_for_fixed_options() {
    let table = customer_table();
    let first = fit_pipeline(&table, "target", &FitOptions::default()).unwrap();
    let second = fit_pipeline(&table, "target", &FitOptions::default()).unwrap();
    assert_eq!(first.train_features, second.train_features);
    assert_eq!(first.test_features, second.test_features);
    assert_eq!(first.train_labels, second.train_labels);
    assert_eq!(first.contract, second.contract);
}

#[test]
fn text_target_gets_an_inverse_mapping() {
    let table = Table::new(vec![
        numbers("age", &[25.0, 32.0, 47.0, 51.0, 38.0, 29.0]),
        texts("outcome", &["no", "yes", "no", "yes", "no", "no"]),
    ]);
    let artifacts = fit_pipeline(&table, "outcome", &FitOptions::default()).unwrap();
    assert_eq!(artifacts.problem_type, ProblemType::Classification);
    let mapping = artifacts.contract.target_mapping.as_ref().unwrap();
    assert_eq!(mapping.get(&0).map(String::as_str), Some("no"));
    assert_eq!(mapping.get(&1).map(String::as_str), Some("yes"));
    // Labels carry the encoded codes.
    for label in artifacts.train_labels.iter().chain(&artifacts.test_labels) {
        assert!(*label == 0.0 || *label == 1.0);
    }
}

#[test]
fn regression_target_keeps_raw_labels() {
    let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 3.7).collect();
    let sizes: Vec<f64> = (0..40).map(|i| 20.0 + (i % 7) as f64 * 5.0).collect();
    let table = Table::new(vec![numbers("size", &sizes), numbers("price", &prices)]);
    let artifacts = fit_pipeline(&table, "price", &FitOptions::default()).unwrap();
    assert_eq!(artifacts.problem_type, ProblemType::Regression);
    assert!(artifacts.contract.target_mapping.is_none());
}

#[test]
fn single_class_target_is_legal() {
    let table = Table::new(vec![
        numbers("age", &[25.0, 32.0, 47.0, 51.0]),
        numbers("target", &[1.0, 1.0, 1.0, 1.0]),
    ]);
    let artifacts = fit_pipeline(&table, "target", &FitOptions::default()).unwrap();
    assert_eq!(
        artifacts.train_labels.len() + artifacts.test_labels.len(),
        4
    );
}

#[test]
fn all_categorical_table_is_legal() {
    let table = Table::new(vec![
        texts("color", &["red", "blue", "red", "blue", "red", "red"]),
        texts("shape", &["round", "square", "round", "round", "square", "round"]),
        numbers("target", &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]),
    ]);
    let artifacts = fit_pipeline(&table, "target", &FitOptions::default()).unwrap();
    assert_eq!(artifacts.contract.feature_columns.len(), 2);
    assert!(artifacts.contract.is_categorical("color"));
    assert!(artifacts.contract.is_categorical("shape"));
}

#[test]
fn missing_target_is_surfaced() {
    let table = Table::new(vec![numbers("x", &[1.0, 2.0, 3.0])]);
    let error = fit_pipeline(&table, "label", &FitOptions::default()).unwrap_err();
    assert!(matches!(error, FitError::MissingTargetColumn(_)));
}

#[test]
fn refit_produces_fresh_state() {
    // Two fits over different tables share nothing: encoders from the first
    // must not leak into the second contract.
    let mut preprocessor = Preprocessor::new("target");
    let first = Table::new(vec![
        texts("city", &["NYC", "LA", "NYC", "LA"]),
        numbers("target", &[0.0, 1.0, 0.0, 1.0]),
    ]);
    let _ = preprocessor.preprocess(&first, &FitOptions::default()).unwrap();

    let second_table = Table::new(vec![
        texts("city", &["Chicago", "Boston", "Chicago", "Boston"]),
        numbers("target", &[0.0, 1.0, 0.0, 1.0]),
    ]);
    let mut fresh = Preprocessor::new("target");
    let second = fresh
        .preprocess(&second_table, &FitOptions::default())
        .unwrap();
    let mapping = &second.fitted.contract().categorical_mappings["city"];
    assert!(mapping.contains_key("Chicago"));
    assert!(!mapping.contains_key("NYC"));
}
