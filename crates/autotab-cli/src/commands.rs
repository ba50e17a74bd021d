use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, info_span};

use autotab_core::detect;
use autotab_core::preprocess::FitOptions;
use autotab_core::{FeatureMatrix, fit_pipeline};
use autotab_ingest::read_csv_table;
use autotab_model::{ColumnRole, PreprocessingContract, ProblemType, Table};

use crate::cli::{FitArgs, InspectArgs};

/// Files written by a non-dry-run fit.
#[derive(Debug, Clone)]
pub struct FitOutputPaths {
    pub contract: PathBuf,
    pub train: PathBuf,
    pub test: PathBuf,
}

/// Everything the fit summary needs to render.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub dataset: PathBuf,
    pub target: String,
    pub rows: usize,
    pub problem_type: ProblemType,
    pub roles: Vec<(String, ColumnRole)>,
    pub contract: PreprocessingContract,
    pub train_rows: usize,
    pub test_rows: usize,
    pub outputs: Option<FitOutputPaths>,
}

pub fn run_fit(args: &FitArgs) -> Result<FitResult> {
    let span = info_span!("fit", dataset = %args.dataset.display(), target = %args.target);
    let _guard = span.enter();

    let table = read_csv_table(&args.dataset)
        .with_context(|| format!("read dataset {}", args.dataset.display()))?;
    info!(rows = table.height(), columns = table.width(), "dataset loaded");

    let roles = classify_columns(&table, &args.target);

    let options = FitOptions::default()
        .with_test_fraction(args.test_fraction)
        .with_seed(args.seed);
    let artifacts = fit_pipeline(&table, &args.target, &options).context("fit pipeline")?;

    let outputs = if args.dry_run {
        None
    } else {
        let output_dir = args.output_dir.clone().unwrap_or_else(|| {
            args.dataset
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("output")
        });
        Some(write_artifacts(&output_dir, &args.target, &artifacts)?)
    };

    Ok(FitResult {
        dataset: args.dataset.clone(),
        target: args.target.clone(),
        rows: table.height(),
        problem_type: artifacts.problem_type,
        roles,
        contract: artifacts.contract,
        train_rows: artifacts.train_features.n_rows(),
        test_rows: artifacts.test_features.n_rows(),
        outputs,
    })
}

pub fn run_inspect(args: &InspectArgs) -> Result<PreprocessingContract> {
    let json = fs::read_to_string(&args.contract)
        .with_context(|| format!("read contract {}", args.contract.display()))?;
    let contract = PreprocessingContract::from_json(&json)
        .with_context(|| format!("parse contract {}", args.contract.display()))?;
    Ok(contract)
}

/// Role per source column, in source order, for the fit summary.
fn classify_columns(table: &Table, target: &str) -> Vec<(String, ColumnRole)> {
    table
        .columns()
        .iter()
        .map(|column| {
            let role = if column.name == target {
                ColumnRole::Target
            } else {
                detect::column_role(&column.name, column)
            };
            (column.name.clone(), role)
        })
        .collect()
}

fn write_artifacts(
    output_dir: &Path,
    target: &str,
    artifacts: &autotab_core::FitArtifacts,
) -> Result<FitOutputPaths> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;

    let contract_path = output_dir.join("contract.json");
    fs::write(&contract_path, artifacts.contract.to_json()?)
        .with_context(|| format!("write {}", contract_path.display()))?;

    let train_path = output_dir.join("train.csv");
    write_matrix_csv(
        &train_path,
        &artifacts.train_features,
        &artifacts.train_labels,
        target,
    )?;
    let test_path = output_dir.join("test.csv");
    write_matrix_csv(
        &test_path,
        &artifacts.test_features,
        &artifacts.test_labels,
        target,
    )?;

    info!(
        contract = %contract_path.display(),
        train = %train_path.display(),
        test = %test_path.display(),
        "artifacts written"
    );
    Ok(FitOutputPaths {
        contract: contract_path,
        train: train_path,
        test: test_path,
    })
}

/// Encoded matrix plus the label column, as CSV for the external trainer.
fn write_matrix_csv(
    path: &Path,
    features: &FeatureMatrix,
    labels: &[f64],
    target: &str,
) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("write {}", path.display()))?;
    let mut header: Vec<&str> = features.columns.iter().map(String::as_str).collect();
    header.push(target);
    writer.write_record(&header)?;
    for (row, label) in features.rows.iter().zip(labels) {
        let mut record: Vec<String> = row.iter().map(f64::to_string).collect();
        record.push(label.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
