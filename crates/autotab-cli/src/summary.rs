//! Human-readable summaries for fit and inspect runs.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use autotab_model::{ColumnRole, FeatureType, PreprocessingContract};

use crate::commands::FitResult;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn role_cell(role: ColumnRole) -> Cell {
    let cell = Cell::new(role.description());
    if role.is_dropped() {
        cell.fg(Color::Yellow)
    } else if role == ColumnRole::Target {
        cell.fg(Color::Cyan)
    } else {
        cell
    }
}

pub fn print_fit_summary(result: &FitResult) {
    println!("Dataset: {}", result.dataset.display());
    println!(
        "Target: {} ({}, {} rows)",
        result.target, result.problem_type, result.rows
    );
    println!(
        "Split: {} train / {} test",
        result.train_rows, result.test_rows
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Role"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    for (name, role) in &result.roles {
        table.add_row(vec![
            Cell::new(name),
            role_cell(*role),
            Cell::new(column_detail(&result.contract, name, *role)),
        ]);
    }
    println!("{table}");

    if let Some(outputs) = &result.outputs {
        println!("Contract: {}", outputs.contract.display());
        println!("Train matrix: {}", outputs.train.display());
        println!("Test matrix: {}", outputs.test.display());
    } else {
        println!("Dry run: no files written");
    }
}

fn column_detail(contract: &PreprocessingContract, name: &str, role: ColumnRole) -> String {
    match role {
        ColumnRole::NumericFeature => contract
            .numeric_stats
            .get(name)
            .map(|stats| {
                if stats.is_integer {
                    format!("range {}..{}", stats.min, stats.max)
                } else {
                    format!("range {:.3}..{:.3}", stats.min, stats.max)
                }
            })
            .unwrap_or_default(),
        ColumnRole::CategoricalFeature => contract
            .categorical_mappings
            .get(name)
            .map(|mapping| format!("{} categories", mapping.len()))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

pub fn print_contract(contract: &PreprocessingContract) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Feature"),
        header_cell("Type"),
        header_cell("Allowed values"),
    ]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Center);
    }
    for name in &contract.feature_columns {
        let feature_type = contract.feature_type(name);
        let allowed = match feature_type {
            FeatureType::Categorical => contract
                .allowed_values(name)
                .map(|values| values.join(", "))
                .unwrap_or_default(),
            FeatureType::Numeric => contract
                .numeric_stats
                .get(name)
                .map(|stats| format!("{}..{}", stats.min, stats.max))
                .unwrap_or_else(|| "any number".to_string()),
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(feature_type),
            Cell::new(allowed),
        ]);
    }
    println!("{table}");

    if !contract.dropped_columns.is_empty() {
        println!("Dropped at fit time: {}", contract.dropped_columns.join(", "));
    }
    if let Some(mapping) = &contract.target_mapping {
        let labels: Vec<&str> = mapping.values().map(String::as_str).collect();
        println!("Target labels: {}", labels.join(", "));
    }
}
