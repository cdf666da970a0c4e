use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use nps_cli::types::RunResult;

pub fn print_summary(result: &RunResult) {
    println!("Source: {}", result.source_root.display());
    match &result.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: (dry run)"),
    }
    if let Some(count) = result.imported {
        println!("Imported: {count} records");
    }

    let harvest = &result.harvest;
    let reconcile = &result.reconcile;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Step"), header_cell("Rows")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);

    let rows: [(&str, &str, usize, Option<Color>); 10] = [
        ("Harvest", "candidate sheets", harvest.candidates, None),
        ("Harvest", "unreadable", harvest.unreadable, Some(Color::Yellow)),
        ("Harvest", "blank", harvest.empty_sheets, Some(Color::Yellow)),
        ("Harvest", "nothing extracted", harvest.empty_records, Some(Color::Yellow)),
        ("Harvest", "records", harvest.records, None),
        ("Reconcile", "no event", reconcile.unresolved_event, Some(Color::Yellow)),
        ("Reconcile", "no participant", reconcile.unresolved_participant, Some(Color::Yellow)),
        ("Reconcile", "duplicates", reconcile.duplicates, Some(Color::Yellow)),
        ("Reconcile", "visit not complete", reconcile.not_complete, Some(Color::Yellow)),
        ("Reconcile", "output rows", reconcile.output, None),
    ];
    for (stage, step, count, drop_color) in rows {
        table.add_row(vec![
            stage_cell(stage),
            Cell::new(step),
            count_cell(count, drop_color),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} columns", result.columns))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(reconcile.output).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, drop_color: Option<Color>) -> Cell {
    match drop_color {
        Some(color) if count > 0 => Cell::new(count).fg(color).add_attribute(Attribute::Bold),
        Some(_) => dim_cell(count),
        None => Cell::new(count),
    }
}

fn stage_cell(stage: &str) -> Cell {
    Cell::new(stage)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
