//! Summary tables printed at the end of a run

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{SelectionOutcome, UnitTable};

/// One written unit table
#[derive(Debug, Clone)]
pub struct UnitSummaryRow {
    pub unit: String,
    pub geometry_column: String,
    pub rows: usize,
    pub columns: usize,
    pub sources: usize,
}

/// Summary of a harmonization run
#[derive(Debug, Default)]
pub struct HarmonizeSummary {
    pub units: Vec<UnitSummaryRow>,
}

impl HarmonizeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, table: &UnitTable) {
        self.units.push(UnitSummaryRow {
            unit: table.unit.to_string(),
            geometry_column: table.geometry_column().to_string(),
            rows: table.height(),
            columns: table.frame.width(),
            sources: table.source_count,
        });
    }

    pub fn total_rows(&self) -> usize {
        self.units.iter().map(|u| u.rows).sum()
    }

    pub fn display(&self) {
        print_section_title("🌎", "HARMONIZATION SUMMARY");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Unit").add_attribute(Attribute::Bold),
            Cell::new("Geometry Column").add_attribute(Attribute::Bold),
            Cell::new("Sources").add_attribute(Attribute::Bold),
            Cell::new("Rows").add_attribute(Attribute::Bold),
            Cell::new("Columns").add_attribute(Attribute::Bold),
        ]);

        for unit in &self.units {
            table.add_row(vec![
                Cell::new(&unit.unit).fg(Color::Cyan),
                Cell::new(&unit.geometry_column),
                Cell::new(unit.sources),
                Cell::new(unit.rows).fg(if unit.rows == 0 { Color::Red } else { Color::White }),
                Cell::new(unit.columns),
            ]);
        }

        table.add_row(vec![
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(self.units.iter().map(|u| u.sources).sum::<usize>()),
            Cell::new(self.total_rows())
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
            Cell::new(""),
        ]);

        print_indented(&table);
    }
}

/// Per-candidate scores of a selection run with the winner highlighted
#[derive(Debug)]
pub struct SelectionReport<'a> {
    pub strategy: String,
    pub outcome: &'a SelectionOutcome,
}

impl<'a> SelectionReport<'a> {
    pub fn new(strategy: impl Into<String>, outcome: &'a SelectionOutcome) -> Self {
        Self {
            strategy: strategy.into(),
            outcome,
        }
    }

    pub fn display(&self) {
        print_section_title("📋", "SELECTION SUMMARY");
        println!(
            "    Strategy: {}   Candidates: {}",
            style(&self.strategy).cyan(),
            style(self.outcome.scores.len()).yellow()
        );
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Candidate").add_attribute(Attribute::Bold),
            Cell::new("Fold MAE").add_attribute(Attribute::Bold),
            Cell::new("Mean MAE").add_attribute(Attribute::Bold),
        ]);

        for score in &self.outcome.scores {
            let folds = score
                .fold_errors
                .iter()
                .map(|e| format!("{:.4}", e))
                .collect::<Vec<_>>()
                .join(" / ");
            let is_best = score.column == self.outcome.best_column;

            let mut name = Cell::new(&score.column);
            let mut error = Cell::new(format!("{:.6}", score.error));
            if is_best {
                name = name.fg(Color::Green).add_attribute(Attribute::Bold);
                error = error.fg(Color::Green).add_attribute(Attribute::Bold);
            }
            table.add_row(vec![name, Cell::new(folds), error]);
        }

        print_indented(&table);

        println!();
        println!(
            "    {} Best feature: {} ({:.6})",
            style("✅").green(),
            style(&self.outcome.best_column).green().bold(),
            self.outcome.best_error
        );
    }
}

fn print_section_title(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CandidateScore, GeoUnit};
    use polars::prelude::*;

    #[test]
    fn test_harmonize_summary_totals() {
        let frame = df! {
            "GEOID" => ["01001", "01003"],
            "geometry_county" => ["POINT (0 0)", "POINT (1 1)"],
        }
        .unwrap();
        let table = UnitTable {
            unit: GeoUnit::County,
            frame,
            geometries: Vec::new(),
            source_count: 1,
        };

        let mut summary = HarmonizeSummary::new();
        summary.add_unit(&table);
        summary.add_unit(&table);
        assert_eq!(summary.total_rows(), 4);
        assert_eq!(summary.units[0].geometry_column, "geometry_county");
        assert_eq!(summary.units[0].columns, 2);
    }

    #[test]
    fn test_selection_report_builds() {
        let outcome = SelectionOutcome {
            best_column: "pc_1".to_string(),
            best_error: 0.5,
            scores: vec![CandidateScore {
                column: "pc_1".to_string(),
                error: 0.5,
                fold_errors: vec![0.4, 0.6],
            }],
        };
        let report = SelectionReport::new("rf", &outcome);
        assert_eq!(report.outcome.scores.len(), 1);
        report.display();
    }
}
