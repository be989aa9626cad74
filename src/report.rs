//! Terminal presentation of a match report.

use comfy_table::Cell;

use crate::engine::MatchReport;
use crate::standard::LimitType;
use crate::ui;

/// Render the report as a styled table with a primary-standard header.
pub fn display_as_table(report: &MatchReport) -> String {
    if !report.matched {
        return ui::style_text("No matching travel standard found.", ui::StyleType::Error);
    }

    let mut output = String::new();

    if let Some(primary) = &report.primary {
        output.push_str(&format!(
            "Primary standard: {} ({}, v{}, priority {})\n",
            ui::style_text(&primary.name, ui::StyleType::Title),
            primary.code,
            primary.version,
            primary.priority
        ));
    }

    let all_codes: Vec<&str> = report
        .all_matched
        .iter()
        .map(|s| s.code.as_str())
        .collect();
    output.push_str(&format!(
        "Strategy: {}   Matched: {}\n\n",
        ui::style_text(&report.strategy.to_string(), ui::StyleType::Label),
        ui::style_text(&all_codes.join(", "), ui::StyleType::Subtle)
    ));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Item"),
        ui::header_cell(&format!("Limit ({})", report.currency)),
        ui::header_cell("Limit (CNY)"),
        ui::header_cell("Source standards"),
    ]);

    for limit in report.expenses.values() {
        let cny_figure = match limit.limit_type {
            LimitType::Fixed => ui::format_optional_cell(limit.amount_cny, |v| format!("{v:.2}")),
            LimitType::Range => match (limit.limit_min_cny, limit.limit_max_cny) {
                (Some(min), Some(max)) => Cell::new(format!("{min:.2}~{max:.2}")),
                _ => ui::format_optional_cell(None::<f64>, |v| format!("{v:.2}")),
            },
            LimitType::Actual => Cell::new("-"),
            LimitType::Percentage => {
                ui::format_optional_cell(limit.base_amount_cny, |v| format!("{v:.2}"))
            }
        };

        table.add_row(vec![
            Cell::new(&limit.item_name),
            Cell::new(limit.describe()),
            cny_figure,
            Cell::new(limit.source_standards.join(", ")),
        ]);
    }

    output.push_str(&table.to_string());
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StandardInfo;
    use crate::merge::MergeStrategy;
    use crate::render::RenderedLimit;
    use crate::standard::CalcUnit;
    use std::collections::BTreeMap;

    fn fixed_limit(item: &str, amount: f64, amount_cny: f64) -> RenderedLimit {
        RenderedLimit {
            expense_item_id: item.to_string(),
            item_name: item.to_string(),
            limit_type: LimitType::Fixed,
            currency: "USD".to_string(),
            calc_unit: CalcUnit::PerDay,
            amount: Some(amount),
            amount_cny: Some(amount_cny),
            limit_min: None,
            limit_max: None,
            limit_min_cny: None,
            limit_max_cny: None,
            percentage: None,
            base_amount: None,
            base_amount_cny: None,
            source_standards: vec!["S1".to_string()],
        }
    }

    #[test]
    fn test_no_match_message() {
        let report = MatchReport {
            matched: false,
            strategy: MergeStrategy::MergeBest,
            matched_count: 0,
            currency: "USD".to_string(),
            primary: None,
            all_matched: Vec::new(),
            expenses: BTreeMap::new(),
        };
        let text = display_as_table(&report);
        assert!(text.contains("No matching travel standard found"));
    }

    #[test]
    fn test_table_contains_converted_and_cny_amounts() {
        let mut expenses = BTreeMap::new();
        expenses.insert(
            "transport".to_string(),
            fixed_limit("transport", 140.0, 1000.0),
        );

        let report = MatchReport {
            matched: true,
            strategy: MergeStrategy::MergeBest,
            matched_count: 1,
            currency: "USD".to_string(),
            primary: Some(StandardInfo {
                code: "S1".to_string(),
                name: "Domestic".to_string(),
                version: 2,
                priority: 80,
            }),
            all_matched: vec![StandardInfo {
                code: "S1".to_string(),
                name: "Domestic".to_string(),
                version: 2,
                priority: 80,
            }],
            expenses,
        };

        let text = display_as_table(&report);
        assert!(text.contains("140.00 USD/day"));
        assert!(text.contains("1000.00"));
        assert!(text.contains("S1"));
        assert!(text.contains("priority 80"));
    }
}
