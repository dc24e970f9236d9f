//! Chart and export sinks
//!
//! Everything here consumes the full filtered and sorted sequence
//! ([`crate::query::ListOutcome::all`]), never a single page.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::JournalEntry;
use crate::query::{FieldValue, Record};

/// Debit and credit totals closer than this count as balanced
pub const BALANCE_TOLERANCE: f64 = 0.005;

const UNLABELED: &str = "(none)";

/// Chart series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Chart data for visualization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub chart_type: String,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartData {
    fn from_totals(chart_type: &str, title: &str, series: &str, totals: BTreeMap<String, f64>) -> Self {
        let (labels, data) = totals.into_iter().unzip();
        Self {
            chart_type: chart_type.to_string(),
            title: title.to_string(),
            labels,
            datasets: vec![ChartDataset {
                label: series.to_string(),
                data,
            }],
        }
    }
}

/// Signed numeric value of a column
fn signed(value: FieldValue<'_>) -> f64 {
    match value {
        FieldValue::Number(n) | FieldValue::Amount(n) => n,
        _ => 0.0,
    }
}

/// Sum `value` per distinct text of `group`, labels in ascending order
pub fn grouped_totals<R: Record>(items: &[&R], group: R::Field, value: R::Field) -> ChartData {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for item in items {
        let label = item.value(group).as_text().into_owned();
        let label = if label.is_empty() { UNLABELED.to_string() } else { label };
        *totals.entry(label).or_default() += signed(item.value(value));
    }
    ChartData::from_totals("pie", &format!("{} by {}", value, group), &value.to_string(), totals)
}

/// Sum `value` per calendar month (`YYYY-MM`) of `date`; undated items are left out
pub fn monthly_totals<R: Record>(items: &[&R], date: R::Field, value: R::Field) -> ChartData {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut skipped = 0usize;
    for item in items {
        match item.value(date).date() {
            Some(day) => {
                *totals.entry(day.format("%Y-%m").to_string()).or_default() += signed(item.value(value));
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!(target: "ftms::reports", "monthly totals: {} items without a usable {}", skipped, date);
    }
    ChartData::from_totals("bar", &format!("Monthly {}", value), &value.to_string(), totals)
}

/// Debit/credit cross-check shown as the journal's "balanced" indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheck {
    pub total_debit: f64,
    pub total_credit: f64,
    pub difference: f64,
    pub balanced: bool,
}

impl BalanceCheck {
    pub fn of(entries: &[&JournalEntry]) -> Self {
        let total_debit: f64 = entries.iter().map(|e| e.debit).sum();
        let total_credit: f64 = entries.iter().map(|e| e.credit).sum();
        let difference = total_debit - total_credit;
        Self {
            total_debit,
            total_credit,
            difference,
            balanced: difference.abs() < BALANCE_TOLERANCE,
        }
    }
}

/// CSV export: header of column names, one row per item, RFC 4180 quoting
pub fn to_csv<R: Record>(items: &[&R]) -> String {
    let columns = R::columns();
    let mut out = String::new();

    let header: Vec<String> = columns.iter().map(|c| ftms_utils::csv_field(&c.to_string())).collect();
    out.push_str(&header.join(","));
    out.push_str("\r\n");

    for item in items {
        let row: Vec<String> = columns
            .iter()
            .map(|c| ftms_utils::csv_field(&item.value(*c).as_text()))
            .collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Revenue, RevenueField};
    use crate::query::Sort;

    fn revenue(id: &str, category: &str, amount: f64, date: &str, remarks: &str) -> Revenue {
        Revenue {
            id: id.to_string(),
            reference_id: format!("OR-{}", id),
            department: "Operations".to_string(),
            category: category.to_string(),
            amount,
            date: date.to_string(),
            remarks: remarks.to_string(),
        }
    }

    fn journal(id: &str, debit: f64, credit: f64) -> JournalEntry {
        JournalEntry {
            id: id.to_string(),
            reference: "JV-1".to_string(),
            date: "2024-01-01".to_string(),
            account: "Cash".to_string(),
            description: String::new(),
            debit,
            credit,
            status: Default::default(),
        }
    }

    #[test]
    fn test_grouped_totals_use_signed_values() {
        let rows = vec![
            revenue("1", "Fare", 100.0, "2024-01-05", ""),
            revenue("2", "Fare", -30.0, "2024-01-06", ""),
            revenue("3", "Rental", 50.0, "2024-02-01", ""),
            revenue("4", "", 5.0, "2024-02-01", ""),
        ];
        let refs: Vec<&Revenue> = rows.iter().collect();
        let chart = grouped_totals(&refs, RevenueField::Category, RevenueField::Amount);
        assert_eq!(chart.labels, vec!["(none)", "Fare", "Rental"]);
        assert_eq!(chart.datasets[0].data, vec![5.0, 70.0, 50.0]);
    }

    #[test]
    fn test_monthly_totals_skip_undated() {
        let rows = vec![
            revenue("1", "Fare", 100.0, "2024-01-05", ""),
            revenue("2", "Fare", 20.0, "2024-01-31T22:00:00", ""),
            revenue("3", "Fare", 50.0, "2024-02-01", ""),
            revenue("4", "Fare", 999.0, "pending", ""),
        ];
        let refs: Vec<&Revenue> = rows.iter().collect();
        let chart = monthly_totals(&refs, RevenueField::Date, RevenueField::Amount);
        assert_eq!(chart.labels, vec!["2024-01", "2024-02"]);
        assert_eq!(chart.datasets[0].data, vec![120.0, 50.0]);
    }

    #[test]
    fn test_chart_sees_all_filtered_items_not_page() {
        let rows: Vec<Revenue> = (1..=12)
            .map(|i| revenue(&i.to_string(), "Fare", 10.0, "2024-03-01", ""))
            .collect();
        let spec = Revenue::list_spec().page_size(5);
        let mut query = spec.new_query();
        query.set_sort(&spec, Some(Sort::asc(RevenueField::Amount))).unwrap();
        let outcome = spec.run(&rows, &query);
        assert_eq!(outcome.items.len(), 5);
        let chart = grouped_totals(&outcome.all, RevenueField::Category, RevenueField::Amount);
        assert_eq!(chart.datasets[0].data, vec![120.0]);
    }

    #[test]
    fn test_balance_check() {
        let entries: Vec<JournalEntry> = (1..=15)
            .map(|i| if i % 2 == 0 { journal(&i.to_string(), 0.0, 35.5) } else { journal(&i.to_string(), 35.5, 0.0) })
            .collect();
        let refs: Vec<&JournalEntry> = entries.iter().collect();
        let check = BalanceCheck::of(&refs);
        assert!(!check.balanced);
        assert_eq!(check.difference, 35.5);

        let check = BalanceCheck::of(&refs[1..]);
        assert!(check.balanced);
        assert_eq!(check.total_debit, check.total_credit);
    }

    #[test]
    fn test_csv_quoting() {
        let rows = vec![revenue("1", "Fare", -1250.5, "2024-01-05", "Driver \"Boy\", route 5")];
        let refs: Vec<&Revenue> = rows.iter().collect();
        let csv = to_csv(&refs);
        let mut lines = csv.split("\r\n");
        assert_eq!(lines.next(), Some("referenceId,date,department,category,amount,remarks"));
        assert_eq!(
            lines.next(),
            Some("OR-1,2024-01-05,Operations,Fare,-1250.5,\"Driver \"\"Boy\"\", route 5\"")
        );
    }
}
