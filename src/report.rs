//! The reconciliation report: per-month totals for each source and the
//! absolute difference between them.
//!
//! Aggregates are computed from the cached snapshots on every request and are
//! never stored. Month ordering follows the fixed reverse-chronological
//! display sequence, restricted to months where at least one source has data.

use crate::model::{Amount, RevenueRecord};
use crate::months::MESES_DISPLAY;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Groups records by month, summing `valor`. Unparseable amounts count as
/// zero. The result is independent of record order.
pub fn aggregate(records: &[RevenueRecord]) -> BTreeMap<String, Amount> {
    let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
    for record in records {
        *totals.entry(record.coluna().to_string()).or_default() +=
            Amount::parse_lenient(record.valor());
    }
    totals
}

/// One month of the reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthRow {
    pub mes: String,
    pub tesouro: Amount,
    pub siconfi: Amount,
    pub diferenca: Amount,
}

/// The full reconciliation between the two sources.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub meses: Vec<MonthRow>,
    pub total_tesouro: Amount,
    pub total_siconfi: Amount,
    pub diferenca_total: Amount,
}

impl Report {
    /// Builds the report from the two cached record sets. Months neither
    /// source reported are omitted; a month only one source reported shows
    /// zero for the other, and its full value as the difference.
    pub fn build(tesouro: &[RevenueRecord], siconfi: &[RevenueRecord]) -> Self {
        let totals_tesouro = aggregate(tesouro);
        let totals_siconfi = aggregate(siconfi);

        let meses: Vec<MonthRow> = MESES_DISPLAY
            .iter()
            .filter(|mes| {
                totals_tesouro.contains_key(**mes) || totals_siconfi.contains_key(**mes)
            })
            .map(|mes| {
                let a = totals_tesouro.get(*mes).copied().unwrap_or_default();
                let b = totals_siconfi.get(*mes).copied().unwrap_or_default();
                MonthRow {
                    mes: mes.to_string(),
                    tesouro: a,
                    siconfi: b,
                    diferenca: a.abs_diff(&b),
                }
            })
            .collect();

        let total_tesouro: Amount = meses.iter().map(|row| row.tesouro).sum();
        let total_siconfi: Amount = meses.iter().map(|row| row.siconfi).sum();
        let diferenca_total = total_tesouro.abs_diff(&total_siconfi);

        Self {
            generated_at: Local::now(),
            meses,
            total_tesouro,
            total_siconfi,
            diferenca_total,
        }
    }

    /// Renders the report as an aligned text table for the `report` command.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<12} {:>20} {:>20} {:>20}",
            "Mês", "Tesouro", "SICONFI", "Diferença"
        );
        for row in &self.meses {
            let _ = writeln!(
                out,
                "{:<12} {:>20} {:>20} {:>20}",
                row.mes,
                row.tesouro.to_string(),
                row.siconfi.to_string(),
                row.diferenca.to_string()
            );
        }
        let _ = writeln!(
            out,
            "{:<12} {:>20} {:>20} {:>20}",
            "Total",
            self.total_tesouro.to_string(),
            self.total_siconfi.to_string(),
            self.diferenca_total.to_string()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(coluna: &str, valor: &str) -> RevenueRecord {
        RevenueRecord::from_json_object(&json!({
            "anexo": "RREO-Anexo 03",
            "conta": "ICMS",
            "coluna": coluna,
            "valor": valor,
        }))
        .unwrap()
    }

    #[test]
    fn test_aggregate_sums_per_month() {
        let records = vec![
            record("Agosto", "1000"),
            record("Julho", "250.50"),
            record("Agosto", "500"),
        ];
        let totals = aggregate(&records);
        assert_eq!(totals["Agosto"], Amount::parse_lenient("1500"));
        assert_eq!(totals["Julho"], Amount::parse_lenient("250.50"));
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let mut records = vec![
            record("Agosto", "1"),
            record("Julho", "2"),
            record("Agosto", "3"),
            record("Junho", "4"),
        ];
        let forward = aggregate(&records);
        records.reverse();
        let backward = aggregate(&records);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_aggregate_treats_blank_valor_as_zero() {
        let records = vec![record("Maio", ""), record("Maio", "10")];
        let totals = aggregate(&records);
        assert_eq!(totals["Maio"], Amount::parse_lenient("10"));
    }

    #[test]
    fn test_report_ordering_and_deltas() {
        let tesouro = vec![record("Agosto", "1000"), record("Julho", "800")];
        let siconfi = vec![record("Agosto", "900"), record("Setembro", "50")];
        let report = Report::build(&tesouro, &siconfi);

        // Most recent reporting month first, months with no data omitted.
        let meses: Vec<&str> = report.meses.iter().map(|r| r.mes.as_str()).collect();
        assert_eq!(meses, vec!["Setembro", "Agosto", "Julho"]);

        let agosto = &report.meses[1];
        assert_eq!(agosto.tesouro, Amount::parse_lenient("1000"));
        assert_eq!(agosto.siconfi, Amount::parse_lenient("900"));
        assert_eq!(agosto.diferenca, Amount::parse_lenient("100"));

        // A month reported by only one source shows up whole as the delta.
        let setembro = &report.meses[0];
        assert!(setembro.tesouro.is_zero());
        assert_eq!(setembro.diferenca, Amount::parse_lenient("50"));
    }

    #[test]
    fn test_report_totals() {
        let tesouro = vec![record("Agosto", "1000"), record("Julho", "800")];
        let siconfi = vec![record("Agosto", "1100")];
        let report = Report::build(&tesouro, &siconfi);
        assert_eq!(report.total_tesouro, Amount::parse_lenient("1800"));
        assert_eq!(report.total_siconfi, Amount::parse_lenient("1100"));
        assert_eq!(report.diferenca_total, Amount::parse_lenient("700"));
    }

    #[test]
    fn test_report_empty_inputs() {
        let report = Report::build(&[], &[]);
        assert!(report.meses.is_empty());
        assert!(report.total_tesouro.is_zero());
        assert!(report.diferenca_total.is_zero());
    }

    #[test]
    fn test_report_json_shape() {
        let report = Report::build(&[record("Abril", "10")], &[]);
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("generated_at").is_some());
        assert_eq!(value["meses"][0]["mes"], "Abril");
        assert_eq!(value["meses"][0]["tesouro"], "10");
        assert_eq!(value["total_siconfi"], "0");
    }

    #[test]
    fn test_render_table_contains_rows_and_total() {
        let report = Report::build(&[record("Abril", "1234.5")], &[]);
        let table = report.render_table();
        assert!(table.contains("Abril"));
        assert!(table.contains("R$ 1,234.50"));
        assert!(table.lines().last().unwrap().starts_with("Total"));
    }
}
