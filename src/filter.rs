//! The record filter: keeps only the ICMS rows of the configured annex and
//! normalizes their period codes to month names.

use crate::model::RevenueRecord;
use crate::months;

/// The account the dashboard tracks.
const CONTA_ICMS: &str = "ICMS";

/// The twelve-month rollup pseudo-column, never a reporting month.
const COLUNA_TOTAL_12_MESES: &str = "TOTAL (ÚLTIMOS 12 MESES)";

/// Forecast columns carry the fiscal year in their name ("PREVISÃO ATUALIZADA
/// 2023"), so they are excluded by prefix rather than by exact string.
const COLUNA_PREVISAO_PREFIX: &str = "PREVISÃO ATUALIZADA";

/// Retains the records of interest and replaces each retained record's
/// `coluna` with its canonical month name. All other fields pass through
/// unchanged.
///
/// A record is retained iff its `anexo` equals the configured annex code,
/// its `conta` is `ICMS`, and its `coluna` is neither a forecast column nor
/// the twelve-month rollup.
pub fn filter_records(records: Vec<RevenueRecord>, anexo: &str) -> Vec<RevenueRecord> {
    records
        .into_iter()
        .filter(|r| r.anexo() == anexo && r.conta() == CONTA_ICMS && !is_pseudo_period(r.coluna()))
        .map(|r| {
            let mes = months::coluna_to_mes(r.coluna()).to_string();
            r.with_coluna(mes)
        })
        .collect()
}

fn is_pseudo_period(coluna: &str) -> bool {
    coluna == COLUNA_TOTAL_12_MESES || coluna.starts_with(COLUNA_PREVISAO_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ANEXO: &str = "RREO-Anexo 03";

    fn record(anexo: &str, conta: &str, coluna: &str, valor: &str) -> RevenueRecord {
        RevenueRecord::from_json_object(&json!({
            "anexo": anexo,
            "conta": conta,
            "coluna": coluna,
            "valor": valor,
            "uf": "PR",
        }))
        .unwrap()
    }

    #[test]
    fn test_retains_and_normalizes() {
        let records = vec![
            record(ANEXO, "ICMS", "MR-07", "1000"),
            record(ANEXO, "ICMS", "MR-08", "500"),
        ];
        let filtered = filter_records(records, ANEXO);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].coluna(), "Agosto");
        assert_eq!(filtered[0].valor(), "1000");
        assert_eq!(filtered[1].coluna(), "Setembro");
        assert_eq!(filtered[1].valor(), "500");
        // Untouched fields survive.
        assert_eq!(filtered[0].field("uf"), Some("PR"));
    }

    #[test]
    fn test_drops_wrong_conta() {
        let records = vec![
            record(ANEXO, "IPVA", "MR-03", "77"),
            record(ANEXO, "ICMS", "MR-03", "88"),
        ];
        let filtered = filter_records(records, ANEXO);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.iter().all(|r| r.conta() == "ICMS"));
    }

    #[test]
    fn test_drops_wrong_anexo() {
        let records = vec![
            record("RREO-Anexo 02", "ICMS", "MR-03", "77"),
            record(ANEXO, "ICMS", "MR-03", "88"),
        ];
        let filtered = filter_records(records, ANEXO);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].valor(), "88");
    }

    #[test]
    fn test_drops_pseudo_periods() {
        let records = vec![
            record(ANEXO, "ICMS", "PREVISÃO ATUALIZADA 2023", "999"),
            record(ANEXO, "ICMS", "PREVISÃO ATUALIZADA 2024", "999"),
            record(ANEXO, "ICMS", "TOTAL (ÚLTIMOS 12 MESES)", "999"),
            record(ANEXO, "ICMS", "MR-11", "42"),
        ];
        let filtered = filter_records(records, ANEXO);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].coluna(), "Dezembro");
    }

    #[test]
    fn test_unknown_coluna_passes_through_raw() {
        let records = vec![record(ANEXO, "ICMS", "MR", "13")];
        let filtered = filter_records(records, ANEXO);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].coluna(), "MR");
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_records(Vec::new(), ANEXO).is_empty());
    }
}
