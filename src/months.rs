//! Conversion of RREO period codes ("MR-XX" columns) to month names.
//!
//! The datalake reports the last eleven reporting months as columns named
//! `MR-01` through `MR-11`. The canonical mapping is the direct lookup table
//! below; codes outside the table (including the bare `MR` column) pass
//! through unchanged so that nothing is ever dropped by normalization alone.

/// The canonical period-code to month-name table. `MR-01` is the oldest
/// reporting month, `MR-11` the most recent.
const MR_TO_MES: &[(&str, &str)] = &[
    ("MR-01", "Fevereiro"),
    ("MR-02", "Março"),
    ("MR-03", "Abril"),
    ("MR-04", "Maio"),
    ("MR-05", "Junho"),
    ("MR-06", "Julho"),
    ("MR-07", "Agosto"),
    ("MR-08", "Setembro"),
    ("MR-09", "Outubro"),
    ("MR-10", "Novembro"),
    ("MR-11", "Dezembro"),
];

/// Month names in display order, most recent reporting month first. This is
/// the order the dashboard charts use.
pub const MESES_DISPLAY: &[&str] = &[
    "Dezembro",
    "Novembro",
    "Outubro",
    "Setembro",
    "Agosto",
    "Julho",
    "Junho",
    "Maio",
    "Abril",
    "Março",
    "Fevereiro",
];

/// Converts a period code such as `MR-07` to its month name (`Agosto`).
///
/// Unrecognized codes are returned unchanged. This is a pure lookup with no
/// side effects.
///
/// ```
/// # use icms_sync::months::coluna_to_mes;
/// assert_eq!(coluna_to_mes("MR-07"), "Agosto");
/// assert_eq!(coluna_to_mes("MR"), "MR");
/// ```
pub fn coluna_to_mes(coluna: &str) -> &str {
    MR_TO_MES
        .iter()
        .find(|(code, _)| *code == coluna)
        .map(|(_, mes)| *mes)
        .unwrap_or(coluna)
}
