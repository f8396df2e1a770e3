//! The revenue record model.
//!
//! A `RevenueRecord` is one row from the RREO datalake. The four fields the
//! pipeline inspects (`anexo`, `conta`, `coluna`, `valor`) are named struct
//! fields; everything else the upstream sends is kept verbatim in
//! `other_fields` so a cache round-trip loses nothing.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// The two upstream feeds being reconciled. Both hit the same Tesouro
/// datalake; they are kept as distinct sources because the dashboard compares
/// the figures each returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Tesouro,
    Siconfi,
}

serde_plain::derive_display_from_serialize!(Source);
serde_plain::derive_fromstr_from_deserialize!(Source);

impl Source {
    /// Both sources, in the order the endpoints concatenate them.
    pub const ALL: [Source; 2] = [Source::Tesouro, Source::Siconfi];

    /// The snapshot file name for this source within the data directory.
    pub fn csv_filename(&self) -> &'static str {
        match self {
            Source::Tesouro => "dados_tesouro.csv",
            Source::Siconfi => "dados_siconfi.csv",
        }
    }
}

/// The field names the pipeline knows about, in the order they lead the CSV
/// header row.
const FIXED_FIELDS: [&str; 4] = ["anexo", "conta", "coluna", "valor"];

/// One observation from an upstream source.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct RevenueRecord {
    /// Report-type identifier, e.g. `RREO-Anexo 03`.
    pub(crate) anexo: String,
    /// Account name; the pipeline only retains `ICMS`.
    pub(crate) conta: String,
    /// Period code as sent (`MR-07`), replaced by its month name at filter time.
    pub(crate) coluna: String,
    /// Amount as a decimal string, kept raw for round-trip fidelity.
    pub(crate) valor: String,
    /// All remaining upstream fields, passed through unchanged.
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl RevenueRecord {
    /// Builds a record from one upstream JSON object. Scalar values are
    /// rendered to strings (the same flattening the CSV cache applies);
    /// non-object input yields `None`. Null and empty extra fields are not
    /// stored: a CSV row cannot distinguish an empty extra from an absent
    /// one, so treating them as absent everywhere keeps cache round-trips
    /// exact.
    pub fn from_json_object(value: &serde_json::Value) -> Option<Self> {
        let map = value.as_object()?;
        let mut record = RevenueRecord::default();
        for (key, value) in map {
            record.set_field(key, render_scalar(value));
        }
        Some(record)
    }

    /// Builds a record from a CSV header row and a data row.
    pub fn from_fields<S1, S2>(headers: &[S1], values: &[S2]) -> Self
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        let mut record = RevenueRecord::default();
        for (header, value) in headers.iter().zip(values.iter()) {
            record.set_field(header.as_ref(), value.as_ref().to_string());
        }
        record
    }

    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "anexo" => self.anexo = value,
            "conta" => self.conta = value,
            "coluna" => self.coluna = value,
            "valor" => self.valor = value,
            // Empty extras are normalized to absent, see `from_json_object`.
            other if !value.is_empty() => {
                self.other_fields.insert(other.to_string(), value);
            }
            _ => {}
        }
    }

    /// Looks a field up by name, fixed fields included.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "anexo" => Some(&self.anexo),
            "conta" => Some(&self.conta),
            "coluna" => Some(&self.coluna),
            "valor" => Some(&self.valor),
            other => self.other_fields.get(other).map(String::as_str),
        }
    }

    pub fn anexo(&self) -> &str {
        &self.anexo
    }

    pub fn conta(&self) -> &str {
        &self.conta
    }

    pub fn coluna(&self) -> &str {
        &self.coluna
    }

    pub fn valor(&self) -> &str {
        &self.valor
    }

    /// Returns a copy of this record with `coluna` replaced.
    pub fn with_coluna(mut self, coluna: impl Into<String>) -> Self {
        self.coluna = coluna.into();
        self
    }

    /// The header row for a set of records: the fixed fields first, then the
    /// union of all extra field names in sorted order.
    pub fn headers(records: &[RevenueRecord]) -> Vec<String> {
        let mut headers: Vec<String> = FIXED_FIELDS.iter().map(|s| s.to_string()).collect();
        let mut extras: BTreeMap<&str, ()> = BTreeMap::new();
        for record in records {
            for key in record.other_fields.keys() {
                extras.insert(key, ());
            }
        }
        headers.extend(extras.keys().map(|s| s.to_string()));
        headers
    }

    /// Renders the record as one CSV row under the given headers. Fields a
    /// record does not carry render as empty strings.
    pub fn to_row<S: AsRef<str>>(&self, headers: &[S]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.field(h.as_ref()).unwrap_or_default().to_string())
            .collect()
    }
}

/// Renders a JSON scalar the way the CSV cache stores it: strings verbatim,
/// numbers and bools via their canonical text, null as empty. Nested values
/// (which the datalake does not send) fall back to their JSON text.
fn render_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

impl Serialize for RevenueRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialized flat, the shape the dashboard frontend consumes.
        let mut map = serializer.serialize_map(Some(4 + self.other_fields.len()))?;
        map.serialize_entry("anexo", &self.anexo)?;
        map.serialize_entry("conta", &self.conta)?;
        map.serialize_entry("coluna", &self.coluna)?;
        map.serialize_entry("valor", &self.valor)?;
        for (key, value) in &self.other_fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let value = json!({
            "anexo": "RREO-Anexo 03",
            "conta": "ICMS",
            "coluna": "MR-07",
            "valor": 1500.25,
            "cod_conta": "ReceitaTributariaICMS",
            "populacao": 11444380,
        });
        let record = RevenueRecord::from_json_object(&value).unwrap();
        assert_eq!(record.anexo(), "RREO-Anexo 03");
        assert_eq!(record.conta(), "ICMS");
        assert_eq!(record.coluna(), "MR-07");
        assert_eq!(record.valor(), "1500.25");
        assert_eq!(record.field("cod_conta"), Some("ReceitaTributariaICMS"));
        assert_eq!(record.field("populacao"), Some("11444380"));
        assert_eq!(record.field("nope"), None);
    }

    #[test]
    fn test_from_json_object_non_object() {
        assert!(RevenueRecord::from_json_object(&json!("x")).is_none());
        assert!(RevenueRecord::from_json_object(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_headers_and_rows() {
        let value = json!({
            "anexo": "RREO-Anexo 03",
            "conta": "ICMS",
            "coluna": "MR-03",
            "valor": "10",
            "uf": "PR",
        });
        let record = RevenueRecord::from_json_object(&value).unwrap();
        let records = vec![record.clone()];
        let headers = RevenueRecord::headers(&records);
        assert_eq!(headers, vec!["anexo", "conta", "coluna", "valor", "uf"]);
        let row = record.to_row(&headers);
        assert_eq!(row, vec!["RREO-Anexo 03", "ICMS", "MR-03", "10", "PR"]);
    }

    #[test]
    fn test_round_trip_through_fields() {
        let value = json!({
            "anexo": "RREO-Anexo 03",
            "conta": "ICMS",
            "coluna": "Agosto",
            "valor": "123.45",
            "id_ente": 41,
        });
        let record = RevenueRecord::from_json_object(&value).unwrap();
        let headers = RevenueRecord::headers(std::slice::from_ref(&record));
        let row = record.to_row(&headers);
        let back = RevenueRecord::from_fields(&headers, &row);
        assert_eq!(record, back);
    }

    #[test]
    fn test_empty_extras_are_absent() {
        let value = json!({
            "anexo": "RREO-Anexo 03",
            "conta": "ICMS",
            "coluna": "MR-02",
            "valor": "1",
            "rotulo": "",
            "observacao": null,
        });
        let record = RevenueRecord::from_json_object(&value).unwrap();
        assert_eq!(record.field("rotulo"), None);
        assert_eq!(record.field("observacao"), None);

        // The same normalization applies when reading a CSV row back.
        let headers = ["anexo", "conta", "coluna", "valor", "rotulo"];
        let from_csv = RevenueRecord::from_fields(&headers, &["RREO-Anexo 03", "ICMS", "MR-02", "1", ""]);
        assert_eq!(record, from_csv);
    }

    #[test]
    fn test_source_display_and_filenames() {
        assert_eq!(Source::Tesouro.to_string(), "tesouro");
        assert_eq!("siconfi".parse::<Source>().unwrap(), Source::Siconfi);
        assert_eq!(Source::Tesouro.csv_filename(), "dados_tesouro.csv");
        assert_eq!(Source::Siconfi.csv_filename(), "dados_siconfi.csv");
    }
}
