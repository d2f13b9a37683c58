use super::DocumentKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display projection of a quote or invoice.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecordRow {
    pub id: i64,
    pub date: String,
    pub code: String,
    pub client: String,
    pub description: String,
    pub amount: String,
    pub ncf: Option<String>,
}

impl RecordRow {
    /// `YYYY-MM-DD[ HH:MM:SS]` as `DD/MM/YYYY`. Anything else is shown verbatim.
    pub fn display_date(&self) -> String {
        crate::util::format_date_dmy(&self.date)
    }

    pub fn description_lines(&self) -> Vec<&str> {
        self.description.lines().collect()
    }
}

/// Ordered key aliases per display field. First present, non-null key wins.
struct AliasTable {
    date: &'static [&'static str],
    code: &'static [&'static str],
    client: &'static [&'static str],
    description: &'static [&'static str],
    amount: &'static [&'static str],
    ncf: &'static [&'static str],
}

const COTIZACION_ALIASES: AliasTable = AliasTable {
    date: &["date", "fecha"],
    code: &["code", "codigo"],
    client: &["client_name", "client", "cliente"],
    description: &["description", "descripcion"],
    amount: &["total", "amount", "monto"],
    ncf: &[],
};

const FACTURA_ALIASES: AliasTable = AliasTable {
    date: &["date", "fecha"],
    code: &["no_factura", "code", "codigo"],
    client: &["client_name", "client", "cliente"],
    description: &["description", "descripcion"],
    amount: &["amount", "monto", "total"],
    ncf: &["ncf"],
};

fn aliases_for(kind: DocumentKind) -> &'static AliasTable {
    match kind {
        DocumentKind::Cotizacion => &COTIZACION_ALIASES,
        DocumentKind::Factura => &FACTURA_ALIASES,
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn first_alias(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find_map(scalar_text)
}

fn joined_item_descriptions(item: &Value) -> Option<String> {
    let items = item.get("items")?.as_array()?;
    if items.is_empty() {
        return None;
    }

    let lines = items
        .iter()
        .map(|it| {
            it.get("description")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or("(Sin descripción)")
        })
        .collect::<Vec<_>>();
    Some(lines.join("\n"))
}

fn record_id(item: &Value, index: usize) -> i64 {
    item.get("id")
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(index as i64 + 1)
}

/// Normalize one raw backend record into a [`RecordRow`].
pub(crate) fn map_record_row(kind: DocumentKind, item: &Value, index: usize) -> RecordRow {
    let t = aliases_for(kind);
    let text = |keys: &[&str]| first_alias(item, keys).unwrap_or_default();

    let description = first_alias(item, t.description)
        .filter(|s| !s.is_empty())
        .or_else(|| joined_item_descriptions(item))
        .unwrap_or_default();

    RecordRow {
        id: record_id(item, index),
        date: text(t.date),
        code: text(t.code),
        client: text(t.client),
        description,
        amount: text(t.amount),
        ncf: if t.ncf.is_empty() {
            None
        } else {
            first_alias(item, t.ncf)
        },
    }
}

/// Pull the record list and total out of a list response's `data` member.
///
/// Accepted shapes: `[...]`, `{ data: [...], total }`, `{ items: [...], total }`.
/// A missing or zero total falls back to the number of records received.
pub(crate) fn parse_list_payload(data: &Value) -> (Vec<Value>, usize) {
    if let Some(list) = data.as_array() {
        return (list.clone(), list.len());
    }

    let list = data
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| data.get("items").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default();

    let total = data
        .get("total")
        .and_then(Value::as_u64)
        .map(|t| t as usize)
        .filter(|t| *t > 0)
        .unwrap_or(list.len());

    (list, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_date_prefers_date_over_fecha() {
        let row = map_record_row(
            DocumentKind::Cotizacion,
            &json!({ "id": 1, "date": "2024-05-01", "fecha": "2023-01-01" }),
            0,
        );
        assert_eq!(row.date, "2024-05-01");
    }

    #[test]
    fn test_date_uses_fecha_when_alone() {
        let row = map_record_row(DocumentKind::Factura, &json!({ "fecha": "2023-01-01" }), 0);
        assert_eq!(row.date, "2023-01-01");
    }

    #[test]
    fn test_date_missing_is_empty() {
        let row = map_record_row(DocumentKind::Factura, &json!({ "id": 4 }), 0);
        assert_eq!(row.date, "");
        assert_eq!(row.amount, "");
    }

    #[test]
    fn test_null_alias_is_skipped() {
        let row = map_record_row(
            DocumentKind::Cotizacion,
            &json!({ "date": null, "fecha": "2022-02-02" }),
            0,
        );
        assert_eq!(row.date, "2022-02-02");
    }

    #[test]
    fn test_amount_precedence_differs_by_kind() {
        let raw = json!({ "total": "100.00", "amount": 80, "monto": "70" });
        assert_eq!(map_record_row(DocumentKind::Cotizacion, &raw, 0).amount, "100.00");
        assert_eq!(map_record_row(DocumentKind::Factura, &raw, 0).amount, "80");
    }

    #[test]
    fn test_factura_code_and_ncf() {
        let row = map_record_row(
            DocumentKind::Factura,
            &json!({ "id": 3, "no_factura": "F-0003", "code": "X", "ncf": "B0100000003" }),
            0,
        );
        assert_eq!(row.code, "F-0003");
        assert_eq!(row.ncf.as_deref(), Some("B0100000003"));
        assert!(map_record_row(DocumentKind::Cotizacion, &json!({ "ncf": "B01" }), 0)
            .ncf
            .is_none());
    }

    #[test]
    fn test_description_falls_back_to_item_lines() {
        let row = map_record_row(
            DocumentKind::Cotizacion,
            &json!({
                "id": 2,
                "items": [
                    { "description": "Impresión", "amount": 10 },
                    { "description": "" }
                ]
            }),
            0,
        );
        assert_eq!(row.description, "Impresión\n(Sin descripción)");
        assert_eq!(row.description_lines(), vec!["Impresión", "(Sin descripción)"]);
    }

    #[test]
    fn test_missing_id_uses_position() {
        let row = map_record_row(DocumentKind::Cotizacion, &json!({ "code": "C-1" }), 4);
        assert_eq!(row.id, 5);
    }

    #[test]
    fn test_parse_list_payload_shapes() {
        let (rows, total) = parse_list_payload(&json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!((rows.len(), total), (2, 2));

        let (rows, total) =
            parse_list_payload(&json!({ "data": [{ "id": 1 }], "total": 31, "page": 2 }));
        assert_eq!((rows.len(), total), (1, 31));

        let (rows, total) = parse_list_payload(&json!({ "items": [{ "id": 1 }, { "id": 2 }] }));
        assert_eq!((rows.len(), total), (2, 2));

        let (rows, total) = parse_list_payload(&json!({ "message": "nada" }));
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }
}
