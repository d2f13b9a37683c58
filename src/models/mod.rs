mod row;

pub(crate) use row::{first_alias, map_record_row, parse_list_payload, RecordRow};

use serde::{Deserialize, Serialize};

/// Authenticated staff member as returned by `/api/auth/login`.
///
/// Only `id` is guaranteed by the backend; everything else is optional so
/// older accounts without a display name still deserialize.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct User {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            &self.name
        } else if !self.username.trim().is_empty() {
            &self.username
        } else {
            &self.email
        }
    }
}

/// Customer record.
///
/// The clients table has been migrated a few times, so the same concept can
/// arrive under Spanish or English keys. Use the accessor methods instead
/// of reading the alias fields directly.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct Cliente {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub rnc: Option<String>,
}

impl Cliente {
    /// Name only if the backend sent one (`client_name`, `nombre`, `name`).
    pub fn known_name(&self) -> Option<&str> {
        self.client_name
            .as_deref()
            .or(self.nombre.as_deref())
            .or(self.name.as_deref())
    }

    pub fn display_name(&self) -> String {
        self.known_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Cliente {}", self.id))
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone_number.as_deref().or(self.telefono.as_deref())
    }

    pub fn company(&self) -> &str {
        self.company_name.as_deref().unwrap_or_default()
    }
}

/// Fiscal receipt sequence (`/api/ncf/sequence`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NcfSequence {
    #[serde(rename = "type")]
    pub prefix: String,
    #[serde(default)]
    pub description: String,
    pub current_value: u64,
}

impl NcfSequence {
    /// Last NCF handed out, or `None` before the first one.
    pub fn last_ncf(&self) -> Option<String> {
        (self.current_value > 0).then(|| self.format(self.current_value))
    }

    /// The NCF the backend will allocate next: prefix + zero-padded counter.
    pub fn next_ncf(&self) -> String {
        self.format(self.current_value.saturating_add(1))
    }

    fn format(&self, value: u64) -> String {
        format!("{}{:08}", self.prefix, value)
    }
}

/// Document families that have a list page and a PDF endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub(crate) enum DocumentKind {
    #[strum(serialize = "cotizaciones")]
    Cotizacion,
    #[strum(serialize = "facturas")]
    Factura,
}

impl DocumentKind {
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Cotizacion => "Cotizaciones",
            DocumentKind::Factura => "Facturas",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            DocumentKind::Cotizacion => "Cotización",
            DocumentKind::Factura => "Factura",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cliente_name_precedence() {
        let c: Cliente = serde_json::from_value(serde_json::json!({
            "id": 7,
            "nombre": "Juan",
            "name": "John"
        }))
        .expect("cliente should parse");
        assert_eq!(c.display_name(), "Juan");

        let c: Cliente = serde_json::from_value(serde_json::json!({
            "id": 7,
            "client_name": "ACME",
            "nombre": "Juan"
        }))
        .expect("cliente should parse");
        assert_eq!(c.display_name(), "ACME");

        let c = Cliente {
            id: 9,
            ..Default::default()
        };
        assert_eq!(c.display_name(), "Cliente 9");
        assert!(c.known_name().is_none());
    }

    #[test]
    fn test_cliente_phone_falls_back_to_telefono() {
        let c = Cliente {
            id: 1,
            telefono: Some("809-555-0101".to_string()),
            ..Default::default()
        };
        assert_eq!(c.phone(), Some("809-555-0101"));
    }

    #[test]
    fn test_ncf_sequence_next_is_zero_padded() {
        let seq: NcfSequence = serde_json::from_value(serde_json::json!({
            "type": "B01",
            "description": "Crédito fiscal",
            "current_value": 41
        }))
        .expect("sequence should parse");
        assert_eq!(seq.next_ncf(), "B0100000042");
        assert_eq!(seq.last_ncf().as_deref(), Some("B0100000041"));

        let fresh = NcfSequence {
            current_value: 0,
            ..seq
        };
        assert_eq!(fresh.last_ncf(), None);
        assert_eq!(fresh.next_ncf(), "B0100000001");
    }

    #[test]
    fn test_document_kind_path_segment() {
        assert_eq!(DocumentKind::Cotizacion.to_string(), "cotizaciones");
        assert_eq!(DocumentKind::Factura.to_string(), "facturas");
    }

    #[test]
    fn test_user_without_optional_fields() {
        let u: User = serde_json::from_value(serde_json::json!({ "id": 3, "email": "a@b.do" }))
            .expect("user should parse");
        assert_eq!(u.display_name(), "a@b.do");
        assert!(u.role.is_none());
    }
}
