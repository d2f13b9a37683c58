use super::{ApiClient, ApiEnvelope, ApiError, ApiResult, Auth};
use crate::list::{ListQuery, ListResult};
use crate::models::{
    map_record_row, parse_list_payload, Cliente, DocumentKind, NcfSequence, RecordRow, User,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Clone, Debug)]
struct LoginRequest<'a> {
    #[serde(rename = "emailOrUsername")]
    email_or_username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct LoginData {
    pub token: String,
    pub user: User,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub username: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct CreateClienteRequest {
    pub client_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rnc: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct LineItemPayload {
    pub description: String,
    pub amount: f64,
    pub quantity: f64,
    pub subtotal: f64,
}

/// Body for both `POST /api/cotizaciones` and its `/preview` sibling.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct CreateCotizacionRequest {
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub date: String,
    pub items: Vec<LineItemPayload>,
    pub total: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct FacturaItemPayload {
    pub description: String,
    pub amount: f64,
    pub quantity: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub(crate) struct CreateFacturaRequest {
    pub date: String,
    pub client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    pub items: Vec<FacturaItemPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rnc: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
struct UpdateNcfRequest {
    current_value: u64,
}

/// What a create call tells us about the new record.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct CreatedDocument {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CreatedDocument {
    /// Accepts the id at `data.id` or at the top level.
    pub fn from_response(body: &Value) -> Self {
        let from = |v: &Value| serde_json::from_value::<CreatedDocument>(v.clone()).ok();
        let nested = body.get("data").and_then(from).filter(|d| d.id.is_some());
        nested.or_else(|| from(body)).unwrap_or_default()
    }
}

/// `?query=..&page=..&pageSize=..`, only with the parameters that are set.
pub(crate) fn list_query_string(query: &ListQuery) -> String {
    let mut params = Vec::new();
    let search = query.search_text.trim();
    if !search.is_empty() {
        params.push(format!("query={}", urlencoding::encode(search)));
    }
    if query.page > 0 {
        params.push(format!("page={}", query.page));
    }
    if query.page_size > 0 {
        params.push(format!("pageSize={}", query.page_size));
    }
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

/// Unwrap an optional envelope: enveloped bodies yield `data`, bare bodies
/// are returned as-is.
fn envelope_data(body: Value, fallback: &str) -> ApiResult<Value> {
    let enveloped = body.get("success").is_some() || body.get("status").is_some();
    if !enveloped {
        return Ok(body);
    }
    let env: ApiEnvelope<Value> =
        serde_json::from_value(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    if !env.is_success() {
        return Err(ApiError::Rejected(env.failure_message(fallback)));
    }
    Ok(env.data.unwrap_or(Value::Null))
}

pub(crate) fn record_page(
    kind: DocumentKind,
    body: Value,
    query: &ListQuery,
) -> ApiResult<ListResult<RecordRow>> {
    let data = envelope_data(body, "Error al cargar los datos")?;
    let (raw, total) = parse_list_payload(&data);
    let rows = raw
        .iter()
        .enumerate()
        .map(|(i, item)| map_record_row(kind, item, i))
        .collect();
    Ok(ListResult {
        rows,
        total,
        page: query.page,
        page_size: query.page_size,
    })
}

fn cliente_list(body: Value) -> ApiResult<(Vec<Cliente>, usize)> {
    let data = envelope_data(body, "Error al cargar clientes")?;
    let (raw, total) = parse_list_payload(&data);
    let clientes = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Cliente>(v).ok())
        .collect();
    Ok((clientes, total))
}

/// `data` is either the NCF string itself or `{ ncf }`.
pub(crate) fn next_ncf_from(body: &Value) -> Option<String> {
    let data = body.get("data").unwrap_or(body);
    data.as_str()
        .or_else(|| data.get("ncf").and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ApiClient {
    pub async fn login(&self, email_or_username: &str, password: &str) -> ApiResult<LoginData> {
        let body = LoginRequest {
            email_or_username,
            password,
        };
        let env: ApiEnvelope<LoginData> = self
            .request(Method::POST, "/api/auth/login", Some(&body), true)
            .await?;
        env.into_data("Login failed")
    }

    /// Returns the backend's confirmation message.
    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<String> {
        let body: Value = self
            .request(Method::POST, "/api/auth/register", Some(req), true)
            .await?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let env: ApiEnvelope<Value> =
                serde_json::from_value(body).map_err(|e| ApiError::Parse(e.to_string()))?;
            return Err(ApiError::Rejected(env.failure_message("Error al registrar")));
        }
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Usuario registrado")
            .to_string())
    }

    pub async fn logout(&self) -> ApiResult<()> {
        let _: Value = self.post("/api/auth/signout", &serde_json::json!({})).await?;
        Ok(())
    }

    pub async fn list_clientes(&self, query: &ListQuery) -> ApiResult<ListResult<Cliente>> {
        let body: Value = self
            .get(&format!("/api/clients{}", list_query_string(query)))
            .await?;
        let (rows, total) = cliente_list(body)?;
        Ok(ListResult {
            rows,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    /// Every client, for local filtering.
    pub async fn list_all_clientes(&self) -> ApiResult<Vec<Cliente>> {
        let body: Value = self.get("/api/clients").await?;
        cliente_list(body).map(|(rows, _)| rows)
    }

    pub async fn create_cliente(&self, req: &CreateClienteRequest) -> ApiResult<Value> {
        self.post("/api/clients", req).await
    }

    pub async fn update_cliente(&self, id: i64, req: &CreateClienteRequest) -> ApiResult<Value> {
        self.put(&format!("/api/clients/{id}"), req).await
    }

    pub async fn delete_cliente(&self, id: i64) -> ApiResult<()> {
        let _: Value = self.delete(&format!("/api/clients/{id}")).await?;
        Ok(())
    }

    pub async fn list_records(
        &self,
        kind: DocumentKind,
        query: &ListQuery,
    ) -> ApiResult<ListResult<RecordRow>> {
        let body: Value = self
            .get(&format!("/api/{}{}", kind, list_query_string(query)))
            .await?;
        record_page(kind, body, query)
    }

    /// Raw quote record, used to seed an invoice from a quote.
    pub async fn get_cotizacion(&self, id: i64) -> ApiResult<Value> {
        let body: Value = self.get(&format!("/api/cotizaciones?id={id}")).await?;
        let data = envelope_data(body, "Cotización no encontrada")?;
        // Some deployments answer the `?id=` lookup with a one-element list.
        let (list, _) = parse_list_payload(&data);
        match list.into_iter().next() {
            Some(first) if data.get("id").is_none() => Ok(first),
            _ => Ok(data),
        }
    }

    pub async fn create_cotizacion(
        &self,
        req: &CreateCotizacionRequest,
    ) -> ApiResult<CreatedDocument> {
        let body: Value = self.post("/api/cotizaciones", req).await?;
        envelope_data(body.clone(), "Error al guardar la cotización")?;
        Ok(CreatedDocument::from_response(&body))
    }

    /// Renders a draft without persisting it. The body carries the PDF
    /// in the same shapes as the PDF endpoint.
    pub async fn preview_cotizacion(&self, req: &CreateCotizacionRequest) -> ApiResult<Value> {
        self.post("/api/cotizaciones/preview", req).await
    }

    pub async fn create_factura(&self, req: &CreateFacturaRequest) -> ApiResult<CreatedDocument> {
        let body: Value = self.post("/api/facturas", req).await?;
        envelope_data(body.clone(), "Error al guardar la factura")?;
        Ok(CreatedDocument::from_response(&body))
    }

    /// `GET /api/<kind>/:id/pdf?format=base64`, authenticated with `X-API-KEY`.
    pub async fn document_pdf(&self, kind: DocumentKind, id: i64) -> ApiResult<Value> {
        let endpoint = format!("/api/{kind}/{id}/pdf?format=base64");
        self.send::<Value, ()>(Method::GET, &endpoint, None, Auth::ApiKey)
            .await
    }

    pub async fn next_ncf(&self) -> ApiResult<Option<String>> {
        let body: Value = self.get("/api/ncf/next").await?;
        let data = envelope_data(body.clone(), "No se pudo obtener el NCF")?;
        Ok(next_ncf_from(&data).or_else(|| next_ncf_from(&body)))
    }

    pub async fn ncf_sequence(&self) -> ApiResult<NcfSequence> {
        let body: Value = self.get("/api/ncf/sequence").await?;
        let data = envelope_data(body, "No se pudo cargar la secuencia NCF")?;
        serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub async fn update_ncf_sequence(&self, current_value: u64) -> ApiResult<String> {
        let body: Value = self
            .put("/api/ncf/sequence", &UpdateNcfRequest { current_value })
            .await?;
        envelope_data(body.clone(), "Failed to update")?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("NCF Sequence updated successfully")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_omits_empty_search() {
        let q = ListQuery::new(10);
        assert_eq!(list_query_string(&q), "?page=1&pageSize=10");

        let mut q = ListQuery::new(25);
        q.set_search_text("Ferretería Ochoa");
        assert_eq!(
            list_query_string(&q),
            "?query=Ferreter%C3%ADa%20Ochoa&page=1&pageSize=25"
        );
    }

    #[test]
    fn test_login_body_uses_email_or_username() {
        let v = serde_json::to_value(LoginRequest {
            email_or_username: "ana",
            password: "x",
        })
        .expect("serialize");
        assert_eq!(v, json!({ "emailOrUsername": "ana", "password": "x" }));
    }

    #[test]
    fn test_register_body_uses_phone_number_key() {
        let v = serde_json::to_value(RegisterRequest {
            email: "a@b.do".into(),
            password: "p".into(),
            name: "Ana Pérez".into(),
            username: "ana".into(),
            phone_number: "8095550101".into(),
        })
        .expect("serialize");
        assert_eq!(v["phoneNumber"], "8095550101");
        assert!(v.get("phone_number").is_none());
    }

    #[test]
    fn test_factura_body_skips_absent_optionals() {
        let v = serde_json::to_value(CreateFacturaRequest {
            date: "2024-05-01".into(),
            client: "ACME".into(),
            client_id: None,
            items: vec![FacturaItemPayload {
                description: "Volantes".into(),
                amount: 10.0,
                quantity: 2.0,
            }],
            ncf: None,
            rnc: None,
        })
        .expect("serialize");
        assert!(v.get("client_id").is_none());
        assert!(v.get("ncf").is_none());
        assert_eq!(v["items"][0]["quantity"], 2.0);
    }

    #[test]
    fn test_record_page_from_envelope() {
        let body = json!({
            "success": true,
            "data": { "data": [{ "id": 9, "code": "COT-9", "total": 100 }], "total": 31 }
        });
        let mut q = ListQuery::new(10);
        q.go_to_page(4);
        let page = record_page(DocumentKind::Cotizacion, body, &q).expect("page");
        assert_eq!(page.total, 31);
        assert_eq!(page.page, 4);
        assert_eq!(page.rows[0].code, "COT-9");
        assert_eq!(page.rows[0].amount, "100");
    }

    #[test]
    fn test_record_page_bare_array() {
        let body = json!([{ "no_factura": "F-1" }, { "no_factura": "F-2" }]);
        let page = record_page(DocumentKind::Factura, body, &ListQuery::default()).expect("page");
        assert_eq!(page.total, 2);
        assert_eq!(page.rows[1].id, 2);
    }

    #[test]
    fn test_rejected_envelope_is_an_error() {
        let body = json!({ "success": false, "message": "Sin permisos" });
        let err = record_page(DocumentKind::Factura, body, &ListQuery::default())
            .expect_err("should fail");
        assert_eq!(err, ApiError::Rejected("Sin permisos".into()));
    }

    #[test]
    fn test_cliente_list_skips_malformed_rows() {
        let (rows, total) = cliente_list(json!({
            "status": true,
            "data": { "items": [{ "id": 1, "client_name": "ACME" }, { "nombre": "sin id" }] }
        }))
        .expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(total, 2);
    }

    #[test]
    fn test_created_document_id_locations() {
        let d = CreatedDocument::from_response(&json!({ "success": true, "data": { "id": 12, "code": "COT-12" } }));
        assert_eq!(d.id, Some(12));
        assert_eq!(d.code.as_deref(), Some("COT-12"));

        let d = CreatedDocument::from_response(&json!({ "id": 5, "message": "ok" }));
        assert_eq!(d.id, Some(5));

        assert_eq!(CreatedDocument::from_response(&json!({ "ok": true })).id, None);
    }

    #[test]
    fn test_next_ncf_shapes() {
        assert_eq!(
            next_ncf_from(&json!({ "data": "B0100000042" })).as_deref(),
            Some("B0100000042")
        );
        assert_eq!(
            next_ncf_from(&json!({ "data": { "ncf": "B0100000043" } })).as_deref(),
            Some("B0100000043")
        );
        assert_eq!(next_ncf_from(&json!({ "data": {} })), None);
    }
}
