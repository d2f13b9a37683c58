use crate::api::{
    CreateCotizacionRequest, CreateFacturaRequest, FacturaItemPayload, LineItemPayload,
};
use crate::models::{first_alias, Cliente};
use crate::util::parse_decimal;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ValidationError {
    #[error("La descripción es obligatoria")]
    MissingDescription,
    #[error("El monto debe ser mayor que 0")]
    InvalidAmount,
    #[error("La cantidad debe ser mayor que 0")]
    InvalidQuantity,
    #[error("Agregue al menos un artículo")]
    NoItems,
    #[error("Seleccione un cliente")]
    MissingClient,
    #[error("Complete todos los campos obligatorios")]
    MissingFields,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LineItem {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub quantity: f64,
}

impl LineItem {
    pub fn new(description: &str, amount: f64, quantity: f64) -> Result<Self, ValidationError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        if amount.is_nan() || amount <= 0.0 {
            return Err(ValidationError::InvalidAmount);
        }
        if quantity.is_nan() || quantity <= 0.0 {
            return Err(ValidationError::InvalidQuantity);
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.to_string(),
            amount,
            quantity,
        })
    }

    pub fn subtotal(&self) -> f64 {
        self.amount * self.quantity
    }
}

/// The "add item" inputs, kept as raw text until submitted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ItemForm {
    pub description: String,
    pub amount: String,
    pub quantity: String,
}

impl Default for ItemForm {
    fn default() -> Self {
        Self {
            description: String::new(),
            amount: String::new(),
            quantity: "1".to_string(),
        }
    }
}

impl ItemForm {
    pub fn to_line_item(&self) -> Result<LineItem, ValidationError> {
        let amount = parse_decimal(&self.amount).ok_or(ValidationError::InvalidAmount)?;
        let quantity = parse_decimal(&self.quantity).ok_or(ValidationError::InvalidQuantity)?;
        LineItem::new(&self.description, amount, quantity)
    }
}

/// Who a document is issued to. `id` is absent for free-text clients.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ClientRef {
    pub id: Option<i64>,
    pub name: String,
    pub rnc: Option<String>,
}

impl From<&Cliente> for ClientRef {
    fn from(c: &Cliente) -> Self {
        Self {
            id: Some(c.id),
            name: c.display_name(),
            rnc: c.rnc.clone().filter(|r| !r.trim().is_empty()),
        }
    }
}

/// In-progress quote or invoice inside a create modal.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DocumentDraft {
    pub client: Option<ClientRef>,
    pub date: String,
    pub items: Vec<LineItem>,
    pub item_form: ItemForm,
    pub ncf: String,
    pub rnc: String,
}

impl DocumentDraft {
    pub fn new(today: &str) -> Self {
        Self {
            client: None,
            date: today.to_string(),
            items: Vec::new(),
            item_form: ItemForm::default(),
            ncf: String::new(),
            rnc: String::new(),
        }
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Validate the item form, append it and reset the form. On error the
    /// form keeps what the user typed.
    pub fn add_item(&mut self) -> Result<(), ValidationError> {
        let item = self.item_form.to_line_item()?;
        self.items.push(item);
        self.item_form = ItemForm::default();
        Ok(())
    }

    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
    }

    pub fn select_client(&mut self, client: ClientRef) {
        if let Some(rnc) = &client.rnc {
            self.rnc = rnc.clone();
        }
        self.client = Some(client);
    }

    pub fn clear_client(&mut self) {
        self.client = None;
        self.rnc.clear();
    }

    /// Back to an empty draft dated `today`.
    pub fn reset(&mut self, today: &str) {
        *self = Self::new(today);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.items.is_empty() && self.item_form == ItemForm::default()
    }

    pub fn cotizacion_payload(&self) -> Result<CreateCotizacionRequest, ValidationError> {
        let client = self.client.as_ref().ok_or(ValidationError::MissingClient)?;
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        if self.date.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }

        Ok(CreateCotizacionRequest {
            client_id: client.id,
            client_name: Some(client.name.clone()),
            date: self.date.clone(),
            items: self
                .items
                .iter()
                .map(|i| LineItemPayload {
                    description: i.description.clone(),
                    amount: i.amount,
                    quantity: i.quantity,
                    subtotal: i.subtotal(),
                })
                .collect(),
            total: self.total(),
        })
    }

    pub fn factura_payload(&self) -> Result<CreateFacturaRequest, ValidationError> {
        let client = self.client.as_ref().ok_or(ValidationError::MissingClient)?;
        if client.name.trim().is_empty() || self.date.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(CreateFacturaRequest {
            date: self.date.clone(),
            client: client.name.clone(),
            client_id: client.id,
            items: self
                .items
                .iter()
                .map(|i| FacturaItemPayload {
                    description: i.description.clone(),
                    amount: i.amount,
                    quantity: i.quantity,
                })
                .collect(),
            ncf: non_empty(&self.ncf),
            rnc: non_empty(&self.rnc),
        })
    }

    /// Copy client and line items from a raw quote record. Items that do not
    /// validate are skipped; returns how many were taken.
    pub fn seed_from_cotizacion(&mut self, quote: &Value) -> usize {
        let text = |v: &Value, keys: &[&str]| first_alias(v, keys);

        let name = text(quote, &["client_name", "client", "cliente"]).unwrap_or_default();
        let id = quote.get("client_id").and_then(Value::as_i64);
        if !name.is_empty() || id.is_some() {
            self.select_client(ClientRef {
                id,
                name,
                rnc: text(quote, &["rnc"]),
            });
        }

        let number = |v: &Value, key: &str| match v.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => parse_decimal(s),
            _ => None,
        };

        let items: Vec<LineItem> = quote
            .get("items")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|it| {
                        let description = text(it, &["description", "descripcion"])?;
                        let amount = number(it, "amount").or_else(|| number(it, "monto"))?;
                        let quantity = number(it, "quantity").unwrap_or(1.0);
                        LineItem::new(&description, amount, quantity).ok()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let taken = items.len();
        self.items = items;
        taken
    }
}
