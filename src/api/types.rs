// Request body types
// Validated input for space creation

use serde_json::{Map, Value};

use super::error::{HandlerError, HandlerResult};
use super::normalize::coerce_price;
use crate::store::{AttributeValue, Item};

pub const DEFAULT_COUNTRY: &str = "Brasil";

/// Optional attributes copied as given when non-null
const OPTIONAL_FIELDS: &[&str] = &[
    "street",
    "number",
    "complement",
    "district",
    "city",
    "state",
    "email",
    "cnpj",
    "ddd",
    "numeroTelefone",
    "telefoneCompleto",
    "razaoSocial",
    "capacity",
    "categoria",
    "subcategoria",
    "descricao",
    "regras",
    "horaInicio",
    "horaFim",
];

const PRICE_FIELDS: [&str; 2] = ["precoHora", "precoDia"];

/// A validated space ready to persist
#[derive(Debug, Clone)]
pub struct NewSpace {
    pub space_id: String,
    pub hoster: String,
    pub item: Item,
}

impl NewSpace {
    /// Validate a create body and build the stored record
    ///
    /// Explicit `null`s are never stored: a top-level one omits the
    /// attribute and one nested in a list or object is dropped.
    pub fn from_body(body: &Map<String, Value>) -> HandlerResult<Self> {
        let space_id = required_string(body, "spaceId")?;
        let name = required_string(body, "name")?;
        let hoster = required_string(body, "hoster")?;

        let mut item = Item::new();
        item.insert("spaceId".to_string(), AttributeValue::S(space_id.clone()));
        item.insert("name".to_string(), AttributeValue::S(name));
        item.insert("hoster".to_string(), AttributeValue::S(hoster.clone()));

        for field in OPTIONAL_FIELDS {
            if let Some(attr) = body.get(*field).and_then(AttributeValue::from_json) {
                item.insert((*field).to_string(), attr);
            }
        }

        // Defaults apply only when the key is absent; an explicit null omits the attribute
        let defaults = [
            ("country", AttributeValue::S(DEFAULT_COUNTRY.to_string())),
            ("amenities", AttributeValue::L(Vec::new())),
            ("diasSemana", AttributeValue::L(Vec::new())),
            ("availability", AttributeValue::Bool(true)),
        ];
        for (field, default) in defaults {
            let attr = match body.get(field) {
                None => Some(default),
                Some(value) => AttributeValue::from_json(value),
            };
            if let Some(attr) = attr {
                item.insert(field.to_string(), attr);
            }
        }

        for field in PRICE_FIELDS {
            let price = body.get(field).map_or(0.0, coerce_price);
            item.insert(field.to_string(), AttributeValue::number(price));
        }

        if let Some(Value::String(url)) = body.get("imagemUrl") {
            if !url.is_empty() {
                item.insert("imagemUrl".to_string(), AttributeValue::S(url.clone()));
            }
        }

        Ok(Self {
            space_id,
            hoster,
            item,
        })
    }
}

fn required_string(body: &Map<String, Value>, field: &'static str) -> HandlerResult<String> {
    match body.get(field) {
        None | Some(Value::Null) => Err(HandlerError::MissingField(field)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(HandlerError::InvalidField {
            field,
            reason: "must be a non-empty string",
        }),
    }
}
