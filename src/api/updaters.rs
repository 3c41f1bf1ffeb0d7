// Partial update builder module
// Turns the recognized subset of a request body into a parameterized store mutation

use serde_json::{Map, Value};

use super::error::{HandlerError, HandlerResult};
use super::normalize::coerce_price;
use crate::logger;
use crate::store::{AttributeValue, UpdateItem};

/// Value conversion applied before binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// Numeric with zero fallback
    Price,
}

/// One recognized body key and the attribute it writes
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub external: &'static str,
    pub internal: &'static str,
    pub transform: Transform,
    /// Required attributes can never be removed
    pub required: bool,
}

/// How a JSON `null` value is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// `null` clears the attribute
    Remove,
    /// `null` counts as absent
    Skip,
}

/// Declarative field table
#[derive(Debug)]
pub struct FieldTable {
    pub name: &'static str,
    pub fields: &'static [FieldMapping],
    pub nulls: NullPolicy,
}

const fn field(external: &'static str, internal: &'static str) -> FieldMapping {
    FieldMapping {
        external,
        internal,
        transform: Transform::Identity,
        required: false,
    }
}

const fn price(external: &'static str, internal: &'static str) -> FieldMapping {
    FieldMapping {
        transform: Transform::Price,
        ..field(external, internal)
    }
}

const fn required(name: &'static str) -> FieldMapping {
    FieldMapping {
        required: true,
        ..field(name, name)
    }
}

/// Raw field names, written as given
pub static DIRECT_FIELDS: FieldTable = FieldTable {
    name: "direct",
    nulls: NullPolicy::Remove,
    fields: &[
        required("name"),
        field("city", "city"),
        field("country", "country"),
        field("district", "district"),
        field("street", "street"),
        field("number", "number"),
        field("complement", "complement"),
        field("state", "state"),
        field("email", "email"),
        field("cnpj", "cnpj"),
        field("ddd", "ddd"),
        field("numeroTelefone", "numeroTelefone"),
        field("telefoneCompleto", "telefoneCompleto"),
        field("razaoSocial", "razaoSocial"),
        field("capacity", "capacity"),
        field("amenities", "amenities"),
        field("availability", "availability"),
        required("hoster"),
        field("categoria", "categoria"),
        field("subcategoria", "subcategoria"),
        field("descricao", "descricao"),
        field("regras", "regras"),
        field("diasSemana", "diasSemana"),
        field("horaInicio", "horaInicio"),
        field("horaFim", "horaFim"),
        price("precoHora", "precoHora"),
        price("precoDia", "precoDia"),
        field("imagemUrl", "imagemUrl"),
    ],
};

/// External client names mapped onto stored attributes
pub static ALIASED_FIELDS: FieldTable = FieldTable {
    name: "aliased",
    nulls: NullPolicy::Skip,
    fields: &[
        field("title", "name"),
        field("description", "descricao"),
        field("capacity", "capacity"),
        price("pricePerHour", "precoHora"),
        field("isEnabled", "availability"),
        field("autoApprove", "autoApprove"),
        field("facilityIDs", "amenities"),
        field("weekdays", "diasSemana"),
        field("minDurationMinutes", "minDurationMinutes"),
        field("bufferMinutes", "bufferMinutes"),
    ],
};

/// Accumulates `SET`/`REMOVE` clauses over `#fN`/`:vN` placeholders
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    next: usize,
    sets: Vec<String>,
    removes: Vec<String>,
    update: UpdateItem,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn bind_name(&mut self, attribute: &str) -> String {
        let placeholder = format!("#f{}", self.next);
        self.update
            .names
            .insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    pub fn set(&mut self, attribute: &str, value: AttributeValue) -> &mut Self {
        let name = self.bind_name(attribute);
        let value_placeholder = format!(":v{}", self.next);
        self.update.values.insert(value_placeholder.clone(), value);
        self.sets.push(format!("{name} = {value_placeholder}"));
        self.next += 1;
        self
    }

    pub fn remove(&mut self, attribute: &str) -> &mut Self {
        let name = self.bind_name(attribute);
        self.removes.push(name);
        self.next += 1;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.removes.is_empty()
    }

    /// Finish the mutation; an empty builder is rejected
    pub fn finish(mut self) -> HandlerResult<UpdateItem> {
        if self.is_empty() {
            return Err(HandlerError::EmptyUpdate);
        }
        let mut clauses = Vec::with_capacity(2);
        if !self.sets.is_empty() {
            clauses.push(format!("SET {}", self.sets.join(", ")));
        }
        if !self.removes.is_empty() {
            clauses.push(format!("REMOVE {}", self.removes.join(", ")));
        }
        self.update.expression = clauses.join(" ");
        Ok(self.update)
    }
}

fn convert(mapping: &FieldMapping, value: &Value) -> Option<AttributeValue> {
    match mapping.transform {
        Transform::Identity => AttributeValue::from_json(value),
        Transform::Price => Some(AttributeValue::number(coerce_price(value))),
    }
}

/// Build a partial mutation from the recognized keys of `body`
///
/// Only keys listed in `table` are considered; unlisted keys are
/// ignored. Fails with [`HandlerError::EmptyUpdate`] when nothing was
/// recognized. A top-level `null` follows the table's [`NullPolicy`];
/// a `null` nested inside a list or object value is dropped from the
/// stored value.
pub fn build_update(body: &Map<String, Value>, table: &FieldTable) -> HandlerResult<UpdateItem> {
    let mut builder = ExpressionBuilder::new();
    for mapping in table.fields {
        let Some(value) = body.get(mapping.external) else {
            continue;
        };

        if value.is_null() {
            match table.nulls {
                NullPolicy::Skip => continue,
                NullPolicy::Remove if mapping.required => {
                    return Err(HandlerError::InvalidField {
                        field: mapping.external,
                        reason: "cannot be cleared",
                    });
                }
                NullPolicy::Remove => {
                    logger::log_debug(&format!(
                        "[{}] clearing field: {}",
                        table.name, mapping.internal
                    ));
                    builder.remove(mapping.internal);
                    continue;
                }
            }
        }

        if let Some(attr) = convert(mapping, value) {
            logger::log_debug(&format!(
                "[{}] mapped field: {} -> {} ({})",
                table.name,
                mapping.external,
                mapping.internal,
                attr.type_name()
            ));
            builder.set(mapping.internal, attr);
        }
    }
    builder.finish()
}

/// Mutation flagging a user as a hoster
pub fn hoster_flag() -> HandlerResult<UpdateItem> {
    let mut builder = ExpressionBuilder::new();
    builder.set("isHoster", AttributeValue::Bool(true));
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: &Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_direct_single_field() {
        let update = build_update(&body(&json!({"name": "X"})), &DIRECT_FIELDS).unwrap();
        assert_eq!(update.expression, "SET #f0 = :v0");
        assert_eq!(update.names["#f0"], "name");
        assert_eq!(update.values[":v0"], AttributeValue::S("X".to_string()));
    }

    #[test]
    fn test_direct_follows_table_order() {
        let update = build_update(
            &body(&json!({"precoDia": "80", "city": "Recife", "name": "X"})),
            &DIRECT_FIELDS,
        )
        .unwrap();
        assert_eq!(update.expression, "SET #f0 = :v0, #f1 = :v1, #f2 = :v2");
        assert_eq!(update.names["#f0"], "name");
        assert_eq!(update.names["#f1"], "city");
        assert_eq!(update.names["#f2"], "precoDia");
        assert_eq!(update.values[":v2"], AttributeValue::N("80".to_string()));
    }

    #[test]
    fn test_values_never_inlined() {
        let tricky = "a, #b = :c REMOVE d";
        let update = build_update(&body(&json!({"regras": tricky})), &DIRECT_FIELDS).unwrap();
        assert!(!update.expression.contains(tricky));
        assert_eq!(update.values[":v0"], AttributeValue::S(tricky.to_string()));
    }

    #[test]
    fn test_direct_null_removes() {
        let update = build_update(
            &body(&json!({"complement": null, "city": "Olinda"})),
            &DIRECT_FIELDS,
        )
        .unwrap();
        assert_eq!(update.expression, "SET #f0 = :v0 REMOVE #f1");
        assert_eq!(update.names["#f0"], "city");
        assert_eq!(update.names["#f1"], "complement");
        assert!(!update.values.contains_key(":v1"));
    }

    #[test]
    fn test_nested_nulls_dropped_from_values() {
        let update = build_update(
            &body(&json!({"amenities": ["wifi", null, "cafe"]})),
            &DIRECT_FIELDS,
        )
        .unwrap();
        assert_eq!(
            update.values[":v0"],
            AttributeValue::L(vec![
                AttributeValue::S("wifi".to_string()),
                AttributeValue::S("cafe".to_string()),
            ])
        );
    }

    #[test]
    fn test_required_field_cannot_be_cleared() {
        let err = build_update(&body(&json!({"hoster": null})), &DIRECT_FIELDS).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "hoster cannot be cleared");
    }

    #[test]
    fn test_unrecognized_keys_are_empty_update() {
        let err = build_update(&body(&json!({"bogus": 1, "title": "Y"})), &DIRECT_FIELDS).unwrap_err();
        assert!(matches!(err, HandlerError::EmptyUpdate));
    }

    #[test]
    fn test_aliased_maps_names() {
        let update = build_update(
            &body(&json!({"title": "Y", "isEnabled": false, "pricePerHour": "abc"})),
            &ALIASED_FIELDS,
        )
        .unwrap();
        assert_eq!(update.names["#f0"], "name");
        assert_eq!(update.names["#f1"], "precoHora");
        assert_eq!(update.names["#f2"], "availability");
        assert_eq!(update.values[":v1"], AttributeValue::N("0".to_string()));
        assert_eq!(update.values[":v2"], AttributeValue::Bool(false));
    }

    #[test]
    fn test_aliased_ignores_nulls_and_raw_names() {
        let err = build_update(
            &body(&json!({"title": null, "name": "raw"})),
            &ALIASED_FIELDS,
        )
        .unwrap_err();
        assert!(matches!(err, HandlerError::EmptyUpdate));
    }

    #[test]
    fn test_hoster_flag() {
        let update = hoster_flag().unwrap();
        assert_eq!(update.expression, "SET #f0 = :v0");
        assert_eq!(update.names["#f0"], "isHoster");
        assert_eq!(update.values[":v0"], AttributeValue::Bool(true));
    }

    #[test]
    fn test_table_internals_unique() {
        for table in [&DIRECT_FIELDS, &ALIASED_FIELDS] {
            let mut seen = std::collections::HashSet::new();
            for mapping in table.fields {
                assert!(seen.insert(mapping.internal), "{} repeats {}", table.name, mapping.internal);
            }
        }
    }
}
