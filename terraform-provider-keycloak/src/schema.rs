//! Resource schemas.
//!
//! A [`Schema`] declares the attributes of a resource or data source along
//! with their type, optionality, defaults and validation. Plans run through
//! [`Schema::apply_defaults`], [`Schema::validate`] and
//! [`Schema::requires_replace`] before any request reaches Keycloak.

use keycloak_domain::domain::{
    errors::DomainError,
    values::{durations_equivalent, parse_duration_seconds},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Problem reported back to Terraform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "element", rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Bool,
    Int,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Single nested block.
    Object(Box<Schema>),
}

impl AttributeType {
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Bool, Value::Bool(_)) => true,
            (AttributeType::Int, Value::Number(n)) => n.is_i64(),
            (AttributeType::List(elem) | AttributeType::Set(elem), Value::Array(items)) => {
                items.iter().all(|item| elem.accepts(item))
            }
            (AttributeType::Map(elem), Value::Object(entries)) => {
                entries.values().all(|item| elem.accepts(item))
            }
            (AttributeType::Object(_), Value::Object(_)) => true,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Bool => "bool",
            AttributeType::Int => "number",
            AttributeType::List(_) => "list",
            AttributeType::Set(_) => "set",
            AttributeType::Map(_) => "map",
            AttributeType::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Validator {
    OneOf(Vec<&'static str>),
    /// Go-style duration string such as `"1h30m"`.
    Duration,
    Custom(fn(&Value) -> Result<(), String>),
}

impl Validator {
    fn check(&self, name: &str, value: &Value) -> Result<(), String> {
        match (self, value) {
            (Validator::OneOf(allowed), Value::String(s)) => {
                if allowed.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(DomainError::invalid_value(name, allowed, s).to_string())
                }
            }
            (Validator::Duration, Value::String(s)) => parse_duration_seconds(s)
                .map(|_| ())
                .map_err(|err| format!("{name}: {err}")),
            (Validator::Custom(check), value) => check(value),
            _ => Ok(()),
        }
    }
}

/// Treats two values as equal when planning, so no diff is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSuppress {
    Duration,
    CaseInsensitive,
}

impl DiffSuppress {
    fn suppresses(&self, old: &Value, new: &Value) -> bool {
        match (self, old, new) {
            (DiffSuppress::Duration, Value::String(a), Value::String(b)) => {
                durations_equivalent(a, b)
            }
            (DiffSuppress::CaseInsensitive, Value::String(a), Value::String(b)) => {
                a.eq_ignore_ascii_case(b)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub force_new: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    #[serde(skip)]
    pub validators: Vec<Validator>,
    #[serde(skip)]
    pub diff_suppress: Option<DiffSuppress>,
}

impl Attribute {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            description: String::new(),
            required: false,
            optional: true,
            computed: false,
            default: None,
            force_new: false,
            sensitive: false,
            conflicts_with: Vec::new(),
            validators: Vec::new(),
            diff_suppress: None,
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }

    pub fn bool() -> Self {
        Self::new(AttributeType::Bool)
    }

    pub fn int() -> Self {
        Self::new(AttributeType::Int)
    }

    pub fn list(elem: AttributeType) -> Self {
        Self::new(AttributeType::List(Box::new(elem)))
    }

    pub fn set(elem: AttributeType) -> Self {
        Self::new(AttributeType::Set(Box::new(elem)))
    }

    pub fn map(elem: AttributeType) -> Self {
        Self::new(AttributeType::Map(Box::new(elem)))
    }

    pub fn object(schema: Schema) -> Self {
        Self::new(AttributeType::Object(Box::new(schema)))
    }

    /// Duration string validated and compared by the number of seconds it
    /// denotes.
    pub fn duration() -> Self {
        Self::string()
            .validate(Validator::Duration)
            .diff_suppress(DiffSuppress::Duration)
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self.computed = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self.optional = true;
        self.computed = false;
        self
    }

    /// Set by the provider only.
    pub fn computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self
    }

    /// May be configured; otherwise filled in from Keycloak.
    pub fn optional_computed(mut self) -> Self {
        self.required = false;
        self.optional = true;
        self.computed = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn conflicts_with(mut self, others: &[&str]) -> Self {
        self.conflicts_with
            .extend(others.iter().map(|other| other.to_string()));
        self
    }

    pub fn one_of(self, allowed: &[&'static str]) -> Self {
        self.validate(Validator::OneOf(allowed.to_vec()))
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn diff_suppress(mut self, suppress: DiffSuppress) -> Self {
        self.diff_suppress = Some(suppress);
        self
    }

    fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// True when moving from `old` to `new` is a real change for this
    /// attribute.
    fn changed(&self, old: Option<&Value>, new: Option<&Value>) -> bool {
        let old = old.unwrap_or(&Value::Null);
        let new = new.unwrap_or(&Value::Null);
        if old == new {
            return false;
        }
        if let (AttributeType::Set(_), Value::Array(a), Value::Array(b)) =
            (&self.attr_type, old, new)
        {
            if a.len() == b.len() && a.iter().all(|item| b.contains(item)) {
                return false;
            }
        }
        !self
            .diff_suppress
            .is_some_and(|suppress| suppress.suppresses(old, new))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.attr_type == other.attr_type
            && self.required == other.required
            && self.optional == other.optional
            && self.computed == other.computed
            && self.default == other.default
            && self.force_new == other.force_new
            && self.sensitive == other.sensitive
            && self.conflicts_with == other.conflicts_with
    }
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Schema of a managed resource: every resource carries a computed `id`.
    pub fn resource(description: impl Into<String>) -> Self {
        Self::new(description).attribute("id", Attribute::string().computed())
    }

    pub fn attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Read-only copy for a data source: `lookup` attributes become required
    /// inputs, everything else is computed.
    pub fn as_data_source(&self, lookup: &[&str]) -> Schema {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, attribute)| {
                let mut attribute = Attribute {
                    default: None,
                    force_new: false,
                    conflicts_with: Vec::new(),
                    validators: Vec::new(),
                    diff_suppress: None,
                    ..attribute.clone()
                };
                attribute = if lookup.contains(&name.as_str()) {
                    attribute.required()
                } else {
                    attribute.computed()
                };
                (name.clone(), attribute)
            })
            .collect();

        Schema {
            description: self.description.clone(),
            attributes,
        }
    }

    /// Fills unset attributes that declare a default, nested blocks included.
    pub fn apply_defaults(&self, values: &mut Map<String, Value>) {
        for (name, attribute) in &self.attributes {
            let unset = values.get(name).map_or(true, Value::is_null);
            if unset {
                if let Some(default) = &attribute.default {
                    values.insert(name.clone(), default.clone());
                }
            } else if let (AttributeType::Object(schema), Some(Value::Object(nested))) =
                (&attribute.attr_type, values.get_mut(name))
            {
                schema.apply_defaults(nested);
            }
        }
    }

    /// Checks required attributes, value types, validators and conflicts.
    pub fn validate(&self, values: &Map<String, Value>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.validate_at("", values, &mut diagnostics);
        diagnostics
    }

    fn validate_at(&self, prefix: &str, values: &Map<String, Value>, diagnostics: &mut Vec<Diagnostic>) {
        for key in values.keys() {
            if !self.attributes.contains_key(key) {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "An argument named \"{key}\" is not expected here."
                    ))
                    .with_attribute(format!("{prefix}{key}")),
                );
            }
        }

        for (name, attribute) in &self.attributes {
            let path = format!("{prefix}{name}");
            let value = values.get(name).filter(|v| !v.is_null());

            let Some(value) = value else {
                if attribute.required {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "The argument \"{name}\" is required, but no definition was found."
                        ))
                        .with_attribute(path),
                    );
                }
                continue;
            };

            if attribute.is_computed_only() {
                continue;
            }

            if !attribute.attr_type.accepts(value) {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Inappropriate value for attribute \"{name}\": {} required.",
                        attribute.attr_type.name()
                    ))
                    .with_attribute(path),
                );
                continue;
            }

            for validator in &attribute.validators {
                if let Err(message) = validator.check(name, value) {
                    diagnostics.push(Diagnostic::error(message).with_attribute(path.clone()));
                }
            }

            for other in &attribute.conflicts_with {
                if is_set(values.get(other)) && is_set(Some(value)) {
                    let conflict = DomainError::Conflict {
                        field: name.clone(),
                        other: other.clone(),
                    };
                    diagnostics.push(Diagnostic::error(conflict.to_string()).with_attribute(path.clone()));
                }
            }

            if let (AttributeType::Object(schema), Value::Object(nested)) =
                (&attribute.attr_type, value)
            {
                schema.validate_at(&format!("{path}."), nested, diagnostics);
            }
        }
    }

    /// Force-new attributes whose value changes between `prior` and
    /// `proposed`.
    pub fn requires_replace(
        &self,
        prior: &Map<String, Value>,
        proposed: &Map<String, Value>,
    ) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.force_new)
            .filter(|(name, attribute)| attribute.changed(prior.get(*name), proposed.get(*name)))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Keeps prior values where the proposed ones differ only in a
    /// suppressed way, and carries computed values forward.
    pub fn carry_forward(&self, prior: &Map<String, Value>, proposed: &mut Map<String, Value>) {
        for (name, attribute) in &self.attributes {
            let Some(old) = prior.get(name) else {
                continue;
            };
            let new = proposed.get(name);

            let keep_prior = match new {
                None | Some(Value::Null) => attribute.computed,
                Some(new) => !attribute.changed(Some(old), Some(new)),
            };
            if keep_prior {
                proposed.insert(name.clone(), old.clone());
            }
        }
    }
}

fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Union of both attribute sets; `specific` wins where both define a name.
pub fn merge_schemas(base: Schema, specific: Schema) -> Schema {
    let description = if specific.description.is_empty() {
        base.description
    } else {
        specific.description
    };

    let mut attributes = base.attributes;
    attributes.extend(specific.attributes);

    Schema {
        description,
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn mapper_schema() -> Schema {
        Schema::resource("mapper")
            .attribute("realm_id", Attribute::string().required().force_new())
            .attribute(
                "client_id",
                Attribute::string()
                    .optional()
                    .force_new()
                    .conflicts_with(&["client_scope_id"]),
            )
            .attribute("client_scope_id", Attribute::string().optional().force_new())
            .attribute("name", Attribute::string().required().force_new())
            .attribute(
                "claim_value_type",
                Attribute::string()
                    .default("String")
                    .one_of(&["JSON", "String", "long", "int", "boolean"]),
            )
            .attribute("add_to_id_token", Attribute::bool().default(true))
    }

    #[test]
    fn merge_prefers_specific_attributes() {
        let base = Schema::new("base")
            .attribute("alias", Attribute::string().required().force_new())
            .attribute("enabled", Attribute::bool().default(true));
        let specific = Schema::new("")
            .attribute("alias", Attribute::string().optional().default("google"))
            .attribute("hosted_domain", Attribute::string());

        let merged = merge_schemas(base, specific);
        assert_eq!(merged.description, "base");
        assert_eq!(merged.attributes.len(), 3);

        let alias = merged.get("alias").unwrap();
        assert!(!alias.required);
        assert_eq!(alias.default, Some(json!("google")));
        assert!(merged.get("enabled").is_some());
    }

    #[test]
    fn defaults_fill_missing_and_null_values() {
        let schema = mapper_schema();
        let mut state = values(json!({
            "realm_id": "r1",
            "name": "m1",
            "add_to_id_token": null
        }));
        schema.apply_defaults(&mut state);
        assert_eq!(state["claim_value_type"], "String");
        assert_eq!(state["add_to_id_token"], true);
    }

    #[test]
    fn defaults_reach_nested_blocks() {
        let schema = Schema::new("realm").attribute(
            "smtp_server",
            Attribute::object(Schema::new("").attribute("starttls", Attribute::bool().default(false))),
        );
        let mut state = values(json!({ "smtp_server": { "host": "smtp" } }));
        schema.apply_defaults(&mut state);
        assert_eq!(state["smtp_server"]["starttls"], false);
    }

    #[test]
    fn enum_violations_use_fixed_wording() {
        let schema = mapper_schema();
        let diagnostics = schema.validate(&values(json!({
            "realm_id": "r1",
            "client_id": "c1",
            "name": "m1",
            "claim_value_type": "float"
        })));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].summary,
            "expected claim_value_type to be one of [JSON String long int boolean], got float"
        );
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("claim_value_type"));
    }

    #[test]
    fn missing_required_and_conflicts() {
        let schema = mapper_schema();
        let diagnostics = schema.validate(&values(json!({
            "client_id": "c1",
            "client_scope_id": "s1",
            "name": "m1"
        })));
        let summaries: Vec<_> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert!(summaries.contains(&"The argument \"realm_id\" is required, but no definition was found."));
        assert!(summaries.contains(&"\"client_id\": conflicts with client_scope_id"));
    }

    #[test]
    fn type_mismatches_and_unknown_attributes() {
        let schema = mapper_schema();
        let diagnostics = schema.validate(&values(json!({
            "realm_id": "r1",
            "client_id": "c1",
            "name": "m1",
            "add_to_id_token": "yes",
            "bogus": 1
        })));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(Diagnostic::is_error));
    }

    #[test]
    fn force_new_changes_require_replacement() {
        let schema = mapper_schema();
        let prior = values(json!({ "realm_id": "r1", "client_id": "c1", "name": "m1", "add_to_id_token": true }));

        let in_place = values(json!({ "realm_id": "r1", "client_id": "c1", "name": "m1", "add_to_id_token": false }));
        assert!(schema.requires_replace(&prior, &in_place).is_empty());

        let renamed = values(json!({ "realm_id": "r1", "client_id": "c1", "name": "m2", "add_to_id_token": true }));
        assert_eq!(schema.requires_replace(&prior, &renamed), vec!["name".to_string()]);
    }

    #[test]
    fn suppressed_duration_diffs_keep_prior_value() {
        let schema = Schema::resource("realm")
            .attribute("access_token_lifespan", Attribute::duration().optional_computed());
        let prior = values(json!({ "id": "r1", "access_token_lifespan": "1h" }));
        let mut proposed = values(json!({ "id": null, "access_token_lifespan": "60m" }));

        schema.carry_forward(&prior, &mut proposed);
        assert_eq!(proposed["access_token_lifespan"], "1h");
        assert_eq!(proposed["id"], "r1");
    }

    #[test]
    fn duration_validator() {
        let schema = Schema::new("")
            .attribute("timeout", Attribute::duration());
        let diagnostics = schema.validate(&values(json!({ "timeout": "ten minutes" })));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.starts_with("timeout: validation error: invalid duration"));
    }

    #[test]
    fn data_source_schema_is_read_only() {
        let schema = mapper_schema().as_data_source(&["realm_id"]);
        assert!(schema.get("realm_id").unwrap().required);
        let name = schema.get("name").unwrap();
        assert!(name.computed && !name.required && !name.optional);
        assert!(name.validators.is_empty());
    }
}
