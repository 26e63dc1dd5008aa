//! Declarative field validation.
//!
//! A [`RuleSet`] is an ordered list of [`FieldChain`]s bound to one endpoint.
//! Each chain runs its steps in order against one field and stops at the
//! first failing step; failures across fields are aggregated in declaration
//! order. Rule sets also reject every field they do not declare.
//!
//! ```
//! use serde_json::json;
//! use taskhub_core::validation::{FieldChain, RequestFields, RuleSet};
//!
//! let rules = RuleSet::new(422)
//!     .field(FieldChain::new("page").not_empty("Page value required!").is_int(1, 100, "Invalid page value!"));
//!
//! let mut fields = RequestFields::default();
//! fields.insert_query("page", json!("0"));
//! let failure = rules.validate(&mut fields).unwrap_err();
//! assert_eq!(failure.errors[0].message, "Invalid page value!");
//! ```

pub mod tasks;

use chrono::NaiveDate;
use std::collections::BTreeSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::ids::EntityId;

/// Message attached to fields that an exact-field rule set does not declare.
pub const UNKNOWN_FIELD_MESSAGE: &str = "Unknown field!";

/// Where a request field was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Params,
    Query,
    Body,
}

/// Raw request fields, grouped by location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFields {
    params: Map<String, Value>,
    query: Map<String, Value>,
    body: Map<String, Value>,
}

impl RequestFields {
    pub fn new(params: Map<String, Value>, query: Map<String, Value>, body: Map<String, Value>) -> Self {
        Self { params, query, body }
    }

    pub fn insert_param(&mut self, name: impl Into<String>, value: Value) {
        self.params.insert(name.into(), value);
    }

    pub fn insert_query(&mut self, name: impl Into<String>, value: Value) {
        self.query.insert(name.into(), value);
    }

    /// Look a field up in params, then query, then body.
    pub fn get(&self, name: &str) -> Option<(Location, &Value)> {
        self.params
            .get(name)
            .map(|v| (Location::Params, v))
            .or_else(|| self.query.get(name).map(|v| (Location::Query, v)))
            .or_else(|| self.body.get(name).map(|v| (Location::Body, v)))
    }

    fn set(&mut self, location: Location, name: &str, value: Value) {
        let map = match location {
            Location::Params => &mut self.params,
            Location::Query => &mut self.query,
            Location::Body => &mut self.body,
        };
        map.insert(name.to_string(), value);
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.params
            .keys()
            .chain(self.query.keys())
            .chain(self.body.keys())
            .map(String::as_str)
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of a failed [`RuleSet::validate`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    /// HTTP status the endpoint answers with (400 or 422).
    pub status: u16,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone)]
enum Step {
    Trim,
    Optional,
    NotEmpty(&'static str),
    IsIn(&'static [&'static str], &'static str),
    IsInt { min: i64, max: i64, message: &'static str },
    IsFloat { min: f64, max: f64, message: &'static str },
    IsDate(&'static str),
    IsLength { min: usize, max: Option<usize>, message: &'static str },
    IsEntityId(&'static str),
}

enum StepOutcome {
    Continue,
    Skip,
    Fail(&'static str),
}

/// Ordered validation steps for one field.
#[derive(Debug, Clone)]
pub struct FieldChain {
    field: &'static str,
    steps: Vec<Step>,
}

impl FieldChain {
    pub fn new(field: &'static str) -> Self {
        Self { field, steps: Vec::new() }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Trim surrounding whitespace of string values; the trimmed value is kept.
    pub fn trim(mut self) -> Self {
        self.steps.push(Step::Trim);
        self
    }

    /// Skip the remaining steps when the field is absent.
    pub fn optional(mut self) -> Self {
        self.steps.push(Step::Optional);
        self
    }

    pub fn not_empty(mut self, message: &'static str) -> Self {
        self.steps.push(Step::NotEmpty(message));
        self
    }

    pub fn is_in(mut self, allowed: &'static [&'static str], message: &'static str) -> Self {
        self.steps.push(Step::IsIn(allowed, message));
        self
    }

    /// Inclusive on both ends.
    pub fn is_int(mut self, min: i64, max: i64, message: &'static str) -> Self {
        self.steps.push(Step::IsInt { min, max, message });
        self
    }

    /// Inclusive on both ends.
    pub fn is_float(mut self, min: f64, max: f64, message: &'static str) -> Self {
        self.steps.push(Step::IsFloat { min, max, message });
        self
    }

    pub fn is_date(mut self, message: &'static str) -> Self {
        self.steps.push(Step::IsDate(message));
        self
    }

    pub fn is_length(mut self, min: usize, max: Option<usize>, message: &'static str) -> Self {
        self.steps.push(Step::IsLength { min, max, message });
        self
    }

    pub fn is_entity_id(mut self, message: &'static str) -> Self {
        self.steps.push(Step::IsEntityId(message));
        self
    }

    /// Run the chain, writing sanitized values back. Returns the first failure message.
    fn run(&self, fields: &mut RequestFields) -> Option<&'static str> {
        for step in &self.steps {
            let current = fields.get(self.field).map(|(loc, v)| (loc, v.clone()));
            match apply_step(step, current, self.field, fields) {
                StepOutcome::Continue => {}
                StepOutcome::Skip => return None,
                StepOutcome::Fail(message) => return Some(message),
            }
        }
        None
    }
}

fn apply_step(
    step: &Step,
    current: Option<(Location, Value)>,
    field: &str,
    fields: &mut RequestFields,
) -> StepOutcome {
    let text = current.as_ref().and_then(|(_, v)| stringify(v));
    let check = |ok: bool, message: &'static str| {
        if ok {
            StepOutcome::Continue
        } else {
            StepOutcome::Fail(message)
        }
    };

    match step {
        Step::Trim => {
            if let Some((location, Value::String(s))) = &current {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    fields.set(*location, field, Value::String(trimmed.to_string()));
                }
            }
            StepOutcome::Continue
        }
        Step::Optional => {
            if current.is_none() {
                StepOutcome::Skip
            } else {
                StepOutcome::Continue
            }
        }
        Step::NotEmpty(message) => check(text.is_some_and(|t| !t.is_empty()), message),
        Step::IsIn(allowed, message) => check(
            text.is_some_and(|t| allowed.iter().any(|a| *a == t)),
            message,
        ),
        Step::IsInt { min, max, message } => check(
            current
                .as_ref()
                .and_then(|(_, v)| as_int(v))
                .is_some_and(|n| (*min..=*max).contains(&n)),
            message,
        ),
        Step::IsFloat { min, max, message } => check(
            current
                .as_ref()
                .and_then(|(_, v)| as_float(v))
                .is_some_and(|n| n >= *min && n <= *max),
            message,
        ),
        Step::IsDate(message) => check(text.is_some_and(|t| parse_date(&t).is_some()), message),
        Step::IsLength { min, max, message } => check(
            text.is_some_and(|t| {
                let len = t.chars().count();
                len >= *min && max.map_or(true, |max| len <= max)
            }),
            message,
        ),
        Step::IsEntityId(message) => check(
            text.is_some_and(|t| EntityId::parse(&t).is_ok()),
            message,
        ),
    }
}

/// String form of a raw value; `null` has none.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) if items.is_empty() => Some(String::new()),
        other => Some(other.to_string()),
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.is_empty() => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Parse `YYYY-MM-DD` or `YYYY/MM/DD` into a calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
}

/// Per-endpoint rule set.
#[derive(Debug, Clone)]
pub struct RuleSet {
    chains: Vec<FieldChain>,
    failure_status: u16,
}

impl RuleSet {
    /// New exact-field rule set answering failures with `failure_status`.
    pub fn new(failure_status: u16) -> Self {
        Self {
            chains: Vec::new(),
            failure_status,
        }
    }

    pub fn field(mut self, chain: FieldChain) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn failure_status(&self) -> u16 {
        self.failure_status
    }

    pub fn declares(&self, name: &str) -> bool {
        self.chains.iter().any(|c| c.field == name)
    }

    /// Validate and sanitize `fields` in place.
    pub fn validate(&self, fields: &mut RequestFields) -> Result<(), ValidationFailure> {
        let mut errors: Vec<FieldError> = self
            .chains
            .iter()
            .filter_map(|chain| {
                chain
                    .run(fields)
                    .map(|message| FieldError::new(chain.field, message))
            })
            .collect();

        // A name can appear in more than one location; report it once.
        let mut seen = BTreeSet::new();
        errors.extend(
            fields
                .names()
                .filter(|name| !self.declares(name) && seen.insert(*name))
                .map(|name| FieldError::new(name, UNKNOWN_FIELD_MESSAGE)),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure {
                status: self.failure_status,
                errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> RequestFields {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        RequestFields::new(Map::new(), Map::new(), map)
    }

    #[test]
    fn test_missing_required_field_reports_presence_message() {
        let rules = RuleSet::new(400).field(FieldChain::new("title").trim().not_empty("Title required!"));
        let failure = rules.validate(&mut body(json!({}))).unwrap_err();
        assert_eq!(failure.status, 400);
        assert_eq!(failure.errors, vec![FieldError::new("title", "Title required!")]);
    }

    #[test]
    fn test_whitespace_only_fails_after_trim() {
        let rules = RuleSet::new(400).field(FieldChain::new("title").trim().not_empty("Title required!"));
        assert!(rules.validate(&mut body(json!({"title": "   "}))).is_err());
    }

    #[test]
    fn test_trim_writes_sanitized_value_back() {
        let rules = RuleSet::new(400).field(FieldChain::new("title").trim().not_empty("Title required!"));
        let mut fields = body(json!({"title": "  ship it "}));
        rules.validate(&mut fields).unwrap();
        assert_eq!(fields.body()["title"], json!("ship it"));
    }

    #[test]
    fn test_first_failure_per_field_only() {
        let rules = RuleSet::new(422).field(
            FieldChain::new("page")
                .not_empty("Page value required!")
                .is_int(1, 100, "Invalid page value!"),
        );
        let failure = rules.validate(&mut body(json!({"page": ""}))).unwrap_err();
        assert_eq!(failure.errors, vec![FieldError::new("page", "Page value required!")]);
    }

    #[test]
    fn test_failures_aggregate_across_fields_in_declaration_order() {
        let rules = RuleSet::new(400)
            .field(FieldChain::new("b").not_empty("b required"))
            .field(FieldChain::new("a").not_empty("a required"));
        let failure = rules.validate(&mut body(json!({}))).unwrap_err();
        let fields: Vec<_> = failure.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["b", "a"]);
    }

    #[test]
    fn test_optional_skips_absent_but_checks_present_empty() {
        let rules = RuleSet::new(400).field(
            FieldChain::new("status")
                .optional()
                .not_empty("Status required!")
                .is_in(&["1", "2", "3", "4"], "Invalid status value!"),
        );
        assert!(rules.validate(&mut body(json!({}))).is_ok());
        let failure = rules.validate(&mut body(json!({"status": ""}))).unwrap_err();
        assert_eq!(failure.errors[0].message, "Status required!");
    }

    #[test]
    fn test_is_in_matches_numbers_and_strings() {
        let rules = RuleSet::new(400).field(
            FieldChain::new("status").is_in(&["1", "2", "3", "4"], "Invalid status value!"),
        );
        assert!(rules.validate(&mut body(json!({"status": 3}))).is_ok());
        assert!(rules.validate(&mut body(json!({"status": "4"}))).is_ok());
        assert!(rules.validate(&mut body(json!({"status": 5}))).is_err());
        assert!(rules.validate(&mut body(json!({"status": "1.0"}))).is_err());
    }

    #[test]
    fn test_float_range_is_inclusive() {
        let rules = RuleSet::new(400).field(
            FieldChain::new("estimate_time").is_float(0.0, 120.0, "Maximum of estimate time is 120h!"),
        );
        assert!(rules.validate(&mut body(json!({"estimate_time": 0}))).is_ok());
        assert!(rules.validate(&mut body(json!({"estimate_time": "120"}))).is_ok());
        assert!(rules.validate(&mut body(json!({"estimate_time": 120.01}))).is_err());
        assert!(rules.validate(&mut body(json!({"estimate_time": -1}))).is_err());
        assert!(rules.validate(&mut body(json!({"estimate_time": "NaN"}))).is_err());
    }

    #[test]
    fn test_int_range() {
        let rules = RuleSet::new(422).field(FieldChain::new("page").is_int(1, 100, "Invalid page value!"));
        let mut fields = RequestFields::default();
        fields.insert_query("page", json!("1"));
        assert!(rules.validate(&mut fields).is_ok());
        fields.insert_query("page", json!("0"));
        assert!(rules.validate(&mut fields).is_err());
        fields.insert_query("page", json!("101"));
        assert!(rules.validate(&mut fields).is_err());
        fields.insert_query("page", json!("1.5"));
        assert!(rules.validate(&mut fields).is_err());
    }

    #[test]
    fn test_dates_accept_dash_and_slash() {
        assert!(parse_date("2024-02-29").is_some());
        assert!(parse_date("2024/02/29").is_some());
        assert!(parse_date("2023-02-29").is_none());
        assert!(parse_date("29-02-2024").is_none());
    }

    #[test]
    fn test_exact_mode_rejects_undeclared_fields_even_when_declared_pass() {
        let rules = RuleSet::new(422).field(FieldChain::new("id").not_empty("Project id required!"));
        let mut fields = RequestFields::default();
        fields.insert_param("id", json!("p1"));
        fields.insert_query("sort", json!("desc"));
        let failure = rules.validate(&mut fields).unwrap_err();
        assert_eq!(failure.errors, vec![FieldError::new("sort", UNKNOWN_FIELD_MESSAGE)]);
    }

    #[test]
    fn test_undeclared_field_in_two_locations_is_reported_once() {
        let rules = RuleSet::new(422).field(FieldChain::new("id").not_empty("Project id required!"));
        let mut query = Map::new();
        query.insert("x".to_string(), json!("1"));
        query.insert("z".to_string(), json!("2"));
        let mut body = Map::new();
        body.insert("x".to_string(), json!("3"));
        let mut params = Map::new();
        params.insert("id".to_string(), json!("p1"));

        let failure = rules
            .validate(&mut RequestFields::new(params, query, body))
            .unwrap_err();
        assert_eq!(
            failure.errors,
            vec![
                FieldError::new("x", UNKNOWN_FIELD_MESSAGE),
                FieldError::new("z", UNKNOWN_FIELD_MESSAGE),
            ]
        );
    }

    #[test]
    fn test_entity_id_and_length_checks() {
        let rules = RuleSet::new(400)
            .field(FieldChain::new("id").is_entity_id("Invalid id param value!"))
            .field(FieldChain::new("title").is_length(1, Some(5), "Title is too long!"));
        let failure = rules
            .validate(&mut body(json!({"id": "nope", "title": "toolong"})))
            .unwrap_err();
        assert_eq!(failure.errors.len(), 2);
        assert!(rules
            .validate(&mut body(json!({
                "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "title": "short"
            })))
            .is_ok());
    }
}
