//! Input schemas.
//!
//! The dispatcher only knows the [`Schema`] trait: validate a merged input
//! and either return the value the handler should see or a list of issues.
//! [`JsonSchema`] is the built-in implementation; any other engine can be
//! plugged in by implementing the trait, or by wrapping a closure with
//! [`from_fn`].

use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root path used for issues that concern the whole input.
pub const ROOT_PATH: &str = "$";

/// Validates a merged request input.
pub trait Schema: Send + Sync {
    /// Validates `value`.
    ///
    /// On success returns the value the handler receives, which may differ
    /// from the input (coerced scalars, stripped unknown keys).
    fn validate(&self, value: &Value) -> Result<Value, ValidationIssues>;
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted field path, e.g. `email`, `address.city` or `tags[2]`.
    pub path: String,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// An ordered list of validation issues.
///
/// Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding one issue.
    #[must_use]
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![ValidationIssue::new(path, message)])
    }

    /// Appends an issue.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.0.push(issue);
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the issues.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.0.iter()
    }

    /// Returns `true` if any issue is reported at `path`.
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|i| i.path == path)
    }
}

impl From<Vec<ValidationIssue>> for ValidationIssues {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self(issues)
    }
}

impl From<ValidationIssue> for ValidationIssues {
    fn from(issue: ValidationIssue) -> Self {
        Self(vec![issue])
    }
}

impl IntoIterator for ValidationIssues {
    type Item = ValidationIssue;
    type IntoIter = std::vec::IntoIter<ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationIssues {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// A [`Schema`] backed by a closure.
pub struct FnSchema<F>(F);

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSchema")
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, ValidationIssues> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<Value, ValidationIssues> {
        (self.0)(value)
    }
}

/// Wraps a validation closure as a [`Schema`].
///
/// ```
/// use tokendsl_core::schema::{from_fn, Schema, ValidationIssues};
///
/// let even = from_fn(|v| match v["n"].as_i64() {
///     Some(n) if n % 2 == 0 => Ok(v.clone()),
///     _ => Err(ValidationIssues::single("n", "must be even")),
/// });
/// assert!(even.validate(&serde_json::json!({"n": 4})).is_ok());
/// assert!(even.validate(&serde_json::json!({"n": 3})).is_err());
/// ```
pub fn from_fn<F>(f: F) -> FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, ValidationIssues> + Send + Sync,
{
    FnSchema(f)
}

/// Well-known string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    /// `local@domain.tld`
    Email,
    /// A hyphenated UUID.
    Uuid,
}

impl StringFormat {
    fn matches(self, s: &str) -> bool {
        match self {
            Self::Email => email_regex().is_match(s),
            Self::Uuid => uuid::Uuid::parse_str(s).is_ok(),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Uuid => "uuid",
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

/// A compiled regular expression that must match a whole string.
///
/// Compiled once, when the schema is built or deserialized, so an invalid
/// expression is reported before any request is served.
///
/// ```
/// use tokendsl_core::schema::Pattern;
///
/// let code = Pattern::new("[A-Z]{3}").unwrap();
/// assert!(code.is_match("ABC"));
/// assert!(!code.is_match("ABCD"));
/// assert!(Pattern::new("[unclosed").is_err());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source`, anchored at both ends.
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { source, regex })
    }

    /// Returns the expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `s` matches.
    #[must_use]
    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A JSON schema for request inputs.
///
/// Properties are optional unless marked with [`required`](Self::required).
/// Validation collects every issue instead of stopping at the first one.
/// Values arriving as strings from the path or query are coerced into
/// integers, numbers and booleans where the schema asks for them, and
/// object properties not declared in the schema are dropped unless
/// [`allow_additional`](Self::allow_additional) is set.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tokendsl_core::schema::{JsonSchema, Schema};
///
/// let schema = JsonSchema::object(vec![
///     ("name", JsonSchema::string().min_length(1).required()),
///     ("email", JsonSchema::string().email().required()),
///     ("age", JsonSchema::integer().minimum(0)),
/// ]);
///
/// let ok = schema.validate(&json!({"name": "Ada", "email": "ada@example.com", "age": "36"}));
/// assert_eq!(ok.unwrap()["age"], json!(36));
///
/// let err = schema
///     .validate(&json!({"name": "Ada", "email": "nope", "age": -1}))
///     .unwrap_err();
/// assert_eq!(err.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonSchema {
    /// String type.
    String {
        /// Whether the field must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Minimum length in characters.
        #[serde(default)]
        min_length: Option<usize>,
        /// Maximum length in characters.
        #[serde(default)]
        max_length: Option<usize>,
        /// Well-known format.
        #[serde(default)]
        format: Option<StringFormat>,
        /// Regular expression the whole string must match.
        #[serde(default)]
        pattern: Option<Pattern>,
    },
    /// Integer type.
    Integer {
        /// Whether the field must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Inclusive minimum.
        #[serde(default)]
        minimum: Option<i64>,
        /// Inclusive maximum.
        #[serde(default)]
        maximum: Option<i64>,
    },
    /// Floating point number type.
    Number {
        /// Whether the field must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Inclusive minimum.
        #[serde(default)]
        minimum: Option<f64>,
        /// Inclusive maximum.
        #[serde(default)]
        maximum: Option<f64>,
    },
    /// Boolean type.
    Boolean {
        /// Whether the field must be present and non-null.
        #[serde(default)]
        required: bool,
    },
    /// Array type.
    Array {
        /// Whether the field must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Schema every item must satisfy.
        items: Box<JsonSchema>,
        /// Minimum number of items.
        #[serde(default)]
        min_items: Option<usize>,
        /// Maximum number of items.
        #[serde(default)]
        max_items: Option<usize>,
    },
    /// Object type.
    Object {
        /// Whether the field must be present and non-null.
        #[serde(default)]
        required: bool,
        /// Declared properties, in declaration order.
        #[serde(default)]
        properties: IndexMap<String, JsonSchema>,
        /// Keep undeclared properties instead of dropping them.
        #[serde(default)]
        additional_properties: bool,
    },
    /// Accepts any value unchanged.
    Any {
        /// Whether the field must be present and non-null.
        #[serde(default)]
        required: bool,
    },
}

impl JsonSchema {
    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            required: false,
            min_length: None,
            max_length: None,
            format: None,
            pattern: None,
        }
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            required: false,
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::Number {
            required: false,
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean { required: false }
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: JsonSchema) -> Self {
        Self::Array {
            required: false,
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an object schema from `(name, schema)` pairs.
    #[must_use]
    pub fn object(properties: Vec<(&str, JsonSchema)>) -> Self {
        Self::Object {
            required: false,
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
            additional_properties: false,
        }
    }

    /// Creates a schema that accepts anything.
    #[must_use]
    pub fn any() -> Self {
        Self::Any { required: false }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        *self.required_flag_mut() = true;
        self
    }

    /// Returns whether the field is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        match self {
            Self::String { required, .. }
            | Self::Integer { required, .. }
            | Self::Number { required, .. }
            | Self::Boolean { required }
            | Self::Array { required, .. }
            | Self::Object { required, .. }
            | Self::Any { required } => *required,
        }
    }

    fn required_flag_mut(&mut self) -> &mut bool {
        match self {
            Self::String { required, .. }
            | Self::Integer { required, .. }
            | Self::Number { required, .. }
            | Self::Boolean { required }
            | Self::Array { required, .. }
            | Self::Object { required, .. }
            | Self::Any { required } => required,
        }
    }

    /// Sets the minimum length of a string schema.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let Self::String { min_length, .. } = &mut self {
            *min_length = Some(len);
        }
        self
    }

    /// Sets the maximum length of a string schema.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let Self::String { max_length, .. } = &mut self {
            *max_length = Some(len);
        }
        self
    }

    /// Requires a string to look like an email address.
    #[must_use]
    pub fn email(self) -> Self {
        self.format(StringFormat::Email)
    }

    /// Requires a string to have a well-known format.
    #[must_use]
    pub fn format(mut self, value: StringFormat) -> Self {
        if let Self::String { format, .. } = &mut self {
            *format = Some(value);
        }
        self
    }

    /// Requires a string to match a compiled [`Pattern`].
    #[must_use]
    pub fn pattern(mut self, regex: Pattern) -> Self {
        if let Self::String { pattern, .. } = &mut self {
            *pattern = Some(regex);
        }
        self
    }

    /// Sets the inclusive minimum of an integer or number schema.
    #[must_use]
    pub fn minimum(mut self, min: i64) -> Self {
        match &mut self {
            Self::Integer { minimum, .. } => *minimum = Some(min),
            Self::Number { minimum, .. } => *minimum = Some(min as f64),
            _ => {}
        }
        self
    }

    /// Sets the inclusive maximum of an integer or number schema.
    #[must_use]
    pub fn maximum(mut self, max: i64) -> Self {
        match &mut self {
            Self::Integer { maximum, .. } => *maximum = Some(max),
            Self::Number { maximum, .. } => *maximum = Some(max as f64),
            _ => {}
        }
        self
    }

    /// Sets the minimum number of array items.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let Self::Array { min_items, .. } = &mut self {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum number of array items.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let Self::Array { max_items, .. } = &mut self {
            *max_items = Some(max);
        }
        self
    }

    /// Keeps undeclared object properties.
    #[must_use]
    pub fn allow_additional(mut self) -> Self {
        if let Self::Object {
            additional_properties,
            ..
        } = &mut self
        {
            *additional_properties = true;
        }
        self
    }

    /// Returns a copy of an object schema with every property optional.
    ///
    /// Useful for partial updates that share a create schema.
    #[must_use]
    pub fn partial(&self) -> Self {
        match self {
            Self::Object {
                required,
                properties,
                additional_properties,
            } => Self::Object {
                required: *required,
                properties: properties
                    .iter()
                    .map(|(name, schema)| {
                        let mut schema = schema.clone();
                        *schema.required_flag_mut() = false;
                        (name.clone(), schema)
                    })
                    .collect(),
                additional_properties: *additional_properties,
            },
            other => other.clone(),
        }
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<Value> {
        if value.is_null() {
            if self.is_required() {
                issues.push(ValidationIssue::new(path, "is required"));
                return None;
            }
            return Some(Value::Null);
        }

        match self {
            Self::String {
                min_length,
                max_length,
                format,
                pattern,
                ..
            } => {
                let Some(s) = value.as_str() else {
                    issues.push(type_mismatch(path, "string", value));
                    return None;
                };
                let before = issues.len();
                let len = s.chars().count();
                if let Some(min) = min_length {
                    if len < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must be at least {min} characters"),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must be at most {max} characters"),
                        ));
                    }
                }
                if let Some(format) = format {
                    if !format.matches(s) {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must be a valid {}", format.name()),
                        ));
                    }
                }
                if let Some(pattern) = pattern {
                    if !pattern.is_match(s) {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must match pattern {pattern}"),
                        ));
                    }
                }
                (issues.len() == before).then(|| value.clone())
            }

            Self::Integer {
                minimum, maximum, ..
            } => {
                let Some(n) = coerce_integer(value) else {
                    issues.push(type_mismatch(path, "integer", value));
                    return None;
                };
                let before = issues.len();
                if let Some(min) = minimum {
                    if n < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must be greater than or equal to {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must be less than or equal to {max}"),
                        ));
                    }
                }
                (issues.len() == before).then(|| Value::from(n))
            }

            Self::Number {
                minimum, maximum, ..
            } => {
                let Some(n) = coerce_number(value) else {
                    issues.push(type_mismatch(path, "number", value));
                    return None;
                };
                let before = issues.len();
                if let Some(min) = minimum {
                    if n < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must be greater than or equal to {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must be less than or equal to {max}"),
                        ));
                    }
                }
                if issues.len() != before {
                    return None;
                }
                if value.is_number() {
                    Some(value.clone())
                } else {
                    serde_json::Number::from_f64(n).map(Value::Number)
                }
            }

            Self::Boolean { .. } => {
                let coerced = match value {
                    Value::Bool(b) => Some(*b),
                    Value::String(s) if s == "true" => Some(true),
                    Value::String(s) if s == "false" => Some(false),
                    _ => None,
                };
                if coerced.is_none() {
                    issues.push(type_mismatch(path, "boolean", value));
                }
                coerced.map(Value::Bool)
            }

            Self::Array {
                items,
                min_items,
                max_items,
                ..
            } => {
                // A single query value arrives as a plain string.
                let elements: Vec<Value> = match value {
                    Value::Array(elements) => elements.clone(),
                    Value::String(_) => vec![value.clone()],
                    _ => {
                        issues.push(type_mismatch(path, "array", value));
                        return None;
                    }
                };
                let before = issues.len();
                if let Some(min) = min_items {
                    if elements.len() < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must contain at least {min} items"),
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if elements.len() > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("must contain at most {max} items"),
                        ));
                    }
                }
                let checked: Vec<Option<Value>> = elements
                    .iter()
                    .enumerate()
                    .map(|(i, item)| items.check(item, &index_path(path, i), issues))
                    .collect();
                if issues.len() != before {
                    return None;
                }
                checked.into_iter().collect::<Option<Vec<_>>>().map(Value::Array)
            }

            Self::Object {
                properties,
                additional_properties,
                ..
            } => {
                let Some(input) = value.as_object() else {
                    issues.push(type_mismatch(path, "object", value));
                    return None;
                };
                let before = issues.len();
                let mut output = Map::new();
                for (name, schema) in properties {
                    let child = field_path(path, name);
                    match input.get(name) {
                        None if schema.is_required() => {
                            issues.push(ValidationIssue::new(child, "is required"));
                        }
                        None => {}
                        Some(field) => {
                            if let Some(checked) = schema.check(field, &child, issues) {
                                output.insert(name.clone(), checked);
                            }
                        }
                    }
                }
                if *additional_properties {
                    for (name, field) in input {
                        if !properties.contains_key(name) {
                            output.insert(name.clone(), field.clone());
                        }
                    }
                }
                (issues.len() == before).then_some(Value::Object(output))
            }

            Self::Any { .. } => Some(value.clone()),
        }
    }
}

impl Schema for JsonSchema {
    fn validate(&self, value: &Value) -> Result<Value, ValidationIssues> {
        let mut issues = Vec::new();
        match self.check(value, ROOT_PATH, &mut issues) {
            Some(validated) if issues.is_empty() => Ok(validated),
            _ => Err(ValidationIssues::from(issues)),
        }
    }
}

fn field_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn type_mismatch(path: &str, expected: &str, value: &Value) -> ValidationIssue {
    ValidationIssue::new(
        path,
        format!("expected {expected}, got {}", value_type_name(value)),
    )
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    }
}

/// `30.0` is the integer `30`; `30.5`, infinities and out-of-range values are not.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn whole_number(n: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (n.is_finite() && n.trunc() == n && (-LIMIT..LIMIT).contains(&n)).then(|| n as i64)
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Returns the JSON type name of a value.
#[must_use]
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
