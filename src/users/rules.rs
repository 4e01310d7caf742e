use std::fmt;

use serde_json::{json, Map, Value};

use crate::response::ValidationInfo;

pub const FULLNAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 100;
pub const PHONE_MAX: usize = 15;
pub const PASSWORD_MIN: usize = 6;
pub const REFERENCE_MAX: usize = 255;
pub const GENDERS: &[&str] = &["male", "female", "other"];
pub const MEMBERSHIP_FLAGS: &[&str] = &["0", "1"];

/// Which write operation a rule table applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
}

/// Columns that must hold a distinct value per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Email,
    Phone,
}

impl UniqueField {
    pub fn column(self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Phone => "phone",
        }
    }

    /// Maps a Postgres unique constraint name back to the field it guards.
    pub fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_email_key" => Some(UniqueField::Email),
            "users_phone_key" => Some(UniqueField::Phone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Present with a non-empty value.
    Required,
    /// May be omitted, but cannot be blanked when present.
    Filled,
    /// Empty values pass and skip the remaining rules.
    PermitEmpty,
    ValidEmail,
    Numeric,
    MinLength(usize),
    MaxLength(usize),
    InList(&'static [&'static str]),
    IsUnique(UniqueField),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("required"),
            Rule::Filled => f.write_str("filled"),
            Rule::PermitEmpty => f.write_str("permit_empty"),
            Rule::ValidEmail => f.write_str("valid_email"),
            Rule::Numeric => f.write_str("numeric"),
            Rule::MinLength(n) => write!(f, "min_length[{}]", n),
            Rule::MaxLength(n) => write!(f, "max_length[{}]", n),
            Rule::InList(items) => write!(f, "in_list[{}]", items.join(",")),
            Rule::IsUnique(field) => write!(f, "is_unique[users.{}]", field.column()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    fn new(field: &'static str, rules: Vec<Rule>) -> Self {
        Self { field, rules }
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// Pipe-joined form, e.g. `required|max_length[100]`.
    pub fn describe(&self) -> String {
        self.rules
            .iter()
            .map(Rule::to_string)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Rule table for one action. Field order is declaration order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
    sample: Value,
}

impl RuleSet {
    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|f| f.field == name)
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn allowed_fields(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.field).collect()
    }

    pub fn required_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| f.field)
            .collect()
    }

    pub fn describe(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.field.to_string(), Value::String(f.describe())))
            .collect()
    }

    /// Client guidance attached to request-shape and validation failures.
    pub fn validation_info(&self, message: &'static str) -> ValidationInfo {
        ValidationInfo {
            required_parameters: Some(self.required_fields()),
            allowed_parameters: Some(self.allowed_fields()),
            validation_rules: Some(self.describe()),
            sample_request: Some(self.sample.clone()),
            message: Some(message),
            ..ValidationInfo::default()
        }
    }
}

/// Both rule tables, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct UserRules {
    create: RuleSet,
    update: RuleSet,
}

impl UserRules {
    pub fn standard() -> Self {
        use Rule::*;

        let create = RuleSet {
            fields: vec![
                FieldRules::new("fullname", vec![Required, MaxLength(FULLNAME_MAX)]),
                FieldRules::new(
                    "email",
                    vec![
                        Required,
                        ValidEmail,
                        MaxLength(EMAIL_MAX),
                        IsUnique(UniqueField::Email),
                    ],
                ),
                FieldRules::new(
                    "phone",
                    vec![
                        Required,
                        Numeric,
                        MaxLength(PHONE_MAX),
                        IsUnique(UniqueField::Phone),
                    ],
                ),
                FieldRules::new("gender", vec![PermitEmpty, InList(GENDERS)]),
                FieldRules::new("password", vec![Required, MinLength(PASSWORD_MIN)]),
                FieldRules::new("image", vec![PermitEmpty, MaxLength(REFERENCE_MAX)]),
                FieldRules::new("has_membership", vec![PermitEmpty, InList(MEMBERSHIP_FLAGS)]),
                FieldRules::new("qr_code", vec![PermitEmpty, MaxLength(REFERENCE_MAX)]),
            ],
            sample: json!({
                "fullname": "John Doe",
                "email": "john@example.com",
                "phone": "08123456789",
                "gender": "male",
                "password": "secret123",
                "image": "profile.jpg",
                "has_membership": 1,
                "qr_code": "ABCD1234"
            }),
        };

        let update = RuleSet {
            fields: vec![
                FieldRules::new("fullname", vec![Filled, MaxLength(FULLNAME_MAX)]),
                FieldRules::new(
                    "email",
                    vec![
                        Filled,
                        ValidEmail,
                        MaxLength(EMAIL_MAX),
                        IsUnique(UniqueField::Email),
                    ],
                ),
                FieldRules::new(
                    "phone",
                    vec![
                        Filled,
                        Numeric,
                        MaxLength(PHONE_MAX),
                        IsUnique(UniqueField::Phone),
                    ],
                ),
                FieldRules::new("gender", vec![PermitEmpty, InList(GENDERS)]),
                FieldRules::new("password", vec![PermitEmpty, MinLength(PASSWORD_MIN)]),
                FieldRules::new("image", vec![PermitEmpty, MaxLength(REFERENCE_MAX)]),
                FieldRules::new("has_membership", vec![PermitEmpty, InList(MEMBERSHIP_FLAGS)]),
                FieldRules::new("qr_code", vec![PermitEmpty, MaxLength(REFERENCE_MAX)]),
            ],
            sample: json!({
                "fullname": "Updated Name",
                "email": "new-email@example.com",
                "phone": "08987654321",
                "gender": "female",
                "password": "newpassword123",
                "image": "new-profile.jpg"
            }),
        };

        Self { create, update }
    }

    pub fn for_action(&self, action: Action) -> &RuleSet {
        match action {
            Action::Create => &self.create,
            Action::Update => &self.update,
        }
    }
}
