//! Step definitions per lead flow
//!
//! The ordered step list for each flow is the wizard's transition table.
//! Conditionals and validators are plain function references held in the
//! definitions themselves, so the whole flow is inspectable data rather than
//! reflection-driven dispatch.

use super::AnswerMap;
use feria_common::FlowType;

/// Input widget the UI should render for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Select,
    Text,
    Number,
    Email,
    Tel,
    Textarea,
}

/// Where a select step's options come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOptions {
    /// Fixed option list
    Static(&'static [&'static str]),
    /// Populated from the zones catalog at render time
    Zones,
    /// Free-form input, no options
    None,
}

/// Visibility predicate over prior answers
pub type ConditionFn = fn(&AnswerMap) -> bool;

/// Per-step value validator; Err carries the field-level message
pub type ValidatorFn = fn(&str) -> Result<(), String>;

/// One question in a flow
pub struct StepDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub input: InputType,
    pub required: bool,
    pub options: StepOptions,
    pub condition: Option<ConditionFn>,
    pub validator: Option<ValidatorFn>,
}

impl StepDefinition {
    /// Whether this step is visible given the current answers
    pub fn is_visible(&self, answers: &AnswerMap) -> bool {
        match self.condition {
            Some(cond) => cond(answers),
            None => true,
        }
    }

    /// Run the required check, then the custom validator if present.
    ///
    /// Returns the field-level error message on failure.
    pub fn validate(&self, value: Option<&str>) -> Result<(), String> {
        let value = value.map(str::trim).unwrap_or("");
        if value.is_empty() {
            if self.required {
                return Err(format!("{} es obligatorio", self.label));
            }
            return Ok(());
        }
        if let Some(validator) = self.validator {
            validator(value)?;
        }
        Ok(())
    }
}

const PROPERTY_TYPES: &[&str] = &["casa", "departamento", "ph", "local", "oficina", "terreno"];
const CONDITIONS: &[&str] = &["nuevo", "usado"];

// ---------------------------------------------------------------------------
// Conditional predicates
// ---------------------------------------------------------------------------

/// Bedrooms only make sense for dwelling types
fn wants_bedrooms(answers: &AnswerMap) -> bool {
    matches!(
        answers.get("property_type").map(String::as_str),
        Some("casa") | Some("departamento") | Some("ph")
    )
}

/// Condition does not apply to bare land
fn wants_condition(answers: &AnswerMap) -> bool {
    !matches!(answers.get("property_type").map(String::as_str), Some("terreno"))
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

pub fn validate_email(value: &str) -> Result<(), String> {
    let (local, domain) = value
        .split_once('@')
        .ok_or_else(|| "Email inválido".to_string())?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err("Email inválido".to_string());
    }
    Ok(())
}

pub fn validate_tel(value: &str) -> Result<(), String> {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 6 {
        return Err("Teléfono inválido (mínimo 6 dígitos)".to_string());
    }
    Ok(())
}

pub fn validate_number(value: &str) -> Result<(), String> {
    match value.trim().parse::<f64>() {
        Ok(n) if n >= 0.0 => Ok(()),
        _ => Err("Debe ser un número no negativo".to_string()),
    }
}

/// Counts (bedrooms) must be whole numbers, not just numeric
pub fn validate_integer(value: &str) -> Result<(), String> {
    match value.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(()),
        _ => Err("Debe ser un número entero no negativo".to_string()),
    }
}

/// Budget is either a single amount or a "min-max" range
pub fn validate_budget(value: &str) -> Result<(), String> {
    parse_budget(value).map(|_| ())
}

/// Parse a budget answer into (min, max)
pub fn parse_budget(value: &str) -> Result<(f64, Option<f64>), String> {
    // Budgets are whole amounts; currency symbols and thousand separators
    // are noise
    let clean = |s: &str| -> Result<f64, String> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        digits
            .parse::<f64>()
            .map_err(|_| "Presupuesto inválido".to_string())
    };

    match value.split_once('-') {
        Some((min, max)) => {
            let min = clean(min)?;
            let max = clean(max)?;
            if max < min {
                return Err("El máximo debe ser mayor al mínimo".to_string());
            }
            Ok((min, Some(max)))
        }
        None => Ok((clean(value)?, None)),
    }
}

// ---------------------------------------------------------------------------
// Flow step sequences
// ---------------------------------------------------------------------------

macro_rules! step {
    ($key:literal, $label:literal, $input:expr, $required:literal, $options:expr) => {
        StepDefinition {
            key: $key,
            label: $label,
            input: $input,
            required: $required,
            options: $options,
            condition: None,
            validator: None,
        }
    };
}

const SEARCH_STEPS: [StepDefinition; 7] = [
    step!("zone", "Zona", InputType::Select, true, StepOptions::Zones),
    step!(
        "property_type",
        "Tipo de propiedad",
        InputType::Select,
        true,
        StepOptions::Static(PROPERTY_TYPES)
    ),
    StepDefinition {
        key: "budget",
        label: "Presupuesto",
        input: InputType::Text,
        required: true,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_budget),
    },
    StepDefinition {
        key: "bedrooms",
        label: "Dormitorios",
        input: InputType::Number,
        required: true,
        options: StepOptions::None,
        condition: Some(wants_bedrooms),
        validator: Some(validate_integer),
    },
    step!("name", "Nombre", InputType::Text, true, StepOptions::None),
    StepDefinition {
        key: "email",
        label: "Email",
        input: InputType::Email,
        required: true,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_email),
    },
    StepDefinition {
        key: "phone",
        label: "Teléfono",
        input: InputType::Tel,
        required: false,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_tel),
    },
];

const PROPERTY_STEPS: [StepDefinition; 8] = [
    step!("zone", "Zona", InputType::Select, true, StepOptions::Zones),
    step!(
        "property_type",
        "Tipo de propiedad",
        InputType::Select,
        true,
        StepOptions::Static(PROPERTY_TYPES)
    ),
    StepDefinition {
        key: "area",
        label: "Superficie (m²)",
        input: InputType::Number,
        required: true,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_number),
    },
    StepDefinition {
        key: "condition",
        label: "Estado",
        input: InputType::Select,
        required: true,
        options: StepOptions::Static(CONDITIONS),
        condition: Some(wants_condition),
        validator: None,
    },
    step!("address", "Dirección", InputType::Text, true, StepOptions::None),
    step!("name", "Nombre", InputType::Text, true, StepOptions::None),
    StepDefinition {
        key: "email",
        label: "Email",
        input: InputType::Email,
        required: true,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_email),
    },
    StepDefinition {
        key: "phone",
        label: "Teléfono",
        input: InputType::Tel,
        required: false,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_tel),
    },
];

const CONTACT_STEPS: [StepDefinition; 4] = [
    step!("name", "Nombre", InputType::Text, true, StepOptions::None),
    StepDefinition {
        key: "email",
        label: "Email",
        input: InputType::Email,
        required: true,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_email),
    },
    StepDefinition {
        key: "phone",
        label: "Teléfono",
        input: InputType::Tel,
        required: false,
        options: StepOptions::None,
        condition: None,
        validator: Some(validate_tel),
    },
    step!("message", "Mensaje", InputType::Textarea, true, StepOptions::None),
];

/// Ordered step sequence for a flow (the wizard's transition table)
pub fn flow_steps(flow: FlowType) -> &'static [StepDefinition] {
    match flow {
        FlowType::Rent | FlowType::Buy => &SEARCH_STEPS,
        FlowType::Sell | FlowType::Appraisal => &PROPERTY_STEPS,
        FlowType::Contact => &CONTACT_STEPS,
    }
}

/// Filter the full step list through each step's condition.
///
/// Recomputed against the current answers on every call, so changing an
/// earlier answer immediately re-evaluates later steps' visibility.
pub fn visible_steps<'a>(
    defs: &'a [StepDefinition],
    answers: &AnswerMap,
) -> Vec<&'a StepDefinition> {
    defs.iter().filter(|d| d.is_visible(answers)).collect()
}

/// Resume cursor: one past the highest-index visible step with a non-empty
/// recorded answer, so the user lands on the next unanswered step.
pub fn resume_index(defs: &[StepDefinition], answers: &AnswerMap) -> usize {
    let visible = visible_steps(defs, answers);
    let furthest = visible
        .iter()
        .enumerate()
        .filter(|(_, d)| answers.get(d.key).map(|v| !v.trim().is_empty()).unwrap_or(false))
        .map(|(i, _)| i)
        .max();
    match furthest {
        Some(i) => (i + 1).min(visible.len()),
        None => 0,
    }
}

// ---------------------------------------------------------------------------
// Step key -> lead field mapping
// ---------------------------------------------------------------------------

/// Permanent Lead column a step maps onto at submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    Name,
    Email,
    Phone,
    Zone,
    PropertyType,
    Budget,
    Bedrooms,
    Area,
    Condition,
    Address,
}

/// Fixed mapping from step key to Lead field per flow type.
///
/// Keys without a mapping (e.g. "message") stay only in lead_steps.
pub fn field_mapping(flow: FlowType) -> &'static [(&'static str, LeadField)] {
    match flow {
        FlowType::Rent | FlowType::Buy => &[
            ("zone", LeadField::Zone),
            ("property_type", LeadField::PropertyType),
            ("budget", LeadField::Budget),
            ("bedrooms", LeadField::Bedrooms),
            ("name", LeadField::Name),
            ("email", LeadField::Email),
            ("phone", LeadField::Phone),
        ],
        FlowType::Sell | FlowType::Appraisal => &[
            ("zone", LeadField::Zone),
            ("property_type", LeadField::PropertyType),
            ("area", LeadField::Area),
            ("condition", LeadField::Condition),
            ("address", LeadField::Address),
            ("name", LeadField::Name),
            ("email", LeadField::Email),
            ("phone", LeadField::Phone),
        ],
        FlowType::Contact => &[
            ("name", LeadField::Name),
            ("email", LeadField::Email),
            ("phone", LeadField::Phone),
        ],
    }
}
