//! Domain enums and models shared across Feria services

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lead capture flow variants
///
/// Each flow selects its own ordered step sequence in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    Rent,
    Buy,
    Sell,
    Appraisal,
    Contact,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Rent => "rent",
            FlowType::Buy => "buy",
            FlowType::Sell => "sell",
            FlowType::Appraisal => "appraisal",
            FlowType::Contact => "contact",
        }
    }

    pub const ALL: [FlowType; 5] = [
        FlowType::Rent,
        FlowType::Buy,
        FlowType::Sell,
        FlowType::Appraisal,
        FlowType::Contact,
    ];
}

impl FromStr for FlowType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rent" => Ok(FlowType::Rent),
            "buy" => Ok(FlowType::Buy),
            "sell" => Ok(FlowType::Sell),
            "appraisal" => Ok(FlowType::Appraisal),
            "contact" => Ok(FlowType::Contact),
            other => Err(Error::InvalidInput(format!(
                "Unknown flow type '{}' (expected one of: rent, buy, sell, appraisal, contact)",
                other
            ))),
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lead pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Closed,
    Discarded,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::Qualified => "QUALIFIED",
            LeadStatus::Closed => "CLOSED",
            LeadStatus::Discarded => "DISCARDED",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "NEW" => Ok(LeadStatus::New),
            "CONTACTED" => Ok(LeadStatus::Contacted),
            "QUALIFIED" => Ok(LeadStatus::Qualified),
            "CLOSED" => Ok(LeadStatus::Closed),
            "DISCARDED" => Ok(LeadStatus::Discarded),
            other => Err(Error::InvalidInput(format!("Unknown lead status '{}'", other))),
        }
    }
}

/// Listing price currency (ARS or USD only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
        }
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ARS" => Ok(Currency::Ars),
            "USD" => Ok(Currency::Usd),
            other => Err(Error::InvalidInput(format!(
                "Unknown currency '{}' (expected ARS or USD)",
                other
            ))),
        }
    }
}

/// Listing condition ("nuevo" / "usado" on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Nuevo,
    Usado,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Nuevo => "nuevo",
            Condition::Usado => "usado",
        }
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "nuevo" => Ok(Condition::Nuevo),
            "usado" => Ok(Condition::Usado),
            other => Err(Error::InvalidInput(format!(
                "Unknown condition '{}' (expected nuevo or usado)",
                other
            ))),
        }
    }
}

/// A prospective customer inquiry
///
/// Draft while `submitted_at` is NULL; submitted exactly once, after which
/// step mutation is rejected.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: String,
    pub tenant_id: Option<String>,
    pub property_id: Option<String>,
    pub flow_type: String,
    pub source: String,
    pub status: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub zone: Option<String>,
    pub property_type: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub bedrooms: Option<i64>,
    pub area_m2: Option<f64>,
    pub condition: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// True while the wizard may still mutate this lead
    pub fn is_draft(&self) -> bool {
        self.submitted_at.is_none()
    }
}

/// Canonical reference data entry (zone or category)
///
/// Read-only collaborator of the import reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl CatalogEntry {
    pub fn new(id: i64, name: &str, slug: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }
}
