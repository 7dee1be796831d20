//! Wizard session lifecycle against the database
//!
//! A session is a draft `Lead` row plus its `lead_steps` values. Step saves
//! are independent single-statement upserts (last write wins per step key),
//! so overlapping autosave requests for the same lead never race on a
//! read-modify-write cycle.

use super::steps::{field_mapping, flow_steps, parse_budget, visible_steps, LeadField};
use super::{resume_index, AnswerMap};
use chrono::{DateTime, Utc};
use feria_common::{Error, FlowType, Lead, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

/// Resumed session state: the lead, the merged answer map, and the cursor
/// position the client should land on.
#[derive(Debug, Clone)]
pub struct ResumeState {
    pub lead: Lead,
    pub answers: AnswerMap,
    pub resume_index: usize,
}

/// Wizard engine
pub struct WizardEngine {
    db: Pool<Sqlite>,
}

impl WizardEngine {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Create a new draft lead shell and return it.
    pub async fn init_session(
        &self,
        flow_type: FlowType,
        tenant_id: Option<&str>,
        property_id: Option<&str>,
        source: &str,
    ) -> Result<Lead> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO leads (id, tenant_id, property_id, flow_type, source, status)
            VALUES (?, ?, ?, ?, ?, 'NEW')
            "#,
        )
        .bind(&id)
        .bind(tenant_id)
        .bind(property_id)
        .bind(flow_type.as_str())
        .bind(source)
        .execute(&self.db)
        .await?;

        tracing::info!(lead_id = %id, flow = %flow_type, "Wizard session started");

        self.get_lead(&id).await
    }

    /// Load a lead by id, or NotFound.
    pub async fn get_lead(&self, lead_id: &str) -> Result<Lead> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ?")
            .bind(lead_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Lead {} does not exist", lead_id)))
    }

    /// Rebuild session state for a returning client.
    ///
    /// Saved step values are merged with any top-level lead fields already
    /// populated; step values take precedence as the last thing written.
    pub async fn resume(&self, lead_id: &str) -> Result<ResumeState> {
        let lead = self.get_lead(lead_id).await?;
        let flow = FlowType::from_str(&lead.flow_type)?;

        let mut answers = lead_field_answers(&lead, flow);

        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT step_key, value FROM lead_steps WHERE lead_id = ?")
                .bind(lead_id)
                .fetch_all(&self.db)
                .await?;

        for (key, value) in rows {
            if let Some(value) = value {
                answers.insert(key, value);
            }
        }

        let defs = flow_steps(flow);
        let resume_index = resume_index(defs, &answers);

        Ok(ResumeState {
            lead,
            answers,
            resume_index,
        })
    }

    /// Upsert one step value (autosave).
    ///
    /// Idempotent and order-independent: a single INSERT .. ON CONFLICT
    /// statement per call, last write wins per (lead, step key).
    pub async fn save_step(&self, lead_id: &str, step_key: &str, value: &str) -> Result<()> {
        self.ensure_draft(lead_id).await?;

        sqlx::query(
            r#"
            INSERT INTO lead_steps (lead_id, step_key, value, saved_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(lead_id, step_key) DO UPDATE SET
                value = excluded.value,
                saved_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(lead_id)
        .bind(step_key)
        .bind(value)
        .execute(&self.db)
        .await?;

        tracing::debug!(lead_id = %lead_id, step = %step_key, "Step saved");
        Ok(())
    }

    /// Finalize the wizard: re-validate every visible step against the full
    /// answer map, then write all mapped fields and submitted_at in one
    /// transaction (all or nothing).
    ///
    /// Hidden steps are treated as valid regardless of any stored value.
    pub async fn submit(&self, lead_id: &str, answers: &AnswerMap) -> Result<Lead> {
        let lead = self.get_lead(lead_id).await?;
        if !lead.is_draft() {
            return Err(Error::AlreadySubmitted(format!(
                "Lead {} was already submitted",
                lead_id
            )));
        }
        let flow = FlowType::from_str(&lead.flow_type)?;
        let defs = flow_steps(flow);

        // Defense against stale client state: server-side re-validation of
        // the currently visible sequence, first failure wins
        for def in visible_steps(defs, answers) {
            if let Err(message) = def.validate(answers.get(def.key).map(String::as_str)) {
                return Err(Error::InvalidInput(format!("{}: {}", def.key, message)));
            }
        }

        let fields = MappedFields::from_answers(flow, answers)?;

        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE leads SET
                name = ?, email = ?, phone = ?, zone = ?, property_type = ?,
                budget_min = ?, budget_max = ?, bedrooms = ?, area_m2 = ?,
                condition = ?, address = ?,
                status = 'NEW',
                updated_at = CURRENT_TIMESTAMP,
                submitted_at = CURRENT_TIMESTAMP
            WHERE id = ? AND submitted_at IS NULL
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.zone)
        .bind(&fields.property_type)
        .bind(fields.budget_min)
        .bind(fields.budget_max)
        .bind(fields.bedrooms)
        .bind(fields.area_m2)
        .bind(&fields.condition)
        .bind(&fields.address)
        .bind(lead_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race with a concurrent submit
            tx.rollback().await?;
            return Err(Error::AlreadySubmitted(format!(
                "Lead {} was already submitted",
                lead_id
            )));
        }

        // Persist the final answer map so resume/debugging sees what the
        // client actually submitted
        for (key, value) in answers {
            sqlx::query(
                r#"
                INSERT INTO lead_steps (lead_id, step_key, value, saved_at)
                VALUES (?, ?, ?, CURRENT_TIMESTAMP)
                ON CONFLICT(lead_id, step_key) DO UPDATE SET
                    value = excluded.value,
                    saved_at = CURRENT_TIMESTAMP
                "#,
            )
            .bind(lead_id)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(lead_id = %lead_id, flow = %flow, "Lead submitted");

        self.get_lead(lead_id).await
    }

    async fn ensure_draft(&self, lead_id: &str) -> Result<()> {
        let submitted_at: Option<Option<DateTime<Utc>>> =
            sqlx::query_scalar("SELECT submitted_at FROM leads WHERE id = ?")
                .bind(lead_id)
                .fetch_optional(&self.db)
                .await?;

        match submitted_at {
            None => Err(Error::NotFound(format!("Lead {} does not exist", lead_id))),
            Some(Some(_)) => Err(Error::AlreadySubmitted(format!(
                "Lead {} was already submitted",
                lead_id
            ))),
            Some(None) => Ok(()),
        }
    }
}

/// Lead columns produced from the answer map via the per-flow mapping
#[derive(Debug, Default)]
struct MappedFields {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    zone: Option<String>,
    property_type: Option<String>,
    budget_min: Option<f64>,
    budget_max: Option<f64>,
    bedrooms: Option<i64>,
    area_m2: Option<f64>,
    condition: Option<String>,
    address: Option<String>,
}

impl MappedFields {
    fn from_answers(flow: FlowType, answers: &AnswerMap) -> Result<Self> {
        let mut fields = Self::default();

        for (key, field) in field_mapping(flow) {
            let Some(value) = answers.get(*key).map(|v| v.trim()).filter(|v| !v.is_empty())
            else {
                continue;
            };

            match field {
                LeadField::Name => fields.name = Some(value.to_string()),
                LeadField::Email => fields.email = Some(value.to_string()),
                LeadField::Phone => fields.phone = Some(value.to_string()),
                LeadField::Zone => fields.zone = Some(value.to_string()),
                LeadField::PropertyType => fields.property_type = Some(value.to_string()),
                LeadField::Condition => fields.condition = Some(value.to_string()),
                LeadField::Address => fields.address = Some(value.to_string()),
                LeadField::Budget => {
                    let (min, max) = parse_budget(value).map_err(Error::InvalidInput)?;
                    fields.budget_min = Some(min);
                    fields.budget_max = max;
                }
                LeadField::Bedrooms => {
                    let n = value.parse::<i64>().map_err(|_| {
                        Error::InvalidInput("bedrooms must be a whole number".to_string())
                    })?;
                    fields.bedrooms = Some(n);
                }
                LeadField::Area => {
                    let n = value
                        .parse::<f64>()
                        .map_err(|_| Error::InvalidInput("area must be numeric".to_string()))?;
                    fields.area_m2 = Some(n);
                }
            }
        }

        Ok(fields)
    }
}

/// Seed the answer map from already-populated top-level lead fields
fn lead_field_answers(lead: &Lead, flow: FlowType) -> AnswerMap {
    let mut answers = AnswerMap::new();

    for (key, field) in field_mapping(flow) {
        let value = match field {
            LeadField::Name => lead.name.clone(),
            LeadField::Email => lead.email.clone(),
            LeadField::Phone => lead.phone.clone(),
            LeadField::Zone => lead.zone.clone(),
            LeadField::PropertyType => lead.property_type.clone(),
            LeadField::Condition => lead.condition.clone(),
            LeadField::Address => lead.address.clone(),
            LeadField::Budget => lead.budget_min.map(|min| match lead.budget_max {
                Some(max) => format!("{}-{}", min, max),
                None => format!("{}", min),
            }),
            LeadField::Bedrooms => lead.bedrooms.map(|n| n.to_string()),
            LeadField::Area => lead.area_m2.map(|n| n.to_string()),
        };

        if let Some(value) = value {
            answers.insert(key.to_string(), value);
        }
    }

    answers
}
