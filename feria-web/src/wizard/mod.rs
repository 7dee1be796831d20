//! Leads wizard engine
//!
//! Drives the multi-step lead capture form: per-flow step definitions with
//! conditional visibility, server-persisted autosave of partial answers, and
//! full re-validation at submission.
//!
//! State machine: `Draft(step_index)` transitions to itself on step save and
//! cursor movement, and to the terminal `Submitted` state on a successful
//! submit.

pub mod engine;
pub mod steps;

use std::collections::HashMap;

/// Accumulated step answers for one lead, keyed by step key.
pub type AnswerMap = HashMap<String, String>;

pub use engine::{ResumeState, WizardEngine};
pub use steps::{flow_steps, resume_index, visible_steps, InputType, StepDefinition};
