//! Recommendation advisor
//!
//! Turns the stains and defects recorded at intake into proposed pricing modifiers
//! and customer-facing risk warnings. Output is advisory; the caller decides which
//! proposals become part of a calculation request.

mod engine;
mod types;

pub use engine::{
    standard_issue_types, RecommendationAdvisor, MANUAL_CLEANING_CODE, VERY_DIRTY_CODE,
};
pub use types::*;
