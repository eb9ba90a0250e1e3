// pwvault - Password Health Module
//
// Strength scoring, rule checks, strong password generation, advice, and
// the per-user vault health report.

mod analyzer;
mod generator;
mod recommend;
mod report;

pub use analyzer::{
    analyze, validate, PasswordRules, RuleViolation, StrengthLevel, StrengthReport, SPECIAL_CHARS,
};
pub use generator::{generate, suggest, GeneratorOptions, MAX_GENERATED_LEN, MIN_GENERATED_LEN};
pub use recommend::default_recommendations;
pub use report::{assess_vault, HealthEntry, HealthStatus, VaultHealth};
