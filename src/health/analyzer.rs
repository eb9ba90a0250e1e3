// pwvault - Password strength analysis
//
// Scores a password from 0 to 100 using length and character variety, then
// subtracts for predictable structure (runs, sequences, keyboard rows,
// common passwords). Also checks a password against configurable rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters that count toward the "special" rule.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Lengths at or above this get no further length credit.
const FULL_CREDIT_LEN: usize = 20;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "123456", "12345678", "123456789", "qwerty", "abc123", "letmein", "welcome",
    "admin", "iloveyou", "monkey", "dragon", "111111", "football", "baseball", "sunshine",
    "princess", "master", "login", "passw0rd", "trustno1", "shadow", "superman",
];

const KEYBOARD_ROWS: &[&str] = &["qwertyuiop", "asdfghjkl", "zxcvbnm", "1234567890"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl StrengthLevel {
    fn from_score(score: u8) -> Self {
        match score {
            0..=19 => StrengthLevel::VeryWeak,
            20..=39 => StrengthLevel::Weak,
            40..=59 => StrengthLevel::Fair,
            60..=79 => StrengthLevel::Strong,
            _ => StrengthLevel::VeryStrong,
        }
    }

    /// Weak enough that the user should be told to change it.
    pub fn needs_attention(self) -> bool {
        self < StrengthLevel::Fair
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrengthLevel::VeryWeak => "very weak",
            StrengthLevel::Weak => "weak",
            StrengthLevel::Fair => "fair",
            StrengthLevel::Strong => "strong",
            StrengthLevel::VeryStrong => "very strong",
        };
        write!(f, "{}", s)
    }
}

/// Result of `analyze`. Contains no part of the password itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthReport {
    pub score: u8,
    pub level: StrengthLevel,
    pub entropy_bits: f64,
    pub feedback: Vec<String>,
}

/// Which character classes a password uses.
#[derive(Debug, Default, Clone, Copy)]
struct Classes {
    lower: bool,
    upper: bool,
    digit: bool,
    special: bool,
    other: bool,
}

impl Classes {
    fn of(password: &str) -> Self {
        let mut c = Classes::default();
        for ch in password.chars() {
            if ch.is_ascii_lowercase() {
                c.lower = true;
            } else if ch.is_ascii_uppercase() {
                c.upper = true;
            } else if ch.is_ascii_digit() {
                c.digit = true;
            } else if ch.is_ascii() {
                c.special = true;
            } else {
                c.other = true;
            }
        }
        c
    }

    fn count(&self) -> u8 {
        [self.lower, self.upper, self.digit, self.special || self.other]
            .iter()
            .filter(|b| **b)
            .count() as u8
    }

    fn pool_size(&self) -> u32 {
        let mut pool = 0;
        if self.lower {
            pool += 26;
        }
        if self.upper {
            pool += 26;
        }
        if self.digit {
            pool += 10;
        }
        if self.special {
            pool += 33;
        }
        if self.other {
            pool += 100;
        }
        pool
    }
}

/// Rate a password.
pub fn analyze(password: &str) -> StrengthReport {
    let len = password.chars().count();
    let classes = Classes::of(password);
    let lowered = password.to_lowercase();
    let mut feedback = Vec::new();

    let entropy_bits = if len == 0 {
        0.0
    } else {
        len as f64 * f64::from(classes.pool_size()).log2()
    };

    let mut score = (len.min(FULL_CREDIT_LEN) * 3) as i32 + i32::from(classes.count()) * 10;

    if len < 12 {
        feedback.push("Use at least 12 characters; 16 or more is better".to_string());
    }
    if !classes.upper || !classes.lower {
        feedback.push("Mix uppercase and lowercase letters".to_string());
    }
    if !classes.digit {
        feedback.push("Add numbers".to_string());
    }
    if !(classes.special || classes.other) {
        feedback.push("Add special characters such as !@#$%".to_string());
    }

    if has_repeated_run(password, 3) {
        score -= 10;
        feedback.push("Avoid repeating the same character".to_string());
    }
    if has_sequence(&lowered, 3) {
        score -= 10;
        feedback.push("Avoid sequences like 'abc' or '123'".to_string());
    }
    if has_keyboard_pattern(&lowered, 4) {
        score -= 15;
        feedback.push("Avoid keyboard patterns like 'qwerty' or 'asdf'".to_string());
    }

    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        score = score.min(5);
        feedback.push("This is one of the most common passwords; choose something unique".to_string());
    } else if COMMON_PASSWORDS
        .iter()
        .any(|common| common.len() >= 5 && lowered.contains(common))
    {
        score = score.min(30);
        feedback.push("Avoid building on common passwords or words".to_string());
    }

    let score = score.clamp(0, 100) as u8;
    StrengthReport {
        score,
        level: StrengthLevel::from_score(score),
        entropy_bits,
        feedback,
    }
}

fn has_repeated_run(password: &str, run: usize) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(run).any(|w| w.iter().all(|c| *c == w[0]))
}

fn has_sequence(lowered: &str, run: usize) -> bool {
    let chars: Vec<char> = lowered.chars().collect();
    chars.windows(run).any(|w| {
        w.iter().all(|c| c.is_ascii_alphanumeric())
            && w.windows(2).all(|p| p[1] as u32 == p[0] as u32 + 1)
    })
}

fn has_keyboard_pattern(lowered: &str, run: usize) -> bool {
    KEYBOARD_ROWS.iter().any(|row| {
        row.as_bytes()
            .windows(run)
            .filter_map(|w| std::str::from_utf8(w).ok())
            .any(|pattern| lowered.contains(pattern))
    })
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Minimum requirements a stored password must meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordRules {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special: bool,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: 12,
            require_uppercase: true,
            require_lowercase: true,
            require_numbers: true,
            require_special: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleViolation {
    TooShort { min_length: usize },
    MissingUppercase,
    MissingLowercase,
    MissingNumber,
    MissingSpecial,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleViolation::TooShort { min_length } => {
                write!(f, "Password must be at least {} characters", min_length)
            }
            RuleViolation::MissingUppercase => {
                write!(f, "Password must contain at least one uppercase letter")
            }
            RuleViolation::MissingLowercase => {
                write!(f, "Password must contain at least one lowercase letter")
            }
            RuleViolation::MissingNumber => write!(f, "Password must contain at least one number"),
            RuleViolation::MissingSpecial => {
                write!(f, "Password must contain at least one special character")
            }
        }
    }
}

/// Every rule the password breaks; empty when it passes.
pub fn validate(password: &str, rules: &PasswordRules) -> Vec<RuleViolation> {
    let mut violations = Vec::new();

    if password.chars().count() < rules.min_length {
        violations.push(RuleViolation::TooShort {
            min_length: rules.min_length,
        });
    }
    if rules.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        violations.push(RuleViolation::MissingUppercase);
    }
    if rules.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        violations.push(RuleViolation::MissingLowercase);
    }
    if rules.require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(RuleViolation::MissingNumber);
    }
    if rules.require_special && !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        violations.push(RuleViolation::MissingSpecial);
    }

    violations
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_password_is_very_weak() {
        let report = analyze("password");
        assert_eq!(report.level, StrengthLevel::VeryWeak);
        assert!(report.score <= 5);
        assert!(report.level.needs_attention());
    }

    #[test]
    fn test_empty_password_scores_zero() {
        let report = analyze("");
        assert_eq!(report.score, 0);
        assert_eq!(report.entropy_bits, 0.0);
    }

    #[test]
    fn test_long_mixed_password_is_very_strong() {
        let report = analyze("T7#vQ9!mZp2&Lw4$Rx8k");
        assert_eq!(report.level, StrengthLevel::VeryStrong);
        assert!(report.entropy_bits > 100.0);
        assert!(report.feedback.is_empty(), "unexpected feedback: {:?}", report.feedback);
    }

    #[test]
    fn test_patterns_reduce_score() {
        let clean = analyze("Hx7!kP2@mQ9z");
        let patterned = analyze("Qwerty123!aa");
        assert!(patterned.score < clean.score);
        assert!(patterned.feedback.iter().any(|f| f.contains("keyboard")));
        assert!(patterned.feedback.iter().any(|f| f.contains("sequences")));
    }

    #[test]
    fn test_repeated_run_detected() {
        let report = analyze("Baaad!Pass99X");
        assert!(report.feedback.iter().any(|f| f.contains("repeating")));
    }

    #[test]
    fn test_common_word_inside_password_penalized() {
        let report = analyze("Password!2024");
        assert!(report.feedback.iter().any(|f| f.contains("common")));
        assert!(report.level.needs_attention());
    }

    #[test]
    fn test_score_is_monotonic_in_length_for_random_text() {
        let short = analyze("Hx7!kP");
        let long = analyze("Hx7!kPv3#Ne8");
        assert!(long.score > short.score);
    }

    #[test]
    fn test_validate_reports_every_violation() {
        let violations = validate("abc", &PasswordRules::default());
        assert_eq!(
            violations,
            vec![
                RuleViolation::TooShort { min_length: 12 },
                RuleViolation::MissingUppercase,
                RuleViolation::MissingNumber,
                RuleViolation::MissingSpecial,
            ]
        );
        assert_eq!(
            violations[0].to_string(),
            "Password must be at least 12 characters"
        );
    }

    #[test]
    fn test_validate_accepts_compliant_password() {
        assert!(validate("Correct-Horse-42", &PasswordRules::default()).is_empty());
    }

    #[test]
    fn test_validate_respects_disabled_rules() {
        let rules = PasswordRules {
            min_length: 4,
            require_special: false,
            require_numbers: false,
            ..Default::default()
        };
        assert!(validate("Abcd", &rules).is_empty());
    }
}
