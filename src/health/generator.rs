// pwvault - Strong password generation

use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroizing;

use super::analyzer::{validate, PasswordRules, SPECIAL_CHARS};

pub const MIN_GENERATED_LEN: usize = 12;
pub const MAX_GENERATED_LEN: usize = 32;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub special: bool,
    pub numbers: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            special: true,
            numbers: true,
        }
    }
}

impl GeneratorOptions {
    /// Rules every password produced with these options satisfies.
    pub fn rules(&self) -> PasswordRules {
        PasswordRules {
            min_length: MIN_GENERATED_LEN,
            require_numbers: self.numbers,
            require_special: self.special,
            ..Default::default()
        }
    }
}

/// Generate a random password. Length is clamped to 12..=32 and the result
/// always contains an uppercase and a lowercase letter, plus a digit and a
/// special character when those are enabled.
pub fn generate(options: &GeneratorOptions) -> Zeroizing<String> {
    let length = options.length.clamp(MIN_GENERATED_LEN, MAX_GENERATED_LEN);
    let rules = options.rules();

    let mut pool: Vec<u8> = [UPPER, LOWER].concat();
    if options.numbers {
        pool.extend_from_slice(DIGITS);
    }
    if options.special {
        pool.extend_from_slice(SPECIAL_CHARS.as_bytes());
    }

    let mut rng = rand::rng();
    loop {
        let mut chars = Zeroizing::new(Vec::with_capacity(length));
        chars.push(pick(&mut rng, UPPER));
        chars.push(pick(&mut rng, LOWER));
        if options.numbers {
            chars.push(pick(&mut rng, DIGITS));
        }
        if options.special {
            chars.push(pick(&mut rng, SPECIAL_CHARS.as_bytes()));
        }
        while chars.len() < length {
            chars.push(pick(&mut rng, &pool));
        }
        chars.shuffle(&mut rng);

        let password: Zeroizing<String> = Zeroizing::new(chars.iter().map(|&b| b as char).collect());
        if validate(&password, &rules).is_empty() {
            return password;
        }
    }
}

/// Generate `count` independent passwords with the same options.
pub fn suggest(options: &GeneratorOptions, count: usize) -> Vec<Zeroizing<String>> {
    (0..count).map(|_| generate(options)).collect()
}

fn pick<R: Rng>(rng: &mut R, set: &[u8]) -> u8 {
    set[rng.random_range(0..set.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation_meets_rules() {
        for _ in 0..50 {
            let password = generate(&GeneratorOptions::default());
            assert_eq!(password.len(), 16);
            assert!(validate(&password, &PasswordRules::default()).is_empty());
        }
    }

    #[test]
    fn test_length_is_clamped() {
        let short = generate(&GeneratorOptions {
            length: 4,
            ..Default::default()
        });
        let long = generate(&GeneratorOptions {
            length: 100,
            ..Default::default()
        });
        assert_eq!(short.len(), MIN_GENERATED_LEN);
        assert_eq!(long.len(), MAX_GENERATED_LEN);
    }

    #[test]
    fn test_disabled_classes_are_excluded() {
        let options = GeneratorOptions {
            length: 24,
            special: false,
            numbers: false,
        };
        for _ in 0..20 {
            let password = generate(&options);
            assert!(password.chars().all(|c| c.is_ascii_alphabetic()));
            assert!(password.chars().any(|c| c.is_ascii_uppercase()));
            assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_suggest_returns_distinct_compliant_passwords() {
        let options = GeneratorOptions {
            length: 20,
            ..Default::default()
        };
        let suggestions = suggest(&options, 5);

        assert_eq!(suggestions.len(), 5);
        for (i, password) in suggestions.iter().enumerate() {
            assert_eq!(password.len(), 20);
            assert!(validate(password, &options.rules()).is_empty());
            assert!(suggestions[i + 1..].iter().all(|other| other.as_str() != password.as_str()));
        }
        assert!(suggest(&options, 0).is_empty());
    }

    #[test]
    fn test_generated_passwords_differ() {
        let a = generate(&GeneratorOptions::default());
        let b = generate(&GeneratorOptions::default());
        assert_ne!(a.as_str(), b.as_str());
    }
}
