//! Password generation and advisory strength scoring
//!
//! All randomness comes from a [`RandomSource`]; indices are drawn by
//! rejection sampling so every character is equally likely.

use serde::{Deserialize, Serialize};

use crate::crypto::{random_below, OsRandom, RandomSource};
use crate::error::{Result, VaultError};

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBERS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";
const SIMILAR_CHARS: &str = "il1Lo0O";

/// Upper bound on generated length
pub const MAX_LENGTH: usize = 1024;

/// Options for [`generate_password`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordOptions {
    pub length: usize,
    pub lowercase: bool,
    pub uppercase: bool,
    pub numbers: bool,
    pub symbols: bool,
    /// Drop characters that are easy to confuse (`il1Lo0O`)
    pub exclude_similar: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: 16,
            lowercase: true,
            uppercase: true,
            numbers: true,
            symbols: true,
            exclude_similar: false,
        }
    }
}

/// Generate a password using the OS random source
pub fn generate_password(options: &PasswordOptions) -> Result<String> {
    generate_password_with(&OsRandom, options)
}

/// Generate a password
///
/// Every enabled class contributes at least one character (as long as the
/// length allows). With no class enabled, letters and digits are used.
pub fn generate_password_with(
    rng: &dyn RandomSource,
    options: &PasswordOptions,
) -> Result<String> {
    if options.length == 0 || options.length > MAX_LENGTH {
        return Err(VaultError::InvalidInput(format!(
            "Password length must be between 1 and {}, got {}",
            MAX_LENGTH, options.length
        )));
    }

    let classes = character_classes(options);
    let charset: Vec<char> = if classes.is_empty() {
        LOWERCASE.chars().chain(UPPERCASE.chars()).chain(NUMBERS.chars()).collect()
    } else {
        classes.iter().flatten().copied().collect()
    };

    let mut password: Vec<char> = Vec::with_capacity(options.length.max(classes.len()));
    for class in &classes {
        password.push(pick(rng, class)?);
    }
    while password.len() < options.length {
        password.push(pick(rng, &charset)?);
    }

    shuffle(rng, &mut password)?;
    password.truncate(options.length);
    Ok(password.into_iter().collect())
}

/// Enabled, non-empty character classes
fn character_classes(options: &PasswordOptions) -> Vec<Vec<char>> {
    let filter = |set: &str, apply: bool| -> Vec<char> {
        set.chars()
            .filter(|c| !(apply && SIMILAR_CHARS.contains(*c)))
            .collect()
    };

    [
        (options.lowercase, filter(LOWERCASE, options.exclude_similar)),
        (options.uppercase, filter(UPPERCASE, options.exclude_similar)),
        (options.numbers, filter(NUMBERS, options.exclude_similar)),
        (options.symbols, filter(SYMBOLS, false)),
    ]
    .into_iter()
    .filter(|(enabled, chars)| *enabled && !chars.is_empty())
    .map(|(_, chars)| chars)
    .collect()
}

fn pick(rng: &dyn RandomSource, chars: &[char]) -> Result<char> {
    let index = random_below(rng, chars.len() as u32)? as usize;
    Ok(chars[index])
}

/// Fisher-Yates shuffle
fn shuffle(rng: &dyn RandomSource, chars: &mut [char]) -> Result<()> {
    for i in (1..chars.len()).rev() {
        let j = random_below(rng, (i + 1) as u32)? as usize;
        chars.swap(i, j);
    }
    Ok(())
}

/// Strength bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrengthLabel {
    Weak,
    Fair,
    Good,
    Strong,
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Weak => "Weak",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Strong => "Strong",
        };
        f.write_str(label)
    }
}

/// Advisory strength estimate; nothing enforces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStrength {
    /// 0 to 8
    pub score: u8,
    pub label: StrengthLabel,
}

/// Score a password on length, character variety and repetition
pub fn calculate_strength(password: &str) -> PasswordStrength {
    let length = password.chars().count();
    let unique = password
        .chars()
        .collect::<std::collections::HashSet<_>>()
        .len();

    let checks = [
        length >= 8,
        length >= 12,
        length >= 16,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
        unique as f64 >= length as f64 * 0.6,
    ];
    let score = checks.iter().filter(|passed| **passed).count() as u8;

    let label = match score {
        0..=2 => StrengthLabel::Weak,
        3..=4 => StrengthLabel::Fair,
        5..=6 => StrengthLabel::Good,
        _ => StrengthLabel::Strong,
    };

    PasswordStrength { score, label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::testing::FailingRandom;

    #[test]
    fn test_default_options() {
        let password = generate_password(&PasswordOptions::default()).unwrap();
        assert_eq!(password.chars().count(), 16);

        assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.chars().any(|c| SYMBOLS.contains(c)));
    }

    #[test]
    fn test_single_class() {
        let options = PasswordOptions {
            length: 32,
            lowercase: false,
            uppercase: false,
            numbers: true,
            symbols: false,
            exclude_similar: false,
        };
        let password = generate_password(&options).unwrap();
        assert_eq!(password.len(), 32);
        assert!(password.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_exclude_similar() {
        let options = PasswordOptions {
            length: 200,
            exclude_similar: true,
            ..PasswordOptions::default()
        };
        for _ in 0..5 {
            let password = generate_password(&options).unwrap();
            assert!(!password.chars().any(|c| SIMILAR_CHARS.contains(c)));
        }
    }

    #[test]
    fn test_no_class_falls_back_to_alphanumeric() {
        let options = PasswordOptions {
            length: 24,
            lowercase: false,
            uppercase: false,
            numbers: false,
            symbols: false,
            exclude_similar: false,
        };
        let password = generate_password(&options).unwrap();
        assert_eq!(password.len(), 24);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_length_shorter_than_class_count() {
        let options = PasswordOptions {
            length: 2,
            ..PasswordOptions::default()
        };
        assert_eq!(generate_password(&options).unwrap().chars().count(), 2);
    }

    #[test]
    fn test_invalid_length() {
        for length in [0, MAX_LENGTH + 1] {
            let options = PasswordOptions {
                length,
                ..PasswordOptions::default()
            };
            assert!(matches!(
                generate_password(&options),
                Err(VaultError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_generated_passwords_differ() {
        let options = PasswordOptions::default();
        assert_ne!(
            generate_password(&options).unwrap(),
            generate_password(&options).unwrap()
        );
    }

    #[test]
    fn test_generation_fails_without_randomness() {
        assert!(matches!(
            generate_password_with(&FailingRandom, &PasswordOptions::default()),
            Err(VaultError::RandomnessUnavailable(_))
        ));
    }

    #[test]
    fn test_strength_scores() {
        let weak = calculate_strength("abc");
        assert_eq!(weak.label, StrengthLabel::Weak);

        // length>=8, lower, digit, unique
        let fair = calculate_strength("abcd1234");
        assert_eq!(fair.score, 4);
        assert_eq!(fair.label, StrengthLabel::Fair);

        // length>=8, >=12, lower, upper, digit, symbol
        let good = calculate_strength("aaaaaaaaaA1!");
        assert_eq!(good.score, 6);
        assert_eq!(good.label, StrengthLabel::Good);

        let strong = calculate_strength("Tr0ub4dor&3-Horse!");
        assert_eq!(strong.score, 8);
        assert_eq!(strong.label, StrengthLabel::Strong);
    }

    #[test]
    fn test_strength_of_empty_password() {
        let strength = calculate_strength("");
        assert_eq!(strength.label, StrengthLabel::Weak);
        assert!(strength.score <= 1);
    }
}
