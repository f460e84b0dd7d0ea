//! Promo code issuance.
//!
//! Codes are human-typable: the alphabet excludes visually ambiguous
//! characters (0/O, 1/I/L). A retake earns a lower point value than a
//! first-time completion.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// No 0, O, 1, I, or L.
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Code body length before formatting (two groups of five).
const CODE_LEN: usize = 10;

const FIRST_COMPLETION_POINTS: u32 = 1000;
const RETAKE_POINTS: u32 = 100;

/// A promo code bound to one completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedPromo {
    pub code: String,
    pub session_id: String,
    pub points: u32,
    pub is_retake: bool,
}

/// Generates promo codes of the form `NF-XXXXX-XXXXX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromoIssuer;

impl PromoIssuer {
    pub fn new() -> Self {
        Self
    }

    /// Issue a code for a completed session.
    pub fn issue(&self, session_id: &str, is_retake: bool) -> IssuedPromo {
        let mut rng = rand::thread_rng();
        let raw: String = (0..CODE_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        IssuedPromo {
            code: format!("NF-{}-{}", &raw[..5], &raw[5..]),
            session_id: session_id.to_string(),
            points: if is_retake {
                RETAKE_POINTS
            } else {
                FIRST_COMPLETION_POINTS
            },
            is_retake,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_format() {
        let promo = PromoIssuer::new().issue("s1", false);
        let parts: Vec<&str> = promo.code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "NF");
        assert_eq!(parts[1].len(), 5);
        assert_eq!(parts[2].len(), 5);
    }

    #[test]
    fn no_ambiguous_characters() {
        let issuer = PromoIssuer::new();
        for _ in 0..200 {
            let promo = issuer.issue("s1", false);
            // Skip the fixed "NF-" prefix; check the generated body.
            for c in promo.code[3..].chars().filter(|c| *c != '-') {
                assert!(
                    ALPHABET.contains(&(c as u8)),
                    "unexpected character {c} in {}",
                    promo.code
                );
            }
        }
    }

    #[test]
    fn retake_is_worth_less() {
        let issuer = PromoIssuer::new();
        assert_eq!(issuer.issue("s1", false).points, 1000);
        assert_eq!(issuer.issue("s1", true).points, 100);
    }
}
