//! Bangladeshi mobile phone numbers.
//!
//! Couriers require the 11-digit local form (`01XXXXXXXXX`), so every number
//! is normalized to it on parse regardless of how the customer typed it.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits, spaces, dashes and a leading +.
    #[error("phone number contains invalid characters")]
    InvalidCharacters,
    /// The number does not have the shape of a Bangladeshi mobile number.
    #[error("phone number must be an 11-digit Bangladeshi mobile number (01XXXXXXXXX)")]
    InvalidFormat,
}

/// A Bangladeshi mobile number in canonical `01XXXXXXXXX` form.
///
/// Accepted inputs: `01712345678`, `+8801712345678`, `8801712345678`,
/// `01712-345678`, `+880 1712 345678`. The operator digit (third digit) must
/// be 3 through 9.
///
/// ```
/// use dokan_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+880 1712-345678").unwrap();
/// assert_eq!(phone.as_str(), "01712345678");
/// assert!(PhoneNumber::parse("01212345678").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if the input is not a Bangladeshi mobile number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if !body
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        {
            return Err(PhoneError::InvalidCharacters);
        }

        let digits: String = body.chars().filter(char::is_ascii_digit).collect();
        let local = match digits.len() {
            11 => digits,
            13 if digits.starts_with("880") => format!("0{}", &digits[3..]),
            _ => return Err(PhoneError::InvalidFormat),
        };

        let bytes = local.as_bytes();
        let valid_prefix = matches!(bytes, [b'0', b'1', operator, ..] if (b'3'..=b'9').contains(operator));
        if !valid_prefix {
            return Err(PhoneError::InvalidFormat);
        }

        Ok(Self(local))
    }

    /// Returns the canonical 11-digit form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the international form (`+8801XXXXXXXXX`).
    #[must_use]
    pub fn international(&self) -> String {
        format!("+88{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_spellings() {
        for input in [
            "01712345678",
            "+8801712345678",
            "8801712345678",
            "01712-345678",
            "+880 1712 345678",
        ] {
            assert_eq!(PhoneNumber::parse(input).unwrap().as_str(), "01712345678");
        }
    }

    #[test]
    fn test_rejects_invalid_numbers() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("0171234567a"),
            Err(PhoneError::InvalidCharacters)
        );
        assert_eq!(PhoneNumber::parse("0171234567"), Err(PhoneError::InvalidFormat));
        assert_eq!(PhoneNumber::parse("02712345678"), Err(PhoneError::InvalidFormat));
        assert_eq!(PhoneNumber::parse("01212345678"), Err(PhoneError::InvalidFormat));
        assert_eq!(
            PhoneNumber::parse("9901712345678"),
            Err(PhoneError::InvalidFormat)
        );
    }

    #[test]
    fn test_international_form() {
        let phone = PhoneNumber::parse("01912345678").unwrap();
        assert_eq!(phone.international(), "+8801912345678");
    }
}
