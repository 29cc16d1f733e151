//! Input validation for signup and parking forms.
//!
//! Every check is a pure function returning `bool`; callers decide which
//! message to show. Digits are ASCII only.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// local@domain.tld with a 2+ letter suffix
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    /// Letters and spaces only
    static ref NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z ]+$").unwrap();

    /// Local phone numbers are exactly 8 digits
    static ref PHONE_REGEX: Regex = Regex::new(r"^[0-9]{8}$").unwrap();

    static ref ACCOUNT_NUMBER_REGEX: Regex = Regex::new(r"^[0-9]{7,15}$").unwrap();
}

/// Banks offered on the signup form
pub const BANK_OPTIONS: [&str; 5] = ["POSB", "OCBC", "UOB", "CITIBANK", "HSBC"];

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

/// Phone number check
pub fn is_valid_number(number: &str) -> bool {
    PHONE_REGEX.is_match(number)
}

pub fn is_valid_account_number(number: &str) -> bool {
    ACCOUNT_NUMBER_REGEX.is_match(number)
}

pub fn is_valid_bank_name(bank: &str) -> bool {
    BANK_OPTIONS.contains(&bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(is_valid_email("x_y%z-1@sub-domain.co"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@b.c"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b.c0m"));
        assert!(!is_valid_email("a@b.com\n"));
    }

    #[test]
    fn test_name() {
        assert!(is_valid_name("Jane Doe"));
        assert!(is_valid_name("J"));

        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Jane-Doe"));
        assert!(!is_valid_name("Jane2"));
        assert!(!is_valid_name("Zoë"));
    }

    #[test]
    fn test_phone_accepts_every_eight_digit_string() {
        for start in [0u32, 1_234_567, 12_345_678, 99_999_999] {
            let s = format!("{:08}", start);
            assert!(is_valid_number(&s), "{} should be valid", s);
        }
    }

    #[test]
    fn test_phone_rejects_wrong_length_or_non_digits() {
        for len in (0..=12).filter(|l| *l != 8) {
            let s = "1".repeat(len);
            assert!(!is_valid_number(&s), "{:?} should be invalid", s);
        }
        assert!(!is_valid_number("1234567a"));
        assert!(!is_valid_number("1234 678"));
        assert!(!is_valid_number("+2345678"));
        // Non-ASCII digits
        assert!(!is_valid_number("١٢٣٤٥٦٧٨"));
    }

    #[test]
    fn test_account_number_length_bounds() {
        for len in 0..=20 {
            let s = "9".repeat(len);
            assert_eq!(is_valid_account_number(&s), (7..=15).contains(&len), "length {}", len);
        }
        assert!(!is_valid_account_number("12345x7"));
        assert!(!is_valid_account_number("123-4567"));
    }

    #[test]
    fn test_bank_name() {
        for bank in BANK_OPTIONS {
            assert!(is_valid_bank_name(bank));
        }
        assert!(!is_valid_bank_name("posb"));
        assert!(!is_valid_bank_name("DBS"));
    }
}
