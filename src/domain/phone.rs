use crate::domain::payment::Provider;
use crate::error::PaymentError;

pub const COUNTRY_CODE: &str = "256";
const LOCAL_NUMBER_LEN: usize = 10;

fn allowed_prefixes(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Mtn => &["077", "078"],
        Provider::Airtel => &["070", "075"],
    }
}

fn digits_only(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn validate_phone_number(number: &str, provider: Provider) -> bool {
    let digits = digits_only(number);
    if digits.len() != LOCAL_NUMBER_LEN {
        return false;
    }
    allowed_prefixes(provider)
        .iter()
        .any(|prefix| digits.starts_with(prefix))
}

/// Rewrites a 10-digit local number (`0771234567`) into international form
/// (`256771234567`).
pub fn format_phone_number(number: &str) -> Result<String, PaymentError> {
    let digits = digits_only(number);
    if digits.len() != LOCAL_NUMBER_LEN {
        return Err(PaymentError::Format("Invalid phone number length".to_string()));
    }
    Ok(format!("{}{}", COUNTRY_CODE, &digits[1..]))
}
