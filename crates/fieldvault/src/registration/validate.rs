//! Input checks for registration requests.

use common::protocol::RegistrationRequest;
use common::ServiceError;

/// Country prefix every accepted phone number starts with.
pub const PHONE_PREFIX: &str = "+234";

/// Total phone length including the prefix.
pub const PHONE_LEN: usize = 14;

/// A request whose required fields are present and well-formed.
#[derive(Clone, Copy)]
pub struct ValidRequest<'a> {
    pub phone: &'a str,
    pub pin: &'a str,
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub bvn: Option<&'a str>,
}

/// Check presence of `phone`, `pin`, `name`, then phone and PIN format.
///
/// Empty optional fields are treated as absent.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] with the first problem found.
pub fn validate(req: &RegistrationRequest) -> Result<ValidRequest<'_>, ServiceError> {
    let phone = required(&req.phone, "phone")?;
    let pin = required(&req.pin, "pin")?;
    let name = required(&req.name, "name")?;

    if !is_nigerian_phone(phone) {
        return Err(ServiceError::Validation("Invalid Nigerian phone number".into()));
    }
    if !is_valid_pin(pin) {
        return Err(ServiceError::Validation("PIN must be 4-6 digits".into()));
    }

    Ok(ValidRequest {
        phone,
        pin,
        name,
        email: optional(&req.email),
        bvn: optional(&req.bvn),
    })
}

/// `+234` followed by ten digits.
pub fn is_nigerian_phone(phone: &str) -> bool {
    phone.len() == PHONE_LEN
        && phone
            .strip_prefix(PHONE_PREFIX)
            .is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Four to six ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    (4..=6).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ServiceError> {
    optional(value).ok_or_else(|| ServiceError::Validation(format!("Missing required field: {field}")))
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(phone: &str, pin: &str, name: &str) -> RegistrationRequest {
        RegistrationRequest {
            phone: Some(phone.into()),
            pin: Some(pin.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn message(req: &RegistrationRequest) -> String {
        match validate(req) {
            Ok(_) => String::new(),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn phone_format() {
        assert!(is_nigerian_phone("+2348012345678"));
        assert!(!is_nigerian_phone("08012345678"));
        assert!(!is_nigerian_phone("+234801234567"));
        assert!(!is_nigerian_phone("+23480123456789"));
        assert!(!is_nigerian_phone("+2338012345678"));
        assert!(!is_nigerian_phone("+234801234567x"));
    }

    #[test]
    fn pin_format() {
        assert!(!is_valid_pin("123"));
        assert!(is_valid_pin("1234"));
        assert!(is_valid_pin("123456"));
        assert!(!is_valid_pin("1234567"));
        assert!(!is_valid_pin("12a4"));
    }

    #[test]
    fn missing_fields_in_order() {
        let mut req = request("+2348012345678", "1234", "Ada");
        req.phone = None;
        assert_eq!(message(&req), "Missing required field: phone");

        let mut req = request("+2348012345678", "1234", "Ada");
        req.pin = Some(String::new());
        assert_eq!(message(&req), "Missing required field: pin");

        let mut req = request("+2348012345678", "1234", "Ada");
        req.name = None;
        assert_eq!(message(&req), "Missing required field: name");
    }

    #[test]
    fn bad_phone_and_pin_messages() {
        assert_eq!(
            message(&request("08012345678", "1234", "Ada")),
            "Invalid Nigerian phone number"
        );
        assert_eq!(
            message(&request("+2348012345678", "12", "Ada")),
            "PIN must be 4-6 digits"
        );
    }

    #[test]
    fn empty_optionals_are_absent() {
        let mut req = request("+2348012345678", "1234", "Ada");
        req.email = Some(String::new());
        req.bvn = Some("22334455667".into());
        let valid = validate(&req).unwrap();
        assert!(valid.email.is_none());
        assert_eq!(valid.bvn, Some("22334455667"));
    }
}
