//! Field checks shared by every caller of the booking service.

use std::sync::LazyLock;

use regex::Regex;
use reel_shared::Masked;
use serde::Deserialize;

use crate::booking::{BookingRequest, NewBooking};
use crate::BookingError;

static CUSTOMER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").expect("customer name pattern compiles"));

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]+$").expect("phone number pattern compiles"));

/// Which booking form variant is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BookingPolicy {
    #[serde(default = "default_require_phone")]
    pub require_phone_number: bool,
}

fn default_require_phone() -> bool { true }

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            require_phone_number: default_require_phone(),
        }
    }
}

pub fn validate_customer_name(raw: &str) -> Result<String, BookingError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(BookingError::validation("customer_name", "must not be empty"));
    }
    if !CUSTOMER_NAME.is_match(name) {
        return Err(BookingError::validation(
            "customer_name",
            "must contain only letters and spaces",
        ));
    }
    Ok(name.to_string())
}

/// A blank phone number counts as absent.
pub fn validate_phone_number(raw: Option<&str>, required: bool) -> Result<Option<Masked<String>>, BookingError> {
    let phone = raw.map(str::trim).filter(|p| !p.is_empty());
    match phone {
        None if required => Err(BookingError::validation("phone_number", "is required")),
        None => Ok(None),
        Some(p) if !PHONE_NUMBER.is_match(p) => Err(BookingError::validation(
            "phone_number",
            "must contain only digits with an optional leading '+'",
        )),
        Some(p) => Ok(Some(Masked::new(p.to_string()))),
    }
}

pub fn validate_seat_count(seats: i32) -> Result<i32, BookingError> {
    if seats <= 0 {
        return Err(BookingError::validation("seats", "must be a positive number"));
    }
    Ok(seats)
}

pub fn validate_request(request: &BookingRequest, policy: &BookingPolicy) -> Result<NewBooking, BookingError> {
    let customer_name = validate_customer_name(&request.customer_name)?;
    let phone_number = validate_phone_number(request.phone_number.as_deref(), policy.require_phone_number)?;
    let seats = validate_seat_count(request.seats)?;

    Ok(NewBooking {
        showtime_id: request.showtime_id,
        customer_name,
        phone_number,
        seats,
    })
}
