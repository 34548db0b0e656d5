use chrono::{Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use crate::{Date, Error};

lazy_static! {
    // optional leading +, digits with spaces or dashes, 8 to 20 characters
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

const MIN_PHONE_DIGITS: usize = 7;

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
        && phone.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Today's calendar date in the server's local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Convert a date field that has to be present.
pub fn required_date(date: Option<&Date>, field: &str) -> Result<NaiveDate, Error> {
    date.ok_or_else(|| Error::InvalidDate(format!("{} is missing", field)))?
        .to_naive()
}

pub fn optional_date(date: Option<&Date>) -> Result<Option<NaiveDate>, Error> {
    date.map(Date::to_naive).transpose()
}
