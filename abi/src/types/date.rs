use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::{Date, Error};

impl Date {
    pub fn to_naive(&self) -> Result<NaiveDate, Error> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .ok_or_else(|| Error::InvalidDate(self.to_string()))
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}
