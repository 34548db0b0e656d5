use chrono::NaiveDate;

use crate::{optional_date, Error, ReservationQuery, ReservationStatus};

const DEFAULT_PAGE_SIZE: i32 = 10;
const MAX_PAGE_SIZE: i32 = 100;

impl ReservationQuery {
    pub fn validate(&self) -> Result<(), Error> {
        if self.page_size < 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidPageSize(self.page_size));
        }
        if self.page < 0 {
            return Err(Error::InvalidPage(self.page));
        }
        ReservationStatus::try_from(self.status)
            .map_err(|_| Error::InvalidStatus(self.status.to_string()))?;
        if let (Some(start), Some(end)) = self.bounds()? {
            if start >= end {
                return Err(Error::InvalidStayWindow);
            }
        }
        Ok(())
    }

    /// `[start, end)` of the query; either side may be open.
    pub fn bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), Error> {
        Ok((
            optional_date(self.start.as_ref())?,
            optional_date(self.end.as_ref())?,
        ))
    }

    pub fn limit(&self) -> i64 {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE as i64
        } else {
            self.page_size as i64
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.limit()
    }
}
