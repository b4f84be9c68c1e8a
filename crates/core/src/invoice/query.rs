//! Parsing of invoice list query parameters.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use billet_shared::FieldErrors;
use billet_shared::types::PageRequest;
use billet_shared::types::pagination::{MAX_LIMIT, MAX_PAGE};

use super::types::{InvoiceFilters, SortDirection, SortField};

/// Raw query string values, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Page number.
    pub page: Option<String>,
    /// Page size.
    pub limit: Option<String>,
    /// Sort column.
    pub sort: Option<String>,
    /// Sort direction.
    pub direction: Option<String>,
    /// Organisation filter.
    pub organisation_id: Option<String>,
    /// Company filter.
    pub company_id: Option<String>,
    /// Agreement filter.
    pub agreement_id: Option<String>,
    /// Earliest date, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Latest date, `YYYY-MM-DD`.
    pub end: Option<String>,
}

/// A validated invoice list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceListQuery {
    /// Row filters.
    pub filters: InvoiceFilters,
    /// Offset/limit window.
    pub page: PageRequest,
    /// Order column.
    pub sort: SortField,
    /// Order direction.
    pub direction: SortDirection,
}

fn read_number<T: FromStr>(
    value: Option<&str>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    let value = value.filter(|v| !v.is_empty())?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, "must be an integer value");
            None
        }
    }
}

fn read_date(value: Option<&str>, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let value = value.filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "must be a valid date (YYYY-MM-DD)");
            None
        }
    }
}

impl ListParams {
    /// Validates the raw values into a list query.
    ///
    /// # Errors
    ///
    /// Returns every field that failed to parse or is out of range.
    pub fn parse(&self) -> Result<InvoiceListQuery, FieldErrors> {
        let mut errors = FieldErrors::new();

        let page: i64 = read_number(self.page.as_deref(), "page", &mut errors).unwrap_or(1);
        let limit: i64 = read_number(self.limit.as_deref(), "limit", &mut errors).unwrap_or(20);
        errors.check(page > 0, "page", "must be greater than zero");
        errors.check(
            page <= i64::try_from(MAX_PAGE).unwrap_or(i64::MAX),
            "page",
            "must be a maximum of 10 million",
        );
        errors.check(limit > 0, "limit", "must be greater than zero");
        errors.check(
            limit <= i64::try_from(MAX_LIMIT).unwrap_or(i64::MAX),
            "limit",
            "must be a maximum of 100",
        );

        let sort = match self.sort.as_deref() {
            None | Some("") => Some(SortField::default()),
            Some(value) => SortField::parse(value),
        };
        errors.check(sort.is_some(), "sort", "invalid sort value");

        let direction = match self.direction.as_deref() {
            None | Some("") => Some(SortDirection::default()),
            Some(value) => SortDirection::parse(value),
        };
        errors.check(direction.is_some(), "direction", "invalid direction value");

        let filters = InvoiceFilters {
            organisation_id: read_number(
                self.organisation_id.as_deref(),
                "organisation_id",
                &mut errors,
            ),
            company_id: read_number(self.company_id.as_deref(), "company_id", &mut errors),
            agreement_id: read_number(self.agreement_id.as_deref(), "agreement_id", &mut errors),
            start: read_date(self.start.as_deref(), "start", &mut errors),
            end: read_date(self.end.as_deref(), "end", &mut errors),
        };
        if let (Some(start), Some(end)) = (filters.start, filters.end) {
            errors.check(start <= end, "end", "must not be before start");
        }

        errors.into_result()?;

        Ok(InvoiceListQuery {
            filters,
            page: PageRequest::new(page.unsigned_abs(), limit.unsigned_abs()),
            sort: sort.unwrap_or_default(),
            direction: direction.unwrap_or_default(),
        })
    }
}
