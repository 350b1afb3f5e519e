//! Input validation for `x_search` arguments.
//!
//! Every rule runs on every call; violations are collected so the caller sees all of
//! them at once.

use crate::{RawSearchArgs, SearchRequest};
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

pub const MAX_QUERY_CHARS: usize = 2000;
pub const MAX_HANDLES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(ValidationError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Parse a `YYYY-MM-DD` date, rejecting anything whose canonical rendering differs
/// from the input (`2025-2-5`, `2025-02-30`, ...).
pub fn validate_date(s: &str) -> Result<NaiveDate, String> {
    let b = s.as_bytes();
    let shape_ok = b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(format!("expected YYYY-MM-DD, got {s:?}"));
    }
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("{s:?} is not a valid calendar date"))?;
    if d.format("%Y-%m-%d").to_string() != s {
        return Err(format!("{s:?} is not a valid calendar date"));
    }
    Ok(d)
}

fn check_query(v: Option<&Value>, errs: &mut ValidationErrors) -> Option<String> {
    let Some(v) = v else {
        errs.push("query", "is required");
        return None;
    };
    let Some(s) = v.as_str() else {
        errs.push("query", "must be a string");
        return None;
    };
    if s.is_empty() {
        errs.push("query", "must be non-empty");
        return None;
    }
    let n = s.chars().count();
    if n > MAX_QUERY_CHARS {
        errs.push(
            "query",
            format!("must be at most {MAX_QUERY_CHARS} characters (got {n})"),
        );
        return None;
    }
    Some(s.to_string())
}

fn check_handles(
    field: &'static str,
    v: Option<&Value>,
    errs: &mut ValidationErrors,
) -> Option<Vec<String>> {
    let v = v?;
    let Some(items) = v.as_array() else {
        errs.push(field, "must be an array of handle strings");
        return None;
    };
    let before = errs.errors().len();
    if items.len() > MAX_HANDLES {
        errs.push(
            field,
            format!("must have at most {MAX_HANDLES} entries (got {})", items.len()),
        );
    }
    let mut out = Vec::with_capacity(items.len());
    for (i, it) in items.iter().enumerate() {
        match it.as_str() {
            Some(s) if !s.is_empty() => out.push(s.to_string()),
            Some(_) => errs.push(field, format!("entry {i} must be a non-empty string")),
            None => errs.push(field, format!("entry {i} must be a string")),
        }
    }
    (errs.errors().len() == before).then_some(out)
}

fn check_date(
    field: &'static str,
    v: Option<&Value>,
    errs: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let v = v?;
    let Some(s) = v.as_str() else {
        errs.push(field, "must be a YYYY-MM-DD string");
        return None;
    };
    match validate_date(s) {
        Ok(d) => Some(d),
        Err(msg) => {
            errs.push(field, msg);
            None
        }
    }
}

fn check_bool(field: &'static str, v: Option<&Value>, errs: &mut ValidationErrors) -> Option<bool> {
    let v = v?;
    match v.as_bool() {
        Some(b) => Some(b),
        None => {
            errs.push(field, "must be a boolean");
            None
        }
    }
}

pub fn validate(raw: &RawSearchArgs) -> Result<SearchRequest, ValidationErrors> {
    let mut errs = ValidationErrors::default();

    let query = check_query(raw.query.as_ref(), &mut errs);
    let allowed = check_handles("allowed_x_handles", raw.allowed_x_handles.as_ref(), &mut errs);
    let excluded = check_handles(
        "excluded_x_handles",
        raw.excluded_x_handles.as_ref(),
        &mut errs,
    );
    if raw.allowed_x_handles.is_some() && raw.excluded_x_handles.is_some() {
        errs.push(
            "allowed_x_handles",
            "cannot be combined with excluded_x_handles",
        );
    }

    let from_date = check_date("from_date", raw.from_date.as_ref(), &mut errs);
    let to_date = check_date("to_date", raw.to_date.as_ref(), &mut errs);
    if let (Some(from), Some(to)) = (from_date, to_date) {
        if from > to {
            errs.push("from_date", format!("must not be after to_date ({from} > {to})"));
        }
    }

    let enable_image_understanding = check_bool(
        "enable_image_understanding",
        raw.enable_image_understanding.as_ref(),
        &mut errs,
    );
    let enable_video_understanding = check_bool(
        "enable_video_understanding",
        raw.enable_video_understanding.as_ref(),
        &mut errs,
    );
    let include_raw_response = check_bool(
        "include_raw_response",
        raw.include_raw_response.as_ref(),
        &mut errs,
    );

    match query {
        Some(query) if errs.is_empty() => Ok(SearchRequest {
            query,
            allowed_x_handles: allowed,
            excluded_x_handles: excluded,
            from_date,
            to_date,
            enable_image_understanding,
            enable_video_understanding,
            include_raw_response: include_raw_response.unwrap_or(false),
        }),
        _ => Err(errs),
    }
}
