//! Positional field extractors for a marketplace title line such as
//! `2019 Honda Civic`. They assume the fixed token layout the marketplace
//! renders; anything else is reported as a `FieldError`.

use thiserror::Error;

use crate::listing::NO_MODEL;

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("title {0:?} does not start with a year")]
    Year(String),
    #[error("title {0:?} has no make token")]
    Brand(String),
    #[error("mileage {0:?} is not a number of thousands")]
    Mileage(String),
}

/// Token 0 of the title, as an integer year.
pub fn year(title: &str) -> Result<i32, FieldError> {
    title
        .split_whitespace()
        .next()
        .and_then(|t| t.parse::<i32>().ok())
        .ok_or_else(|| FieldError::Year(title.to_string()))
}

/// Token 1 of the title.
pub fn brand(title: &str) -> Result<String, FieldError> {
    title
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| FieldError::Brand(title.to_string()))
}

/// Token 2 of the title, or [`NO_MODEL`] for two-token titles.
pub fn model(title: &str) -> String {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    if tokens.len() > 2 {
        tokens[2].to_string()
    } else {
        NO_MODEL.to_string()
    }
}

/// Everything before the first `K`, read as thousands of miles.
pub fn mileage(segment: &str) -> Result<f64, FieldError> {
    let prefix = segment.split('K').next().unwrap_or("").trim();
    prefix
        .parse::<f64>()
        .ok()
        .filter(|thousands| thousands.is_finite())
        .map(|thousands| thousands * 1000.0)
        .ok_or_else(|| FieldError::Mileage(segment.to_string()))
}
