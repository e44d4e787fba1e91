//! # Field Validation
//!
//! Checks applied to message fields before a message is generated.
//!
//! ## Invariants
//!
//! - `nonce` is at least 8 ASCII alphanumeric characters.
//! - `issued_at` is within 5 minutes of the clock at generation time.
//! - `expiration_time` is after `issued_at` and at most 7 days later.
//! - `not_before` is at most 7 days ahead of the clock and before
//!   `expiration_time`.
//! - `domain` equals the page host; `uri` shares scheme, host and path with
//!   the page.

use super::entities::{host_with_port, PageContext, SiweMessageData, ADDRESS_PLACEHOLDER};
use super::errors::SiweError;
use chrono::{DateTime, Duration, Utc};
use url::Url;

pub const MIN_NONCE_LENGTH: usize = 8;
pub const SIWE_VERSION: u32 = 1;

/// Maximum distance between `issued_at` and the clock.
pub fn issued_at_skew() -> Duration {
    Duration::minutes(5)
}

/// Longest allowed validity window.
pub fn max_validity() -> Duration {
    Duration::days(7)
}

fn invalid(message: impl Into<String>) -> SiweError {
    SiweError::Validation(message.into())
}

pub fn validate_nonce(nonce: &str) -> Result<(), SiweError> {
    if nonce.is_empty() {
        return Err(invalid("'nonce' is required"));
    }
    if nonce.chars().count() < MIN_NONCE_LENGTH {
        return Err(invalid(format!(
            "'nonce' must be at least {MIN_NONCE_LENGTH} characters"
        )));
    }
    if !nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("'nonce' must be alphanumeric"));
    }
    Ok(())
}

pub fn validate_statement(statement: Option<&str>) -> Result<(), SiweError> {
    match statement {
        Some(s) if s.contains('\n') => Err(invalid("'statement' must not contain a newline")),
        Some("") => Err(invalid("'statement' must not be empty when present")),
        _ => Ok(()),
    }
}

/// Accepts the `{address}` placeholder or a 0x-prefixed 20-byte hex address.
pub fn validate_address(address: &str) -> Result<(), SiweError> {
    if address == ADDRESS_PLACEHOLDER || is_hex_address(address) {
        Ok(())
    } else {
        Err(invalid("'address' must be a 0x-prefixed 20-byte hex address"))
    }
}

pub fn is_hex_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SiweError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| SiweError::InvalidTimestamp(value.to_string()))
}

pub fn validate_time_window(
    issued_at: DateTime<Utc>,
    expiration_time: Option<DateTime<Utc>>,
    not_before: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), SiweError> {
    if (issued_at - now).abs() > issued_at_skew() {
        return Err(invalid(
            "'issuedAt' must be within 5 minutes of the current time",
        ));
    }

    if let Some(expiration) = expiration_time {
        if expiration <= issued_at {
            return Err(invalid("'expirationTime' must be after 'issuedAt'"));
        }
        if expiration - issued_at > max_validity() {
            return Err(invalid("'expirationTime' must be within 7 days"));
        }
    }

    if let Some(not_before) = not_before {
        if not_before - now > max_validity() {
            return Err(invalid("'notBefore' must be within 7 days"));
        }
        if let Some(expiration) = expiration_time {
            if not_before >= expiration {
                return Err(invalid("'notBefore' must be before 'expirationTime'"));
            }
        }
    }

    Ok(())
}

/// Bind `domain`, `uri` and `scheme` to the page the message is generated on.
pub fn validate_page_binding(
    data: &SiweMessageData,
    page: &PageContext,
) -> Result<(), SiweError> {
    if data.domain != page.host() {
        return Err(invalid(format!(
            "'domain' must match the page host '{}'",
            page.host()
        )));
    }

    if let Some(scheme) = &data.scheme {
        if scheme != page.scheme() {
            return Err(invalid(format!(
                "'scheme' must match the page scheme '{}'",
                page.scheme()
            )));
        }
    }

    let uri = Url::parse(&data.uri).map_err(|_| invalid("'uri' must be an absolute URL"))?;
    let page_url = page.url();
    if uri.scheme() != page_url.scheme()
        || host_with_port(&uri) != page.host()
        || uri.path() != page_url.path()
    {
        return Err(invalid(format!(
            "'uri' must share scheme, host and path with the page '{}'",
            page.href()
        )));
    }

    Ok(())
}

/// Run every generation-time check.
pub fn validate_message_data(
    data: &SiweMessageData,
    page: &PageContext,
    now: DateTime<Utc>,
) -> Result<(), SiweError> {
    if data.version != SIWE_VERSION {
        return Err(invalid("'version' must be 1"));
    }
    validate_nonce(&data.nonce)?;
    validate_statement(data.statement.as_deref())?;
    validate_address(&data.address)?;
    validate_page_binding(data, page)?;

    let issued_at = parse_timestamp(&data.issued_at)?;
    let expiration_time = data
        .expiration_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;
    let not_before = data.not_before.as_deref().map(parse_timestamp).transpose()?;
    validate_time_window(issued_at, expiration_time, not_before, now)
}
