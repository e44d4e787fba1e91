//! # SIWE Message Format
//!
//! Canonical text layout shared by generation and parsing:
//!
//! ```text
//! [scheme://]domain wants you to sign in with your Ethereum account:
//! address
//!
//! [statement]
//!
//! URI: uri
//! Version: version
//! Chain ID: chain id
//! Nonce: nonce
//! Issued At: issued at
//! [Expiration Time: expiration time]
//! [Not Before: not before]
//! [Request ID: request id]
//! ```
//!
//! Every line, including the last, is terminated by `\n`. When the
//! statement is absent its line is left empty, giving two blank lines
//! between the address and `URI:`.

use super::entities::{PageContext, SiweMessageData};
use super::errors::SiweError;
use super::validation;
use chrono::{DateTime, Utc};

pub const PREAMBLE: &str = " wants you to sign in with your Ethereum account:";
pub const URI_TAG: &str = "URI: ";
pub const VERSION_TAG: &str = "Version: ";
pub const CHAIN_TAG: &str = "Chain ID: ";
pub const NONCE_TAG: &str = "Nonce: ";
pub const IAT_TAG: &str = "Issued At: ";
pub const EXP_TAG: &str = "Expiration Time: ";
pub const NBF_TAG: &str = "Not Before: ";
pub const RID_TAG: &str = "Request ID: ";

/// Labels in canonical order.
const TAGS: [&str; 8] = [
    URI_TAG,
    VERSION_TAG,
    CHAIN_TAG,
    NONCE_TAG,
    IAT_TAG,
    EXP_TAG,
    NBF_TAG,
    RID_TAG,
];

impl SiweMessageData {
    /// Serialize into the canonical message text without validating.
    #[must_use]
    pub fn to_message(&self) -> String {
        let mut out = String::new();

        match &self.scheme {
            Some(scheme) => out.push_str(&format!("{scheme}://{}{PREAMBLE}\n", self.domain)),
            None => out.push_str(&format!("{}{PREAMBLE}\n", self.domain)),
        }
        out.push_str(&self.address);
        out.push('\n');
        out.push('\n');
        if let Some(statement) = &self.statement {
            out.push_str(statement);
            out.push('\n');
        }
        out.push('\n');

        out.push_str(&format!("{URI_TAG}{}\n", self.uri));
        out.push_str(&format!("{VERSION_TAG}{}\n", self.version));
        out.push_str(&format!("{CHAIN_TAG}{}\n", self.chain_id));
        out.push_str(&format!("{NONCE_TAG}{}\n", self.nonce));
        out.push_str(&format!("{IAT_TAG}{}\n", self.issued_at));
        if let Some(expiration_time) = &self.expiration_time {
            out.push_str(&format!("{EXP_TAG}{expiration_time}\n"));
        }
        if let Some(not_before) = &self.not_before {
            out.push_str(&format!("{NBF_TAG}{not_before}\n"));
        }
        if let Some(request_id) = &self.request_id {
            out.push_str(&format!("{RID_TAG}{request_id}\n"));
        }

        out
    }
}

/// Validate `data` against `page` and `now`, then serialize it.
pub fn generate(
    data: &SiweMessageData,
    page: &PageContext,
    now: DateTime<Utc>,
) -> Result<String, SiweError> {
    validation::validate_message_data(data, page, now)?;
    Ok(data.to_message())
}

/// Parse a message in the canonical layout.
///
/// Required labels missing from the message fail with
/// [`SiweError::MissingField`] naming the label. Optional labels
/// (`Expiration Time`, `Not Before`, `Request ID`) and the statement may be
/// absent.
pub fn parse(message: &str) -> Result<SiweMessageData, SiweError> {
    let mut lines = message.split('\n');

    let header = lines
        .next()
        .filter(|line| line.ends_with(PREAMBLE))
        .ok_or(SiweError::MissingField(PREAMBLE))?;
    let origin = &header[..header.len() - PREAMBLE.len()];
    let (scheme, domain) = match origin.split_once("://") {
        Some((scheme, domain)) => (Some(scheme.to_string()), domain),
        None => (None, origin),
    };
    if domain.is_empty() {
        return Err(SiweError::InvalidField {
            label: "domain",
            value: origin.to_string(),
        });
    }

    let address = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or(SiweError::MissingField("address"))?;

    match lines.next() {
        Some("") => {}
        Some(other) => return Err(SiweError::UnexpectedLine(other.to_string())),
        None => return Err(SiweError::MissingField(URI_TAG)),
    }

    let mut rest = lines.peekable();
    let statement = match rest.peek() {
        Some(&line) if !line.is_empty() && !line.starts_with(URI_TAG) => {
            let statement = line.to_string();
            rest.next();
            if rest.peek() == Some(&"") {
                rest.next();
            }
            Some(statement)
        }
        Some(&"") => {
            rest.next();
            None
        }
        _ => None,
    };

    let mut fields: [Option<&str>; 8] = [None; 8];
    for line in rest {
        if line.is_empty() {
            continue;
        }
        let Some(index) = TAGS.iter().position(|tag| line.starts_with(tag)) else {
            return Err(SiweError::UnexpectedLine(line.to_string()));
        };
        if fields[index].is_some() {
            return Err(SiweError::DuplicateField(TAGS[index]));
        }
        fields[index] = Some(&line[TAGS[index].len()..]);
    }

    let required = |index: usize| fields[index].ok_or(SiweError::MissingField(TAGS[index]));
    let uri = required(0)?;
    let version = required(1)?;
    let chain_id = required(2)?;
    let nonce = required(3)?;
    let issued_at = required(4)?;

    Ok(SiweMessageData {
        scheme,
        domain: domain.to_string(),
        address: address.to_string(),
        statement,
        uri: uri.to_string(),
        version: version.parse().map_err(|_| SiweError::InvalidField {
            label: VERSION_TAG,
            value: version.to_string(),
        })?,
        chain_id: chain_id.parse().map_err(|_| SiweError::InvalidField {
            label: CHAIN_TAG,
            value: chain_id.to_string(),
        })?,
        nonce: nonce.to_string(),
        issued_at: issued_at.to_string(),
        expiration_time: fields[5].map(str::to_string),
        not_before: fields[6].map(str::to_string),
        request_id: fields[7].map(str::to_string),
    })
}
