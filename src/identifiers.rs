use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An opaque New Relic entity GUID: base64 of
/// `{accountId}|{domain}|{type}|{entityId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EntityGuid(pub String);

impl EntityGuid {
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the GUID into its four pipe-delimited parts.
    pub fn decode(&self) -> Result<GuidParts> {
        let decoded = BASE64_STANDARD
            .decode(&self.0)
            .map_err(|err| Error::InvalidGuid(err.to_string()))?;
        let payload = String::from_utf8(decoded)
            .map_err(|_| Error::InvalidGuid("payload is not valid UTF-8".to_string()))?;

        let parts: Vec<&str> = payload.split('|').collect();
        if parts.len() != 4 {
            return Err(Error::InvalidGuid(format!(
                "expected 4 parts, got {}",
                parts.len()
            )));
        }

        Ok(GuidParts {
            account_id: parts[0].to_string(),
            domain: parts[1].to_string(),
            entity_type: parts[2].to_string(),
            entity_id: parts[3].to_string(),
        })
    }

    /// Extracts the numeric application ID. Fails unless the GUID belongs to
    /// an APM application.
    pub fn app_id(&self) -> Result<String> {
        self.decode()?.app_id()
    }
}

impl fmt::Display for EntityGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityGuid {
    fn from(guid: String) -> Self {
        Self(guid)
    }
}

/// The decoded fields of an entity GUID, in their fixed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidParts {
    pub account_id: String,
    pub domain: String,
    pub entity_type: String,
    pub entity_id: String,
}

impl GuidParts {
    pub fn app_id(&self) -> Result<String> {
        if self.domain != "APM" || self.entity_type != "APPLICATION" {
            return Err(Error::InvalidGuid(format!(
                "GUID is not for an APM application (domain={}, type={})",
                self.domain, self.entity_type
            )));
        }
        Ok(self.entity_id.clone())
    }
}

const BASE64_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

/// Cheap pre-filter for GUID-shaped strings: 40+ chars, base64 alphabet only.
/// False positives are expected; callers must tolerate a failed decode.
pub fn looks_like_guid(input: &str) -> bool {
    input.len() >= 40 && input.chars().all(|c| BASE64_ALPHABET.contains(c))
}

/// A decimal-string account identifier. Empty is a distinct "unset" state,
/// not a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Account IDs must be base-10 integers strictly greater than zero.
    pub fn validate(&self) -> Result<()> {
        self.as_int().map(|_| ())
    }

    pub fn as_int(&self) -> Result<i64> {
        if self.0.is_empty() {
            return Err(Error::InvalidAccountId(
                "account ID cannot be empty".to_string(),
            ));
        }

        let value: i64 = self.0.parse().map_err(|_| {
            Error::InvalidAccountId(format!("invalid account ID {:?}: must be numeric", self.0))
        })?;

        if value <= 0 {
            return Err(Error::InvalidAccountId(format!(
                "invalid account ID {:?}: must be a positive number",
                self.0
            )));
        }

        Ok(value)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Validates an API key. Length rules are hard errors; a missing `NRAK-`
/// prefix only yields a warning the caller should surface without blocking.
pub fn validate_api_key(key: &str) -> Result<Option<String>> {
    if key.is_empty() {
        return Err(Error::InvalidApiKey("API key cannot be empty".to_string()));
    }

    if key.len() < 16 {
        return Err(Error::InvalidApiKey(
            "API key too short: minimum 16 characters".to_string(),
        ));
    }

    if !key.starts_with("NRAK-") {
        return Ok(Some(
            "API key does not start with 'NRAK-' (expected for User API keys)".to_string(),
        ));
    }

    Ok(None)
}

/// The two New Relic regions. Each maps to a fixed base-URL set; there is no
/// other region-dependent behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "EU")]
    Eu,
}

/// The base URLs the client derives from the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub rest: &'static str,
    pub nerdgraph: &'static str,
    pub synthetics: &'static str,
}

const US_ENDPOINTS: Endpoints = Endpoints {
    rest: "https://api.newrelic.com/v2",
    nerdgraph: "https://api.newrelic.com/graphql",
    synthetics: "https://synthetics.newrelic.com/synthetics/api/v3",
};

const EU_ENDPOINTS: Endpoints = Endpoints {
    rest: "https://api.eu.newrelic.com/v2",
    nerdgraph: "https://api.eu.newrelic.com/graphql",
    synthetics: "https://synthetics.eu.newrelic.com/synthetics/api/v3",
};

impl Region {
    pub fn endpoints(self) -> Endpoints {
        match self {
            Self::Us => US_ENDPOINTS,
            Self::Eu => EU_ENDPOINTS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Eu => "EU",
        }
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        match input.to_ascii_uppercase().as_str() {
            "US" => Ok(Self::Us),
            "EU" => Ok(Self::Eu),
            other => Err(Error::InvalidRegion(format!(
                "invalid region {other:?}: must be US or EU"
            ))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use crate::identifiers::{
        AccountId, EntityGuid, Region, looks_like_guid, validate_api_key,
    };

    fn encode_guid(account: &str, domain: &str, entity_type: &str, entity_id: &str) -> EntityGuid {
        let payload = format!("{account}|{domain}|{entity_type}|{entity_id}");
        EntityGuid::new(STANDARD.encode(payload))
    }

    #[test]
    fn guid_round_trips_through_encode_and_decode() {
        let guid = encode_guid("1234567", "APM", "APPLICATION", "987654321");
        let parts = guid.decode().expect("valid guid");

        assert_eq!(parts.account_id, "1234567");
        assert_eq!(parts.domain, "APM");
        assert_eq!(parts.entity_type, "APPLICATION");
        assert_eq!(parts.entity_id, "987654321");
    }

    #[test]
    fn decoding_invalid_base64_fails() {
        let error = EntityGuid::new("not base64!!!").decode().expect_err("must fail");
        assert!(error.to_string().starts_with("invalid GUID format"));
    }

    #[test]
    fn decoding_wrong_part_count_fails() {
        let guid = EntityGuid::new(STANDARD.encode("only|three|parts"));
        let error = guid.decode().expect_err("must fail");
        assert!(error.to_string().contains("expected 4 parts, got 3"));
    }

    #[test]
    fn app_id_extraction_requires_apm_application() {
        let dashboard = encode_guid("1234567", "VIZ", "DASHBOARD", "42");
        let error = dashboard.app_id().expect_err("wrong domain must fail");
        assert!(error.to_string().contains("domain=VIZ"));
        assert!(error.to_string().contains("type=DASHBOARD"));

        let app = encode_guid("1234567", "APM", "APPLICATION", "42");
        assert_eq!(app.app_id().expect("valid"), "42");
    }

    #[test]
    fn guid_heuristic_checks_length_and_alphabet() {
        assert!(looks_like_guid(
            "MTIzNDU2N3xBUE18QVBQTElDQVRJT058OTg3NjU0MzIx"
        ));
        assert!(!looks_like_guid("short"));
        assert!(!looks_like_guid(
            "has spaces and is otherwise long enough to pass the length check"
        ));
    }

    #[test]
    fn account_id_zero_is_rejected() {
        let error = AccountId::new("0").as_int().expect_err("zero must fail");
        assert!(error.to_string().contains("must be a positive number"));
    }

    #[test]
    fn account_id_parses_positive_integers() {
        assert_eq!(AccountId::new("12345").as_int().expect("valid"), 12345);
    }

    #[test]
    fn account_id_distinguishes_empty_from_non_numeric() {
        let empty = AccountId::new("").as_int().expect_err("empty must fail");
        assert_eq!(empty.to_string(), "account ID cannot be empty");
        assert!(AccountId::new("").is_empty());

        let garbage = AccountId::new("abc").as_int().expect_err("must fail");
        assert!(garbage.to_string().contains("must be numeric"));
    }

    #[test]
    fn api_key_validation_is_two_tier() {
        assert!(validate_api_key("").is_err());
        assert!(validate_api_key("tooshort").is_err());

        let warning = validate_api_key("0123456789abcdef0123").expect("long enough");
        assert!(warning.expect("warning expected").contains("NRAK-"));

        let clean = validate_api_key("NRAK-0123456789ABCDEF").expect("valid");
        assert!(clean.is_none());
    }

    #[test]
    fn regions_map_to_fixed_endpoint_sets() {
        let us: Region = "us".parse().expect("case-insensitive");
        assert_eq!(us, Region::Us);
        assert!(us.endpoints().rest.starts_with("https://api.newrelic.com"));

        let eu: Region = "EU".parse().expect("valid");
        assert!(eu.endpoints().nerdgraph.contains("api.eu.newrelic.com"));

        assert!("APAC".parse::<Region>().is_err());
    }
}
