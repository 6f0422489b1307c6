//! Resolution from a user-supplied application identifier (numeric ID, entity
//! GUID, or name) down to the numeric APM application ID the REST API wants.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::identifiers::{EntityGuid, looks_like_guid};

impl Client {
    /// Resolves an identifier to a numeric application ID. All-digit input is
    /// returned as-is without any request. GUID-shaped input is decoded
    /// locally; a decode failure falls through to name search rather than
    /// erroring, since a real name can be GUID-shaped.
    pub async fn resolve_app_id(&self, identifier: &str) -> Result<String> {
        if is_numeric(identifier) {
            return Ok(identifier.to_string());
        }

        if looks_like_guid(identifier)
            && let Ok(app_id) = EntityGuid::new(identifier).app_id()
        {
            return Ok(app_id);
        }

        self.resolve_app_name(identifier).await
    }

    async fn resolve_app_name(&self, name: &str) -> Result<String> {
        let search = format!(
            "name = '{}' AND domain = 'APM' AND type = 'APPLICATION'",
            escape_search_value(name)
        );
        let entities = self.search_entities(&search).await?;

        match entities.len() {
            0 => Err(Error::NotFound(format!(
                "no APM application found with name: {name}"
            ))),
            1 => entities[0].guid.app_id(),
            _ => Err(Error::Ambiguous(format!(
                "multiple applications found with name '{name}', please use --guid or app ID"
            ))),
        }
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Escapes a value for inclusion in an entity-search expression's
/// single-quoted string literal.
fn escape_search_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
