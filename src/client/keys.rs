//! API access key management over NerdGraph. User and ingest keys live in
//! separate mutation buckets but share one record type.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use crate::client::types::{ApiAccessKey, ApiAccessKeyUpdate};
use crate::client::{Client, first_embedded_error};
use crate::error::{Error, Result};
use crate::tree::{as_object, int_of, list_at, object_at, string_of};

const KEY_FIELDS: &str = r#"
        id
        name
        notes
        type
        key
        ... on ApiAccessIngestKey {
            ingestType
        }"#;

const CURRENT_USER_QUERY: &str = r#"
query {
    actor {
        user {
            id
        }
    }
}"#;

/// The two API access key families. Ingest keys additionally carry an ingest
/// type (LICENSE or BROWSER).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    User,
    Ingest,
}

impl KeyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Ingest => "INGEST",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "INGEST" => Ok(Self::Ingest),
            other => Err(Error::InvalidApiKey(format!(
                "invalid key type: {other} (must be USER or INGEST)"
            ))),
        }
    }
}

impl Client {
    /// Searches keys by type, optionally scoped to one account. An empty type
    /// list searches both families.
    pub async fn search_api_keys(
        &self,
        types: &[KeyType],
        account_id: Option<i64>,
    ) -> Result<Vec<ApiAccessKey>> {
        let types: Vec<&str> = if types.is_empty() {
            vec![KeyType::User.as_str(), KeyType::Ingest.as_str()]
        } else {
            types.iter().map(|t| t.as_str()).collect()
        };

        let mut search = json!({ "types": types });
        if let Some(account_id) = account_id
            && account_id > 0
        {
            search["scope"] = json!({ "accountIds": [account_id] });
        }

        let query = format!(
            "query($query: ApiAccessKeySearchQuery!) {{\n    actor {{\n        apiAccess {{\n            keySearch(query: $query) {{\n                keys {{{KEY_FIELDS}\n                }}\n            }}\n        }}\n    }}\n}}"
        );

        let data = self.nerdgraph(&query, Some(json!({ "query": search }))).await?;

        let actor = object_at(&data, "actor")?;
        let api_access = object_at(actor, "apiAccess")?;
        let key_search = object_at(api_access, "keySearch")?;
        let elements = list_at(key_search, "keys")?;

        Ok(elements.iter().map(parse_api_access_key).collect())
    }

    pub async fn get_api_access_key(
        &self,
        key_id: &str,
        key_type: KeyType,
    ) -> Result<ApiAccessKey> {
        let query = format!(
            "query($id: ID!, $keyType: ApiAccessKeyType!) {{\n    actor {{\n        apiAccess {{\n            key(id: $id, keyType: $keyType) {{{KEY_FIELDS}\n            }}\n        }}\n    }}\n}}"
        );

        let data = self
            .nerdgraph(&query, Some(json!({ "id": key_id, "keyType": key_type.as_str() })))
            .await?;

        let actor = object_at(&data, "actor")?;
        let api_access = object_at(actor, "apiAccess")?;
        let Ok(key) = object_at(api_access, "key") else {
            return Err(Error::NotFound(format!("api key not found: {key_id}")));
        };

        Ok(parse_api_access_key_map(key))
    }

    /// Looks a key up by ID alone: the USER family is probed first, and only
    /// on a miss is the INGEST family tried.
    pub async fn find_api_access_key(&self, key_id: &str) -> Result<ApiAccessKey> {
        match self.get_api_access_key(key_id, KeyType::User).await {
            Ok(key) => Ok(key),
            Err(_) => self.get_api_access_key(key_id, KeyType::Ingest).await,
        }
    }

    pub async fn get_current_user_id(&self) -> Result<i64> {
        let data = self.nerdgraph(CURRENT_USER_QUERY, None).await?;
        let actor = object_at(&data, "actor")?;
        let user = object_at(actor, "user")?;
        Ok(int_of(user, "id"))
    }

    pub async fn create_user_api_key(
        &self,
        account_id: i64,
        user_id: i64,
        name: &str,
        notes: &str,
    ) -> Result<ApiAccessKey> {
        let keys = json!({
            "user": [{
                "accountId": account_id,
                "userId": user_id,
                "name": name,
                "notes": notes,
            }]
        });
        self.create_api_keys(keys).await
    }

    pub async fn create_ingest_api_key(
        &self,
        account_id: i64,
        ingest_type: &str,
        name: &str,
        notes: &str,
    ) -> Result<ApiAccessKey> {
        let keys = json!({
            "ingest": [{
                "accountId": account_id,
                "ingestType": ingest_type,
                "name": name,
                "notes": notes,
            }]
        });
        self.create_api_keys(keys).await
    }

    async fn create_api_keys(&self, keys: Value) -> Result<ApiAccessKey> {
        let mutation = format!(
            "mutation($keys: ApiAccessCreateInput!) {{\n    apiAccessCreateKeys(keys: $keys) {{\n        createdKeys {{{KEY_FIELDS}\n        }}\n        errors {{\n            message\n            type\n        }}\n    }}\n}}"
        );

        let data = self.nerdgraph(&mutation, Some(json!({ "keys": keys }))).await?;

        let payload = object_at(&data, "apiAccessCreateKeys")?;
        if let Some(message) = first_embedded_error(payload, &["message"]) {
            return Err(Error::GraphQl(format!("failed to create key: {message}")));
        }

        let created = list_at(payload, "createdKeys")?;
        match created.first() {
            Some(first) => Ok(parse_api_access_key(first)),
            None => Err(Error::Shape {
                key: "createdKeys",
            }),
        }
    }

    pub async fn update_api_access_key(
        &self,
        key_id: &str,
        key_type: KeyType,
        update: &ApiAccessKeyUpdate,
    ) -> Result<ApiAccessKey> {
        let mut fields = Map::new();
        fields.insert("keyId".to_string(), Value::String(key_id.to_string()));
        if let Some(name) = &update.name {
            fields.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(notes) = &update.notes {
            fields.insert("notes".to_string(), Value::String(notes.clone()));
        }

        let bucket = match key_type {
            KeyType::User => "user",
            KeyType::Ingest => "ingest",
        };
        let keys = json!({ bucket: [fields] });

        let mutation = format!(
            "mutation($keys: ApiAccessUpdateInput!) {{\n    apiAccessUpdateKeys(keys: $keys) {{\n        updatedKeys {{{KEY_FIELDS}\n        }}\n        errors {{\n            message\n        }}\n    }}\n}}"
        );

        let data = self.nerdgraph(&mutation, Some(json!({ "keys": keys }))).await?;

        let payload = object_at(&data, "apiAccessUpdateKeys")?;
        if let Some(message) = first_embedded_error(payload, &["message"]) {
            return Err(Error::GraphQl(format!("failed to update key: {message}")));
        }

        let updated = list_at(payload, "updatedKeys")?;
        match updated.first() {
            Some(first) => Ok(parse_api_access_key(first)),
            None => Err(Error::Shape {
                key: "updatedKeys",
            }),
        }
    }

    /// Deletes keys by ID. At least one ID across the two families is
    /// required. Returns the IDs the server confirmed deleted.
    pub async fn delete_api_access_keys(
        &self,
        user_key_ids: &[String],
        ingest_key_ids: &[String],
    ) -> Result<Vec<String>> {
        if user_key_ids.is_empty() && ingest_key_ids.is_empty() {
            return Err(Error::NotFound("no key IDs provided".to_string()));
        }

        let mut keys = Map::new();
        if !user_key_ids.is_empty() {
            keys.insert("userKeyIds".to_string(), json!(user_key_ids));
        }
        if !ingest_key_ids.is_empty() {
            keys.insert("ingestKeyIds".to_string(), json!(ingest_key_ids));
        }

        const MUTATION: &str = r#"
mutation($keys: ApiAccessDeleteInput!) {
    apiAccessDeleteKeys(keys: $keys) {
        deletedKeys {
            id
        }
        errors {
            message
        }
    }
}"#;

        let data = self.nerdgraph(MUTATION, Some(json!({ "keys": keys }))).await?;

        let payload = object_at(&data, "apiAccessDeleteKeys")?;
        if let Some(message) = first_embedded_error(payload, &["message"]) {
            return Err(Error::GraphQl(format!("failed to delete keys: {message}")));
        }

        let Ok(deleted) = list_at(payload, "deletedKeys") else {
            return Ok(Vec::new());
        };

        Ok(deleted
            .iter()
            .filter_map(as_object)
            .map(|key| string_of(key, "id"))
            .collect())
    }
}

fn parse_api_access_key(value: &Value) -> ApiAccessKey {
    match as_object(value) {
        Some(map) => parse_api_access_key_map(map),
        None => ApiAccessKey::default(),
    }
}

fn parse_api_access_key_map(map: &Map<String, Value>) -> ApiAccessKey {
    ApiAccessKey {
        id: string_of(map, "id"),
        name: string_of(map, "name"),
        notes: string_of(map, "notes"),
        key_type: string_of(map, "type"),
        key: string_of(map, "key"),
        ingest_type: string_of(map, "ingestType"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::client::keys::{KeyType, parse_api_access_key};
    use crate::error::Error;

    #[test]
    fn key_type_parses_case_insensitively() {
        assert_eq!("user".parse::<KeyType>().unwrap(), KeyType::User);
        assert_eq!("INGEST".parse::<KeyType>().unwrap(), KeyType::Ingest);
        assert!(matches!(
            "license".parse::<KeyType>(),
            Err(Error::InvalidApiKey(_))
        ));
    }

    #[test]
    fn parses_an_ingest_key_with_its_ingest_type() {
        let key = parse_api_access_key(&json!({
            "id": "k-1",
            "name": "browser key",
            "type": "INGEST",
            "key": "secret",
            "ingestType": "BROWSER",
        }));
        assert_eq!(key.id, "k-1");
        assert_eq!(key.key_type, "INGEST");
        assert_eq!(key.ingest_type, "BROWSER");
        assert!(key.notes.is_empty());
    }

    #[test]
    fn non_object_elements_become_empty_keys() {
        let key = parse_api_access_key(&json!("stray"));
        assert!(key.id.is_empty());
    }
}
