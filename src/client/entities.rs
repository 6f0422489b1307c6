//! Entity search over NerdGraph.

use serde_json::json;

use crate::client::Client;
use crate::client::types::Entity;
use crate::error::Result;
use crate::identifiers::EntityGuid;
use crate::tree::{as_object, int_of, list_at, object_at, string_of};

const ENTITY_SEARCH_QUERY: &str = r#"
query($query: String!) {
    actor {
        entitySearch(query: $query) {
            results {
                entities {
                    guid
                    name
                    type
                    entityType
                    domain
                    accountId
                }
            }
        }
    }
}"#;

impl Client {
    /// Searches for entities matching an entity-search query expression.
    /// An empty `entities` list is a valid zero-result answer, distinct from
    /// a malformed response.
    pub async fn search_entities(&self, query: &str) -> Result<Vec<Entity>> {
        let data = self
            .nerdgraph(ENTITY_SEARCH_QUERY, Some(json!({ "query": query })))
            .await?;

        let actor = object_at(&data, "actor")?;
        let entity_search = object_at(actor, "entitySearch")?;
        let results = object_at(entity_search, "results")?;
        let entities = list_at(results, "entities")?;

        let mut found = Vec::with_capacity(entities.len());
        for element in entities {
            // Malformed elements are dropped, not counted as errors.
            let Some(entity) = as_object(element) else {
                continue;
            };
            found.push(Entity {
                guid: EntityGuid::new(string_of(entity, "guid")),
                name: string_of(entity, "name"),
                entity_kind: string_of(entity, "type"),
                entity_type: string_of(entity, "entityType"),
                domain: string_of(entity, "domain"),
                account_id: int_of(entity, "accountId"),
            });
        }

        Ok(found)
    }
}
