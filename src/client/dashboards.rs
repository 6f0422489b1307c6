//! Dashboard operations over NerdGraph: entity-search listing, full detail
//! lookup, and the create/update/delete mutations.

use serde_json::{Map, Value, json};

use crate::client::types::{Dashboard, DashboardDetail, DashboardInput, DashboardPage, DashboardWidget};
use crate::client::{Client, first_embedded_error};
use crate::error::{Error, Result};
use crate::identifiers::EntityGuid;
use crate::tree::{as_object, int_of, list_at, object_at, string_of};

const LIST_DASHBOARDS_QUERY: &str = r#"
query($query: String!) {
    actor {
        entitySearch(query: $query) {
            results {
                entities {
                    guid
                    name
                    accountId
                    ... on DashboardEntityOutline {
                        dashboardParentGuid
                    }
                }
            }
        }
    }
}"#;

const GET_DASHBOARD_QUERY: &str = r#"
query($guid: EntityGuid!) {
    actor {
        entity(guid: $guid) {
            ... on DashboardEntity {
                guid
                name
                description
                permissions
                pages {
                    guid
                    name
                    widgets {
                        id
                        title
                        visualization { id }
                        rawConfiguration
                    }
                }
            }
        }
    }
}"#;

const DASHBOARD_RESULT_FIELDS: &str = r#"
            entityResult {
                guid
                name
                description
                permissions
                pages {
                    guid
                    name
                    widgets {
                        id
                        title
                        visualization { id }
                        rawConfiguration
                    }
                }
            }
            errors {
                description
                type
            }"#;

const DELETE_DASHBOARD_MUTATION: &str = r#"
mutation($guid: EntityGuid!) {
    dashboardDelete(guid: $guid) {
        status
        errors {
            description
            type
        }
    }
}"#;

impl Client {
    pub async fn list_dashboards(&self) -> Result<Vec<Dashboard>> {
        let account_id = self.account_id_int()?;
        let search = format!("type = 'DASHBOARD' AND accountId = {account_id}");

        let data = self
            .nerdgraph(LIST_DASHBOARDS_QUERY, Some(json!({ "query": search })))
            .await?;

        let actor = object_at(&data, "actor")?;
        let entity_search = object_at(actor, "entitySearch")?;
        let results = object_at(entity_search, "results")?;
        let entities = list_at(results, "entities")?;

        let mut dashboards = Vec::with_capacity(entities.len());
        for element in entities {
            let Some(entity) = as_object(element) else {
                continue;
            };
            dashboards.push(Dashboard {
                guid: EntityGuid::new(string_of(entity, "guid")),
                name: string_of(entity, "name"),
                account_id: int_of(entity, "accountId"),
                description: String::new(),
            });
        }

        Ok(dashboards)
    }

    pub async fn get_dashboard(&self, guid: &EntityGuid) -> Result<DashboardDetail> {
        let data = self
            .nerdgraph(GET_DASHBOARD_QUERY, Some(json!({ "guid": guid.as_str() })))
            .await?;

        let actor = object_at(&data, "actor")?;
        let entity = match object_at(actor, "entity") {
            Ok(entity) => entity,
            Err(_) => return Err(Error::NotFound("dashboard not found".to_string())),
        };

        Ok(parse_dashboard_entity(entity))
    }

    pub async fn create_dashboard(&self, input: &DashboardInput) -> Result<DashboardDetail> {
        let account_id = self.account_id_int()?;
        let mutation = format!(
            "mutation($accountId: Int!, $dashboard: DashboardInput!) {{\n    dashboardCreate(accountId: $accountId, dashboard: $dashboard) {{{DASHBOARD_RESULT_FIELDS}\n    }}\n}}"
        );

        let mut dashboard = dashboard_variable(input)?;
        // The API requires permissions on create; default to the broadest set.
        if !dashboard.contains_key("permissions") {
            dashboard.insert(
                "permissions".to_string(),
                Value::String("PUBLIC_READ_WRITE".to_string()),
            );
        }

        let data = self
            .nerdgraph(
                &mutation,
                Some(json!({ "accountId": account_id, "dashboard": dashboard })),
            )
            .await?;

        let payload = object_at(&data, "dashboardCreate")?;
        if let Some(message) = first_embedded_error(payload, &["description", "message"]) {
            return Err(Error::GraphQl(format!(
                "failed to create dashboard: {message}"
            )));
        }

        let entity = object_at(payload, "entityResult")?;
        Ok(parse_dashboard_entity(entity))
    }

    pub async fn update_dashboard(
        &self,
        guid: &EntityGuid,
        input: &DashboardInput,
    ) -> Result<DashboardDetail> {
        let mutation = format!(
            "mutation($guid: EntityGuid!, $dashboard: DashboardInput!) {{\n    dashboardUpdate(guid: $guid, dashboard: $dashboard) {{{DASHBOARD_RESULT_FIELDS}\n    }}\n}}"
        );

        let dashboard = dashboard_variable(input)?;
        let data = self
            .nerdgraph(
                &mutation,
                Some(json!({ "guid": guid.as_str(), "dashboard": dashboard })),
            )
            .await?;

        let payload = object_at(&data, "dashboardUpdate")?;
        if let Some(message) = first_embedded_error(payload, &["description", "message"]) {
            return Err(Error::GraphQl(format!(
                "failed to update dashboard: {message}"
            )));
        }

        let entity = object_at(payload, "entityResult")?;
        Ok(parse_dashboard_entity(entity))
    }

    pub async fn delete_dashboard(&self, guid: &EntityGuid) -> Result<()> {
        let data = self
            .nerdgraph(
                DELETE_DASHBOARD_MUTATION,
                Some(json!({ "guid": guid.as_str() })),
            )
            .await?;

        let payload = object_at(&data, "dashboardDelete")?;
        let status = string_of(payload, "status");
        if status != "SUCCESS" {
            if let Some(message) = first_embedded_error(payload, &["description", "message"]) {
                return Err(Error::GraphQl(format!(
                    "failed to delete dashboard: {message}"
                )));
            }
            return Err(Error::GraphQl(format!(
                "failed to delete dashboard: status {status}"
            )));
        }

        Ok(())
    }
}

fn dashboard_variable(input: &DashboardInput) -> Result<Map<String, Value>> {
    match serde_json::to_value(input)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn parse_dashboard_entity(entity: &Map<String, Value>) -> DashboardDetail {
    let mut detail = DashboardDetail {
        guid: EntityGuid::new(string_of(entity, "guid")),
        name: string_of(entity, "name"),
        description: string_of(entity, "description"),
        permissions: string_of(entity, "permissions"),
        pages: Vec::new(),
    };

    let Some(pages) = entity.get("pages").and_then(Value::as_array) else {
        return detail;
    };

    for element in pages {
        let Some(page) = as_object(element) else {
            continue;
        };
        let mut dashboard_page = DashboardPage {
            guid: EntityGuid::new(string_of(page, "guid")),
            name: string_of(page, "name"),
            widgets: Vec::new(),
        };

        if let Some(widgets) = page.get("widgets").and_then(Value::as_array) {
            for element in widgets {
                let Some(widget) = as_object(element) else {
                    continue;
                };
                dashboard_page.widgets.push(DashboardWidget {
                    id: string_of(widget, "id"),
                    title: string_of(widget, "title"),
                    visualization: widget
                        .get("visualization")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                    configuration: widget
                        .get("rawConfiguration")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                });
            }
        }

        detail.pages.push(dashboard_page);
    }

    detail
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::client::dashboards::parse_dashboard_entity;
    use crate::client::types::DashboardInput;

    #[test]
    fn parses_pages_and_widgets_by_value() {
        let entity = json!({
            "guid": "abc",
            "name": "Service health",
            "description": "",
            "permissions": "PUBLIC_READ_ONLY",
            "pages": [
                {
                    "guid": "page-1",
                    "name": "Overview",
                    "widgets": [
                        {
                            "id": "w1",
                            "title": "Errors",
                            "visualization": {"id": "viz.line"},
                            "rawConfiguration": {"nrqlQueries": []}
                        },
                        "not a widget"
                    ]
                },
                42
            ]
        });

        let detail = parse_dashboard_entity(entity.as_object().expect("object"));
        assert_eq!(detail.name, "Service health");
        assert_eq!(detail.pages.len(), 1);
        assert_eq!(detail.pages[0].widgets.len(), 1);
        assert_eq!(detail.pages[0].widgets[0].title, "Errors");
        assert_eq!(
            detail.pages[0].widgets[0].visualization["id"],
            json!("viz.line")
        );
    }

    #[test]
    fn missing_pages_yield_an_empty_detail() {
        let entity = json!({"guid": "abc", "name": "Bare"});
        let detail = parse_dashboard_entity(entity.as_object().expect("object"));
        assert!(detail.pages.is_empty());
    }

    #[test]
    fn dashboard_input_omits_empty_optional_fields() {
        let input = DashboardInput {
            name: "New dashboard".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&input).expect("serializable");
        let object = value.as_object().expect("object");
        assert!(!object.contains_key("description"));
        assert!(!object.contains_key("permissions"));
    }
}
