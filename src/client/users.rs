//! User management queries. NerdGraph groups users under authentication
//! domains; both operations flatten that two-level grouping into a single
//! list, annotating each user with its source domain name.

use serde_json::{Map, Value};

use crate::client::Client;
use crate::client::types::User;
use crate::error::{Error, Result};
use crate::tree::{as_object, list_at, object_at, string_of};

const LIST_USERS_QUERY: &str = r#"
{
    actor {
        organization {
            userManagement {
                authenticationDomains {
                    authenticationDomains {
                        id
                        name
                        users {
                            users {
                                id
                                name
                                email
                                type { displayName }
                            }
                        }
                    }
                }
            }
        }
    }
}"#;

const GET_USER_QUERY: &str = r#"
{
    actor {
        organization {
            userManagement {
                authenticationDomains {
                    authenticationDomains {
                        name
                        users {
                            users {
                                id
                                name
                                email
                                type { displayName }
                                groups { groups { displayName } }
                            }
                        }
                    }
                }
            }
        }
    }
}"#;

impl Client {
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let data = self.nerdgraph(LIST_USERS_QUERY, None).await?;
        flatten_users(&data)
    }

    /// Fetches a single user by ID. The API offers no direct lookup, so this
    /// flattens the same domain grouping and scans for a match; "not found"
    /// also covers the case where domains exist but hold no users.
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        let data = self.nerdgraph(GET_USER_QUERY, None).await?;
        flatten_users(&data)?
            .into_iter()
            .find(|user| user.id == user_id)
            .ok_or_else(|| Error::NotFound("user not found".to_string()))
    }
}

fn flatten_users(data: &Map<String, Value>) -> Result<Vec<User>> {
    let actor = object_at(data, "actor")?;
    let organization = object_at(actor, "organization")?;
    let user_management = object_at(organization, "userManagement")?;
    let domains_container = object_at(user_management, "authenticationDomains")?;
    let domains = list_at(domains_container, "authenticationDomains")?;

    let mut users = Vec::new();
    for element in domains {
        let Some(domain) = as_object(element) else {
            continue;
        };
        let domain_name = string_of(domain, "name");

        // A domain with a malformed users container is skipped, not an error.
        let Some(container) = domain.get("users").and_then(Value::as_object) else {
            continue;
        };
        let Some(domain_users) = container.get("users").and_then(Value::as_array) else {
            continue;
        };

        for element in domain_users {
            let Some(user) = as_object(element) else {
                continue;
            };
            users.push(User {
                id: string_of(user, "id"),
                name: string_of(user, "name"),
                email: string_of(user, "email"),
                user_type: user
                    .get("type")
                    .and_then(Value::as_object)
                    .map(|t| string_of(t, "displayName"))
                    .unwrap_or_default(),
                groups: group_names(user),
                authentication_domain: domain_name.clone(),
            });
        }
    }

    Ok(users)
}

fn group_names(user: &Map<String, Value>) -> Vec<String> {
    let Some(container) = user.get("groups").and_then(Value::as_object) else {
        return Vec::new();
    };
    let Some(groups) = container.get("groups").and_then(Value::as_array) else {
        return Vec::new();
    };

    groups
        .iter()
        .filter_map(|element| as_object(element).map(|group| string_of(group, "displayName")))
        .collect()
}
