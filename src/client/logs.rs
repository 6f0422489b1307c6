//! Log parsing rule management over NerdGraph. The update path is
//! fetch-merge-write: the current rule is read back first so a partial patch
//! never blanks the untouched fields.

use serde_json::{Map, Value, json};

use crate::client::types::{LogParsingRule, LogParsingRuleUpdate};
use crate::client::{Client, first_embedded_error};
use crate::error::{Error, Result};
use crate::tree::{as_object, bool_of, list_at, object_at, string_of};

const LIST_RULES_QUERY: &str = r#"
query($accountId: Int!) {
    actor {
        account(id: $accountId) {
            logConfigurations {
                parsingRules {
                    id
                    description
                    enabled
                    grok
                    lucene
                    nrql
                    updatedAt
                    deleted
                }
            }
        }
    }
}"#;

const CREATE_RULE_MUTATION: &str = r#"
mutation($accountId: Int!, $rule: LogConfigurationsParsingRuleConfiguration!) {
    logConfigurationsCreateParsingRule(accountId: $accountId, rule: $rule) {
        rule {
            id
            description
            enabled
            grok
            lucene
            nrql
            updatedAt
        }
        errors {
            message
            type
        }
    }
}"#;

const UPDATE_RULE_MUTATION: &str = r#"
mutation($accountId: Int!, $id: ID!, $rule: LogConfigurationsParsingRuleConfiguration!) {
    logConfigurationsUpdateParsingRule(accountId: $accountId, id: $id, rule: $rule) {
        rule {
            id
            description
            enabled
            grok
            lucene
            nrql
            updatedAt
        }
        errors {
            message
            type
        }
    }
}"#;

const DELETE_RULE_MUTATION: &str = r#"
mutation($accountId: Int!, $id: ID!) {
    logConfigurationsDeleteParsingRule(accountId: $accountId, id: $id) {
        errors {
            message
            type
        }
    }
}"#;

impl Client {
    /// Lists the account's parsing rules. Rules the server still returns but
    /// marks `deleted` are filtered out.
    pub async fn list_log_parsing_rules(&self) -> Result<Vec<LogParsingRule>> {
        let account_id = self.account_id_int()?;
        let data = self
            .nerdgraph(LIST_RULES_QUERY, Some(json!({ "accountId": account_id })))
            .await?;

        let actor = object_at(&data, "actor")?;
        let account = object_at(actor, "account")?;
        let log_configurations = object_at(account, "logConfigurations")?;
        let elements = list_at(log_configurations, "parsingRules")?;

        let mut rules = Vec::new();
        for element in elements {
            let Some(rule) = as_object(element) else {
                continue;
            };
            if bool_of(rule, "deleted") {
                continue;
            }
            rules.push(parse_log_rule(rule));
        }

        Ok(rules)
    }

    pub async fn create_log_parsing_rule(
        &self,
        description: &str,
        grok: &str,
        nrql: &str,
        enabled: bool,
        lucene: &str,
    ) -> Result<LogParsingRule> {
        let account_id = self.account_id_int()?;
        let variables = json!({
            "accountId": account_id,
            "rule": {
                "description": description,
                "enabled": enabled,
                "grok": grok,
                "lucene": lucene,
                "nrql": nrql,
            },
        });

        let data = self.nerdgraph(CREATE_RULE_MUTATION, Some(variables)).await?;

        let payload = object_at(&data, "logConfigurationsCreateParsingRule")?;
        if let Some(message) = first_embedded_error(payload, &["message"]) {
            return Err(Error::GraphQl(format!("failed to create rule: {message}")));
        }

        let rule = object_at(payload, "rule")?;
        Ok(parse_log_rule(rule))
    }

    /// Updates a rule by first reading the current rule list, overlaying the
    /// set fields of `update`, and writing the merged rule back. Two requests;
    /// a write racing between them wins or loses whole.
    pub async fn update_log_parsing_rule(
        &self,
        rule_id: &str,
        update: &LogParsingRuleUpdate,
    ) -> Result<LogParsingRule> {
        let account_id = self.account_id_int()?;

        let existing = self.list_log_parsing_rules().await?;
        let Some(current) = existing.into_iter().find(|rule| rule.id == rule_id) else {
            return Err(Error::NotFound(format!(
                "log parsing rule not found: {rule_id}"
            )));
        };

        let merged = merge_rule(&current, update);
        let variables = json!({
            "accountId": account_id,
            "id": rule_id,
            "rule": {
                "description": merged.description,
                "enabled": merged.enabled,
                "grok": merged.grok,
                "lucene": merged.lucene,
                "nrql": merged.nrql,
            },
        });

        let data = self.nerdgraph(UPDATE_RULE_MUTATION, Some(variables)).await?;

        let payload = object_at(&data, "logConfigurationsUpdateParsingRule")?;
        if let Some(message) = first_embedded_error(payload, &["message"]) {
            return Err(Error::GraphQl(format!("failed to update rule: {message}")));
        }

        let rule = object_at(payload, "rule")?;
        Ok(parse_log_rule(rule))
    }

    pub async fn delete_log_parsing_rule(&self, rule_id: &str) -> Result<()> {
        let account_id = self.account_id_int()?;
        let data = self
            .nerdgraph(
                DELETE_RULE_MUTATION,
                Some(json!({ "accountId": account_id, "id": rule_id })),
            )
            .await?;

        let payload = object_at(&data, "logConfigurationsDeleteParsingRule")?;
        if let Some(message) = first_embedded_error(payload, &["message"]) {
            return Err(Error::GraphQl(format!("failed to delete rule: {message}")));
        }

        Ok(())
    }
}

fn merge_rule(current: &LogParsingRule, update: &LogParsingRuleUpdate) -> LogParsingRule {
    LogParsingRule {
        id: current.id.clone(),
        description: update
            .description
            .clone()
            .unwrap_or_else(|| current.description.clone()),
        enabled: update.enabled.unwrap_or(current.enabled),
        grok: update.grok.clone().unwrap_or_else(|| current.grok.clone()),
        lucene: update
            .lucene
            .clone()
            .unwrap_or_else(|| current.lucene.clone()),
        nrql: update.nrql.clone().unwrap_or_else(|| current.nrql.clone()),
        updated_at: current.updated_at.clone(),
    }
}

fn parse_log_rule(rule: &Map<String, Value>) -> LogParsingRule {
    LogParsingRule {
        id: string_of(rule, "id"),
        description: string_of(rule, "description"),
        enabled: bool_of(rule, "enabled"),
        grok: string_of(rule, "grok"),
        lucene: string_of(rule, "lucene"),
        nrql: string_of(rule, "nrql"),
        updated_at: string_of(rule, "updatedAt"),
    }
}

#[cfg(test)]
mod tests {
    use crate::client::logs::merge_rule;
    use crate::client::types::{LogParsingRule, LogParsingRuleUpdate};

    fn current() -> LogParsingRule {
        LogParsingRule {
            id: "rule-001".to_string(),
            description: "nginx access".to_string(),
            enabled: true,
            grok: "%{IP:client}".to_string(),
            lucene: "logtype:nginx".to_string(),
            nrql: "SELECT * FROM Log".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let merged = merge_rule(
            &current(),
            &LogParsingRuleUpdate {
                description: Some("updated".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(merged.description, "updated");
        assert!(merged.enabled);
        assert_eq!(merged.grok, "%{IP:client}");
        assert_eq!(merged.lucene, "logtype:nginx");
    }

    #[test]
    fn merge_can_disable_a_rule() {
        let merged = merge_rule(
            &current(),
            &LogParsingRuleUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        );
        assert!(!merged.enabled);
        assert_eq!(merged.description, "nginx access");
    }
}
