//! DynamoDB directory implementation.

use crate::account::AccountRecord;
use crate::directory::{Directory, DirectoryConfig};
use crate::{sdk, LetmeError, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use tracing::{debug, info};

const PROJECTION: &str = "#id, #name, #role, #region";

/// DynamoDB-backed directory.
pub struct DynamoDbDirectory {
    client: Option<Client>,
    table: String,
    profile: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
}

impl DynamoDbDirectory {
    /// Creates a new DynamoDB directory from configuration.
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            client: None,
            table: config.table,
            profile: config.source_profile,
            region: config.source_region,
            endpoint: config.endpoint,
        }
    }

    /// Scans the table, following pagination, optionally filtered on `name`.
    async fn scan(&self, name: Option<&str>) -> Result<Vec<AccountRecord>> {
        let client = self.client.as_ref().ok_or_else(|| {
            LetmeError::directory("dynamodb", "directory used before init()")
        })?;

        let mut records = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request = client
                .scan()
                .table_name(&self.table)
                .projection_expression(PROJECTION)
                .expression_attribute_names("#id", "id")
                .expression_attribute_names("#name", "name")
                .expression_attribute_names("#role", "role")
                .expression_attribute_names("#region", "region")
                .set_exclusive_start_key(start_key.take());

            if let Some(name) = name {
                request = request
                    .filter_expression("#name = :name")
                    .expression_attribute_values(":name", AttributeValue::S(name.to_string()));
            }

            let response = request.send().await.map_err(|e| {
                LetmeError::directory(
                    "dynamodb",
                    format!("scan {}: {}", self.table, DisplayErrorContext(&e)),
                )
            })?;

            for item in response.items() {
                records.push(item_to_record(item)?);
            }

            // A filtered page can be empty and still have more pages after it.
            start_key = response.last_evaluated_key().cloned();
            if start_key.is_none() {
                break;
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl Directory for DynamoDbDirectory {
    fn name(&self) -> &str {
        "dynamodb"
    }

    async fn init(&mut self) -> Result<()> {
        if self.table.is_empty() {
            return Err(LetmeError::Configuration(
                "no DynamoDB table configured for this context".to_string(),
            ));
        }

        let config = sdk::load_config(
            self.profile.as_deref(),
            self.region.as_deref(),
            self.endpoint.as_deref(),
        )
        .await;
        self.client = Some(Client::new(&config));
        debug!("DynamoDB directory ready for table {}", self.table);
        Ok(())
    }

    async fn lookup(&self, account: &str) -> Result<Option<AccountRecord>> {
        info!("Looking up account {} in table {}", account, self.table);
        let mut matches = self.scan(Some(account)).await?;
        if matches.len() > 1 {
            debug!("{} records named {}, using the first", matches.len(), account);
        }
        Ok((!matches.is_empty()).then(|| matches.swap_remove(0)))
    }

    async fn list(&self) -> Result<Vec<AccountRecord>> {
        self.scan(None).await
    }
}

/// Converts a scanned item into an [`AccountRecord`].
///
/// `role` and `region` accept a single string, a list of strings or a string
/// set; a missing attribute yields an empty list.
pub fn item_to_record(item: &HashMap<String, AttributeValue>) -> Result<AccountRecord> {
    let invalid = |msg: String| LetmeError::directory("dynamodb", msg);

    let name = match item.get("name") {
        Some(AttributeValue::S(s)) if !s.is_empty() => s.clone(),
        _ => return Err(invalid("item without a string 'name' attribute".to_string())),
    };

    let id = match item.get("id") {
        Some(AttributeValue::N(n)) | Some(AttributeValue::S(n)) => n
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(format!("account {name}: invalid id {n:?}: {e}")))?,
        _ => return Err(invalid(format!("account {name}: missing numeric 'id'"))),
    };

    Ok(AccountRecord::new(
        id,
        name,
        string_list(item.get("role")),
        string_list(item.get("region")),
    ))
}

fn string_list(value: Option<&AttributeValue>) -> Vec<String> {
    match value {
        Some(AttributeValue::S(s)) if !s.is_empty() => vec![s.clone()],
        Some(AttributeValue::Ss(values)) => values.clone(),
        Some(AttributeValue::L(values)) => values
            .iter()
            .filter_map(|v| match v {
                AttributeValue::S(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
