/// PostgREST table operations: filtered select, insert with representation, delete
use crate::error::{Result, SupabaseError};
use crate::SupabaseClient;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn as_str(&self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// A PostgREST table
#[derive(Clone)]
pub struct Table {
    client: SupabaseClient,
    name: String,
}

impl Table {
    pub(crate) fn new(client: SupabaseClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    /// Start a select of the given columns (`*` for all)
    pub fn select(&self, columns: &str) -> SelectQuery {
        SelectQuery {
            table: self.clone(),
            params: vec![("select".to_string(), columns.to_string())],
        }
    }

    /// Start a delete; at least one filter is required before executing
    pub fn delete(&self) -> DeleteQuery {
        DeleteQuery {
            table: self.clone(),
            filters: Vec::new(),
        }
    }

    /// Insert rows and return them as stored by the database
    pub async fn insert<I, T>(&self, rows: &[I]) -> Result<Vec<T>>
    where
        I: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .http()
            .post(self.url())
            .header("Content-Profile", &self.client.config().schema)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SupabaseError::from_response(response).await);
        }

        Ok(response.json::<Vec<T>>().await?)
    }

    fn url(&self) -> String {
        self.client.config().rest_url(&self.name)
    }
}

/// Select builder mirroring `from(table).select(..).eq(..).order(..)`
pub struct SelectQuery {
    table: Table,
    params: Vec<(String, String)>,
}

impl SelectQuery {
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.params
            .push(("order".to_string(), format!("{}.{}", column, order.as_str())));
        self
    }

    pub async fn execute<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        let response = self
            .table
            .client
            .http()
            .get(self.table.url())
            .header("Accept-Profile", &self.table.client.config().schema)
            .query(&self.params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SupabaseError::from_response(response).await);
        }

        Ok(response.json::<Vec<T>>().await?)
    }
}

/// Delete builder; filters are combined with AND
pub struct DeleteQuery {
    table: Table,
    filters: Vec<(String, String)>,
}

impl DeleteQuery {
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub async fn execute(self) -> Result<()> {
        if self.filters.is_empty() {
            return Err(SupabaseError::UnfilteredDelete);
        }

        let response = self
            .table
            .client
            .http()
            .delete(self.table.url())
            .header("Content-Profile", &self.table.client.config().schema)
            .query(&self.filters)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SupabaseError::from_response(response).await);
        }

        Ok(())
    }
}
