//! # Query Service
//!
//! The remote collaborator that lists collections, serves predefined
//! queries and executes both query forms. [`QueryService`] is the seam the
//! session runs against; [`HttpQueryService`] is the real implementation.

use async_trait::async_trait;

use tdc_core::request::{COLLECTIONS_PATH, PREDEFINED_PATH};
use tdc_core::{PredefinedQueries, Query, QueryRequest, ResultPage, SimpleQuery};

use crate::http::ApiClient;
use crate::ClientError;

#[async_trait]
pub trait QueryService: Send + Sync {
    /// Names of the collections the service can query.
    async fn collections(&self) -> Result<Vec<String>, ClientError>;

    async fn predefined_queries(&self) -> Result<PredefinedQueries, ClientError>;

    /// Run an advanced query.
    async fn execute(&self, query: &Query) -> Result<ResultPage, ClientError>;

    /// Run a simple form query.
    async fn simple_query(&self, query: &SimpleQuery) -> Result<ResultPage, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpQueryService {
    api: ApiClient,
}

impl HttpQueryService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn post(&self, request: QueryRequest<'_>) -> Result<ResultPage, ClientError> {
        let body = request.body()?;
        tracing::debug!(
            "POST {} collection={}",
            request.path(),
            request.collection()
        );
        self.api.post_json(request.path(), &body).await
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn collections(&self) -> Result<Vec<String>, ClientError> {
        self.api.get_json(COLLECTIONS_PATH, &[]).await
    }

    async fn predefined_queries(&self) -> Result<PredefinedQueries, ClientError> {
        let raw: serde_json::Value = self.api.get_json(PREDEFINED_PATH, &[]).await?;
        Ok(PredefinedQueries::from_json(raw)?)
    }

    async fn execute(&self, query: &Query) -> Result<ResultPage, ClientError> {
        self.post(QueryRequest::from(query)).await
    }

    async fn simple_query(&self, query: &SimpleQuery) -> Result<ResultPage, ClientError> {
        self.post(QueryRequest::from(query)).await
    }
}
