//! Catalog and commerce endpoints

use async_trait::async_trait;
use aws_billing_core::models::{Agreement, Authorization};
use aws_billing_core::traits::CommerceClient;
use aws_billing_core::{AppResult, BillingError};
use tracing::instrument;

use super::client::MptClient;

const AUTHORIZATIONS_PATH: &str = "catalog/authorizations";
const AGREEMENTS_PATH: &str = "commerce/agreements";

#[async_trait]
impl CommerceClient for MptClient {
    #[instrument(skip(self))]
    async fn get_authorizations(&self, rql: &str) -> AppResult<Option<Vec<Authorization>>> {
        let authorizations: Vec<Authorization> = self
            .collect(AUTHORIZATIONS_PATH, rql)
            .await
            .map_err(|e| BillingError::Commerce(e.to_string()))?;
        Ok((!authorizations.is_empty()).then_some(authorizations))
    }

    #[instrument(skip(self))]
    async fn get_agreements_by_query(&self, rql: &str) -> AppResult<Vec<Agreement>> {
        self.collect(AGREEMENTS_PATH, rql)
            .await
            .map_err(|e| BillingError::Commerce(e.to_string()))
    }
}
