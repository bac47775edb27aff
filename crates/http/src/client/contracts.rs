//! Contract API client methods

use super::{ClientError, LeaseClient};
use crate::types::{Contract, ContractUpdate};
use reqwest::Method;

const CONTRACTS: &str = "/contratos";

impl LeaseClient {
    /// List contracts; parties and property may come back populated
    pub async fn list_contracts(&self) -> Result<Vec<Contract>, ClientError> {
        self.execute(self.request(Method::GET, CONTRACTS)).await
    }

    pub async fn get_contract(&self, id: &str) -> Result<Contract, ClientError> {
        self.execute(self.request(Method::GET, &format!("{CONTRACTS}/{id}")))
            .await
    }

    pub async fn create_contract(&self, contract: &Contract) -> Result<Contract, ClientError> {
        let request = self.request(Method::POST, CONTRACTS).json(contract)?;
        self.execute(request).await
    }

    pub async fn update_contract(
        &self,
        id: &str,
        update: &ContractUpdate,
    ) -> Result<Contract, ClientError> {
        let request = self
            .request(Method::PUT, &format!("{CONTRACTS}/{id}"))
            .json(update)?;
        self.execute(request).await
    }

    pub async fn delete_contract(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(self.request(Method::DELETE, &format!("{CONTRACTS}/{id}")))
            .await
    }
}
