//! Property API client methods

use super::{ClientError, LeaseClient};
use crate::types::{Property, PropertyUpdate};
use reqwest::Method;

const PROPERTIES: &str = "/inmuebles";

impl LeaseClient {
    pub async fn list_properties(&self) -> Result<Vec<Property>, ClientError> {
        self.execute(self.request(Method::GET, PROPERTIES)).await
    }

    pub async fn get_property(&self, id: &str) -> Result<Property, ClientError> {
        self.execute(self.request(Method::GET, &format!("{PROPERTIES}/{id}")))
            .await
    }

    pub async fn create_property(&self, property: &Property) -> Result<Property, ClientError> {
        let request = self.request(Method::POST, PROPERTIES).json(property)?;
        self.execute(request).await
    }

    pub async fn update_property(
        &self,
        id: &str,
        update: &PropertyUpdate,
    ) -> Result<Property, ClientError> {
        let request = self
            .request(Method::PUT, &format!("{PROPERTIES}/{id}"))
            .json(update)?;
        self.execute(request).await
    }

    pub async fn delete_property(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(self.request(Method::DELETE, &format!("{PROPERTIES}/{id}")))
            .await
    }
}
