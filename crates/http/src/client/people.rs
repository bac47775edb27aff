//! People API client methods

use super::{ClientError, LeaseClient};
use crate::types::{Person, PersonUpdate};
use reqwest::Method;

const PEOPLE: &str = "/personas";

impl LeaseClient {
    /// List every person
    pub async fn list_people(&self) -> Result<Vec<Person>, ClientError> {
        self.execute(self.request(Method::GET, PEOPLE)).await
    }

    /// Get a person by id
    pub async fn get_person(&self, id: &str) -> Result<Person, ClientError> {
        self.execute(self.request(Method::GET, &format!("{PEOPLE}/{id}")))
            .await
    }

    /// Create a person; the backend assigns the id
    pub async fn create_person(&self, person: &Person) -> Result<Person, ClientError> {
        let request = self.request(Method::POST, PEOPLE).json(person)?;
        self.execute(request).await
    }

    /// Update the given fields of a person
    pub async fn update_person(
        &self,
        id: &str,
        update: &PersonUpdate,
    ) -> Result<Person, ClientError> {
        let request = self
            .request(Method::PUT, &format!("{PEOPLE}/{id}"))
            .json(update)?;
        self.execute(request).await
    }

    /// Delete a person
    pub async fn delete_person(&self, id: &str) -> Result<(), ClientError> {
        self.execute_empty(self.request(Method::DELETE, &format!("{PEOPLE}/{id}")))
            .await
    }

    /// Mark a person inactive without deleting the record
    pub async fn deactivate_person(&self, id: &str) -> Result<Person, ClientError> {
        self.execute(self.request(Method::PATCH, &format!("{PEOPLE}/{id}/desactivar")))
            .await
    }
}
