//! Request and response bodies exchanged with the Leasedesk API.
//!
//! Field names on the wire follow the backend, which uses Spanish camelCase
//! names and Mongo-style `_id` keys.

use serde::{Deserialize, Serialize};

// Authentication

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Response to a successful login or registration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default, rename = "mensaje")]
    pub message: Option<String>,
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<String>,
    pub uid: String,
    pub email: String,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// Refresh request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response; the refresh token is only present when rotated
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Profile returned by the profile endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(rename = "nombre")]
    pub name: String,
}

// People

/// Legal nature of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonKind {
    /// Natural person
    #[serde(rename = "fisica")]
    Individual,
    /// Legal entity
    #[serde(rename = "juridica")]
    Company,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "tipoPersona")]
    pub kind: PersonKind,
    #[serde(rename = "nombreCompleto")]
    pub full_name: String,
    #[serde(rename = "documento")]
    pub document: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
}

/// Partial update of a person; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonUpdate {
    #[serde(rename = "tipoPersona", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PersonKind>,
    #[serde(rename = "nombreCompleto", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "documento", skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// Properties

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    #[serde(rename = "casa")]
    House,
    #[serde(rename = "campo")]
    Farm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: PropertyKind,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "hectareas")]
    pub hectares: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyUpdate {
    #[serde(rename = "tipo", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyKind>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ubicacion", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "hectareas", skip_serializing_if = "Option::is_none")]
    pub hectares: Option<f64>,
}

// Contracts

/// A related record, either as a bare id or populated by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Id(String),
    Expanded(T),
}

impl<T> Reference<T> {
    /// Id of the referenced record, when known
    pub fn id(&self) -> Option<&str>
    where
        T: HasId,
    {
        match self {
            Self::Id(id) => Some(id),
            Self::Expanded(record) => record.id(),
        }
    }
}

impl<T> From<String> for Reference<T> {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// Records identified by a backend id
pub trait HasId {
    fn id(&self) -> Option<&str>;
}

impl HasId for Person {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl HasId for Property {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "tipoContrato")]
    pub contract_type: String,
    /// Landlord
    #[serde(rename = "locador")]
    pub lessor: Reference<Person>,
    /// Tenant
    #[serde(rename = "locatario")]
    pub lessee: Reference<Person>,
    #[serde(rename = "inmueble")]
    pub property: Reference<Property>,
    #[serde(rename = "fechaInicio")]
    pub start_date: String,
    #[serde(rename = "fechaFin")]
    pub end_date: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "creadoPor", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractUpdate {
    #[serde(rename = "tipoContrato", skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(rename = "locador", skip_serializing_if = "Option::is_none")]
    pub lessor: Option<String>,
    #[serde(rename = "locatario", skip_serializing_if = "Option::is_none")]
    pub lessee: Option<String>,
    #[serde(rename = "inmueble", skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(rename = "fechaInicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "fechaFin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "monto", skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}
