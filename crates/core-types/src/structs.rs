use crate::id::EntityId;
use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// A customer account, exposed on the wire as a `user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Assigned by the store on insert; never changes afterwards.
    pub id: EntityId,
    pub name: String,
    pub email: String,
    /// Assigned by the store on insert; never changes afterwards.
    pub created_at: DateTime<Utc>,
}

/// The client-writable half of an [`Account`].
///
/// This is what create and update requests decode into. Fields missing from
/// the payload take their zero value, and an update writes every field, so a
/// PUT is always a whole-record replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountFields {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}

/// An explicit JSON `null` decodes like a missing field: to the zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Account {
    /// Joins the store-assigned columns with the client-supplied fields.
    pub fn from_parts(id: EntityId, created_at: DateTime<Utc>, fields: AccountFields) -> Self {
        Self {
            id,
            name: fields.name,
            email: fields.email,
            created_at,
        }
    }

    pub fn fields(&self) -> AccountFields {
        AccountFields {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// A monetary movement owned by an account, exposed on the wire as an `order`.
///
/// `amount` is deliberately unvalidated: any sign or magnitude is accepted and
/// left to store-level constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: EntityId,
    /// The owning account. Referential integrity is the store's job.
    pub user_id: EntityId,
    pub amount: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// The client-writable half of a [`Transaction`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFields {
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: EntityId,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

impl Transaction {
    pub fn from_parts(
        id: EntityId,
        created_at: DateTime<Utc>,
        fields: TransactionFields,
    ) -> Self {
        Self {
            id,
            user_id: fields.user_id,
            amount: fields.amount,
            description: fields.description,
            created_at,
        }
    }

    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            user_id: self.user_id,
            amount: self.amount,
            description: self.description.clone(),
        }
    }
}
