use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seller,
    Superuser,
    Customer,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Seller => "seller",
            Role::Superuser => "superuser",
            Role::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seller" => Ok(Role::Seller),
            "superuser" => Ok(Role::Superuser),
            "customer" => Ok(Role::Customer),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// Who is making a request. Passed explicitly into every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    /// `None` for anonymous storefront visitors.
    pub user_id: Option<i64>,
    pub role: Role,
}

impl CallerIdentity {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: Role::Customer,
        }
    }

    #[must_use]
    pub fn user(user_id: i64, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            role,
        }
    }

    /// Whether the caller may edit, delete, or toggle a product owned by `seller_id`.
    #[must_use]
    pub fn may_manage_product(&self, seller_id: Option<i64>) -> bool {
        match self.role {
            Role::Superuser => true,
            Role::Seller => self.user_id.is_some() && self.user_id == seller_id,
            Role::Customer => false,
        }
    }
}
