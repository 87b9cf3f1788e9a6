//! Procedure-level authorization: who is calling, and what they may touch.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The caller of a procedure. An actor without a user id is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<String>,
    /// Country the caller controls, if any.
    pub country_id: Option<i64>,
    pub role: Role,
}

/// What a procedure needs from its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Authenticated,
    /// Caller must control this country.
    CountryOwner(i64),
    Admin,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: impl Into<String>, country_id: Option<i64>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            country_id,
            role: Role::User,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            country_id: None,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_id.is_some() && self.role == Role::Admin
    }

    pub fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::Public => true,
            _ if self.user_id.is_none() => false,
            _ if self.is_admin() => true,
            Capability::Authenticated => true,
            Capability::CountryOwner(country_id) => self.country_id == Some(country_id),
            Capability::Admin => false,
        }
    }

    /// Unauthorized for anonymous callers, Forbidden for signed-in callers
    /// that lack the capability.
    pub fn require(&self, capability: Capability) -> Result<(), ServiceError> {
        if self.can(capability) {
            return Ok(());
        }
        if self.user_id.is_none() {
            return Err(ServiceError::Unauthorized("sign in required".to_string()));
        }
        let message = match capability {
            Capability::CountryOwner(country_id) => {
                format!("you do not control country {country_id}")
            }
            Capability::Admin => "admin role required".to_string(),
            Capability::Public | Capability::Authenticated => "access denied".to_string(),
        };
        Err(ServiceError::Forbidden(message))
    }

    /// Passes when the caller controls any one of `countries`.
    pub fn require_any_owner(&self, countries: &[i64]) -> Result<(), ServiceError> {
        if countries
            .iter()
            .any(|c| self.can(Capability::CountryOwner(*c)))
        {
            return Ok(());
        }
        match countries.first() {
            Some(first) => self.require(Capability::CountryOwner(*first)),
            None => self.require(Capability::Admin),
        }
    }

    /// The signed-in user's id.
    pub fn require_user(&self) -> Result<&str, ServiceError> {
        self.require(Capability::Authenticated)?;
        self.user_id
            .as_deref()
            .ok_or_else(|| ServiceError::Unauthorized("sign in required".to_string()))
    }
}
