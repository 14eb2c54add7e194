//! Authentication types for JWT claims and role capabilities.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ShopId, UserId};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Shop whose ledger the token is scoped to.
    pub shop: Uuid,
    /// User's role in the shop.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, shop_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            shop: shop_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// Returns the shop scope from claims.
    #[must_use]
    pub const fn shop_id(&self) -> ShopId {
        ShopId::from_uuid(self.shop)
    }

    /// Returns true if the role in these claims grants `capability`.
    ///
    /// Unknown roles grant nothing.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.role
            .parse::<Role>()
            .is_ok_and(|role| role.capabilities().contains(&capability))
    }
}

/// An action a caller may be permitted to perform on a shop ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Append money-flow entries.
    RecordMoneyFlow,
    /// Read balances, transactions, and bucketed ledgers.
    ViewLedger,
    /// Read period-over-period analytics.
    ViewAnalytics,
    /// Run the balance-chain audit.
    AuditLedger,
}

/// Roles a user can hold within a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shop owner.
    Owner,
    /// Shop administrator.
    Admin,
    /// Staff member handling orders and payouts.
    Staff,
    /// Read-only access.
    Viewer,
}

const OWNER_CAPABILITIES: &[Capability] = &[
    Capability::RecordMoneyFlow,
    Capability::ViewLedger,
    Capability::ViewAnalytics,
    Capability::AuditLedger,
];
const STAFF_CAPABILITIES: &[Capability] = &[Capability::RecordMoneyFlow, Capability::ViewLedger];
const VIEWER_CAPABILITIES: &[Capability] = &[Capability::ViewLedger, Capability::ViewAnalytics];

impl Role {
    /// Returns the capability set granted to this role.
    #[must_use]
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Owner | Self::Admin => OWNER_CAPABILITIES,
            Self::Staff => STAFF_CAPABILITIES,
            Self::Viewer => VIEWER_CAPABILITIES,
        }
    }

    /// Returns the role name as stored in tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Viewer => "viewer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
