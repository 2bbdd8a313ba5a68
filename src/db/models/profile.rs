//! Role-specific profile rows.

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FarmerProfile {
    pub farmer_id: i64,
    pub user_id: i64,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub farm_type: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BuyerProfile {
    pub buyer_id: i64,
    pub user_id: i64,
    pub location: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CooperativeProfile {
    pub cooperative_id: i64,
    pub user_id: i64,
    pub cooperative_name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Whichever profile belongs to an account's role
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Farmer(FarmerProfile),
    Buyer(BuyerProfile),
    Cooperative(CooperativeProfile),
}

/// Account totals for the admin dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleCounts {
    pub buyers: i64,
    pub farmers: i64,
    pub cooperatives: i64,
    pub admins: i64,
}
