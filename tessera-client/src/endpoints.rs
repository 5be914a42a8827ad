//! Typed API endpoints and their response shapes.
//!
//! All calls here ride the authenticated dispatch path in
//! [`ApiClient`](crate::ApiClient), so a stale token is refreshed and
//! retried transparently. Response shapes tolerate unknown fields; the
//! backend adds fields without versioning.

use serde::{Deserialize, Serialize};
use serde_json::json;

use tessera_core::{AppConfig, User, UserPatch};

use crate::error::ApiError;
use crate::http::ApiClient;

/// How often a coupon becomes usable again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Whether a coupon discounts a fixed amount or a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    Money,
    Percent,
}

/// A coupon in the public catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct Coupon {
    pub id: i64,
    #[serde(default)]
    pub external_code: Option<String>,
    pub title: String,
    pub body: String,
    pub code: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
    pub active: bool,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    pub amount: f64,
}

/// Redemption state of an activated coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserCouponStatus {
    Pending,
    Done,
}

/// Reference back to the catalogue coupon an activation belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponRef {
    pub id: i64,
}

/// A coupon the user has activated.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCoupon {
    pub id: i64,
    pub active: bool,
    #[serde(default)]
    pub external_code: Option<String>,
    #[serde(default)]
    pub coupon: Option<CouponRef>,
    pub status: UserCouponStatus,
}

/// A redeemable reward on the loyalty ladder.
#[derive(Debug, Clone, Deserialize)]
pub struct LoyaltyReward {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub threshold: i64,
    #[serde(default)]
    pub image: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub value: Option<f64>,
}

/// The user's loyalty balance and ladder.
#[derive(Debug, Clone, Deserialize)]
pub struct LoyaltyStatus {
    pub points: i64,
    #[serde(rename = "nextRewardAt", default)]
    pub next_reward_at: Option<i64>,
    #[serde(default)]
    pub milestones: Vec<i64>,
    #[serde(default)]
    pub rewards: Vec<LoyaltyReward>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCategory {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

/// A catalogue product.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Physical store kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Principal,
    Revenda,
}

impl StoreKind {
    fn as_query_value(self) -> &'static str {
        match self {
            StoreKind::Principal => "principal",
            StoreKind::Revenda => "revenda",
        }
    }
}

/// A physical store location.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreLocation {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub kind: StoreKind,
    /// Present when the query carried the caller's coordinates.
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// Filters for the store locator.
#[derive(Debug, Clone, Default)]
pub struct StoreQuery {
    pub city: Option<String>,
    pub kind: Option<StoreKind>,
    /// Caller's position, for server-side distance sorting.
    pub position: Option<(f64, f64)>,
}

impl StoreQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(city) = &self.city {
            params.push(("city", city.clone()));
        }
        if let Some(kind) = self.kind {
            params.push(("type", kind.as_query_value().to_string()));
        }
        if let Some((lat, lng)) = self.position {
            params.push(("lat", lat.to_string()));
            params.push(("lng", lng.to_string()));
        }
        params
    }
}

/// A CMS block on the home screen.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text_body: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub layout: String,
    #[serde(default)]
    pub component_name: Option<String>,
    #[serde(default)]
    pub component_props: Option<serde_json::Value>,
    #[serde(default)]
    pub cta_label: Option<String>,
    #[serde(default)]
    pub cta_url: Option<String>,
    #[serde(default)]
    pub cta_image_only: Option<bool>,
    #[serde(default)]
    pub background_color: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
    #[serde(default)]
    pub publish_at: Option<String>,
}

impl ApiClient {
    /// `GET /coupons` - the public coupon catalogue.
    pub async fn coupons(&self) -> Result<Vec<Coupon>, ApiError> {
        self.get_json("coupons").await
    }

    /// `GET /my-coupons` - coupons the user has activated.
    pub async fn my_coupons(&self) -> Result<Vec<UserCoupon>, ApiError> {
        self.get_json("my-coupons").await
    }

    /// `POST /my-coupons` - activate a catalogue coupon.
    pub async fn activate_coupon(&self, coupon_id: i64) -> Result<UserCoupon, ApiError> {
        self.post_json("my-coupons", &json!({ "coupon_id": coupon_id }))
            .await
    }

    /// `GET /loyalty/summary` - points, milestones, and rewards.
    pub async fn loyalty_summary(&self) -> Result<LoyaltyStatus, ApiError> {
        self.get_json("loyalty/summary").await
    }

    /// `POST /loyalty/rewards/{id}/redeem` - spend points on a reward.
    ///
    /// Callers re-fetch the summary afterwards; the response body is not
    /// relied upon.
    pub async fn redeem_reward(&self, reward_id: i64, quantity: u32) -> Result<(), ApiError> {
        self.post_unit(
            &format!("loyalty/rewards/{}/redeem", reward_id),
            Some(&json!({ "quantity": quantity })),
        )
        .await
    }

    /// `POST /loyalty/welcome-bonus` - one-time signup bonus claim.
    pub async fn claim_welcome_bonus(&self) -> Result<(), ApiError> {
        self.post_unit("loyalty/welcome-bonus", None).await
    }

    /// `GET /products` - the product catalogue.
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("products").await
    }

    /// `GET /stores` - store locator with optional filters.
    pub async fn stores(&self, query: &StoreQuery) -> Result<Vec<StoreLocation>, ApiError> {
        self.get_json_query("stores", &query.to_params()).await
    }

    /// `GET /content-home` - CMS blocks for the home screen.
    pub async fn home_content(&self) -> Result<Vec<ContentBlock>, ApiError> {
        self.get_json("content-home").await
    }

    /// `PUT /user` - partial profile update, returning the new profile.
    ///
    /// Prefer [`SessionManager::update_user`](crate::SessionManager::update_user),
    /// which also persists the returned profile to the vault.
    pub async fn put_user(&self, patch: &UserPatch) -> Result<User, ApiError> {
        self.put_json("user", patch).await
    }
}

/// Resolve a possibly-relative asset path against the configured assets
/// base URL.
///
/// Absolute URLs pass through, protocol-relative ones get `https:`, and
/// anything else is joined to the base. Without a base, the raw path is
/// returned as-is.
pub fn resolve_asset_url(config: Option<&AppConfig>, path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(trimmed.to_string());
    }
    if trimmed.starts_with("//") {
        return Some(format!("https:{}", trimmed));
    }

    let base = config.and_then(|c| c.assets_base_url.as_deref());
    match base.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) => Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            trimmed.trim_start_matches('/')
        )),
        None => Some(trimmed.to_string()),
    }
}
