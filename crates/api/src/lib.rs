//! Shared API types, plan tables, crypto, and SQL builders for SoulBridge AI.
//!
//! This crate is the **single source of truth** for request/response shapes
//! and for the flat business tables (tiers, credit costs, trial, referral
//! milestones, companions). The `backend` feature adds password/JWT crypto,
//! the seeded oracle, and the sea-query builders used by the server.

use serde::{Deserialize, Serialize};

pub mod companions;
pub mod credits;
pub mod referral;
pub mod tier;
pub mod trial;

#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod db;
#[cfg(feature = "backend")]
pub mod oracle;
#[cfg(feature = "backend")]
pub mod service;

pub use credits::{CreditFeature, LedgerReason, Spend, Wallet};
pub use tier::{LimitedFeature, Tier};

// ─── Health / capabilities ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub auth_enabled: bool,
    pub registration_open: bool,
    pub trial_hours: i64,
    pub trial_credits: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Email + password registration, optionally with a referral code.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthRegisterRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Returned on register, login, and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user_id: String,
    pub nickname: String,
}

// ─── Profile / entitlements ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub nickname: String,
    pub plan: Tier,
    pub selected_companion: String,
    pub referral_code: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureLimit {
    pub feature: LimitedFeature,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCost {
    pub feature: CreditFeature,
    pub cost: i64,
    pub min_tier: Tier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierInfo {
    pub tier: Tier,
    pub monthly_credits: i64,
    pub daily_limits: Vec<FeatureLimit>,
    pub library_capacity: Option<u32>,
    pub max_message_chars: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TiersResponse {
    pub tiers: Vec<TierInfo>,
    pub credit_costs: Vec<CreditCost>,
}

/// Today's counter for one limited feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageEntry {
    pub feature: LimitedFeature,
    pub used: u32,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub date: String,
    pub usage: Vec<UsageEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialStatusResponse {
    pub active: bool,
    pub used: bool,
    pub started_at: Option<String>,
    pub ends_at: Option<String>,
    pub remaining_secs: i64,
    pub trial_credits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAccess {
    pub feature: CreditFeature,
    pub cost: i64,
    pub min_tier: Tier,
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub trial: i64,
    pub monthly: i64,
    pub purchased: i64,
    pub total: i64,
}

impl From<Wallet> for WalletResponse {
    fn from(w: Wallet) -> Self {
        Self {
            trial: w.trial,
            monthly: w.monthly,
            purchased: w.purchased,
            total: w.total(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementsResponse {
    pub plan: Tier,
    pub access_tier: Tier,
    pub trial: TrialStatusResponse,
    pub usage: Vec<UsageEntry>,
    pub wallet: WalletResponse,
    pub credit_features: Vec<CreditAccess>,
    pub companions: Vec<String>,
    pub library_capacity: Option<u32>,
    pub max_message_chars: usize,
}

// ─── Credits ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub delta: i64,
    pub reason: String,
    pub feature: Option<String>,
    pub balance_after: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreditsResponse {
    pub wallet: WalletResponse,
    pub next_reset_at: Option<String>,
    pub ledger: Vec<LedgerEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpendCreditsRequest {
    pub feature: CreditFeature,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpendCreditsResponse {
    pub feature: CreditFeature,
    pub cost: i64,
    pub spent: Spend,
    pub wallet: WalletResponse,
}

// ─── Referrals ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralClaimRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Milestone {
    pub referrals: u32,
    pub companion: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralStatsResponse {
    pub code: String,
    pub share_url: String,
    pub referral_count: u32,
    pub referred_by: Option<String>,
    pub unlocked: Vec<String>,
    pub next_milestone: Option<Milestone>,
}

// ─── Companions / chat ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CompanionResponse {
    pub id: String,
    pub name: String,
    pub min_tier: Tier,
    pub referrals_required: Option<u32>,
    pub unlocked: bool,
    pub selected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListCompanionsResponse {
    pub companions: Vec<CompanionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectCompanionRequest {
    pub companion: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub companion: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub companion: String,
    pub reply: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub companion: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatHistoryQuery {
    pub companion: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
}

// ─── Library ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SongKind {
    Music,
    Vocals,
}

impl SongKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Music => "music",
            Self::Vocals => "vocals",
        }
    }

    pub fn from_db(s: &str) -> Self {
        if s == "vocals" { Self::Vocals } else { Self::Music }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSongRequest {
    pub title: String,
    pub kind: SongKind,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongResponse {
    pub id: String,
    pub title: String,
    pub kind: SongKind,
    pub prompt: Option<String>,
    pub lyrics: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListSongsResponse {
    pub songs: Vec<SongResponse>,
    pub capacity: Option<u32>,
}

// ─── Readings ────────────────────────────────────────────────────────────────

/// A generated oracle reading plus the quota it consumed.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingResponse<T> {
    pub reading: T,
    pub usage: UsageEntry,
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSetPlanRequest {
    pub plan: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminGrantCreditsRequest {
    pub amount: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminUserResponse {
    pub user_id: String,
    pub plan: Tier,
    pub wallet: WalletResponse,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code. The server converts it into an
/// HTTP response carrying the `{ "error": "..." }` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    PaymentRequired(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::PaymentRequired(_) => 402,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::TooManyRequests(_) => 429,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::PaymentRequired(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::TooManyRequests(m)
            | Self::Internal(m) => m,
        }
    }

    /// Build a closure that wraps a DB/IO error as `Internal`.
    pub fn from_db<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| Self::Internal(format!("{context}: {e}"))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

/// JSON error shape `{ "error": "..." }` returned by all error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}
