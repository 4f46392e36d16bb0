//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    Nickname,
    PasswordHash,
    PasswordSalt,
    Plan,
    SelectedCompanion,
    ReferralCode,
    MonthlyCredits,
    PurchasedCredits,
    TrialCredits,
    CreditsResetAt,
    TrialStartedAt,
    TrialUsed,
    CreatedAt,
}

#[derive(Iden)]
pub enum RefreshTokens {
    Table,
    Id,
    UserId,
    TokenHash,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum CreditLedger {
    Table,
    Id,
    UserId,
    Delta,
    Reason,
    Feature,
    BalanceAfter,
    CreatedAt,
}

#[derive(Iden)]
pub enum FeatureUsage {
    Table,
    UserId,
    Feature,
    UsageDate,
    Count,
}

#[derive(Iden)]
pub enum Referrals {
    Table,
    Id,
    ReferrerId,
    RefereeId,
    Code,
    CreatedAt,
}

#[derive(Iden)]
pub enum ChatMessages {
    Table,
    Id,
    UserId,
    Companion,
    Role,
    Content,
    CreatedAt,
}

#[derive(Iden)]
pub enum Songs {
    Table,
    Id,
    UserId,
    Title,
    Kind,
    Prompt,
    Lyrics,
    CreatedAt,
}
