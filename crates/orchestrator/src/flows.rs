//! Flow identifiers and the context keys their operations share.

/// Flow name: user payment credited, invested, and allocated.
pub const FLOW_PAYMENT_TO_INVESTMENT: &str = "payment_to_investment";

/// Flow name: referral bonus payout.
pub const FLOW_REFERRAL_BONUS: &str = "referral_bonus";

/// Flow name: wallet withdrawal to an external account.
pub const FLOW_WITHDRAWAL: &str = "withdrawal";

// Metadata keys, fixed at saga creation.
pub const META_FLOW: &str = "flow";
pub const META_USER_ID: &str = "user_id";
pub const META_PAYMENT_ID: &str = "payment_id";
pub const META_PAYMENT_AMOUNT_MINOR: &str = "payment_amount_minor";
pub const META_INVESTMENT_ID: &str = "investment_id";
pub const META_INVESTMENT_AMOUNT_MINOR: &str = "investment_amount_minor";
pub const META_CAMPAIGN_ID: &str = "campaign_id";
pub const META_CAMPAIGN_DISCOUNT_MINOR: &str = "campaign_discount_minor";
pub const META_REFERRAL_ID: &str = "referral_id";
pub const META_REFERRER_ID: &str = "referrer_id";
pub const META_REFEREE_ID: &str = "referee_id";
pub const META_BONUS_MINOR: &str = "bonus_minor";
pub const META_WITHDRAWAL_ID: &str = "withdrawal_id";
pub const META_AMOUNT_MINOR: &str = "amount_minor";

// Shared keys, written by one step and consumed by later ones.
pub const SHARED_DISCOUNT_MINOR: &str = "discount_minor";
pub const SHARED_WITHHOLDING_TAX_MINOR: &str = "withholding_tax_minor";
pub const SHARED_ALLOCATION_ID: &str = "allocation_id";
pub const SHARED_TRANSFER_REFERENCE: &str = "transfer_reference";
pub const SHARED_RECEIPT_PAIR: &str = "receipt_pair";
pub const SHARED_LIABILITY_PAIR: &str = "liability_pair";
pub const SHARED_CASHOUT_PAIR: &str = "cashout_pair";
