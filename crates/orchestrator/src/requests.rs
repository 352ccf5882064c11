//! Input payloads for the orchestrated flows.

use common::{Money, UserId};
use serde::{Deserialize, Serialize};

/// A confirmed incoming user payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Business identifier of the payment record.
    pub payment_id: String,
    /// The paying user.
    pub user_id: UserId,
    /// Gross payment amount in minor units.
    pub amount: Money,
}

/// The investment the payment funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentRequest {
    /// Business identifier of the investment record.
    pub investment_id: String,
    /// Purchase amount in minor units, before any campaign discount.
    pub amount: Money,
}

/// An optional marketing campaign applied to an investment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRequest {
    /// Business identifier of the campaign.
    pub campaign_id: String,
    /// Maximum discount the campaign grants, in minor units.
    pub discount: Money,
}

/// A referral bonus to pay out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRequest {
    /// Business identifier of the referral record.
    pub referral_id: String,
    /// The user who referred and receives the bonus.
    pub referrer_id: UserId,
    /// The referred user whose activity triggered the bonus.
    pub referee_id: UserId,
    /// Bonus amount in minor units.
    pub bonus: Money,
}

/// A wallet withdrawal to an external account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Business identifier of the withdrawal record.
    pub withdrawal_id: String,
    /// The withdrawing user.
    pub user_id: UserId,
    /// Gross amount in minor units, before withholding tax.
    pub amount: Money,
}
