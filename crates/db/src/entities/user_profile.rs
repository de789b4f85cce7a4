//! User profile entity.
//!
//! Holds the password hash, the subscription tier that drives the download
//! quota, payment-card display fields and notification preferences.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription tier stored on the profile.
///
/// Independent of the time-boxed [`super::subscription`] records; the two
/// are deliberately not reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[sea_orm(string_value = "trial")]
    Trial,
    #[sea_orm(string_value = "basic")]
    Basic,
    #[sea_orm(string_value = "premium")]
    Premium,
}

impl SubscriptionTier {
    /// Number of distinct products this tier may unlock via presign.
    /// `None` means unlimited.
    #[must_use]
    pub const fn download_limit(self) -> Option<u64> {
        match self {
            Self::Trial => Some(3),
            Self::Basic => Some(10),
            Self::Premium => None,
        }
    }

    /// Tier name as it appears in quota error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Basic => "basic",
            Self::Premium => "premium",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Argon2 password hash
    #[sea_orm(nullable)]
    pub password: Option<String>,

    pub subscription_type: SubscriptionTier,

    /// Payment-card display fields (no charge is ever made against them)
    #[sea_orm(default_value = "")]
    pub card_number: String,

    #[sea_orm(default_value = "")]
    pub card_holder: String,

    #[sea_orm(default_value = "")]
    pub card_expiry: String,

    #[sea_orm(default_value = true)]
    pub chat_notifications: bool,

    #[sea_orm(default_value = false)]
    pub new_models_notifications: bool,

    /// Outstanding password-reset token, if any
    #[sea_orm(nullable)]
    pub password_reset_token: Option<String>,

    #[sea_orm(nullable)]
    pub password_reset_expires_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_limits() {
        assert_eq!(SubscriptionTier::Trial.download_limit(), Some(3));
        assert_eq!(SubscriptionTier::Basic.download_limit(), Some(10));
        assert_eq!(SubscriptionTier::Premium.download_limit(), None);
    }
}
