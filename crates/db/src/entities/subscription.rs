//! Time-boxed plan subscription entity.
//!
//! Tracks plan membership over a date range. Not reconciled with
//! `user_profile.subscription_type`, which independently drives the
//! download quota.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub plan_id: String,

    pub start_date: DateTimeWithTimeZone,

    /// Defaults to `start_date + plan.duration_days` when not supplied.
    pub end_date: DateTimeWithTimeZone,
}

impl Model {
    /// A subscription is active while its end date lies in the future.
    #[must_use]
    pub fn is_active(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.end_date >= now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PlanId",
        to = "super::plan::Column::Id"
    )]
    Plan,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
