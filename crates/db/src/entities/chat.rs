//! Chat entity for two-party conversations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Stored participant order is creation order; lookups check both
    /// orderings so a pair never gets two chats.
    #[sea_orm(indexed)]
    pub participant1_id: String,

    #[sea_orm(indexed)]
    pub participant2_id: String,

    #[sea_orm(default_value = false)]
    pub is_pinned: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether `user_id` is one of the two participants.
    #[must_use]
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participant1_id == user_id || self.participant2_id == user_id
    }

    /// The counterpart participant for `user_id`.
    #[must_use]
    pub fn other_participant(&self, user_id: &str) -> &str {
        if self.participant1_id == user_id {
            &self.participant2_id
        } else {
            &self.participant1_id
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Participant1Id",
        to = "super::user::Column::Id"
    )]
    Participant1,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Participant2Id",
        to = "super::user::Column::Id"
    )]
    Participant2,

    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chat(a: &str, b: &str) -> Model {
        Model {
            id: "c1".to_string(),
            participant1_id: a.to_string(),
            participant2_id: b.to_string(),
            is_pinned: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_participant_checks() {
        let c = chat("alice", "bob");
        assert!(c.has_participant("alice"));
        assert!(c.has_participant("bob"));
        assert!(!c.has_participant("carol"));
        assert_eq!(c.other_participant("alice"), "bob");
        assert_eq!(c.other_participant("bob"), "alice");
    }
}
