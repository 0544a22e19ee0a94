use super::schedule::{CircleType, Frequency};
use crate::types::{CircleId, ContributionId, MemberId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use hustlex_core::event::Event;
use hustlex_core::money::Money;
use serde::{Deserialize, Serialize};

/// Facts recorded by the circle aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)] // Field names are self-describing
pub enum CircleEvent {
    /// A circle was created; the creator is member #1.
    CircleCreated {
        circle_id: CircleId,
        creator_id: UserId,
        admin_member_id: MemberId,
        name: String,
        circle_type: CircleType,
        contribution_amount: Money,
        frequency: Frequency,
        max_members: u32,
        total_rounds: u32,
        is_private: bool,
        created_at: DateTime<Utc>,
    },

    /// A user joined.
    MemberJoined {
        circle_id: CircleId,
        member_id: MemberId,
        user_id: UserId,
        position: u32,
        joined_at: DateTime<Utc>,
    },

    /// A member left; later members moved up one position.
    MemberLeft {
        circle_id: CircleId,
        member_id: MemberId,
        user_id: UserId,
        left_at: DateTime<Utc>,
    },

    /// Round 1 was scheduled.
    CircleStarted {
        circle_id: CircleId,
        first_round: u32,
        member_count: u32,
        started_at: DateTime<Utc>,
    },

    /// A member paid a contribution.
    ContributionMade {
        circle_id: CircleId,
        contribution_id: ContributionId,
        member_id: MemberId,
        transaction_id: TransactionId,
        round: u32,
        amount: Money,
        late_fee: Money,
        paid_at: DateTime<Utc>,
    },

    /// A contribution passed its due date unpaid.
    ContributionOverdue {
        circle_id: CircleId,
        contribution_id: ContributionId,
        member_id: MemberId,
        round: u32,
        due_date: DateTime<Utc>,
        detected_at: DateTime<Utc>,
    },

    /// The round's pool is due to its recipient.
    PayoutTriggered {
        circle_id: CircleId,
        recipient_member_id: MemberId,
        recipient_user_id: UserId,
        round: u32,
        amount: Money,
    },

    /// Every contribution of a round was paid.
    RoundCompleted {
        circle_id: CircleId,
        round: u32,
        total_collected: Money,
        next_round: u32,
    },

    /// The last round completed.
    CircleCompleted {
        circle_id: CircleId,
        total_rounds: u32,
        total_saved: Money,
        completed_at: DateTime<Utc>,
    },

    /// The admin cancelled the circle.
    CircleCancelled {
        circle_id: CircleId,
        cancelled_by: UserId,
        reason: String,
        pool_balance: Money,
        cancelled_at: DateTime<Utc>,
    },
}

impl CircleEvent {
    /// Circle the event belongs to.
    #[must_use]
    pub const fn circle_id(&self) -> CircleId {
        match self {
            Self::CircleCreated { circle_id, .. }
            | Self::MemberJoined { circle_id, .. }
            | Self::MemberLeft { circle_id, .. }
            | Self::CircleStarted { circle_id, .. }
            | Self::ContributionMade { circle_id, .. }
            | Self::ContributionOverdue { circle_id, .. }
            | Self::PayoutTriggered { circle_id, .. }
            | Self::RoundCompleted { circle_id, .. }
            | Self::CircleCompleted { circle_id, .. }
            | Self::CircleCancelled { circle_id, .. } => *circle_id,
        }
    }
}

impl Event for CircleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::CircleCreated { .. } => "CircleCreated.v1",
            Self::MemberJoined { .. } => "MemberJoined.v1",
            Self::MemberLeft { .. } => "MemberLeft.v1",
            Self::CircleStarted { .. } => "CircleStarted.v1",
            Self::ContributionMade { .. } => "ContributionMade.v1",
            Self::ContributionOverdue { .. } => "ContributionOverdue.v1",
            Self::PayoutTriggered { .. } => "PayoutTriggered.v1",
            Self::RoundCompleted { .. } => "RoundCompleted.v1",
            Self::CircleCompleted { .. } => "CircleCompleted.v1",
            Self::CircleCancelled { .. } => "CircleCancelled.v1",
        }
    }
}
