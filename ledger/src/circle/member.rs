use crate::types::{MemberId, UserId};
use chrono::{DateTime, Utc};
use hustlex_core::money::{Money, MoneyError};
use serde::{Deserialize, Serialize};

/// Role of a member within a circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Creator; may change rules and cancel, may not leave
    Admin,
    /// Regular participant
    Member,
}

/// Membership status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Invited, not yet participating
    Pending,
    /// Participating
    Active,
    /// Left voluntarily
    Left,
    /// Removed by an administrator
    Removed,
}

/// A participant in a circle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    user_id: UserId,
    position: u32,
    role: MemberRole,
    status: MemberStatus,
    total_contributed: Money,
    missed_payments: u32,
    has_received: bool,
    joined_at: DateTime<Utc>,
}

impl Member {
    pub(crate) fn new(
        user_id: UserId,
        position: u32,
        role: MemberRole,
        zero: Money,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MemberId::new(),
            user_id,
            position,
            role,
            status: MemberStatus::Active,
            total_contributed: zero,
            missed_payments: 0,
            has_received: false,
            joined_at,
        }
    }

    /// Membership identity.
    #[must_use]
    pub const fn id(&self) -> MemberId {
        self.id
    }

    /// The member's platform user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Rotation position, 1-based.
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Role.
    #[must_use]
    pub const fn role(&self) -> MemberRole {
        self.role
    }

    /// Status.
    #[must_use]
    pub const fn status(&self) -> MemberStatus {
        self.status
    }

    /// Everything this member has paid in, late fees included.
    #[must_use]
    pub const fn total_contributed(&self) -> Money {
        self.total_contributed
    }

    /// Contributions that went overdue.
    #[must_use]
    pub const fn missed_payments(&self) -> u32 {
        self.missed_payments
    }

    /// `true` once paid out in the current cycle.
    #[must_use]
    pub const fn has_received(&self) -> bool {
        self.has_received
    }

    /// When the member joined.
    #[must_use]
    pub const fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// `true` for the admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }

    /// `true` while participating.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    pub(crate) fn total_after(&self, amount: Money) -> Result<Money, MoneyError> {
        self.total_contributed.checked_add(amount)
    }

    pub(crate) fn set_total_contributed(&mut self, total: Money) {
        self.total_contributed = total;
    }

    pub(crate) fn record_missed_payment(&mut self) {
        self.missed_payments = self.missed_payments.saturating_add(1);
    }

    pub(crate) fn mark_received(&mut self) {
        self.has_received = true;
    }

    pub(crate) fn reset_for_new_cycle(&mut self) {
        self.has_received = false;
    }

    pub(crate) fn leave(&mut self) {
        self.status = MemberStatus::Left;
    }

    pub(crate) fn set_position(&mut self, position: u32) {
        self.position = position;
    }
}
