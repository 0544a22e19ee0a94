use crate::types::{ContributionId, MemberId, TransactionId};
use chrono::{DateTime, Utc};
use hustlex_core::money::Money;
use serde::{Deserialize, Serialize};

/// State of a scheduled contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    /// Scheduled, not yet paid
    Pending,
    /// Paid
    Paid,
    /// Due date passed without payment; still payable
    Overdue,
    /// Forgiven
    Waived,
}

/// One member's contribution for one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    id: ContributionId,
    member_id: MemberId,
    round: u32,
    amount: Money,
    due_date: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    status: ContributionStatus,
    transaction_id: Option<TransactionId>,
    late_fee: Money,
}

impl Contribution {
    pub(crate) fn scheduled(
        member_id: MemberId,
        round: u32,
        amount: Money,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContributionId::new(),
            member_id,
            round,
            amount,
            due_date,
            paid_at: None,
            status: ContributionStatus::Pending,
            transaction_id: None,
            late_fee: Money::zero(amount.currency()),
        }
    }

    /// Identity.
    #[must_use]
    pub const fn id(&self) -> ContributionId {
        self.id
    }

    /// Contributing member.
    #[must_use]
    pub const fn member_id(&self) -> MemberId {
        self.member_id
    }

    /// Round this contribution belongs to.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Scheduled amount, late fee excluded.
    #[must_use]
    pub const fn amount(&self) -> Money {
        self.amount
    }

    /// Due date.
    #[must_use]
    pub const fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    /// When it was paid.
    #[must_use]
    pub const fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Status.
    #[must_use]
    pub const fn status(&self) -> ContributionStatus {
        self.status
    }

    /// Reference to the money movement backing the payment.
    #[must_use]
    pub const fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    /// Late fee charged on payment.
    #[must_use]
    pub const fn late_fee(&self) -> Money {
        self.late_fee
    }

    /// Still payable: pending or overdue.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        matches!(
            self.status,
            ContributionStatus::Pending | ContributionStatus::Overdue
        )
    }

    /// `true` once paid.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self.status, ContributionStatus::Paid)
    }

    /// Outstanding and past its due date at `now`.
    #[must_use]
    pub fn is_late_at(&self, now: DateTime<Utc>) -> bool {
        self.is_outstanding() && now > self.due_date
    }

    pub(crate) fn mark_paid(
        &mut self,
        transaction_id: TransactionId,
        late_fee: Money,
        paid_at: DateTime<Utc>,
    ) {
        self.status = ContributionStatus::Paid;
        self.transaction_id = Some(transaction_id);
        self.late_fee = late_fee;
        self.paid_at = Some(paid_at);
    }

    pub(crate) fn mark_overdue(&mut self) {
        self.status = ContributionStatus::Overdue;
    }
}
