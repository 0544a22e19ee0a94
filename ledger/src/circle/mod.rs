//! Rotating savings circle (Ajo/Esusu) aggregate.
//!
//! Members contribute a fixed amount every period. Once every contribution of
//! a round is paid, the pool goes to one member and the next round is
//! scheduled:
//!
//! ```text
//! recruiting ──(full / start)──► active ──(last round paid out)──► completed
//!      │                           │
//!      └──────────(cancel)─────────┴──────────► cancelled
//! ```
//!
//! Rotation follows member position: round `R` pays the active member at
//! position `((R - 1) mod N) + 1`, so with `N` members round `R <= N` pays
//! member `R`, and circles running more rounds than members start a new
//! cycle, clearing every member's `has_received` flag.

mod contribution;
mod error;
mod events;
mod member;
mod schedule;

pub use contribution::{Contribution, ContributionStatus};
pub use error::CircleError;
pub use events::CircleEvent;
pub use member::{Member, MemberRole, MemberStatus};
pub use schedule::{CircleType, Frequency};

use crate::config::CirclePolicy;
use crate::types::{CircleId, MemberId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use hustlex_core::aggregate::{AggregateRoot, PendingEvents};
use hustlex_core::environment::Clock;
use hustlex_core::money::Money;
use hustlex_core::stream::Version;
use serde::{Deserialize, Serialize};

/// Fewest members any circle can start with, whatever the policy says.
const ABSOLUTE_MIN_MEMBERS: u32 = 2;

/// Lifecycle status of a circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircleStatus {
    /// Accepting members
    Recruiting,
    /// Collecting contributions round by round
    Active,
    /// Every round paid out
    Completed,
    /// Cancelled by the admin
    Cancelled,
}

impl CircleStatus {
    /// `true` for the terminal states.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Parameters for [`Circle::create`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCircle {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Kind of scheme
    pub circle_type: CircleType,
    /// Fixed amount every member pays each round
    pub contribution_amount: Money,
    /// Contribution period
    pub frequency: Frequency,
    /// Membership cap; reaching it starts the circle
    pub max_members: u32,
    /// Rounds before the circle completes
    pub total_rounds: u32,
    /// Private circles are joined through an invite code
    pub is_private: bool,
    /// Invite code; generated for private circles when absent
    pub invite_code: Option<String>,
}

/// Persisted state of a circle, used to store and re-hydrate it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CircleSnapshot {
    pub id: CircleId,
    pub name: String,
    pub description: String,
    pub circle_type: CircleType,
    pub contribution_amount: Money,
    pub frequency: Frequency,
    pub max_members: u32,
    pub total_rounds: u32,
    pub current_round: u32,
    pub pool_balance: Money,
    pub total_saved: Money,
    pub status: CircleStatus,
    pub is_private: bool,
    pub invite_code: Option<String>,
    pub rules: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub next_payout_date: Option<DateTime<Utc>>,
    pub members: Vec<Member>,
    pub contributions: Vec<Contribution>,
    pub policy: CirclePolicy,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

/// A rotating savings circle.
#[derive(Clone, Debug)]
pub struct Circle {
    id: CircleId,
    name: String,
    description: String,
    circle_type: CircleType,
    contribution_amount: Money,
    frequency: Frequency,
    max_members: u32,
    total_rounds: u32,
    current_round: u32,
    pool_balance: Money,
    total_saved: Money,
    status: CircleStatus,
    is_private: bool,
    invite_code: Option<String>,
    rules: Vec<String>,
    start_date: Option<DateTime<Utc>>,
    next_payout_date: Option<DateTime<Utc>>,
    members: Vec<Member>,
    contributions: Vec<Contribution>,
    policy: CirclePolicy,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: Version,
    persisted_version: Option<Version>,
    events: PendingEvents<CircleEvent>,
}

impl Circle {
    /// Create a recruiting circle with `creator` enrolled as admin at position 1.
    ///
    /// Records `CircleCreated`.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if the contribution amount is zero, the member
    /// cap is below the policy minimum, or there are no rounds.
    pub fn create(
        params: NewCircle,
        creator: UserId,
        clock: &dyn Clock,
        policy: CirclePolicy,
    ) -> Result<Self, CircleError> {
        let min_members = effective_min_members(policy);
        if !params.contribution_amount.is_positive() {
            return Err(CircleError::InvalidConfiguration(
                "contribution amount must be positive".to_string(),
            ));
        }
        if params.max_members < min_members {
            return Err(CircleError::InvalidConfiguration(format!(
                "max members {} is below the minimum of {min_members}",
                params.max_members
            )));
        }
        if params.total_rounds == 0 {
            return Err(CircleError::InvalidConfiguration(
                "a circle needs at least one round".to_string(),
            ));
        }

        let now = clock.now();
        let id = CircleId::new();
        let currency = params.contribution_amount.currency();
        let zero = Money::zero(currency);
        let admin = Member::new(creator, 1, MemberRole::Admin, zero, now);
        let invite_code = match params.invite_code {
            Some(code) => Some(code),
            None if params.is_private => Some(generate_invite_code()),
            None => None,
        };

        let mut events = PendingEvents::new();
        events.record(CircleEvent::CircleCreated {
            circle_id: id,
            creator_id: creator,
            admin_member_id: admin.id(),
            name: params.name.clone(),
            circle_type: params.circle_type,
            contribution_amount: params.contribution_amount,
            frequency: params.frequency,
            max_members: params.max_members,
            total_rounds: params.total_rounds,
            is_private: params.is_private,
            created_at: now,
        });

        tracing::debug!(circle_id = %id, creator = %creator, name = %params.name, "Circle created");

        Ok(Self {
            id,
            name: params.name,
            description: params.description,
            circle_type: params.circle_type,
            contribution_amount: params.contribution_amount,
            frequency: params.frequency,
            max_members: params.max_members,
            total_rounds: params.total_rounds,
            current_round: 0,
            pool_balance: zero,
            total_saved: zero,
            status: CircleStatus::Recruiting,
            is_private: params.is_private,
            invite_code,
            rules: Vec::new(),
            start_date: None,
            next_payout_date: None,
            members: vec![admin],
            contributions: Vec::new(),
            policy,
            created_by: creator,
            created_at: now,
            updated_at: now,
            version: Version::new(1),
            persisted_version: None,
            events,
        })
    }

    /// Rebuild a circle from stored state. Records nothing.
    #[must_use]
    pub fn reconstitute(snapshot: CircleSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            description: snapshot.description,
            circle_type: snapshot.circle_type,
            contribution_amount: snapshot.contribution_amount,
            frequency: snapshot.frequency,
            max_members: snapshot.max_members,
            total_rounds: snapshot.total_rounds,
            current_round: snapshot.current_round,
            pool_balance: snapshot.pool_balance,
            total_saved: snapshot.total_saved,
            status: snapshot.status,
            is_private: snapshot.is_private,
            invite_code: snapshot.invite_code,
            rules: snapshot.rules,
            start_date: snapshot.start_date,
            next_payout_date: snapshot.next_payout_date,
            members: snapshot.members,
            contributions: snapshot.contributions,
            policy: snapshot.policy,
            created_by: snapshot.created_by,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            version: snapshot.version,
            persisted_version: Some(snapshot.version),
            events: PendingEvents::new(),
        }
    }

    /// Current state as a storable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CircleSnapshot {
        CircleSnapshot {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            circle_type: self.circle_type,
            contribution_amount: self.contribution_amount,
            frequency: self.frequency,
            max_members: self.max_members,
            total_rounds: self.total_rounds,
            current_round: self.current_round,
            pool_balance: self.pool_balance,
            total_saved: self.total_saved,
            status: self.status,
            is_private: self.is_private,
            invite_code: self.invite_code.clone(),
            rules: self.rules.clone(),
            start_date: self.start_date,
            next_payout_date: self.next_payout_date,
            members: self.members.clone(),
            contributions: self.contributions.clone(),
            policy: self.policy,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }

    /// Enroll `user_id` at the next position. Filling the circle starts it.
    ///
    /// # Errors
    ///
    /// `CircleNotRecruiting`, `CircleFull` or `AlreadyMember`.
    pub fn add_member(&mut self, user_id: UserId, clock: &dyn Clock) -> Result<MemberId, CircleError> {
        if self.status != CircleStatus::Recruiting {
            return Err(CircleError::CircleNotRecruiting);
        }
        if self.is_full() {
            return Err(CircleError::CircleFull {
                max: self.max_members,
            });
        }
        if self.is_member(user_id) {
            return Err(CircleError::AlreadyMember);
        }

        let now = clock.now();
        let position = self.current_members().saturating_add(1);
        let member = Member::new(
            user_id,
            position,
            MemberRole::Member,
            Money::zero(self.contribution_amount.currency()),
            now,
        );
        let member_id = member.id();
        self.members.push(member);
        self.touch(now);

        tracing::debug!(circle_id = %self.id, member_id = %member_id, position, "Member joined");

        self.events.record(CircleEvent::MemberJoined {
            circle_id: self.id,
            member_id,
            user_id,
            position,
            joined_at: now,
        });

        if self.is_full() && self.current_members() >= effective_min_members(self.policy) {
            self.begin(now);
        }
        Ok(member_id)
    }

    /// Let an active, non-admin member leave before contributions begin.
    ///
    /// Remaining members are renumbered `1..N` in join order.
    ///
    /// # Errors
    ///
    /// `NotMember`, `CannotLeaveActiveCircle` or `AdminCannotLeave`.
    pub fn remove_member(&mut self, user_id: UserId, clock: &dyn Clock) -> Result<(), CircleError> {
        let index = self
            .members
            .iter()
            .position(|m| m.user_id() == user_id && m.is_active())
            .ok_or(CircleError::NotMember)?;

        if self.status == CircleStatus::Active && self.current_round > 0 {
            return Err(CircleError::CannotLeaveActiveCircle);
        }
        if self.members[index].is_admin() {
            return Err(CircleError::AdminCannotLeave);
        }

        let now = clock.now();
        let member_id = self.members[index].id();
        self.members[index].leave();
        self.reorder_positions();
        self.touch(now);

        tracing::debug!(circle_id = %self.id, member_id = %member_id, "Member left");

        self.events.record(CircleEvent::MemberLeft {
            circle_id: self.id,
            member_id,
            user_id,
            left_at: now,
        });
        Ok(())
    }

    /// Start collecting contributions: round 1 is scheduled for every member.
    ///
    /// # Errors
    ///
    /// `AlreadyStarted` for active or completed circles, `AlreadyFinished`
    /// for cancelled ones, `MinimumMembers` below the policy minimum.
    pub fn start(&mut self, clock: &dyn Clock) -> Result<(), CircleError> {
        match self.status {
            CircleStatus::Recruiting => {}
            CircleStatus::Active | CircleStatus::Completed => {
                return Err(CircleError::AlreadyStarted);
            }
            CircleStatus::Cancelled => return Err(CircleError::AlreadyFinished),
        }

        let required = effective_min_members(self.policy);
        let current = self.current_members();
        if current < required {
            return Err(CircleError::MinimumMembers { required, current });
        }

        let now = clock.now();
        self.touch(now);
        self.begin(now);
        Ok(())
    }

    /// Record a member's payment for the current round.
    ///
    /// A payment made after the due date carries a late fee of
    /// `contribution_amount / late_fee_divisor`. The fee goes into the pool,
    /// the running total and the member's total. When the last contribution of
    /// the round is paid, the round completes in the same call.
    ///
    /// # Errors
    ///
    /// `CircleNotActive`, `NoPendingContribution`, `NotMember`, or `Money` on
    /// overflow.
    pub fn record_contribution(
        &mut self,
        member_id: MemberId,
        transaction_id: TransactionId,
        clock: &dyn Clock,
    ) -> Result<Contribution, CircleError> {
        if self.status != CircleStatus::Active {
            return Err(CircleError::CircleNotActive);
        }

        let round = self.current_round;
        let contribution_index = self
            .contributions
            .iter()
            .position(|c| c.member_id() == member_id && c.round() == round && c.is_outstanding())
            .ok_or(CircleError::NoPendingContribution)?;
        let member_index = self
            .members
            .iter()
            .position(|m| m.id() == member_id)
            .ok_or(CircleError::NotMember)?;

        let now = clock.now();
        let amount = self.contributions[contribution_index].amount();
        let late_fee = if self.contributions[contribution_index].is_late_at(now) {
            amount.fraction(self.policy.late_fee_divisor)
        } else {
            Money::zero(amount.currency())
        };

        let paid = amount.checked_add(late_fee)?;
        let new_pool = self.pool_balance.checked_add(paid)?;
        let new_saved = self.total_saved.checked_add(paid)?;
        let new_member_total = self.members[member_index].total_after(paid)?;

        let contribution = &mut self.contributions[contribution_index];
        contribution.mark_paid(transaction_id, late_fee, now);
        let receipt = contribution.clone();
        self.pool_balance = new_pool;
        self.total_saved = new_saved;
        self.members[member_index].set_total_contributed(new_member_total);
        self.touch(now);

        tracing::debug!(
            circle_id = %self.id,
            member_id = %member_id,
            round,
            amount = amount.amount(),
            late_fee = late_fee.amount(),
            "Contribution recorded"
        );

        self.events.record(CircleEvent::ContributionMade {
            circle_id: self.id,
            contribution_id: receipt.id(),
            member_id,
            transaction_id,
            round,
            amount,
            late_fee,
            paid_at: now,
        });

        if self.is_round_complete() {
            self.complete_round(now);
        }
        Ok(receipt)
    }

    /// Flag every unpaid current-round contribution past its due date as
    /// overdue and count a missed payment for its member.
    ///
    /// Returns how many contributions were flagged. Flagging nothing leaves
    /// the circle untouched.
    ///
    /// # Errors
    ///
    /// `CircleNotActive` unless the circle is active.
    pub fn mark_overdue_contributions(&mut self, clock: &dyn Clock) -> Result<usize, CircleError> {
        if self.status != CircleStatus::Active {
            return Err(CircleError::CircleNotActive);
        }

        let now = clock.now();
        let round = self.current_round;
        let mut flagged = Vec::new();
        for contribution in &mut self.contributions {
            if contribution.round() == round
                && contribution.status() == ContributionStatus::Pending
                && now > contribution.due_date()
            {
                contribution.mark_overdue();
                flagged.push((contribution.id(), contribution.member_id(), contribution.due_date()));
            }
        }

        if flagged.is_empty() {
            return Ok(0);
        }

        for (contribution_id, member_id, due_date) in &flagged {
            if let Some(member) = self.members.iter_mut().find(|m| m.id() == *member_id) {
                member.record_missed_payment();
            }
            tracing::warn!(
                circle_id = %self.id,
                member_id = %member_id,
                round,
                "Contribution overdue"
            );
            self.events.record(CircleEvent::ContributionOverdue {
                circle_id: self.id,
                contribution_id: *contribution_id,
                member_id: *member_id,
                round,
                due_date: *due_date,
                detected_at: now,
            });
        }
        self.touch(now);
        Ok(flagged.len())
    }

    /// Replace the circle's rules. Admin only.
    ///
    /// # Errors
    ///
    /// `AlreadyFinished` on completed or cancelled circles, `NotAdmin` otherwise
    /// if `by` is not the admin.
    pub fn set_rules(
        &mut self,
        by: UserId,
        rules: Vec<String>,
        clock: &dyn Clock,
    ) -> Result<(), CircleError> {
        if self.status.is_finished() {
            return Err(CircleError::AlreadyFinished);
        }
        if !self.is_admin(by) {
            return Err(CircleError::NotAdmin);
        }
        self.rules = rules;
        self.touch(clock.now());
        Ok(())
    }

    /// Cancel a recruiting or active circle. Admin only.
    ///
    /// The pool is left as is; refunding it is decided outside the circle.
    ///
    /// # Errors
    ///
    /// `AlreadyFinished` on completed or cancelled circles, `NotAdmin` if `by`
    /// is not the admin.
    pub fn cancel(&mut self, by: UserId, reason: &str, clock: &dyn Clock) -> Result<(), CircleError> {
        if self.status.is_finished() {
            return Err(CircleError::AlreadyFinished);
        }
        if !self.is_admin(by) {
            return Err(CircleError::NotAdmin);
        }

        let now = clock.now();
        self.status = CircleStatus::Cancelled;
        self.next_payout_date = None;
        self.touch(now);

        tracing::info!(
            circle_id = %self.id,
            round = self.current_round,
            pool = self.pool_balance.amount(),
            reason,
            "Circle cancelled"
        );

        self.events.record(CircleEvent::CircleCancelled {
            circle_id: self.id,
            cancelled_by: by,
            reason: reason.to_string(),
            pool_balance: self.pool_balance,
            cancelled_at: now,
        });
        Ok(())
    }

    /// Active member for `user_id`.
    #[must_use]
    pub fn find_member_by_user(&self, user_id: UserId) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.user_id() == user_id && m.is_active())
    }

    /// Member with `member_id`, whatever its status.
    #[must_use]
    pub fn find_member(&self, member_id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == member_id)
    }

    /// Active member holding `position`.
    #[must_use]
    pub fn find_member_by_position(&self, position: u32) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.position() == position && m.is_active())
    }

    /// Active member who receives the pool of `round`.
    #[must_use]
    pub fn recipient_for_round(&self, round: u32) -> Option<&Member> {
        let members = self.current_members();
        if round == 0 || members == 0 {
            return None;
        }
        self.find_member_by_position((round - 1) % members + 1)
    }

    /// `true` if `user_id` is an active member.
    #[must_use]
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.find_member_by_user(user_id).is_some()
    }

    /// `true` if `user_id` is the active admin.
    #[must_use]
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.find_member_by_user(user_id)
            .is_some_and(Member::is_admin)
    }

    /// Unpaid contributions of a member, across rounds.
    #[must_use]
    pub fn pending_contributions(&self, member_id: MemberId) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.member_id() == member_id && c.is_outstanding())
            .collect()
    }

    /// All contributions scheduled for `round`.
    #[must_use]
    pub fn contributions_for_round(&self, round: u32) -> Vec<&Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.round() == round)
            .collect()
    }

    /// Number of active members.
    #[must_use]
    pub fn current_members(&self) -> u32 {
        let count = self.members.iter().filter(|m| m.is_active()).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// `true` once the active member count reaches `max_members`.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current_members() >= self.max_members
    }

    /// Circle identity.
    #[must_use]
    pub const fn id(&self) -> CircleId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Kind of scheme.
    #[must_use]
    pub const fn circle_type(&self) -> CircleType {
        self.circle_type
    }

    /// Fixed per-round contribution.
    #[must_use]
    pub const fn contribution_amount(&self) -> Money {
        self.contribution_amount
    }

    /// Contribution period.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Membership cap.
    #[must_use]
    pub const fn max_members(&self) -> u32 {
        self.max_members
    }

    /// Rounds before completion.
    #[must_use]
    pub const fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Round being collected; 0 before start.
    #[must_use]
    pub const fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Collected in the current round.
    #[must_use]
    pub const fn pool_balance(&self) -> Money {
        self.pool_balance
    }

    /// Collected over the circle's life.
    #[must_use]
    pub const fn total_saved(&self) -> Money {
        self.total_saved
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> CircleStatus {
        self.status
    }

    /// `true` for private circles.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.is_private
    }

    /// Invite code, if any.
    #[must_use]
    pub fn invite_code(&self) -> Option<&str> {
        self.invite_code.as_deref()
    }

    /// Circle rules.
    #[must_use]
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// When round 1 was scheduled.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Due date of the current round.
    #[must_use]
    pub const fn next_payout_date(&self) -> Option<DateTime<Utc>> {
        self.next_payout_date
    }

    /// Every membership ever created, including departed ones.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Every contribution ever scheduled.
    #[must_use]
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Policy the circle was created under.
    #[must_use]
    pub const fn policy(&self) -> CirclePolicy {
        self.policy
    }

    /// Creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last successful mutation.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn begin(&mut self, now: DateTime<Utc>) {
        self.status = CircleStatus::Active;
        self.start_date = Some(now);
        self.current_round = 1;
        self.schedule_contributions(now);

        tracing::info!(circle_id = %self.id, members = self.current_members(), "Circle started");

        self.events.record(CircleEvent::CircleStarted {
            circle_id: self.id,
            first_round: 1,
            member_count: self.current_members(),
            started_at: now,
        });
    }

    fn schedule_contributions(&mut self, now: DateTime<Utc>) {
        let due_date = self.frequency.next_due_date(now);
        let round = self.current_round;
        let members = self.current_members();

        if round > 1 && members > 0 && (round - 1) % members == 0 {
            tracing::debug!(circle_id = %self.id, round, "New rotation cycle");
            for member in self.members.iter_mut().filter(|m| m.is_active()) {
                member.reset_for_new_cycle();
            }
        }

        let scheduled: Vec<Contribution> = self
            .members
            .iter()
            .filter(|m| m.is_active())
            .map(|m| Contribution::scheduled(m.id(), round, self.contribution_amount, due_date))
            .collect();
        self.contributions.extend(scheduled);
        self.next_payout_date = Some(due_date);
    }

    fn is_round_complete(&self) -> bool {
        let mut round = self
            .contributions
            .iter()
            .filter(|c| c.round() == self.current_round)
            .peekable();
        round.peek().is_some() && round.all(Contribution::is_paid)
    }

    fn complete_round(&mut self, now: DateTime<Utc>) {
        let round = self.current_round;
        let payout = self.pool_balance;

        let recipient = self.recipient_for_round(round).map(|m| (m.id(), m.user_id()));
        if let Some((member_id, user_id)) = recipient {
            if let Some(member) = self.members.iter_mut().find(|m| m.id() == member_id) {
                member.mark_received();
            }
            tracing::info!(
                circle_id = %self.id,
                round,
                recipient = %member_id,
                amount = payout.amount(),
                "Payout triggered"
            );
            self.events.record(CircleEvent::PayoutTriggered {
                circle_id: self.id,
                recipient_member_id: member_id,
                recipient_user_id: user_id,
                round,
                amount: payout,
            });
        }

        let next_round = round.saturating_add(1);
        self.events.record(CircleEvent::RoundCompleted {
            circle_id: self.id,
            round,
            total_collected: payout,
            next_round,
        });

        self.pool_balance = Money::zero(payout.currency());
        self.current_round = next_round;

        if self.current_round > self.total_rounds {
            self.status = CircleStatus::Completed;
            self.next_payout_date = None;
            tracing::info!(
                circle_id = %self.id,
                total_saved = self.total_saved.amount(),
                "Circle completed"
            );
            self.events.record(CircleEvent::CircleCompleted {
                circle_id: self.id,
                total_rounds: self.total_rounds,
                total_saved: self.total_saved,
                completed_at: now,
            });
        } else {
            self.schedule_contributions(now);
        }
    }

    fn reorder_positions(&mut self) {
        let mut position = 1;
        for member in self.members.iter_mut().filter(|m| m.is_active()) {
            member.set_position(position);
            position += 1;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version = self.version.next();
    }
}

const fn effective_min_members(policy: CirclePolicy) -> u32 {
    if policy.min_members > ABSOLUTE_MIN_MEMBERS {
        policy.min_members
    } else {
        ABSOLUTE_MIN_MEMBERS
    }
}

fn generate_invite_code() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_ascii_uppercase()
}

impl AggregateRoot for Circle {
    type Event = CircleEvent;
    const AGGREGATE_TYPE: &'static str = "circle";

    fn aggregate_id(&self) -> String {
        self.id.to_string()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn persisted_version(&self) -> Option<Version> {
        self.persisted_version
    }

    fn mark_persisted(&mut self) {
        self.persisted_version = Some(self.version);
    }

    fn pending_events(&self) -> &[CircleEvent] {
        self.events.as_slice()
    }

    fn take_events(&mut self) -> Vec<CircleEvent> {
        self.events.drain()
    }
}
