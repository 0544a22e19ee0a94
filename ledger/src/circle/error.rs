use hustlex_core::money::MoneyError;
use thiserror::Error;

/// Errors returned by [`Circle`](super::Circle) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircleError {
    /// Membership changes need a recruiting circle.
    #[error("Circle is not recruiting members")]
    CircleNotRecruiting,

    /// `max_members` reached.
    #[error("Circle has reached maximum members ({max})")]
    CircleFull {
        /// Configured maximum
        max: u32,
    },

    /// The user already holds an active membership.
    #[error("User is already a member of this circle")]
    AlreadyMember,

    /// The user or member is not an active member.
    #[error("User is not a member of this circle")]
    NotMember,

    /// Contributions need an active circle.
    #[error("Circle is not active")]
    CircleNotActive,

    /// Membership is frozen once contributions began.
    #[error("Cannot leave circle after contributions started")]
    CannotLeaveActiveCircle,

    /// The admin must stay.
    #[error("Admin cannot leave the circle")]
    AdminCannotLeave,

    /// Too few active members to start.
    #[error("Need at least {required} members to start, have {current}")]
    MinimumMembers {
        /// Members required
        required: u32,
        /// Active members
        current: u32,
    },

    /// The circle already started.
    #[error("Circle has already started")]
    AlreadyStarted,

    /// Nothing outstanding for this member in the current round.
    #[error("No pending contribution for this round")]
    NoPendingContribution,

    /// Only the admin may do this.
    #[error("Only the admin can perform this action")]
    NotAdmin,

    /// The circle is completed or cancelled.
    #[error("Circle is already completed or cancelled")]
    AlreadyFinished,

    /// Creation parameters are unusable.
    #[error("Invalid circle configuration: {0}")]
    InvalidConfiguration(String),

    /// Pool arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl CircleError {
    /// Stable identifier for API error mapping.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CircleNotRecruiting => "CIRCLE_NOT_RECRUITING",
            Self::CircleFull { .. } => "CIRCLE_FULL",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::NotMember => "NOT_MEMBER",
            Self::CircleNotActive => "CIRCLE_NOT_ACTIVE",
            Self::CannotLeaveActiveCircle => "CANNOT_LEAVE_ACTIVE_CIRCLE",
            Self::AdminCannotLeave => "ADMIN_CANNOT_LEAVE",
            Self::MinimumMembers { .. } => "MINIMUM_MEMBERS",
            Self::AlreadyStarted => "ALREADY_STARTED",
            Self::NoPendingContribution => "NO_PENDING_CONTRIBUTION",
            Self::NotAdmin => "NOT_ADMIN",
            Self::AlreadyFinished => "CIRCLE_FINISHED",
            Self::InvalidConfiguration(_) => "INVALID_CIRCLE_CONFIGURATION",
            Self::Money(_) => "AMOUNT_OUT_OF_RANGE",
        }
    }
}
