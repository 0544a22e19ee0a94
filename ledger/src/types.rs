//! Identifier types shared by the wallet and circle aggregates.
//!
//! Every identity is a UUID v4 newtype so a `WalletId` can never be passed
//! where a `UserId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a `", stringify!($name), "` from a UUID")]
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a wallet
    WalletId
);
uuid_id!(
    /// Unique identifier for a platform user
    UserId
);
uuid_id!(
    /// Unique identifier for a savings circle
    CircleId
);
uuid_id!(
    /// Circle-scoped identifier for a membership
    MemberId
);
uuid_id!(
    /// Unique identifier for a scheduled contribution
    ContributionId
);
uuid_id!(
    /// Reference to a money movement recorded outside the circle
    TransactionId
);
