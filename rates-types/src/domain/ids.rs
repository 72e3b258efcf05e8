//! Typed identifiers for reference entities.

use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Placeholder id for rows not yet stored.
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Unique identifier for a Currency.
    CurrencyId
);
define_id!(
    /// Unique identifier for a Country.
    CountryId
);
define_id!(
    /// Unique identifier for a TransferProvider.
    ProviderId
);
define_id!(
    /// Unique identifier for a TransferRule.
    TransferRuleId
);
define_id!(
    /// Unique identifier for a ProviderExchangeRate.
    ExchangeRateId
);
define_id!(
    /// Unique identifier for a Document.
    DocumentId
);
define_id!(
    /// Unique identifier for a Media file.
    MediaId
);
define_id!(
    /// Unique identifier for a Text block.
    TextId
);
