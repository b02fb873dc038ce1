//! Registry classification codes
//!
//! Every code set here is closed: the wire form is the registry's code
//! string and unknown codes fail to parse instead of being carried along.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a registry code is not part of its code set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

macro_rules! registry_codes {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => ($code:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $code)] $variant),+
        }

        impl $name {
            /// Every member of the code set, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Registry code as sent over the wire
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Human readable label
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant),)+
                    other => Err(UnknownCode {
                        kind: $kind,
                        code: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

registry_codes! {
    /// Legal form of the business
    EntityType as "entity type" {
        BcCorporation => ("CR", "Limited Company"),
        UnlimitedLiability => ("UL", "Unlimited Liability Company"),
        BenefitCompany => ("BC", "Benefit Company"),
        CommunityContribution => ("CC", "Community Contribution Company"),
        Cooperative => ("CP", "Cooperative Association"),
        Society => ("SO", "Society"),
        SoleProprietorship => ("FR", "Sole Proprietorship"),
        GeneralPartnership => ("GP", "General Partnership"),
        LimitedPartnership => ("LP", "Limited Partnership"),
        LimitedLiabilityPartnership => ("LL", "Limited Liability Partnership"),
        DoingBusinessAs => ("DBA", "Doing Business As"),
        PrivateAct => ("PA", "Private Act"),
        FinancialInstitution => ("FI", "Financial Institution"),
        ExtraprovincialCorporation => ("XCR", "Extraprovincial Limited Company"),
        ExtraprovincialUnlimitedLiability => ("XUL", "Extraprovincial Unlimited Liability Company"),
        ExtraprovincialCooperative => ("XCP", "Extraprovincial Cooperative Association"),
        ExtraprovincialSociety => ("XSO", "Extraprovincial Society"),
        ExtraprovincialLimitedPartnership => ("XLP", "Extraprovincial Limited Partnership"),
        ExtraprovincialLimitedLiabilityPartnership => ("XLL", "Extraprovincial Limited Liability Partnership"),
    }
}

impl Default for EntityType {
    fn default() -> Self {
        Self::BcCorporation
    }
}

impl EntityType {
    /// Whether the entity is registered in another jurisdiction
    pub fn is_extraprovincial(&self) -> bool {
        self.code().starts_with('X')
    }

    /// Entity types whose names are never auto-analyzed and always go to
    /// an examiner.
    pub fn default_do_not_analyze() -> Vec<EntityType> {
        vec![
            Self::PrivateAct,
            Self::FinancialInstitution,
            Self::ExtraprovincialCooperative,
            Self::ExtraprovincialSociety,
        ]
    }
}

registry_codes! {
    /// Legal action the applicant is requesting
    RequestAction as "request action" {
        New => ("NEW", "Start a new business"),
        Move => ("MVE", "Continuation in"),
        Change => ("CHG", "Change name"),
        Conversion => ("CNV", "Convert business type"),
        Amalgamate => ("AML", "Amalgamate"),
        Restore => ("REH", "Restore"),
        Reinstate => ("REN", "Reinstate"),
        Assumed => ("ASSUMED", "Assumed name"),
    }
}

impl Default for RequestAction {
    fn default() -> Self {
        Self::New
    }
}

registry_codes! {
    /// Jurisdiction the business operates from
    Location as "location" {
        BritishColumbia => ("BC", "British Columbia"),
        Canada => ("CA", "Elsewhere in Canada"),
        International => ("IN", "Outside Canada"),
        Federal => ("FD", "Federal"),
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::BritishColumbia
    }
}

registry_codes! {
    /// Home jurisdiction of an existing business continuing in
    Jurisdiction as "jurisdiction" {
        Alberta => ("AB", "Alberta"),
        BritishColumbia => ("BC", "British Columbia"),
        Manitoba => ("MB", "Manitoba"),
        NewBrunswick => ("NB", "New Brunswick"),
        Newfoundland => ("NL", "Newfoundland and Labrador"),
        NovaScotia => ("NS", "Nova Scotia"),
        NorthwestTerritories => ("NT", "Northwest Territories"),
        Nunavut => ("NU", "Nunavut"),
        Ontario => ("ON", "Ontario"),
        PrinceEdwardIsland => ("PE", "Prince Edward Island"),
        Quebec => ("QC", "Quebec"),
        Saskatchewan => ("SK", "Saskatchewan"),
        Yukon => ("YT", "Yukon"),
        Federal => ("FD", "Federal"),
        International => ("IN", "International"),
    }
}

registry_codes! {
    /// Request type code for an entity conversion
    ConversionType as "conversion type" {
        LimitedToUnlimited => ("UC", "Limited Company to Unlimited Liability Company"),
        UnlimitedToLimited => ("CUL", "Unlimited Liability Company to Limited Company"),
        LimitedToBenefit => ("BECR", "Limited Company to Benefit Company"),
        BenefitToLimited => ("CRBE", "Benefit Company to Limited Company"),
        UnlimitedToBenefit => ("ULBE", "Unlimited Liability Company to Benefit Company"),
        BenefitToUnlimited => ("BEUL", "Benefit Company to Unlimited Liability Company"),
    }
}

impl ConversionType {
    /// Entity type the business converts from
    pub fn origin(&self) -> EntityType {
        match self {
            Self::LimitedToUnlimited | Self::LimitedToBenefit => EntityType::BcCorporation,
            Self::UnlimitedToLimited | Self::UnlimitedToBenefit => EntityType::UnlimitedLiability,
            Self::BenefitToLimited | Self::BenefitToUnlimited => EntityType::BenefitCompany,
        }
    }

    /// Entity type the business converts to
    pub fn target(&self) -> EntityType {
        match self {
            Self::UnlimitedToLimited | Self::BenefitToLimited => EntityType::BcCorporation,
            Self::LimitedToUnlimited | Self::BenefitToUnlimited => EntityType::UnlimitedLiability,
            Self::LimitedToBenefit | Self::UnlimitedToBenefit => EntityType::BenefitCompany,
        }
    }
}

registry_codes! {
    /// State of a reservation record
    NrState as "request state" {
        Draft => ("DRAFT", "Draft"),
        InProgress => ("INPROGRESS", "In progress"),
        Hold => ("HOLD", "On hold"),
        Approved => ("APPROVED", "Approved"),
        Conditional => ("CONDITIONAL", "Conditionally approved"),
        Rejected => ("REJECTED", "Rejected"),
        Cancelled => ("CANCELLED", "Cancelled"),
        Expired => ("EXPIRED", "Expired"),
        Consumed => ("CONSUMED", "Used"),
        Historical => ("HISTORICAL", "Historical"),
        Reserved => ("RESERVED", "Reserved"),
        ConditionalReserve => ("COND-RESERVE", "Conditionally reserved"),
        PendingPayment => ("PENDING_PAYMENT", "Pending payment"),
        RefundRequested => ("REFUND_REQUESTED", "Refund requested"),
    }
}

impl Default for NrState {
    fn default() -> Self {
        Self::Draft
    }
}

impl NrState {
    /// Map a single-letter state from the legacy registry database
    pub fn from_legacy_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'D' => Some(Self::Draft),
            'H' => Some(Self::Hold),
            'A' => Some(Self::Approved),
            'R' => Some(Self::Rejected),
            'C' => Some(Self::Cancelled),
            'E' => Some(Self::Expired),
            _ => None,
        }
    }

    /// Whether the applicant may still edit the request
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::Draft
                | Self::Hold
                | Self::InProgress
                | Self::Reserved
                | Self::ConditionalReserve
                | Self::PendingPayment
        )
    }

    /// Accept a current code or a legacy one-letter state
    pub fn parse_any(code: &str) -> Result<Self, UnknownCode> {
        code.parse().or_else(|err| {
            let mut chars = code.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) => Self::from_legacy_code(letter).ok_or(err),
                _ => Err(err),
            }
        })
    }
}
