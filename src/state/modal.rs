//! Blocking dialogs shown over the wizard

use serde::{Deserialize, Serialize};

/// Why linking a reservation to a business account failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliationFailure {
    AlreadyAffiliated,
    AffiliationFailed,
    BusinessNotFound,
    RegistrationUnavailable,
}

impl AffiliationFailure {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AlreadyAffiliated => "This name request is already linked to a business account.",
            Self::AffiliationFailed => "The name request could not be linked to your account.",
            Self::BusinessNotFound => "No business was found for this name request.",
            Self::RegistrationUnavailable => "Registration is not available for this name request.",
        }
    }
}

/// Modal dialog. At most one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Modal {
    Conditions,
    Exit,
    HelpMeChoose,
    IncorporateLogin,
    LocationInfo,
    MrasSearchInfo,
    NrRequired,
    PickEntityOrConversion,
    PickRequestType,
    ConfirmName,
    Receipt,
    AffiliationError(AffiliationFailure),
}

impl Modal {
    /// Whether two modals are the same dialog, ignoring any payload
    pub fn same_kind(&self, other: &Modal) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_kind_ignores_payload() {
        let a = Modal::AffiliationError(AffiliationFailure::AlreadyAffiliated);
        let b = Modal::AffiliationError(AffiliationFailure::BusinessNotFound);
        assert!(a.same_kind(&b));
        assert_ne!(a, b);
        assert!(!a.same_kind(&Modal::Exit));
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let json = serde_json::to_value(Modal::AffiliationError(
            AffiliationFailure::AffiliationFailed,
        ))
        .unwrap();
        assert_eq!(json["kind"], "affiliation_error");
        assert_eq!(json["value"], "affiliation_failed");

        let unit = serde_json::to_value(Modal::Conditions).unwrap();
        assert_eq!(unit["kind"], "conditions");
    }
}
