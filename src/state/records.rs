//! Structured sub-records held by the request state
//!
//! These mirror the payloads exchanged with the registry services. All of
//! them encode as self-describing JSON objects (no positional fields).

use super::codes::{EntityType, Location, NrState, RequestAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum number of names an applicant may submit on one request
pub const MAX_NAME_CHOICES: usize = 3;

/// Person or organization applying for the name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Applicant {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub contact: Option<String>,
    pub email_address: String,
    pub phone_number: String,
    pub fax_number: Option<String>,
    pub addr_line1: String,
    pub addr_line2: Option<String>,
    pub city: String,
    pub state_province_cd: String,
    pub postal_cd: String,
    pub country_type_cd: String,
}

impl Applicant {
    /// Full name for display, skipping an absent middle name
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.first_name.as_str()];
        if let Some(middle) = self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            parts.push(middle);
        }
        parts.push(self.last_name.as_str());
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether the minimum contact details are present
    pub fn has_contact_details(&self) -> bool {
        !self.last_name.trim().is_empty()
            && (!self.email_address.trim().is_empty() || !self.phone_number.trim().is_empty())
    }
}

/// One proposed name inside a reservation record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NameEntry {
    pub choice: u8,
    pub name: String,
    pub designation: Option<String>,
    pub consent_words: Vec<String>,
    pub conflict1: Option<String>,
}

/// The reservation record being created or edited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NameRequest {
    pub id: Option<u64>,
    pub nr_num: Option<String>,
    #[serde(deserialize_with = "deserialize_nr_state")]
    pub state: NrState,
    #[serde(rename = "entity_type_cd")]
    pub entity_type_cd: EntityType,
    #[serde(rename = "request_action_cd")]
    pub request_action_cd: RequestAction,
    pub names: Vec<NameEntry>,
    pub applicants: Vec<Applicant>,
    pub corp_num: Option<String>,
    pub priority_cd: bool,
    pub additional_info: Option<String>,
    pub nature_business_info: Option<String>,
    pub submitted_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Records fetched from the legacy database carry one-letter states
fn deserialize_nr_state<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NrState, D::Error> {
    let code = String::deserialize(deserializer)?;
    NrState::parse_any(&code).map_err(serde::de::Error::custom)
}

impl NameRequest {
    /// Name for a given choice number, if present
    pub fn name_for_choice(&self, choice: u8) -> Option<&NameEntry> {
        self.names.iter().find(|n| n.choice == choice)
    }
}

/// A single name choice entered by the applicant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NameChoice {
    pub name: String,
    pub designation: Option<String>,
}

impl NameChoice {
    pub fn new(name: impl Into<String>, designation: Option<&str>) -> Self {
        Self {
            name: name.into(),
            designation: designation.map(str::to_string),
        }
    }

    fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// The applicant's ordered name choices (first, second and third)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameChoices {
    pub name1: Option<NameChoice>,
    pub name2: Option<NameChoice>,
    pub name3: Option<NameChoice>,
}

impl NameChoices {
    /// Build choices from an ordered list; anything past the third is dropped
    pub fn from_names<I>(names: I) -> Self
    where
        I: IntoIterator<Item = NameChoice>,
    {
        let mut iter = names.into_iter();
        Self {
            name1: iter.next(),
            name2: iter.next(),
            name3: iter.next(),
        }
    }

    /// Filled choices with their choice number, in order
    pub fn filled(&self) -> impl Iterator<Item = (u8, &NameChoice)> {
        [&self.name1, &self.name2, &self.name3]
            .into_iter()
            .zip(1u8..)
            .filter_map(|(slot, n)| slot.as_ref().filter(|c| !c.is_blank()).map(|c| (n, c)))
    }

    pub fn is_empty(&self) -> bool {
        self.filled().next().is_none()
    }
}

/// Mapping of a name choice to its slot on the submitted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNameMapping {
    pub choice: u8,
    pub name: String,
    pub designation: Option<String>,
}

impl RequestNameMapping {
    pub fn from_choice(choice: u8, name: &NameChoice) -> Self {
        Self {
            choice,
            name: name.name.trim().to_string(),
            designation: name.designation.clone(),
        }
    }

    pub fn to_entry(&self) -> NameEntry {
        NameEntry {
            choice: self.choice,
            name: self.name.clone(),
            designation: self.designation.clone(),
            ..Default::default()
        }
    }
}

/// Whether the business is local or registered elsewhere
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyType {
    #[default]
    Local,
    Extraprovincial,
}

/// Nested state of the business name search form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchState {
    pub business: String,
    pub company_type: CompanyType,
    pub jurisdiction: Location,
    pub request_action: RequestAction,
}

/// Lookup of an existing reservation by number and contact detail
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExistingRequestSearch {
    pub nr_num: String,
    pub email_address: String,
    pub phone_number: String,
}

impl ExistingRequestSearch {
    /// A lookup needs the number plus at least one contact detail
    pub fn is_complete(&self) -> bool {
        !self.nr_num.trim().is_empty()
            && (!self.email_address.trim().is_empty() || !self.phone_number.trim().is_empty())
    }
}

/// Address lookup request waiting on the address service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressQuery {
    pub search_term: String,
    pub country: String,
    pub last_id: Option<String>,
}

/// Next action for an address suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionNext {
    Find,
    Retrieve,
}

/// One candidate returned by the address service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSuggestion {
    pub id: String,
    pub text: String,
    pub description: String,
    pub next: SuggestionNext,
}

/// Existing registry name similar to the one being typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSearchName {
    pub name: String,
    pub corp_num: Option<String>,
    pub nr_num: Option<String>,
}

/// Issue category raised by name analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    AddDistinctiveWord,
    AddDescriptiveWord,
    ContainsWordsToAvoid,
    CorporateConflict,
    QueueConflict,
    NameRequiresConsent,
    TooManyWords,
    IncorrectCategory,
    DesignationMismatch,
    DesignationMisplaced,
    DesignationNonExistent,
    EndDesignationMoreThanOnce,
}

impl IssueType {
    /// Designation problems are tracked separately on the state
    pub fn designation_issue(&self) -> Option<DesignationIssueType> {
        match self {
            Self::DesignationMismatch => Some(DesignationIssueType::Mismatch),
            Self::DesignationMisplaced => Some(DesignationIssueType::Misplaced),
            Self::DesignationNonExistent => Some(DesignationIssueType::NonExistent),
            Self::EndDesignationMoreThanOnce => Some(DesignationIssueType::RepeatedEnd),
            _ => None,
        }
    }
}

/// Legal designation problem flagged on a proposed name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignationIssueType {
    Mismatch,
    Misplaced,
    NonExistent,
    RepeatedEnd,
}

/// Existing name colliding with the proposed one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub name: String,
    pub id: String,
    pub source: String,
}

/// One problem found by name analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisIssue {
    pub issue_type: IssueType,
    pub line1: String,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub designations: Vec<String>,
}

/// Overall verdict of name analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Available,
    NotAvailable,
    MayBeAvailable,
}

/// Parsed response of the name analysis service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    #[serde(default)]
    pub issues: Vec<AnalysisIssue>,
}

impl AnalysisResult {
    /// Distinct designation issues, in first-seen order
    pub fn designation_issue_types(&self) -> Vec<DesignationIssueType> {
        let mut found = Vec::new();
        for issue in &self.issues {
            if let Some(kind) = issue.issue_type.designation_issue() {
                if !found.contains(&kind) {
                    found.push(kind);
                }
            }
        }
        found
    }

    /// First conflicting name reported, if any
    pub fn first_conflict(&self) -> Option<&Conflict> {
        self.issues.iter().flat_map(|i| i.conflicts.iter()).next()
    }
}

/// Query sent to the analysis service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisQuery {
    pub name: String,
    pub location: Location,
    #[serde(rename = "entity_type_cd")]
    pub entity_type_cd: EntityType,
    #[serde(rename = "request_action_cd")]
    pub request_action_cd: RequestAction,
}
