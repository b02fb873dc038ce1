//! Wizard steps and the transitions allowed between them

use serde::{Deserialize, Serialize};

/// Top-level tab on the search screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTab {
    #[default]
    NewRequest,
    ExistingRequest,
}

impl SearchTab {
    pub fn number(&self) -> u8 {
        match self {
            Self::NewRequest => 0,
            Self::ExistingRequest => 1,
        }
    }
}

/// Tab inside the submission step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionTab {
    Names,
    Applicant,
    Contact,
    Review,
}

impl SubmissionTab {
    pub fn number(&self) -> u8 {
        match self {
            Self::Names => 0,
            Self::Applicant => 1,
            Self::Contact => 2,
            Self::Review => 3,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Names => Some(Self::Applicant),
            Self::Applicant => Some(Self::Contact),
            Self::Contact => Some(Self::Review),
            Self::Review => None,
        }
    }

    pub fn prev(&self) -> Option<Self> {
        match self {
            Self::Names => None,
            Self::Applicant => Some(Self::Names),
            Self::Contact => Some(Self::Applicant),
            Self::Review => Some(Self::Contact),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Names => "Names",
            Self::Applicant => "Applicant",
            Self::Contact => "Contact",
            Self::Review => "Review",
        }
    }
}

/// Screen of the wizard currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "step", content = "tab", rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Search,
    AnalyzePending,
    AnalyzeResults,
    NamesCapture,
    SendToExamination,
    Submission(SubmissionTab),
    ExistingRequestDisplay,
    ExistingRequestEdit,
    Success,
}

impl WizardStep {
    /// Whether moving from `self` to `to` is a legal wizard transition.
    ///
    /// Staying on the same step is always allowed.
    pub fn can_transition_to(&self, to: WizardStep) -> bool {
        use WizardStep::*;

        if *self == to {
            return true;
        }

        match (*self, to) {
            (Search, AnalyzePending | SendToExamination | NamesCapture | ExistingRequestDisplay) => {
                true
            }
            (AnalyzePending, AnalyzeResults | Search | SendToExamination) => true,
            (
                AnalyzeResults,
                Search | NamesCapture | SendToExamination | Submission(SubmissionTab::Names),
            ) => true,
            (NamesCapture, Search | SendToExamination | Submission(SubmissionTab::Names)) => true,
            (SendToExamination, Search | NamesCapture | Submission(_)) => true,
            (Submission(from), Submission(tab)) => from.number().abs_diff(tab.number()) == 1,
            (Submission(_), Search | Success) => true,
            (
                Submission(SubmissionTab::Names),
                NamesCapture | AnalyzeResults | SendToExamination,
            ) => true,
            (ExistingRequestDisplay, ExistingRequestEdit | Search) => true,
            (ExistingRequestEdit, ExistingRequestDisplay) => true,
            (Success, Search) => true,
            _ => false,
        }
    }

    /// Active submission tab, if on the submission step
    pub fn submission_tab(&self) -> Option<SubmissionTab> {
        match self {
            Self::Submission(tab) => Some(*tab),
            _ => None,
        }
    }

    /// Whether the step edits request data that can be rolled back
    pub fn is_editing(&self) -> bool {
        matches!(
            self,
            Self::NamesCapture | Self::Submission(_) | Self::ExistingRequestEdit
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::AnalyzePending => "Analyzing",
            Self::AnalyzeResults => "Analysis Results",
            Self::NamesCapture => "Name Choices",
            Self::SendToExamination => "Send to Examination",
            Self::Submission(tab) => tab.label(),
            Self::ExistingRequestDisplay => "Existing Request",
            Self::ExistingRequestEdit => "Edit Request",
            Self::Success => "Success",
        }
    }
}
