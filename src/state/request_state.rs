//! The request state record

use super::codes::{ConversionType, EntityType, Jurisdiction, Location, RequestAction};
use super::lookup::{Lookup, LookupTicket};
use super::modal::{AffiliationFailure, Modal};
use super::records::{
    AddressQuery, AddressSuggestion, AnalysisResult, Applicant, DesignationIssueType,
    ExistingRequestSearch, NameChoice, NameChoices, NameRequest, QuickSearchName,
    RequestNameMapping, SearchState, MAX_NAME_CHOICES,
};
use super::tracked::Tracked;
use super::wizard::{SearchTab, WizardStep};
use crate::error::{ErrorKind, RequestError};
use serde::{Deserialize, Serialize};

/// Everything the wizard knows about one name request session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestState {
    // Identity
    pub corp_num: String,
    pub conflict_id: Option<String>,
    pub name: String,
    pub name_original: String,
    pub assumed_name_original: String,
    pub folio_number: Option<String>,

    // Workflow flags
    pub edit_mode: bool,
    pub priority_request: bool,
    pub acting_on_own_behalf: bool,
    pub is_persons_name: bool,
    pub name_is_english: bool,
    pub user_cancelled_analysis: bool,
    pub name_analysis_timed_out: bool,
    pub no_corp_num: bool,
    pub get_name_reservation_failed: bool,
    pub is_loading_submission: bool,
    pub request_examination_or_provide_consent: bool,

    // Classification
    #[serde(rename = "entity_type_cd")]
    pub entity_type_cd: EntityType,
    #[serde(rename = "origin_entity_type_cd")]
    pub origin_entity_type_cd: Option<EntityType>,
    #[serde(rename = "request_action_cd")]
    pub request_action_cd: RequestAction,
    pub conversion_type: Option<ConversionType>,
    pub location: Location,
    #[serde(rename = "request_jurisdiction_cd")]
    pub request_jurisdiction_cd: Option<Jurisdiction>,
    pub do_not_analyze_entities: Vec<EntityType>,

    // Navigation
    pub step: WizardStep,
    pub search_tab: SearchTab,
    pub active_modal: Option<Modal>,
    pub issue_index: usize,

    // Sub-records
    pub applicant: Applicant,
    pub nr: Tracked<NameRequest>,
    pub name_choices: NameChoices,
    pub nr_request_name_map: Vec<RequestNameMapping>,
    pub search: SearchState,
    pub existing_request_search: ExistingRequestSearch,
    pub waiting_address_search: Option<AddressQuery>,

    // Lookup results
    pub quick_search_names: Lookup<Vec<QuickSearchName>>,
    pub address_suggestions: Lookup<Vec<AddressSuggestion>>,
    pub analysis: Lookup<Option<AnalysisResult>>,
    pub designation_issue_types: Vec<DesignationIssueType>,

    pub errors: Vec<RequestError>,
}

impl Default for RequestState {
    fn default() -> Self {
        Self {
            corp_num: String::new(),
            conflict_id: None,
            name: String::new(),
            name_original: String::new(),
            assumed_name_original: String::new(),
            folio_number: None,
            edit_mode: false,
            priority_request: false,
            acting_on_own_behalf: false,
            is_persons_name: false,
            name_is_english: true,
            user_cancelled_analysis: false,
            name_analysis_timed_out: false,
            no_corp_num: false,
            get_name_reservation_failed: false,
            is_loading_submission: false,
            request_examination_or_provide_consent: false,
            entity_type_cd: EntityType::default(),
            origin_entity_type_cd: None,
            request_action_cd: RequestAction::default(),
            conversion_type: None,
            location: Location::default(),
            request_jurisdiction_cd: None,
            do_not_analyze_entities: EntityType::default_do_not_analyze(),
            step: WizardStep::default(),
            search_tab: SearchTab::default(),
            active_modal: None,
            issue_index: 0,
            applicant: Applicant::default(),
            nr: Tracked::default(),
            name_choices: NameChoices::default(),
            nr_request_name_map: Vec::new(),
            search: SearchState::default(),
            existing_request_search: ExistingRequestSearch::default(),
            waiting_address_search: None,
            quick_search_names: Lookup::default(),
            address_suggestions: Lookup::default(),
            analysis: Lookup::default(),
            designation_issue_types: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl RequestState {
    /// Whether the given dialog is the one on screen
    pub fn is_modal_visible(&self, modal: &Modal) -> bool {
        self.active_modal
            .as_ref()
            .is_some_and(|active| active.same_kind(modal))
    }

    /// Failure carried by the visible affiliation error dialog
    pub fn affiliation_error_modal_value(&self) -> Option<AffiliationFailure> {
        match self.active_modal {
            Some(Modal::AffiliationError(failure)) => Some(failure),
            _ => None,
        }
    }

    /// Index of the search tab (0 = new request, 1 = existing request)
    pub fn tab_number(&self) -> u8 {
        self.search_tab.number()
    }

    /// Index of the submission tab, when submitting
    pub fn submission_tab_number(&self) -> Option<u8> {
        self.step.submission_tab().map(|tab| tab.number())
    }

    /// Names for the current entity type skip analysis and go to an examiner
    pub fn requires_examination(&self) -> bool {
        self.do_not_analyze_entities.contains(&self.entity_type_cd)
    }

    /// Whether the reservation record has unsaved edits
    pub fn is_dirty(&self) -> bool {
        self.nr.is_dirty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_error_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn error_amalgamate_now(&self) -> bool {
        self.has_error_kind(ErrorKind::AmalgamateNow)
    }

    pub fn error_continuation_in(&self) -> bool {
        self.has_error_kind(ErrorKind::ContinuationIn)
    }

    pub fn error_incorporate_now(&self) -> bool {
        self.has_error_kind(ErrorKind::IncorporateNow)
    }

    /// Append an error, keeping earlier ones in order
    pub fn push_error(&mut self, error: RequestError) {
        self.errors.push(error);
    }

    /// Number of issues in the current analysis result
    pub fn issue_count(&self) -> usize {
        self.analysis
            .value()
            .as_ref()
            .map_or(0, |result| result.issues.len())
    }

    /// Move to the next analysis issue
    pub fn next_issue(&mut self) {
        let count = self.issue_count();
        if count > 0 && self.issue_index < count - 1 {
            self.issue_index += 1;
        }
    }

    /// Move to the previous analysis issue
    pub fn prev_issue(&mut self) {
        self.issue_index = self.issue_index.saturating_sub(1);
    }

    /// Replace the analysis result and reset the issue cursor
    pub fn set_analysis(&mut self, result: Option<AnalysisResult>) {
        self.analysis.set(result);
        self.refresh_analysis();
    }

    /// Apply an analysis response unless a newer one already landed
    pub fn complete_analysis(&mut self, ticket: LookupTicket, result: AnalysisResult) -> bool {
        if !self.analysis.complete(ticket, Some(result)) {
            return false;
        }
        self.refresh_analysis();
        true
    }

    fn refresh_analysis(&mut self) {
        let result = self.analysis.value().as_ref();
        self.designation_issue_types = result
            .map(AnalysisResult::designation_issue_types)
            .unwrap_or_default();
        self.conflict_id = result
            .and_then(|r| r.first_conflict())
            .map(|c| c.id.clone());
        self.issue_index = 0;
    }

    /// Rebuild the name choices, their slot mapping and the current name
    /// from the working record. With no names on the record the current
    /// name falls back to `name_original`.
    pub fn sync_names_from_record(&mut self) {
        let record = self.nr.working();
        let choice = |number: usize| {
            u8::try_from(number)
                .ok()
                .and_then(|n| record.name_for_choice(n))
                .filter(|entry| !entry.name.trim().is_empty())
                .map(|entry| NameChoice {
                    name: entry.name.trim().to_string(),
                    designation: entry.designation.clone(),
                })
        };
        let mut filled = (1..=MAX_NAME_CHOICES).map(choice);
        self.name_choices = NameChoices {
            name1: filled.next().flatten(),
            name2: filled.next().flatten(),
            name3: filled.next().flatten(),
        };
        self.nr_request_name_map = self
            .name_choices
            .filled()
            .map(|(number, name)| RequestNameMapping::from_choice(number, name))
            .collect();
        self.name = match self.nr_request_name_map.first() {
            Some(first) => first.name.clone(),
            None => self.name_original.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::records::{AnalysisIssue, AnalysisStatus, Conflict, IssueType, NameEntry};
    use crate::state::SubmissionTab;
    use pretty_assertions::assert_eq;

    const ALL_MODALS: [Modal; 12] = [
        Modal::Conditions,
        Modal::Exit,
        Modal::HelpMeChoose,
        Modal::IncorporateLogin,
        Modal::LocationInfo,
        Modal::MrasSearchInfo,
        Modal::NrRequired,
        Modal::PickEntityOrConversion,
        Modal::PickRequestType,
        Modal::ConfirmName,
        Modal::Receipt,
        Modal::AffiliationError(AffiliationFailure::AffiliationFailed),
    ];

    fn analysis_with_issues(count: usize) -> AnalysisResult {
        AnalysisResult {
            status: AnalysisStatus::NotAvailable,
            issues: (0..count)
                .map(|i| AnalysisIssue {
                    issue_type: IssueType::CorporateConflict,
                    line1: format!("issue {i}"),
                    conflicts: vec![Conflict {
                        name: format!("CONFLICT {i}"),
                        id: format!("BC000000{i}"),
                        source: "corp".to_string(),
                    }],
                    designations: vec![],
                })
                .collect(),
        }
    }

    mod defaults {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_no_modal_visible() {
            let state = RequestState::default();
            for modal in &ALL_MODALS {
                assert!(!state.is_modal_visible(modal));
            }
            assert!(state.affiliation_error_modal_value().is_none());
        }

        #[test]
        fn test_lists_are_empty() {
            let state = RequestState::default();
            assert!(state.errors.is_empty());
            assert!(state.nr_request_name_map.is_empty());
            assert!(state.designation_issue_types.is_empty());
            assert!(state.quick_search_names.value().is_empty());
            assert!(state.address_suggestions.value().is_empty());
            assert!(state.analysis.value().is_none());
        }

        #[test]
        fn test_initial_navigation() {
            let state = RequestState::default();
            assert_eq!(state.tab_number(), 0);
            assert_eq!(state.submission_tab_number(), None);
            assert!(!state.edit_mode);
            assert_eq!(state.step, WizardStep::Search);
        }

        #[test]
        fn test_default_is_clean() {
            assert!(!RequestState::default().is_dirty());
        }
    }

    mod modal_visibility {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_only_active_modal_visible() {
            let state = RequestState {
                active_modal: Some(Modal::Conditions),
                ..Default::default()
            };
            let visible = ALL_MODALS
                .iter()
                .filter(|m| state.is_modal_visible(m))
                .count();
            assert_eq!(visible, 1);
        }

        #[test]
        fn test_affiliation_value() {
            let state = RequestState {
                active_modal: Some(Modal::AffiliationError(
                    AffiliationFailure::AlreadyAffiliated,
                )),
                ..Default::default()
            };
            assert_eq!(
                state.affiliation_error_modal_value(),
                Some(AffiliationFailure::AlreadyAffiliated)
            );
        }
    }

    mod errors {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_action_flags_follow_error_kinds() {
            let mut state = RequestState::default();
            assert!(!state.error_amalgamate_now());
            state.push_error(RequestError::new(ErrorKind::AmalgamateNow, "not eligible"));
            assert!(state.error_amalgamate_now());
            assert!(!state.error_continuation_in());
            assert!(!state.error_incorporate_now());
        }

        #[test]
        fn test_push_preserves_order() {
            let mut state = RequestState::default();
            state.push_error(RequestError::validation("first"));
            state.push_error(RequestError::validation("second"));
            let messages: Vec<_> = state.errors.iter().map(|e| e.message.as_str()).collect();
            assert_eq!(messages, vec!["first", "second"]);
        }
    }

    mod issues {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_next_issue_clamps() {
            let mut state = RequestState::default();
            state.set_analysis(Some(analysis_with_issues(2)));
            state.next_issue();
            state.next_issue();
            state.next_issue();
            assert_eq!(state.issue_index, 1);
        }

        #[test]
        fn test_prev_issue_clamps() {
            let mut state = RequestState::default();
            state.prev_issue();
            assert_eq!(state.issue_index, 0);
        }

        #[test]
        fn test_next_issue_without_analysis() {
            let mut state = RequestState::default();
            state.next_issue();
            assert_eq!(state.issue_index, 0);
        }

        #[test]
        fn test_set_analysis_resets_cursor_and_conflict() {
            let mut state = RequestState::default();
            state.set_analysis(Some(analysis_with_issues(3)));
            state.next_issue();
            assert_eq!(state.conflict_id.as_deref(), Some("BC0000000"));

            state.set_analysis(None);
            assert_eq!(state.issue_index, 0);
            assert!(state.conflict_id.is_none());
        }
    }

    #[test]
    fn test_stale_analysis_is_ignored() {
        let mut state = RequestState::default();
        let first = state.analysis.begin();
        let second = state.analysis.begin();
        assert!(state.complete_analysis(second, analysis_with_issues(2)));
        assert!(!state.complete_analysis(first, analysis_with_issues(5)));
        assert_eq!(state.issue_count(), 2);
    }

    #[test]
    fn test_requires_examination_follows_exclusion_list() {
        let mut state = RequestState::default();
        assert!(!state.requires_examination());
        state.entity_type_cd = EntityType::FinancialInstitution;
        assert!(state.requires_examination());
        state.do_not_analyze_entities.clear();
        assert!(!state.requires_examination());
    }

    #[test]
    fn test_submission_tab_number() {
        let state = RequestState {
            step: WizardStep::Submission(SubmissionTab::Contact),
            ..Default::default()
        };
        assert_eq!(state.submission_tab_number(), Some(2));
    }

    #[test]
    fn test_sync_names_orders_by_choice() {
        let mut state = RequestState::default();
        state.nr.working_mut().names = vec![
            NameEntry {
                choice: 2,
                name: "Beta Holdings".to_string(),
                ..Default::default()
            },
            NameEntry {
                choice: 1,
                name: "Alpha Holdings".to_string(),
                designation: Some("Ltd.".to_string()),
                ..Default::default()
            },
        ];
        state.sync_names_from_record();
        let names: Vec<_> = state
            .nr_request_name_map
            .iter()
            .map(|m| (m.choice, m.name.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "Alpha Holdings"), (2, "Beta Holdings")]);
        assert_eq!(state.name, "Alpha Holdings");
        assert_eq!(
            state.name_choices.name1,
            Some(NameChoice::new("Alpha Holdings", Some("Ltd.")))
        );
        assert!(state.name_choices.name3.is_none());
    }

    #[test]
    fn test_sync_without_names_falls_back_to_original_name() {
        let mut state = RequestState {
            name: "EDITED".to_string(),
            name_original: "SEARCHED NAME".to_string(),
            ..Default::default()
        };
        state.name_choices = NameChoices::from_names([NameChoice::new("EDITED", None)]);
        state.sync_names_from_record();
        assert_eq!(state.name, "SEARCHED NAME");
        assert!(state.name_choices.is_empty());
        assert!(state.nr_request_name_map.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let mut state = RequestState {
            corp_num: "BC0012345".to_string(),
            name: "ACME WIDGETS".to_string(),
            priority_request: true,
            entity_type_cd: EntityType::Cooperative,
            origin_entity_type_cd: Some(EntityType::BcCorporation),
            conversion_type: Some(ConversionType::LimitedToBenefit),
            request_jurisdiction_cd: Some(Jurisdiction::Ontario),
            step: WizardStep::Submission(SubmissionTab::Applicant),
            search_tab: SearchTab::ExistingRequest,
            active_modal: Some(Modal::AffiliationError(AffiliationFailure::BusinessNotFound)),
            waiting_address_search: Some(AddressQuery {
                search_term: "123 Main".to_string(),
                country: "CA".to_string(),
                last_id: None,
            }),
            ..Default::default()
        };
        state.nr.working_mut().nr_num = Some("NR 1234567".to_string());
        state.set_analysis(Some(analysis_with_issues(1)));
        state.push_error(RequestError::new(ErrorKind::Search, "timeout").with_context("quick"));

        let json = serde_json::to_string(&state).unwrap();
        let parsed: RequestState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
        assert!(parsed.is_dirty());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: RequestState = serde_json::from_str(r#"{"name": "ACME"}"#).unwrap();
        assert_eq!(parsed.name, "ACME");
        assert!(parsed.name_is_english);
        assert_eq!(
            parsed.do_not_analyze_entities,
            EntityType::default_do_not_analyze()
        );
    }
}
