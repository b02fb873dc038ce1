//! Session lifecycle and the operations that mutate the request state

use crate::error::{ErrorKind, RequestError, SessionError, SessionPhase, SessionResult};
use crate::state::{
    AffiliationFailure, CompanyType, ConversionType, EntityType, Modal, NameChoices, NameRequest,
    RequestAction, RequestNameMapping, RequestState, SearchTab, SubmissionTab, WizardStep,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One run of the name request wizard.
///
/// Created when the wizard starts (or a saved draft is resumed) and closed
/// by [`Session::submit`] or [`Session::cancel`]. Once closed every mutating
/// operation is refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    phase: SessionPhase,
    state: RequestState,
}

impl Session {
    /// Start a new wizard session
    pub fn start() -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            phase: SessionPhase::Active,
            state: RequestState::default(),
        };
        info!(session = %session.id, "started name request session");
        session
    }

    /// Resume a session from a previously captured state
    pub fn resume(state: RequestState) -> Self {
        let mut session = Self::start();
        session.state = state;
        info!(session = %session.id, step = ?session.state.step, "resumed name request session");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Mutable access for field edits that have no dedicated operation
    pub fn state_mut(&mut self) -> SessionResult<&mut RequestState> {
        self.ensure_active()?;
        Ok(&mut self.state)
    }

    fn ensure_active(&self) -> SessionResult<()> {
        match self.phase {
            SessionPhase::Active => Ok(()),
            phase => Err(SessionError::Closed(phase)),
        }
    }

    /// Load a reservation record, making it the new baseline
    pub fn load_request(&mut self, nr: NameRequest) -> SessionResult<()> {
        self.ensure_active()?;
        debug!(session = %self.id, nr_num = ?nr.nr_num, "loaded reservation record");
        self.state.entity_type_cd = nr.entity_type_cd;
        self.state.request_action_cd = nr.request_action_cd;
        self.state.priority_request = nr.priority_cd;
        if let Some(corp_num) = &nr.corp_num {
            self.state.corp_num = corp_num.clone();
        }
        if let Some(applicant) = nr.applicants.first() {
            self.state.applicant = applicant.clone();
        }
        if let Some(first) = nr.names.iter().min_by_key(|n| n.choice) {
            self.state.name_original = first.name.trim().to_string();
        }
        self.state.nr.rebase(nr);
        self.state.sync_names_from_record();
        self.state.edit_mode = false;
        Ok(())
    }

    /// Discard edits to the reservation record
    pub fn reset_to_original(&mut self) -> SessionResult<()> {
        self.ensure_active()?;
        self.restore_original();
        Ok(())
    }

    fn restore_original(&mut self) {
        self.state.nr.reset();
        self.state.sync_names_from_record();
        self.state.edit_mode = false;
        debug!(session = %self.id, "reset reservation record to original");
    }

    /// Store the applicant's name choices and map them onto request slots
    pub fn apply_name_choice(&mut self, choices: NameChoices) -> SessionResult<()> {
        self.ensure_active()?;
        if choices.is_empty() {
            return Err(SessionError::NoNameChoices);
        }

        let map: Vec<RequestNameMapping> = choices
            .filled()
            .map(|(choice, name)| RequestNameMapping::from_choice(choice, name))
            .collect();

        if let Some(first) = map.first() {
            self.state.name = first.name.clone();
        }
        self.state.nr.working_mut().names = map.iter().map(RequestNameMapping::to_entry).collect();
        debug!(session = %self.id, count = map.len(), "applied name choices");
        self.state.nr_request_name_map = map;
        self.state.name_choices = choices;
        Ok(())
    }

    /// Replace the visible dialog. `None` hides it.
    pub fn set_modal(&mut self, modal: Option<Modal>) -> SessionResult<()> {
        self.ensure_active()?;
        if let (Some(current), Some(next)) = (&self.state.active_modal, &modal) {
            if current != next {
                debug!(session = %self.id, from = ?current, to = ?next, "replacing visible modal");
            }
        }
        self.state.active_modal = modal;
        Ok(())
    }

    pub fn open_modal(&mut self, modal: Modal) -> SessionResult<()> {
        self.set_modal(Some(modal))
    }

    pub fn close_modal(&mut self) -> SessionResult<()> {
        self.set_modal(None)
    }

    /// Show why the reservation could not be linked to a business account
    pub fn report_affiliation_failure(&mut self, failure: AffiliationFailure) -> SessionResult<()> {
        self.record_error(RequestError::new(ErrorKind::Affiliation, failure.message()))?;
        self.open_modal(Modal::AffiliationError(failure))
    }

    /// Record an error for the applicant
    pub fn record_error(&mut self, error: RequestError) -> SessionResult<()> {
        self.ensure_active()?;
        warn!(session = %self.id, kind = ?error.kind, message = %error.message, "recorded request error");
        self.state.push_error(error);
        Ok(())
    }

    pub fn clear_errors(&mut self) -> SessionResult<()> {
        self.ensure_active()?;
        self.state.errors.clear();
        Ok(())
    }

    /// Move the wizard to another step
    pub fn go_to(&mut self, step: WizardStep) -> SessionResult<()> {
        self.ensure_active()?;
        let from = self.state.step;
        if !from.can_transition_to(step) {
            warn!(session = %self.id, ?from, to = ?step, "rejected wizard transition");
            return Err(SessionError::InvalidTransition { from, to: step });
        }
        if step == WizardStep::ExistingRequestEdit {
            let nr_state = self.state.nr.original().state;
            if !nr_state.is_editable() {
                return Err(SessionError::NotEditable(nr_state));
            }
        }
        if from != step {
            debug!(session = %self.id, ?from, to = ?step, "wizard transition");
        }
        self.state.edit_mode = step.is_editing();
        self.state.step = step;
        Ok(())
    }

    /// Switch between the new and existing request tabs
    pub fn select_tab(&mut self, tab: SearchTab) -> SessionResult<()> {
        self.ensure_active()?;
        if self.state.step != WizardStep::Search {
            return Err(SessionError::NotOnSearch(self.state.step));
        }
        self.state.search_tab = tab;
        Ok(())
    }

    /// Advance to the next submission tab. The contact tab can only be
    /// left once the applicant has a last name and an email or phone
    /// number; otherwise a validation error is recorded. Returns whether
    /// the tab changed.
    pub fn next_submission_tab(&mut self) -> SessionResult<bool> {
        let tab = self.current_submission_tab()?;
        let Some(next) = tab.next() else {
            return Ok(false);
        };
        if tab == SubmissionTab::Contact && !self.state.applicant.has_contact_details() {
            self.record_error(RequestError::validation(
                "Enter a last name and an email address or phone number",
            ))?;
            return Ok(false);
        }
        self.go_to(WizardStep::Submission(next))?;
        Ok(true)
    }

    pub fn prev_submission_tab(&mut self) -> SessionResult<bool> {
        let Some(prev) = self.current_submission_tab()?.prev() else {
            return Ok(false);
        };
        self.go_to(WizardStep::Submission(prev))?;
        Ok(true)
    }

    fn current_submission_tab(&self) -> SessionResult<SubmissionTab> {
        self.ensure_active()?;
        self.state
            .step
            .submission_tab()
            .ok_or(SessionError::NotInSubmission(self.state.step))
    }

    pub fn next_issue(&mut self) -> SessionResult<()> {
        self.ensure_active()?;
        self.state.next_issue();
        Ok(())
    }

    pub fn prev_issue(&mut self) -> SessionResult<()> {
        self.ensure_active()?;
        self.state.prev_issue();
        Ok(())
    }

    /// Change the entity type. Returns true when names of that type go
    /// straight to examination instead of analysis.
    pub fn set_entity_type(&mut self, entity_type: EntityType) -> SessionResult<bool> {
        self.ensure_active()?;
        self.state.entity_type_cd = entity_type;
        self.state.search.company_type = if entity_type.is_extraprovincial() {
            CompanyType::Extraprovincial
        } else {
            CompanyType::Local
        };
        self.state.conversion_type = None;
        self.state.origin_entity_type_cd = None;
        self.state.nr.working_mut().entity_type_cd = entity_type;
        Ok(self.state.requires_examination())
    }

    /// Select a conversion; entity types follow the conversion's endpoints
    pub fn set_conversion_type(&mut self, conversion: ConversionType) -> SessionResult<bool> {
        let requires_examination = self.set_entity_type(conversion.target())?;
        self.state.conversion_type = Some(conversion);
        self.state.origin_entity_type_cd = Some(conversion.origin());
        self.state.request_action_cd = RequestAction::Conversion;
        self.state.nr.working_mut().request_action_cd = RequestAction::Conversion;
        Ok(requires_examination)
    }

    /// Close the session after a successful submission
    pub fn submit(&mut self) -> SessionResult<()> {
        self.ensure_active()?;
        self.state.nr.commit();
        self.state.active_modal = None;
        self.state.is_loading_submission = false;
        self.phase = SessionPhase::Submitted;
        info!(session = %self.id, "submitted name request session");
        Ok(())
    }

    /// Close the session without submitting, discarding edits
    pub fn cancel(&mut self) -> SessionResult<()> {
        self.ensure_active()?;
        self.restore_original();
        self.state.active_modal = None;
        self.phase = SessionPhase::Cancelled;
        info!(session = %self.id, "cancelled name request session");
        Ok(())
    }
}
