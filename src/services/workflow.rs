//! Drives registry lookups into a session
//!
//! Each lookup is split into `begin_*` (issue a ticket), the service call,
//! and `finish_*` (apply the response). The `run_*` helpers do all three in
//! one await. Callers running lookups concurrently can use the split form;
//! the tickets make sure a late response never overwrites a newer one.

use super::traits::{ApiError, ApiResult, NameRequestApi};
use crate::error::{ErrorKind, RequestError, SessionError, SessionResult};
use crate::session::Session;
use crate::state::{
    AddressQuery, AddressSuggestion, AnalysisQuery, AnalysisResult, LookupTicket, NameRequest,
    QuickSearchName, WizardStep,
};
use tracing::{debug, warn};

/// Names shorter than this are not sent to quick search
pub const MIN_QUICK_SEARCH_LEN: usize = 3;

/// Normalize a name request number to the `NR 1234567` form.
///
/// Accepts an optional `NR` prefix in any case, with or without a space.
pub fn parse_nr_number(input: &str) -> SessionResult<String> {
    let trimmed = input.trim();
    let digits = match (trimmed.get(..2), trimmed.get(2..)) {
        (Some(prefix), Some(rest)) if prefix.eq_ignore_ascii_case("NR") => rest.trim_start(),
        _ => trimmed,
    };

    if digits.len() == 7 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(format!("NR {digits}"))
    } else {
        Err(SessionError::InvalidNrNumber(input.to_string()))
    }
}

/// A session paired with the services it talks to
pub struct Workflow<C> {
    client: C,
    session: Session,
}

impl<C: NameRequestApi> Workflow<C> {
    pub fn new(client: C, session: Session) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Search the registry for names similar to `name`.
    /// Returns whether the response was applied.
    pub async fn run_quick_search(&mut self, name: &str) -> SessionResult<bool> {
        let Some(ticket) = self.begin_quick_search(name)? else {
            return Ok(false);
        };
        let result = self.client.quick_search(name.trim()).await;
        self.finish_quick_search(ticket, result)
    }

    /// Issue a quick search ticket. Short names clear the results instead.
    pub fn begin_quick_search(&mut self, name: &str) -> SessionResult<Option<LookupTicket>> {
        let state = self.session.state_mut()?;
        if name.trim().chars().count() < MIN_QUICK_SEARCH_LEN {
            state.quick_search_names.clear();
            return Ok(None);
        }
        Ok(Some(state.quick_search_names.begin()))
    }

    pub fn finish_quick_search(
        &mut self,
        ticket: LookupTicket,
        result: ApiResult<Vec<QuickSearchName>>,
    ) -> SessionResult<bool> {
        let state = self.session.state_mut()?;
        match result {
            Ok(names) => {
                let applied = state.quick_search_names.complete(ticket, names);
                if !applied {
                    debug!(seq = ticket.seq(), "discarded stale quick search response");
                }
                Ok(applied)
            }
            Err(err) => {
                // A newer search still in flight will replace the results
                if state.quick_search_names.fail(ticket) && !state.quick_search_names.is_waiting() {
                    self.session.record_error(
                        RequestError::new(ErrorKind::Search, "Name search is unavailable")
                            .with_context(err.to_string()),
                    )?;
                }
                Ok(false)
            }
        }
    }

    /// Look up address completions for the applicant form
    pub async fn run_address_search(&mut self, query: AddressQuery) -> SessionResult<bool> {
        let ticket = self.begin_address_search(query.clone())?;
        let result = self.client.address_search(&query).await;
        self.finish_address_search(ticket, result)
    }

    pub fn begin_address_search(&mut self, query: AddressQuery) -> SessionResult<LookupTicket> {
        let state = self.session.state_mut()?;
        state.waiting_address_search = Some(query);
        Ok(state.address_suggestions.begin())
    }

    pub fn finish_address_search(
        &mut self,
        ticket: LookupTicket,
        result: ApiResult<Vec<AddressSuggestion>>,
    ) -> SessionResult<bool> {
        let state = self.session.state_mut()?;
        let (applied, failure) = match result {
            Ok(suggestions) => (state.address_suggestions.complete(ticket, suggestions), None),
            Err(err) => {
                let failed = state.address_suggestions.fail(ticket)
                    && !state.address_suggestions.is_waiting();
                (false, failed.then_some(err))
            }
        };
        if !state.address_suggestions.is_waiting() {
            state.waiting_address_search = None;
        }

        if let Some(err) = failure {
            self.session.record_error(
                RequestError::new(ErrorKind::AddressLookup, "Address lookup failed")
                    .with_context(err.to_string()),
            )?;
        }
        Ok(applied)
    }

    /// Analyze the current name, or route it to examination when its
    /// entity type is never auto-analyzed.
    pub async fn run_analysis(&mut self) -> SessionResult<bool> {
        let Some((ticket, query)) = self.begin_analysis()? else {
            return Ok(false);
        };
        let result = self.client.analyze_name(&query).await;
        self.finish_analysis(ticket, result)
    }

    pub fn begin_analysis(&mut self) -> SessionResult<Option<(LookupTicket, AnalysisQuery)>> {
        let state = self.session.state();
        let name = state.name.trim().to_string();
        if name.is_empty() {
            self.session
                .record_error(RequestError::validation("Enter a name to analyze"))?;
            return Ok(None);
        }

        if state.requires_examination() {
            debug!(entity_type = %state.entity_type_cd, "entity type is not analyzed");
            self.session.go_to(WizardStep::SendToExamination)?;
            return Ok(None);
        }

        let query = AnalysisQuery {
            name,
            location: state.location,
            entity_type_cd: state.entity_type_cd,
            request_action_cd: state.request_action_cd,
        };

        self.session.go_to(WizardStep::AnalyzePending)?;
        let state = self.session.state_mut()?;
        state.user_cancelled_analysis = false;
        state.name_analysis_timed_out = false;
        Ok(Some((state.analysis.begin(), query)))
    }

    pub fn finish_analysis(
        &mut self,
        ticket: LookupTicket,
        result: ApiResult<AnalysisResult>,
    ) -> SessionResult<bool> {
        let state = self.session.state_mut()?;
        if state.user_cancelled_analysis || state.step != WizardStep::AnalyzePending {
            state.analysis.fail(ticket);
            debug!(seq = ticket.seq(), "analysis response arrived after leaving the step");
            return Ok(false);
        }

        if result.is_err() {
            if !state.analysis.fail(ticket) {
                return Ok(false);
            }
            if state.analysis.is_waiting() {
                debug!(seq = ticket.seq(), "analysis failed but a newer request is pending");
                return Ok(false);
            }
        }

        match result {
            Ok(analysis) => {
                if !state.complete_analysis(ticket, analysis) {
                    debug!(seq = ticket.seq(), "discarded stale analysis response");
                    return Ok(false);
                }
                if state.analysis.is_waiting() {
                    return Ok(true);
                }
                self.session.go_to(WizardStep::AnalyzeResults)?;
                Ok(true)
            }
            Err(ApiError::Timeout) => {
                warn!("name analysis timed out");
                state.name_analysis_timed_out = true;
                self.session.record_error(RequestError::new(
                    ErrorKind::Analysis,
                    "Name analysis is taking too long; the name can be sent to an examiner",
                ))?;
                self.session.go_to(WizardStep::SendToExamination)?;
                Ok(false)
            }
            Err(err) => {
                self.session.record_error(
                    RequestError::new(ErrorKind::Analysis, "Name analysis failed")
                        .with_context(err.to_string()),
                )?;
                self.session.go_to(WizardStep::Search)?;
                Ok(false)
            }
        }
    }

    /// Abandon a pending analysis and return to the search step
    pub fn cancel_analysis(&mut self) -> SessionResult<()> {
        let state = self.session.state_mut()?;
        state.user_cancelled_analysis = true;
        state.set_analysis(None);
        if state.step == WizardStep::AnalyzePending {
            self.session.go_to(WizardStep::Search)?;
        }
        Ok(())
    }

    /// Retrieve an existing reservation using the existing request search
    /// fields. Returns whether a record was loaded.
    pub async fn retrieve_request(&mut self) -> SessionResult<bool> {
        let from = self.session.state().step;
        if !from.can_transition_to(WizardStep::ExistingRequestDisplay) {
            return Err(SessionError::InvalidTransition {
                from,
                to: WizardStep::ExistingRequestDisplay,
            });
        }
        let search = self.session.state().existing_request_search.clone();
        let nr_num = parse_nr_number(&search.nr_num)?;
        if !search.is_complete() {
            self.session.record_error(RequestError::validation(
                "Enter the email address or phone number on the request",
            ))?;
            return Ok(false);
        }
        let contact = if search.email_address.trim().is_empty() {
            search.phone_number.trim().to_string()
        } else {
            search.email_address.trim().to_string()
        };

        let result = self.client.fetch_request(&nr_num, &contact).await;
        self.finish_retrieve(&nr_num, result)
    }

    fn finish_retrieve(
        &mut self,
        nr_num: &str,
        result: ApiResult<NameRequest>,
    ) -> SessionResult<bool> {
        match result {
            Ok(nr) => {
                self.session.load_request(nr)?;
                let state = self.session.state_mut()?;
                state.get_name_reservation_failed = false;
                state.existing_request_search.nr_num = nr_num.to_string();
                self.session.go_to(WizardStep::ExistingRequestDisplay)?;
                Ok(true)
            }
            Err(err) => {
                self.session.state_mut()?.get_name_reservation_failed = true;
                let message = match err {
                    ApiError::NotFound => "No name request matches the details entered",
                    _ => "Unable to retrieve the name request",
                };
                self.session.record_error(
                    RequestError::new(ErrorKind::Reservation, message)
                        .with_context(format!("{nr_num}: {err}")),
                )?;
                Ok(false)
            }
        }
    }
}
