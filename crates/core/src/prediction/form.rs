use std::fmt;

use tracing::{debug, info, warn};

use super::debounce::{Debouncer, Ticket};
use super::result::PredictionResult;
use super::validate::{
    validate_image_present, validate_image_type, validate_text, Field, FieldErrors,
};
use crate::api::PredictionApi;
use crate::error::ApiError;
use crate::time::{Duration, Instant};

/// The uploaded site photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Multipart payload for `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub timeline_days: String,
    pub budget_utilized_percent: String,
    pub image: ImageAttachment,
}

pub type RequestId = u64;

/// Identifies one image pick whose bytes are still being read.
pub type SelectionId = u64;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded(PredictionResult),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// A submission is already pending; the attempt had no effect.
    InFlight,
    /// At least one field failed validation; messages are now on the form.
    Invalid,
    Unmounted,
}

/// Ticket for one in-flight submission.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub id: RequestId,
    pub request: PredictionRequest,
}

/// Local preview reference for the selected image (an object URL in the
/// browser). Released exactly once, when dropped.
pub struct PreviewHandle {
    url: String,
    release: Option<Box<dyn FnOnce(&str)>>,
}

impl PreviewHandle {
    pub fn new(url: impl Into<String>, release: impl FnOnce(&str) + 'static) -> Self {
        Self {
            url: url.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(&self.url);
        }
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("url", &self.url).finish()
    }
}

/// User-facing text for a failed submission.
pub fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized { message } | ApiError::Rejected { message, .. } => message.clone(),
        ApiError::Status(status) => format!("Prediction failed (HTTP {status})"),
        ApiError::Network(e) => format!("Could not reach the prediction service: {e}"),
        ApiError::Decode(_) => "Unexpected response from the prediction service".to_string(),
        ApiError::InvalidRequest(e) => format!("Could not send the image: {e}"),
    }
}

/// State of the prediction form: fields, validation, one submission at a time.
#[derive(Debug)]
pub struct PredictionForm {
    timeline_days: String,
    budget_utilized_percent: String,
    image: Option<ImageAttachment>,
    preview: Option<PreviewHandle>,
    errors: FieldErrors,
    status: SubmissionStatus,
    debounce: Debouncer<Field>,
    next_request: RequestId,
    in_flight: Option<RequestId>,
    next_selection: SelectionId,
    pending_selection: Option<SelectionId>,
    mounted: bool,
}

impl PredictionForm {
    pub fn new(settle_window: Duration) -> Self {
        Self {
            timeline_days: String::new(),
            budget_utilized_percent: String::new(),
            image: None,
            preview: None,
            errors: FieldErrors::default(),
            status: SubmissionStatus::Idle,
            debounce: Debouncer::new(settle_window),
            next_request: 1,
            in_flight: None,
            next_selection: 0,
            pending_selection: None,
            mounted: true,
        }
    }

    pub fn timeline_days(&self) -> &str {
        &self.timeline_days
    }

    pub fn budget_utilized_percent(&self) -> &str {
        &self.budget_utilized_percent
    }

    pub fn text(&self, field: Field) -> &str {
        match field {
            Field::TimelineDays => &self.timeline_days,
            Field::BudgetUtilizedPercent => &self.budget_utilized_percent,
            Field::Image => "",
        }
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    pub fn error(&self, field: Field) -> Option<&'static str> {
        self.errors.get(field)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitting)
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.mounted && !self.is_submitting() && !self.errors.has_any()
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match &self.status {
            SubmissionStatus::Succeeded(r) => Some(r),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            SubmissionStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Stores a keystroke and (re)starts that field's settle timer. The
    /// returned ticket is for hosts driving a real timer.
    pub fn set_text(&mut self, field: Field, value: &str, now: Instant) -> Option<Ticket<Field>> {
        if !self.mounted {
            return None;
        }
        match field {
            Field::TimelineDays => self.timeline_days = value.to_string(),
            Field::BudgetUtilizedPercent => self.budget_utilized_percent = value.to_string(),
            Field::Image => return None,
        }
        Some(self.debounce.schedule(field, now))
    }

    /// Timer callback: validates the field if `ticket` is still the latest.
    pub fn on_settled(&mut self, ticket: &Ticket<Field>) -> bool {
        if !self.mounted || !self.debounce.fire(ticket) {
            return false;
        }
        self.revalidate(ticket.key);
        true
    }

    /// Polling alternative to [`Self::on_settled`].
    pub fn tick(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }
        for field in self.debounce.take_due(now) {
            self.revalidate(field);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.next_deadline()
    }

    fn revalidate(&mut self, field: Field) {
        let error = validate_text(field, self.text(field));
        self.errors.set(field, error);
    }

    /// Validates the selection immediately. A non-image leaves any earlier
    /// attachment in place and reports the error; `preview` is then released.
    pub fn select_image(&mut self, image: ImageAttachment, preview: Option<PreviewHandle>) -> bool {
        match self.begin_image_selection(&image.content_type) {
            Some(id) => self.finish_image_selection(id, image, preview),
            None => false,
        }
    }

    /// First half of picking an image whose bytes arrive later. The content
    /// type is checked now; a non-image reports the error and yields `None`.
    /// Either way any earlier unfinished pick is superseded.
    pub fn begin_image_selection(&mut self, content_type: &str) -> Option<SelectionId> {
        if !self.mounted {
            return None;
        }
        self.next_selection += 1;
        self.pending_selection = None;
        if let Some(err) = validate_image_type(content_type) {
            debug!("rejected attachment of type {content_type}");
            self.errors.set(Field::Image, Some(err));
            return None;
        }
        self.pending_selection = Some(self.next_selection);
        Some(self.next_selection)
    }

    /// Applies the bytes read for pick `id`. Dropped (with its preview) if a
    /// later pick started in the meantime or the form is gone.
    pub fn finish_image_selection(
        &mut self,
        id: SelectionId,
        image: ImageAttachment,
        preview: Option<PreviewHandle>,
    ) -> bool {
        if !self.mounted || self.pending_selection != Some(id) {
            debug!("dropping superseded image read #{id}");
            return false;
        }
        self.pending_selection = None;
        if let Some(err) = validate_image_type(&image.content_type) {
            self.errors.set(Field::Image, Some(err));
            return false;
        }
        self.image = Some(image);
        // Replacing drops (and so releases) the previous preview.
        self.preview = preview;
        self.errors.set(Field::Image, None);
        true
    }

    fn validate_all(&mut self) -> bool {
        self.debounce.cancel_all();
        self.revalidate(Field::TimelineDays);
        self.revalidate(Field::BudgetUtilizedPercent);
        let image_error = validate_image_present(self.image.is_some());
        self.errors.set(Field::Image, image_error);
        !self.errors.has_any()
    }

    /// Starts a submission. Every field is re-validated regardless of pending
    /// debounce timers; nothing is sent unless all pass.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitBlocked> {
        if !self.mounted {
            return Err(SubmitBlocked::Unmounted);
        }
        if self.is_submitting() {
            return Err(SubmitBlocked::InFlight);
        }
        if !self.validate_all() {
            return Err(SubmitBlocked::Invalid);
        }
        let Some(image) = self.image.clone() else {
            return Err(SubmitBlocked::Invalid);
        };

        let id = self.next_request;
        self.next_request += 1;
        self.in_flight = Some(id);
        self.status = SubmissionStatus::Submitting;
        info!("submitting prediction request #{id}");

        Ok(SubmitTicket {
            id,
            request: PredictionRequest {
                timeline_days: self.timeline_days.clone(),
                budget_utilized_percent: self.budget_utilized_percent.clone(),
                image,
            },
        })
    }

    /// Applies the response for submission `id`. Responses for anything but
    /// the current in-flight request, or arriving after unmount, are dropped.
    pub fn complete(&mut self, id: RequestId, outcome: Result<PredictionResult, ApiError>) -> bool {
        if !self.mounted || self.in_flight != Some(id) {
            debug!("dropping stale prediction response #{id}");
            return false;
        }
        self.in_flight = None;
        self.status = match outcome {
            Ok(result) => {
                info!(
                    "prediction #{id}: stage {} at {}%",
                    result.predicted_stage, result.estimated_progress_percent
                );
                SubmissionStatus::Succeeded(result)
            }
            Err(e) => {
                warn!("prediction #{id} failed: {e}");
                SubmissionStatus::Failed(failure_message(&e))
            }
        };
        true
    }

    /// Closes the failure banner. Field values stay as typed.
    pub fn dismiss_failure(&mut self) {
        if matches!(self.status, SubmissionStatus::Failed(_)) {
            self.status = SubmissionStatus::Idle;
        }
    }

    /// Tears the form down: timers cancelled, preview released, late
    /// responses ignored from here on.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.debounce.cancel_all();
        self.preview = None;
        self.in_flight = None;
        self.pending_selection = None;
    }

    pub async fn submit(&mut self, api: &impl PredictionApi) -> Result<(), SubmitBlocked> {
        let ticket = self.begin_submit()?;
        let outcome = api.predict(&ticket.request).await;
        self.complete(ticket.id, outcome);
        Ok(())
    }
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self::new(crate::time::DEFAULT_SETTLE_WINDOW)
    }
}
