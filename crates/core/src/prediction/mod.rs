//! Prediction pipeline: field validation (immediate + debounced), a single
//! multipart submission, and the derived result display.

pub mod debounce;
pub mod form;
pub mod result;
pub mod validate;

pub use debounce::{Debouncer, Ticket};
pub use form::{
    failure_message, ImageAttachment, PredictionForm, PredictionRequest, PreviewHandle, RequestId,
    SelectionId, SubmissionStatus, SubmitBlocked, SubmitTicket,
};
pub use result::{PredictionResult, CHART_LABELS};
pub use validate::{Field, FieldErrors};
