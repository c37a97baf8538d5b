use thiserror::Error;

use appointment_cell::models::AppointmentError;
use shared_models::AppError;

#[derive(Error, Debug)]
pub enum BookingQueueError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment error: {0}")]
    Appointment(#[from] AppointmentError),

    #[error("No async runtime to run matching on: {0}")]
    RuntimeUnavailable(String),
}

impl From<BookingQueueError> for AppError {
    fn from(err: BookingQueueError) -> Self {
        match err {
            BookingQueueError::ValidationError(msg) => AppError::ValidationError(msg),
            BookingQueueError::Appointment(e) => e.into(),
            BookingQueueError::RuntimeUnavailable(msg) => AppError::Internal(msg),
        }
    }
}
