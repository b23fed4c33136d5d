use validator::{Validate, ValidationErrors};

use crate::error::{AppError, Res};

/// Flattens `validator` output into the human readable messages
/// returned in the `details` list of a validation error.
pub fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages
}

/// Runs the derived validators of a request body.
pub fn validate<T: Validate>(input: &T) -> Res<()> {
    input
        .validate()
        .map_err(|errors| AppError::Validation(messages(&errors)))
}
