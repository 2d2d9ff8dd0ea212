mod response;

pub use response::{format_response, greeting_body, reason_phrase, rejection_body};
