pub mod app_error;
pub mod form_data;
pub mod handler_404;
pub mod session_cookie;
pub mod token_validator;
