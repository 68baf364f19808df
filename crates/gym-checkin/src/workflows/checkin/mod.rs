//! Kiosk check-in: DNI form, membership decision, visit logging, and the page that shows it.

pub mod csrf;
pub mod domain;
pub mod form;
pub mod processor;
pub mod router;
pub mod view;

#[cfg(test)]
mod tests;

pub use csrf::{CsrfError, CsrfToken};
pub use domain::{CheckInError, CheckInResult, MemberDisplay};
pub use form::{validate_dni, CheckInForm, CheckInRequest, DniError};
pub use processor::{CheckInProcessor, Clock};
pub use router::{checkin_router, KioskState};
pub use view::{render_page, KioskPage};
