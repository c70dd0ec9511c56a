pub mod cards;
pub mod password;
pub mod plans;
pub mod sessions;

pub use cards::CardForm;
pub use password::{hash_password, validate_password, verify_password};
pub use plans::{plan_by_slug, Plan, PLANS};
pub use sessions::{SessionStore, SESSION_COOKIE};
