//! User accounts.
//!
//! Provides the user model, password hashing, and validation of new users.

pub mod credentials;
mod model;
mod validation;

pub use credentials::{check_login, hash_password, verify_password};
pub use model::{NewUser, User, UserQuery, parse_seed};
pub use validation::{ValidationError, ValidationResult, validate_user};
