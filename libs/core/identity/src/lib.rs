//! Identity authority primitives: session signing, password hashing, and
//! reset-token generation. These are pure, store-agnostic building blocks —
//! the operations that need a lookup (`authenticate`, `require_operator`,
//! `issue_password_reset`) are orchestrated by the server's handlers,
//! which combine these primitives with `lunasentri-infra-store`.

mod error;
mod password;
mod reset;
mod session;

pub use error::IdentityError;
pub use password::{hash_password, verify_password};
pub use reset::{generate_reset_token, hash_reset_token};
pub use session::SessionSigner;
