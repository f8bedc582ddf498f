pub mod google;
pub mod session;

pub use google::{GoogleIdentity, GoogleVerifier, IdentityVerifier};
pub use session::{Claims, SessionKeys};
