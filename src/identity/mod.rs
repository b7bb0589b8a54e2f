//! Identity Store
//!
//! Maps a login to a stable account id. The first successful
//! authentication of a login creates the account with its starting balance.

mod password;
mod store;

pub use password::{hash_password, verify_password};
pub use store::IdentityStore;
