//! Client-side session state: the single authoritative record of who is
//! logged in for this process. Keep the public surface thin and split the
//! implementation across sub-modules.

mod store;

pub use store::{SessionSnapshot, SessionStatus, SessionStore};
