//! Client core for a campus course-management API: cookie-session gateway,
//! session store, route access guard, and per-page enrollment view-models,
//! plus the interactive console they drive.

pub mod error;
pub mod models;
pub mod gateway;
pub mod session;
pub mod guard;
pub mod enrollment;
pub mod console;

#[cfg(test)]
mod error_tests;
