//! A user API declared with TokenDSL.
//!
//! Five endpoints under `/api/users` backed by an in-memory [`UserStore`].
//! Unknown ids answer `404 {"error": "User not found"}`.

#![forbid(unsafe_code)]

pub mod store;
pub mod users;

pub use store::{NewUser, User, UserPatch, UserStore};
pub use users::{api, USER_NOT_FOUND};
