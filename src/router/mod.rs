//! HTTP routes and their request/response plumbing.
pub mod negotiate;
pub mod users;
