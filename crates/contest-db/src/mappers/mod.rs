//! Entity to model mappers
//!
//! `From<Model> for Entity` converts database rows to domain objects.

mod contest;
mod entitlement;
mod entry;
mod purchase;
mod question;
mod user;
