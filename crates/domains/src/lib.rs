//! # domains
//!
//! The central domain logic and interface definitions for petboard:
//! entities, ports, the access policy, validation, and listing types.
//! This crate performs no I/O.

pub mod errors;
pub mod models;
pub mod policy;
pub mod ports;
pub mod query;
pub mod validation;

pub use errors::{DomainError, FieldError, Result, ValidationErrors};
pub use models::*;
pub use ports::*;
pub use query::{CreatedWindow, Page, PageResult, PetFilter};
