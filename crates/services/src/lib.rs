//! # services
//!
//! Use-case orchestration over the `domains` ports: pet lifecycle,
//! reviews, and account management. Handlers and binaries talk to these
//! services; only adapters talk to the outside world.

pub mod pets;
pub mod reviews;
pub mod users;

pub use pets::{PetListing, PetService, PAGE_SIZE, VIEWS_PER_NOTICE};
pub use reviews::ReviewService;
pub use users::UserService;

#[cfg(test)]
pub(crate) mod testing;
