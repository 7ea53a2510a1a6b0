//! Shared application state handed to every handler.

use std::sync::Arc;

use domains::SessionStore;
use services::{PetService, ReviewService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub pets: PetService,
    pub reviews: ReviewService,
    pub accounts: UserService,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(
        pets: PetService,
        reviews: ReviewService,
        accounts: UserService,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            pets,
            reviews,
            accounts,
            sessions,
        }
    }
}
