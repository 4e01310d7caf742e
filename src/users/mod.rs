use crate::state::AppState;
use axum::Router;

mod dto;
mod extractors;
pub mod handlers;
#[cfg(test)]
pub(crate) mod memory;
mod password;
pub mod repo;
pub mod repo_types;
pub mod rules;
mod services;
mod validation;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
