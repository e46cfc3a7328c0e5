/*
 * Responsibility
 * - v1 public surface (operations() re-export, handlers, extractors)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::operations;
