/*
 * Responsibility
 * - middleware public interface
 * - auth (token validation, policy guard), fault translation, transport layers
 */
pub mod auth;
pub mod faults;
pub mod http;
