/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - hand the verified Principal to handlers
 * - axum-specific code lives in core; the Principal type lives in services::auth
 */

mod core;

pub use self::core::AuthCtx;
