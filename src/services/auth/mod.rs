pub mod factory;
pub mod keys;
pub mod principal;
pub mod token;

pub use factory::build_token_validator;
pub use keys::{KeyError, SigningKeys, StaticKeys};
pub use principal::{Claim, Principal};
pub use token::{TokenError, TokenSettings, TokenValidator};
