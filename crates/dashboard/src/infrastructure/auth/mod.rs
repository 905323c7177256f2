//! Identity-token decoding and token sources.

mod id_token;
mod token_source;

pub use id_token::from_id_token;
pub use token_source::{SessionTokenSource, StaticTokenSource};
