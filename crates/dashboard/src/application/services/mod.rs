//! REST-backed application services.

mod collection_api;

pub use collection_api::CollectionApi;
