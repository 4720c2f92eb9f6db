// Core modules implementing the record model, storage, and error modeling.
pub mod error;
pub mod record;
pub mod schema;
pub mod store;
