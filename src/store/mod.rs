//! Persistence layer — the remote session store contract and its libSQL
//! implementation.

pub mod libsql_backend;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::SessionStore;
