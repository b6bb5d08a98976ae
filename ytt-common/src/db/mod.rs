//! Analytical store: schema, connections, staged rebuilds and row models

pub mod init;
pub mod models;
pub mod schema;
pub mod staging;
pub mod table_schemas;

pub use init::*;
pub use models::*;
pub use schema::*;
pub use staging::*;
pub use table_schemas::*;
