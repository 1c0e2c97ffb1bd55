//! Named boolean flags packed into one integer column of a record.
//!
//! A [`FlagRegistry`] holds the flag columns of a record type. Each column is
//! a [`FlagDefinition`] mapping flag names to bit positions; records only
//! keep the integer, reached through the [`FlagStore`] trait.

pub extern crate flags_column_derive;

mod error;
mod truthy;
pub mod definition;
pub mod store;
pub mod column;
pub mod registry;
pub mod dispatch;
pub mod schema;
pub mod typed;

pub use error::{
    Error,
    Result,
};
pub use truthy::{
    FlagValue,
    Truthy,
};
pub use definition::{
    Bits,
    FlagDefinition,
    FlagDefinitionBuilder,
};
pub use store::{
    FlagStore,
    Record,
};
pub use column::{
    Column,
    ColumnMut,
};
pub use registry::{
    ColumnOptions,
    FlagRegistry,
};
pub use dispatch::Response;
pub use schema::Schema;
pub use typed::TypedColumn;
pub use flags_column_derive::flags_column;
