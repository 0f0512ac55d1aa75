//! # pgjoin
//!
//! A typed multi-table join query builder for PostgreSQL.
//!
//! ## Features
//!
//! - **Typed fields**: `Field<E>` constants generated by `#[derive(Entity)]` resolve to
//!   `alias.column` against the tables actually joined into the query
//! - **Select modes**: the master table selects everything, joined tables nothing, until
//!   you opt columns in or out per table
//! - **Automatic scoping**: tenant and soft-delete predicates are injected at render time,
//!   unless the caller already constrains those columns
//! - **Parameterized output**: `$n` placeholders plus a `ParamList`, and a fully inlined
//!   statement for logs
//! - **Pluggable execution**: any `JoinExecutor`; `tokio-postgres` clients and
//!   `deadpool-postgres` pools are supported out of the box
//!
//! ## Example
//!
//! ```ignore
//! use pgjoin::{Entity, JoinConfig, QueryJoin};
//!
//! #[derive(Entity)]
//! #[join(table = "user")]
//! struct User {
//!     #[join(id)]
//!     id: i64,
//!     name: String,
//!     role_id: i64,
//! }
//!
//! #[derive(Entity)]
//! #[join(table = "role")]
//! struct Role {
//!     #[join(id)]
//!     id: i64,
//!     name: String,
//! }
//!
//! let stmt = QueryJoin::<User>::create(JoinConfig::default())?
//!     .left_join::<Role>()
//!     .on(User::ROLE_ID, Role::ID)
//!     .select_as(Role::NAME, "role_name")
//!     .eq(User::NAME, "alice")
//!     .statement()?;
//!
//! // SELECT role.name AS role_name,user.id AS id,user.name AS name,user.role_id AS role_id
//! // FROM user AS user LEFT JOIN role AS role ON user.role_id = role.id
//! // WHERE user.name = $1
//! println!("{}", stmt.sql());
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod exec;
pub mod expr;
pub mod ident;
pub mod join;
pub mod metadata;
pub mod param;
pub mod query;
pub mod resolve;
pub mod statement;
pub mod table;
pub mod value;

pub use config::{DuplicateJoinPolicy, JoinConfig, JoinSettings, StaticTenant, TenantSource};
pub use entity::{Entity, EntityDescriptor, Field, FieldMeta, FieldRef, KeyMeta};
pub use error::{BuildError, BuildResult, JoinError, JoinResult};
pub use exec::{ClientExecutor, GenericClient, JoinExecutor, RowMap, from_row_map};
#[cfg(feature = "pool")]
pub use exec::PoolExecutor;
pub use expr::{Condition, Expr};
pub use join::{JoinKind, OnClause};
pub use metadata::{DescriptorRegistry, EntityRegistration};
pub use param::{Param, ParamList};
pub use query::QueryJoin;
pub use resolve::{IntoColumn, ResolvedColumn};
pub use statement::{Page, PageRequest, Statement};
pub use table::{SelectMode, TableEntry, TableRegistry};
pub use value::SqlValue;

// Re-export inventory for derive macro use
#[doc(hidden)]
pub use inventory;

#[cfg(feature = "derive")]
pub use pgjoin_derive::Entity;
