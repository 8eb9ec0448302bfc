//! # tdc-core: query model
//!
//! Everything the console knows about a query before it leaves the process
//! and after a result page comes back:
//!
//! - [`schema`]: per-collection field definitions ([`SchemaRegistry`]).
//! - [`query`]: the advanced [`Query`], the flat [`SimpleQuery`] and the
//!   [`QueryEditor`] that keeps clauses bound to the schema.
//! - [`request`]: endpoint and body for each query form.
//! - [`present`]: columns, cell strategies and paging for a [`ResultPage`].
//! - [`templates`]: predefined queries and quick-start examples.
//!
//! Filtering, joining, sorting and paging themselves happen on the remote
//! Query Service.

pub mod error;
pub mod present;
pub mod query;
pub mod request;
pub mod schema;
pub mod templates;

pub use error::{ClauseKind, EditError, SchemaError, TemplateError};
pub use present::{present, Cell, PageNav, ResultPage, ResultTable};
pub use query::{Query, QueryEditor, SimpleQuery, SimpleQueryPatch};
pub use request::QueryRequest;
pub use schema::{CollectionSchema, FieldSchema, FieldType, SchemaRegistry};
pub use templates::{PredefinedQueries, QueryTemplate, QuickStartExample};
