//! Language adapters for documentation comments.
//!
//! An adapter turns a documentation reference declared by a page (usually a
//! glob of source files) into raw doclets, then groups those doclets by kind.
//! The [`AdapterRegistry`] holds the adapters active for a build and runs them
//! on behalf of the page parser.

pub mod annotations;
pub mod files;
pub mod registry;
pub mod sass;
pub mod script;
pub mod traits;

pub use registry::AdapterRegistry;
pub use sass::SassAdapter;
pub use script::ScriptAdapter;
pub use traits::{
    AdapterError, AdapterRef, AdapterResolution, CategorizedDoclets, DocAdapter, RawDoclets,
};
