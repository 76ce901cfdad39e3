//! Project model: the intermediate representation between the analyzer and
//! every renderer.
//!
//! Identity of a named type is its TypeID, `"<package_path>:<type_name>"`;
//! predeclared types use their bare name. The [`Project`] owns every
//! [`Type`]; everything else refers to types by TypeID.

mod builtin;
mod contract;
mod project;
mod status;
mod types;

pub use builtin::{
    anonymous_type_id, is_anonymous, is_builtin, package_base, split_type_id, type_id,
    ANONYMOUS_INTERFACE, ANY_TYPE_ID, CONTEXT_TYPE_ID, ERROR_TYPE_ID,
};
pub use contract::{Contract, ErrorInfo, Implementation, ImplementationMethod, Method, Variable};
pub use project::{project_id_for, GitInfo, Project, Service};
pub use status::status_text;
pub use types::{parse_struct_tag, ChanDirection, Function, Kind, StructField, Type, TypeRef};
