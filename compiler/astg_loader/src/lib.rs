//! Go package resolution and loading.
//!
//! [`PackageResolver`] maps import paths to directories (or built-in
//! shims); [`PackageLoader`] parses packages, caches them per path and
//! answers declaration-level questions: what a named type is defined as,
//! which methods it has and which interfaces it satisfies.

mod env;
mod error;
mod gomod;
mod loader;
mod package;
mod resolver;
pub mod shims;
pub mod ty;

pub use env::GoEnv;
pub use error::{LoadError, ResolveError, Result};
pub use gomod::{GoMod, Replace, ReplaceTarget, Require};
pub use loader::{
    is_exported, FuncInfo, LoadMode, MethodDecl, MethodEntry, NamedDecl, PackageLoader,
};
pub use package::{DeclRef, PackageInfo};
pub use resolver::{escape_path, unescape_path, PackageResolver, PackageSource};
pub use ty::{identical, identical_signatures, NamedRef, Signature, Ty};
