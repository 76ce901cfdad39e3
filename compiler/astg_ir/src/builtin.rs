//! Predeclared types and well-known TypeIDs.

use crate::types::Kind;

/// TypeID of the request-scoped context capability.
pub const CONTEXT_TYPE_ID: &str = "context:Context";

/// TypeID of the predeclared error interface.
pub const ERROR_TYPE_ID: &str = "error";

/// TypeID of the empty interface.
pub const ANY_TYPE_ID: &str = "any";

/// Marker found in the TypeID of an anonymous interface.
pub const ANONYMOUS_INTERFACE: &str = ":interface:anonymous";

/// Whether a TypeID names a predeclared type with no registry entry.
pub fn is_builtin(type_id: &str) -> bool {
    Kind::from_basic_name(type_id).is_some()
        || matches!(type_id, "uintptr" | "complex64" | "complex128" | "comparable")
}

/// Whether a TypeID was synthesized for an unnamed composite type.
pub fn is_anonymous(type_id: &str) -> bool {
    type_id.starts_with(':') && type_id.contains(":anonymous")
}

/// Anonymous TypeID for a composite shape: `:<shape>:anonymous:<hash>`.
pub fn anonymous_type_id(shape: &str, hash: u64) -> String {
    format!(":{shape}:anonymous:{:08x}", hash & 0xffff_ffff)
}

/// Build the TypeID of a named type.
pub fn type_id(pkg_path: &str, name: &str) -> String {
    if pkg_path.is_empty() {
        name.to_string()
    } else {
        format!("{pkg_path}:{name}")
    }
}

/// Split a TypeID into package path and type name.
///
/// Built-ins have an empty package path.
pub fn split_type_id(type_id: &str) -> (&str, &str) {
    if is_anonymous(type_id) {
        return ("", type_id);
    }
    type_id.rsplit_once(':').unwrap_or(("", type_id))
}

/// Last element of a package path.
pub fn package_base(pkg_path: &str) -> &str {
    pkg_path.rsplit('/').next().unwrap_or(pkg_path)
}
