//! Type records and use-site references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contract::Variable;

/// Closed classification of a [`Type`].
///
/// Every source construct outside this set is classified as [`Kind::Any`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Bool,
    Byte,
    Rune,
    Error,
    #[default]
    Any,
    Array,
    Map,
    Chan,
    Struct,
    Interface,
    Function,
    Alias,
}

impl Kind {
    /// Kind of a predeclared type name.
    ///
    /// `interface{}` is spelled `any`; types outside the closed set
    /// (`uintptr`, complex numbers) have no kind of their own.
    pub fn from_basic_name(name: &str) -> Option<Kind> {
        let kind = match name {
            "string" => Kind::String,
            "int" => Kind::Int,
            "int8" => Kind::Int8,
            "int16" => Kind::Int16,
            "int32" => Kind::Int32,
            "int64" => Kind::Int64,
            "uint" => Kind::Uint,
            "uint8" => Kind::Uint8,
            "uint16" => Kind::Uint16,
            "uint32" => Kind::Uint32,
            "uint64" => Kind::Uint64,
            "float32" => Kind::Float32,
            "float64" => Kind::Float64,
            "bool" => Kind::Bool,
            "byte" => Kind::Byte,
            "rune" => Kind::Rune,
            "error" => Kind::Error,
            "any" => Kind::Any,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint => "uint",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Bool => "bool",
            Kind::Byte => "byte",
            Kind::Rune => "rune",
            Kind::Error => "error",
            Kind::Any => "any",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Chan => "chan",
            Kind::Struct => "struct",
            Kind::Interface => "interface",
            Kind::Function => "function",
            Kind::Alias => "alias",
        }
    }

    /// Whether the kind names a predeclared type.
    pub fn is_basic(self) -> bool {
        !matches!(
            self,
            Kind::Array
                | Kind::Map
                | Kind::Chan
                | Kind::Struct
                | Kind::Interface
                | Kind::Function
                | Kind::Alias
        )
    }

    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 | Kind::Rune
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChanDirection {
    Send,
    Recv,
    #[default]
    Both,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// How a type is used at one site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    #[serde(rename = "typeID", default, skip_serializing_if = "String::is_empty")]
    pub type_id: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub pointer_count: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_slice: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub array_len: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_ellipsis: bool,
    /// Pointer depth of the element of a slice, array or map value.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub element_pointers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<Box<TypeRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_value: Option<Box<TypeRef>>,
}

impl TypeRef {
    pub fn new(type_id: impl Into<String>) -> Self {
        TypeRef {
            type_id: type_id.into(),
            ..TypeRef::default()
        }
    }

    pub fn is_map(&self) -> bool {
        self.map_key.is_some() && self.map_value.is_some()
    }

    /// Whether the reference is to a container shape rather than `type_id`
    /// itself.
    pub fn is_container(&self) -> bool {
        self.is_slice || self.array_len > 0 || self.is_map()
    }

    /// TypeIDs mentioned by this reference, including map keys and values.
    pub fn type_ids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        if !self.type_id.is_empty() {
            out.push(&self.type_id);
        }
        if let Some(key) = &self.map_key {
            key.collect_ids(out);
        }
        if let Some(value) = &self.map_value {
            value.collect_ids(out);
        }
    }
}

/// A struct field: a use site plus its name, tags and docs.
///
/// An empty `name` marks an embedded field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructField {
    #[serde(flatten)]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub name: String,
    /// Struct tag keys to their comma-separated values, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<(String, Vec<String>)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

impl StructField {
    pub fn is_embedded(&self) -> bool {
        self.name.is_empty()
    }

    /// Values of the first tag named `key`.
    pub fn tag(&self, key: &str) -> Option<&[String]> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Render the tags back in struct-tag syntax, in source order.
    pub fn tag_string(&self) -> String {
        self.tags
            .iter()
            .map(|(key, values)| format!("{key}:\"{}\"", values.join(",").replace('"', "\\\"")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parse a Go struct tag (`json:"id,omitempty" db:"id"`).
///
/// Malformed trailing content is ignored.
pub fn parse_struct_tag(tag: &str) -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    let mut rest = tag.trim();
    while !rest.is_empty() {
        let Some(colon) = rest.find(":\"") else {
            break;
        };
        let key = rest[..colon].trim();
        let after = &rest[colon + 2..];
        let mut end = None;
        let mut escaped = false;
        for (i, c) in after.char_indices() {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    end = Some(i);
                    break;
                }
                _ => escaped = false,
            }
        }
        let Some(end) = end else {
            break;
        };
        if !key.is_empty() && !key.contains(char::is_whitespace) {
            let value = after[..end].replace("\\\"", "\"");
            out.push((
                key.to_string(),
                value.split(',').map(str::to_string).collect(),
            ));
        }
        rest = after[end + 1..].trim_start();
    }
    out
}

/// Method of an interface type or signature of a function type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

/// Definition of a named or structural type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    /// Package qualifier used in the declaring source.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub import_alias: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub import_pkg_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pkg_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias_of: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub underlying_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_kind: Option<Kind>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub array_len: usize,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_slice: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_ellipsis: bool,
    #[serde(rename = "arrayOfID", default, skip_serializing_if = "String::is_empty")]
    pub array_of_id: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub element_pointers: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<Box<TypeRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_value: Option<Box<TypeRef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chan_direction: Option<ChanDirection>,
    #[serde(rename = "chanOfID", default, skip_serializing_if = "String::is_empty")]
    pub chan_of_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub struct_fields: Vec<StructField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interface_methods: Vec<Function>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_args: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_results: Vec<Variable>,

    /// Interface TypeIDs satisfied by the type or its pointer; kept sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements_interfaces: Vec<String>,
}

impl Type {
    /// Skeleton carrying only identity, used to break conversion cycles.
    pub fn skeleton(kind: Kind, pkg_path: &str, pkg_name: &str, name: &str) -> Self {
        Type {
            kind,
            type_name: name.to_string(),
            import_pkg_path: pkg_path.to_string(),
            import_alias: pkg_name.to_string(),
            pkg_name: pkg_name.to_string(),
            ..Type::default()
        }
    }

    /// TypeID of this record when it is a named type.
    pub fn type_id(&self) -> Option<String> {
        (!self.type_name.is_empty() && !self.import_pkg_path.is_empty())
            .then(|| crate::type_id(&self.import_pkg_path, &self.type_name))
    }

    /// Kind after following aliases, as recorded at conversion time.
    pub fn effective_kind(&self) -> Kind {
        match (self.kind, self.underlying_kind) {
            (Kind::Alias, Some(kind)) => kind,
            (kind, _) => kind,
        }
    }

    /// Whether a container shape (slice, array or map) is recorded.
    pub fn is_container(&self) -> bool {
        self.is_slice || self.array_len > 0 || (self.map_key.is_some() && self.map_value.is_some())
    }

    /// Add interfaces to `implements_interfaces`, keeping it a sorted set.
    ///
    /// Returns whether anything was added.
    pub fn add_implements<I, S>(&mut self, ifaces: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.implements_interfaces.len();
        for iface in ifaces {
            let iface = iface.into();
            if let Err(at) = self.implements_interfaces.binary_search(&iface) {
                self.implements_interfaces.insert(at, iface);
            }
        }
        self.implements_interfaces.len() != before
    }

    pub fn implements(&self, iface_id: &str) -> bool {
        self.implements_interfaces
            .binary_search_by(|i| i.as_str().cmp(iface_id))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_names_round_trip() {
        for name in ["string", "int64", "uint8", "byte", "rune", "error", "any"] {
            assert_eq!(Kind::from_basic_name(name).map(Kind::as_str), Some(name));
        }
        assert_eq!(Kind::from_basic_name("uintptr"), None);
        assert!(Kind::Rune.is_signed_int());
        assert!(!Kind::Uint.is_signed_int());
        assert!(!Kind::Struct.is_basic());
    }

    #[test]
    fn implements_is_a_sorted_set() {
        let mut ty = Type::default();
        assert!(ty.add_implements(["io:Writer", "fmt:Stringer", "io:Writer"]));
        assert!(!ty.add_implements(["fmt:Stringer"]));
        assert_eq!(ty.implements_interfaces, vec!["fmt:Stringer", "io:Writer"]);
        assert!(ty.implements("io:Writer"));
        assert!(!ty.implements("io:Reader"));
    }

    #[test]
    fn struct_tags() {
        let tags = parse_struct_tag(r#"json:"id,omitempty" db:"user_id"  validate:"re=a\"b""#);
        let field = StructField {
            tags,
            ..StructField::default()
        };
        assert_eq!(field.tag("json"), Some(&["id".to_string(), "omitempty".to_string()][..]));
        assert_eq!(field.tag("db"), Some(&["user_id".to_string()][..]));
        assert_eq!(field.tag("validate"), Some(&["re=a\"b".to_string()][..]));
        assert_eq!(field.tag("xml"), None);
        assert_eq!(
            field.tag_string(),
            r#"json:"id,omitempty" db:"user_id" validate:"re=a\"b""#
        );
    }

    #[test]
    fn tags_keep_source_order() {
        let field = StructField {
            tags: parse_struct_tag(r#"yaml:"b" json:"a" db:"c""#),
            ..StructField::default()
        };
        let keys: Vec<&str> = field.tags.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["yaml", "json", "db"]);
        assert_eq!(field.tag_string(), r#"yaml:"b" json:"a" db:"c""#);

        let json = serde_json::to_string(&field).unwrap_or_else(|e| panic!("encode: {e}"));
        let back: StructField = serde_json::from_str(&json).unwrap_or_else(|e| panic!("decode: {e}"));
        assert_eq!(back.tag_string(), field.tag_string());
    }

    #[test]
    fn type_ref_ids_include_map_parts() {
        let r = TypeRef {
            map_key: Some(Box::new(TypeRef::new("string"))),
            map_value: Some(Box::new(TypeRef::new("app/dto:User"))),
            ..TypeRef::default()
        };
        assert!(r.is_map());
        assert_eq!(r.type_ids(), vec!["string", "app/dto:User"]);
    }
}
