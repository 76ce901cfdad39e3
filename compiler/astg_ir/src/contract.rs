//! Contracts, their methods and the implementations found for them.

use std::collections::BTreeMap;

use astg_tags::{names, Annotations, TagChain};
use serde::{Deserialize, Serialize};

use crate::builtin::{CONTEXT_TYPE_ID, ERROR_TYPE_ID};
use crate::types::TypeRef;

/// A named occurrence of a [`TypeRef`]: an argument, result or value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(flatten)]
    pub type_ref: TypeRef,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

impl Variable {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Variable {
            type_ref,
            name: name.into(),
            ..Variable::default()
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_ref.type_id
    }

    /// Plain use of `context.Context`.
    pub fn is_context(&self) -> bool {
        self.type_ref.type_id == CONTEXT_TYPE_ID
            && self.type_ref.pointer_count == 0
            && !self.type_ref.is_container()
    }

    /// Plain use of the predeclared `error`.
    pub fn is_error(&self) -> bool {
        self.type_ref.type_id == ERROR_TYPE_ID
            && self.type_ref.pointer_count == 0
            && !self.type_ref.is_container()
    }
}

/// An error type a method may return.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub pkg_path: String,
    pub type_name: String,
    /// `pkg_path.TypeName`.
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub http_code_text: String,
    #[serde(rename = "typeID")]
    pub type_id: String,
}

impl ErrorInfo {
    pub fn new(pkg_path: &str, type_name: &str, http_code: Option<u16>) -> Self {
        ErrorInfo {
            pkg_path: pkg_path.to_string(),
            type_name: type_name.to_string(),
            full_name: format!("{pkg_path}.{type_name}"),
            http_code,
            http_code_text: http_code
                .and_then(crate::status::status_text)
                .unwrap_or_default()
                .to_string(),
            type_id: crate::type_id(pkg_path, type_name),
        }
    }

    /// Key used to drop duplicate entries; annotated codes are part of it.
    pub fn dedup_key(&self) -> (&str, &str, Option<u16>) {
        (&self.pkg_path, &self.type_name, self.http_code)
    }
}

/// A contract method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    #[serde(rename = "contractID")]
    pub contract_id: String,
    #[serde(default)]
    pub args: Vec<Variable>,
    #[serde(default)]
    pub results: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorInfo>,
    /// `pkgPath:funcName` of a handler whose body yields extra errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

impl Method {
    /// Whether the first argument is the implicit context.
    pub fn has_context(&self) -> bool {
        self.args.first().is_some_and(Variable::is_context)
    }

    /// Whether the last result is the implicit error.
    pub fn returns_error(&self) -> bool {
        self.results.last().is_some_and(Variable::is_error)
    }

    /// Arguments without the leading context.
    pub fn wire_args(&self) -> &[Variable] {
        if self.has_context() {
            &self.args[1..]
        } else {
            &self.args
        }
    }

    /// Results without the trailing error.
    pub fn wire_results(&self) -> &[Variable] {
        if self.returns_error() {
            &self.results[..self.results.len() - 1]
        } else {
            &self.results
        }
    }

    pub fn arg(&self, name: &str) -> Option<&Variable> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn result(&self, name: &str) -> Option<&Variable> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Add errors, dropping entries already present.
    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = ErrorInfo>) {
        for err in errors {
            if !self.errors.iter().any(|e| e.dedup_key() == err.dedup_key()) {
                self.errors.push(err);
            }
        }
    }

    /// Errors sorted for presentation: coded first by code, then by name.
    pub fn sorted_errors(&self) -> Vec<&ErrorInfo> {
        let mut out: Vec<&ErrorInfo> = self.errors.iter().collect();
        out.sort_by(|a, b| {
            let rank = |e: &ErrorInfo| (e.http_code.is_none(), e.http_code.unwrap_or(0));
            rank(a).cmp(&rank(b)).then_with(|| a.full_name.cmp(&b.full_name))
        });
        out
    }
}

/// Where an implementation defines one method and what it may return.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationMethod {
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_types: Vec<ErrorInfo>,
}

/// A concrete type satisfying a contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    pub pkg_path: String,
    pub struct_name: String,
    #[serde(default)]
    pub methods_map: BTreeMap<String, ImplementationMethod>,
}

/// An annotated interface elevated to an API description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub name: String,
    pub pkg_path: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    pub annotations: Annotations,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implementations: Vec<Implementation>,
}

impl Contract {
    pub fn is_json_rpc(&self) -> bool {
        self.annotations.is_set(names::JSON_RPC_SERVER)
    }

    pub fn is_http(&self) -> bool {
        self.annotations.is_set(names::HTTP_SERVER)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Tag chain for a method of this contract under `project` tags.
    pub fn method_tags<'a>(&'a self, project: &'a Annotations, method: &'a Method) -> TagChain<'a> {
        TagChain::root(project)
            .narrow(&self.annotations)
            .narrow(&method.annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str, type_id: &str) -> Variable {
        Variable::new(name, TypeRef::new(type_id))
    }

    #[test]
    fn wire_args_skip_context_and_error() {
        let method = Method {
            name: "Sum".into(),
            args: vec![var("ctx", CONTEXT_TYPE_ID), var("a", "int"), var("b", "int")],
            results: vec![var("sum", "int"), var("err", ERROR_TYPE_ID)],
            ..Method::default()
        };
        assert!(method.has_context());
        assert!(method.returns_error());
        let args: Vec<_> = method.wire_args().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(args, vec!["a", "b"]);
        assert_eq!(method.wire_results().len(), 1);
    }

    #[test]
    fn pointer_context_is_not_implicit() {
        let mut ctx = var("ctx", CONTEXT_TYPE_ID);
        ctx.type_ref.pointer_count = 1;
        let method = Method {
            args: vec![ctx],
            ..Method::default()
        };
        assert!(!method.has_context());
        assert_eq!(method.wire_args().len(), 1);
    }

    #[test]
    fn errors_dedup_by_code() {
        let mut method = Method::default();
        method.add_errors([
            ErrorInfo::new("app/errs", "NotFound", Some(404)),
            ErrorInfo::new("app/errs", "NotFound", Some(404)),
            ErrorInfo::new("app/errs", "NotFound", None),
            ErrorInfo::new("app/errs", "Conflict", Some(409)),
        ]);
        assert_eq!(method.errors.len(), 3);
        let order: Vec<_> = method
            .sorted_errors()
            .iter()
            .map(|e| (e.type_name.as_str(), e.http_code))
            .collect();
        assert_eq!(
            order,
            vec![
                ("NotFound", Some(404)),
                ("Conflict", Some(409)),
                ("NotFound", None)
            ]
        );
        assert_eq!(method.errors[0].http_code_text, "Not Found");
        assert_eq!(method.errors[0].type_id, "app/errs:NotFound");
    }
}
