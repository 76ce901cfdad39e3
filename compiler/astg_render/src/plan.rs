//! Per-method transport decisions.
//!
//! A [`MethodPlan`] resolves everything the client emitters need from the
//! scoped tags of one method: route, verb, which arguments travel in the
//! path, query, headers or cookies, how the body is encoded and how the
//! response is decoded.

use astg_ir::{Contract, Method, Project, Variable};
use astg_tags::{names, TagChain};

use crate::names::{lower_camel, rpc_method};
use crate::writer::Imports;

const READER: &str = "io:Reader";
const READ_CLOSER: &str = "io:ReadCloser";

/// Wire encoding of a request or response body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Codec {
    Json,
    Form,
    Xml,
    Msgpack,
    Cbor,
    Yaml,
}

impl Codec {
    /// Parse a content-type tag: a short name or a MIME type.
    pub fn parse(value: &str) -> Option<Codec> {
        let value = value.trim().to_ascii_lowercase();
        let codec = match value.as_str() {
            "json" => Codec::Json,
            "form" | "urlencoded" => Codec::Form,
            "xml" => Codec::Xml,
            "msgpack" => Codec::Msgpack,
            "cbor" => Codec::Cbor,
            "yaml" | "yml" => Codec::Yaml,
            v if v.contains("x-www-form-urlencoded") => Codec::Form,
            v if v.contains("json") => Codec::Json,
            v if v.contains("xml") => Codec::Xml,
            v if v.contains("msgpack") => Codec::Msgpack,
            v if v.contains("cbor") => Codec::Cbor,
            v if v.contains("yaml") => Codec::Yaml,
            _ => return None,
        };
        Some(codec)
    }

    pub fn mime(self) -> &'static str {
        match self {
            Codec::Json => "application/json",
            Codec::Form => "application/x-www-form-urlencoded",
            Codec::Xml => "application/xml",
            Codec::Msgpack => "application/msgpack",
            Codec::Cbor => "application/cbor",
            Codec::Yaml => "application/yaml",
        }
    }

    /// Struct tag key carrying field names for this codec.
    pub fn tag_key(self) -> Option<&'static str> {
        match self {
            Codec::Json => Some("json"),
            Codec::Form => None,
            Codec::Xml => Some("xml"),
            Codec::Msgpack => Some("msgpack"),
            Codec::Cbor => Some("cbor"),
            Codec::Yaml => Some("yaml"),
        }
    }

    /// Import the package implementing `Marshal`/`Unmarshal` and return
    /// its name. `json_package` replaces `encoding/json`.
    pub fn import(self, json_package: Option<&str>, imports: &mut Imports) -> String {
        match self {
            Codec::Json | Codec::Form => match json_package {
                Some(path) => imports.add_named(path, "json"),
                None => imports.add("encoding/json"),
            },
            Codec::Xml => imports.add("encoding/xml"),
            Codec::Msgpack => imports.add_named("github.com/vmihailenco/msgpack/v5", "msgpack"),
            Codec::Cbor => imports.add_named("github.com/fxamacker/cbor/v2", "cbor"),
            Codec::Yaml => imports.add_named("gopkg.in/yaml.v3", "yaml"),
        }
    }
}

/// How the request body is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyMode {
    None,
    Encoded(Codec),
    /// The single reader argument is the body.
    Stream,
    Multipart,
}

/// How the response body is consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseMode {
    None,
    /// Decode straight into the only body result.
    Inline(Codec),
    /// Decode into the response exchange struct.
    Struct(Codec),
    /// The single read-closer result is the body.
    Stream,
    Multipart,
}

/// One argument or result mapped to a named HTTP location.
#[derive(Clone, Debug)]
pub struct Mapped<'a> {
    pub var: &'a Variable,
    pub name: String,
}

/// A stream argument or result and its multipart part.
#[derive(Clone, Debug)]
pub struct Part<'a> {
    pub var: &'a Variable,
    pub name: String,
    pub content_type: String,
}

#[derive(Clone, Debug)]
pub struct MethodPlan<'a> {
    pub contract: &'a Contract,
    pub method: &'a Method,
    pub rpc_name: String,
    pub verb: String,
    pub success: i64,
    /// Route with `%s` for each path argument, `%` escaped.
    pub path_format: String,
    /// Route as written in the tags, for documentation.
    pub route: String,
    pub path_args: Vec<&'a Variable>,
    pub query: Vec<Mapped<'a>>,
    pub headers: Vec<Mapped<'a>>,
    pub cookies: Vec<Mapped<'a>>,
    pub body_args: Vec<&'a Variable>,
    pub parts: Vec<Part<'a>>,
    pub body: BodyMode,
    /// Encode the only body argument itself instead of the request struct.
    pub inline_request: bool,
    pub result_headers: Vec<Mapped<'a>>,
    pub result_cookies: Vec<Mapped<'a>>,
    pub body_results: Vec<&'a Variable>,
    pub result_parts: Vec<Part<'a>>,
    pub response: ResponseMode,
    pub request_codec: Codec,
    pub response_codec: Codec,
    pub omit_empty: bool,
    pub json_package: Option<&'a str>,
}

impl<'a> MethodPlan<'a> {
    pub fn new(project: &'a Project, contract: &'a Contract, method: &'a Method) -> Self {
        let tags = contract.method_tags(&project.annotations, method);
        let args = method.wire_args();
        let results = method.wire_results();

        let verb = tags
            .value(names::HTTP_METHOD)
            .map(str::to_ascii_uppercase)
            .filter(|v| names::HTTP_METHODS.contains(&v.as_str()))
            .unwrap_or_else(|| names::DEFAULT_HTTP_METHOD.to_string());
        let success = Some(tags.value_int(names::HTTP_SUCCESS, names::DEFAULT_HTTP_SUCCESS))
            .filter(|code| (100..=599).contains(code))
            .unwrap_or(names::DEFAULT_HTTP_SUCCESS);

        let prefix = tags.value(names::HTTP_PREFIX).unwrap_or_default();
        let path = tags.value(names::HTTP_PATH).map_or_else(
            || format!("/{}/{}", lower_camel(&contract.name), lower_camel(&method.name)),
            str::to_string,
        );
        let route = join_route(prefix, &path);
        let (path_format, path_args) = path_params(&route, args);

        let query = mapped(&tags.pairs(names::HTTP_ARGS), args);
        let headers = mapped(&tags.pairs(names::HTTP_HEADERS), args);
        let cookies = mapped(&tags.pairs(names::HTTP_COOKIES), args);
        let result_headers = mapped(&tags.pairs(names::HTTP_HEADERS), results);
        let result_cookies = mapped(&tags.pairs(names::HTTP_COOKIES), results);

        let parts: Vec<Part<'a>> = args
            .iter()
            .filter(|v| is_stream(v, READER))
            .map(|v| part(&tags, v))
            .collect();
        let body_args: Vec<&Variable> = args
            .iter()
            .filter(|v| !is_stream(v, READER))
            .filter(|v| !path_args.iter().any(|p| p.name == v.name))
            .filter(|v| !taken(v, &[query.as_slice(), headers.as_slice(), cookies.as_slice()]))
            .collect();
        let result_parts: Vec<Part<'a>> = results
            .iter()
            .filter(|v| is_stream(v, READ_CLOSER))
            .map(|v| part(&tags, v))
            .collect();
        let body_results: Vec<&Variable> = results
            .iter()
            .filter(|v| !is_stream(v, READ_CLOSER))
            .filter(|v| !taken(v, &[result_headers.as_slice(), result_cookies.as_slice()]))
            .collect();

        let request_codec = tags
            .value(names::REQUEST_CONTENT_TYPE)
            .and_then(Codec::parse)
            .unwrap_or(Codec::Json);
        let response_codec = match tags.value(names::RESPONSE_CONTENT_TYPE).and_then(Codec::parse) {
            Some(Codec::Form) | None => Codec::Json,
            Some(codec) => codec,
        };

        let multipart = parts.len() > 1 || (!parts.is_empty() && tags.is_set(names::HTTP_MULTIPART));
        let body = if multipart {
            BodyMode::Multipart
        } else if parts.len() == 1 {
            BodyMode::Stream
        } else if body_args.is_empty() {
            BodyMode::None
        } else {
            BodyMode::Encoded(request_codec)
        };

        let inline_single = tags.value_bool(names::ENABLE_INLINE_SINGLE, false);
        // JSON-RPC params stay an object; form bodies are built field by field.
        let inline_request = inline_single
            && !contract.is_json_rpc()
            && body_args.len() == 1
            && matches!(body, BodyMode::Encoded(codec) if codec != Codec::Form);

        let response = match result_parts.len() {
            0 if body_results.is_empty() => ResponseMode::None,
            0 if body_results.len() == 1 && inline_single => {
                ResponseMode::Inline(response_codec)
            }
            0 => ResponseMode::Struct(response_codec),
            1 if !tags.is_set(names::HTTP_MULTIPART) => ResponseMode::Stream,
            _ => ResponseMode::Multipart,
        };
        if !result_parts.is_empty() && !body_results.is_empty() {
            tracing::warn!(
                contract = %contract.name,
                method = %method.name,
                "results beside a streamed response are left empty"
            );
        }

        MethodPlan {
            contract,
            method,
            rpc_name: rpc_method(&contract.name, &method.name),
            verb,
            success,
            path_format,
            route,
            path_args,
            query,
            headers,
            cookies,
            body_args,
            parts,
            body,
            inline_request,
            result_headers,
            result_cookies,
            body_results,
            result_parts,
            response,
            request_codec,
            response_codec,
            omit_empty: tags.value_bool(names::TAG_OMITEMPTY_ALL, false),
            json_package: tags.value(names::PACKAGE_JSON),
        }
    }

    pub fn uses_streams(&self) -> bool {
        !self.parts.is_empty() || !self.result_parts.is_empty()
    }

    /// Name of the request exchange struct.
    pub fn request_type(&self) -> String {
        format!("request{}{}", self.contract.name, self.method.name)
    }

    pub fn response_type(&self) -> String {
        format!("response{}{}", self.contract.name, self.method.name)
    }

    /// Variables carried in the request exchange struct.
    pub fn request_fields(&self) -> Vec<&'a Variable> {
        if self.contract.is_json_rpc() {
            self.method
                .wire_args()
                .iter()
                .filter(|v| !self.parts.iter().any(|p| p.var.name == v.name))
                .collect()
        } else {
            self.body_args.clone()
        }
    }

    /// Variables carried in the response exchange struct.
    pub fn response_fields(&self) -> Vec<&'a Variable> {
        if self.contract.is_json_rpc() {
            self.method
                .wire_results()
                .iter()
                .filter(|v| !self.result_parts.iter().any(|p| p.var.name == v.name))
                .collect()
        } else {
            self.body_results.clone()
        }
    }

    /// Extra struct tags `tag:<var>:<key> value` for a variable.
    pub fn extra_tags(&self, var: &Variable, project: &Project) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::new();
        for scope in [&self.method.annotations, &self.contract.annotations, &project.annotations] {
            for (tag, value) in scope.iter() {
                if let Some((target, key)) = names::struct_tag_target(tag) {
                    if target == var.name && !out.iter().any(|(k, _)| k == key) {
                        out.push((key.to_string(), value.to_string()));
                    }
                }
            }
        }
        out.sort();
        out
    }
}

fn is_stream(v: &Variable, type_id: &str) -> bool {
    v.type_ref.type_id == type_id && v.type_ref.pointer_count == 0 && !v.type_ref.is_container()
}

fn taken(v: &Variable, lists: &[&[Mapped<'_>]]) -> bool {
    lists.iter().any(|l| l.iter().any(|m| m.var.name == v.name))
}

fn join_route(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        return if prefix.is_empty() { "/".to_string() } else { prefix.to_string() };
    }
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

/// Replace `:name` and `{name}` segments naming an argument with `%s`.
fn path_params<'a>(route: &str, args: &'a [Variable]) -> (String, Vec<&'a Variable>) {
    let mut used = Vec::new();
    let segments: Vec<String> = route
        .split('/')
        .map(|segment| {
            let name = segment
                .strip_prefix(':')
                .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')));
            match name.and_then(|n| args.iter().find(|a| a.name == n)) {
                Some(arg) => {
                    used.push(arg);
                    "%s".to_string()
                }
                None => segment.replace('%', "%%"),
            }
        })
        .collect();
    (segments.join("/"), used)
}

/// Variables named on the left of `from|to` pairs, in tag order.
fn mapped<'a>(pairs: &[(String, String)], vars: &'a [Variable]) -> Vec<Mapped<'a>> {
    pairs
        .iter()
        .filter_map(|(from, to)| {
            vars.iter().find(|v| v.name == *from).map(|var| Mapped {
                var,
                name: to.clone(),
            })
        })
        .collect()
}

/// Part name and content type of a stream, from the variable's own tags
/// or `var|value` pairs at method scope.
fn part<'a>(tags: &TagChain<'_>, var: &'a Variable) -> Part<'a> {
    let lookup = |tag: &str| {
        var.annotations
            .value(tag)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| {
                tags.pairs(tag)
                    .into_iter()
                    .find(|(from, to)| from == &var.name && to != from)
                    .map(|(_, to)| to)
            })
    };
    Part {
        var,
        name: lookup(names::HTTP_PART_NAME).unwrap_or_else(|| var.name.clone()),
        content_type: lookup(names::HTTP_PART_CONTENT)
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    }
}
