//! `readme.md`: the manual of the generated client.

use astg_ir::{Contract, ErrorInfo, Variable};
use astg_tags::{names, TagChain};

use crate::client::signature;
use crate::context::RenderContext;
use crate::dto::declaration;
use crate::markdown::{anchor, link, DocError, Markdown};
use crate::names::lower_camel;
use crate::plan::{Mapped, MethodPlan};
use crate::writer::Imports;

#[tracing::instrument(level = "debug", skip_all)]
pub fn readme(ctx: &RenderContext<'_>) -> Result<String, DocError> {
    let package = &ctx.config.package_name;
    let mut md = Markdown::new();
    md.h1(&format!("{package} client"));
    md.blockquote(&format!(
        "Generated by astg {} from `{}`. Do not edit.",
        version(ctx),
        ctx.project.module_path
    ));
    md.table_of_contents(2, 3)?;

    getting_started(ctx, &mut md);
    for contract in &ctx.contracts {
        contract_section(ctx, contract, &mut md)?;
    }
    shared_types(ctx, &mut md);
    if ctx.has_json_rpc() {
        batch_section(ctx, &mut md);
    }
    error_section(ctx, &mut md);
    logging_section(ctx, &mut md);
    if ctx.has_metrics() {
        metrics_section(ctx, &mut md)?;
    }
    Ok(md.finish())
}

fn version(ctx: &RenderContext<'_>) -> String {
    if ctx.config.version.is_empty() {
        ctx.project.version.clone()
    } else {
        ctx.config.version.clone()
    }
}

fn getting_started(ctx: &RenderContext<'_>, md: &mut Markdown) {
    let package = &ctx.config.package_name;
    md.h2("Getting started");
    md.paragraph(&format!(
        "Import `{}` and create one client per endpoint; it is safe for concurrent use.",
        ctx.config.import_path
    ));
    let mut example = format!(
        "cli := {package}.New(\"http://localhost:9000\", {package}.ClientID(\"my-service\"))\n"
    );
    if let Some(contract) = ctx.contracts.first() {
        if let Some(method) = contract.methods.first() {
            let results: Vec<&str> = method
                .wire_results()
                .iter()
                .map(|v| v.name.as_str())
                .chain(["err"])
                .collect();
            let mut args = vec!["ctx"];
            args.extend(method.wire_args().iter().map(|v| v.name.as_str()));
            example.push_str(&format!(
                "{} := cli.{}().{}({})\n",
                results.join(", "),
                contract.name,
                method.name,
                args.join(", ")
            ));
        }
    }
    md.code_block("go", &example);
}

fn contract_section(
    ctx: &RenderContext<'_>,
    contract: &Contract,
    md: &mut Markdown,
) -> Result<(), DocError> {
    md.h2(&contract.name);
    let scope = TagChain::root(&ctx.project.annotations).narrow(&contract.annotations);
    describe(md, &scope, &contract.docs);
    let transport = if contract.is_json_rpc() {
        "JSON-RPC 2.0 over HTTP POST"
    } else {
        "HTTP"
    };
    md.paragraph(&format!(
        "Transport: {transport}. Accessor: `cli.{}()`.",
        contract.name
    ));
    for plan in ctx.plans(contract) {
        method_section(ctx, &plan, md)?;
    }
    Ok(())
}

/// `summary` and `desc` tags, else the doc comment.
fn describe(md: &mut Markdown, scope: &TagChain<'_>, docs: &[String]) {
    let summary = scope.value(names::SUMMARY).filter(|s| !s.is_empty());
    let desc = scope.value(names::DESC).filter(|s| !s.is_empty());
    if summary.is_none() && desc.is_none() {
        md.paragraph(&docs.join("\n"));
        return;
    }
    if let Some(summary) = summary {
        md.paragraph(&format!("**{summary}**"));
    }
    if let Some(desc) = desc {
        md.paragraph(desc);
    }
}

fn method_section(
    ctx: &RenderContext<'_>,
    plan: &MethodPlan<'_>,
    md: &mut Markdown,
) -> Result<(), DocError> {
    let method = plan.method;
    md.h3(&format!("{}.{}", plan.contract.name, method.name));
    // Method tags without the contract and project scopes, which
    // already describe the contract.
    describe(md, &TagChain::root(&method.annotations), &method.docs);
    let mut imports = Imports::new();
    md.code_block("go", &signature(ctx, plan, &mut imports));

    if plan.contract.is_json_rpc() {
        md.paragraph(&format!("JSON-RPC method: `{}`", plan.rpc_name));
    } else {
        md.paragraph(&format!(
            "`{} {}`, success status `{}`",
            plan.verb, plan.route, plan.success
        ));
    }

    let args = method.wire_args();
    if !args.is_empty() {
        md.paragraph("**Parameters**");
        let rows: Vec<Vec<String>> = args
            .iter()
            .map(|v| {
                vec![
                    format!("`{}`", v.name),
                    type_cell(ctx, v),
                    arg_location(plan, v),
                    v.docs.join(" "),
                ]
            })
            .collect();
        md.table(&["Name", "Type", "Location", "Description"], &rows)?;
    }

    let results = method.wire_results();
    if !results.is_empty() {
        md.paragraph("**Returns**");
        let rows: Vec<Vec<String>> = results
            .iter()
            .map(|v| {
                vec![
                    format!("`{}`", v.name),
                    type_cell(ctx, v),
                    result_location(plan, v),
                    v.docs.join(" "),
                ]
            })
            .collect();
        md.table(&["Name", "Type", "Location", "Description"], &rows)?;
    }

    let errors = method.sorted_errors();
    if !errors.is_empty() {
        md.paragraph("**Errors**");
        let rows: Vec<Vec<String>> = errors.iter().map(|e| error_row(ctx, e)).collect();
        md.table(&["Code", "Type", "Description"], &rows)?;
    }
    Ok(())
}

/// The Go type of a variable, linked to its declaration when shared.
fn type_cell(ctx: &RenderContext<'_>, var: &Variable) -> String {
    let mut imports = Imports::new();
    let spelled = ctx.types().value(&var.type_ref, &mut imports);
    match ctx.collected.go_name(&var.type_ref.type_id) {
        Some(name) => link(&format!("`{spelled}`"), &anchor(&format!("type {name}"))),
        None => format!("`{spelled}`"),
    }
}

fn error_row(ctx: &RenderContext<'_>, err: &ErrorInfo) -> Vec<String> {
    let code = err
        .http_code
        .map_or_else(|| "-".to_string(), |c| c.to_string());
    let name = match ctx.collected.go_name(&err.type_id) {
        Some(name) => link(&format!("`{name}`"), &anchor(&format!("type {name}"))),
        None => format!("`{}`", err.full_name),
    };
    vec![code, name, err.http_code_text.clone()]
}

fn located(mapped: &[Mapped<'_>], var: &Variable, what: &str) -> Option<String> {
    mapped
        .iter()
        .find(|m| m.var.name == var.name)
        .map(|m| format!("{what} `{}`", m.name))
}

fn arg_location(plan: &MethodPlan<'_>, var: &Variable) -> String {
    if plan.contract.is_json_rpc() {
        return "params".to_string();
    }
    if plan.path_args.iter().any(|p| p.name == var.name) {
        return "path".to_string();
    }
    if let Some(part) = plan.parts.iter().find(|p| p.var.name == var.name) {
        return format!("part `{}` ({})", part.name, part.content_type);
    }
    located(&plan.query, var, "query")
        .or_else(|| located(&plan.headers, var, "header"))
        .or_else(|| located(&plan.cookies, var, "cookie"))
        .unwrap_or_else(|| "body".to_string())
}

fn result_location(plan: &MethodPlan<'_>, var: &Variable) -> String {
    if plan.contract.is_json_rpc() {
        return "result".to_string();
    }
    if let Some(part) = plan.result_parts.iter().find(|p| p.var.name == var.name) {
        return format!("part `{}` ({})", part.name, part.content_type);
    }
    located(&plan.result_headers, var, "header")
        .or_else(|| located(&plan.result_cookies, var, "cookie"))
        .unwrap_or_else(|| "body".to_string())
}

fn shared_types(ctx: &RenderContext<'_>, md: &mut Markdown) {
    if ctx.collected.is_empty() {
        return;
    }
    md.h2("Shared types");
    for (name, id) in ctx.collected.by_name() {
        let Some(ty) = ctx.project.get_type(id) else {
            continue;
        };
        md.h3(&format!("type {name}"));
        md.paragraph(&ty.docs.join("\n"));
        let mut imports = Imports::new();
        md.code_block("go", &declaration(ctx, name, ty, &mut imports));
    }
}

fn batch_section(ctx: &RenderContext<'_>, md: &mut Markdown) {
    let package = &ctx.config.package_name;
    md.h2("Batch requests");
    md.paragraph(
        "JSON-RPC calls can share one round-trip. Each `Req<Method>` builds a request whose \
         callback receives the typed results; `Batch` sends them as one array and calls every \
         callback once. A request without a response gets the error \
         `missing response for request id <id>`.",
    );
    let example = ctx
        .contracts
        .iter()
        .find(|c| c.is_json_rpc())
        .and_then(|c| c.methods.first().map(|m| (c, m)))
        .map(|(contract, method)| {
            let mut imports = Imports::new();
            let params = callback_params(ctx, method.wire_results(), &mut imports);
            let mut args = vec!["ctx".to_string(), "callback".to_string()];
            args.extend(method.wire_args().iter().map(|v| v.name.clone()));
            format!(
                "callback := func({}) {{ /* ... */ }}\ncli.Batch(ctx,\n\tcli.{}().Req{}({}),\n)\n",
                params.join(", "),
                contract.name,
                method.name,
                args.join(", ")
            )
        })
        .unwrap_or_else(|| format!("cli.Batch(ctx /* , requests... */)\n// package {package}\n"));
    md.code_block("go", &example);
}

fn callback_params(ctx: &RenderContext<'_>, results: &[Variable], imports: &mut Imports) -> Vec<String> {
    let types = ctx.types();
    let mut params: Vec<String> = results
        .iter()
        .map(|v| format!("{} {}", v.name, types.value(&v.type_ref, imports)))
        .collect();
    params.push("err error".to_string());
    params
}

fn error_section(ctx: &RenderContext<'_>, md: &mut Markdown) {
    md.h2("Error handling");
    md.paragraph(
        "Every method returns `err error` last. HTTP methods treat any status other than the \
         documented success status as a failure: the response body goes to the error decoder \
         (`DecodeError` option) and, when it does not claim the body, the error carries the \
         status and implements `Code() int`.",
    );
    if ctx.has_json_rpc() {
        md.paragraph(
            "JSON-RPC errors arrive as `*jsonrpc.RPCError` with `code`, `message` and `data`; \
             a missing code is reported as `-32603`.",
        );
    }
    if let Some(default) = ctx.project.annotations.value(names::DEFAULT_ERROR) {
        md.paragraph(&format!(
            "Error payloads are decoded into `{}` by default.",
            ctx.collected.go_name(default).unwrap_or(default)
        ));
    }
}

fn logging_section(ctx: &RenderContext<'_>, md: &mut Markdown) {
    md.h2("Logging");
    if ctx.has_json_rpc() {
        md.paragraph(
            "The JSON-RPC transport logs through the standard `log` package when enabled:",
        );
        md.bullet_list(&[
            "`jsonrpc.LogRequest()` logs every request body",
            "`jsonrpc.LogOnError()` logs failed round-trips",
        ]);
        md.paragraph("Pass them with the `RPCOptions` option.");
    } else {
        md.paragraph("The client does not log; wrap the HTTP client passed to `WithHTTPClient` to trace requests.");
    }
}

fn metrics_section(ctx: &RenderContext<'_>, md: &mut Markdown) -> Result<(), DocError> {
    md.h2("Metrics");
    let instrumented: Vec<String> = ctx
        .contracts
        .iter()
        .filter(|c| ctx.metrics_for(c))
        .map(|c| format!("`{}`", lower_camel(&c.name)))
        .collect();
    md.paragraph(&format!(
        "Calls of {} are recorded in the default Prometheus registry.",
        instrumented.join(", ")
    ));
    md.table(
        &["Metric", "Kind", "Labels"],
        &[
            vec!["requests_count", "counter of calls without error", "service, method, client_id"],
            vec!["requests_all_count", "counter of every call", "service, method, success, errCode, client_id"],
            vec!["requests_latency_seconds", "histogram", "service, method, success, errCode, client_id"],
            vec!["versions", "gauge", "part, version"],
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::testutil::{project_with, struct_type};
    use astg_ir::{Method, TypeRef};
    use pretty_assertions::assert_eq;

    fn project() -> astg_ir::Project {
        let mut project = project_with(&[(
            "app/dto:User",
            struct_type("app/dto", "User", &[("Name", "string")]),
        )]);
        let mut get = Method {
            name: "Get".to_string(),
            contract_id: "app/api:Users".to_string(),
            docs: vec!["Get loads one user.".to_string()],
            ..Method::default()
        };
        get.args.push(Variable::new("ctx", TypeRef::new("context:Context")));
        get.args.push(Variable::new("id", TypeRef::new("string")));
        let mut user = TypeRef::new("app/dto:User");
        user.pointer_count = 1;
        get.results.push(Variable::new("user", user));
        get.results.push(Variable::new("err", TypeRef::new("error")));
        get.add_errors([
            ErrorInfo::new("app/errs", "Internal", None),
            ErrorInfo::new("app/errs", "NotFound", Some(404)),
        ]);
        project.contracts[0].methods.push(get);
        project
    }

    #[test]
    fn manual_lists_methods_errors_and_types() {
        let project = project();
        let config = RenderConfig::new("/out/client", "example.com/app/client");
        let ctx = RenderContext::new(&project, &config);
        let text = readme(&ctx).unwrap_or_else(|e| panic!("{e}"));

        assert!(text.starts_with("# client client\n"));
        assert!(text.contains("- [Users](#users)\n  - [Users.Get](#usersget)\n"));
        assert!(text.contains("```go\nGet(ctx context.Context, id string) (user *User, err error)\n```"));
        assert!(text.contains("JSON-RPC method: `users.get`"));
        assert!(text.contains("| `user` | [`*User`](#type-user) | result |  |"));

        let not_found = text.find("| 404 |").unwrap_or_else(|| panic!("no 404 row"));
        let internal = text.find("| - | `app/errs.Internal` |").unwrap_or_else(|| panic!("no uncoded row"));
        assert!(not_found < internal);

        assert!(text.contains("### type User\n"));
        assert!(text.contains("## Batch requests"));
        assert!(text.contains("cli.Users().ReqGet(ctx, callback, id)"));
        assert!(!text.contains("## Metrics"));
    }

    #[test]
    fn summary_and_desc_replace_doc_comments() {
        let mut project = project();
        project.contracts[0].annotations.insert(names::SUMMARY, "Account access");
        let config = RenderConfig::new("/out/client", "example.com/app/client");
        let ctx = RenderContext::new(&project, &config);
        let text = readme(&ctx).unwrap_or_else(|e| panic!("{e}"));
        assert!(text.contains("**Account access**"));
        assert_eq!(text.matches("Get loads one user.").count(), 1);
    }
}
