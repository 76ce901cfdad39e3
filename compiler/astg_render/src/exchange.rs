//! `exchange-<contract>.go`: request and response structs per method.

use astg_ir::{Contract, Variable};

use crate::context::RenderContext;
use crate::names::upper_first;
use crate::plan::{Codec, MethodPlan};
use crate::writer::{CodeWriter, GoFile};

pub fn exchange_file(ctx: &RenderContext<'_>, contract: &Contract) -> GoFile {
    let mut file = GoFile::new(&ctx.config.package_name);
    for plan in ctx.plans(contract) {
        let request_codec = if contract.is_json_rpc() { Codec::Json } else { plan.request_codec };
        let response_codec = if contract.is_json_rpc() { Codec::Json } else { plan.response_codec };
        if !plan.inline_request {
            exchange_struct(
                ctx,
                &plan,
                &plan.request_type(),
                &plan.request_fields(),
                request_codec,
                &mut file,
            );
        }
        exchange_struct(
            ctx,
            &plan,
            &plan.response_type(),
            &plan.response_fields(),
            response_codec,
            &mut file,
        );
    }
    file
}

fn exchange_struct(
    ctx: &RenderContext<'_>,
    plan: &MethodPlan<'_>,
    name: &str,
    fields: &[&Variable],
    codec: Codec,
    file: &mut GoFile,
) {
    if fields.is_empty() {
        file.body.line(format!("type {name} struct{{}}"));
        file.body.blank();
        return;
    }
    let w: &mut CodeWriter = &mut file.body;
    w.open(format!("type {name} struct {{"));
    for var in fields {
        let ty = ctx.types().value(&var.type_ref, &mut file.imports);
        w.line(format!(
            "{} {ty} `{}`",
            upper_first(&var.name),
            field_tags(ctx, plan, var, codec)
        ));
    }
    w.close("}");
    w.blank();
}

/// Struct tag of an exchange field: the codec name plus `tag:` overrides.
fn field_tags(ctx: &RenderContext<'_>, plan: &MethodPlan<'_>, var: &Variable, codec: Codec) -> String {
    let omit = if plan.omit_empty { ",omitempty" } else { "" };
    let mut tags: Vec<(String, String)> = Vec::new();
    tags.push(("json".to_string(), format!("{}{omit}", var.name)));
    if let Some(key) = codec.tag_key().filter(|k| *k != "json") {
        tags.push((key.to_string(), format!("{}{omit}", var.name)));
    }
    for (key, value) in plan.extra_tags(var, ctx.project) {
        match tags.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => tags.push((key, value)),
        }
    }
    tags.iter()
        .map(|(k, v)| format!("{k}:\"{}\"", v.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Value encoded as the request: the struct literal built from same-named
/// locals, or the single body argument when it is inlined.
pub fn request_literal(plan: &MethodPlan<'_>) -> String {
    if plan.inline_request {
        if let Some(var) = plan.body_args.first() {
            return var.name.clone();
        }
    }
    let fields: Vec<String> = plan
        .request_fields()
        .iter()
        .map(|v| format!("{}: {}", upper_first(&v.name), v.name))
        .collect();
    format!("{}{{{}}}", plan.request_type(), fields.join(", "))
}
