//! `types.go`: declarations of every collected type.

use astg_ir::{Kind, Type};

use crate::context::RenderContext;
use crate::writer::{CodeWriter, GoFile, Imports};

/// Emit every collected type, ordered by Go name.
pub fn types_file(ctx: &RenderContext<'_>) -> GoFile {
    let mut file = GoFile::new(&ctx.config.package_name);
    for (name, type_id) in ctx.collected.by_name() {
        let Some(ty) = ctx.project.get_type(type_id) else {
            continue;
        };
        file.body.comment(&ty.docs);
        let decl = declaration(ctx, name, ty, &mut file.imports);
        file.body.raw(&decl);
        file.body.blank();
    }
    file
}

/// Go declaration of a named type, without its doc comment.
pub fn declaration(ctx: &RenderContext<'_>, name: &str, ty: &Type, imports: &mut Imports) -> String {
    let types = ctx.types();
    let mut w = CodeWriter::new();
    match ty.kind {
        Kind::Struct if ty.struct_fields.is_empty() => w.line(format!("type {name} struct{{}}")),
        Kind::Struct => {
            w.open(format!("type {name} struct {{"));
            for field in &ty.struct_fields {
                w.comment(&field.docs);
                let mut line = types.value(&field.type_ref, imports);
                if !field.is_embedded() {
                    line = format!("{} {line}", field.name);
                }
                if !field.tags.is_empty() {
                    line = format!("{line} `{}`", field.tag_string());
                }
                w.line(line);
            }
            w.close("}");
        }
        Kind::Interface => {
            w.open(format!("type {name} interface {{"));
            for embed in &ty.embedded_interfaces {
                w.line(types.type_id(embed, imports));
            }
            for method in &ty.interface_methods {
                w.comment(&method.docs);
                w.line(format!(
                    "{}({}){}",
                    method.name,
                    types.params(&method.args, "arg", imports),
                    types.results(&method.results, imports)
                ));
            }
            w.close("}");
        }
        // Defined types keep their base; Go `=` aliases over a basic are
        // recorded with the basic kind and stay aliases.
        Kind::Alias | Kind::Array | Kind::Map | Kind::Chan | Kind::Function => {
            w.line(format!("type {name} {}", types.shape(ty, imports)));
        }
        _ => w.line(format!("type {name} = {}", types.shape(ty, imports))),
    }
    w.take_output()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::testutil::{named, project_with, struct_type};
    use astg_ir::{parse_struct_tag, Method, Project, TypeRef, Variable};
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        let mut user = struct_type("app/dto", "User", &[("ID", "app/dto:UserID"), ("Name", "string")]);
        user.docs = vec!["User is an account.".to_string()];
        user.struct_fields[0].tags = parse_struct_tag(r#"json:"id" db:"user_id""#);
        user.struct_fields[1].type_ref.pointer_count = 1;
        user.struct_fields.push(astg_ir::StructField {
            type_ref: TypeRef::new("app/dto:Base"),
            ..Default::default()
        });
        let mut id = named(Kind::Alias, "app/dto", "UserID");
        id.underlying_kind = Some(Kind::Int64);
        id.underlying_type_id = "int64".to_string();
        let mut ids = named(Kind::Array, "app/dto", "IDs");
        ids.is_slice = true;
        ids.array_of_id = "app/dto:UserID".to_string();
        let label = named(Kind::String, "app/dto", "Label");
        let mut project = project_with(&[
            ("app/dto:User", user),
            ("app/dto:UserID", id),
            ("app/dto:IDs", ids),
            ("app/dto:Label", label),
            ("app/dto:Base", struct_type("app/dto", "Base", &[])),
        ]);
        project.contracts[0].methods.push(Method {
            name: "Get".to_string(),
            args: vec![
                Variable::new("ids", TypeRef::new("app/dto:IDs")),
                Variable::new("label", TypeRef::new("app/dto:Label")),
            ],
            results: vec![Variable::new("user", TypeRef::new("app/dto:User"))],
            ..Method::default()
        });
        project
    }

    #[test]
    fn declarations_keep_shape_and_tags() {
        let project = project();
        let config = RenderConfig::new("/out/client", "app/client");
        let ctx = RenderContext::new(&project, &config);
        let text = types_file(&ctx).finish();
        assert_eq!(
            text,
            concat!(
                "// Code generated by astg. DO NOT EDIT.\n\n",
                "package client\n\n",
                "type Base struct{}\n\n",
                "type IDs []UserID\n\n",
                "type Label = string\n\n",
                "// User is an account.\n",
                "type User struct {\n",
                "\tID UserID `json:\"id\" db:\"user_id\"`\n",
                "\tName *string\n",
                "\tBase\n",
                "}\n\n",
                "type UserID int64\n",
            )
        );
    }
}
