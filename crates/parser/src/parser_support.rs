use crate::ast::{self, Names, Span};

/// One comma-separated entry of a parameter list, before grouping.
///
/// A lone identifier (`typ == None`) is either a parameter name waiting for
/// the type that follows it or an anonymous parameter of that named type.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub names: Names,
    pub typ: Option<ast::TypeId>,
    pub span: Span,
}

/// Groups parameter entries into fields.
///
/// Go requires a parameter list to be either fully named or fully anonymous.
/// When any typed entry carries a name, lone identifiers are names that share
/// the next type (`a, b int`). Otherwise every entry is an anonymous
/// parameter and lone identifiers are type names (`int, string`).
pub fn resolve_param_list(arena: &mut ast::AstArena, params: Vec<ParamDecl>) -> Vec<ast::FieldId> {
    let named = params.iter().any(|p| p.typ.is_some() && !p.names.is_empty());
    let mut out = Vec::with_capacity(params.len());

    if !named {
        for param in params {
            let typ = match param.typ {
                Some(typ) => typ,
                None => match param.names.first() {
                    Some(&name) => named_type_from_ident(arena, name),
                    None => continue,
                },
            };
            out.push(alloc_field(arena, Names::new(), typ, param.span));
        }
        return out;
    }

    let mut pending_names = Names::new();
    let mut pending_start: Option<u32> = None;

    for param in params {
        match param.typ {
            Some(typ) => {
                let mut names = std::mem::take(&mut pending_names);
                names.extend(param.names);
                let span = Span {
                    start: pending_start.take().unwrap_or(param.span.start),
                    end: param.span.end,
                };
                out.push(alloc_field(arena, names, typ, span));
            }
            None => {
                if pending_names.is_empty() {
                    pending_start = Some(param.span.start);
                }
                pending_names.extend(param.names);
            }
        }
    }

    // trailing names with no type: keep them as anonymous named types
    for name in pending_names {
        let typ = named_type_from_ident(arena, name);
        out.push(alloc_field(arena, Names::new(), typ, name.pos));
    }

    out
}

fn alloc_field(arena: &mut ast::AstArena, names: Names, typ: ast::TypeId, span: Span) -> ast::FieldId {
    let field = ast::Field {
        doc: None,
        names,
        typ,
        tag: None,
        embedded: false,
    };
    arena.fields.alloc(field, span)
}

pub fn named_type_from_ident(arena: &mut ast::AstArena, name: ast::IdentName) -> ast::TypeId {
    arena.types.alloc(
        ast::Type::Named {
            pkg: None,
            name,
            args: Vec::new(),
        },
        name.pos,
    )
}
