// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Reads a `Program` from a small JSON IR format. Not a bytecode front end —
//! just a concrete way for `taint-pta`'s own CLI to exercise the solver from
//! a file, since `ir::Program` otherwise only gets built in-process through
//! [`taint_pta::ir::ProgramBuilder`] (tests, the demo programs).
//!
//! Variable names are scoped per method: a `vars` map gives each name a
//! type, and statements within that method refer back to those names.
//! Everything else (obj kinds, statement shapes) mirrors `ir::Stmt` 1:1.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use taint_pta::ir::{
    Field, Invoke, Method, MethodId, ObjKind, Program, ProgramBuilder, SimpleClassHierarchy, Stmt, Type, Var,
};

#[derive(Deserialize)]
struct ProgramFile {
    #[serde(default)]
    classes: Vec<ClassDef>,
    #[serde(default)]
    vtable: Vec<VtableEntry>,
    methods: Vec<MethodDef>,
}

#[derive(Deserialize)]
struct ClassDef {
    name: String,
    #[serde(default)]
    parent: Option<String>,
}

#[derive(Deserialize)]
struct VtableEntry {
    #[serde(rename = "type")]
    ty: String,
    selector: String,
    method: String,
}

#[derive(Deserialize)]
struct MethodDef {
    signature: String,
    declaring_type: String,
    #[serde(default)]
    is_constructor: bool,
    #[serde(default)]
    is_application: bool,
    #[serde(default)]
    entry: bool,
    #[serde(default)]
    vars: HashMap<String, String>,
    #[serde(default)]
    this_var: Option<String>,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    return_var: Option<String>,
    #[serde(default)]
    body: Vec<StmtDef>,
}

#[derive(Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum StmtDef {
    Copy {
        lhs: String,
        rhs: String,
    },
    Cast {
        lhs: String,
        rhs: String,
        cast_type: String,
    },
    LoadField {
        lhs: String,
        base: String,
        field_decl_type: String,
        field_name: String,
        field_type: String,
    },
    StoreField {
        base: String,
        field_decl_type: String,
        field_name: String,
        field_type: String,
        rhs: String,
    },
    LoadArray {
        lhs: String,
        base: String,
    },
    StoreArray {
        base: String,
        rhs: String,
    },
    New {
        lhs: String,
        obj_kind: ObjKindDef,
    },
    Invoke {
        signature: String,
        selector: String,
        #[serde(default)]
        static_callee: Option<String>,
        #[serde(default)]
        recv: Option<String>,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        result: Option<String>,
    },
    Return {
        #[serde(default)]
        value: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ObjKindDef {
    Instance { ty: String },
    StringConst { value: String },
    ClassConst { ty: String },
}

pub fn load_program(path: &Path) -> Result<Program> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: ProgramFile = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let mut class_hierarchy = SimpleClassHierarchy::new();
    for class in &file.classes {
        class_hierarchy.add_class(Type::from(class.name.as_str()), class.parent.as_deref().map(Type::from));
    }

    // Method ids are assigned in declaration order by `ProgramBuilder`, so
    // this mirrors that order up front to let `static_callee`/vtable entries
    // refer forward to methods not yet built.
    let mut method_ids: HashMap<&str, MethodId> = HashMap::new();
    for (index, method) in file.methods.iter().enumerate() {
        method_ids.insert(method.signature.as_str(), MethodId::from_usize(index));
    }

    for entry in &file.vtable {
        let method_id = *method_ids
            .get(entry.method.as_str())
            .with_context(|| format!("vtable entry references unknown method {}", entry.method))?;
        class_hierarchy.add_method(Type::from(entry.ty.as_str()), entry.selector.as_str(), method_id, entry.method.as_str());
    }

    let mut builder = ProgramBuilder::new();
    for method_def in &file.methods {
        let mut vars: HashMap<&str, Var> = HashMap::new();
        for (name, ty) in &method_def.vars {
            vars.insert(name.as_str(), builder.new_var(Type::from(ty.as_str())));
        }
        let lookup = |name: &str| -> Result<Var> { vars.get(name).copied().with_context(|| format!("undeclared variable {name}")) };
        let lookup_opt = |name: &Option<String>| -> Result<Option<Var>> { name.as_deref().map(lookup).transpose() };

        let this_var = lookup_opt(&method_def.this_var)?;
        let return_var = lookup_opt(&method_def.return_var)?;
        let params = method_def.params.iter().map(|n| lookup(n)).collect::<Result<Vec<_>>>()?;

        let mut body = Vec::with_capacity(method_def.body.len());
        for stmt in &method_def.body {
            body.push(lower_stmt(stmt, &mut builder, &lookup, &method_ids)?);
        }

        builder.add_method(method_def.entry, |id| Method {
            id,
            signature: Rc::from(method_def.signature.as_str()),
            declaring_type: Type::from(method_def.declaring_type.as_str()),
            params,
            this_var,
            return_var,
            body,
            is_constructor: method_def.is_constructor,
            is_application: method_def.is_application,
        });
    }

    Ok(builder.build(Rc::new(class_hierarchy)))
}

fn lower_stmt(
    stmt: &StmtDef,
    builder: &mut ProgramBuilder,
    lookup: &impl Fn(&str) -> Result<Var>,
    method_ids: &HashMap<&str, MethodId>,
) -> Result<Stmt> {
    Ok(match stmt {
        StmtDef::Copy { lhs, rhs } => Stmt::Copy { lhs: lookup(lhs)?, rhs: lookup(rhs)? },
        StmtDef::Cast { lhs, rhs, cast_type } => Stmt::Cast { lhs: lookup(lhs)?, rhs: lookup(rhs)?, cast_type: Type::from(cast_type.as_str()) },
        StmtDef::LoadField { lhs, base, field_decl_type, field_name, field_type } => Stmt::LoadField {
            lhs: lookup(lhs)?,
            base: lookup(base)?,
            field: Field::new(Type::from(field_decl_type.as_str()), field_name.as_str(), Type::from(field_type.as_str())),
        },
        StmtDef::StoreField { base, field_decl_type, field_name, field_type, rhs } => Stmt::StoreField {
            base: lookup(base)?,
            field: Field::new(Type::from(field_decl_type.as_str()), field_name.as_str(), Type::from(field_type.as_str())),
            rhs: lookup(rhs)?,
        },
        StmtDef::LoadArray { lhs, base } => Stmt::LoadArray { lhs: lookup(lhs)?, base: lookup(base)? },
        StmtDef::StoreArray { base, rhs } => Stmt::StoreArray { base: lookup(base)?, rhs: lookup(rhs)? },
        StmtDef::New { lhs, obj_kind } => {
            let obj_id = builder.new_obj_id();
            let obj_kind = match obj_kind {
                ObjKindDef::Instance { ty } => ObjKind::Instance(Type::from(ty.as_str())),
                ObjKindDef::StringConst { value } => ObjKind::StringConst(Rc::from(value.as_str())),
                ObjKindDef::ClassConst { ty } => ObjKind::ClassConst(Type::from(ty.as_str())),
            };
            Stmt::New { lhs: lookup(lhs)?, obj_id, obj_kind }
        }
        StmtDef::Invoke { signature, selector, static_callee, recv, args, result } => {
            let static_callee = match static_callee {
                Some(sig) => Some(*method_ids.get(sig.as_str()).with_context(|| format!("invoke references unknown static callee {sig}"))?),
                None => None,
            };
            if static_callee.is_none() && recv.is_none() {
                bail!("virtual call to {signature} has no receiver");
            }
            Stmt::Invoke(Invoke {
                id: builder.new_invoke_id(),
                signature: Rc::from(signature.as_str()),
                selector: Rc::from(selector.as_str()),
                static_callee,
                recv: recv.as_deref().map(lookup).transpose()?,
                args: args.iter().map(|n| lookup(n)).collect::<Result<Vec<_>>>()?,
                result: result.as_deref().map(lookup).transpose()?,
            })
        }
        StmtDef::Return { value } => Stmt::Return { value: value.as_deref().map(lookup).transpose()? },
    })
}
