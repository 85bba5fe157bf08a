// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The IR data model and class hierarchy the solver consumes.
//!
//! This is the concrete realization of §6's "Solver ↔ IR contract": a
//! normalized three-address IR for an object-oriented, class-based language,
//! plus a trivial in-memory [`ProgramBuilder`]. The front-end that turns real
//! bytecode into this shape is out of scope; the types here exist so the
//! core can be built and exercised without one.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::util::index::define_index;

define_index!(
    /// A whole-program-unique variable slot. Identifies the uncontextual
    /// "Var" referenced by a CSVar (§3).
    VarId
);
define_index!(
    /// Identifies a declared [`Method`].
    MethodId
);
define_index!(
    /// Identifies a call site (an `Invoke` statement), used as the identity
    /// half of `CallSourcePoint`/`SinkPoint` (§3).
    InvokeId
);
define_index!(
    /// Identifies an allocation site (a `New` statement).
    ObjId
);

/// A variable is identified purely by its id; its declared type and owning
/// method live in [`Program`] side tables.
pub type Var = VarId;

/// A fully-qualified type name. Cheap to clone and compare by content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type(Rc<str>);

impl Type {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Type(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Type {
    fn from(s: &str) -> Self {
        Type(Rc::from(s))
    }
}

/// A field declaration: `(declaring_type, name, field_type)`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Field {
    pub declaring_type: Type,
    pub name: Rc<str>,
    pub field_type: Type,
}

impl Field {
    pub fn new(declaring_type: Type, name: impl Into<Rc<str>>, field_type: Type) -> Self {
        Field { declaring_type, name: name.into(), field_type }
    }
}

/// What a `New` statement allocates. Recognized specially by the heap model
/// (§3): string/class constants are mock objects, not ordinary allocations.
#[derive(Clone, Debug)]
pub enum ObjKind {
    Instance(Type),
    StringConst(Rc<str>),
    ClassConst(Type),
}

/// A call site. `recv = None` marks a static call (no BASE pointer).
/// `static_callee` is resolved up front for non-virtual calls; for virtual
/// calls it is `None` and the solver resolves a callee per concrete receiver
/// type via `ClassHierarchy::dispatch` (§4.2).
#[derive(Clone, Debug)]
pub struct Invoke {
    pub id: InvokeId,
    /// Full signature of the statically declared target, in the
    /// `"<classType: returnType name(paramTypes)>"` form of §6. Used to key
    /// plugin/config rules regardless of how the call is ultimately
    /// dispatched.
    pub signature: Rc<str>,
    /// `"name(paramTypes)"`, used to resolve virtual dispatch against a
    /// concrete receiver type without re-parsing `signature`.
    pub selector: Rc<str>,
    pub static_callee: Option<MethodId>,
    pub recv: Option<Var>,
    pub args: Vec<Var>,
    pub result: Option<Var>,
}

impl Invoke {
    /// Returns the actual variable at a transfer/source/sink index, per the
    /// `-1=BASE, -2=RESULT, n>=0=argument` convention of §4.4/§4.5.
    pub fn actual_at(&self, index: i32) -> Option<Var> {
        match index {
            -1 => self.recv,
            -2 => self.result,
            n if n >= 0 => self.args.get(n as usize).copied(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Copy { lhs: Var, rhs: Var },
    Cast { lhs: Var, rhs: Var, cast_type: Type },
    LoadField { lhs: Var, base: Var, field: Field },
    StoreField { base: Var, field: Field, rhs: Var },
    LoadArray { lhs: Var, base: Var },
    StoreArray { base: Var, rhs: Var },
    New { lhs: Var, obj_id: ObjId, obj_kind: ObjKind },
    Invoke(Invoke),
    Return { value: Option<Var> },
}

#[derive(Clone, Debug)]
pub struct Method {
    pub id: MethodId,
    /// `"<classType: returnType name(paramTypes)>"`, per §6.
    pub signature: Rc<str>,
    pub declaring_type: Type,
    pub params: Vec<Var>,
    pub this_var: Option<Var>,
    pub return_var: Option<Var>,
    pub body: Vec<Stmt>,
    pub is_constructor: bool,
    /// Feeds the `onlyApp` TFG pruning policy (§4.6).
    pub is_application: bool,
}

impl Method {
    /// Returns the formal at a transfer/source/sink index, using the same
    /// convention as [`Invoke::actual_at`].
    pub fn formal_at(&self, index: i32) -> Option<Var> {
        match index {
            -1 => self.this_var,
            -2 => self.return_var,
            n if n >= 0 => self.params.get(n as usize).copied(),
            _ => None,
        }
    }
}

/// Resolves signatures and virtual dispatch against the type universe of a
/// program. Out of scope per §1; this crate ships only the minimal
/// [`SimpleClassHierarchy`] needed to exercise the core.
pub trait ClassHierarchy {
    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool;
    /// Finds the method that overrides `selector` starting the search at
    /// `recv_ty` and walking up the superclass chain.
    fn dispatch(&self, recv_ty: &Type, selector: &str) -> Option<MethodId>;
    fn resolve_signature(&self, signature: &str) -> Option<MethodId>;
}

/// An explicit parent map plus a per-type vtable. Good enough for tests, the
/// demo binary, and the scenarios of §8; a real front-end would back this
/// with whatever class-file/metadata format it parses.
#[derive(Default)]
pub struct SimpleClassHierarchy {
    parents: HashMap<Type, Type>,
    vtable: HashMap<(Type, Rc<str>), MethodId>,
    signatures: HashMap<Rc<str>, MethodId>,
}

impl SimpleClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, ty: Type, parent: Option<Type>) {
        if let Some(p) = parent {
            self.parents.insert(ty, p);
        }
    }

    /// Registers `method` as the implementation of `selector` on `ty`, and
    /// indexes it by its full signature for §6 signature resolution.
    pub fn add_method(&mut self, ty: Type, selector: impl Into<Rc<str>>, method: MethodId, full_signature: impl Into<Rc<str>>) {
        let selector = selector.into();
        self.vtable.insert((ty, selector), method);
        self.signatures.insert(full_signature.into(), method);
    }
}

impl ClassHierarchy for SimpleClassHierarchy {
    fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        if sub == sup {
            return true;
        }
        let mut cur = sub.clone();
        while let Some(p) = self.parents.get(&cur) {
            if p == sup {
                return true;
            }
            cur = p.clone();
        }
        false
    }

    fn dispatch(&self, recv_ty: &Type, selector: &str) -> Option<MethodId> {
        let selector: Rc<str> = Rc::from(selector);
        let mut cur = recv_ty.clone();
        loop {
            if let Some(m) = self.vtable.get(&(cur.clone(), selector.clone())) {
                return Some(*m);
            }
            match self.parents.get(&cur) {
                Some(p) => cur = p.clone(),
                None => return None,
            }
        }
    }

    fn resolve_signature(&self, signature: &str) -> Option<MethodId> {
        self.signatures.get(signature).copied()
    }
}

/// The whole-program container: all reachable-or-not methods plus the shared
/// class hierarchy. `entry_methods` seeds reachability.
pub struct Program {
    methods: Vec<Method>,
    method_ids: HashMap<Rc<str>, MethodId>,
    var_types: HashMap<VarId, Type>,
    pub class_hierarchy: Rc<dyn ClassHierarchy>,
    entry_methods: Vec<MethodId>,
}

impl Program {
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.as_usize()]
    }

    pub fn var_type(&self, v: Var) -> Option<&Type> {
        self.var_types.get(&v)
    }

    pub fn resolve_signature(&self, sig: &str) -> Option<MethodId> {
        self.method_ids.get(sig).copied()
    }

    pub fn entry_methods(&self) -> &[MethodId] {
        &self.entry_methods
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }
}

/// Builds a [`Program`] incrementally. Used by tests, the demo binary, and
/// anything else that needs a small IR without a real front-end.
#[derive(Default)]
pub struct ProgramBuilder {
    next_var: u32,
    next_invoke: u32,
    next_obj: u32,
    methods: Vec<Method>,
    method_ids: HashMap<Rc<str>, MethodId>,
    var_types: HashMap<VarId, Type>,
    entry_methods: Vec<MethodId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_var(&mut self, ty: Type) -> Var {
        let id = VarId::from_usize(self.next_var as usize);
        self.next_var += 1;
        self.var_types.insert(id, ty);
        id
    }

    pub fn new_invoke_id(&mut self) -> InvokeId {
        let id = InvokeId::from_usize(self.next_invoke as usize);
        self.next_invoke += 1;
        id
    }

    pub fn new_obj_id(&mut self) -> ObjId {
        let id = ObjId::from_usize(self.next_obj as usize);
        self.next_obj += 1;
        id
    }

    /// Reserves the next method id and constructs the method with it,
    /// guaranteeing `methods[id.as_usize()]` lines up.
    pub fn add_method(&mut self, is_entry: bool, build: impl FnOnce(MethodId) -> Method) -> MethodId {
        let id = MethodId::from_usize(self.methods.len());
        let method = build(id);
        self.method_ids.insert(method.signature.clone(), id);
        if is_entry {
            self.entry_methods.push(id);
        }
        self.methods.push(method);
        id
    }

    pub fn build(self, class_hierarchy: Rc<dyn ClassHierarchy>) -> Program {
        Program {
            methods: self.methods,
            method_ids: self.method_ids,
            var_types: self.var_types,
            class_hierarchy,
            entry_methods: self.entry_methods,
        }
    }
}
