// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.
//
// End-to-end scenarios driving the solver with the taint plugin registered,
// built directly off `ir::ProgramBuilder` rather than any real front end.

use std::collections::HashSet;
use std::rc::Rc;

use taint_pta::context::ContextId;
use taint_pta::context_selector::ContextInsensitive;
use taint_pta::cs_manager::Pointer;
use taint_pta::ir::{Field, Invoke, Method, ObjKind, Program, ProgramBuilder, SimpleClassHierarchy, Stmt, Type};
use taint_pta::plugin::{BASE, RESULT};
use taint_pta::solver::Solver;
use taint_pta::taint::config::{SanitizerRule, SinkRule, SourceKind, SourceRule, TaintConfig, TransferRule};
use taint_pta::taint::manager::{SinkPoint, SourcePoint, TaintFlow};
use taint_pta::taint::TaintPlugin;
use taint_pta::tfg;

fn ty(name: &str) -> Type {
    Type::from(name)
}

fn build(hierarchy: SimpleClassHierarchy, builder: ProgramBuilder) -> Program {
    builder.build(Rc::new(hierarchy))
}

/// Runs `program` with `config` installed, returning the witnessed flows.
fn run(program: Program, config: TaintConfig) -> HashSet<TaintFlow> {
    let mut solver = Solver::new(Rc::new(program), Box::new(ContextInsensitive));
    let plugin = TaintPlugin::new(config);
    let outputs = plugin.outputs();
    solver.register_plugin(Box::new(plugin));
    solver.run();
    outputs.borrow().flows.clone()
}

/// `x = source(); sink(x)` — the taint minted at `source()`'s result must be
/// visible at `sink`'s argument (§8 scenario 1, direct flow).
#[test]
fn direct_call_source_flows_to_call_sink() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");
    let x = builder.new_var(v.clone());

    let source_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });
    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let source_invoke = builder.new_invoke_id();
    let sink_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![
            Stmt::Invoke(Invoke {
                id: source_invoke,
                signature: Rc::from("<Lib: V source()>"),
                selector: Rc::from("source()"),
                static_callee: Some(source_id),
                recv: None,
                args: vec![],
                result: Some(x),
            }),
            Stmt::Invoke(Invoke {
                id: sink_invoke,
                signature: Rc::from("<Lib: void sink(V)>"),
                selector: Rc::from("sink(V)"),
                static_callee: Some(sink_id),
                recv: None,
                args: vec![x],
                result: None,
            }),
        ],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![SourceRule { kind: SourceKind::Call, method: source_id, index: RESULT, ty: v.clone() }],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![],
        sanitizers: vec![],
    };

    let flows = run(program, config);
    assert_eq!(flows.len(), 1);
    assert!(flows.contains(&TaintFlow {
        source: SourcePoint::CallSource(source_invoke, RESULT),
        sink: SinkPoint { invoke: sink_invoke, index: 0 },
    }));
}

/// A method whose own formal is declared a source taints every call to it
/// regardless of what the caller passes (§4.5 parameter-source kind).
#[test]
fn param_source_flows_to_sink_inside_callee() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");

    let handler_param = builder.new_var(v.clone());
    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let inner_sink_invoke = builder.new_invoke_id();
    let handler_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<App: void handle(V)>"),
        declaring_type: ty("App"),
        params: vec![handler_param],
        this_var: None,
        return_var: None,
        body: vec![Stmt::Invoke(Invoke {
            id: inner_sink_invoke,
            signature: Rc::from("<Lib: void sink(V)>"),
            selector: Rc::from("sink(V)"),
            static_callee: Some(sink_id),
            recv: None,
            args: vec![handler_param],
            result: None,
        })],
        is_constructor: false,
        is_application: true,
    });

    let y = builder.new_var(v.clone());
    let outer_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![Stmt::Invoke(Invoke {
            id: outer_invoke,
            signature: Rc::from("<App: void handle(V)>"),
            selector: Rc::from("handle(V)"),
            static_callee: Some(handler_id),
            recv: None,
            args: vec![y],
            result: None,
        })],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![SourceRule { kind: SourceKind::Param, method: handler_id, index: 0, ty: v.clone() }],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![],
        sanitizers: vec![],
    };

    let flows = run(program, config);
    assert!(flows.contains(&TaintFlow {
        source: SourcePoint::ParamSource(handler_id, 0),
        sink: SinkPoint { invoke: inner_sink_invoke, index: 0 },
    }));
}

/// A sanitizer on the source's own result index suppresses taint emission
/// entirely, so no flow is ever recorded (§8 scenario 3, sanitizer).
#[test]
fn sanitizer_on_source_result_suppresses_the_flow() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");
    let x = builder.new_var(v.clone());

    let source_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });
    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let source_invoke = builder.new_invoke_id();
    let sink_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![
            Stmt::Invoke(Invoke {
                id: source_invoke,
                signature: Rc::from("<Lib: V source()>"),
                selector: Rc::from("source()"),
                static_callee: Some(source_id),
                recv: None,
                args: vec![],
                result: Some(x),
            }),
            Stmt::Invoke(Invoke {
                id: sink_invoke,
                signature: Rc::from("<Lib: void sink(V)>"),
                selector: Rc::from("sink(V)"),
                static_callee: Some(sink_id),
                recv: None,
                args: vec![x],
                result: None,
            }),
        ],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![SourceRule { kind: SourceKind::Call, method: source_id, index: RESULT, ty: v.clone() }],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![],
        sanitizers: vec![SanitizerRule { method: source_id, index: RESULT }],
    };

    let flows = run(program, config);
    assert!(flows.is_empty());
}

/// `wrapper(a)` has a transfer rule `0 -> result` on its own callee `helper`;
/// taint flowing into `wrapper`'s argument must reappear at `wrapper`'s
/// result and reach a sink on the call site that consumes it (§8 scenario 2,
/// transfer through a wrapper).
#[test]
fn transfer_through_wrapper_reaches_outer_sink() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");

    let helper_param = builder.new_var(v.clone());
    let helper_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V helper(V)>"),
        declaring_type: ty("Lib"),
        params: vec![helper_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let wrapper_param = builder.new_var(v.clone());
    let wrapper_ret = builder.new_var(v.clone());
    let helper_invoke = builder.new_invoke_id();
    let wrapper_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<App: V wrapper(V)>"),
        declaring_type: ty("App"),
        params: vec![wrapper_param],
        this_var: None,
        return_var: Some(wrapper_ret),
        body: vec![
            Stmt::Invoke(Invoke {
                id: helper_invoke,
                signature: Rc::from("<Lib: V helper(V)>"),
                selector: Rc::from("helper(V)"),
                static_callee: Some(helper_id),
                recv: None,
                args: vec![wrapper_param],
                result: Some(wrapper_ret),
            }),
            Stmt::Return { value: Some(wrapper_ret) },
        ],
        is_constructor: false,
        is_application: true,
    });

    let x = builder.new_var(v.clone());
    let y = builder.new_var(v.clone());
    let source_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });
    let source_invoke = builder.new_invoke_id();
    let wrapper_invoke = builder.new_invoke_id();
    let sink_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![
            Stmt::Invoke(Invoke {
                id: source_invoke,
                signature: Rc::from("<Lib: V source()>"),
                selector: Rc::from("source()"),
                static_callee: Some(source_id),
                recv: None,
                args: vec![],
                result: Some(x),
            }),
            Stmt::Invoke(Invoke {
                id: wrapper_invoke,
                signature: Rc::from("<App: V wrapper(V)>"),
                selector: Rc::from("wrapper(V)"),
                static_callee: Some(wrapper_id),
                recv: None,
                args: vec![x],
                result: Some(y),
            }),
            Stmt::Invoke(Invoke {
                id: sink_invoke,
                signature: Rc::from("<Lib: void sink(V)>"),
                selector: Rc::from("sink(V)"),
                static_callee: Some(sink_id),
                recv: None,
                args: vec![y],
                result: None,
            }),
        ],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![SourceRule { kind: SourceKind::Call, method: source_id, index: RESULT, ty: v.clone() }],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![TransferRule { method: helper_id, from: 0, to: RESULT, ty: v.clone() }],
        sanitizers: vec![],
    };

    let flows = run(program, config);
    assert!(flows.contains(&TaintFlow {
        source: SourcePoint::CallSource(source_invoke, RESULT),
        sink: SinkPoint { invoke: sink_invoke, index: 0 },
    }));
}

/// `b.setVal(x)` where `setVal` stores its argument into a field of `this`:
/// a `0 -> base` transfer rule must make the later `b.val` load (and a sink
/// reading it) see the taint (§8 scenario 4, back-propagation through a
/// field write).
#[test]
fn back_propagation_through_field_write_reaches_later_load() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");
    let box_ty = ty("Box");
    let field = Field::new(box_ty.clone(), "val", v.clone());

    let set_this = builder.new_var(box_ty.clone());
    let set_param = builder.new_var(v.clone());
    let set_val_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Box: void setVal(V)>"),
        declaring_type: box_ty.clone(),
        params: vec![set_param],
        this_var: Some(set_this),
        return_var: None,
        body: vec![Stmt::StoreField { base: set_this, field: field.clone(), rhs: set_param }],
        is_constructor: false,
        is_application: false,
    });

    let source_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });
    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let b = builder.new_var(box_ty.clone());
    let x = builder.new_var(v.clone());
    let v2 = builder.new_var(v.clone());
    let new_obj = builder.new_obj_id();
    let source_invoke = builder.new_invoke_id();
    let set_invoke = builder.new_invoke_id();
    let sink_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![
            Stmt::New { lhs: b, obj_id: new_obj, obj_kind: ObjKind::Instance(box_ty.clone()) },
            Stmt::Invoke(Invoke {
                id: source_invoke,
                signature: Rc::from("<Lib: V source()>"),
                selector: Rc::from("source()"),
                static_callee: Some(source_id),
                recv: None,
                args: vec![],
                result: Some(x),
            }),
            Stmt::Invoke(Invoke {
                id: set_invoke,
                signature: Rc::from("<Box: void setVal(V)>"),
                selector: Rc::from("setVal(V)"),
                static_callee: Some(set_val_id),
                recv: Some(b),
                args: vec![x],
                result: None,
            }),
            Stmt::LoadField { lhs: v2, base: b, field: field.clone() },
            Stmt::Invoke(Invoke {
                id: sink_invoke,
                signature: Rc::from("<Lib: void sink(V)>"),
                selector: Rc::from("sink(V)"),
                static_callee: Some(sink_id),
                recv: None,
                args: vec![v2],
                result: None,
            }),
        ],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![SourceRule { kind: SourceKind::Call, method: source_id, index: RESULT, ty: v.clone() }],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![TransferRule { method: set_val_id, from: 0, to: BASE, ty: v.clone() }],
        sanitizers: vec![],
    };

    let flows = run(program, config);
    assert!(flows.contains(&TaintFlow {
        source: SourcePoint::CallSource(source_invoke, RESULT),
        sink: SinkPoint { invoke: sink_invoke, index: 0 },
    }));
}

/// Two sources: `x1 = source1(); sink(x1);` and `c.f = source2();` with no
/// load ever reading `c.f` back out. The pruned graph must keep `x1`'s chain
/// and drop `x2`'s dead-end entirely (§8 scenario 6, TFG pruning).
#[test]
fn tfg_prunes_the_source_that_never_reaches_a_sink() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");
    let c_ty = ty("C");
    let field = Field::new(c_ty.clone(), "f", v.clone());

    let source1_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source1()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });
    let source2_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source2()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });
    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let x1 = builder.new_var(v.clone());
    let x2 = builder.new_var(v.clone());
    let c = builder.new_var(c_ty.clone());
    let new_obj = builder.new_obj_id();
    let source1_invoke = builder.new_invoke_id();
    let source2_invoke = builder.new_invoke_id();
    let sink_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![
            Stmt::Invoke(Invoke {
                id: source1_invoke,
                signature: Rc::from("<Lib: V source1()>"),
                selector: Rc::from("source1()"),
                static_callee: Some(source1_id),
                recv: None,
                args: vec![],
                result: Some(x1),
            }),
            Stmt::Invoke(Invoke {
                id: sink_invoke,
                signature: Rc::from("<Lib: void sink(V)>"),
                selector: Rc::from("sink(V)"),
                static_callee: Some(sink_id),
                recv: None,
                args: vec![x1],
                result: None,
            }),
            Stmt::New { lhs: c, obj_id: new_obj, obj_kind: ObjKind::Instance(c_ty.clone()) },
            Stmt::Invoke(Invoke {
                id: source2_invoke,
                signature: Rc::from("<Lib: V source2()>"),
                selector: Rc::from("source2()"),
                static_callee: Some(source2_id),
                recv: None,
                args: vec![],
                result: Some(x2),
            }),
            Stmt::StoreField { base: c, field: field.clone(), rhs: x2 },
        ],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![
            SourceRule { kind: SourceKind::Call, method: source1_id, index: RESULT, ty: v.clone() },
            SourceRule { kind: SourceKind::Call, method: source2_id, index: RESULT, ty: v.clone() },
        ],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![],
        sanitizers: vec![],
    };

    let mut solver = Solver::new(Rc::new(program), Box::new(ContextInsensitive));
    let plugin = TaintPlugin::new(config);
    let outputs = plugin.outputs();
    solver.register_plugin(Box::new(plugin));
    solver.run();

    let flows = outputs.borrow().flows.clone();
    assert_eq!(flows.len(), 1);

    let graph = tfg::build(&solver, &flows, outputs.borrow().var_transfers(), false);
    let ctx = ContextId::from_usize(0);
    assert!(graph.contains(&Pointer::CSVar(ctx, x1)));
    assert!(!graph.contains(&Pointer::CSVar(ctx, x2)));
}

/// `x = source(); y = relay(x); sink(y);` where `relay` is a *library*
/// method whose own body copies its parameter straight into its return var
/// (`relay_param -> relay_ret -> y`, ordinary PFG edges, no transfer rule
/// involved). Under `only_app: true` the two intermediate nodes are
/// library-owned and must be excluded from the emitted graph, but traversal
/// must still cross them to discover `y` — the `app_var -> lib_var ->
/// app_var2` chain (§4.6 step 4) the onlyApp dead-end bug used to lose.
#[test]
fn only_app_pruning_still_discovers_a_var_reached_through_a_library_relay() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");

    let source_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let relay_param = builder.new_var(v.clone());
    let relay_ret = builder.new_var(v.clone());
    let relay_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V relay(V)>"),
        declaring_type: ty("Lib"),
        params: vec![relay_param],
        this_var: None,
        return_var: Some(relay_ret),
        body: vec![
            Stmt::Copy { lhs: relay_ret, rhs: relay_param },
            Stmt::Return { value: Some(relay_ret) },
        ],
        is_constructor: false,
        is_application: false,
    });

    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let x = builder.new_var(v.clone());
    let y = builder.new_var(v.clone());
    let source_invoke = builder.new_invoke_id();
    let relay_invoke = builder.new_invoke_id();
    let sink_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![
            Stmt::Invoke(Invoke {
                id: source_invoke,
                signature: Rc::from("<Lib: V source()>"),
                selector: Rc::from("source()"),
                static_callee: Some(source_id),
                recv: None,
                args: vec![],
                result: Some(x),
            }),
            Stmt::Invoke(Invoke {
                id: relay_invoke,
                signature: Rc::from("<Lib: V relay(V)>"),
                selector: Rc::from("relay(V)"),
                static_callee: Some(relay_id),
                recv: None,
                args: vec![x],
                result: Some(y),
            }),
            Stmt::Invoke(Invoke {
                id: sink_invoke,
                signature: Rc::from("<Lib: void sink(V)>"),
                selector: Rc::from("sink(V)"),
                static_callee: Some(sink_id),
                recv: None,
                args: vec![y],
                result: None,
            }),
        ],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![SourceRule { kind: SourceKind::Call, method: source_id, index: RESULT, ty: v.clone() }],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![],
        sanitizers: vec![],
    };

    let mut solver = Solver::new(Rc::new(program), Box::new(ContextInsensitive));
    let plugin = TaintPlugin::new(config);
    let outputs = plugin.outputs();
    solver.register_plugin(Box::new(plugin));
    solver.run();

    let flows = outputs.borrow().flows.clone();
    assert_eq!(flows.len(), 1);

    let ctx = ContextId::from_usize(0);
    let unpruned = tfg::build(&solver, &flows, outputs.borrow().var_transfers(), false);
    assert!(unpruned.contains(&Pointer::CSVar(ctx, y)));

    let only_app = tfg::build(&solver, &flows, outputs.borrow().var_transfers(), true);
    assert!(
        only_app.contains(&Pointer::CSVar(ctx, y)),
        "app_var -> lib_var -> app_var2 chain must still be discovered under only_app"
    );
}

/// `s = source(); t = sanitize(s); sink(t);` where `sanitize` is a distinct
/// library method with a transfer rule `0 -> result` (so, absent
/// sanitization, it would pass its argument's taint straight through to its
/// result, exactly like `transfer_through_wrapper_reaches_outer_sink`) and a
/// sanitizer rule on that same `(method, result)` pair. The sanitizer must
/// suppress the transfer itself, so no taint ever reaches `t` and no flow is
/// recorded (§8 scenario 3, cross-method sanitizer).
#[test]
fn sanitizer_on_a_distinct_methods_transfer_suppresses_the_flow() {
    let mut builder = ProgramBuilder::new();
    let v = ty("V");

    let source_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V source()>"),
        declaring_type: ty("Lib"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let sanitize_param = builder.new_var(v.clone());
    let sanitize_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: V sanitize(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sanitize_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let sink_param = builder.new_var(v.clone());
    let sink_id = builder.add_method(false, |id| Method {
        id,
        signature: Rc::from("<Lib: void sink(V)>"),
        declaring_type: ty("Lib"),
        params: vec![sink_param],
        this_var: None,
        return_var: None,
        body: vec![],
        is_constructor: false,
        is_application: false,
    });

    let s = builder.new_var(v.clone());
    let t = builder.new_var(v.clone());
    let source_invoke = builder.new_invoke_id();
    let sanitize_invoke = builder.new_invoke_id();
    let sink_invoke = builder.new_invoke_id();
    builder.add_method(true, |id| Method {
        id,
        signature: Rc::from("<App: void main()>"),
        declaring_type: ty("App"),
        params: vec![],
        this_var: None,
        return_var: None,
        body: vec![
            Stmt::Invoke(Invoke {
                id: source_invoke,
                signature: Rc::from("<Lib: V source()>"),
                selector: Rc::from("source()"),
                static_callee: Some(source_id),
                recv: None,
                args: vec![],
                result: Some(s),
            }),
            Stmt::Invoke(Invoke {
                id: sanitize_invoke,
                signature: Rc::from("<Lib: V sanitize(V)>"),
                selector: Rc::from("sanitize(V)"),
                static_callee: Some(sanitize_id),
                recv: None,
                args: vec![s],
                result: Some(t),
            }),
            Stmt::Invoke(Invoke {
                id: sink_invoke,
                signature: Rc::from("<Lib: void sink(V)>"),
                selector: Rc::from("sink(V)"),
                static_callee: Some(sink_id),
                recv: None,
                args: vec![t],
                result: None,
            }),
        ],
        is_constructor: false,
        is_application: true,
    });

    let program = build(SimpleClassHierarchy::new(), builder);
    let config = TaintConfig {
        sources: vec![SourceRule { kind: SourceKind::Call, method: source_id, index: RESULT, ty: v.clone() }],
        sinks: vec![SinkRule { method: sink_id, index: 0 }],
        transfers: vec![TransferRule { method: sanitize_id, from: 0, to: RESULT, ty: v.clone() }],
        sanitizers: vec![SanitizerRule { method: sanitize_id, index: RESULT }],
    };

    let flows = run(program, config);
    assert!(flows.is_empty());
}
