// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Command-line driver. Loads a program and a taint rule configuration,
//! runs the solver with the taint plugin registered, and dumps whatever
//! the `--dump-*` flags ask for.
//!
//! The IR's own front end (turning real bytecode into `ir::Program`) is out
//! of scope (§1); `loader` below is a minimal JSON reader just so this
//! binary has something concrete to drive, not a substitute for one.

use std::path::Path;
use std::rc::Rc;

use taint_pta::context_selector::make_selector;
use taint_pta::result::AnalysisResult;
use taint_pta::solver::Solver;
use taint_pta::taint::config::TaintConfig;
use taint_pta::taint::TaintPlugin;
use taint_pta::tfg;
use taint_pta::util::options::AnalysisOptions;

mod loader;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = AnalysisOptions::parse_from_args(&args);

    let program = match loader::load_program(Path::new(&options.program_path)) {
        Ok(p) => Rc::new(p),
        Err(e) => {
            eprintln!("failed to load program {}: {e}", options.program_path);
            std::process::exit(1);
        }
    };

    let config = match TaintConfig::load(Path::new(&options.config_path), program.class_hierarchy.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load taint configuration {}: {e}", options.config_path);
            std::process::exit(1);
        }
    };

    let selector = make_selector(options.pta_type, options.context_depth);
    let mut solver = Solver::new(program, selector);
    let taint_plugin = TaintPlugin::new(config);
    // Grabbed before the plugin is moved into the solver, so its results are
    // still reachable once `solver.run()` returns.
    let taint_outputs = taint_plugin.outputs();
    solver.register_plugin(Box::new(taint_plugin));

    let outcome = solver.run();

    let flows = taint_outputs.borrow().flows.clone();
    let taint_flow_graph = tfg::build(&solver, &flows, taint_outputs.borrow().var_transfers(), options.only_app);
    let result = AnalysisResult::new(outcome, &solver, flows, taint_flow_graph);

    if options.dump_stats {
        log::info!(
            "reached {} methods, {} PFG nodes, {} unsound call sites",
            result.reached_methods().count(),
            result.pointer_flow_graph().graph.node_count(),
            result.unsound_invokes().len(),
        );
    }

    if let Some(path) = &options.call_graph_output {
        if let Err(e) = std::fs::write(path, result.call_graph().to_dot()) {
            eprintln!("failed to write call graph to {path}: {e}");
        }
    }

    if let Some(path) = &options.taint_flows_output {
        let rendered: Vec<String> = result.taint_flows.iter().map(|f| format!("{:?} -> {:?}", f.source, f.sink)).collect();
        if let Err(e) = std::fs::write(path, rendered.join("\n")) {
            eprintln!("failed to write taint flows to {path}: {e}");
        }
    }

    if let Some(path) = &options.pts_output {
        use taint_pta::pts_set::points_to::PointsToSet;
        let mut lines = Vec::new();
        for node in result.pointer_flow_graph().graph.node_indices() {
            let pointer = result.pointer_flow_graph().pointer_of(node);
            let pts = result.points_to_set_of(pointer);
            let objs: Vec<String> = pts.iter().map(|id| format!("{id:?}")).collect();
            lines.push(format!("{pointer:?} -> [{}]", objs.join(", ")));
        }
        if let Err(e) = std::fs::write(path, lines.join("\n")) {
            eprintln!("failed to write points-to sets to {path}: {e}");
        }
    }
}
