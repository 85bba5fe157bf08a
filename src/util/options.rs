// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Analysis options for the command-line driver.

use clap::{Arg, Command};

use crate::context_selector::PtaType;

const USAGE: &str = r#"taint-pta [OPTIONS] --config <CONFIG> <PROGRAM>"#;

fn version() -> &'static str {
    concat!("v", env!("CARGO_PKG_VERSION"))
}

/// Builds the `clap` command line grammar.
fn make_options_parser() -> Command<'static> {
    Command::new("taint-pta")
        .no_binary_name(true)
        .override_usage(USAGE)
        .version(version())
        .arg(
            Arg::new("config")
                .long("config")
                .takes_value(true)
                .required(true)
                .help("Path to the taint rule configuration file or directory (YAML)."),
        )
        .arg(
            Arg::new("entry-method")
                .long("entry-method")
                .takes_value(true)
                .help("The signature of the method from which the analysis begins."),
        )
        .arg(
            Arg::new("pta-type")
                .long("pta-type")
                .takes_value(true)
                .value_parser(["andersen", "ander", "callsite-sensitive", "cs", "object-sensitive", "obj"])
                .default_value("callsite-sensitive")
                .help("The flavor of pointer analysis to run."),
        )
        .arg(
            Arg::new("context-depth")
                .long("context-depth")
                .takes_value(true)
                .value_parser(clap::value_parser!(usize))
                .default_value("1")
                .help("The context depth limit (k) for a context-sensitive pointer analysis."),
        )
        .arg(
            Arg::new("only-app")
                .long("only-app")
                .takes_value(false)
                .help("Restrict taint flow graph construction to application-declared methods."),
        )
        .arg(
            Arg::new("dump-stats")
                .long("dump-stats")
                .takes_value(false)
                .help("Log summary statistics of the analysis results."),
        )
        .arg(
            Arg::new("call-graph-output")
                .long("dump-call-graph")
                .takes_value(true)
                .help("Dump the call graph in DOT format to the given file."),
        )
        .arg(
            Arg::new("pts-output")
                .long("dump-pts")
                .takes_value(true)
                .help("Dump points-to results to the given file."),
        )
        .arg(
            Arg::new("taint-flows-output")
                .long("dump-taint-flows")
                .takes_value(true)
                .help("Dump discovered source-to-sink taint flows to the given file."),
        )
        .arg(
            Arg::new("PROGRAM")
                .required(true)
                .help("Path to the serialized program IR to analyze."),
        )
}

#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub program_path: String,
    pub config_path: String,
    pub entry_method: Option<String>,
    pub pta_type: PtaType,
    pub context_depth: usize,
    pub only_app: bool,
    pub dump_stats: bool,
    pub call_graph_output: Option<String>,
    pub pts_output: Option<String>,
    pub taint_flows_output: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            program_path: String::new(),
            config_path: String::new(),
            entry_method: None,
            pta_type: PtaType::CallSiteSensitive,
            context_depth: 1,
            only_app: false,
            dump_stats: false,
            call_graph_output: None,
            pts_output: None,
            taint_flows_output: None,
        }
    }
}

impl AnalysisOptions {
    /// Parses options from a list of command-line arguments (excluding argv[0]).
    pub fn parse_from_args(args: &[String]) -> Self {
        let matches = make_options_parser().get_matches_from(args.iter());

        let mut options = AnalysisOptions::default();
        options.program_path = matches.get_one::<String>("PROGRAM").cloned().unwrap_or_default();
        options.config_path = matches.get_one::<String>("config").cloned().unwrap_or_default();
        options.entry_method = matches.get_one::<String>("entry-method").cloned();

        options.pta_type = match matches.get_one::<String>("pta-type").unwrap().as_str() {
            "andersen" | "ander" => PtaType::Andersen,
            "callsite-sensitive" | "cs" => PtaType::CallSiteSensitive,
            "object-sensitive" | "obj" => PtaType::ObjectSensitive,
            _ => unreachable!(),
        };

        if let Some(depth) = matches.get_one::<usize>("context-depth") {
            options.context_depth = *depth;
        }

        options.only_app = matches.contains_id("only-app");
        options.dump_stats = matches.contains_id("dump-stats");
        options.call_graph_output = matches.get_one::<String>("call-graph-output").cloned();
        options.pts_output = matches.get_one::<String>("pts-output").cloned();
        options.taint_flows_output = matches.get_one::<String>("taint-flows-output").cloned();

        options
    }
}
