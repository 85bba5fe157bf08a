// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! Loads and resolves the YAML taint rule configuration (§6).

use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::ir::{ClassHierarchy, MethodId, Type};

/// `"base" → -1`, `"result" → -2`, `"<n>" → n` for `n >= 0` (§6 "Index
/// encoding").
fn parse_index(raw: &str) -> Option<i32> {
    match raw {
        "base" => Some(-1),
        "result" => Some(-2),
        n => n.parse::<i32>().ok().filter(|n| *n >= 0),
    }
}

#[derive(Deserialize, Debug, Clone)]
struct RawSource {
    kind: String,
    method: String,
    index: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize, Debug, Clone)]
struct RawSink {
    method: String,
    index: String,
}

#[derive(Deserialize, Debug, Clone)]
struct RawTransfer {
    method: String,
    from: String,
    to: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize, Debug, Clone)]
struct RawSanitizer {
    method: String,
    index: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
struct RawConfig {
    #[serde(default)]
    sources: Vec<RawSource>,
    #[serde(default)]
    sinks: Vec<RawSink>,
    #[serde(default)]
    transfers: Vec<RawTransfer>,
    #[serde(default)]
    sanitizers: Vec<RawSanitizer>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SourceKind {
    Call,
    Param,
}

#[derive(Clone, Debug)]
pub struct SourceRule {
    pub kind: SourceKind,
    pub method: MethodId,
    pub index: i32,
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub struct SinkRule {
    pub method: MethodId,
    pub index: i32,
}

#[derive(Clone, Debug)]
pub struct TransferRule {
    pub method: MethodId,
    pub from: i32,
    pub to: i32,
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub struct SanitizerRule {
    pub method: MethodId,
    pub index: i32,
}

/// The rule set resolved against a class hierarchy: every `method` field is
/// a concrete [`MethodId`], and index encodings have already been parsed.
#[derive(Clone, Debug, Default)]
pub struct TaintConfig {
    pub sources: Vec<SourceRule>,
    pub sinks: Vec<SinkRule>,
    pub transfers: Vec<TransferRule>,
    pub sanitizers: Vec<SanitizerRule>,
}

impl TaintConfig {
    /// Loads a single YAML file or, if `path` is a directory, every
    /// `*.yml`/`*.yaml` found in it (recursively), merging by concatenation
    /// with per-list deduplication (§6).
    pub fn load(path: &Path, class_hierarchy: &dyn ClassHierarchy) -> crate::Result<Self> {
        let mut raw = RawConfig::default();
        if path.is_dir() {
            for file in collect_yaml_files(path)? {
                merge_raw(&mut raw, load_raw_file(&file)?);
            }
        } else {
            raw = load_raw_file(path)?;
        }
        Ok(resolve(raw, class_hierarchy))
    }
}

fn collect_yaml_files(dir: &Path) -> crate::Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| crate::Error::configuration(dir.display().to_string(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| crate::Error::configuration(dir.display().to_string(), e))?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_yaml_files(&path)?);
        } else if matches!(path.extension().and_then(|e| e.to_str()), Some("yml") | Some("yaml")) {
            files.push(path);
        }
    }
    Ok(files)
}

fn load_raw_file(path: &Path) -> crate::Result<RawConfig> {
    let text = fs::read_to_string(path).map_err(|e| crate::Error::configuration(path.display().to_string(), e))?;
    serde_yaml::from_str(&text).map_err(|e| crate::Error::configuration(path.display().to_string(), e))
}

fn merge_raw(into: &mut RawConfig, other: RawConfig) {
    for s in other.sources {
        if !into.sources.iter().any(|x| x.method == s.method && x.index == s.index && x.kind == s.kind) {
            into.sources.push(s);
        }
    }
    for s in other.sinks {
        if !into.sinks.iter().any(|x| x.method == s.method && x.index == s.index) {
            into.sinks.push(s);
        }
    }
    for t in other.transfers {
        if !into.transfers.iter().any(|x| x.method == t.method && x.from == t.from && x.to == t.to) {
            into.transfers.push(t);
        }
    }
    for s in other.sanitizers {
        if !into.sanitizers.iter().any(|x| x.method == s.method && x.index == s.index) {
            into.sanitizers.push(s);
        }
    }
}

fn resolve(raw: RawConfig, class_hierarchy: &dyn ClassHierarchy) -> TaintConfig {
    let mut config = TaintConfig::default();

    for s in raw.sources {
        let kind = match s.kind.as_str() {
            "call" => SourceKind::Call,
            "param" => SourceKind::Param,
            other => {
                warn!("unknown source kind {other:?}, skipping rule for {}", s.method);
                continue;
            }
        };
        let (Some(method), Some(index)) = (class_hierarchy.resolve_signature(&s.method), parse_index(&s.index)) else {
            warn!("unresolvable source rule for {}", s.method);
            continue;
        };
        config.sources.push(SourceRule { kind, method, index, ty: Type::from(s.ty.as_str()) });
    }

    for s in raw.sinks {
        let (Some(method), Some(index)) = (class_hierarchy.resolve_signature(&s.method), parse_index(&s.index)) else {
            warn!("unresolvable sink rule for {}", s.method);
            continue;
        };
        config.sinks.push(SinkRule { method, index });
    }

    for t in raw.transfers {
        let (Some(method), Some(from), Some(to)) =
            (class_hierarchy.resolve_signature(&t.method), parse_index(&t.from), parse_index(&t.to))
        else {
            warn!("unresolvable transfer rule for {}", t.method);
            continue;
        };
        config.transfers.push(TransferRule { method, from, to, ty: Type::from(t.ty.as_str()) });
    }

    for s in raw.sanitizers {
        let (Some(method), Some(index)) = (class_hierarchy.resolve_signature(&s.method), parse_index(&s.index)) else {
            warn!("unresolvable sanitizer rule for {}", s.method);
            continue;
        };
        config.sanitizers.push(SanitizerRule { method, index });
    }

    config
}
