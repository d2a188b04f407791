//! Topology sequencer
//!
//! Validates a declaration set as a whole and fixes the order in which the
//! builder attempts pipelines. Connector references (a `pipeline` source or
//! sink) induce a flow graph; the sequencer rejects duplicate names,
//! references to undeclared pipelines and cycles, then emits every pipeline
//! with its upstream pipelines ahead of it. Ties keep declaration order, so
//! the result is deterministic for a given document.
//!
//! The order is advisory: the builder still resolves upstream pipelines on
//! demand, so a correct topology is produced from any order. Sequencing
//! keeps logs and failure blast radius stable across runs.

use std::collections::HashMap;

use weir_model::PipelineDeclaration;

use crate::connector::pipeline_target;
use crate::error::ValidationError;

/// Validate `declarations` and return the build attempt order
pub fn sequence(declarations: &[PipelineDeclaration]) -> Result<Vec<String>, ValidationError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(declarations.len());
    for (i, declaration) in declarations.iter().enumerate() {
        if index.insert(declaration.name(), i).is_some() {
            return Err(ValidationError::DuplicatePipeline {
                name: declaration.name().to_string(),
            });
        }
    }

    // Flow edges upstream -> downstream, stored as each node's upstream
    // list. Both reference directions land on the same edge shape:
    // "B's source is pipeline A" and "A's sink is pipeline B" both mean
    // A feeds B.
    let mut upstreams: Vec<Vec<usize>> = vec![Vec::new(); declarations.len()];
    for (i, declaration) in declarations.iter().enumerate() {
        if let Some(target) = pipeline_target(declaration.source()) {
            let t = resolve(&index, declaration, target, "source")?;
            push_unique(&mut upstreams[i], t);
        }
        for sink in declaration.sinks() {
            if let Some(target) = pipeline_target(sink.setting()) {
                let t = resolve(&index, declaration, target, "sink")?;
                push_unique(&mut upstreams[t], i);
            }
        }
    }

    // Depth-first over upstream edges: a pipeline is emitted after
    // everything feeding it. Three-state marks catch cycles.
    let mut marks = vec![Mark::Unvisited; declarations.len()];
    let mut order = Vec::with_capacity(declarations.len());
    let mut stack = Vec::new();
    for i in 0..declarations.len() {
        visit(i, declarations, &upstreams, &mut marks, &mut stack, &mut order)?;
    }

    Ok(order)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

fn resolve(
    index: &HashMap<&str, usize>,
    declaration: &PipelineDeclaration,
    target: &str,
    role: &'static str,
) -> Result<usize, ValidationError> {
    index
        .get(target)
        .copied()
        .ok_or_else(|| ValidationError::UnknownTarget {
            pipeline: declaration.name().to_string(),
            target: target.to_string(),
            role,
        })
}

fn push_unique(edges: &mut Vec<usize>, node: usize) {
    if !edges.contains(&node) {
        edges.push(node);
    }
}

fn visit(
    node: usize,
    declarations: &[PipelineDeclaration],
    upstreams: &[Vec<usize>],
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    order: &mut Vec<String>,
) -> Result<(), ValidationError> {
    match marks[node] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            return Err(ValidationError::ConnectorCycle {
                chain: cycle_chain(node, stack, declarations),
            });
        }
        Mark::Unvisited => {}
    }

    marks[node] = Mark::InProgress;
    stack.push(node);
    for &upstream in &upstreams[node] {
        visit(upstream, declarations, upstreams, marks, stack, order)?;
    }
    stack.pop();
    marks[node] = Mark::Done;

    order.push(declarations[node].name().to_string());
    Ok(())
}

/// Format the portion of the visit stack that closes the cycle at `node`
fn cycle_chain(node: usize, stack: &[usize], declarations: &[PipelineDeclaration]) -> String {
    let start = stack.iter().position(|&n| n == node).unwrap_or(0);
    let mut names: Vec<&str> = stack[start..]
        .iter()
        .map(|&n| declarations[n].name())
        .collect();
    names.push(declarations[node].name());
    names.join(" -> ")
}

#[cfg(test)]
#[path = "sequencer_test.rs"]
mod tests;
