//! GraphML export for inspecting a combined graph in Gephi or yEd.
//!
//! Operator nodes become GraphML nodes; graph inputs and outputs become
//! terminal nodes of kind `input` / `output`. Every data edge is labelled with
//! the name of the value flowing along it.

use crate::{errors::Result, model::graph::Graph};
use petgraph::visit::EdgeRef;
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

pub fn write_graphml(path: &Path, graph: &Graph) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let f = fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    render_graphml(&mut w, graph)?;
    w.flush()?;
    info!("graphml: wrote graph -> {}", path.display());
    Ok(())
}

pub fn render_graphml<W: Write>(w: &mut W, graph: &Graph) -> std::io::Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        w,
        r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns
     http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">"#
    )?;
    writeln!(w, r#"<key id="d0" for="node" attr.name="name" attr.type="string"/>"#)?;
    writeln!(w, r#"<key id="d1" for="node" attr.name="kind" attr.type="string"/>"#)?;
    writeln!(w, r#"<key id="d2" for="node" attr.name="op_type" attr.type="string"/>"#)?;
    writeln!(w, r#"<key id="e0" for="edge" attr.name="value" attr.type="string"/>"#)?;
    writeln!(
        w,
        r#"<graph id="{}" edgedefault="directed">"#,
        xml_escape(&graph.name)
    )?;

    for (i, &id) in graph.inputs().iter().enumerate() {
        terminal(w, &format!("in{i}"), graph.name_of(id), "input")?;
    }
    for (pos, node) in graph.nodes().iter().enumerate() {
        writeln!(w, r#"<node id="n{pos}">"#)?;
        writeln!(w, r#"  <data key="d0">{}</data>"#, xml_escape(&node.name))?;
        writeln!(w, r#"  <data key="d1">op</data>"#)?;
        writeln!(w, r#"  <data key="d2">{}</data>"#, xml_escape(&node.op_type))?;
        writeln!(w, r#"</node>"#)?;
    }
    for (i, &id) in graph.outputs().iter().enumerate() {
        terminal(w, &format!("out{i}"), graph.name_of(id), "output")?;
    }

    let mut edge = 0usize;
    let mut emit = |w: &mut W, src: &str, dst: &str, value: &str| -> std::io::Result<()> {
        writeln!(w, r#"<edge id="e{edge}" source="{src}" target="{dst}">"#)?;
        writeln!(w, r#"  <data key="e0">{}</data>"#, xml_escape(value))?;
        writeln!(w, r#"</edge>"#)?;
        edge += 1;
        Ok(())
    };

    let dep = graph.dependency_graph();
    for e in dep.edge_references() {
        let src = format!("n{}", e.source().index());
        let dst = format!("n{}", e.target().index());
        emit(w, &src, &dst, graph.name_of(*e.weight()))?;
    }
    for (i, &id) in graph.inputs().iter().enumerate() {
        for (pos, node) in graph.nodes().iter().enumerate() {
            if node.inputs.contains(&id) {
                emit(w, &format!("in{i}"), &format!("n{pos}"), graph.name_of(id))?;
            }
        }
    }
    let producers = graph.producers();
    for (i, &id) in graph.outputs().iter().enumerate() {
        let src = match producers.get(&id) {
            Some(pos) => format!("n{pos}"),
            None => match graph.inputs().iter().position(|&x| x == id) {
                Some(k) => format!("in{k}"),
                None => continue,
            },
        };
        emit(w, &src, &format!("out{i}"), graph.name_of(id))?;
    }

    writeln!(w, r#"</graph>"#)?;
    writeln!(w, r#"</graphml>"#)?;
    Ok(())
}

fn terminal<W: Write>(w: &mut W, id: &str, name: &str, kind: &str) -> std::io::Result<()> {
    writeln!(w, r#"<node id="{id}">"#)?;
    writeln!(w, r#"  <data key="d0">{}</data>"#, xml_escape(name))?;
    writeln!(w, r#"  <data key="d1">{kind}</data>"#)?;
    writeln!(w, r#"</node>"#)
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
