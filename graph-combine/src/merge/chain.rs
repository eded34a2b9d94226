//! Left fold of pairwise merges over N graphs.

use crate::{
    errors::{MergeError, Result},
    merge::{
        canonical::{CanonicalizeOptions, canonicalize_partial, canonicalize_with},
        collision::{ensure_disjoint, has_duplicates},
        namespace::namespace,
        prune::prune_unused_inputs,
        splice::splice,
    },
    model::{correspondence::Correspondence, graph::Graph},
};
use tracing::info;

/// Knobs for [`merge_chain`].
#[derive(Debug, Clone)]
pub struct ChainOptions {
    /// Joins a prefix to the original identifier.
    pub separator: String,
    /// Strip the first graph's prefix from the single surviving input.
    pub strip_head_prefix: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            separator: "_".to_string(),
            strip_head_prefix: true,
        }
    }
}

/// Check counts and prefix distinctness before any graph is touched.
pub fn validate_chain_arguments(
    graph_count: usize,
    prefixes: Option<&[String]>,
    correspondences: &[Vec<Correspondence>],
) -> Result<()> {
    if graph_count < 2 {
        return Err(MergeError::Argument(format!(
            "at least two graphs are required, got {graph_count}"
        )));
    }
    if correspondences.len() != graph_count - 1 {
        return Err(MergeError::Argument(format!(
            "{} graphs need {} correspondence lists, got {}",
            graph_count,
            graph_count - 1,
            correspondences.len()
        )));
    }
    if let Some(prefixes) = prefixes {
        if prefixes.len() != graph_count {
            return Err(MergeError::Argument(format!(
                "{} graphs need {} prefixes, got {}",
                graph_count,
                graph_count,
                prefixes.len()
            )));
        }
        if has_duplicates(prefixes.iter()) {
            return Err(MergeError::Argument(format!(
                "prefixes must be distinct: {}",
                prefixes.join(", ")
            )));
        }
    }
    Ok(())
}

/// Merge `graphs` left to right: `merge(merge(G1, G2), G3)...`.
///
/// Step `i` namespaces `graphs[i + 1]` with `prefixes[i + 1]`, rejects
/// colliding identifiers, splices with `correspondences[i]`, prunes unused
/// inputs and sweeps the arena. `on_step(i, &graph)` sees each accumulated
/// result (used to persist intermediates); an error from it aborts the chain.
/// The final graph gets the full canonicalization pass.
pub fn merge_chain<F>(
    graphs: Vec<Graph>,
    prefixes: Option<&[String]>,
    correspondences: &[Vec<Correspondence>],
    opts: &ChainOptions,
    mut on_step: F,
) -> Result<Graph>
where
    F: FnMut(usize, &Graph) -> Result<()>,
{
    validate_chain_arguments(graphs.len(), prefixes, correspondences)?;

    let prefix_of = |i: usize| prefixes.map(|p| p[i].as_str()).unwrap_or("");
    let mut graphs = graphs.into_iter();
    let Some(first) = graphs.next() else {
        return Err(MergeError::Argument("no graphs to merge".into()));
    };
    let mut acc = namespace(first, prefix_of(0), &opts.separator);

    for (step, (right, pairs)) in graphs.zip(correspondences).enumerate() {
        let right = namespace(right, prefix_of(step + 1), &opts.separator);
        ensure_disjoint(&acc, &right)?;

        let spliced = splice(acc, right, pairs)?;
        acc = canonicalize_partial(prune_unused_inputs(spliced));
        info!(
            step,
            correspondences = pairs.len(),
            nodes = acc.nodes().len(),
            inputs = acc.inputs().len(),
            outputs = acc.outputs().len(),
            "merge step done"
        );
        on_step(step, &acc)?;
    }

    let head_prefix = match prefix_of(0) {
        p if opts.strip_head_prefix && !p.is_empty() => Some(format!("{p}{}", opts.separator)),
        _ => None,
    };
    let merged = canonicalize_with(acc, &CanonicalizeOptions { head_prefix })?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g1() -> Graph {
        Graph::builder("g1")
            .node("A", "Constant", &[], &["A_out"])
            .output("A_out")
            .build()
            .unwrap()
    }

    fn g2() -> Graph {
        Graph::builder("g2")
            .input("B_in")
            .node("B", "Relu", &["B_in"], &["B_out"])
            .output("B_out")
            .build()
            .unwrap()
    }

    fn g3() -> Graph {
        Graph::builder("g3")
            .input("C_in")
            .node("C", "Sigmoid", &["C_in"], &["C_out"])
            .output("C_out")
            .build()
            .unwrap()
    }

    fn prefixes(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    fn no_persist(_: usize, _: &Graph) -> Result<()> {
        Ok(())
    }

    #[test]
    fn two_graph_scenario() {
        let p = prefixes(&["g1", "g2"]);
        let merged = merge_chain(
            vec![g1(), g2()],
            Some(&p),
            &[vec![Correspondence::new("g1_A_out", "g2_B_in")]],
            &ChainOptions::default(),
            no_persist,
        )
        .unwrap();

        assert_eq!(merged.node_names(), vec!["g1_A", "g2_B"]);
        assert!(merged.inputs().is_empty());
        assert_eq!(merged.output_names(), vec!["g2_B_out"]);
        let b = &merged.nodes()[1];
        assert_eq!(b.inputs, merged.nodes()[0].outputs);
        assert_eq!(merged.dependency_graph().edge_count(), 1);
    }

    #[test]
    fn unknown_destination_fails() {
        let p = prefixes(&["g1", "g2"]);
        let err = merge_chain(
            vec![g1(), g2()],
            Some(&p),
            &[vec![Correspondence::new("g1_A_out", "g2_Z_in")]],
            &ChainOptions::default(),
            no_persist,
        )
        .unwrap_err();
        assert!(err.to_string().contains("g2_Z_in"), "{err}");
    }

    #[test]
    fn same_node_name_without_prefixes_collides() {
        let conv = |name: &str, input: &str, output: &str| {
            Graph::builder(name)
                .input(input)
                .node("conv1", "Conv", &[input], &[output])
                .output(output)
                .build()
                .unwrap()
        };
        let err = merge_chain(
            vec![conv("l", "x", "y"), conv("r", "p", "q")],
            None,
            &[vec![]],
            &ChainOptions::default(),
            no_persist,
        )
        .unwrap_err();
        match err {
            MergeError::Collision(c) => {
                assert_eq!(c.len(), 1);
                assert_eq!(c.get("conv1"), Some(&2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pass_through_input_merges_without_collision() {
        let head = Graph::builder("g1")
            .input("x")
            .node("A", "Relu", &["x"], &["A_out"])
            .output("A_out")
            .output("x")
            .build()
            .unwrap();
        let p = prefixes(&["g1", "g2"]);
        let merged = merge_chain(
            vec![head, g2()],
            Some(&p),
            &[vec![Correspondence::new("g1_A_out", "g2_B_in")]],
            &ChainOptions::default(),
            no_persist,
        )
        .unwrap();
        assert_eq!(merged.node_names(), vec!["g1_A", "g2_B"]);
        // One value backs both the input and the pass-through output, so the
        // head rename shows up on both lists.
        assert_eq!(merged.input_names(), vec!["x"]);
        assert_eq!(merged.output_names(), vec!["x", "g2_B_out"]);
    }

    #[test]
    fn zero_correspondences_keeps_everything() {
        let p = prefixes(&["a", "b"]);
        let merged = merge_chain(
            vec![g2(), g3()],
            Some(&p),
            &[vec![]],
            &ChainOptions::default(),
            no_persist,
        )
        .unwrap();
        assert_eq!(merged.nodes().len(), 2);
        assert_eq!(merged.outputs().len(), 2);
        assert_eq!(merged.inputs().len(), 2);
    }

    #[test]
    fn argument_errors_come_first() {
        let opts = ChainOptions::default();
        let one = merge_chain(vec![g1()], None, &[], &opts, no_persist);
        assert!(matches!(one, Err(MergeError::Argument(_))));

        let short = merge_chain(vec![g1(), g2()], None, &[], &opts, no_persist);
        assert!(matches!(short, Err(MergeError::Argument(_))));

        let p = prefixes(&["g1"]);
        let few = merge_chain(vec![g1(), g2()], Some(&p), &[vec![]], &opts, no_persist);
        assert!(matches!(few, Err(MergeError::Argument(_))));

        let p = prefixes(&["same", "same"]);
        let dup = merge_chain(vec![g1(), g2()], Some(&p), &[vec![]], &opts, no_persist);
        assert!(matches!(dup, Err(MergeError::Argument(_))));
    }

    #[test]
    fn three_graphs_equal_two_successive_merges() {
        let p = prefixes(&["g1", "g2", "g3"]);
        let first = vec![Correspondence::new("g1_A_out", "g2_B_in")];
        let second = vec![Correspondence::new("g2_B_out", "g3_C_in")];
        let opts = ChainOptions::default();

        let chained = merge_chain(
            vec![g1(), g2(), g3()],
            Some(&p),
            &[first.clone(), second.clone()],
            &opts,
            no_persist,
        )
        .unwrap();

        let p12 = prefixes(&["g1", "g2"]);
        let step_one =
            merge_chain(vec![g1(), g2()], Some(&p12), &[first], &opts, no_persist).unwrap();
        let p3 = prefixes(&["", "g3"]);
        let step_two =
            merge_chain(vec![step_one, g3()], Some(&p3), &[second], &opts, no_persist).unwrap();

        assert_eq!(chained.node_names(), step_two.node_names());
        assert_eq!(chained.input_names(), step_two.input_names());
        assert_eq!(chained.output_names(), vec!["g3_C_out"]);
        assert_eq!(chained.output_names(), step_two.output_names());
    }

    #[test]
    fn spliced_output_is_dropped_even_if_a_later_step_wants_it() {
        // g1_A_out feeds g2 and is removed from the outputs at step 0, so it is
        // no longer an external output when step 1 runs; it stays usable as an
        // internal edge source.
        let p = prefixes(&["g1", "g2", "g3"]);
        let merged = merge_chain(
            vec![g1(), g2(), g3()],
            Some(&p),
            &[
                vec![Correspondence::new("g1_A_out", "g2_B_in")],
                vec![Correspondence::new("g1_A_out", "g3_C_in")],
            ],
            &ChainOptions::default(),
            no_persist,
        )
        .unwrap();
        assert_eq!(merged.output_names(), vec!["g2_B_out", "g3_C_out"]);
        assert!(!merged.output_names().contains(&"g1_A_out"));
        let c = merged.nodes().iter().find(|n| n.name == "g3_C").unwrap();
        assert_eq!(merged.name_of(c.inputs[0]), "g1_A_out");
    }

    #[test]
    fn head_input_loses_its_prefix() {
        let p = prefixes(&["g2", "g3"]);
        let merged = merge_chain(
            vec![g2(), g3()],
            Some(&p),
            &[vec![Correspondence::new("g2_B_out", "g3_C_in")]],
            &ChainOptions::default(),
            no_persist,
        )
        .unwrap();
        assert_eq!(merged.input_names(), vec!["B_in"]);
        assert_eq!(merged.name_of(merged.nodes()[0].inputs[0]), "B_in");

        let keep = ChainOptions {
            strip_head_prefix: false,
            ..ChainOptions::default()
        };
        let merged = merge_chain(
            vec![g2(), g3()],
            Some(&p),
            &[vec![Correspondence::new("g2_B_out", "g3_C_in")]],
            &keep,
            no_persist,
        )
        .unwrap();
        assert_eq!(merged.input_names(), vec!["g2_B_in"]);
    }

    #[test]
    fn on_step_sees_every_intermediate_and_can_abort() {
        let p = prefixes(&["g1", "g2", "g3"]);
        let corr = [
            vec![Correspondence::new("g1_A_out", "g2_B_in")],
            vec![Correspondence::new("g2_B_out", "g3_C_in")],
        ];
        let mut seen = Vec::new();
        merge_chain(
            vec![g1(), g2(), g3()],
            Some(&p),
            &corr,
            &ChainOptions::default(),
            |step, g: &Graph| {
                seen.push((step, g.nodes().len()));
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(seen, vec![(0, 2), (1, 3)]);

        let err = merge_chain(
            vec![g1(), g2(), g3()],
            Some(&p),
            &corr,
            &ChainOptions::default(),
            |_, _: &Graph| Err(MergeError::Argument("stop".into())),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::Argument(ref m) if m == "stop"));
    }
}
