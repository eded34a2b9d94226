use std::{ffi::OsString, path::PathBuf};

use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use colored::Colorize;
use graph_combine::{
    CombineRequest, combine_networks,
    codec::JsonGraphCodec,
    config,
    model::Correspondence,
    simplify::{IdentityElimination, NoopSimplifier, Simplifier},
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Combine several inference graphs into one by wiring outputs into inputs.
#[derive(Debug, Parser)]
#[command(name = "net-combine", version, about)]
struct Cli {
    /// Graph files to combine, in chain order (at least two).
    #[arg(long, num_args = 1.., required = true)]
    input_graph_paths: Vec<PathBuf>,

    /// `src dst [src dst ...]` for one merge step. Repeat once per step.
    #[arg(long, num_args = 0.., action = ArgAction::Append)]
    srcop_destop: Vec<String>,

    /// `--srcop-destop` values regrouped per occurrence.
    #[arg(skip)]
    correspondence_groups: Vec<Vec<String>>,

    /// One prefix per input graph.
    #[arg(long, num_args = 1..)]
    prefixes: Option<Vec<String>>,

    #[arg(long, default_value = "combined.json")]
    output_graph_path: PathBuf,

    /// Save the accumulated graph after every merge step.
    #[arg(long)]
    output_intermediate: bool,

    /// Only show error logs.
    #[arg(long)]
    non_verbose: bool,

    #[arg(long)]
    disable_simplify: bool,

    /// Also export the combined graph as GraphML.
    #[arg(long)]
    graphml: Option<PathBuf>,

    /// Write `<output-stem>.summary.json` next to the output.
    #[arg(long)]
    summary: bool,
}

/// Parse arguments, keeping each `--srcop-destop` occurrence as its own group.
fn parse_cli<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    let mut cli = Cli::from_arg_matches(&matches)?;
    cli.correspondence_groups = matches
        .get_occurrences::<String>("srcop_destop")
        .map(|groups| groups.map(|group| group.cloned().collect()).collect())
        .unwrap_or_default();
    Ok(cli)
}

/// `--help` and `--version` succeed; every other parse failure is exit 1.
fn parse_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { 1 } else { 0 }
}

fn main() {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(parse_exit_code(&err));
        }
    };

    // .env is optional here.
    dotenvy::dotenv().ok();

    let default_level = if cli.non_verbose { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(cli) {
        eprintln!("{} {err:#}", "ERROR:".red().bold());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = config::load_from_env_or_default()?;
    if cli.output_intermediate {
        cfg.persist.output_intermediate = true;
    }
    if cli.disable_simplify {
        cfg.simplify.enabled = false;
    }
    if cli.summary {
        cfg.persist.write_summary = true;
    }

    debug!(
        values = cli.srcop_destop.len(),
        groups = cli.correspondence_groups.len(),
        "parsed correspondence lists"
    );
    let correspondences = cli
        .correspondence_groups
        .iter()
        .map(|flat| Correspondence::pairs_from_flat(flat.as_slice()))
        .collect::<Result<Vec<_>, _>>()?;

    let request = CombineRequest {
        input_paths: cli.input_graph_paths,
        correspondences,
        prefixes: cli.prefixes,
        output_path: cli.output_graph_path,
        graphml_path: cli.graphml,
    };

    let simplifier: &dyn Simplifier = if cfg.simplify.enabled {
        &IdentityElimination
    } else {
        &NoopSimplifier
    };

    let summary = combine_networks(&request, &cfg, &JsonGraphCodec, simplifier)?;

    info!(
        nodes = summary.nodes,
        inputs = ?summary.inputs,
        outputs = ?summary.outputs,
        "{}",
        "Finish!".green()
    );
    info!(
        "summary: {}",
        serde_json::to_string(&summary).unwrap_or_default()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_combine::MergeError;

    #[test]
    fn parses_repeated_correspondence_groups() {
        let cli = parse_cli([
            "net-combine",
            "--input-graph-paths",
            "a.json",
            "b.json",
            "c.json",
            "--srcop-destop",
            "a_out",
            "b_in",
            "--srcop-destop",
            "b_out",
            "c_in",
            "b_aux",
            "c_aux",
            "--prefixes",
            "a",
            "b",
            "c",
        ])
        .unwrap();
        assert_eq!(cli.input_graph_paths.len(), 3);
        assert_eq!(
            cli.correspondence_groups,
            vec![
                vec!["a_out".to_string(), "b_in".to_string()],
                vec![
                    "b_out".to_string(),
                    "c_in".to_string(),
                    "b_aux".to_string(),
                    "c_aux".to_string()
                ],
            ]
        );
        assert_eq!(cli.output_graph_path, PathBuf::from("combined.json"));
        assert!(!cli.non_verbose);
    }

    #[test]
    fn single_input_is_an_argument_error() {
        let cli = parse_cli([
            "net-combine",
            "--input-graph-paths",
            "a.json",
            "--output-graph-path",
            "unused.json",
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(
            matches!(err.downcast_ref::<MergeError>(), Some(MergeError::Argument(_))),
            "{err:#}"
        );
    }

    #[test]
    fn usage_errors_exit_with_one_and_help_with_zero() {
        let missing = parse_cli(["net-combine"]).unwrap_err();
        assert_eq!(parse_exit_code(&missing), 1);

        let help = parse_cli(["net-combine", "--help"]).unwrap_err();
        assert_eq!(parse_exit_code(&help), 0);
    }
}
