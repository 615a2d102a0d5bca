use std::collections::VecDeque;
use std::error::Error;
use std::fs;

use tensor_ir::{Graph, GraphOptions};

mod dim_size;
mod graph_file;

use dim_size::DimSize;
use graph_file::GraphFile;

struct Args {
    /// Graph description file to load.
    graph: String,

    /// Enable verbose logging for graph inference.
    verbose: bool,

    /// Sizes for parameter dimensions.
    sizes: Vec<DimSize>,

    /// Constant values for parameters, applied after the graph is built.
    constants: Vec<(String, Vec<i64>)>,
}

/// Parse a constant specifier in the form `name=1,2,3`.
fn parse_constant(spec: &str) -> Result<(String, Vec<i64>), String> {
    let (name, values) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected <name>=<values> in \"{}\"", spec))?;
    let values = values
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse())
        .collect::<Result<Vec<i64>, _>>()
        .map_err(|_| format!("invalid values in \"{}\". Must be integers.", spec))?;
    Ok((name.to_string(), values))
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut values = VecDeque::new();
    let mut verbose = false;
    let mut sizes = Vec::new();
    let mut constants = Vec::new();

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => values.push_back(val.string()?),
            Short('v') | Long("verbose") => verbose = true,
            Short('s') | Long("size") => {
                let size = parser.value()?.string()?;
                let dim_size = DimSize::parse(&size).map_err(|e| lexopt::Error::ParsingFailed {
                    value: size,
                    error: Box::new(e),
                })?;
                sizes.push(dim_size);
            }
            Short('c') | Long("constant") => {
                let spec = parser.value()?.string()?;
                let constant = parse_constant(&spec).map_err(|e| lexopt::Error::ParsingFailed {
                    value: spec,
                    error: e.into(),
                })?;
                constants.push(constant);
            }
            Short('h') | Long("help") => {
                println!(
                    "Infer the types and shapes of values in a tensor-ir graph.

Usage: {bin_name} [OPTIONS] <graph>

Options:

  -c, --constant <name>=<values>

                 Replace a parameter with a constant, given as a comma-separated
                 list of integers, then re-infer the graph.

  -s, --size <spec>

                 Specify the size of a parameter dimension in the form
                 `<axis>=<dim>` or `<input_name>.<axis>=<dim>`, where `<dim>`
                 is a size (`8`), a range (`1..16`, `4..`) or `?`.

  -v, --verbose  Print each operator's inputs and outputs as it is inferred
  -h, --help     Print help
",
                    bin_name = parser.bin_name().unwrap_or("tir")
                );
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let graph = values.pop_front().ok_or("missing `<graph>` arg")?;
    DimSize::sort_dedup(&mut sizes);

    Ok(Args {
        graph,
        verbose,
        sizes,
        constants,
    })
}

/// Print the inferred type, shape and value of each node.
fn print_graph(graph: &Graph) {
    for (_, node) in graph.iter() {
        println!("{}: {}", node.name(), node.value_info());
    }
}

/// Tool for inferring the shapes of values in a graph described by a JSON
/// file.
///
/// ```text
/// cargo run -p tensor-ir-cli -- -s image.0=1 graph.json
/// ```
///
/// Inference can also be traced by setting the `TIR_VERBOSE` env var.
fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;
    let json = fs::read_to_string(&args.graph)?;
    let file = GraphFile::parse(&json)?;

    let mut options = GraphOptions::default();
    options.verbose |= args.verbose;

    let mut graph = file.build(&args.sizes, options)?;
    if !args.constants.is_empty() {
        for (name, values) in args.constants {
            let id = graph.node_id(&name)?;
            graph.set_constant(id, values)?;
        }
        graph.reinfer()?;
    }

    println!(
        "Graph stats: {} nodes, {} operators, {} labels",
        graph.len(),
        graph.op_count(),
        graph.labels().allocated()
    );
    print_graph(&graph);

    Ok(())
}
