//! gedgraph CLI: inspect, query, merge and convert GEDCOM files

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use comfy_table::{ContentArrangement, Table};
use gedgraph::export::{self, ExportFormat};
use gedgraph::merge::{merge_gedcoms, MergeStrategy};
use gedgraph::{Graph, ParseConfig, Parser, XrefId};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "gedgraph", version, about = "GEDCOM graph builder and merge tool")]
struct Cli {
    /// Parser configuration file (YAML or JSON)
    #[arg(long, global = true, env = "GEDGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Output format for reports
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a file: header, collections, side indexes
    Info { file: PathBuf },
    /// Print one record
    Show { file: PathBuf, xref: String },
    /// Read a value by path, e.g. `BIRT.DATE` or `NAME.1`
    Get {
        file: PathBuf,
        xref: String,
        path: String,
    },
    /// Merge SOURCE into TARGET
    Merge {
        target: PathBuf,
        source: PathBuf,

        /// `id` or a tag such as `NAME`
        #[arg(long, default_value = "id")]
        strategy: String,

        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Rewrite a file as GEDCOM or JSON
    Convert {
        file: PathBuf,

        /// `ged` or `json`; guessed from the output extension when omitted
        #[arg(long)]
        to: Option<String>,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check reference bookkeeping
    Validate { file: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ParseConfig::default(),
    };
    let parser = Parser::with_config(config);

    match cli.command {
        Commands::Info { file } => run_info(&read_graph(&parser, &file)?, &cli.format),
        Commands::Show { file, xref } => run_show(&read_graph(&parser, &file)?, &xref, &cli.format),
        Commands::Get { file, xref, path } => {
            let graph = read_graph(&parser, &file)?;
            let node = lookup(&graph, &xref)?;
            match graph.try_get(node, &path)?.and_then(|id| graph.node(id)) {
                Some(found) => println!("{}", found.value().unwrap_or("")),
                None => bail!("{} has no {}", XrefId::new(xref.as_str()), path),
            }
            Ok(())
        }
        Commands::Merge {
            target,
            source,
            strategy,
            output,
        } => {
            let target = read_graph(&parser, &target)?;
            let source = read_graph(&parser, &source)?;
            let strategy: MergeStrategy = strategy.parse()?;
            let merged = merge_gedcoms(&target, &source, &strategy);
            info!(
                individuals = merged.individual_count(),
                families = merged.family_count(),
                "merged"
            );
            let format = output
                .as_deref()
                .and_then(ExportFormat::from_path)
                .unwrap_or(ExportFormat::Gedcom);
            write_output(&merged, format, output.as_deref())
        }
        Commands::Convert { file, to, output } => {
            let graph = read_graph(&parser, &file)?;
            let format = match to {
                Some(to) => to.parse()?,
                None => output
                    .as_deref()
                    .and_then(ExportFormat::from_path)
                    .unwrap_or(ExportFormat::Json),
            };
            write_output(&graph, format, output.as_deref())
        }
        Commands::Validate { file } => {
            let graph = read_graph(&parser, &file)?;
            graph.validate()?;
            println!("ok: {} records", graph.xrefs().count());
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<ParseConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
        _ => serde_json::from_str(&text)?,
    };
    Ok(config)
}

fn read_graph(parser: &Parser, path: &Path) -> Result<Graph> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let doc = parser
        .parse(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(doc.graph)
}

fn lookup(graph: &Graph, xref: &str) -> Result<gedgraph::NodeId> {
    let id = XrefId::new(xref);
    graph
        .record(id.as_str())
        .with_context(|| format!("no record {}", id))
}

fn write_output(graph: &Graph, format: ExportFormat, output: Option<&Path>) -> Result<()> {
    let text = export::render(graph, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "written");
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn run_info(graph: &Graph, format: &OutputFormat) -> Result<()> {
    let meta = graph.meta();
    match format {
        OutputFormat::Json => {
            let collections: serde_json::Map<String, serde_json::Value> = graph
                .collections()
                .map(|(tag, c)| (tag.to_string(), c.len().into()))
                .collect();
            let summary = serde_json::json!({
                "meta": meta,
                "collections": collections,
                "ignored": graph.ignored().len(),
                "members": graph.members().keys().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => {
            println!("Version: {}", meta.version.as_deref().unwrap_or("-"));
            println!("Charset: {}", meta.charset.as_deref().unwrap_or("-"));
            println!("Purged:  {}", meta.purged);

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Collection", "Records"]);
            for (tag, collection) in graph.collections() {
                table.add_row(vec![tag.to_string(), collection.len().to_string()]);
            }
            table.add_row(vec!["(ignored)".to_string(), graph.ignored().len().to_string()]);
            println!("{}", table);

            for (name, group) in graph.members() {
                let ids: Vec<String> = group.members.iter().map(ToString::to_string).collect();
                println!("Group {}: {}", name, ids.join(", "));
            }
        }
    }
    Ok(())
}

fn run_show(graph: &Graph, xref: &str, format: &OutputFormat) -> Result<()> {
    let node = lookup(graph, xref)?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&export::node_json(graph, node))?);
        }
        OutputFormat::Table => print!("{}", export::node_to_gedcom(graph, node)),
    }
    Ok(())
}
