//! Command-line front end for the notes engine.
//!
//! # Responsibility
//! - Open the database named on the command line.
//! - Run each command inside one SQLite transaction and print JSON.

use atomnote_core::{
    init_logging_from_env, open_db, AdjacencyStyle, Filter, GraphRepository, LogActivityLog,
    NoFilter, Note, NotesService, PropertyQueryEngine, RangeFilter, SearchQuery,
    SqliteFullTextIndex, SqliteGraphRepository,
};
use clap::{Parser, Subcommand};
use log::error;
use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "atomnote", version, about = "Outline notes over an atom graph")]
struct Cli {
    /// SQLite database file, created and migrated on first use
    db_path: PathBuf,
    /// Levels of children to expand or reconcile
    #[arg(long, visible_alias = "height", default_value_t = 1, global = true)]
    depth: i32,
    /// Neighbour relation walked as children
    #[arg(
        long,
        value_parser = parse_style,
        default_value_t = AdjacencyStyle::default(),
        global = true
    )]
    style: AdjacencyStyle,
    /// Visibility window: min,default,max sharability then min,default,max weight
    #[arg(long, value_name = "S,S,S,W,W,W", value_parser = parse_filter, global = true)]
    filter: Option<RangeFilter>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an unreferenced atom
    Create {
        value: Option<String>,
    },
    /// Materialize a view rooted at an atom
    View {
        id: String,
    },
    /// Apply a JSON note tree onto an atom
    Update {
        id: String,
        /// JSON note; stdin when omitted
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Full-text search over atom values
    Search {
        text: String,
    },
    /// Property query, e.g. value="rust" and alias="book"
    Query {
        query: String,
    },
    /// List atoms no list references
    Roots,
    /// Rebuild the full-text index
    Reindex,
}

fn parse_style(raw: &str) -> Result<AdjacencyStyle, String> {
    AdjacencyStyle::from_str(raw).map_err(|err| err.to_string())
}

fn parse_filter(raw: &str) -> Result<RangeFilter, String> {
    let bounds = raw
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.to_string())?;
    let &[s_min, s_default, s_max, w_min, w_default, w_max] = bounds.as_slice() else {
        return Err("expected six comma-separated numbers".to_string());
    };
    RangeFilter::try_new((s_min, s_default, s_max), (w_min, w_default, w_max))
        .map_err(|err| err.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging_from_env() {
        eprintln!("logging disabled: {err}");
    }

    let result = match cli.filter.as_ref() {
        Some(filter) => run(&cli, filter),
        None => run(&cli, &NoFilter),
    };
    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run<F: Filter>(cli: &Cli, filter: &F) -> CliResult<String> {
    let conn = open_db(&cli.db_path)?;
    let tx = conn.unchecked_transaction()?;

    let output = {
        let service = NotesService::new(
            SqliteGraphRepository::try_new(&tx)?,
            SqliteFullTextIndex::new(&tx),
        );
        let (depth, style) = (cli.depth, cli.style);
        let mut activity = LogActivityLog;

        match &cli.command {
            Command::Create { value } => {
                let atom = service.graph().create_atom(None, &filter.defaults())?;
                if let Some(value) = value {
                    let mut desired = Note::with_value(value.as_str());
                    service.update(&atom.id, &mut desired, 0, filter, style, None)?;
                }
                serde_json::to_string_pretty(&Note::with_id(atom.id))?
            }
            Command::View { id } => {
                let note = service.view(id, depth, filter, style, Some(&mut activity))?;
                serde_json::to_string_pretty(&note)?
            }
            Command::Update { id, file } => {
                let mut desired: Note = serde_json::from_str(&read_note_input(file.as_ref())?)?;
                let stats =
                    service.update(id, &mut desired, depth, filter, style, Some(&mut activity))?;
                serde_json::to_string_pretty(&serde_json::json!({
                    "stats": stats,
                    "note": desired,
                }))?
            }
            Command::Search { text } => {
                let note = service.search(&SearchQuery::new(text.as_str()), depth, filter, style)?;
                serde_json::to_string_pretty(&note)?
            }
            Command::Query { query } => {
                let engine = PropertyQueryEngine::new(service.graph());
                let note = service.run_query(&engine, query, depth, filter, style)?;
                serde_json::to_string_pretty(&note)?
            }
            Command::Roots => serde_json::to_string_pretty(&service.find_roots(filter, style)?)?,
            Command::Reindex => serde_json::to_string_pretty(&serde_json::json!({
                "indexed": service.reindex()?,
            }))?,
        }
    };

    tx.commit()?;
    Ok(output)
}

fn read_note_input(file: Option<&PathBuf>) -> CliResult<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use atomnote_core::{AdjacencyStyle, Atom, Filter};
    use clap::Parser;

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "atomnote",
            "notes.db",
            "view",
            "root",
            "--height",
            "3",
            "--style",
            "undirected",
        ])
        .unwrap();
        assert_eq!(cli.depth, 3);
        assert_eq!(cli.style, AdjacencyStyle::Undirected);
        assert!(matches!(cli.command, Command::View { ref id } if id == "root"));
    }

    #[test]
    fn defaults_to_forward_depth_one_without_filter() {
        let cli = Cli::try_parse_from(["atomnote", "notes.db", "roots"]).unwrap();
        assert_eq!(cli.depth, 1);
        assert_eq!(cli.style, AdjacencyStyle::Forward);
        assert!(cli.filter.is_none());
    }

    #[test]
    fn filter_option_builds_a_range_filter() {
        let cli = Cli::try_parse_from([
            "atomnote",
            "notes.db",
            "--filter",
            "0.5,0.5,1,0,0.5,1",
            "search",
            "harbor",
        ])
        .unwrap();
        let filter = cli.filter.unwrap();
        let mut atom = Atom::new("a", 0);
        atom.sharability = Some(0.25);
        assert!(!filter.is_visible(&atom));
    }

    #[test]
    fn rejects_bad_style_and_filter_values() {
        assert!(Cli::try_parse_from(["atomnote", "db", "--style", "sideways", "roots"]).is_err());
        assert!(Cli::try_parse_from(["atomnote", "db", "--filter", "1,2,3", "roots"]).is_err());
        assert!(
            Cli::try_parse_from(["atomnote", "db", "--filter", "0.9,0.5,1,0,0.5,1", "roots"])
                .is_err()
        );
    }
}
