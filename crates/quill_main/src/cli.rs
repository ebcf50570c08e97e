use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"), about = "Grounded research and writing over local documents")]
pub struct Cli {
    /// Directory of documents to index.
    ///
    /// Overrides `QUILL_DATA_DIR` and the built-in default.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run a task through plan, research, write and verify.
    ///
    /// Without a task, the example tasks are listed and one is read from
    /// standard input.
    Run {
        task: Option<String>,

        /// Produce an executive summary, a detailed report and action items.
        #[arg(long, default_value_t = false)]
        multi_output: bool,

        /// How many rewrites the verifier may request.
        #[arg(long)]
        max_revisions: Option<usize>,
    },

    /// Index the data directory and print what was loaded.
    Index,

    /// Print the chunks closest to a query.
    Search {
        query: String,

        /// Number of results.
        #[arg(long, short)]
        k: Option<usize>,
    },

    /// Run an evaluation suite and save the results.
    Eval {
        /// YAML suite to run instead of the built-in one.
        #[arg(long)]
        suite: Option<PathBuf>,
    },

    /// Summarize past runs.
    Logs,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let fixture = ["quill", "run", "Summarize Q4", "--multi-output", "--max-revisions", "2"];

        let actual = Cli::parse_from(fixture).command;

        let expected = Command::Run {
            task: Some("Summarize Q4".to_string()),
            multi_output: true,
            max_revisions: Some(2),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_global_data_dir() {
        let fixture = ["quill", "search", "velocity", "-k", "3", "--data-dir", "docs"];

        let actual = Cli::parse_from(fixture);

        assert_eq!(actual.data_dir, Some(PathBuf::from("docs")));
        assert_eq!(actual.command, Command::Search { query: "velocity".to_string(), k: Some(3) });
    }
}
