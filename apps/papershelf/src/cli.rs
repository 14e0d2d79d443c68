use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use papershelf_core::PaperId;

#[derive(Parser, Debug)]
#[command(name = "papershelf", version, about = "Personal paper library", long_about = None)]
pub struct Cli {
    /// Library root holding the documents, snapshot and venue table
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Log index changes and file activity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a paper
    Add {
        #[command(flatten)]
        form: PaperForm,
    },
    /// Change fields of a stored paper; fields not given keep their values
    Edit {
        id: PaperId,
        #[command(flatten)]
        form: PaperForm,
    },
    /// Remove papers
    Remove {
        #[arg(required = true)]
        ids: Vec<PaperId>,
    },
    /// Find papers matching every given field
    Find {
        #[command(flatten)]
        form: PaperForm,
        /// Years on either side of --year that also match
        #[arg(long, value_name = "YEARS")]
        window: Option<u32>,
        /// Match whole labels only
        #[arg(long)]
        exact: bool,
    },
    /// List every paper
    List,
    /// Papers not read yet
    Unread,
    /// Papers with code on GitHub
    Github,
    /// Papers waiting for their details to be completed
    Revise,
    /// Show one paper in full
    Show {
        id: PaperId,
        /// Print the paper as BibTeX
        #[arg(long)]
        bibtex: bool,
    },
    /// Add papers for document files, flagged for revision
    Import {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Compare the library with the documents under the root
    Rescan {
        /// Also import documents no paper refers to
        #[arg(long)]
        import: bool,
    },
    /// List venues and their aliases
    Venues,
    /// Print the fields extracted from a BibTeX file
    ParseBib {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Open a paper's document in the default viewer
    Open { id: PaperId },
    /// Check that the indexes agree with the papers
    Check,
    /// Write the current settings to papershelf.toml in the library root
    Init {
        /// Replace an existing papershelf.toml
        #[arg(long)]
        force: bool,
    },
}

/// Paper fields as typed on the command line
#[derive(Args, Debug, Default, Clone)]
pub struct PaperForm {
    /// Document path, relative to the root or absolute inside it
    #[arg(long)]
    pub path: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// Authors, separated by ";" or " and "
    #[arg(long)]
    pub authors: Option<String>,

    #[arg(long)]
    pub venue: Option<String>,

    #[arg(long)]
    pub year: Option<String>,

    /// Labels separated by ";"
    #[arg(long)]
    pub tags: Option<String>,

    /// Labels separated by ";"
    #[arg(long)]
    pub projects: Option<String>,

    /// Labels separated by ";"
    #[arg(long)]
    pub datasets: Option<String>,

    /// 1 to 5, 0 for none
    #[arg(long)]
    pub rating: Option<String>,

    #[arg(long)]
    pub comment: Option<String>,

    #[arg(long)]
    pub read: Option<bool>,

    #[arg(long)]
    pub github: Option<bool>,

    /// BibTeX file to take title, authors, venue and year from
    #[arg(long, value_name = "FILE")]
    pub bib: Option<PathBuf>,
}
