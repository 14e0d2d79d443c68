//! Command implementations over a loaded library session

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use papershelf_bibtex::extract_citation;
use papershelf_core::config::LIBRARY_CONFIG_FILE;
use papershelf_core::{
    import_files, load_snapshot, open_document, remove_documents, rescan, save_snapshot,
    venue::load_alias_file, Library, Paper, PaperId, PaperState, PathPolicy, RevisionOutcome,
    ShelfConfig, ShelfError, Submission,
};

use crate::cli::{Command, PaperForm};

/// Errors reported to the user
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Shelf(#[from] ShelfError),

    #[error("No paper with id {0}")]
    NoSuchPaper(PaperId),

    #[error("Paper is incomplete: {}", describe_state(.0))]
    Incomplete(PaperState),

    #[error("Duplicate of paper {0}")]
    Duplicate(PaperId),

    #[error("Paper {0} has no document")]
    NoDocument(PaperId),

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn describe_state(state: &PaperState) -> &'static str {
    match state {
        PaperState::Ok => "nothing missing",
        PaperState::MissingPath => "no existing document path",
        PaperState::MissingBibField => "title, authors and year are required",
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// A library loaded from disk together with its settings
pub struct Session {
    pub config: ShelfConfig,
    pub library: Library,
    policy: PathPolicy,
    removed_files: Vec<PathBuf>,
}

impl Session {
    /// Load the config, the snapshot and the venue alias table for a library root.
    pub fn open(root: Option<&Path>) -> Result<Self> {
        let config = ShelfConfig::discover(root).map_err(ShelfError::from)?;
        let mut library = load_snapshot(&config.snapshot_path()).map_err(ShelfError::from)?;

        let venue_path = config.venue_path();
        if venue_path.is_file() {
            let pairs = load_alias_file(&venue_path).map_err(ShelfError::from)?;
            debug!(count = pairs.len(), "loaded venue aliases");
            library.register_venue_aliases(pairs);
        } else {
            debug!(path = %venue_path.display(), "no venue alias table");
        }

        let policy = config.path_policy();
        Ok(Self {
            config,
            library,
            policy,
            removed_files: Vec::new(),
        })
    }

    /// Write the snapshot, then delete removed documents when configured to.
    pub fn save(&mut self) -> Result<()> {
        save_snapshot(&self.config.snapshot_path(), &self.library).map_err(ShelfError::from)?;
        if self.config.library.delete_removed_files && !self.removed_files.is_empty() {
            let deleted = remove_documents(&self.removed_files);
            info!(deleted, "deleted documents of removed papers");
        }
        self.removed_files.clear();
        Ok(())
    }

    fn paper(&self, id: PaperId) -> Result<&Paper> {
        self.library.paper(id).ok_or(CliError::NoSuchPaper(id))
    }

    /// Apply the given form fields on top of `paper`.
    fn fill(&self, paper: &mut Paper, form: &PaperForm) -> Result<()> {
        if let Some(file) = &form.bib {
            let text = fs::read_to_string(file).map_err(|source| CliError::Read {
                path: file.clone(),
                source,
            })?;
            paper.bib = self.library.parse_bib(&text).map_err(ShelfError::from)?;
        }
        if let Some(path) = &form.path {
            paper.set_path(path, &self.policy);
            if paper.path().is_empty() {
                warn!(path, "not an existing document under the library root");
            }
        }
        if let Some(title) = &form.title {
            paper.bib.set_title(title);
        }
        if let Some(authors) = &form.authors {
            paper.bib.set_authors(self.library.parse_authors(authors));
        }
        if let Some(venue) = &form.venue {
            paper.bib.set_venue(&self.library.parse_venue(venue));
        }
        if let Some(year) = &form.year {
            paper.bib.set_year_text(year);
        }
        if let Some(tags) = &form.tags {
            paper.set_tags(self.library.parse_tags(tags));
        }
        if let Some(projects) = &form.projects {
            paper.set_projects(self.library.parse_projects(projects));
        }
        if let Some(datasets) = &form.datasets {
            paper.set_datasets(self.library.parse_datasets(datasets));
        }
        if let Some(rating) = &form.rating {
            paper.set_rating_text(rating);
        }
        if let Some(comment) = &form.comment {
            paper.comment = comment.trim().to_string();
        }
        if let Some(read) = form.read {
            paper.has_read = read;
        }
        if let Some(github) = form.github {
            paper.has_github = github;
        }
        Ok(())
    }

    fn print_ids(&self, ids: &BTreeSet<PaperId>) {
        for id in ids {
            if let Some(paper) = self.library.paper(*id) {
                println!("{}", summary_line(paper));
            }
        }
    }

    fn print_papers<'a>(&self, papers: impl Iterator<Item = &'a Paper>) {
        for paper in papers {
            println!("{}", summary_line(paper));
        }
    }
}

/// `  12 [R*] title, authors, year`: read, has code, needs revision
fn summary_line(paper: &Paper) -> String {
    let id = paper.id().map_or_else(|| "-".to_string(), |id| id.to_string());
    let flags: String = [
        (paper.has_read, 'R'),
        (paper.has_github, 'G'),
        (paper.needs_revision, '*'),
    ]
    .iter()
    .map(|(on, mark)| if *on { *mark } else { ' ' })
    .collect();
    format!("{id:>4} [{flags}] {}", paper.bib.short_string())
}

fn print_details(paper: &Paper, policy: &PathPolicy) {
    let bib = &paper.bib;
    println!("id:        {}", paper.id().map_or_else(String::new, |id| id.to_string()));
    println!("title:     {}", bib.title());
    println!("authors:   {}", bib.authors_text());
    println!("venue:     {}", bib.venue());
    if bib.has_year() {
        println!("year:      {}", bib.year());
    }
    match paper.full_path(policy) {
        Some(path) => println!("path:      {}", path.display()),
        None => println!("path:"),
    }
    println!("tags:      {}", paper.tags_text());
    println!("projects:  {}", paper.projects_text());
    println!("datasets:  {}", paper.datasets_text());
    println!("rating:    {}", paper.rating());
    println!("read:      {}", paper.has_read);
    println!("github:    {}", paper.has_github);
    if paper.needs_revision {
        println!("status:    needs revision");
    }
    if !paper.comment.is_empty() {
        println!("comment:   {}", paper.comment);
    }
}

/// Run one command. Commands that change the library save it before returning.
pub fn run(command: Command, root: Option<&Path>) -> Result<()> {
    let mut session = Session::open(root)?;

    match command {
        Command::Add { form } => {
            let mut paper = Paper::new();
            session.fill(&mut paper, &form)?;
            match session.library.submit(paper) {
                Submission::Added(id) => {
                    session.save()?;
                    println!("added paper {id}");
                }
                Submission::Duplicate(existing) => return Err(CliError::Duplicate(existing)),
                Submission::Incomplete(state) => return Err(CliError::Incomplete(state)),
            }
        }

        Command::Edit { id, form } => {
            let mut paper = session.library.draft(id).ok_or(CliError::NoSuchPaper(id))?;
            session.fill(&mut paper, &form)?;
            let outcome = session
                .library
                .submit_revision(id, paper)
                .map_err(ShelfError::from)?;
            match outcome {
                RevisionOutcome::Revised => {
                    session.save()?;
                    println!("revised paper {id}");
                }
                RevisionOutcome::Unchanged => println!("paper {id} unchanged"),
                RevisionOutcome::Duplicate(other) => return Err(CliError::Duplicate(other)),
                RevisionOutcome::Incomplete(state) => return Err(CliError::Incomplete(state)),
            }
        }

        Command::Remove { ids } => {
            let mut removed = 0;
            for id in ids {
                match session.library.remove_paper(id) {
                    Some(paper) => {
                        if let Some(path) = paper.full_path(&session.policy) {
                            session.removed_files.push(path);
                        }
                        println!("removed paper {id}");
                        removed += 1;
                    }
                    None => warn!(id, "no such paper"),
                }
            }
            if removed > 0 {
                session.save()?;
            }
        }

        Command::Find {
            form,
            window,
            exact,
        } => {
            let mut query = Paper::new();
            session.fill(&mut query, &form)?;
            // find_paper matches venue spellings itself, fuzzily unless --exact
            if let Some(venue) = &form.venue {
                query.bib.set_venue(venue);
            }
            let mut options = session.config.query_options();
            if let Some(window) = window {
                options = options.with_year_window(window);
            }
            if exact {
                options = options.fuzzy(false);
            }
            let found = session.library.find_paper(&query, &options);
            session.print_ids(&found);
        }

        Command::List => session.print_papers(session.library.papers()),
        Command::Unread => session.print_ids(&session.library.find_unread()),
        Command::Github => session.print_ids(&session.library.find_github()),
        Command::Revise => session.print_ids(&session.library.find_to_revise()),

        Command::Show { id, bibtex } => {
            let paper = session.paper(id)?;
            if bibtex {
                println!("{}", paper.bib.to_bibtex());
            } else {
                print_details(paper, &session.policy);
            }
        }

        Command::Import { files } => {
            let added = import_files(&mut session.library, &session.policy, &files);
            if !added.is_empty() {
                session.save()?;
            }
            println!("imported {} of {} files", added.len(), files.len());
        }

        Command::Rescan { import } => {
            let report = rescan(&mut session.library, &session.policy);
            for (duplicate, first) in &report.clashes {
                println!("clash: {} duplicates {}", duplicate.display(), first.display());
            }
            for id in &report.relocated {
                println!("relocated paper {id}");
            }
            for id in &report.missing {
                println!("missing document for paper {id}");
            }
            for file in &report.new_files {
                println!("new file: {}", file.display());
            }
            println!("reparsed {} BibTeX records", report.rebuilt);

            let mut changed = report.changed();
            if import && report.clashes.is_empty() && !report.new_files.is_empty() {
                let added = import_files(&mut session.library, &session.policy, &report.new_files);
                println!("imported {} new files", added.len());
                changed |= !added.is_empty();
            }
            if changed {
                session.save()?;
            }
        }

        Command::Venues => {
            let venues = session.library.venues();
            for venue in venues.iter() {
                let spellings: Vec<&str> = venues
                    .aliases()
                    .filter(|(spelling, label)| *label == venue.label && *spelling != venue.label)
                    .map(|(spelling, _)| spelling)
                    .collect();
                println!(
                    "{:>3} {} ({} papers){}",
                    venue.index,
                    venue.label,
                    venue.papers.len(),
                    if spellings.is_empty() {
                        String::new()
                    } else {
                        format!(": {}", spellings.join(", "))
                    }
                );
            }
        }

        Command::ParseBib { file } => {
            let text = fs::read_to_string(&file).map_err(|source| CliError::Read {
                path: file.clone(),
                source,
            })?;
            let citation = extract_citation(&text).map_err(ShelfError::from)?;
            let bib = session.library.parse_bib(&text).map_err(ShelfError::from)?;
            println!("title:   {}", bib.title());
            println!("authors: {}", bib.authors_text());
            println!("venue:   {} ({})", bib.venue(), citation.venue);
            println!("year:    {}", citation.year);
            println!("key:     {}", bib.citation_key());
        }

        Command::Open { id } => {
            let paper = session.paper(id)?;
            let path = paper
                .full_path(&session.policy)
                .ok_or(CliError::NoDocument(id))?;
            open_document(&path).map_err(ShelfError::from)?;
        }

        Command::Check => {
            let problems = session.library.audit();
            if problems.is_empty() {
                println!("index is consistent ({} papers)", session.library.len());
            } else {
                for problem in &problems {
                    println!("{problem}");
                }
                warn!(count = problems.len(), "index inconsistencies found");
            }
        }

        Command::Init { force } => {
            let existing = session.config.library.root.join(LIBRARY_CONFIG_FILE);
            if existing.is_file() && !force {
                println!("config already at {}", existing.display());
            } else {
                let path = session.config.save_to_root().map_err(ShelfError::from)?;
                println!("wrote {}", path.display());
            }
        }
    }

    Ok(())
}
