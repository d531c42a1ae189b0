use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use superwrite_config::Config;
use superwrite_engine::{
    Document, EditorSession, MockRewriteService, RewriteIntent, RewriteMode, RewriteOutcome,
    Selection, SelectionInfo, io, parse_markup, to_markup,
};

const SAMPLE_DOCUMENT: &str = "<h1>Title</h1><p>This is very good.</p>";

/// Schema-aware document editing with tracked rewrites
#[derive(Parser, Debug)]
#[command(name = "superwrite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether a range can be rewritten
    Check {
        #[command(flatten)]
        document: DocumentArgs,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Rewrite a range with the built-in rewriter
    Rewrite {
        #[command(flatten)]
        document: DocumentArgs,

        #[command(flatten)]
        range: RangeArgs,

        /// formalize, shorten or clarify
        #[arg(short, long)]
        intent: RewriteIntent,

        /// tracked or replace; defaults to the configured mode
        #[arg(short, long)]
        mode: Option<RewriteMode>,

        /// Write the clean result here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the document with tracked changes resolved
    Export {
        #[command(flatten)]
        document: DocumentArgs,

        /// Write here instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the markup in a standalone HTML page
        #[arg(long)]
        page: bool,
    },
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// Markup or .txt file; falls back to the configured document
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// Start position
    #[arg(long, requires = "to", conflicts_with = "find")]
    from: Option<usize>,

    /// End position
    #[arg(long, requires = "from")]
    to: Option<usize>,

    /// Select the first occurrence of this text
    #[arg(long)]
    find: Option<String>,
}

impl RangeArgs {
    fn selection(&self, doc: &Document) -> Result<Selection> {
        match (self.from, self.to, &self.find) {
            (Some(from), Some(to), _) => Ok(Selection::new(from, to)),
            (_, _, Some(needle)) => doc
                .find_text(needle)
                .map(|range| Selection::new(range.start, range.end))
                .ok_or_else(|| anyhow!("text not found in any block: {needle:?}")),
            _ => Err(anyhow!("give either --from/--to or --find")),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            log::warn!("Ignoring config file: {e}");
            Config::default()
        }
    };

    match cli.command {
        Command::Check { document, range } => {
            let session = open_session(&document, &config)?;
            check(session, &range)
        }
        Command::Rewrite {
            document,
            range,
            intent,
            mode,
            output,
        } => {
            let session = open_session(&document, &config)?
                .with_mode(mode.unwrap_or(config.rewrite_mode));
            rewrite(session, &range, intent, output.as_deref())
        }
        Command::Export {
            document,
            output,
            page,
        } => {
            let session = open_session(&document, &config)?;
            export(&session, output.as_deref(), page)
        }
    }
}

fn open_session(args: &DocumentArgs, config: &Config) -> Result<EditorSession> {
    let document = match args.input.as_ref().or(config.document_path.as_ref()) {
        Some(path) => io::read_document(path)
            .with_context(|| format!("Failed to open {}", path.display()))?,
        None => {
            log::info!("No input given, using the sample document");
            parse_markup(SAMPLE_DOCUMENT)?
        }
    };
    Ok(EditorSession::new(document).with_block_separator(config.block_separator.clone()))
}

fn check(mut session: EditorSession, range: &RangeArgs) -> Result<()> {
    let selection = range.selection(&session.document())?;
    session.set_selection(selection)?;

    match session.selection_info() {
        SelectionInfo::Valid(valid) => {
            println!(
                "valid {} {}..{}: {:?}",
                valid.block_kind, valid.from, valid.to, valid.text
            );
        }
        SelectionInfo::Invalid { reason } => println!("invalid: {reason}"),
    }
    Ok(())
}

fn rewrite(
    mut session: EditorSession,
    range: &RangeArgs,
    intent: RewriteIntent,
    output: Option<&Path>,
) -> Result<()> {
    let selection = range.selection(&session.document())?;
    session.set_selection(selection)?;

    match session.rewrite_with(&MockRewriteService, intent)? {
        RewriteOutcome::Applied(patch) => {
            log::info!(
                "{} rewrite applied as version {}",
                session.mode(),
                patch.version
            );
            println!("tracked: {}", to_markup(&session.document()));
        }
        RewriteOutcome::Unchanged => println!("rewriter returned the text unchanged"),
        RewriteOutcome::Discarded => println!("rewrite no longer matches the selection"),
    }

    let clean = session.clean_export();
    println!("clean:   {}", to_markup(&clean));
    if let Some(path) = output {
        io::write_markup(path, &clean)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

fn export(session: &EditorSession, output: Option<&Path>, page: bool) -> Result<()> {
    let clean = session.clean_export();
    match output {
        Some(path) if page => io::write_html_page(path, &clean)?,
        Some(path) => io::write_markup(path, &clean)?,
        None if page => println!("{}", session.export_html_page()),
        None => println!("{}", session.export_markup()),
    }
    Ok(())
}
