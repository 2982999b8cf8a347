use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slidemd")]
#[command(author, version, about)]
#[command(long_about = "A markdown slide viewer and editor.\n\n\
    Every paragraph is a slide, headings start new sections, and a\n\
    blockquote holding only an image URL shows the image.\n\n\
    Examples:\n  \
    slidemd talk.md                    View a file (reloads on save)\n  \
    slidemd --url https://host/#TOKEN  View a shared document\n  \
    slidemd render talk.md -o talk.html\n  \
    slidemd share talk.md --inline     Print a self-contained link")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Markdown file to view
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Open a share URL instead of a file
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Start in edit mode
    #[arg(long, global = false)]
    pub edit: bool,

    /// Only use built-in themes and documents
    #[arg(long, global = true)]
    pub offline: bool,

    /// Increase output verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a document to a standalone HTML deck
    Render {
        /// Markdown file to render
        file: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Theme to use when the document names none
        #[arg(long)]
        theme: Option<String>,
    },

    /// List sections and slide fragments
    Outline {
        /// Markdown file to inspect
        file: PathBuf,
    },

    /// Encode a document into a share token
    Encode {
        /// Markdown file (stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Decode a share token back into the document
    Decode {
        /// Share token
        token: String,
    },

    /// Print a share link for a document
    Share {
        /// Markdown file to share
        file: PathBuf,

        /// Embed the document in the link instead of using the hash store
        #[arg(long)]
        inline: bool,
    },

    /// Load the document a share URL points at
    Open {
        /// Share URL
        url: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.theme, defaults.start_mode, remote.origin)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let offline = self.offline;
        match self.command {
            Some(Commands::Render {
                file,
                output,
                theme,
            }) => crate::commands::render::run(&file, output.as_deref(), theme, offline),
            Some(Commands::Outline { file }) => crate::commands::outline::run(&file),
            Some(Commands::Encode { file }) => crate::commands::codec::encode(file.as_deref()),
            Some(Commands::Decode { token }) => crate::commands::codec::decode(&token),
            Some(Commands::Share { file, inline }) => crate::commands::share::run(&file, inline),
            Some(Commands::Open { url, output }) => {
                crate::commands::open::run(&url, output.as_deref(), offline)
            }
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("slidemd {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => {
                let source = match (self.file, self.url) {
                    (Some(file), _) => {
                        if !file.exists() {
                            anyhow::bail!("File not found: {}", file.display());
                        }
                        crate::app::Source::File(file)
                    }
                    (None, Some(url)) => crate::app::Source::Url(url),
                    (None, None) => crate::app::Source::Default,
                };
                crate::app::run(crate::app::Options {
                    source,
                    windowed: self.windowed,
                    edit: self.edit,
                    offline,
                })
            }
        }
    }
}
