use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Act on the packages of this owner instead of the configured default
    #[arg(short, long, global = true)]
    pub owner: Option<i64>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the configuration
    Config {
        /// Write the default configuration with field documentation to the config path
        #[arg(short, long)]
        generate: bool,
    },

    /// Upload recipe or package files
    #[command(arg_required_else_help = true)]
    #[clap(name = "upload", visible_alias = "up")]
    Upload {
        /// Recipe reference, e.g. zlib/1.3@conan/stable#rev
        #[arg(required = true)]
        reference: String,

        /// Files to upload
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<String>,

        /// Upload as files of this binary package
        #[arg(short, long)]
        package: Option<String>,

        /// Revision of the binary package
        #[arg(long, requires = "package")]
        package_revision: Option<String>,

        /// Fail instead of replacing files that already exist
        #[arg(long)]
        no_overwrite: bool,
    },

    /// List revisions of a recipe or package, newest first
    #[command(arg_required_else_help = true)]
    Revisions {
        /// Recipe reference
        reference: String,

        /// Package id, optionally followed by #revision
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Show the latest revision of a recipe or package
    #[command(arg_required_else_help = true)]
    Latest {
        /// Recipe reference
        reference: String,

        /// Package id
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Search recipes, e.g. "zlib/1.*@conan/*"
    #[clap(name = "search", visible_alias = "s", visible_alias = "find")]
    Search {
        /// Search query; matches everything when omitted
        query: Option<String>,
    },

    /// List the binary packages of a recipe revision (latest when unset)
    #[command(arg_required_else_help = true)]
    Packages {
        /// Recipe reference
        reference: String,

        /// Include the packages of every recipe revision
        #[arg(short, long)]
        all_revisions: bool,
    },

    /// List the files of a recipe or package revision
    #[command(arg_required_else_help = true)]
    Files {
        /// Recipe reference
        reference: String,

        /// Package id, optionally followed by #revision
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Remove recipes, recipe revisions, packages or package revisions
    #[command(arg_required_else_help = true)]
    #[clap(name = "remove", visible_alias = "rm", visible_alias = "del")]
    Remove {
        /// Recipe reference
        reference: String,

        /// Package ids to remove, optionally followed by #revision
        #[arg(short, long, num_args = 1..)]
        package: Vec<String>,

        /// Remove across every recipe revision
        #[arg(short, long)]
        all_revisions: bool,
    },
}
