use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::CliError;
use crate::identifier::SchemaRef;
use crate::prompt::Prompter;
use crate::registry::RegistryClient;
use crate::version::BumpKind;

pub mod compile;
pub mod completions;
pub mod find;
pub mod init;
pub mod pull;
pub mod push;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Scaffold a new schema project (interactive prompts)")]
    Init,
    #[command(about = "Search the OpenSchema registry for a schema")]
    Find {
        /// Name of the schema
        name: Option<String>,
        /// Version constraint, `>1.0.0` lists every version greater than 1.0.0
        #[arg(long)]
        version: Option<String>,
        /// Category constraint, ignored when --version is given
        #[arg(long)]
        category: Option<String>,
        /// Tags constraint, ignored when --version or --category is given
        #[arg(long, num_args = 1..)]
        tags: Option<Vec<String>>,
    },
    #[command(about = "Download a schema from the registry and extract it")]
    Pull {
        /// Schema to pull, `name` or `name:version`
        schema: SchemaRef,
        /// Directory to extract into, defaults to the current directory
        location: Option<PathBuf>,
    },
    #[command(about = "Validate, package and publish the schema project in a directory")]
    Push {
        /// Directory containing openschema.json and schema.json
        dir: Option<PathBuf>,
    },
    #[command(about = "Bump the version number in openschema.json")]
    Version {
        kind: BumpKind,
        /// Project directory, defaults to the current directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    #[command(about = "Derive a JSON Schema from TypeScript declarations")]
    Compile {
        /// TypeScript file holding the declarations
        file: PathBuf,
        #[arg(short, long, default_value = "schema.json")]
        output: PathBuf,
        /// Declaration to generate the schema for, `*` for all of them
        #[arg(short = 't', long = "type", default_value = "*")]
        type_name: String,
        #[arg(short, long, default_value = "tsconfig.json")]
        config: PathBuf,
    },
    #[command(about = "Emit shell completion scripts (bash/zsh/fish)")]
    Completions { shell: String },
}

/// Everything a command needs from its surroundings
pub struct Context<'a> {
    /// Directory relative paths are resolved against
    pub cwd: PathBuf,
    pub settings: Settings,
    pub prompter: &'a mut dyn Prompter,
}

impl<'a> Context<'a> {
    pub fn new(cwd: PathBuf, settings: Settings, prompter: &'a mut dyn Prompter) -> Self {
        Self {
            cwd,
            settings,
            prompter,
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    pub fn client(&self) -> Result<RegistryClient, CliError> {
        Ok(RegistryClient::new(&self.settings)?)
    }

    /// Ask a yes/no question, turning "no" into [`CliError::Aborted`]
    pub fn confirm_or_abort(&mut self, message: &str) -> Result<()> {
        if self.prompter.confirm(message, false)? {
            Ok(())
        } else {
            Err(CliError::Aborted.into())
        }
    }
}

pub async fn run(cmd: Commands, ctx: &mut Context<'_>) -> Result<()> {
    match cmd {
        Commands::Init => init::run(ctx).map(drop),
        Commands::Find {
            name,
            version,
            category,
            tags,
        } => find::run(ctx, name, version, category, tags).await.map(drop),
        Commands::Pull { schema, location } => pull::run(ctx, schema, location).await.map(drop),
        Commands::Push { dir } => push::run(ctx, dir).await.map(drop),
        Commands::Version { kind, dir } => version::run(ctx, kind, dir).map(drop),
        Commands::Compile {
            file,
            output,
            type_name,
            config,
        } => compile::run(ctx, &file, &output, &type_name, &config).map(drop),
        Commands::Completions { shell } => completions::run(&shell),
    }
}
