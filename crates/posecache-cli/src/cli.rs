use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use posecache_types::Direction;

#[derive(Parser)]
#[command(
    name = "posecache",
    about = "posecache: named bone-selection caches for animation rigs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Host document the caches belong to. Omit for an unsaved document.
    #[arg(long, global = true)]
    pub document: Option<PathBuf>,

    /// Use the directory's shared cache file instead of the per-document one
    #[arg(long, global = true)]
    pub shared: bool,

    /// Do not write the cache file after create, move, or delete
    #[arg(long, global = true)]
    pub no_autosave: bool,

    /// TOML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show which cache file the document uses
    Path,
    /// List caches, for one skeleton or all of them
    List(ListArgs),
    /// Save bones as a named cache
    Create(CreateArgs),
    /// Show which bones selecting a cache would touch
    Select(SelectArgs),
    /// Move a cache one step up or down the list
    Move(MoveArgs),
    /// Delete a cache
    Delete(CacheArgs),
    /// Write the cache file now
    Save,
    /// Show the keyframe actions for the current channel settings
    Keys(KeysArgs),
}

#[derive(Args)]
pub struct ListArgs {
    pub skeleton: Option<String>,
}

#[derive(Args)]
pub struct CreateArgs {
    pub skeleton: String,
    pub name: String,
    /// Selected bones, in selection order
    pub bones: Vec<String>,
    /// Bones that exist on the skeleton. Defaults to the selection itself.
    #[arg(long, value_delimiter = ',')]
    pub valid: Vec<String>,
}

#[derive(Args)]
pub struct CacheArgs {
    pub skeleton: String,
    pub name: String,
}

#[derive(Args)]
pub struct SelectArgs {
    pub skeleton: String,
    pub name: String,
    /// Bones that exist on the skeleton. Defaults to the cached bones.
    #[arg(long, value_delimiter = ',')]
    pub valid: Vec<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    pub skeleton: String,
    pub name: String,
    pub direction: MoveDirection,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(value: MoveDirection) -> Self {
        match value {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

#[derive(Args)]
pub struct KeysArgs {
    /// Frame to clear keys on
    #[arg(long, default_value = "1")]
    pub frame: i32,
    /// Selected bones
    pub bones: Vec<String>,
}
