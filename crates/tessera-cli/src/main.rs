//! Tessera CLI - inspect schemas, edit component data and move scenes in
//! and out of glTF

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{entity, export, import, migrate, schema};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Component schemas and glTF interchange for 3D scenes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List component schemas, or show one
    Schema {
        /// Component id or display name
        name: Option<String>,

        /// Only list components that can be added to this entity kind
        #[arg(long)]
        kind: Option<String>,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,
    },

    /// Component editing on scene entities
    #[command(subcommand)]
    Entity(entity::EntityCommands),

    /// Export a scene to a glTF file carrying component data
    Export {
        /// Path to scene file
        scene: String,

        /// Output glTF path
        #[arg(short, long, default_value = "scene.gltf")]
        output: String,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,

        /// Leave component data out of the document
        #[arg(long)]
        no_components: bool,

        /// Keep vectors in Z-up authoring space
        #[arg(long)]
        z_up: bool,
    },

    /// Import a glTF file into a new scene
    Import {
        /// Path to glTF file
        input: String,

        /// Output scene path
        #[arg(short, long, default_value = "scene.toml")]
        output: String,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,

        /// Skip component data
        #[arg(long)]
        no_components: bool,

        /// The document's vectors are Z-up
        #[arg(long)]
        z_up: bool,
    },

    /// Bring stored component data up to the current schema versions
    Migrate {
        /// Path to scene file
        scene: String,

        /// Treat the data as local to this file, including linked entities
        #[arg(long)]
        local: bool,

        /// Save the migrated scene
        #[arg(long)]
        write: bool,

        /// Extra schema directories
        #[arg(long)]
        schemas: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Schema {
            name,
            kind,
            schemas,
        } => schema::run(name.as_deref(), kind.as_deref(), &schemas),
        Commands::Entity(cmd) => entity::run(cmd),
        Commands::Export {
            scene,
            output,
            schemas,
            no_components,
            z_up,
        } => export::run(export::ExportArgs {
            scene,
            output,
            schemas,
            no_components,
            z_up,
        }),
        Commands::Import {
            input,
            output,
            schemas,
            no_components,
            z_up,
        } => import::run(import::ImportArgs {
            input,
            output,
            schemas,
            no_components,
            z_up,
        }),
        Commands::Migrate {
            scene,
            local,
            write,
            schemas,
        } => migrate::run(&scene, local, write, &schemas),
    };

    tessera_schema::global::teardown();
    result
}
