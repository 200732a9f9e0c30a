//! Compsql CLI - compile statement keys against a component schema

use clap::{Parser, Subcommand};
use compsql::config::{config_base_dir, load_config, write_config, CompsqlConfig};
use compsql::output::{render_links, render_nls, render_statement, OutputMode, Theme};
use compsql::{default_registry, ComponentConfiguration, ComponentType};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "compsql")]
#[command(version)]
#[command(about = "Component statement compiler - turns statement keys into SQL statement definitions")]
#[command(long_about = r#"
Compsql compiles statement keys such as

  com.example.ITrain/findComponentsBy?properties=code&orderBy=code;Asc

into SQL statement definitions, using the components described in a TOML schema.

Example usage:
  compsql init
  compsql compile "com.example.ITrain/insert"
  compsql links com.example.ITrain
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "compsql.toml")]
    config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputMode::Text)]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a statement key and print the statement definition
    Compile {
        /// Statement key
        key: String,
    },

    /// Print the components linked to a component, transitively
    Links {
        /// Component type
        component: String,
    },

    /// Check whether a component or its associations use localized columns
    Nls {
        /// Component type
        component: String,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn load_configuration(path: &Path) -> anyhow::Result<ComponentConfiguration> {
    let Some(config) = load_config(Some(path))? else {
        anyhow::bail!("no config at {} (run `compsql init` first)", path.display());
    };
    let configuration = ComponentConfiguration::from_config(&config, &config_base_dir(path))?;
    Ok(configuration)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let theme = Theme::detect();

    match cli.command {
        Commands::Compile { key } => {
            let configuration = load_configuration(&cli.config)?;
            let registry = default_registry();
            let statement = registry.resolve(&configuration, &key)?;
            print!("{}", render_statement(&statement, cli.format, &theme)?);
        }

        Commands::Links { component } => {
            let configuration = load_configuration(&cli.config)?;
            let component = ComponentType::new(component)?;
            let links = configuration.walker().link_closure(&component)?;
            print!("{}", render_links(&component, &links, cli.format, &theme)?);
        }

        Commands::Nls { component } => {
            let configuration = load_configuration(&cli.config)?;
            let component = ComponentType::new(component)?;
            let walker = configuration.walker();
            let uses = walker.uses_localized_column(&component)?;
            let properties = walker.localized_properties(&component)?;
            print!("{}", render_nls(&component, uses, &properties, cli.format, &theme)?);
        }

        Commands::Init { force } => {
            write_config(&cli.config, &CompsqlConfig::default(), force)?;
            tracing::info!("Wrote {}", cli.config.display());
            println!("Created {}", cli.config.display());
        }
    }

    Ok(())
}
