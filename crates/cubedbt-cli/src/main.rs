use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use walkdir::WalkDir;

use cubedbt_core::{Config, FilterConfig, CONFIG_FILE_NAME};
use cubedbt_dbt::{Dbt, Model};
use cubedbt_jinja::CubeTemplates;

const TEMPLATE_EXTENSION: &str = "jinja";

/// cubedbt - Cube data models from dbt manifests
#[derive(Parser)]
#[command(name = "cubedbt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: cubedbt.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to dbt manifest.json
    #[arg(short = 'f', long, global = true, conflicts_with = "manifest_url")]
    manifest: Option<PathBuf>,

    /// URL to fetch manifest.json from
    #[arg(long, global = true)]
    manifest_url: Option<String>,

    /// Only select models whose path starts with this prefix (repeatable)
    #[arg(long = "path", global = true)]
    paths: Vec<String>,

    /// Only select models carrying this tag (repeatable)
    #[arg(long = "tag", global = true)]
    tags: Vec<String>,

    /// Only select models with this name (repeatable)
    #[arg(long = "name", global = true)]
    names: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List selected models with their table and primary key
    Models,

    /// Print the cube and dimensions of one model
    Show {
        /// Model name
        model: String,
    },

    /// Render a template file, or every *.jinja file of a directory
    Render {
        /// Template file or directory
        template: PathBuf,

        /// Output file (stdout if omitted) or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let dbt = Arc::new(load_project(&config, cli.verbose)?);

    match &cli.command {
        Commands::Models => models_command(&dbt),
        Commands::Show { model } => show_command(&dbt, model),
        Commands::Render { template, output } => {
            let templates = CubeTemplates::new(config.indent).with_dbt(Arc::clone(&dbt));
            render_command(&templates, template, output.as_deref(), cli.verbose)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file, then command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        Config::from_file(Path::new(CONFIG_FILE_NAME))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    apply_overrides(&mut config, cli, &std::env::current_dir()?);

    if cli.verbose {
        if let Some(dialect) = config.dialect {
            eprintln!("{} dialect: {}", "Using".cyan(), dialect);
        }
    }

    Ok(config)
}

/// Command-line values win over the config file. Paths given on the command
/// line are relative to `cwd`, not to the config file's directory.
fn apply_overrides(config: &mut Config, cli: &Cli, cwd: &Path) {
    if let Some(manifest) = &cli.manifest {
        config.manifest = Some(cwd.join(manifest));
        config.manifest_url = None;
    }
    if let Some(url) = &cli.manifest_url {
        config.manifest_url = Some(url.clone());
    }

    config.filter.extend(FilterConfig {
        paths: cli.paths.clone(),
        tags: cli.tags.clone(),
        names: cli.names.clone(),
    });
}

fn load_project(config: &Config, verbose: bool) -> Result<Dbt> {
    let dbt = match &config.manifest_url {
        Some(url) => fetch_project(url, verbose)?,
        None => {
            let manifest_path = config.manifest_path();
            if !manifest_path.exists() {
                return Err(anyhow::anyhow!(
                    "Manifest not found at {}. Run 'dbt compile' or 'dbt build' first.",
                    manifest_path.display()
                ));
            }

            if verbose {
                eprintln!("{} {}", "Loading manifest from:".cyan(), manifest_path.display());
            }
            Dbt::from_file(&manifest_path)?
        }
    };

    Ok(dbt.configure(config))
}

#[cfg(feature = "remote")]
fn fetch_project(url: &str, verbose: bool) -> Result<Dbt> {
    if verbose {
        eprintln!("{} {}", "Fetching manifest from:".cyan(), url);
    }
    Ok(Dbt::from_url(url)?)
}

#[cfg(not(feature = "remote"))]
fn fetch_project(url: &str, _verbose: bool) -> Result<Dbt> {
    Err(anyhow::anyhow!(
        "Cannot fetch {url}: cubedbt was built without the `remote` feature"
    ))
}

fn models_command(dbt: &Dbt) -> Result<()> {
    let models = dbt.models();
    if models.is_empty() {
        println!("{}", "No models selected".yellow());
        return Ok(());
    }

    for model in models {
        println!("{} {}", model.name().bold(), model.sql_table().dimmed());
        println!("  {}", primary_key_summary(model));
    }

    println!();
    println!("{} {} models", "Selected".green(), models.len());
    Ok(())
}

fn primary_key_summary(model: &Model) -> String {
    let columns: Vec<&str> = model.primary_key().iter().map(|c| c.name()).collect();
    if columns.is_empty() {
        format!("{}", "no primary key".yellow())
    } else {
        format!(
            "primary key: {} (from {})",
            columns.join(", ").green(),
            model.primary_key_source()
        )
    }
}

fn show_command(dbt: &Dbt, name: &str) -> Result<()> {
    let model = dbt.model(name)?;
    print!("{}", cube_document(model)?);
    Ok(())
}

/// A standalone `cubes:` document for one model
fn cube_document(model: &Model) -> Result<String> {
    let cube = model.as_cube(4)?;
    let dimensions = model.as_dimensions(&[], 6)?;

    let mut document = format!("cubes:\n  - {cube}");
    if dimensions.is_empty() {
        document.push_str("dimensions: []\n");
    } else {
        document.push_str("dimensions:\n      ");
        document.push_str(dimensions.trim_end());
        document.push('\n');
    }
    Ok(document)
}

fn render_command(
    templates: &CubeTemplates,
    template: &Path,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    if template.is_dir() {
        let output = output.context("--output is required when rendering a directory")?;
        let count = render_directory(templates, template, output, verbose)?;
        eprintln!("{} {} templates into {}", "Rendered".green(), count, output.display());
        return Ok(());
    }

    let rendered = templates.render_file(template)?;
    match output {
        Some(path) => {
            write_output(path, &rendered)?;
            eprintln!("{} {}", "Saved to:".green(), path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn render_directory(
    templates: &CubeTemplates,
    source: &Path,
    output: &Path,
    verbose: bool,
) -> Result<usize> {
    let mut count = 0;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION)
        {
            continue;
        }

        let relative = path.strip_prefix(source)?;
        let target = output.join(relative.with_extension(""));

        if verbose {
            eprintln!("  {} {}...", "Rendering".cyan(), relative.display());
        }

        let rendered = templates.render_file(path)?;
        write_output(&target, &rendered)?;
        count += 1;
    }

    Ok(count)
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST_PATH: &str = "../../fixtures/jaffle-shop/target/manifest.json";

    fn project() -> Arc<Dbt> {
        Arc::new(Dbt::from_file(Path::new(MANIFEST_PATH)).unwrap())
    }

    #[test]
    fn cli_parses_filters() {
        let cli = Cli::parse_from([
            "cubedbt", "--tag", "cube", "--tag", "finance", "--path", "marts/", "models",
        ]);
        assert_eq!(cli.tags, vec!["cube", "finance"]);
        assert_eq!(cli.paths, vec!["marts/"]);
        assert!(matches!(cli.command, Commands::Models));
    }

    #[test]
    fn manifest_flag_conflicts_with_url() {
        let parsed = Cli::try_parse_from([
            "cubedbt", "--manifest", "m.json", "--manifest-url", "http://x/m.json", "models",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn manifest_flag_is_relative_to_working_directory() {
        let cli = Cli::parse_from(["cubedbt", "--manifest", "m.json", "--tag", "cube", "models"]);
        let mut config = Config::from_toml("manifest = \"target/other.json\"").unwrap();
        config.project_root = PathBuf::from("/work/proj");

        apply_overrides(&mut config, &cli, Path::new("/work/cwd"));

        assert_eq!(config.manifest_path(), PathBuf::from("/work/cwd/m.json"));
        assert_eq!(config.filter.tags, vec!["cube"]);
    }

    #[test]
    fn absolute_manifest_flag_is_kept() {
        let cli = Cli::parse_from(["cubedbt", "--manifest", "/data/manifest.json", "models"]);
        let mut config = Config::default();
        config.project_root = PathBuf::from("/work/proj");

        apply_overrides(&mut config, &cli, Path::new("/work/cwd"));

        assert_eq!(config.manifest_path(), PathBuf::from("/data/manifest.json"));
    }

    #[test]
    fn cube_document_for_model() {
        let dbt = project();
        let document = cube_document(dbt.model("customers").unwrap()).unwrap();

        let expected = "\
cubes:
  - name: customers
    description: One record per customer
    sql_table: '`jaffle-prod`.`analytics`.`customers`'
    dimensions:
      - name: customer_id
";
        assert!(document.starts_with(expected), "{document}");
        assert!(document.ends_with('\n'));
        assert!(!document.ends_with(" \n"));
    }

    #[test]
    fn renders_template_directory() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        std::fs::create_dir_all(source.path().join("marts")).unwrap();
        std::fs::write(
            source.path().join("marts/orders.yml.jinja"),
            "{{ model_primary_key('orders') | join(',') }}\n",
        )
        .unwrap();
        std::fs::write(source.path().join("README.md"), "not a template").unwrap();

        let templates = CubeTemplates::default().with_dbt(project());
        let count = render_directory(&templates, source.path(), output.path(), false).unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            std::fs::read_to_string(output.path().join("marts/orders.yml")).unwrap(),
            "order_id\n"
        );
        assert!(!output.path().join("README.md").exists());
    }
}
