use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::service::TokenService;
use crate::storage::{JsonFileStorage, SettingsStorage};
use crate::tokens::TokenRequest;
use crate::viewport::ViewportRange;

const STDIN_PATH: &str = "-";

/// Manage fluid and static design tokens and print them as CSS custom properties.
#[derive(Parser, Debug)]
#[command(name = "fluid-tokens", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Token settings file; overrides `settings_path` from config.json.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the `html` font-size rule and the `:root` custom properties.
    Css(CssArgs),

    /// List tokens with their resolved values, optionally filtered by name.
    List(ListArgs),

    /// Add a fluid token.
    Add(FluidArgs),

    /// Replace a fluid token, optionally renaming it.
    Edit(EditFluidArgs),

    /// Delete a fluid token.
    Delete(NameArg),

    /// Add a static token.
    AddStatic(StaticArgs),

    /// Replace a static token, optionally renaming it.
    EditStatic(EditStaticArgs),

    /// Delete a static token.
    DeleteStatic(NameArg),

    /// Set the root font size: `62.5%` (1rem = 10px) or `100%` (1rem = 16px).
    RootSize(RootSizeArgs),

    /// Write the settings as a versioned JSON snapshot.
    Export(ExportArgs),

    /// Merge a JSON snapshot; existing names are kept.
    Import(ImportArgs),

    /// Apply one JSON-encoded request such as `{"action":"add_token",...}`.
    Apply(ApplyArgs),

    /// Show the viewport range used for interpolation and where it came from.
    Viewport,
}

#[derive(clap::Args, Debug)]
pub struct CssArgs {
    /// Wrap the output in a `<style>` element.
    #[arg(long)]
    pub style_tag: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive name filter.
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NameArg {
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct FluidArgs {
    pub name: String,
    /// Size at the narrow end of the viewport range, in rem.
    #[arg(allow_negative_numbers = true)]
    pub min: f64,
    /// Size at the wide end of the viewport range, in rem.
    #[arg(allow_negative_numbers = true)]
    pub max: f64,
}

#[derive(clap::Args, Debug)]
pub struct EditFluidArgs {
    pub original_name: String,
    pub name: String,
    #[arg(allow_negative_numbers = true)]
    pub min: f64,
    #[arg(allow_negative_numbers = true)]
    pub max: f64,
}

#[derive(clap::Args, Debug)]
pub struct StaticArgs {
    pub name: String,
    /// Fixed size in rem.
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

#[derive(clap::Args, Debug)]
pub struct EditStaticArgs {
    pub original_name: String,
    pub name: String,
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

#[derive(clap::Args, Debug)]
pub struct RootSizeArgs {
    pub choice: String,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Destination file; stdout when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Snapshot file, or `-` for stdin.
    pub path: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ApplyArgs {
    /// Request JSON; read from stdin when omitted.
    pub request: Option<String>,
}

#[derive(Debug)]
pub enum Output {
    Text(String),
    Json(serde_json::Value),
    None,
}

fn to_json(value: impl Serialize) -> AppResult<Output> {
    Ok(Output::Json(serde_json::to_value(value)?))
}

fn read_input(path: &Path) -> AppResult<String> {
    let read_error = |source| AppError::ReadFile {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new(STDIN_PATH) {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(read_error)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).map_err(read_error)
}

fn current_viewport(config: &AppConfig) -> AppResult<ViewportRange> {
    Ok(config.viewport.build_source()?.viewport_range())
}

pub fn dispatch<S: SettingsStorage>(
    command: Command,
    service: &TokenService<S>,
    config: &AppConfig,
) -> AppResult<Output> {
    match command {
        Command::Css(args) => {
            let viewport = current_viewport(config)?;
            let store = service.snapshot();
            let css = if args.style_tag {
                store.render_style_tag(&viewport)?
            } else {
                store.render_css_variables(&viewport)?
            };
            Ok(Output::Text(css))
        }
        Command::List(args) => {
            let viewport = current_viewport(config)?;
            let store = service.snapshot();
            let results = store.search(args.search.as_deref().unwrap_or_default());
            let fluid: Vec<_> = store
                .fluid_token_views(&viewport)?
                .into_iter()
                .filter(|view| results.fluid.contains_key(&view.name))
                .collect();
            let statics: Vec<_> = store
                .static_token_views()?
                .into_iter()
                .filter(|view| results.statics.contains_key(&view.name))
                .collect();
            to_json(json!({
                "root_font_size": store.root_unit_size(),
                "viewport": viewport,
                "fluid": fluid,
                "static": statics,
            }))
        }
        Command::Add(args) => to_json(service.add_fluid_token(&args.name, args.min, args.max)?),
        Command::Edit(args) => to_json(service.edit_fluid_token(
            &args.original_name,
            &args.name,
            args.min,
            args.max,
        )?),
        Command::Delete(args) => {
            let entry = service.delete_fluid_token(&args.name)?;
            to_json(json!({ "deleted": entry.name }))
        }
        Command::AddStatic(args) => to_json(service.add_static_token(&args.name, args.value)?),
        Command::EditStatic(args) => to_json(service.edit_static_token(
            &args.original_name,
            &args.name,
            args.value,
        )?),
        Command::DeleteStatic(args) => {
            let entry = service.delete_static_token(&args.name)?;
            to_json(json!({ "deleted": entry.name }))
        }
        Command::RootSize(args) => {
            let size = service.update_root_unit_size(&args.choice)?;
            to_json(json!({ "root_font_size": size }))
        }
        Command::Export(args) => {
            let serialized = serde_json::to_string_pretty(&service.export_snapshot())?;
            match args.output {
                Some(path) => {
                    std::fs::write(&path, serialized).map_err(|source| AppError::WriteFile {
                        path: path.clone(),
                        source,
                    })?;
                    tracing::info!(path = %path.display(), "exported tokens");
                    Ok(Output::None)
                }
                None => Ok(Output::Text(format!("{serialized}\n"))),
            }
        }
        Command::Import(args) => {
            let payload = read_input(&args.path)?;
            to_json(service.import_snapshot_str(&payload)?)
        }
        Command::Apply(args) => {
            let payload = match args.request {
                Some(request) => request,
                None => read_input(Path::new(STDIN_PATH))?,
            };
            let request = TokenRequest::from_json(&payload)?;
            to_json(service.apply(request)?)
        }
        Command::Viewport => to_json(current_viewport(config)?),
    }
}

pub fn execute(cli: Cli, config: &AppConfig) -> AppResult<()> {
    let storage = match cli.settings.or_else(|| config.settings_path.clone()) {
        Some(path) => JsonFileStorage::with_path(path),
        None => JsonFileStorage::with_default_path()?,
    };
    tracing::debug!(path = %storage.path().display(), "using token settings file");
    let service = TokenService::open(storage)?;

    match dispatch(cli.command, &service, config)? {
        Output::Text(text) => print!("{text}"),
        Output::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Output::None => {}
    }
    Ok(())
}
