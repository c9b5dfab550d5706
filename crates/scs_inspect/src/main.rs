// Inspect SCS model files: looks, variants and load warnings.
// Run with: cargo run --release -p scs_inspect -- <model.pim|file.pit> [options]

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use scs_core::loader::{import_model, load_container, load_pit, FileOutcome, PitLoad, PixKind};
use scs_core::pix::write_pix_file;
use scs_core::settings::ImportSettings;

struct Options {
    path: PathBuf,
    json: bool,
    strict: bool,
    config: Option<PathBuf>,
    reencode: Option<PathBuf>,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} <model.pim|file.pit> [--json] [--strict] [--config settings.json] [--reencode out]",
        program
    )
}

fn parse_args() -> Result<Options> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("scs_inspect");

    let mut path = None;
    let mut json = false;
    let mut strict = false;
    let mut config = None;
    let mut reencode = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--strict" => strict = true,
            "--config" => {
                let value = iter.next().context("--config needs a file path")?;
                config = Some(PathBuf::from(value));
            }
            "--reencode" => {
                let value = iter.next().context("--reencode needs an output path")?;
                reencode = Some(PathBuf::from(value));
            }
            "-h" | "--help" => {
                println!("{}", usage(program));
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown option '{}'\n{}", other, usage(program)),
            other => path = Some(PathBuf::from(other)),
        }
    }

    let Some(path) = path else {
        bail!("{}", usage(program));
    };

    Ok(Options {
        path,
        json,
        strict,
        config,
        reencode,
    })
}

fn print_pit(pit: &PitLoad) {
    println!("Status: {:?}", pit.status);

    if let Some(name) = pit.header.as_ref().and_then(|h| h.name.as_deref()) {
        println!("Name: {}", name);
    }

    println!("\nLooks: {}", pit.looks.len());
    for look in &pit.looks {
        println!("  {}", look.name.as_deref().unwrap_or("<unnamed>"));
        for (alias, material) in &look.materials {
            println!(
                "    {:<16} {:<24} {} attributes, {} textures",
                alias,
                material.effect.as_deref().unwrap_or("-"),
                material.attribute_total(),
                material.texture_total()
            );
        }
        if !look.unkeyed.is_empty() {
            println!("    ({} materials without an alias)", look.unkeyed.len());
        }
    }

    println!("\nVariants: {}", pit.variants.len());
    for variant in &pit.variants {
        println!(
            "  {}: {}",
            variant.name.as_deref().unwrap_or("<unnamed>"),
            variant.parts.join(", ")
        );
    }

    if !pit.diagnostics.is_empty() {
        println!("\nWarnings: {}", pit.diagnostics.len());
        for diagnostic in pit.diagnostics.iter() {
            println!("  {}", diagnostic);
        }
    }
}

fn pit_json(pit: &PitLoad) -> serde_json::Value {
    serde_json::json!({
        "status": pit.status,
        "header": pit.header,
        "global": pit.global,
        "looks": pit.looks,
        "variants": pit.variants,
        "diagnostics": pit.diagnostics,
    })
}

fn inspect_pit(path: &Path, settings: &ImportSettings, json: bool) -> Result<()> {
    let pit = load_pit(path, settings.decode_mode()).with_context(|| format!("loading {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pit_json(&pit))?);
    } else {
        print_pit(&pit);
    }
    Ok(())
}

fn inspect_model(path: &Path, settings: &ImportSettings, json: bool) -> Result<()> {
    let import = import_model(path, settings);

    if json {
        let files: Vec<_> = import
            .files
            .iter()
            .map(|f| {
                let outcome = match &f.outcome {
                    FileOutcome::Loaded => "loaded".to_string(),
                    FileOutcome::NotFound => "not found".to_string(),
                    FileOutcome::Failed(e) => format!("failed: {}", e),
                };
                serde_json::json!({
                    "kind": f.kind,
                    "path": f.path.display().to_string(),
                    "outcome": outcome,
                })
            })
            .collect();

        let value = serde_json::json!({
            "name": import.name,
            "files": files,
            "pit": import.pit.as_ref().map(pit_json),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Model: {}", import.name);
    for file in &import.files {
        let outcome = match &file.outcome {
            FileOutcome::Loaded => "loaded".to_string(),
            FileOutcome::NotFound => "not found".to_string(),
            FileOutcome::Failed(e) => format!("FAILED ({})", e),
        };
        println!("  [{}] {} {}", file.kind.extension(), file.path.display(), outcome);
    }

    if let Some(pit) = &import.pit {
        println!();
        print_pit(pit);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args()?;

    let mut settings = match &options.config {
        Some(config) => ImportSettings::from_json_file(config)
            .with_context(|| format!("reading settings {}", config.display()))?,
        None => ImportSettings::default(),
    };
    if options.strict {
        settings.strict = true;
    }

    log::debug!("Settings: {:?}", settings);

    match PixKind::from_path(&options.path) {
        Some(PixKind::Pit) => inspect_pit(&options.path, &settings, options.json)?,
        _ => inspect_model(&options.path, &settings, options.json)?,
    }

    if let Some(out) = &options.reencode {
        let container = load_container(&options.path)?
            .with_context(|| format!("{} does not exist", options.path.display()))?;
        write_pix_file(&container, out)?;
        log::info!("Wrote {} sections to {}", container.len(), out.display());
    }

    Ok(())
}
