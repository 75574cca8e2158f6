use crate::commands::mount;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Template file, or a directory searched for .html templates
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Component manifest; only valid when checking a single template
    #[arg(short, long)]
    pub component: Option<PathBuf>,
}

/// Connect every template and report the ones that fail
pub fn check(args: CheckArgs, config: &Config) -> Result<()> {
    if !args.path.exists() {
        return Err(anyhow!("Path does not exist: {}", args.path.display()));
    }

    let templates = if args.path.is_dir() {
        if args.component.is_some() {
            return Err(anyhow!("--component needs a single template, not a directory"));
        }
        find_templates(&args.path)
    } else {
        vec![args.path.clone()]
    };

    if templates.is_empty() {
        println!("{}", "⚠️  No templates found".yellow());
        return Ok(());
    }

    let mut error_count = 0;
    for template in &templates {
        let relative = template.strip_prefix(&args.path).unwrap_or(template);
        let shown = if relative.as_os_str().is_empty() {
            template.as_path()
        } else {
            relative
        };
        match mount(template, args.component.as_deref(), config) {
            Ok(mounted) => {
                println!(
                    "  {} {} ({} listeners)",
                    "✓".green(),
                    shown.display(),
                    mounted.observer.event_listener_count()
                );
            }
            Err(err) => {
                error_count += 1;
                eprintln!("  {} {} - {}", "✗".red(), shown.display(), err.to_string().red());
            }
        }
    }

    println!();
    if error_count == 0 {
        println!("{} Checked {} templates", "✅".green(), templates.len());
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} templates failed to connect",
            error_count,
            templates.len()
        ))
    }
}

fn find_templates(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("html"))
        .collect();
    files.sort();
    files
}
