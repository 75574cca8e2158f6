use crate::commands::mount;
use crate::config::Config;
use crate::script;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template markup file
    pub template: PathBuf,

    /// Component manifest (defaults to the template path with a .json extension)
    #[arg(short, long)]
    pub component: Option<PathBuf>,

    /// Event script replayed after connecting
    #[arg(short, long)]
    pub events: Option<PathBuf>,

    /// Write the HTML to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn render(args: RenderArgs, config: &Config) -> Result<()> {
    let mounted = mount(&args.template, args.component.as_deref(), config)?;

    if let Some(events) = &args.events {
        let steps = script::load(events)?;
        script::replay(&mounted, &steps, config.pretty)?;
        info!(steps = steps.len(), "replayed event script");
    }

    let html = mounted.html();
    match &args.out {
        Some(out) => {
            fs::write(out, &html).with_context(|| format!("Cannot write {}", out.display()))?;
            eprintln!(
                "  {} {} → {}",
                "✓".green(),
                args.template.display(),
                out.display()
            );
        }
        None => println!("{}", html),
    }
    Ok(())
}
