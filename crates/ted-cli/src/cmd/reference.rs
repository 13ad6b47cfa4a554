//! `ted ref` — capture a reference for a todo.

use crate::cmd::{Written, load_vault};
use crate::output::{OutputMode, render};
use anyhow::Result;
use chrono::Local;
use clap::{ArgGroup, Args, Subcommand};
use std::io::Write as _;
use std::path::PathBuf;
use ted_core::id::format_id;
use ted_core::model::{EntityKind, single_line};
use ted_core::{Config, Reference, ReferenceData};

#[derive(Subcommand, Debug)]
pub enum RefCommand {
    /// Attach a link, notebook entry or file to a todo.
    New(RefNewArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["link", "notebook", "file"])))]
pub struct RefNewArgs {
    /// Todo ID the reference documents.
    pub todo: String,

    /// Web link; `https://` is added when no scheme is given.
    #[arg(long)]
    pub link: Option<String>,

    /// Free-text notebook entry, stored with today's date.
    #[arg(long)]
    pub notebook: Option<String>,

    /// File to copy into the vault's `files/` directory.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Heading for the reference document.
    #[arg(long, default_value = ReferenceData::DEFAULT_NAME)]
    pub name: String,

    /// One-line summary.
    #[arg(long, default_value = "")]
    pub tldr: String,
}

pub fn run_ref(command: &RefCommand, config: &Config, output: OutputMode) -> Result<()> {
    match command {
        RefCommand::New(args) => run_ref_new(args, config, output),
    }
}

fn run_ref_new(args: &RefNewArgs, config: &Config, output: OutputMode) -> Result<()> {
    let (vault, data) = load_vault(config)?;
    let todo = data.require_todo(&args.todo)?;
    let name = single_line("name", &args.name)?;
    let tldr = single_line("tldr", &args.tldr)?;

    let reference = match (&args.link, &args.notebook, &args.file) {
        (Some(url), _, _) => Reference::link(url),
        (_, Some(text), _) => Reference::Notebook(format!(
            "{} {}",
            Local::now().format("%m-%d-%Y"),
            single_line("notebook entry", text)?
        )),
        (_, _, Some(path)) => Reference::File(vault.store_file(path)?),
        (None, None, None) => anyhow::bail!("one of --link, --notebook or --file is required"),
    };

    let id = format_id(EntityKind::Reference, data.next_id(EntityKind::Reference));
    let mut data_ref = ReferenceData::new(id, reference, todo.filename.clone());
    data_ref.name = name;
    data_ref.tldr = tldr;

    let path = vault.create_reference(&mut data_ref)?;
    render(output, &Written::new(data_ref.id(), &path), |v, w| {
        writeln!(w, "✓ Created reference {} for {} at {}", v.id, todo.id(), v.path)
    })
}
