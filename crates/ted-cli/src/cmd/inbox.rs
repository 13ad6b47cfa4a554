use crate::cmd::log_failures;
use crate::output::{OutputMode, render};
use anyhow::Result;
use std::io::Write as _;
use ted_core::{Config, Vault};

pub fn run_inbox(config: &Config, output: OutputMode) -> Result<()> {
    let vault = Vault::open(config)?;
    let (items, failures) = vault.load_inbox();
    log_failures(&failures);

    render(output, &items, |items, w| {
        for item in items {
            let first = item.content.lines().next().unwrap_or_default();
            writeln!(w, "{} [{}] {first}", item.id, item.timestamp)?;
            for name in item.attachments() {
                writeln!(w, "\tattachment: {name}")?;
            }
        }
        if items.is_empty() {
            writeln!(w, "Inbox is empty.")?;
        }
        Ok(())
    })
}
