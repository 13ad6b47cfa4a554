//! `ted import` — pull captured items from the intake server into `inbox/`.

use crate::output::{OutputMode, render_mode};
use anyhow::{Context as _, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write as _};
use std::time::Duration;
use ted_core::id::{format_id, next_id};
use ted_core::{Config, EntityKind, InboxItem, Vault};
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_UPLOAD_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Intake server base URL. Defaults to `intake_url` from config.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Ask the server to clear its inbox after a clean import.
    #[arg(long)]
    pub clear: bool,

    /// Skip downloading photo and file attachments.
    #[arg(long)]
    pub no_attachments: bool,
}

/// One entry of `GET /api/items`. `content` is an inbox item as JSON text.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeEntry {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<IntakeEntry>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub server: String,
    pub fetched: usize,
    pub imported: usize,
    pub renumbered: usize,
    pub skipped: usize,
    pub attachments: usize,
    pub attachment_failures: usize,
    pub cleared: bool,
}

/// The three intake server calls used by import.
pub trait IntakeClient {
    /// # Errors
    ///
    /// Fails if the server is unreachable or the listing is not valid JSON.
    fn list_items(&self) -> Result<Vec<IntakeEntry>>;

    /// # Errors
    ///
    /// Fails if the upload cannot be fetched.
    fn fetch_upload(&self, name: &str) -> Result<Vec<u8>>;

    /// # Errors
    ///
    /// Fails if the server rejects the request.
    fn clear(&self) -> Result<()>;
}

/// Blocking HTTP client with a fixed timeout and no retries.
pub struct HttpIntakeClient {
    base: String,
    agent: ureq::Agent,
}

impl HttpIntakeClient {
    pub fn new(base: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ted-cli/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|err| anyhow::anyhow!("intake request failed for {url}: {err}"))?;
        response
            .into_json::<T>()
            .context("failed to decode intake server JSON response")
    }
}

impl IntakeClient for HttpIntakeClient {
    fn list_items(&self) -> Result<Vec<IntakeEntry>> {
        let list: ItemList = self.get_json(&self.url("api/items"))?;
        Ok(list.items)
    }

    fn fetch_upload(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.url(&format!("uploads/{name}"));
        debug!(url, "GET");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| anyhow::anyhow!("upload request failed for {url}: {err}"))?;
        read_capped(response.into_reader(), MAX_UPLOAD_BYTES)
            .with_context(|| format!("failed to read upload {name}"))
    }

    fn clear(&self) -> Result<()> {
        let url = self.url("api/clear");
        self.agent
            .post(&url)
            .call()
            .map_err(|err| anyhow::anyhow!("intake request failed for {url}: {err}"))?;
        Ok(())
    }
}

/// Read a whole body of at most `limit` bytes. A longer body is an error,
/// never a truncated file.
fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > limit {
        anyhow::bail!("body exceeds {limit} bytes");
    }
    Ok(bytes)
}

/// Copy every server item into the vault.
///
/// A failed listing aborts. An item whose content is not valid JSON is
/// skipped, and an attachment that cannot be downloaded is logged; both
/// keep the server from being cleared. Attachments never replace stored
/// files: a taken name is stored under a new one, which the inbox item
/// then records.
///
/// # Errors
///
/// Fails if the listing cannot be fetched or a vault write fails.
pub fn import_items(
    client: &dyn IntakeClient,
    vault: &Vault<'_>,
    args: &ImportArgs,
) -> Result<ImportReport> {
    let entries = client
        .list_items()
        .context("failed to fetch intake items")?;

    let (local, failures) = vault.load_inbox();
    crate::cmd::log_failures(&failures);
    let mut ids: HashSet<String> = local.into_iter().map(|item| item.id).collect();

    let mut report = ImportReport {
        fetched: entries.len(),
        ..ImportReport::default()
    };

    for entry in entries {
        let mut item: InboxItem = match serde_json::from_str(&entry.content) {
            Ok(item) => item,
            Err(err) => {
                warn!(filename = %entry.filename, error = %err, "skipping malformed intake item");
                report.skipped += 1;
                continue;
            }
        };

        if item.id.is_empty() || ids.contains(&item.id) {
            let id = format_id(
                EntityKind::Inbox,
                next_id(ids.iter().map(String::as_str)),
            );
            debug!(from = %item.id, to = %id, "renumbered inbox item");
            item.id = id;
            report.renumbered += 1;
        }

        if !args.no_attachments {
            for slot in [&mut item.photo, &mut item.file] {
                let Some(name) = slot.clone() else {
                    continue;
                };
                match client.fetch_upload(&name) {
                    Ok(bytes) => {
                        let stored = vault.write_attachment(&name, bytes.as_slice())?;
                        if stored != name {
                            debug!(from = %name, to = %stored, "stored attachment under a new name");
                        }
                        *slot = Some(stored);
                        report.attachments += 1;
                    }
                    Err(err) => {
                        warn!(attachment = %name, error = %err, "attachment download failed");
                        report.attachment_failures += 1;
                    }
                }
            }
        }

        vault.write_inbox_item(&item)?;
        ids.insert(item.id);
        report.imported += 1;
    }

    if args.clear {
        if report.skipped == 0 && report.attachment_failures == 0 {
            client.clear().context("failed to clear intake server")?;
            report.cleared = true;
        } else {
            warn!("import was incomplete; leaving the intake server untouched");
        }
    }

    info!(
        imported = report.imported,
        skipped = report.skipped,
        attachments = report.attachments,
        "import finished"
    );
    Ok(report)
}

pub fn run_import(args: &ImportArgs, config: &Config, output: OutputMode) -> Result<()> {
    let vault = Vault::open(config)?;
    let server = args.url.as_deref().unwrap_or(&config.intake_url);
    let client = HttpIntakeClient::new(server);

    let mut report = import_items(&client, &vault, args)?;
    report.server = client.base.clone();

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "imported={} skipped={} attachments={} attachment_failures={} cleared={}",
                r.imported, r.skipped, r.attachments, r.attachment_failures, r.cleared
            )
        },
        |r, w| {
            writeln!(w, "✓ Imported {} of {} item(s) from {}", r.imported, r.fetched, r.server)?;
            if r.renumbered > 0 {
                writeln!(w, "  {} renumbered to avoid id clashes", r.renumbered)?;
            }
            if r.attachments > 0 || r.attachment_failures > 0 {
                writeln!(
                    w,
                    "  attachments: {} saved, {} failed",
                    r.attachments, r.attachment_failures
                )?;
            }
            if r.skipped > 0 {
                writeln!(w, "  {} malformed item(s) skipped", r.skipped)?;
            }
            if r.cleared {
                writeln!(w, "  server inbox cleared")?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeClient {
        entries: Vec<IntakeEntry>,
        uploads: HashMap<String, Vec<u8>>,
        fail_listing: bool,
        cleared: Cell<bool>,
    }

    impl FakeClient {
        fn with_items(items: &[InboxItem]) -> Self {
            Self {
                entries: items
                    .iter()
                    .map(|item| IntakeEntry {
                        filename: item.filename(),
                        content: serde_json::to_string(item).expect("json"),
                    })
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl IntakeClient for FakeClient {
        fn list_items(&self) -> Result<Vec<IntakeEntry>> {
            if self.fail_listing {
                anyhow::bail!("connection refused");
            }
            Ok(self.entries.clone())
        }

        fn fetch_upload(&self, name: &str) -> Result<Vec<u8>> {
            self.uploads
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {name}"))
        }

        fn clear(&self) -> Result<()> {
            self.cleared.set(true);
            Ok(())
        }
    }

    fn vault_dir() -> (TempDir, Config) {
        let dir = TempDir::new().expect("tempdir");
        let config = Config::for_vault(dir.path());
        Vault::init(&config).expect("init");
        (dir, config)
    }

    #[test]
    fn items_and_attachments_are_written() {
        let (_dir, config) = vault_dir();
        let vault = Vault::open(&config).expect("open");

        let mut item = InboxItem::new("I00001", "01-02-2025_10:00:00", "call the bank");
        item.photo = Some("receipt.jpg".into());
        let mut client = FakeClient::with_items(&[item]);
        client.uploads.insert("receipt.jpg".into(), b"jpeg".to_vec());

        let args = ImportArgs {
            clear: true,
            ..ImportArgs::default()
        };
        let report = import_items(&client, &vault, &args).expect("import");
        assert_eq!(report.imported, 1);
        assert_eq!(report.attachments, 1);
        assert!(report.cleared);
        assert!(client.cleared.get());

        let stored = std::fs::read(config.files_dir().join("receipt.jpg")).expect("attachment");
        assert_eq!(stored, b"jpeg");
        let (items, failures) = vault.load_inbox();
        assert!(failures.is_empty());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "call the bank");
    }

    #[test]
    fn same_named_attachments_are_both_kept() {
        let (_dir, config) = vault_dir();
        let vault = Vault::open(&config).expect("open");

        let mut first = InboxItem::new("I00001", "01-02-2025_10:00:00", "first photo");
        first.photo = Some("image.jpg".into());
        let mut second = InboxItem::new("I00002", "01-02-2025_10:05:00", "second photo");
        second.photo = Some("image.jpg".into());
        let mut client = FakeClient::with_items(&[first, second]);
        client.uploads.insert("image.jpg".into(), b"A".to_vec());
        let report = import_items(&client, &vault, &ImportArgs::default()).expect("import");
        assert_eq!(report.attachments, 2);

        // The server serves the later upload now.
        client.uploads.insert("image.jpg".into(), b"B".to_vec());
        let mut third = InboxItem::new("I00003", "01-02-2025_10:10:00", "third photo");
        third.photo = Some("image.jpg".into());
        client.entries = FakeClient::with_items(&[third]).entries;
        import_items(&client, &vault, &ImportArgs::default()).expect("import");

        let (mut items, failures) = vault.load_inbox();
        assert!(failures.is_empty());
        items.sort_by(|a, b| a.id.cmp(&b.id));
        let photos: Vec<&str> = items.iter().filter_map(|i| i.photo.as_deref()).collect();
        assert_eq!(photos.len(), 3);
        assert_eq!(photos[0], "image.jpg");
        assert_ne!(photos[1], photos[0]);
        assert_ne!(photos[2], photos[1]);
        assert_ne!(photos[2], photos[0]);

        let read = |name: &str| std::fs::read(config.files_dir().join(name)).expect("stored");
        assert_eq!(read(photos[0]), b"A");
        assert_eq!(read(photos[2]), b"B");
    }

    #[test]
    fn oversized_body_is_an_error() {
        assert_eq!(read_capped(&b"abcd"[..], 4).expect("at the limit"), b"abcd");
        let err = read_capped(&b"abcde"[..], 4).expect_err("over the limit");
        assert!(err.to_string().contains("exceeds 4 bytes"));
    }

    #[test]
    fn failed_attachment_continues_and_blocks_clear() {
        let (_dir, config) = vault_dir();
        let vault = Vault::open(&config).expect("open");

        let mut item = InboxItem::new("I00001", "01-02-2025_10:00:00", "scan");
        item.file = Some("missing.pdf".into());
        let client = FakeClient::with_items(&[item]);

        let args = ImportArgs {
            clear: true,
            ..ImportArgs::default()
        };
        let report = import_items(&client, &vault, &args).expect("import");
        assert_eq!(report.imported, 1);
        assert_eq!(report.attachment_failures, 1);
        assert!(!report.cleared);
        assert!(!client.cleared.get());
    }

    #[test]
    fn malformed_content_is_skipped() {
        let (_dir, config) = vault_dir();
        let vault = Vault::open(&config).expect("open");

        let mut client = FakeClient::with_items(&[InboxItem::new("I00002", "01-02-2025_10:00:00", "ok")]);
        client.entries.insert(
            0,
            IntakeEntry {
                filename: "broken.md".into(),
                content: "{not json".into(),
            },
        );
        let report = import_items(&client, &vault, &ImportArgs::default()).expect("import");
        assert_eq!(report.fetched, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.imported, 1);
    }

    #[test]
    fn clashing_ids_are_renumbered() {
        let (_dir, config) = vault_dir();
        let vault = Vault::open(&config).expect("open");
        vault
            .write_inbox_item(&InboxItem::new("I00001", "01-01-2025_09:00:00", "already here"))
            .expect("seed");

        let client = FakeClient::with_items(&[InboxItem::new("I00001", "01-02-2025_10:00:00", "new")]);
        let report = import_items(&client, &vault, &ImportArgs::default()).expect("import");
        assert_eq!(report.renumbered, 1);

        let (items, _) = vault.load_inbox();
        let mut ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["I00001", "I00002"]);
    }

    #[test]
    fn listing_failure_aborts() {
        let (_dir, config) = vault_dir();
        let vault = Vault::open(&config).expect("open");
        let client = FakeClient {
            fail_listing: true,
            ..FakeClient::default()
        };
        let err = import_items(&client, &vault, &ImportArgs::default()).expect_err("must fail");
        assert!(format!("{err:#}").contains("connection refused"));
    }

    #[test]
    fn base_url_is_normalised() {
        let client = HttpIntakeClient::new("http://localhost:5000/");
        assert_eq!(client.url("/api/items"), "http://localhost:5000/api/items");
    }
}
