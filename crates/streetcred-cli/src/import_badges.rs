//! # Import-Badges Subcommand
//!
//! Populate the badge catalog from a directory of generated artwork. Each
//! `{Location_Words}_{animal}.png` file is uploaded to the badge bucket
//! under `{prefix}/{file}`, replacing any earlier upload, and a `badges` row
//! is inserted pointing at its public URL.
//!
//! A file that cannot be parsed, read, uploaded or recorded is reported and
//! skipped; the rest of the directory is still imported.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use streetcred_client::{SupabaseClient, SupabaseConfig};
use streetcred_core::{Badge, NewBadge};
use streetcred_rewards::{BlobStore, RecordStore};

/// Bucket holding badge artwork.
pub const BADGE_BUCKET: &str = "badges";

/// Object prefix for imported artwork.
pub const BADGE_PREFIX: &str = "generated";

const PNG: &str = "png";

/// Arguments for the import-badges subcommand.
#[derive(Args, Debug)]
pub struct ImportBadgesArgs {
    /// Directory of `{Location_Words}_{animal}.png` images.
    pub dir: PathBuf,
    /// Storage bucket for the artwork.
    #[arg(long, default_value = BADGE_BUCKET)]
    pub bucket: String,
    /// Object path prefix inside the bucket.
    #[arg(long, default_value = BADGE_PREFIX)]
    pub prefix: String,
}

/// Derive the catalog entry named by an image file.
///
/// `Hell's_Kitchen_rat.png` is a `rat` at `Hell's Kitchen`: the last
/// underscore-separated word is the animal, the rest is the location.
pub fn parse_badge_file_name(file_name: &str) -> Result<NewBadge, String> {
    let path = Path::new(file_name);
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PNG));
    if !is_png {
        return Err(format!("\"{file_name}\" is not a .png image"));
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("\"{file_name}\" has no file name"))?;

    let (location, animal) = stem
        .rsplit_once('_')
        .ok_or_else(|| format!("expected LOCATION_ANIMAL.png, got \"{file_name}\""))?;
    let location_name = location
        .split('_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if location_name.is_empty() || animal.is_empty() {
        return Err(format!("expected LOCATION_ANIMAL.png, got \"{file_name}\""));
    }

    Ok(NewBadge {
        animal: animal.to_string(),
        location_name,
        image_url: None,
    })
}

/// PNG files directly inside `dir`, sorted by name.
pub fn badge_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    let mut images = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(PNG));
        if path.is_file() && is_png {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Per-file result of an import.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Imported { file: String, badge: Badge },
    Failed { file: String, reason: String },
}

/// Import each file in order.
pub async fn import_all<S: RecordStore, B: BlobStore>(
    records: &S,
    blobs: &B,
    prefix: &str,
    files: &[PathBuf],
) -> Vec<ImportOutcome> {
    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = match import_one(records, blobs, prefix, path, &file).await {
            Ok(badge) => {
                tracing::info!(
                    file = %file,
                    badge_id = badge.id,
                    location = %badge.location_name,
                    "badge imported"
                );
                ImportOutcome::Imported { file, badge }
            }
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "badge import failed");
                ImportOutcome::Failed {
                    file,
                    reason: format!("{e:#}"),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

async fn import_one<S: RecordStore, B: BlobStore>(
    records: &S,
    blobs: &B,
    prefix: &str,
    path: &Path,
    file: &str,
) -> anyhow::Result<Badge> {
    let mut badge = parse_badge_file_name(file).map_err(anyhow::Error::msg)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let object = format!("{}/{file}", prefix.trim_end_matches('/'));
    blobs.upload(&object, bytes, "image/png").await?;
    badge.image_url = Some(blobs.public_url(&object));

    Ok(records.insert_badge(&badge).await?)
}

pub async fn run(args: &ImportBadgesArgs) -> anyhow::Result<String> {
    let config = SupabaseConfig::from_env().context("import-badges needs a Supabase project")?;
    let client = SupabaseClient::new(config)?;
    let storage = client.storage().for_bucket(&args.bucket).with_upsert(true);

    let files = badge_images(&args.dir)?;
    if files.is_empty() {
        return Ok(format!("no .png images in {}", args.dir.display()));
    }
    let outcomes = import_all(client.records(), &storage, &args.prefix, &files).await;
    Ok(render(&outcomes))
}

fn render(outcomes: &[ImportOutcome]) -> String {
    let imported = outcomes
        .iter()
        .filter(|o| matches!(o, ImportOutcome::Imported { .. }))
        .count();
    let mut lines = vec![format!("{imported}/{} badges imported", outcomes.len())];
    for outcome in outcomes {
        lines.push(match outcome {
            ImportOutcome::Imported { file, badge } => format!(
                "  {file}  -> {} {} (badge {})",
                badge.location_name, badge.animal, badge.id
            ),
            ImportOutcome::Failed { file, reason } => format!("  {file}  skipped: {reason}"),
        });
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetcred_core::BadgePool;
    use streetcred_rewards::memory::MEMORY_BLOB_BASE;
    use streetcred_rewards::MemoryStore;

    #[test]
    fn parses_single_word_location() {
        let badge = parse_badge_file_name("Harlem_hawk.png").unwrap();
        assert_eq!(badge.location_name, "Harlem");
        assert_eq!(badge.animal, "hawk");
        assert!(badge.image_url.is_none());
    }

    #[test]
    fn parses_multi_word_location() {
        let badge = parse_badge_file_name("Hell's_Kitchen_rat.png").unwrap();
        assert_eq!(badge.location_name, "Hell's Kitchen");
        assert_eq!(badge.animal, "rat");

        let badge = parse_badge_file_name("Columbia_University_owl.PNG").unwrap();
        assert_eq!(badge.location_name, "Columbia University");
        assert_eq!(badge.animal, "owl");
    }

    #[test]
    fn rejects_malformed_file_names() {
        for name in ["rat.png", "_rat.png", "SoHo_.png", "Harlem_hawk.jpg", "Harlem_hawk"] {
            assert!(parse_badge_file_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn lists_only_png_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["SoHo_pigeon.png", "Harlem_hawk.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<String> = badge_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Harlem_hawk.png", "SoHo_pigeon.png"]);
    }

    #[tokio::test]
    async fn imports_valid_files_and_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("Hell's_Kitchen_rat.png");
        let bad = dir.path().join("rat.png");
        std::fs::write(&good, [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(&bad, b"x").unwrap();

        let store = MemoryStore::new();
        let outcomes = import_all(&store, &store, "generated", &[bad, good]).await;

        assert!(matches!(&outcomes[0], ImportOutcome::Failed { file, .. } if file == "rat.png"));
        let ImportOutcome::Imported { badge, .. } = &outcomes[1] else {
            panic!("expected import, got {:?}", outcomes[1]);
        };
        assert_eq!(badge.location_name, "Hell's Kitchen");
        assert_eq!(
            badge.image_url.as_deref(),
            Some(format!("{MEMORY_BLOB_BASE}/generated/Hell's_Kitchen_rat.png").as_str())
        );

        let stored = store.blob("generated/Hell's_Kitchen_rat.png").unwrap();
        assert_eq!(stored.content_type, "image/png");
        let pool = store
            .badge_pool(&BadgePool::for_location("Hell's Kitchen"))
            .await
            .unwrap();
        assert_eq!(pool.len(), 1);

        assert!(render(&outcomes).starts_with("1/2 badges imported"));
    }
}
