use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;

use hlx_codec::TypeDigest;
use hlx_keys::KeyScope;
use hlx_store::{save_prebuilt_payload, SaveOptions};

use crate::cli::{Cli, Command, ExportArgs, ImportArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Export(args) => cmd_export(args),
        Command::Import(args) => cmd_import(args),
    }
}

fn json_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let key = KeyScope::from_portable(!args.machine).resolve()?;
    let bytes = fs::read(&args.path)
        .with_context(|| format!("cannot read {}", args.path.display()))?;

    let opened = hlx_envelope::open_untyped(&bytes, key)
        .with_context(|| format!("{} is not a valid snapshot", args.path.display()))?;

    let cbor = if opened.compressed {
        hlx_codec::decompress(opened.payload)?
    } else {
        opened.payload.to_vec()
    };
    let value: serde_json::Value = ciborium::de::from_reader(cbor.as_slice())
        .context("payload is not representable as JSON")?;

    let out = json_path(&args.path);
    fs::write(&out, serde_json::to_string_pretty(&value)?)
        .with_context(|| format!("cannot write {}", out.display()))?;

    println!(
        "{} Exported {} → {}",
        "✓".green().bold(),
        args.path.display().to_string().bold(),
        out.display().to_string().bold(),
    );
    println!("  Type digest: {}", opened.type_digest.to_string().cyan());
    println!("  Written: {} ns since epoch", opened.timestamp.to_string().yellow());
    Ok(())
}

fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let edited = json_path(&args.path);
    let text = fs::read_to_string(&edited)
        .with_context(|| format!("cannot read {}", edited.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", edited.display()))?;

    // The JSON sibling carries no type identity; recover the digest from
    // the snapshot being repaired (or its backup).
    let digest = stored_digest(&args.path)
        .context("cannot recover the type digest; the original snapshot (or its .bak) must sit next to the JSON")?;

    let mut cbor = Vec::new();
    ciborium::ser::into_writer(&value, &mut cbor).context("JSON → CBOR transcoding failed")?;

    let compress = !args.no_compress;
    let payload = if compress {
        hlx_codec::Compression::Lz4.compress(cbor)?
    } else {
        cbor
    };

    let options = SaveOptions {
        portable: !args.machine,
        backup: !args.no_backup,
        compress,
    };
    save_prebuilt_payload(&args.path, &payload, &digest, options, compress)?;

    println!(
        "{} Imported {} → {}",
        "✓".green().bold(),
        edited.display().to_string().bold(),
        args.path.display().to_string().bold(),
    );
    Ok(())
}

/// Header-level digest of the envelope at `path`, trying the backup sibling
/// when the primary is unreadable.
fn stored_digest(path: &Path) -> anyhow::Result<TypeDigest> {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    let backup = PathBuf::from(name);

    for candidate in [path, backup.as_path()] {
        if let Ok(bytes) = fs::read(candidate) {
            if let Ok(peeked) = hlx_envelope::peek(&bytes) {
                return Ok(peeked.type_digest);
            }
        }
    }
    anyhow::bail!("no parseable envelope at {} or {}", path.display(), backup.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use hlx_store::load_or_fail;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Profile {
        gold: u64,
        name: String,
    }

    fn exported(dir: &Path, value: &Profile) -> PathBuf {
        let path = dir.join("profile.hlx");
        hlx_store::save(value, &path, SaveOptions::default()).unwrap();
        cmd_export(ExportArgs {
            path: path.clone(),
            machine: false,
        })
        .unwrap();
        path
    }

    #[test]
    fn export_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let value = Profile { gold: 42, name: "Ada".into() };
        let path = exported(dir.path(), &value);

        let text = fs::read_to_string(json_path(&path)).unwrap();
        assert!(text.contains("\"gold\": 42"));
        assert!(text.contains("\"name\": \"Ada\""));
    }

    #[test]
    fn export_then_import_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let value = Profile { gold: 42, name: "Ada".into() };
        let path = exported(dir.path(), &value);

        cmd_import(ImportArgs {
            path: path.clone(),
            machine: false,
            no_backup: false,
            no_compress: false,
        })
        .unwrap();

        let back: Profile = load_or_fail(&path, true).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn edited_json_lands_in_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let value = Profile { gold: 42, name: "Ada".into() };
        let path = exported(dir.path(), &value);

        // Hand-repair the exported file.
        let text = fs::read_to_string(json_path(&path)).unwrap();
        fs::write(json_path(&path), text.replace("42", "9000")).unwrap();

        cmd_import(ImportArgs {
            path: path.clone(),
            machine: false,
            no_backup: false,
            no_compress: true,
        })
        .unwrap();

        let back: Profile = load_or_fail(&path, true).unwrap();
        assert_eq!(back.gold, 9000);
    }

    #[test]
    fn import_without_original_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orphan.hlx");
        fs::write(json_path(&path), "{\"gold\": 1}").unwrap();

        let result = cmd_import(ImportArgs {
            path,
            machine: false,
            no_backup: false,
            no_compress: false,
        });
        assert!(result.is_err());
    }

    #[test]
    fn export_rejects_tampered_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let value = Profile { gold: 1, name: "x".into() };
        let path = dir.path().join("tampered.hlx");
        hlx_store::save(&value, &path, SaveOptions::default()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let result = cmd_export(ExportArgs { path, machine: false });
        assert!(result.is_err());
    }
}
