// Flowferry Engine — flow package (.bot) archive handling.
//
// A flow travels as a ZIP archive containing its sources plus a
// `package.json` manifest. Migration rewrites the manifest (fresh uuid, new
// display name, encryption flag cleared) and leaves every other entry as-is.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::engine::platform::PlatformError;

const MANIFEST_NAME: &str = "package.json";

fn archive_err(context: &str, e: impl std::fmt::Display) -> PlatformError {
    PlatformError::Rejected(format!("{}: {}", context, e))
}

/// Rewrite the manifest for a transferred copy: fresh app id, the new
/// display name, and `encrypt_bot` cleared so the copy stays readable.
pub fn rewrite_manifest(manifest: &mut serde_json::Value, new_app_id: &str, new_name: &str) {
    if let Some(obj) = manifest.as_object_mut() {
        obj.insert("uuid".to_string(), serde_json::json!(new_app_id));
        obj.insert("name".to_string(), serde_json::json!(new_name));
        obj.insert("encrypt_bot".to_string(), serde_json::json!(false));
    }
}

/// Pull `package.json` out of a `.bot` archive.
pub fn extract_manifest(bot_data: &[u8]) -> Result<serde_json::Value, PlatformError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bot_data)).map_err(|e| archive_err("bad .bot archive", e))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| archive_err("bad .bot entry", e))?;
        if file.name() == MANIFEST_NAME {
            let mut content = String::new();
            file.read_to_string(&mut content)
                .map_err(|e| archive_err("manifest unreadable", e))?;
            return serde_json::from_str(&content).map_err(|e| archive_err("manifest malformed", e));
        }
    }

    Err(PlatformError::Rejected(
        "package.json missing from .bot archive".to_string(),
    ))
}

/// Rebuild a `.bot` archive with the manifest replaced. Every other entry is
/// copied through unchanged.
pub fn repack(bot_data: &[u8], manifest: &serde_json::Value) -> Result<Vec<u8>, PlatformError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bot_data)).map_err(|e| archive_err("bad .bot archive", e))?;

    let mut output = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut output));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| archive_err("bad .bot entry", e))?;
            let name = file.name().to_string();

            writer
                .start_file(name.as_str(), options)
                .map_err(|e| archive_err("repack write failed", e))?;

            if name == MANIFEST_NAME {
                let json = serde_json::to_string_pretty(manifest)
                    .map_err(|e| archive_err("manifest serialize failed", e))?;
                writer
                    .write_all(json.as_bytes())
                    .map_err(|e| archive_err("repack write failed", e))?;
            } else {
                let mut content = Vec::new();
                file.read_to_end(&mut content)
                    .map_err(|e| archive_err("entry unreadable", e))?;
                writer
                    .write_all(&content)
                    .map_err(|e| archive_err("repack write failed", e))?;
            }
        }

        writer
            .finish()
            .map_err(|e| archive_err("repack finish failed", e))?;
    }

    Ok(output)
}

/// Build a `.bot` archive from a local robot directory, substituting the
/// rewritten manifest for the on-disk `package.json`. Directory structure
/// (including `.dev` folders) is preserved.
pub fn build_from_dir(
    robot_path: &Path,
    manifest: &serde_json::Value,
) -> Result<Vec<u8>, PlatformError> {
    let mut output = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut output));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in WalkDir::new(robot_path) {
            let entry = entry.map_err(|e| archive_err("walk failed", e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let rel = path
                .strip_prefix(robot_path)
                .map_err(|e| archive_err("path outside robot dir", e))?;
            // ZIP entry names always use forward slashes.
            let name = rel.to_string_lossy().replace('\\', "/");

            writer
                .start_file(name.as_str(), options)
                .map_err(|e| archive_err("pack write failed", e))?;

            if name == MANIFEST_NAME {
                let json = serde_json::to_string_pretty(manifest)
                    .map_err(|e| archive_err("manifest serialize failed", e))?;
                writer
                    .write_all(json.as_bytes())
                    .map_err(|e| archive_err("pack write failed", e))?;
            } else {
                let content = std::fs::read(path).map_err(|e| archive_err("file unreadable", e))?;
                writer
                    .write_all(&content)
                    .map_err(|e| archive_err("pack write failed", e))?;
            }
        }

        writer
            .finish()
            .map_err(|e| archive_err("pack finish failed", e))?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bot(manifest: &serde_json::Value) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut out));
            let options = SimpleFileOptions::default();
            writer.start_file("package.json", options).unwrap();
            writer
                .write_all(serde_json::to_string(manifest).unwrap().as_bytes())
                .unwrap();
            writer.start_file("main.flow", options).unwrap();
            writer.write_all(b"flow body").unwrap();
            writer.finish().unwrap();
        }
        out
    }

    #[test]
    fn manifest_rewrite_sets_identity_and_clears_encryption() {
        let mut manifest = serde_json::json!({
            "uuid": "old-id",
            "name": "发票下载",
            "encrypt_bot": true,
            "flows": ["a", "b"],
        });
        rewrite_manifest(&mut manifest, "new-id", "发票下载_云迁");
        assert_eq!(manifest["uuid"], "new-id");
        assert_eq!(manifest["name"], "发票下载_云迁");
        assert_eq!(manifest["encrypt_bot"], false);
        // Untouched keys survive.
        assert_eq!(manifest["flows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn repack_replaces_manifest_and_keeps_siblings() {
        let original = serde_json::json!({"uuid": "old", "name": "旧"});
        let bot = sample_bot(&original);

        let mut rewritten = original.clone();
        rewrite_manifest(&mut rewritten, "fresh", "新");
        let repacked = repack(&bot, &rewritten).unwrap();

        let extracted = extract_manifest(&repacked).unwrap();
        assert_eq!(extracted["uuid"], "fresh");

        let mut archive = ZipArchive::new(Cursor::new(repacked.as_slice())).unwrap();
        let mut body = Vec::new();
        archive
            .by_name("main.flow")
            .unwrap()
            .read_to_end(&mut body)
            .unwrap();
        assert_eq!(body, b"flow body");
    }

    #[test]
    fn extract_fails_without_manifest() {
        let mut out = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut out));
            writer
                .start_file("other.txt", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"x").unwrap();
            writer.finish().unwrap();
        }
        assert!(extract_manifest(&out).is_err());
    }

    #[test]
    fn build_from_dir_substitutes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"uuid":"disk"}"#).unwrap();
        std::fs::create_dir(dir.path().join(".dev")).unwrap();
        std::fs::write(dir.path().join(".dev").join("state"), b"dev").unwrap();

        let manifest = serde_json::json!({"uuid": "rewritten"});
        let bot = build_from_dir(dir.path(), &manifest).unwrap();

        let extracted = extract_manifest(&bot).unwrap();
        assert_eq!(extracted["uuid"], "rewritten");

        let mut archive = ZipArchive::new(Cursor::new(bot.as_slice())).unwrap();
        assert!(archive.by_name(".dev/state").is_ok());
    }
}
