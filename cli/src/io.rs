use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use engine::encounter::Encounter;

/// Read a text file, honoring a UTF-8/UTF-16 byte order mark.
pub fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", path.display()))
    }
}

pub fn read_encounter_auto(path: &Path) -> Result<Encounter> {
    let text = read_text_auto(path)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse encounter JSON: {}", path.display()))
}
