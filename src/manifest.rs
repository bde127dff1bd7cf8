//! Dataset packaging: describes every comment file and merges those descriptions
//! into a base metadata document.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::paths::DataLayout;
use crate::util::{create_with_backoff, part_path, replace_file_atomic_backoff};

/// `(name, description, type)` for each comment file column.
pub const COMMENT_SCHEMA: &[(&str, &str, &str)] = &[
    ("author", "A hashed version of the poster's username", "string"),
    ("submission_id", "A string identifier of the thread", "string"),
    ("id", "A string identifier of the comment", "string"),
    ("body", "The comment's content", "string"),
    ("edited", "A flag that specifies if the comment has been edited – contains a timestamp if it has", "string"),
    ("created_utc", "An epoch timestamp of when the comment was posted", "number"),
    ("link_id", "A string identifier of the thread", "string"),
    ("parent_id", "A string identifier of the parent comment", "string"),
    ("distinguished", "A flag that specifies if the comment was made by a moderator on duty", "string"),
    ("depth", "The overall depth of the comment tree", "number"),
    ("ups", "The score of a comment (ups-downs)", "number"),
    ("downs", "As of now, this column is always 0", "number"),
    ("score", "The score of a comment (ups-downs)", "number"),
    ("total_awards_received", "The number of awards received by a comment", "number"),
    ("gilded", "Whether the comment has been gilded", "boolean"),
    ("gildings", "The gildings received by a comment, if any", "string"),
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resource {
    /// Relative to the data directory.
    pub path: String,
    pub description: String,
    pub schema: Schema,
}

fn comment_schema() -> Schema {
    Schema {
        fields: COMMENT_SCHEMA
            .iter()
            .map(|(name, description, kind)| SchemaField {
                name: name.to_string(),
                description: description.to_string(),
                kind: kind.to_string(),
            })
            .collect(),
    }
}

/// One resource per comment file found under the data directory.
pub fn comment_resources(layout: &DataLayout) -> Vec<Resource> {
    layout
        .discover_comment_files()
        .into_iter()
        .map(|f| {
            let rel = f.path.strip_prefix(&layout.data_dir).unwrap_or(&f.path);
            Resource {
                path: rel.to_string_lossy().replace('\\', "/"),
                description: format!("Comments submitted to the {} thread", f.thread_id),
                schema: comment_schema(),
            }
        })
        .collect()
}

/// Appends the comment resources to `base`'s `resources` array and writes the result
/// to `<data_dir>/dataset-metadata.json`. Returns the written path.
pub fn prepare_metadata(base: &Path, layout: &DataLayout) -> Result<PathBuf> {
    let raw = std::fs::read_to_string(base).with_context(|| format!("read {}", base.display()))?;
    let mut doc: Value = serde_json::from_str(&raw).with_context(|| format!("parse {}", base.display()))?;

    let Some(obj) = doc.as_object_mut() else {
        bail!("{} is not a JSON object", base.display());
    };
    let resources = obj.entry("resources").or_insert_with(|| Value::Array(Vec::new()));
    let Some(list) = resources.as_array_mut() else {
        bail!("`resources` in {} is not an array", base.display());
    };
    for r in comment_resources(layout) {
        list.push(serde_json::to_value(r)?);
    }

    let dest = layout.metadata_path();
    let tmp = part_path(&dest);
    {
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = BufWriter::new(f);
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut w, fmt);
        doc.serialize(&mut ser)?;
        w.flush()?;
    }
    replace_file_atomic_backoff(&tmp, &dest)?;
    Ok(dest)
}

/// Version message for a dataset snapshot, e.g. `Update at October 18 2026 - 13:05:00`.
pub fn version_note(now: OffsetDateTime) -> Result<String> {
    let stamp = now
        .to_offset(time::UtcOffset::UTC)
        .format(format_description!("[month repr:long] [day] [year] - [hour]:[minute]:[second]"))?;
    Ok(format!("Update at {stamp}"))
}
