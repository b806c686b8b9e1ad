//! Defensive field extraction from raw indexer records.
//!
//! Indexers on different chains describe the same artwork with overlapping,
//! optional keys. [`RawRecord`] wraps the untyped JSON bag and exposes one
//! extraction function per concern. Every priority list lives in a constant
//! next to the function that uses it.

use artforged_common::{ArtworkId, Attribute, Chain, Dimensions, MediaRole};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::mintdate::parse_date;

const ID_KEYS: &[&str] = &["id"];
const FALLBACK_ID_KEYS: &[&str] = &["identifier"];
const CONTRACT_KEYS: &[&str] = &[
    "contract",
    "contract_address",
    "fa_contract",
    "contract.address",
    "asset_contract.address",
    "fa.contract",
];
const TOKEN_KEYS: &[&str] = &["token_id", "tokenId", "identifier"];
const NAME_KEYS: &[&str] = &["name", "title"];

/// Tezos priority: display > artifact > image.
const IMAGE_KEYS: &[&str] = &["display_uri", "artifact_uri", "image_url", "image"];
const ANIMATION_KEYS: &[&str] = &["animation_url", "animation_original_url"];
const GENERATOR_KEYS: &[&str] = &["generator_url", "generator_uri"];
const THUMBNAIL_KEYS: &[&str] = &["thumbnail_uri", "thumbnail_url"];
const METADATA_URL_KEYS: &[&str] = &["metadata_url", "token_uri", "metadata"];

const IMAGE_MIME_KEYS: &[&str] = &["image_mime_type", "image_mime", "display_mime_type"];
const ANIMATION_MIME_KEYS: &[&str] = &["animation_mime_type", "animation_mime"];
const GENERATOR_MIME_KEYS: &[&str] = &["generator_mime_type", "generator_mime"];
const THUMBNAIL_MIME_KEYS: &[&str] = &["thumbnail_mime_type", "thumbnail_mime"];
const TOP_LEVEL_MIME_KEYS: &[&str] = &["mime", "mime_type", "mimeType"];

/// Containers that hold role-keyed structural hints.
const HINT_CONTAINERS: &[&str] = &["dimensions", "media"];
const HINT_MIME_KEYS: &[&str] = &["mime", "mime_type", "mimeType", "type"];

const DATE_KEYS: &[&str] = &[
    "mint_date",
    "minted_at",
    "first_minted_at",
    "timestamp",
    "created_date",
    "created_at",
    "date",
];
const CONTRACT_DATE_KEYS: &[&str] = &[
    "contract_created_at",
    "contract.created_date",
    "collection.created_date",
    "asset_contract.created_date",
];

/// A raw NFT record as delivered by an indexer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord(Value);

/// Role-keyed nested hint: `dimensions.artifact = { mime, width, height }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralHint {
    pub mime: Option<String>,
    pub dimensions: Option<Dimensions>,
}

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a possibly dotted key (`asset_contract.address`).
    fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.0, key)
    }

    /// First key whose value is a non-empty string or a number.
    fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.get(k).and_then(as_text))
    }

    /// First key present, with the key that matched.
    fn text_with_key(&self, keys: &[&'static str]) -> Option<(&'static str, String)> {
        keys.iter()
            .find_map(|k| self.get(k).and_then(as_text).map(|v| (*k, v)))
    }

    /// Stable identifier: explicit `id`, else `chain:contract:token`.
    pub fn artwork_id(&self, chain: Chain) -> Option<ArtworkId> {
        if let Some(id) = self.text(ID_KEYS) {
            return Some(ArtworkId::new(id));
        }
        if let (Some(contract), Some(token)) = (self.contract_address(), self.token_id()) {
            return Some(ArtworkId::from_parts(chain, &contract, &token));
        }
        self.text(FALLBACK_ID_KEYS).map(ArtworkId::new)
    }

    pub fn contract_address(&self) -> Option<String> {
        self.text(CONTRACT_KEYS)
    }

    pub fn token_id(&self) -> Option<String> {
        self.text(TOKEN_KEYS)
    }

    pub fn name(&self) -> Option<String> {
        self.text(NAME_KEYS)
    }

    pub fn image_url(&self) -> Option<String> {
        self.text(IMAGE_KEYS)
    }

    /// Explicit animation URL, else a Tezos artifact that is not the image and
    /// is declared as non-image media.
    pub fn animation_url(&self) -> Option<String> {
        if let Some(url) = self.text(ANIMATION_KEYS) {
            return Some(url);
        }
        let artifact = self.text(&["artifact_uri"])?;
        let top_mime = self.text(TOP_LEVEL_MIME_KEYS)?;
        let differs = self.image_url().is_some_and(|image| image != artifact);
        (differs && !top_mime.trim().to_ascii_lowercase().starts_with("image/")).then_some(artifact)
    }

    pub fn generator_url(&self) -> Option<String> {
        self.text(GENERATOR_KEYS)
    }

    pub fn thumbnail_url(&self) -> Option<String> {
        self.text(THUMBNAIL_KEYS)
    }

    /// URL of an off-record metadata document (`metadata` only when a string).
    pub fn metadata_url(&self) -> Option<String> {
        self.text(METADATA_URL_KEYS)
    }

    /// Inline metadata document, when `metadata` is an object.
    pub fn inline_metadata(&self) -> Option<&Map<String, Value>> {
        self.get("metadata").and_then(Value::as_object)
    }

    /// URL for a media role.
    pub fn role_url(&self, role: MediaRole) -> Option<String> {
        match role {
            MediaRole::Image => self.image_url(),
            MediaRole::Animation => self.animation_url(),
            MediaRole::Generator => self.generator_url(),
            MediaRole::Thumbnail => self.thumbnail_url(),
        }
    }

    /// Whether no media role has a URL yet.
    pub fn lacks_media(&self) -> bool {
        MediaRole::ALL.iter().all(|role| self.role_url(*role).is_none())
    }

    /// Role the record's top-level `mime`/`width`/`height` describe.
    fn primary_role(&self) -> MediaRole {
        if self.animation_url().is_some() {
            MediaRole::Animation
        } else {
            MediaRole::Image
        }
    }

    /// Whether the image URL is the artifact itself rather than a separate
    /// display rendition.
    fn image_is_artifact(&self) -> bool {
        match self.text_with_key(IMAGE_KEYS) {
            Some(("display_uri", display)) => self
                .text(&["artifact_uri"])
                .map_or(true, |artifact| artifact == display),
            Some(_) => true,
            None => false,
        }
    }

    /// Whether top-level media fields apply to this role.
    fn top_level_applies(&self, role: MediaRole) -> bool {
        role == self.primary_role() && (role != MediaRole::Image || self.image_is_artifact())
    }

    /// Tezos `formats[]` entry whose `uri` matches the role URL.
    fn format_entry(&self, role: MediaRole) -> Option<&Map<String, Value>> {
        let url = self.role_url(role)?;
        self.get("formats")?
            .as_array()?
            .iter()
            .filter_map(Value::as_object)
            .find(|entry| entry.get("uri").and_then(Value::as_str) == Some(url.as_str()))
    }

    /// Declared MIME for a role, unvalidated.
    ///
    /// Role-specific keys, then the matching `formats[]` entry, then the
    /// top-level `mime` when it describes this role.
    pub fn declared_mime(&self, role: MediaRole) -> Option<String> {
        let role_keys = match role {
            MediaRole::Image => IMAGE_MIME_KEYS,
            MediaRole::Animation => ANIMATION_MIME_KEYS,
            MediaRole::Generator => GENERATOR_MIME_KEYS,
            MediaRole::Thumbnail => THUMBNAIL_MIME_KEYS,
        };
        self.text(role_keys)
            .or_else(|| {
                self.format_entry(role)
                    .and_then(|entry| first_text(entry, &["mimeType", "mime_type", "mime"]))
            })
            .or_else(|| {
                self.top_level_applies(role)
                    .then(|| self.text(TOP_LEVEL_MIME_KEYS))
                    .flatten()
            })
    }

    /// Hint precedence per role.
    fn hint_keys(&self, role: MediaRole) -> &'static [&'static str] {
        match role {
            MediaRole::Thumbnail => &["thumbnail"],
            MediaRole::Animation | MediaRole::Generator => &["artifact"],
            MediaRole::Image if self.image_is_artifact() => &["artifact", "display", "thumbnail"],
            MediaRole::Image => &["display", "thumbnail"],
        }
    }

    /// Structural hint for a role: the highest-priority nested entry that has
    /// a MIME, and independently the highest-priority one with dimensions.
    pub fn structural_hint(&self, role: MediaRole) -> StructuralHint {
        let entries: Vec<&Map<String, Value>> = self
            .hint_keys(role)
            .iter()
            .flat_map(|key| {
                HINT_CONTAINERS
                    .iter()
                    .filter_map(move |container| self.get(container)?.get(key)?.as_object())
            })
            .collect();

        StructuralHint {
            mime: entries.iter().find_map(|e| first_text(e, HINT_MIME_KEYS)),
            dimensions: entries.iter().find_map(|e| object_dimensions(e)),
        }
    }

    /// Declared dimensions for a role: structural hint, then the matching
    /// `formats[]` entry, then top-level `width`/`height`.
    pub fn declared_dimensions(&self, role: MediaRole) -> Option<Dimensions> {
        self.structural_hint(role)
            .dimensions
            .or_else(|| {
                self.format_entry(role)
                    .and_then(|entry| entry.get("dimensions"))
                    .and_then(value_dimensions)
            })
            .or_else(|| {
                self.top_level_applies(role)
                    .then(|| self.0.as_object().and_then(object_dimensions))
                    .flatten()
            })
    }

    /// Attribute entries as `(key, value, display_type)`, accepting arrays of
    /// `{trait_type|key|name, value}` (optionally nested under `attribute`)
    /// and plain key/value objects.
    fn attribute_entries(&self) -> Vec<(String, &Value, Option<String>)> {
        let Some(attrs) = self.get("attributes").or_else(|| self.get("traits")) else {
            return Vec::new();
        };

        match attrs {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|item| {
                    let item = item
                        .get("attribute")
                        .and_then(Value::as_object)
                        .unwrap_or(item);
                    let key = first_text(item, &["trait_type", "key", "name"])?;
                    let value = item.get("value")?;
                    let display = first_text(item, &["display_type"]);
                    Some((key, value, display))
                })
                .collect(),
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v, None)).collect(),
            _ => Vec::new(),
        }
    }

    /// Dimensions from attributes whose key mentions width, height or dimension.
    pub fn attribute_dimensions(&self) -> Option<Dimensions> {
        let mut width = None;
        let mut height = None;

        for (key, value, _) in self.attribute_entries() {
            let key = key.to_ascii_lowercase();
            if key.contains("dimension") || key == "size" || key == "resolution" {
                if let Some(dims) = as_text(value).as_deref().and_then(Dimensions::parse) {
                    return Some(dims);
                }
            } else if key.contains("width") {
                width = width.or_else(|| as_number(value));
            } else if key.contains("height") {
                height = height.or_else(|| as_number(value));
            }
        }

        Dimensions::new(width?, height?)
    }

    /// Descriptive attributes, values normalised to strings, capped at `limit`.
    pub fn attributes(&self, limit: usize) -> Vec<Attribute> {
        self.attribute_entries()
            .into_iter()
            .filter(|(key, _, _)| !key.trim().is_empty())
            .filter_map(|(key, value, display_type)| {
                let value = match value {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    Value::Array(_) | Value::Object(_) => value.to_string(),
                    other => other.to_string(),
                };
                Some(Attribute {
                    trait_type: key.trim().to_string(),
                    value,
                    display_type,
                })
            })
            .take(limit)
            .collect()
    }

    /// Creator addresses or names, deduplicated in first-seen order.
    pub fn creators(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();

        if let Some(list) = self.get("creators").and_then(Value::as_array) {
            for entry in list {
                dedup_push(&mut out, creator_name(entry));
            }
        }
        if out.is_empty() {
            if let Some(creator) = self.get("creator") {
                dedup_push(&mut out, creator_name(creator));
            }
        }
        out
    }

    /// Date-like raw fields in trust order, as strings.
    pub fn raw_date_fields(&self) -> Vec<String> {
        DATE_KEYS
            .iter()
            .filter_map(|k| self.get(k).and_then(as_text))
            .collect()
    }

    /// Creation date of the contract or collection, if recorded.
    pub fn contract_created_at(&self) -> Option<DateTime<Utc>> {
        CONTRACT_DATE_KEYS
            .iter()
            .filter_map(|k| self.get(k).and_then(as_text))
            .find_map(|s| parse_date(&s))
    }

    /// Fill missing top-level fields from a metadata document. Present,
    /// non-empty fields are never overwritten.
    pub fn merge_metadata(&mut self, doc: &Value) {
        let Some(doc) = doc.as_object() else {
            return;
        };
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        let Some(target) = self.0.as_object_mut() else {
            return;
        };
        for (key, value) in doc {
            let missing = match target.get(key) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(Value::Array(a)) => a.is_empty(),
                _ => false,
            };
            if missing && !value.is_null() {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(v) = value.get(key) {
        return Some(v);
    }
    if !key.contains('.') {
        return None;
    }
    key.split('.').try_fold(value, |v, part| v.get(part))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches("px").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 1.0 && n <= f64::from(u32::MAX)).then(|| n.round() as u32)
}

fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| map.get(*k).and_then(as_text))
}

/// `{width, height}` or `{value: "WxH"}`.
fn object_dimensions(map: &Map<String, Value>) -> Option<Dimensions> {
    let width = map.get("width").and_then(as_number);
    let height = map.get("height").and_then(as_number);
    if let (Some(w), Some(h)) = (width, height) {
        return Dimensions::new(w, h);
    }
    map.get("value")
        .and_then(as_text)
        .as_deref()
        .and_then(Dimensions::parse)
}

fn value_dimensions(value: &Value) -> Option<Dimensions> {
    match value {
        Value::Object(map) => object_dimensions(map),
        Value::String(s) => Dimensions::parse(s),
        _ => None,
    }
}

fn dedup_push(out: &mut Vec<String>, candidate: Option<String>) {
    if let Some(c) = candidate {
        if !out.contains(&c) {
            out.push(c);
        }
    }
}

fn creator_name(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => as_text(value),
        Value::Object(map) => first_text(map, &["address", "creator_address", "alias", "name"])
            .or_else(|| {
                ["holder", "user", "account"]
                    .iter()
                    .find_map(|k| map.get(*k))
                    .and_then(creator_name)
            }),
        _ => None,
    }
}
