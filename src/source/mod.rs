//! Reel items and where they come from.
//!
//! The coordinator never looks inside a [`ReelItem`]; it only needs the
//! count and the order. Items are fetched once and indexed `0..N`.

#[cfg(feature = "http")]
pub mod http;
pub mod json;
pub mod window;

#[cfg(feature = "http")]
pub use http::{HttpReelSource, RetryPolicy};
pub use json::JsonFileSource;
pub use window::ReelWindow;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Product tagged on a reel (carried for the UI, never interpreted here)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "opt_price")]
    pub price: Option<f64>,
    /// `imageUrl`, or the storefront's `image` (string or `{ url }`)
    #[serde(default, alias = "image", deserialize_with = "opt_image_url")]
    pub image_url: Option<String>,
}

/// One reel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireReel")]
pub struct ReelItem {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub preview_animation_url: Option<String>,
    pub product: Option<Product>,
    /// Soft-deleted media still present in the payload
    #[serde(skip_serializing)]
    pub is_deleted: bool,
}

/// Accepted item shapes: the widget API's reel with its media document
/// populated under `mediaId`, or a flat item (fixtures, exports).
#[derive(Deserialize)]
#[serde(untagged)]
enum WireReel {
    Widget(WidgetReel),
    Flat(FlatReel),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetReel {
    #[serde(rename = "_id", alias = "id", deserialize_with = "string_or_number")]
    id: String,
    media_id: MediaDoc,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaDoc {
    url: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    preview_animation_url: Option<String>,
    #[serde(default, rename = "productJSON")]
    product: Option<Product>,
    #[serde(default)]
    is_deleted: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatReel {
    #[serde(alias = "_id", deserialize_with = "string_or_number")]
    id: String,
    #[serde(alias = "url")]
    video_url: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    preview_animation_url: Option<String>,
    #[serde(default)]
    product: Option<Product>,
    #[serde(default)]
    is_deleted: bool,
}

impl From<WireReel> for ReelItem {
    fn from(wire: WireReel) -> Self {
        match wire {
            WireReel::Widget(WidgetReel { id, media_id: m }) => Self {
                id,
                video_url: m.url,
                thumbnail_url: m.thumbnail_url,
                preview_animation_url: m.preview_animation_url,
                product: m.product,
                is_deleted: m.is_deleted,
            },
            WireReel::Flat(f) => Self {
                id: f.id,
                video_url: f.video_url,
                thumbnail_url: f.thumbnail_url,
                preview_animation_url: f.preview_animation_url,
                product: f.product,
                is_deleted: f.is_deleted,
            },
        }
    }
}

/// Ordered reel list provider (REST endpoint, file, fixture).
pub trait ReelSource {
    fn fetch(&self) -> Result<Vec<ReelItem>>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Accepted payload shapes: `{ "data": [...] }`, `{ "reels": [...] }`, `[...]`
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Data { data: Vec<ReelItem> },
    Reels { reels: Vec<ReelItem> },
    Bare(Vec<ReelItem>),
}

/// Parse a reel payload and drop soft-deleted entries.
pub fn parse_reels(raw: &str) -> Result<Vec<ReelItem>> {
    let payload: Payload = serde_json::from_str(raw).context("Invalid reel payload")?;
    let items = match payload {
        Payload::Data { data } => data,
        Payload::Reels { reels } => reels,
        Payload::Bare(items) => items,
    };
    let total = items.len();
    let live: Vec<ReelItem> = items.into_iter().filter(|i| !i.is_deleted).collect();
    if live.len() != total {
        log::debug!("Dropped {} deleted reels", total - live.len());
    }
    Ok(live)
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected id, got {}", other))),
    }
}

fn opt_image_url<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(d)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Object(obj)) => {
            obj.get("url").and_then(|u| u.as_str()).map(str::to_string)
        }
        _ => None,
    })
}

fn opt_price<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    match Option::<serde_json::Value>::deserialize(d)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("bad price: {}", s))),
        Some(other) => Err(serde::de::Error::custom(format!("bad price: {}", other))),
    }
}
