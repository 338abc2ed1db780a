// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo descriptors and size hints.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A photo returned by search that has not been downloaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoCandidate {
    /// Catalog-wide unique photo ID (opaque)
    pub id: String,
    /// Server that hosts the image files
    pub source_server: String,
    /// Access secret required to build the download URL
    pub secret: String,
    pub title: String,
}

/// Requested image size, expressed as the Flickr URL suffix.
///
/// See <https://www.flickr.com/services/api/misc.urls.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoSize {
    Thumbnail75,
    Thumbnail150,
    Thumbnail100,
    Small240,
    Small320,
    Small400,
    Medium500,
    #[default]
    Medium640,
    Medium800,
    Large1024,
    Large1600,
    Large2048,
    ExtraLarge3k,
    ExtraLarge4k,
    ExtraLarge4k2to1,
    ExtraLarge5k,
    ExtraLarge6k,
    Original,
}

impl PhotoSize {
    const ALL: [PhotoSize; 18] = [
        PhotoSize::Thumbnail75,
        PhotoSize::Thumbnail150,
        PhotoSize::Thumbnail100,
        PhotoSize::Small240,
        PhotoSize::Small320,
        PhotoSize::Small400,
        PhotoSize::Medium500,
        PhotoSize::Medium640,
        PhotoSize::Medium800,
        PhotoSize::Large1024,
        PhotoSize::Large1600,
        PhotoSize::Large2048,
        PhotoSize::ExtraLarge3k,
        PhotoSize::ExtraLarge4k,
        PhotoSize::ExtraLarge4k2to1,
        PhotoSize::ExtraLarge5k,
        PhotoSize::ExtraLarge6k,
        PhotoSize::Original,
    ];

    /// Suffix appended to `{id}_{secret}` in the photo URL.
    pub fn suffix(self) -> &'static str {
        match self {
            PhotoSize::Thumbnail75 => "_s",
            PhotoSize::Thumbnail150 => "_q",
            PhotoSize::Thumbnail100 => "_t",
            PhotoSize::Small240 => "_m",
            PhotoSize::Small320 => "_n",
            PhotoSize::Small400 => "_w",
            PhotoSize::Medium500 => "",
            PhotoSize::Medium640 => "_z",
            PhotoSize::Medium800 => "_c",
            PhotoSize::Large1024 => "_b",
            PhotoSize::Large1600 => "_h",
            PhotoSize::Large2048 => "_k",
            PhotoSize::ExtraLarge3k => "_3k",
            PhotoSize::ExtraLarge4k => "_4k",
            PhotoSize::ExtraLarge4k2to1 => "_f",
            PhotoSize::ExtraLarge5k => "_5k",
            PhotoSize::ExtraLarge6k => "_6k",
            PhotoSize::Original => "_o",
        }
    }
}

impl FromStr for PhotoSize {
    type Err = String;

    /// Parse a size from its suffix letter, with or without the leading
    /// underscore. An empty string selects the 500px default size.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('_');
        Self::ALL
            .into_iter()
            .find(|size| size.suffix().trim_start_matches('_') == wanted)
            .ok_or_else(|| format!("unknown photo size suffix: {s:?}"))
    }
}

/// A downloaded photo attached to a trip entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripPhoto {
    pub id: String,
    pub title: String,
    pub image: Vec<u8>,
}
