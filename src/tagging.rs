//! Tag writing for downloaded tracks.

use anyhow::{Context, Result};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{Picture, PictureType};
use lofty::prelude::Accessor;
use lofty::read_from_path;
use lofty::tag::Tag;
use std::path::Path;

use crate::models::CandidateTrack;

/// Write title, artist, album and (when given) the front cover into `path`.
pub fn write_tags(path: &Path, track: &CandidateTrack, cover: Option<Vec<u8>>) -> Result<()> {
    let mut tagged_file =
        read_from_path(path).with_context(|| format!("Failed to read tags: {:?}", path))?;

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .tag_mut(tag_type)
        .with_context(|| format!("No writable tag available for {:?}", tag_type))?;

    tag.set_title(track.display_name.clone());
    if !track.artists.is_empty() {
        tag.set_artist(track.artists.join(", "));
    }
    if let Some(album) = &track.album {
        tag.set_album(album.clone());
    }

    if let Some(bytes) = cover {
        let mut picture = Picture::from_reader(&mut bytes.as_slice())
            .context("Cover art is not a supported image")?;
        picture.set_pic_type(PictureType::CoverFront);
        tag.push_picture(picture);
    }

    tagged_file
        .save_to_path(path, WriteOptions::default())
        .with_context(|| format!("Failed to write tags: {:?}", path))?;
    Ok(())
}
