//! Text ⇄ structure conversion of media playlists, and manifest files on disk.
//!
//! Only single-variant media playlists are handled. Playlist-level fields are
//! carried through untouched, callers only ever replace the segment list.

use std::{io::Write, path::Path};

use m3u8_rs::{MediaPlaylist, Playlist};
use miette::{miette, Context, IntoDiagnostic};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::result::{Error, Result};

/// Parse the text of a media playlist
pub fn decode(text: &[u8]) -> Result<MediaPlaylist> {
    match m3u8_rs::parse_playlist_res(text) {
        Ok(Playlist::MediaPlaylist(playlist)) => Ok(playlist),
        Ok(Playlist::MasterPlaylist(_)) => Err(miette!(
            "Master playlists are not supported, give the media playlist of one variant"
        )
        .into()),
        Err(err) => Err(miette!("Invalid playlist: {err:?}").into()),
    }
}

/// Serialize a media playlist to text
pub fn encode(playlist: &MediaPlaylist) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    playlist
        .write_to(&mut buf)
        .into_diagnostic()
        .wrap_err("Could not serialize playlist")?;
    Ok(buf)
}

/// Read and parse the media playlist at `path`.
///
/// Every failure is reported as [`Error::ManifestIo`].
pub fn read(path: &Path) -> Result<MediaPlaylist> {
    let read = || -> Result<MediaPlaylist> {
        let text = std::fs::read(path)
            .into_diagnostic()
            .wrap_err("Could not read manifest")?;
        decode(&text)
    };

    let playlist = read().map_err(|err| err.into_manifest_io(path))?;
    debug!(
        "Read manifest {} ({} segments)",
        path.display(),
        playlist.segments.len()
    );
    Ok(playlist)
}

/// Serialize `playlist` and replace the file at `path` with it.
///
/// The text goes to a temporary file in the same directory first, which is
/// then moved over the destination, so readers never see a partial manifest.
pub fn write(path: &Path, playlist: &MediaPlaylist) -> Result<()> {
    let write = || -> Result<()> {
        let text = encode(playlist)?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .into_diagnostic()
            .wrap_err("Could not create temporary manifest")?;
        tmp.write_all(&text)
            .into_diagnostic()
            .wrap_err("Could not write temporary manifest")?;
        tmp.persist(path)
            .map_err(|err| err.error)
            .into_diagnostic()
            .wrap_err("Could not replace manifest")?;
        Ok(())
    };

    write().map_err(|err: Error| err.into_manifest_io(path))?;
    debug!(
        "Wrote manifest {} ({} segments)",
        path.display(),
        playlist.segments.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOD: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:2
#EXT-X-MEDIA-SEQUENCE:0
#EXTINF:2.000000,
seg0.ts
#EXTINF:1.500000,
seg1.ts
#EXT-X-ENDLIST
";

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=1280x720
720p.m3u8
";

    #[test]
    fn decodes_media_playlist() {
        let playlist = decode(VOD.as_bytes()).unwrap();
        assert_eq!(playlist.segments.len(), 2);
        assert_eq!(playlist.segments[1].uri, "seg1.ts");
        assert!(playlist.end_list);
    }

    #[test]
    fn rejects_master_playlist() {
        assert!(decode(MASTER.as_bytes()).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode(b"this is not a playlist").is_err());
    }

    #[test]
    fn keeps_playlist_fields_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.m3u8");
        std::fs::write(&path, VOD).unwrap();

        let playlist = read(&path).unwrap();
        write(&path, &playlist).unwrap();
        let reread = read(&path).unwrap();

        assert_eq!(reread, playlist);
    }

    #[test]
    fn missing_file_is_a_manifest_error() {
        let err = read(Path::new("/no/such/index.m3u8")).unwrap_err();
        assert!(matches!(err, Error::ManifestIo { .. }));
    }
}
