use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use triage_core::ScanError;

use super::ArchiveKind;
use crate::sniffer::is_ustar;

const TAR_BLOCK: usize = 512;
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// One entry as read from a container.
pub(crate) struct MemberEntry<'a> {
    pub name: String,
    /// Only regular files are extracted; directories and links are counted and skipped.
    pub is_file: bool,
    /// Size recorded in the container header, when the format has one.
    pub declared_size: Option<u64>,
    pub reader: &'a mut dyn Read,
}

pub(crate) enum Visit {
    Continue,
    Stop,
}

pub(crate) type Visitor<'v> = dyn FnMut(MemberEntry<'_>) -> Result<Visit, ScanError> + 'v;

/// Walk the members of a container in stored order.
pub(crate) fn visit_members(
    kind: ArchiveKind,
    path: &Path,
    container_name: &str,
    visitor: &mut Visitor<'_>,
) -> Result<(), ScanError> {
    let file = File::open(path)
        .map_err(|e| ScanError::ReadError(format!("cannot open container: {}", e)))?;
    let reader = BufReader::new(file);

    match kind {
        ArchiveKind::Zip => visit_zip(reader, visitor),
        ArchiveKind::Tar => visit_tar(reader, visitor),
        ArchiveKind::Gzip => visit_gzip(reader, container_name, visitor),
    }
}

fn corrupt(context: &str, err: impl std::fmt::Display) -> ScanError {
    ScanError::CorruptArchive(format!("{}: {}", context, err))
}

fn visit_zip(reader: BufReader<File>, visitor: &mut Visitor<'_>) -> Result<(), ScanError> {
    let mut archive =
        zip::ZipArchive::new(reader).map_err(|e| corrupt("unreadable zip directory", e))?;

    for index in 0..archive.len() {
        let mut member = archive
            .by_index(index)
            .map_err(|e| corrupt("unreadable zip entry", e))?;

        let is_link = member
            .unix_mode()
            .map(|mode| mode & S_IFMT == S_IFLNK)
            .unwrap_or(false);
        let name = member.name().to_string();
        let is_file = member.is_file() && !is_link;
        let declared_size = Some(member.size());

        let entry = MemberEntry {
            name,
            is_file,
            declared_size,
            reader: &mut member,
        };
        if let Visit::Stop = visitor(entry)? {
            break;
        }
    }
    Ok(())
}

fn visit_tar<R: Read>(reader: R, visitor: &mut Visitor<'_>) -> Result<(), ScanError> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| corrupt("unreadable tar stream", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| corrupt("unreadable tar entry", e))?;

        let header = entry.header();
        let is_file = header.entry_type().is_file();
        let declared_size = header.size().ok();
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

        let member = MemberEntry {
            name,
            is_file,
            declared_size,
            reader: &mut entry,
        };
        if let Visit::Stop = visitor(member)? {
            break;
        }
    }
    Ok(())
}

/// A gzip stream holds either a tar archive or one plain member.
fn visit_gzip(
    reader: BufReader<File>,
    container_name: &str,
    visitor: &mut Visitor<'_>,
) -> Result<(), ScanError> {
    let mut decoder = GzDecoder::new(reader);

    let mut head = Vec::with_capacity(TAR_BLOCK);
    (&mut decoder)
        .take(TAR_BLOCK as u64)
        .read_to_end(&mut head)
        .map_err(|e| corrupt("unreadable gzip stream", e))?;

    let looks_like_tar = is_ustar(&head);
    let mut stream = Cursor::new(head).chain(decoder);

    if looks_like_tar {
        tracing::debug!(container = %container_name, "gzip stream holds a tar archive");
        return visit_tar(stream, visitor);
    }

    let member = MemberEntry {
        name: gzip_member_name(container_name),
        is_file: true,
        declared_size: None,
        reader: &mut stream,
    };
    visitor(member)?;
    Ok(())
}

/// `photo.jpg.gz` holds `photo.jpg`; `bundle.tgz` holds `bundle.tar`.
fn gzip_member_name(container_name: &str) -> String {
    let base = container_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(container_name);
    let lower = base.to_ascii_lowercase();

    if lower.ends_with(".tgz") {
        format!("{}.tar", &base[..base.len() - 4])
    } else if lower.ends_with(".gz") && base.len() > 3 {
        base[..base.len() - 3].to_string()
    } else if lower.ends_with(".gzip") && base.len() > 5 {
        base[..base.len() - 5].to_string()
    } else {
        base.to_string()
    }
}
