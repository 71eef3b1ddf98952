use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use triage_core::{
    ArchiveManifest, ResolvedType, ScanError, ScanRequest, ScanTarget, SkipReason,
};

use super::formats::{self, MemberEntry, Visit};
use super::path::validate_member_name;
use super::{ArchiveKind, ExpansionLimits};
use crate::guard::ResourceGuard;
use crate::sniffer::TypeSniffer;

const COPY_BUFFER: usize = 64 * 1024;

/// Unpacks a container request into a bounded manifest of scan targets.
///
/// Expansion is synchronous; callers on an async runtime should run it on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct ArchiveExpander {
    limits: ExpansionLimits,
    sniffer: TypeSniffer,
}

/// Mutable state shared across the whole recursive walk of one request.
struct Expansion<'a> {
    guard: &'a ResourceGuard,
    cancel: &'a CancellationToken,
    deadline: Option<Instant>,
    manifest: ArchiveManifest,
    entries_seen: usize,
}

impl Expansion<'_> {
    fn truncate(&mut self, reason: &str) {
        if !self.manifest.truncated {
            tracing::warn!(
                reason,
                extracted_bytes = self.manifest.total_extracted_bytes,
                entries = self.entries_seen,
                "Archive expansion truncated"
            );
        }
        self.manifest.truncated = true;
    }
}

impl ArchiveExpander {
    pub fn new(limits: ExpansionLimits, sniffer: TypeSniffer) -> Self {
        Self { limits, sniffer }
    }

    pub fn limits(&self) -> &ExpansionLimits {
        &self.limits
    }

    /// Expand the request content, which must resolve to an expandable archive.
    ///
    /// The root archive sits at depth 1, so every target's `origin_depth`
    /// equals the length of its container chain. Reaching `deadline` stops
    /// the walk and returns what was extracted so far as a truncated manifest.
    pub fn expand(
        &self,
        request: &ScanRequest,
        root_type: &ResolvedType,
        guard: &ResourceGuard,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<ArchiveManifest, ScanError> {
        let kind = ArchiveKind::from_mime(&root_type.mime).ok_or_else(|| {
            ScanError::UnsupportedType(format!("{} cannot be expanded", root_type.mime))
        })?;

        let start = Instant::now();
        let mut state = Expansion {
            guard,
            cancel,
            deadline,
            manifest: ArchiveManifest::new(request.clone()),
            entries_seen: 0,
        };

        let chain = vec![request.claimed_name.clone()];
        self.expand_container(
            &request.source,
            kind,
            &request.claimed_name,
            &chain,
            1,
            &mut state,
        )?;

        let manifest = state.manifest;
        tracing::info!(
            request_id = %request.id,
            targets = manifest.ordered_targets.len(),
            extracted_bytes = manifest.total_extracted_bytes,
            truncated = manifest.truncated,
            rejected = manifest.rejected_members.len(),
            duration_ms = start.elapsed().as_millis(),
            "Archive expanded"
        );
        Ok(manifest)
    }

    fn expand_container(
        &self,
        path: &Path,
        kind: ArchiveKind,
        display_name: &str,
        chain: &[String],
        depth: u32,
        state: &mut Expansion<'_>,
    ) -> Result<(), ScanError> {
        tracing::debug!(
            container = %display_name,
            format = kind.as_str(),
            depth,
            "Expanding container"
        );
        formats::visit_members(kind, path, display_name, &mut |entry| {
            self.handle_member(entry, chain, depth, state)
        })
    }

    fn handle_member(
        &self,
        entry: MemberEntry<'_>,
        chain: &[String],
        depth: u32,
        state: &mut Expansion<'_>,
    ) -> Result<Visit, ScanError> {
        if state.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        if state.manifest.truncated {
            return Ok(Visit::Stop);
        }
        if state.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            state.truncate("request deadline reached");
            return Ok(Visit::Stop);
        }

        state.entries_seen += 1;
        if state.entries_seen > self.limits.max_entries {
            state.truncate("entry count cap reached");
            return Ok(Visit::Stop);
        }

        if !entry.is_file {
            return Ok(Visit::Continue);
        }

        let name = match validate_member_name(&entry.name) {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(
                    container = chain.last().map(String::as_str).unwrap_or_default(),
                    error = %err,
                    "Rejected archive member"
                );
                state.manifest.rejected_members.push(entry.name);
                return Ok(Visit::Continue);
            }
        };

        let remaining = self
            .limits
            .max_extracted_bytes
            .saturating_sub(state.manifest.total_extracted_bytes);
        if let Some(declared) = entry.declared_size {
            if declared > remaining {
                state.truncate("declared member size exceeds remaining budget");
                return Ok(Visit::Stop);
            }
        }

        let (mut file, lease) = state.guard.create_file(&name)?;
        let written = copy_bounded(entry.reader, &mut file, remaining.saturating_add(1))?;
        drop(file);
        if written > remaining {
            state.truncate("extracted size cap reached");
            return Ok(Visit::Stop);
        }
        state.manifest.total_extracted_bytes += written;

        let path = lease.path().to_path_buf();
        let member_chain = chain.to_vec();

        match self.sniffer.resolve_path(&path, &name) {
            Ok(resolved) if resolved.is_archive() => match ArchiveKind::from_mime(&resolved.mime) {
                Some(kind) if depth < self.limits.max_depth => {
                    let mut nested_chain = member_chain;
                    nested_chain.push(name.clone());
                    self.expand_container(&path, kind, &name, &nested_chain, depth + 1, state)?;
                    if state.manifest.truncated {
                        return Ok(Visit::Stop);
                    }
                }
                Some(_) => {
                    tracing::debug!(member = %name, depth, "Container beyond maximum depth");
                    state.manifest.ordered_targets.push(ScanTarget::skipped(
                        path,
                        name,
                        Some(resolved),
                        member_chain,
                        written,
                        SkipReason::DepthExceeded,
                    ));
                }
                None => {
                    state.manifest.ordered_targets.push(ScanTarget::skipped(
                        path,
                        name,
                        Some(resolved),
                        member_chain,
                        written,
                        SkipReason::UnsupportedContainer,
                    ));
                }
            },
            Ok(resolved) => {
                state.manifest.ordered_targets.push(ScanTarget::resolved(
                    path,
                    name,
                    resolved,
                    member_chain,
                    written,
                ));
            }
            Err(ScanError::UnsupportedType(_)) | Err(ScanError::ReadError(_)) => {
                state.manifest.ordered_targets.push(ScanTarget::skipped(
                    path,
                    name,
                    None,
                    member_chain,
                    written,
                    SkipReason::UnknownType,
                ));
            }
            Err(err) => return Err(err),
        }

        Ok(Visit::Continue)
    }
}

/// Copy at most `limit` bytes. Returns the number of bytes written.
fn copy_bounded(reader: &mut dyn Read, writer: &mut File, limit: u64) -> Result<u64, ScanError> {
    let mut buffer = vec![0u8; COPY_BUFFER];
    let mut total = 0u64;

    while total < limit {
        let want = (limit - total).min(COPY_BUFFER as u64) as usize;
        let read = match reader.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ScanError::CorruptArchive(format!(
                    "failed to decompress member: {}",
                    e
                )))
            }
        };
        writer
            .write_all(&buffer[..read])
            .map_err(|e| ScanError::Internal(format!("Failed to write extracted member: {}", e)))?;
        total += read as u64;
    }

    Ok(total)
}
