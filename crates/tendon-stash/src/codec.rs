//! Binary encode/decode for migrated spring records.
//!
//! All values are little-endian with no padding. One record is
//!
//! ```text
//! [type id: u32][count: u32][count × {partner: u32, stiffness: f64, rest: f64, kernel: u32}]
//! ```

use std::io::{self, Read, Write};

use tendon_core::{KernelId, NativeIndex, SpringConnection, SpringSpec, StashError, StashTypeId};

/// Bytes before the first connection: type tag and count.
pub const RECORD_HEADER_LEN: usize = 8;

/// Bytes per encoded connection.
pub const CONNECTION_LEN: usize = 24;

// Upper bound on up-front allocation for a decoded count; larger records
// still decode, the vector just grows as connections arrive.
const MAX_PREALLOC: usize = 1024;

// ── Primitive writers ───────────────────────────────────────────

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), StashError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), StashError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

fn read_exact(r: &mut dyn Read, buf: &mut [u8], context: &'static str) -> Result<(), StashError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => StashError::Truncated { context },
        _ => StashError::Io(e),
    })
}

fn read_u32_le(r: &mut dyn Read, context: &'static str) -> Result<u32, StashError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf, context)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64_le(r: &mut dyn Read, context: &'static str) -> Result<f64, StashError> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf, context)?;
    Ok(f64::from_le_bytes(buf))
}

// ── Record encode/decode ────────────────────────────────────────

/// Exact encoded size of `spec`.
pub fn packed_len(spec: &SpringSpec) -> usize {
    RECORD_HEADER_LEN + spec.len() * CONNECTION_LEN
}

/// Encode `spec` as one record tagged with `type_id`.
pub fn pack(spec: &SpringSpec, type_id: StashTypeId, w: &mut dyn Write) -> Result<(), StashError> {
    let count = u32::try_from(spec.len()).map_err(|_| {
        StashError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} connections exceed the record count field", spec.len()),
        ))
    })?;

    write_u32_le(w, type_id.0)?;
    write_u32_le(w, count)?;
    for conn in spec.connections() {
        write_u32_le(w, conn.partner.0)?;
        write_f64_le(w, conn.stiffness)?;
        write_f64_le(w, conn.rest_length)?;
        write_u32_le(w, conn.kernel.0)?;
    }
    Ok(())
}

/// Read the type tag that opens a record.
pub fn read_type_tag(r: &mut dyn Read) -> Result<StashTypeId, StashError> {
    read_u32_le(r, "type tag").map(StashTypeId)
}

/// Read the remainder of a record whose type tag has already been consumed,
/// shifting every partner index by `offset`.
///
/// The whole record is consumed before offsets are applied, so an
/// [`StashError::IndexOutOfRange`] still leaves the stream at the next
/// record boundary.
pub fn read_body(r: &mut dyn Read, offset: i64) -> Result<SpringSpec, StashError> {
    let count = read_u32_le(r, "connection count")? as usize;
    let mut raw = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        raw.push(SpringConnection {
            partner: NativeIndex(read_u32_le(r, "partner index")?),
            stiffness: read_f64_le(r, "stiffness")?,
            rest_length: read_f64_le(r, "rest length")?,
            kernel: KernelId(read_u32_le(r, "kernel id")?),
        });
    }

    raw.into_iter()
        .map(|conn| {
            conn.partner
                .checked_offset(offset)
                .map(|partner| SpringConnection { partner, ..conn })
                .ok_or(StashError::IndexOutOfRange {
                    stored: conn.partner,
                    offset,
                })
        })
        .collect()
}

/// Discard the remainder of a record whose type tag has already been
/// consumed, leaving the stream at the next record boundary.
pub fn skip_body(r: &mut dyn Read) -> Result<(), StashError> {
    let count = u64::from(read_u32_le(r, "connection count")?);
    let len = count * CONNECTION_LEN as u64;
    let skipped = io::copy(&mut Read::take(&mut *r, len), &mut io::sink())?;
    if skipped < len {
        return Err(StashError::Truncated {
            context: "skipped record body",
        });
    }
    Ok(())
}
