//! Factories that rebuild migrated records on the receiving process.

use std::any::Any;
use std::io::{Read, Write};

use tendon_core::{ConfigError, SpringSpec, StashError, StashTypeId};
use tracing::trace;

use crate::codec;

// ── Traits ─────────────────────────────────────────────────────────

/// A per-node record that can travel with its node during migration.
pub trait Stashable: Any {
    /// Exact number of bytes [`pack`](Stashable::pack) writes.
    fn packed_len(&self) -> usize;

    /// Encode one record tagged with `type_id`.
    fn pack(&self, type_id: StashTypeId, w: &mut dyn Write) -> Result<(), StashError>;

    /// Upcast for downcasting to the concrete record type.
    fn as_any(&self) -> &dyn Any;
}

impl Stashable for SpringSpec {
    fn packed_len(&self) -> usize {
        codec::packed_len(self)
    }

    fn pack(&self, type_id: StashTypeId, w: &mut dyn Write) -> Result<(), StashError> {
        codec::pack(self, type_id, w)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Rebuilds one kind of [`Stashable`] from a stream.
///
/// Object-safe, so a migration driver can hold factories for several record
/// kinds side by side.
pub trait StashFactory {
    /// The type id this factory accepts, once configured.
    fn stash_type(&self) -> Option<StashTypeId>;

    /// Assign the type id. Setting the same id again is a no-op; a different
    /// id is a [`ConfigError::StashTypeConflict`].
    fn set_stash_type(&mut self, id: StashTypeId) -> Result<(), ConfigError>;

    /// Read one record, shifting embedded native indices by `offset`.
    fn unpack_boxed(
        &self,
        r: &mut dyn Read,
        offset: i64,
    ) -> Result<Box<dyn Stashable>, StashError>;
}

// ── SpringSpecFactory ──────────────────────────────────────────────

/// Rebuilds [`SpringSpec`]s from migration records.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use tendon_core::{NativeIndex, SpringConnection, SpringSpec, StashTypeId};
/// use tendon_stash::{pack, SpringSpecFactory};
///
/// let spec: SpringSpec = [SpringConnection::linear(NativeIndex(2), 1.0, 0.5)]
///     .into_iter()
///     .collect();
/// let mut buf = Vec::new();
/// pack(&spec, StashTypeId(3), &mut buf).unwrap();
///
/// let mut factory = SpringSpecFactory::new();
/// factory.set_stash_type(StashTypeId(3)).unwrap();
/// let moved = factory.unpack(&mut Cursor::new(buf), 10).unwrap();
/// assert_eq!(moved.connections()[0].partner, NativeIndex(12));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SpringSpecFactory {
    type_id: Option<StashTypeId>,
}

impl SpringSpecFactory {
    /// An unconfigured factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory already configured with `id`.
    pub fn with_stash_type(id: StashTypeId) -> Self {
        Self { type_id: Some(id) }
    }

    /// The configured type id.
    pub fn stash_type(&self) -> Option<StashTypeId> {
        self.type_id
    }

    /// Assign the type id exactly once.
    pub fn set_stash_type(&mut self, id: StashTypeId) -> Result<(), ConfigError> {
        match self.type_id {
            None => {
                self.type_id = Some(id);
                Ok(())
            }
            Some(existing) if existing == id => Ok(()),
            Some(existing) => Err(ConfigError::StashTypeConflict {
                existing,
                requested: id,
            }),
        }
    }

    /// Read exactly one record from `r` and rebuild its [`SpringSpec`],
    /// adding `offset` to every partner native index.
    ///
    /// A record with a foreign type tag is skipped whole and reported as
    /// [`StashError::TypeMismatch`], so the next call starts at the
    /// following record.
    pub fn unpack(&self, r: &mut dyn Read, offset: i64) -> Result<SpringSpec, StashError> {
        let expected = self.type_id.ok_or(StashError::Unconfigured)?;
        let found = codec::read_type_tag(r)?;
        if found != expected {
            codec::skip_body(r)?;
            return Err(StashError::TypeMismatch { expected, found });
        }
        let spec = codec::read_body(r, offset)?;
        trace!(type_id = %expected, connections = spec.len(), offset, "unpacked spring spec");
        Ok(spec)
    }
}

impl StashFactory for SpringSpecFactory {
    fn stash_type(&self) -> Option<StashTypeId> {
        self.type_id
    }

    fn set_stash_type(&mut self, id: StashTypeId) -> Result<(), ConfigError> {
        SpringSpecFactory::set_stash_type(self, id)
    }

    fn unpack_boxed(
        &self,
        r: &mut dyn Read,
        offset: i64,
    ) -> Result<Box<dyn Stashable>, StashError> {
        Ok(Box::new(self.unpack(r, offset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tendon_core::{NativeIndex, SpringConnection};

    fn packed(spec: &SpringSpec, id: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        spec.pack(StashTypeId(id), &mut buf).unwrap();
        buf
    }

    fn one() -> SpringSpec {
        [SpringConnection::linear(NativeIndex(1), 3.0, 0.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn unconfigured_factory_refuses() {
        let factory = SpringSpecFactory::new();
        let err = factory
            .unpack(&mut Cursor::new(packed(&one(), 0)), 0)
            .unwrap_err();
        assert!(matches!(err, StashError::Unconfigured));
    }

    #[test]
    fn set_stash_type_once() {
        let mut factory = SpringSpecFactory::new();
        factory.set_stash_type(StashTypeId(4)).unwrap();
        factory.set_stash_type(StashTypeId(4)).unwrap();
        let err = factory.set_stash_type(StashTypeId(5)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::StashTypeConflict {
                existing: StashTypeId(4),
                requested: StashTypeId(5),
            }
        );
        assert_eq!(factory.stash_type(), Some(StashTypeId(4)));
    }

    #[test]
    fn mismatched_tag_rejected() {
        let factory = SpringSpecFactory::with_stash_type(StashTypeId(1));
        let err = factory
            .unpack(&mut Cursor::new(packed(&one(), 2)), 0)
            .unwrap_err();
        assert!(matches!(
            err,
            StashError::TypeMismatch {
                expected: StashTypeId(1),
                found: StashTypeId(2)
            }
        ));
    }

    #[test]
    fn mismatched_record_is_consumed() {
        let factory = SpringSpecFactory::with_stash_type(StashTypeId(1));
        let mut buf = packed(&one(), 9);
        let boundary = buf.len();
        buf.extend(packed(&one(), 1));

        let mut r = Cursor::new(buf);
        assert!(matches!(
            factory.unpack(&mut r, 0),
            Err(StashError::TypeMismatch { .. })
        ));
        assert_eq!(r.position() as usize, boundary);
        assert_eq!(factory.unpack(&mut r, 0).unwrap(), one());
    }

    #[test]
    fn boxed_unpack_downcasts() {
        let factory: Box<dyn StashFactory> =
            Box::new(SpringSpecFactory::with_stash_type(StashTypeId(0)));
        let record = factory
            .unpack_boxed(&mut Cursor::new(packed(&one(), 0)), 0)
            .unwrap();
        assert_eq!(record.packed_len(), codec::packed_len(&one()));
        let spec = record.as_any().downcast_ref::<SpringSpec>().unwrap();
        assert_eq!(spec, &one());
    }
}
