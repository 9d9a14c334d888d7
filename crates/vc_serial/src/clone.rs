//! Deep and shallow copies of objects, built on the binary codec.

use alloc::vec::Vec;

use vc_rtti::Reflectable;
use vc_rtti::object::{ObjectGraph, ObjectKey};
use vc_rtti::registry::TypeRegistry;
use vc_rtti::schema::{FieldAccess, FieldDescriptor, FieldError, TypeDescriptor};

use crate::binary::{BinaryDecoder, BinaryEncoder, EncodeFlags, Slots, level_mut, level_ref};
use crate::error::{CloneError, EncodeError};

// -----------------------------------------------------------------------------
// CloneMode

/// How [`Cloner::clone_object`] treats references.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CloneMode {
    /// Copies every object the source reaches. References between copies
    /// keep the shape they had between the originals.
    #[default]
    Deep,
    /// Copies the source and its embedded values only. References of the
    /// copy point at the original targets.
    Shallow,
}

// -----------------------------------------------------------------------------
// Cloner

/// Copies objects within an [`ObjectGraph`].
///
/// A clone is an encode followed by a decode into the same graph. A shallow
/// encode writes every reference as null, so a shallow clone first records
/// the references of the source and writes them back into the copy.
///
/// # Examples
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::object::{ObjectGraph, ObjectKey};
/// use vc_rtti::registry::TypeRegistry;
/// use vc_rtti::schema::{FieldFlags, TypeBuilder};
/// use vc_serial::clone::{CloneMode, Cloner};
///
/// #[derive(Default)]
/// struct Sprite {
///     frame: u16,
///     atlas: Option<ObjectKey>,
/// }
///
/// impl ReflectType for Sprite {
///     const TYPE_UID: TypeUid = TypeUid::new(7);
///     const TYPE_NAME: &'static str = "Sprite";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain(1, "frame", |s| &s.frame, |s| &mut s.frame)
///             .pointer(2, "atlas", FieldFlags::empty(), |s| &s.atlas, |s| &mut s.atlas);
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Sprite>();
///
/// let mut graph = ObjectGraph::new();
/// let atlas = graph.insert(Sprite::default());
/// let sprite = graph.insert(Sprite { frame: 4, atlas: Some(atlas) });
///
/// let cloner = Cloner::new(&registry);
/// let shallow = cloner.clone_object(&mut graph, sprite, CloneMode::Shallow).unwrap();
/// assert_eq!(graph.get_as::<Sprite>(shallow).unwrap().atlas, Some(atlas));
///
/// let deep = cloner.clone_object(&mut graph, sprite, CloneMode::Deep).unwrap();
/// let copy = graph.get_as::<Sprite>(deep).unwrap();
/// assert_eq!(copy.frame, 4);
/// assert_ne!(copy.atlas, Some(atlas));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Cloner<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Cloner<'r> {
    #[inline]
    pub const fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Copies the object `key` into `graph` and returns the key of the copy.
    ///
    /// Decode warnings are logged; they never fail a clone.
    pub fn clone_object(
        &self,
        graph: &mut ObjectGraph,
        key: ObjectKey,
        mode: CloneMode,
    ) -> Result<ObjectKey, CloneError> {
        let source = graph.get(key).ok_or(CloneError::MissingObject)?;
        let (flags, shadow) = match mode {
            CloneMode::Deep => (EncodeFlags::empty(), None),
            CloneMode::Shallow => (EncodeFlags::SHALLOW, Some(gather(self.registry, source)?)),
        };

        let bytes = BinaryEncoder::new(self.registry)
            .with_flags(flags)
            .encode_to_vec(graph, key)?;
        let decoded = BinaryDecoder::new(self.registry).decode(graph, &bytes)?;
        let copy = decoded.root.ok_or(CloneError::MissingObject)?;

        if let Some(shadow) = shadow {
            let restored = match graph.get_mut(copy) {
                Some(object) => restore(self.registry, object, &shadow),
                None => Err(CloneError::MissingObject),
            };
            if let Err(error) = restored {
                for key in decoded.objects {
                    graph.remove(key);
                }
                return Err(error);
            }
        }

        log::debug!(
            "cloned `{}` ({mode:?}): {} objects, {} warnings",
            graph.get(copy).map_or("?", |object| object.type_name()),
            decoded.objects.len(),
            decoded.warnings.len(),
        );
        Ok(copy)
    }
}

// -----------------------------------------------------------------------------
// Shadow

/// The references of one value, per chain level and field.
struct Shadow {
    levels: Vec<Vec<(u16, FieldShadow)>>,
}

enum FieldShadow {
    /// One key per slot.
    Pointers(Vec<Option<ObjectKey>>),
    /// One shadow per embedded value.
    Embedded(Vec<Shadow>),
}

fn chain_of<'r>(registry: &'r TypeRegistry, object: &dyn Reflectable) -> Result<Vec<&'r TypeDescriptor>, CloneError> {
    let descriptor = registry
        .descriptor_of(object)
        .ok_or(EncodeError::UnregisteredType {
            type_name: object.type_name(),
            uid: object.type_uid(),
        })?;
    Ok(registry.chain(descriptor.uid()).collect())
}

fn slots(field: &FieldDescriptor, len: impl FnOnce() -> Result<usize, FieldError>) -> Result<Slots, FieldError> {
    if field.is_array() {
        Ok(Slots::elements(len()?))
    } else {
        Ok(Slots::single())
    }
}

/// Records every reference of `object`, including those inside embedded values.
fn gather(registry: &TypeRegistry, object: &dyn Reflectable) -> Result<Shadow, CloneError> {
    let chain = chain_of(registry, object)?;
    let mut levels = Vec::with_capacity(chain.len());

    for (depth, descriptor) in chain.iter().enumerate() {
        let level = level_ref(&chain, object, depth)?;
        let mut fields = Vec::new();
        for field in descriptor.fields() {
            match field.access() {
                FieldAccess::Pointer(access) => {
                    let keys = slots(field, || access.len(level))?
                        .map(|slot| access.get(level, slot))
                        .collect::<Result<Vec<_>, _>>()?;
                    fields.push((field.id(), FieldShadow::Pointers(keys)));
                }
                FieldAccess::Reflectable(access) => {
                    let mut shadows = Vec::new();
                    for slot in slots(field, || access.len(level))? {
                        shadows.push(gather(registry, access.get(level, slot)?)?);
                    }
                    fields.push((field.id(), FieldShadow::Embedded(shadows)));
                }
                FieldAccess::Plain(_) | FieldAccess::DataBlock(_) => {}
            }
        }
        levels.push(fields);
    }
    Ok(Shadow { levels })
}

/// Writes the references recorded in `shadow` into `object`.
fn restore(registry: &TypeRegistry, object: &mut dyn Reflectable, shadow: &Shadow) -> Result<(), CloneError> {
    let chain = chain_of(registry, object)?;

    for (depth, fields) in shadow.levels.iter().enumerate() {
        let Some(descriptor) = chain.get(depth) else {
            break;
        };
        let level = level_mut(&chain, &mut *object, depth)?;
        for (id, recorded) in fields {
            let Some(field) = descriptor.field(*id) else {
                continue;
            };
            match (field.access(), recorded) {
                (FieldAccess::Pointer(access), FieldShadow::Pointers(keys)) => {
                    let slots = slots(field, || Ok(keys.len()))?;
                    for (slot, key) in slots.zip(keys) {
                        access.set(&mut *level, slot, *key)?;
                    }
                }
                (FieldAccess::Reflectable(access), FieldShadow::Embedded(shadows)) => {
                    let slots = slots(field, || Ok(shadows.len()))?;
                    for (slot, shadow) in slots.zip(shadows) {
                        restore(registry, access.get_mut(&mut *level, slot)?, shadow)?;
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests
