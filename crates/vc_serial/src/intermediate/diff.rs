use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use vc_rtti::object::{ObjectGraph, ObjectKey};
use vc_rtti::registry::TypeRegistry;

use crate::binary::Decoded;
use crate::error::DecodeError;
use crate::intermediate::{IntermediateDecoder, SerializedEntry, SerializedGraph};
use crate::intermediate::{SerializedInstance, SerializedObject, SerializedSubObject};

// -----------------------------------------------------------------------------
// Generating

/// Records the entries of the root object that differ between two encodes
/// of objects of the same type.
///
/// - Embedded values are compared entry by entry and recorded partially.
/// - Arrays that changed are recorded whole.
/// - References are compared by persistent id. The objects a recorded
///   reference reaches in `new` are carried along whole, transitively.
/// - The first segment of the root is always present, base segments only
///   when they changed. Entries missing from `new` are not recorded.
///
/// Returns `None` if the roots have different types, or nothing changed.
pub fn generate_diff(
    old: &SerializedGraph<'_>,
    new: &SerializedGraph<'_>,
) -> Option<SerializedGraph<'static>> {
    let old_root = old.root_object()?;
    let new_root = new.root_object()?;
    if old_root.type_uid()? != new_root.type_uid()? {
        return None;
    }
    let root = diff_object(old_root, new_root)?;

    let mut pending = Vec::new();
    references(&root, &mut pending);
    let mut objects = BTreeMap::new();
    objects.insert(new.root, root);

    while let Some(id) = pending.pop() {
        if id == 0 || objects.contains_key(&id) {
            continue;
        }
        let Some(object) = new.objects.get(&id) else {
            continue;
        };
        let object = object.clone().into_owned();
        references(&object, &mut pending);
        objects.insert(id, object);
    }

    Some(SerializedGraph {
        root: new.root,
        objects,
    })
}

fn diff_object(old: &SerializedObject<'_>, new: &SerializedObject<'_>) -> Option<SerializedObject<'static>> {
    let mut changed = false;
    let mut sub_objects = Vec::new();

    for (depth, sub) in new.sub_objects.iter().enumerate() {
        let entries = match old.sub_object(sub.type_uid) {
            Some(before) => diff_entries(before, sub),
            None => sub.entries.iter().cloned().map(SerializedEntry::into_owned).collect(),
        };
        if entries.is_empty() && depth > 0 {
            continue;
        }
        changed |= !entries.is_empty();
        sub_objects.push(SerializedSubObject {
            type_uid: sub.type_uid,
            entries,
        });
    }

    changed.then_some(SerializedObject { sub_objects })
}

fn diff_entries(old: &SerializedSubObject<'_>, new: &SerializedSubObject<'_>) -> Vec<SerializedEntry<'static>> {
    new.entries
        .iter()
        .filter_map(|entry| {
            let Some(before) = old.entry(entry.id()).filter(|before| before.schema == entry.schema) else {
                return Some(entry.clone().into_owned());
            };
            match (&before.value, &entry.value) {
                (SerializedInstance::Object(a), SerializedInstance::Object(b)) if a.type_uid() == b.type_uid() => {
                    let object = diff_object(a, b)?;
                    Some(SerializedEntry {
                        schema: entry.schema,
                        value: SerializedInstance::Object(object),
                    })
                }
                (a, b) if a == b => None,
                _ => Some(entry.clone().into_owned()),
            }
        })
        .collect()
}

/// Collects the ids every reference below `object` holds.
fn references(object: &SerializedObject<'_>, out: &mut Vec<u32>) {
    fn visit(value: &SerializedInstance<'_>, out: &mut Vec<u32>) {
        match value {
            SerializedInstance::Field(_) => {}
            SerializedInstance::Reference(id) => out.push(*id),
            SerializedInstance::Array(array) => array.elements.values().for_each(|element| visit(element, out)),
            SerializedInstance::Object(object) => references(object, out),
        }
    }

    for sub in &object.sub_objects {
        for entry in &sub.entries {
            visit(&entry.value, out);
        }
    }
}

// -----------------------------------------------------------------------------
// Applying

/// Decodes a diff onto the existing object `key`.
///
/// Only the entries the diff lists are written. Objects carried along by
/// the diff are created anew.
#[inline]
pub fn apply_diff(
    registry: &TypeRegistry,
    graph: &mut ObjectGraph,
    key: ObjectKey,
    diff: &SerializedGraph<'_>,
) -> Result<Decoded, DecodeError> {
    IntermediateDecoder::new(registry).decode_into(graph, key, diff)
}

// -----------------------------------------------------------------------------
// Tests
