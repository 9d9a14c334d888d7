//! `Serialize` for the tree types, for exporting trees to readable formats.
//!
//! Entries are written as `{ id, kind, array, value }`; the static size and
//! the dynamic flag of a field are implied by its payload. Byte payloads go
//! through [`Serializer::serialize_bytes`].

use serde_core::ser::SerializeStruct;
use serde_core::{Serialize, Serializer};

use crate::intermediate::{SerializedArray, SerializedEntry, SerializedField, SerializedGraph};
use crate::intermediate::{SerializedInstance, SerializedObject, SerializedSubObject};

impl Serialize for SerializedGraph<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SerializedGraph", 2)?;
        state.serialize_field("root", &self.root)?;
        state.serialize_field("objects", &self.objects)?;
        state.end()
    }
}

impl Serialize for SerializedObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SerializedObject", 1)?;
        state.serialize_field("sub_objects", &self.sub_objects)?;
        state.end()
    }
}

impl Serialize for SerializedSubObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SerializedSubObject", 2)?;
        state.serialize_field("type_uid", &self.type_uid)?;
        state.serialize_field("entries", &self.entries)?;
        state.end()
    }
}

impl Serialize for SerializedEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SerializedEntry", 4)?;
        state.serialize_field("id", &self.schema.id)?;
        state.serialize_field("kind", &self.schema.kind)?;
        state.serialize_field("array", &self.schema.is_array)?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}

impl Serialize for SerializedInstance<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const NAME: &str = "SerializedInstance";
        match self {
            Self::Field(field) => serializer.serialize_newtype_variant(NAME, 0, "Field", field),
            Self::Array(array) => serializer.serialize_newtype_variant(NAME, 1, "Array", array),
            Self::Object(object) => serializer.serialize_newtype_variant(NAME, 2, "Object", object),
            Self::Reference(id) => serializer.serialize_newtype_variant(NAME, 3, "Reference", id),
        }
    }
}

impl Serialize for SerializedField<'_> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.bytes())
    }
}

impl Serialize for SerializedArray<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SerializedArray", 2)?;
        state.serialize_field("len", &self.len)?;
        state.serialize_field("elements", &self.elements)?;
        state.end()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;

    use vc_rtti::TypeUid;
    use vc_rtti::object::ObjectGraph;
    use vc_rtti::schema::{FieldKind, FieldSchema};

    use crate::fixtures::{Light, registry};
    use crate::intermediate::{IntermediateEncoder, SerializedArray, SerializedEntry};
    use crate::intermediate::{SerializedField, SerializedGraph, SerializedInstance};
    use crate::intermediate::{SerializedObject, SerializedSubObject};

    fn entry(id: u16, kind: FieldKind, is_array: bool, value: SerializedInstance<'_>) -> SerializedEntry<'_> {
        SerializedEntry {
            schema: FieldSchema {
                id,
                kind,
                is_array,
                size: if kind == FieldKind::Plain { 2 } else { 0 },
                dynamic: false,
            },
            value,
        }
    }

    #[test]
    fn json_layout() {
        let bytes = [1, 2];
        let references = SerializedArray {
            len: 1,
            elements: BTreeMap::from([(0, SerializedInstance::Reference(1))]),
        };
        let tree = SerializedGraph {
            root: 1,
            objects: BTreeMap::from([(1, SerializedObject {
                sub_objects: vec![SerializedSubObject {
                    type_uid: TypeUid::new(7),
                    entries: vec![
                        entry(
                            1,
                            FieldKind::Plain,
                            false,
                            SerializedInstance::Field(SerializedField::borrowed(&bytes)),
                        ),
                        entry(2, FieldKind::ReflectablePointer, false, SerializedInstance::Reference(0)),
                        entry(3, FieldKind::ReflectablePointer, true, SerializedInstance::Array(references)),
                    ],
                }],
            })]),
        };

        let expected = String::from(concat!(
            r#"{"root":1,"objects":{"1":{"sub_objects":[{"type_uid":7,"entries":["#,
            r#"{"id":1,"kind":"plain","array":false,"value":{"Field":[1,2]}},"#,
            r#"{"id":2,"kind":"pointer","array":false,"value":{"Reference":0}},"#,
            r#"{"id":3,"kind":"pointer","array":true,"value":{"Array":{"len":1,"elements":{"0":{"Reference":1}}}}}"#,
            r#"]}]}}}"#,
        ));
        assert_eq!(serde_json::to_string(&tree).unwrap(), expected);
    }

    #[test]
    fn exports_encoded_objects() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let root = graph.insert(Light::named("lamp", 1.0));
        let tree = IntermediateEncoder::new(&registry).encode(&mut graph, root).unwrap();

        let json: serde_json::Value = serde_json::to_value(&tree).unwrap();
        let sub_objects = &json["objects"]["1"]["sub_objects"];
        assert_eq!(sub_objects[0]["type_uid"], Light::UID);
        assert_eq!(sub_objects[1]["entries"][1]["kind"], "reflectable");
        assert!(sub_objects[1]["entries"][1]["value"]["Object"].is_object());

        let text = ron::to_string(&tree).unwrap();
        assert!(text.contains("Object("));
        assert!(text.contains("\"reflectable\""));
    }
}
