//! Types shared by the tests of this crate.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use vc_rtti::object::ObjectKey;
use vc_rtti::plain::{PlainError, PlainSize, PlainType};
use vc_rtti::registry::TypeRegistry;
use vc_rtti::schema::{FieldFlags, TypeBuilder};
use vc_rtti::{ReflectType, TypeUid};

/// A registry of every fixture except [`Ghost`] and the alternative
/// versions of registered types.
pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register::<Transform>();
    registry.register::<Light>();
    registry.register::<Node>();
    registry.register::<Holder>();
    registry.register::<Asset>();
    registry.register::<Palette>();
    registry.register::<SettingsV1>();
    registry.register::<Liar>();
    registry.register::<Squeezed>();
    registry.register::<Stamped>();
    registry.register::<Flag>();
    registry.register::<Scene>();
    registry
}

/// A registry holding only `T`, and what `T` depends on.
pub fn registry_of<T: ReflectType>() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register::<T>();
    registry
}

macro_rules! uid {
    ($ty:ident = $uid:literal) => {
        impl $ty {
            pub const UID: u32 = $uid;
        }
    };
}

// -----------------------------------------------------------------------------
// Plain values

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl PlainType for Vec3 {
    const SIZE: PlainSize = PlainSize::Static(12);

    fn write_bytes(&self, out: &mut Vec<u8>) {
        for value in [self.x, self.y, self.z] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
        if bytes.len() != 12 {
            return Err(PlainError::Length {
                expected: 12,
                found: bytes.len(),
            });
        }
        Ok(Self {
            x: f32::read_bytes(&bytes[0..4])?,
            y: f32::read_bytes(&bytes[4..8])?,
            z: f32::read_bytes(&bytes[8..12])?,
        })
    }
}

/// Claims one byte more than it writes.
#[derive(Debug, Default)]
pub struct Fib;

impl PlainType for Fib {
    const SIZE: PlainSize = PlainSize::Dynamic;

    fn dynamic_size(&self) -> u32 {
        6
    }

    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"lies!");
    }

    fn read_bytes(_: &[u8]) -> Result<Self, PlainError> {
        Ok(Fib)
    }
}

/// Declares four bytes and writes two.
#[derive(Debug, Default)]
pub struct Short;

impl PlainType for Short {
    const SIZE: PlainSize = PlainSize::Static(4);

    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[0, 0]);
    }

    fn read_bytes(_: &[u8]) -> Result<Self, PlainError> {
        Ok(Short)
    }
}

// -----------------------------------------------------------------------------
// Embedded values and base chains

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: f32,
}

uid!(Transform = 100);

impl ReflectType for Transform {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Transform";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "position", |t| &t.position, |t| &mut t.position)
            .plain(2, "scale", |t| &t.scale, |t| &mut t.scale);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    pub name: String,
    pub transform: Transform,
}

uid!(Entity = 101);

impl ReflectType for Entity {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Entity";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "name", |e| &e.name, |e| &mut e.name)
            .reflectable(2, "transform", |e| &e.transform, |e| &mut e.transform);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Light {
    pub entity: Entity,
    pub intensity: f32,
}

uid!(Light = 102);

impl Light {
    pub fn named(name: &str, intensity: f32) -> Self {
        Self {
            entity: Entity {
                name: String::from(name),
                transform: Transform {
                    position: Vec3::new(1.0, 2.0, 3.0),
                    scale: 1.5,
                },
            },
            intensity,
        }
    }
}

impl ReflectType for Light {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Light";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.base::<Entity>(|l| &l.entity, |l| &mut l.entity)
            .plain(1, "intensity", |l| &l.intensity, |l| &mut l.intensity);
    }
}

/// `Light` as it was before it derived from `Entity`.
#[derive(Debug, Default)]
pub struct LoneLight {
    pub intensity: f32,
}

impl ReflectType for LoneLight {
    const TYPE_UID: TypeUid = TypeUid::new(Light::UID);
    const TYPE_NAME: &'static str = "LoneLight";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "intensity", |l| &l.intensity, |l| &mut l.intensity);
    }
}

// -----------------------------------------------------------------------------
// References

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub id: u32,
    pub parent: Option<ObjectKey>,
    pub children: Vec<ObjectKey>,
}

uid!(Node = 103);

pub fn node(id: u32, children: Vec<ObjectKey>) -> Node {
    Node {
        id,
        parent: None,
        children,
    }
}

impl ReflectType for Node {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Node";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "id", |n| &n.id, |n| &mut n.id)
            .pointer(2, "parent", FieldFlags::WEAK_REF, |n| &n.parent, |n| &mut n.parent)
            .pointer_array(3, "children", FieldFlags::empty(), |n| &n.children, |n| {
                &mut n.children
            });
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Holder {
    pub target: Option<ObjectKey>,
    pub others: Vec<ObjectKey>,
}

uid!(Holder = 104);

impl ReflectType for Holder {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Holder";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.pointer(1, "target", FieldFlags::empty(), |h| &h.target, |h| &mut h.target)
            .pointer_array(2, "others", FieldFlags::empty(), |h| &h.others, |h| &mut h.others);
    }
}

/// Not in [`registry`].
#[derive(Debug, Default, PartialEq)]
pub struct Ghost {
    pub value: u32,
}

uid!(Ghost = 108);

impl ReflectType for Ghost {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Ghost";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "value", |g| &g.value, |g| &mut g.value);
    }
}

// -----------------------------------------------------------------------------
// Data blocks and hooks

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Asset {
    pub name: String,
    pub payload: Vec<u8>,
}

uid!(Asset = 105);

impl ReflectType for Asset {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Asset";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "name", |a| &a.name, |a| &mut a.name).data_block(
            2,
            "payload",
            |a| &a.payload,
            |a, data| a.payload = data,
        );
    }
}

/// Persists its map as two parallel lists staged by hooks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Palette {
    pub colors: BTreeMap<String, u32>,
    pub names: Vec<String>,
    pub values: Vec<u32>,
}

uid!(Palette = 106);

impl ReflectType for Palette {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Palette";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain_array(1, "names", |p| &p.names, |p| &mut p.names)
            .plain_array(2, "values", |p| &p.values, |p| &mut p.values)
            .on_serialize_begin(|p| {
                let (names, values): (Vec<String>, Vec<u32>) =
                    p.colors.iter().map(|(name, value)| (name.clone(), *value)).unzip();
                p.names = names;
                p.values = values;
            })
            .on_serialize_end(|p| {
                p.names.clear();
                p.values.clear();
            })
            .on_deserialize_end(|p| {
                p.colors = p.names.drain(..).zip(p.values.drain(..)).collect();
            });
    }
}

static SEQUENCE: AtomicU32 = AtomicU32::new(1);

fn stamp() -> u32 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Records when its hooks ran, as `[begin, end]` stamps.
#[derive(Debug, Default)]
pub struct StampBase {
    pub value: u8,
    pub saved: [u32; 2],
    pub loaded: [u32; 2],
}

impl ReflectType for StampBase {
    const TYPE_UID: TypeUid = TypeUid::new(112);
    const TYPE_NAME: &'static str = "StampBase";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "value", |s| &s.value, |s| &mut s.value)
            .on_serialize_begin(|s| s.saved[0] = stamp())
            .on_serialize_end(|s| s.saved[1] = stamp())
            .on_deserialize_begin(|s| s.loaded[0] = stamp())
            .on_deserialize_end(|s| s.loaded[1] = stamp());
    }
}

#[derive(Debug, Default)]
pub struct Stamped {
    pub base: StampBase,
    pub value: u8,
    pub saved: [u32; 2],
    pub loaded: [u32; 2],
}

impl ReflectType for Stamped {
    const TYPE_UID: TypeUid = TypeUid::new(111);
    const TYPE_NAME: &'static str = "Stamped";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.base::<StampBase>(|s| &s.base, |s| &mut s.base)
            .plain(1, "value", |s| &s.value, |s| &mut s.value)
            .on_serialize_begin(|s| s.saved[0] = stamp())
            .on_serialize_end(|s| s.saved[1] = stamp())
            .on_deserialize_begin(|s| s.loaded[0] = stamp())
            .on_deserialize_end(|s| s.loaded[1] = stamp());
    }
}

// -----------------------------------------------------------------------------
// Versions

uid!(SettingsV1 = 107);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsV1 {
    pub volume: f32,
    pub title: String,
}

impl ReflectType for SettingsV1 {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Settings";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "volume", |s| &s.volume, |s| &mut s.volume)
            .plain(2, "title", |s| &s.title, |s| &mut s.title);
    }
}

/// `SettingsV1` with a field added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsV2 {
    pub volume: f32,
    pub title: String,
    pub fullscreen: bool,
}

impl ReflectType for SettingsV2 {
    const TYPE_UID: TypeUid = TypeUid::new(SettingsV1::UID);
    const TYPE_NAME: &'static str = "Settings";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "volume", |s| &s.volume, |s| &mut s.volume)
            .plain(2, "title", |s| &s.title, |s| &mut s.title)
            .plain(3, "fullscreen", |s| &s.fullscreen, |s| &mut s.fullscreen);
    }
}

/// `SettingsV1` with `volume` turned into an array.
#[derive(Debug, Default)]
pub struct SettingsClash {
    pub volume: Vec<f32>,
}

impl ReflectType for SettingsClash {
    const TYPE_UID: TypeUid = TypeUid::new(SettingsV1::UID);
    const TYPE_NAME: &'static str = "Settings";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain_array(1, "volume", |s| &s.volume, |s| &mut s.volume);
    }
}

// -----------------------------------------------------------------------------
// Faulty codecs

#[derive(Debug, Default)]
pub struct Liar {
    pub value: Fib,
}

impl ReflectType for Liar {
    const TYPE_UID: TypeUid = TypeUid::new(109);
    const TYPE_NAME: &'static str = "Liar";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "value", |l| &l.value, |l| &mut l.value);
    }
}

#[derive(Debug, Default)]
pub struct Squeezed {
    pub value: Short,
}

impl ReflectType for Squeezed {
    const TYPE_UID: TypeUid = TypeUid::new(110);
    const TYPE_NAME: &'static str = "Squeezed";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "value", |s| &s.value, |s| &mut s.value);
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Flag {
    pub on: bool,
}

uid!(Flag = 113);

impl ReflectType for Flag {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Flag";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "on", |f| &f.on, |f| &mut f.on);
    }
}

// -----------------------------------------------------------------------------
// Scenes

/// An embedded value holding a reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layer {
    pub name: String,
    pub focus: Option<ObjectKey>,
}

impl ReflectType for Layer {
    const TYPE_UID: TypeUid = TypeUid::new(115);
    const TYPE_NAME: &'static str = "Layer";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "name", |l| &l.name, |l| &mut l.name)
            .pointer(2, "focus", FieldFlags::empty(), |l| &l.focus, |l| &mut l.focus);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub name: String,
    pub transform: Transform,
    pub camera: Option<ObjectKey>,
    pub lights: Vec<ObjectKey>,
    pub layers: Vec<Layer>,
}

uid!(Scene = 114);

impl ReflectType for Scene {
    const TYPE_UID: TypeUid = TypeUid::new(Self::UID);
    const TYPE_NAME: &'static str = "Scene";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.plain(1, "name", |s| &s.name, |s| &mut s.name)
            .reflectable(2, "transform", |s| &s.transform, |s| &mut s.transform)
            .pointer(3, "camera", FieldFlags::empty(), |s| &s.camera, |s| &mut s.camera)
            .pointer_array(4, "lights", FieldFlags::empty(), |s| &s.lights, |s| &mut s.lights)
            .reflectable_array(5, "layers", |s| &s.layers, |s| &mut s.layers);
    }
}
