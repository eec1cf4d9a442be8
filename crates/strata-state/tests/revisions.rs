//! Persistence semantics: construction-time mutation, clone-on-write
//! revisions, structural independence, and inheritance-safe slot storage.

use std::sync::OnceLock;
use strata_state::{persistent, Draft, Field, Persistent, TypeDef};

persistent!(pub struct Asset);
persistent!(pub struct Photo);
persistent!(pub struct Note);
persistent!(pub struct Screenshot);
persistent!(pub struct Blank);

// ============================================================================
// Fixture hierarchy: Asset <- Photo <- Screenshot, Asset <- Note
// ============================================================================

struct AssetProps {
    label: Field<String>,
    size: Field<i64>,
    archived: Field<bool>,
}

fn asset_def() -> &'static TypeDef<AssetProps> {
    static DEF: OnceLock<TypeDef<AssetProps>> = OnceLock::new();
    DEF.get_or_init(|| {
        TypeDef::define("Asset", |b| AssetProps {
            label: b.prop("label"),
            size: b.prop("size"),
            archived: b.prop("archived"),
        })
    })
}

/// Accessors shared by every type in the hierarchy. Default methods read
/// and write through the record's own schema, so revisions made through a
/// base accessor keep the subtype's runtime type.
trait AssetLike: Persistent {
    fn label(&self) -> Option<String> {
        asset_def().props().label.get(self.record())
    }

    fn with_label(&self, label: &str) -> Self {
        Self::from_record(asset_def().props().label.set(self.record(), label.to_string()))
    }

    fn size(&self) -> Option<i64> {
        asset_def().props().size.get(self.record())
    }

    fn with_size(&self, size: i64) -> Self {
        Self::from_record(asset_def().props().size.set(self.record(), size))
    }

    fn archived(&self) -> Option<bool> {
        asset_def().props().archived.get(self.record())
    }

    fn with_archived(&self, archived: bool) -> Self {
        Self::from_record(asset_def().props().archived.set(self.record(), archived))
    }
}

impl AssetLike for Asset {}
impl AssetLike for Photo {}
impl AssetLike for Note {}
impl AssetLike for Screenshot {}

impl Asset {
    fn init(draft: &mut Draft) {
        let props = asset_def().props();
        draft.set(&props.size, 100).set(&props.archived, false);
    }

    pub fn new() -> Self {
        let mut draft = asset_def().draft();
        Asset::init(&mut draft);
        Self::from_record(draft.finish())
    }
}

struct PhotoProps {
    width: Field<i64>,
}

fn photo_def() -> &'static TypeDef<PhotoProps> {
    static DEF: OnceLock<TypeDef<PhotoProps>> = OnceLock::new();
    DEF.get_or_init(|| TypeDef::extend("Photo", asset_def(), |b| PhotoProps { width: b.prop("width") }))
}

impl Photo {
    fn init(draft: &mut Draft) {
        Asset::init(draft);
        draft.set(&photo_def().props().width, 640);
    }

    pub fn new() -> Self {
        let mut draft = photo_def().draft();
        Photo::init(&mut draft);
        Self::from_record(draft.finish())
    }

    pub fn width(&self) -> Option<i64> {
        photo_def().props().width.get(self.record())
    }

    pub fn with_width(&self, width: i64) -> Self {
        Self::from_record(photo_def().props().width.set(self.record(), width))
    }
}

// Peer of Photo: declares its own property at the same relative position.
struct NoteProps {
    body: Field<String>,
}

fn note_def() -> &'static TypeDef<NoteProps> {
    static DEF: OnceLock<TypeDef<NoteProps>> = OnceLock::new();
    DEF.get_or_init(|| TypeDef::extend("Note", asset_def(), |b| NoteProps { body: b.prop("body") }))
}

impl Note {
    pub fn new() -> Self {
        let mut draft = note_def().draft();
        Asset::init(&mut draft);
        Self::from_record(draft.finish())
    }

    pub fn body(&self) -> Option<String> {
        note_def().props().body.get(self.record())
    }

    pub fn with_body(&self, body: &str) -> Self {
        Self::from_record(note_def().props().body.set(self.record(), body.to_string()))
    }
}

struct ScreenshotProps {
    app: Field<String>,
}

fn screenshot_def() -> &'static TypeDef<ScreenshotProps> {
    static DEF: OnceLock<TypeDef<ScreenshotProps>> = OnceLock::new();
    DEF.get_or_init(|| {
        TypeDef::extend("Screenshot", photo_def(), |b| ScreenshotProps { app: b.prop("app") })
    })
}

impl Screenshot {
    pub fn new() -> Self {
        let mut draft = screenshot_def().draft();
        Photo::init(&mut draft);
        draft.set(&screenshot_def().props().app, "term".to_string());
        Self::from_record(draft.finish())
    }

    pub fn app(&self) -> Option<String> {
        screenshot_def().props().app.get(self.record())
    }

    pub fn width(&self) -> Option<i64> {
        photo_def().props().width.get(self.record())
    }
}

fn blank_def() -> &'static TypeDef<()> {
    static DEF: OnceLock<TypeDef<()>> = OnceLock::new();
    DEF.get_or_init(|| TypeDef::define("Blank", |_| ()))
}

// ============================================================================
// Construction and revisions
// ============================================================================

#[test]
fn test_construction_writes_mutate_in_place() {
    let asset = Asset::new();
    assert_eq!(asset.label(), None);
    assert_eq!(asset.size(), Some(100));
    assert_eq!(asset.archived(), Some(false));
}

#[test]
fn test_post_construction_set_returns_new_revision() {
    let asset = Asset::new();
    let resized = asset.with_size(5);
    assert!(!resized.is_same(&asset));
    assert_eq!(asset.size(), Some(100));
    assert_eq!(resized.size(), Some(5));
}

#[test]
fn test_chained_revisions_leave_original_intact() {
    let asset = Asset::new();
    let revised = asset.with_label("a").with_size(1).with_archived(true);

    assert_eq!(asset.label(), None);
    assert_eq!(asset.size(), Some(100));
    assert_eq!(asset.archived(), Some(false));

    assert_eq!(revised.label().as_deref(), Some("a"));
    assert_eq!(revised.size(), Some(1));
    assert_eq!(revised.archived(), Some(true));
}

#[test]
fn test_intermediate_revisions_are_independent() {
    let first = Asset::new();
    let second = first.with_label("x").with_size(15);
    let third = second.with_label("y").with_size(800).with_archived(true);

    assert_eq!(first.label(), None);
    assert_eq!(first.size(), Some(100));
    assert_eq!(second.label().as_deref(), Some("x"));
    assert_eq!(second.size(), Some(15));
    assert_eq!(second.archived(), Some(false));
    assert_eq!(third.label().as_deref(), Some("y"));
    assert_eq!(third.size(), Some(800));
    assert_eq!(third.archived(), Some(true));
}

#[test]
fn test_clone_is_an_alias_not_a_revision() {
    let asset = Asset::new();
    let alias = asset.clone();
    assert!(alias.is_same(&asset));
}

// ============================================================================
// Inheritance
// ============================================================================

#[test]
fn test_subtype_tracks_base_and_own_properties() {
    let photo = Photo::new();
    assert_eq!(photo.size(), Some(100));
    assert_eq!(photo.archived(), Some(false));
    assert_eq!(photo.width(), Some(640));

    let revised = photo.with_label("sunset").with_width(1280);
    assert_eq!(revised.label().as_deref(), Some("sunset"));
    assert_eq!(revised.width(), Some(1280));
    // Base and subtype slots stay independent.
    assert_eq!(photo.label(), None);
    assert_eq!(photo.width(), Some(640));
}

#[test]
fn test_three_level_inheritance() {
    let shot = Screenshot::new();
    assert_eq!(shot.size(), Some(100));
    assert_eq!(shot.width(), Some(640));
    assert_eq!(shot.app().as_deref(), Some("term"));

    let revised = shot.with_size(42);
    assert_eq!(revised.width(), Some(640));
    assert_eq!(revised.app().as_deref(), Some("term"));
    assert_eq!(revised.size(), Some(42));
}

#[test]
fn test_base_accessor_preserves_subtype_runtime_type() {
    let photo = Photo::new();
    let revised = photo.with_label("still a photo");
    assert_eq!(revised.record().type_name(), "Photo");
    // The revision still reads subtype slots.
    assert_eq!(revised.width(), Some(640));

    let shot = Screenshot::new().with_archived(true);
    assert_eq!(shot.record().type_name(), "Screenshot");
    assert_eq!(shot.app().as_deref(), Some("term"));
}

#[test]
fn test_peer_subtypes_do_not_collide() {
    // Photo::width and Note::body occupy the same relative declaration
    // position on top of the same base type.
    let photo = Photo::new().with_width(9);
    let note = Note::new().with_body("hi");

    assert_eq!(photo.width(), Some(9));
    assert_eq!(note.body().as_deref(), Some("hi"));
    assert_eq!(note.size(), Some(100));

    // Neither type's schema knows the other's property.
    assert!(photo_def().schema().slot_of("body").is_none());
    assert!(note_def().schema().slot_of("width").is_none());
}

// ============================================================================
// Serialization and the empty type
// ============================================================================

#[test]
fn test_to_json_resolves_in_declaration_order() {
    let photo = Photo::new().with_label("sunset");
    assert_eq!(
        serde_json::to_value(photo.record()).unwrap(),
        serde_json::json!({
            "label": "sunset",
            "size": 100,
            "archived": false,
            "width": 640,
        })
    );
}

#[test]
fn test_unset_properties_are_omitted_from_json() {
    let asset = Asset::new();
    let json = asset.to_json();
    assert!(json.get("label").is_none());
    assert_eq!(json["size"], 100);
}

#[test]
fn test_empty_type_instantiates_and_serializes() {
    let blank = Blank::from_record(blank_def().record());
    assert_eq!(blank.to_json(), serde_json::json!({}));
    assert!(blank.is_same(&blank.clone()));
}
