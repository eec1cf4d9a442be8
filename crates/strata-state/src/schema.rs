//! Per-type metadata: slot allocation, defaults, and reducer tables.
//!
//! A [`Schema`] is created once per declared type by a registration call and
//! never changes afterwards. Extending a schema copies its maps (index map,
//! defaults, reducer table) into the new type, so sibling subtypes can never
//! corrupt each other or their base, and subtype properties continue
//! numbering after the base's highest slot.

use crate::accessor::{item_reducer, self_reducer, ItemDefault};
use crate::{ActionDef, Coll, Draft, Field, Mapper, Record, Reducer, SlotData, SlotValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One declared property: its name and optional default value.
#[derive(Clone)]
pub(crate) struct PropDef {
    pub(crate) name: String,
    pub(crate) default: Option<SlotValue>,
}

/// Immutable per-type metadata.
pub struct Schema {
    name: String,
    props: Vec<PropDef>,
    index: HashMap<String, usize>,
    reducers: HashMap<String, Reducer>,
}

impl Schema {
    /// The declared type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of allocated slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Returns true if the type declares no persistent properties.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Look up the slot index of a property by name.
    #[inline]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn prop_defs(&self) -> &[PropDef] {
        &self.props
    }

    pub(crate) fn default(&self, slot: usize) -> Option<&SlotValue> {
        self.props.get(slot).and_then(|prop| prop.default.as_ref())
    }

    pub(crate) fn reducer(&self, kind: &str) -> Option<&Reducer> {
        self.reducers.get(kind)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("slots", &self.props.len())
            .finish()
    }
}

/// Builder used inside a type's registration call.
///
/// Each declaration allocates the next unused slot for the type being
/// defined. Flux-wired declarations (`field`, `collection`) also install
/// their wrapped-action reducers into the type's table.
pub struct SchemaBuilder {
    name: String,
    props: Vec<PropDef>,
    index: HashMap<String, usize>,
    reducers: HashMap<String, Reducer>,
}

impl SchemaBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            props: Vec::new(),
            index: HashMap::new(),
            reducers: HashMap::new(),
        }
    }

    fn extending(name: String, base: &Schema) -> Self {
        Self {
            name,
            props: base.props.clone(),
            index: base.index.clone(),
            reducers: base.reducers.clone(),
        }
    }

    fn allocate(&mut self, name: &'static str, default: Option<SlotValue>) -> usize {
        let slot = self.props.len();
        self.props.push(PropDef {
            name: name.to_string(),
            default,
        });
        // Redeclaring an inherited property repoints the name at the new
        // slot; the shadowed slot stays allocated but is no longer reachable.
        self.index.insert(name.to_string(), slot);
        slot
    }

    /// Declare a plain persistent property with no default.
    pub fn prop<T: SlotData>(&mut self, name: &'static str) -> Field<T> {
        let slot = self.allocate(name, None);
        Field::declare(slot, name)
    }

    /// Declare a flux-wired field with no default.
    pub fn field<T: SlotData>(&mut self, name: &'static str) -> Field<T> {
        self.field_inner(name, None)
    }

    /// Declare a flux-wired field with a default value.
    pub fn field_with<T: SlotData>(&mut self, name: &'static str, init: T) -> Field<T> {
        self.field_inner(name, Some(init.into_slot()))
    }

    fn field_inner<T: SlotData>(
        &mut self,
        name: &'static str,
        default: Option<SlotValue>,
    ) -> Field<T> {
        let slot = self.allocate(name, default);
        let field = Field::declare(slot, name);
        self.reducers
            .insert(field.self_kind().to_string(), self_reducer(slot));
        field
    }

    /// Declare an addressed collection with no default item.
    pub fn collection<T, M>(&mut self, name: &'static str, mapper: M) -> Coll<T>
    where
        T: SlotData,
        M: Mapper + 'static,
    {
        self.collection_inner(name, Arc::new(mapper), None)
    }

    /// Declare an addressed collection whose absent items read as
    /// `default_item()`. The factory runs once, lazily, so recursive types
    /// can default to instances of themselves.
    pub fn collection_of<T, M, F>(
        &mut self,
        name: &'static str,
        mapper: M,
        default_item: F,
    ) -> Coll<T>
    where
        T: SlotData,
        M: Mapper + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.collection_inner(
            name,
            Arc::new(mapper),
            Some(Arc::new(ItemDefault::new(default_item))),
        )
    }

    fn collection_inner<T: SlotData>(
        &mut self,
        name: &'static str,
        mapper: Arc<dyn Mapper>,
        default_item: Option<Arc<ItemDefault>>,
    ) -> Coll<T> {
        let slot = self.allocate(name, Some(mapper.empty()));
        let coll = Coll::declare(slot, name, mapper.clone(), default_item.clone());
        self.reducers
            .insert(coll.self_kind().to_string(), self_reducer(slot));
        self.reducers.insert(
            coll.item_kind().to_string(),
            item_reducer(slot, mapper, default_item),
        );
        coll
    }

    /// Register an action on this type.
    ///
    /// The def is rebound to `key` (its registration name) and its reducer
    /// is installed in the type's table under that key, replacing any
    /// inherited entry. Returns the rebound def.
    pub fn action<P: Send + Sync + 'static>(
        &mut self,
        key: &'static str,
        def: ActionDef<P>,
    ) -> ActionDef<P> {
        let def = def.named(key);
        self.reducers.insert(key.to_string(), def.reducer().clone());
        def
    }

    fn finish(self) -> Schema {
        Schema {
            name: self.name,
            props: self.props,
            index: self.index,
            reducers: self.reducers,
        }
    }
}

/// A finalized type definition: the schema plus whatever property handles
/// and action defs the registration call produced.
///
/// Type definitions are created once and stored in a per-type static:
///
/// ```
/// use std::sync::OnceLock;
/// use strata_state::{Field, TypeDef};
///
/// struct PointProps {
///     x: Field<i64>,
///     y: Field<i64>,
/// }
///
/// fn point_def() -> &'static TypeDef<PointProps> {
///     static DEF: OnceLock<TypeDef<PointProps>> = OnceLock::new();
///     DEF.get_or_init(|| {
///         TypeDef::define("Point", |b| PointProps {
///             x: b.prop("x"),
///             y: b.prop("y"),
///         })
///     })
/// }
///
/// let record = point_def().record();
/// let moved = point_def().props().x.set(&record, 3);
/// assert_eq!(point_def().props().x.get(&moved), Some(3));
/// assert_eq!(point_def().props().x.get(&record), None);
/// ```
pub struct TypeDef<P> {
    schema: Arc<Schema>,
    props: P,
}

impl<P> TypeDef<P> {
    /// Define a new root type.
    pub fn define(name: impl Into<String>, build: impl FnOnce(&mut SchemaBuilder) -> P) -> Self {
        let mut builder = SchemaBuilder::new(name.into());
        let props = build(&mut builder);
        TypeDef {
            schema: Arc::new(builder.finish()),
            props,
        }
    }

    /// Define a type extending `base`.
    ///
    /// The base's slot indices, defaults and reducer table are copied (never
    /// shared) into the new type; declarations made by `build` continue
    /// numbering after the base's highest slot. Base property handles remain
    /// valid on records of the new type.
    pub fn extend<B>(
        name: impl Into<String>,
        base: &TypeDef<B>,
        build: impl FnOnce(&mut SchemaBuilder) -> P,
    ) -> Self {
        let mut builder = SchemaBuilder::extending(name.into(), &base.schema);
        let props = build(&mut builder);
        TypeDef {
            schema: Arc::new(builder.finish()),
            props,
        }
    }

    /// The type's schema.
    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The property handles and action defs produced at definition time.
    #[inline]
    pub fn props(&self) -> &P {
        &self.props
    }

    /// Start constructing an instance.
    #[inline]
    pub fn draft(&self) -> Draft {
        Draft::new(self.schema.clone())
    }

    /// An instance with every slot unset (reads resolve to defaults).
    #[inline]
    pub fn record(&self) -> Record {
        self.draft().finish()
    }
}
