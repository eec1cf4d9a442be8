//! Typed property accessors.
//!
//! A [`Field`] or [`Coll`] handle is created by the schema builder at
//! type-definition time and captures everything an accessor needs: its slot
//! index, its property name, and the kinds of the wrapped actions its
//! sub-cursors dispatch. Reads resolve declared defaults; writes produce
//! revisions; draft writes mutate in place.

use crate::{
    Action, Address, Cursor, Mapper, Payload, Persistent, Record, Reducer, SlotValue, StrataError,
    StrataResult,
};
use serde_json::Value;
use std::any;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// Conversion between Rust values and slot values.
///
/// Implemented for common scalars, `serde_json::Value`, `SlotValue` itself,
/// records, and every wrapper generated by
/// [`persistent!`](crate::persistent). `from_slot` returns `None` when the
/// stored value does not convert.
pub trait SlotData: Sized + 'static {
    /// Move this value into a slot.
    fn into_slot(self) -> SlotValue;

    /// Read this type back out of a slot value.
    fn from_slot(value: &SlotValue) -> Option<Self>;
}

impl SlotData for bool {
    fn into_slot(self) -> SlotValue {
        SlotValue::data(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_data()?.as_bool()
    }
}

impl SlotData for i64 {
    fn into_slot(self) -> SlotValue {
        SlotValue::data(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_data()?.as_i64()
    }
}

impl SlotData for u32 {
    fn into_slot(self) -> SlotValue {
        SlotValue::data(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_data()?.as_u64().and_then(|v| u32::try_from(v).ok())
    }
}

impl SlotData for u64 {
    fn into_slot(self) -> SlotValue {
        SlotValue::data(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_data()?.as_u64()
    }
}

impl SlotData for f64 {
    fn into_slot(self) -> SlotValue {
        SlotValue::data(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_data()?.as_f64()
    }
}

impl SlotData for String {
    fn into_slot(self) -> SlotValue {
        SlotValue::data(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_data()?.as_str().map(str::to_owned)
    }
}

impl SlotData for Value {
    fn into_slot(self) -> SlotValue {
        SlotValue::from(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_data().cloned()
    }
}

impl SlotData for SlotValue {
    fn into_slot(self) -> SlotValue {
        self
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl SlotData for Record {
    fn into_slot(self) -> SlotValue {
        SlotValue::Object(self)
    }

    fn from_slot(value: &SlotValue) -> Option<Self> {
        value.as_object().cloned()
    }
}

/// Payload of a wrapped `"<prop>.item"` action: the address plus the child
/// action, or `None` to store an absent value at the address.
pub(crate) struct ItemPayload {
    pub(crate) address: Address,
    pub(crate) action: Option<Action>,
}

/// A lazily built default item, shared between the collection handle and
/// its item reducer. Laziness lets recursive types default to instances of
/// themselves; the built value is cached and shared by reference afterwards.
pub(crate) struct ItemDefault {
    cell: OnceLock<SlotValue>,
    make: Box<dyn Fn() -> SlotValue + Send + Sync>,
}

impl ItemDefault {
    pub(crate) fn new<T, F>(make: F) -> Self
    where
        T: SlotData,
        F: Fn() -> T + Send + Sync + 'static,
    {
        ItemDefault {
            cell: OnceLock::new(),
            make: Box::new(move || make().into_slot()),
        }
    }

    pub(crate) fn resolve(&self) -> SlotValue {
        self.cell.get_or_init(|| (self.make)()).clone()
    }
}

/// Typed handle for one declared property.
///
/// Handles created on a base type remain valid on records of extending
/// types: the extended schema copies the base's slot assignments, and every
/// write goes through the record's own schema, so revisions keep their
/// runtime type.
pub struct Field<T> {
    slot: usize,
    name: &'static str,
    self_kind: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            name: self.name,
            self_kind: self.self_kind.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: SlotData> Field<T> {
    pub(crate) fn declare(slot: usize, name: &'static str) -> Self {
        Field {
            slot,
            name,
            self_kind: Arc::from(format!("{name}.self")),
            _marker: PhantomData,
        }
    }

    /// The slot this property occupies.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// The property name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn self_kind(&self) -> &Arc<str> {
        &self.self_kind
    }

    /// Read the property: the stored value, else the declared default,
    /// else `None`.
    pub fn get(&self, record: &Record) -> Option<T> {
        record.get(self.slot).and_then(T::from_slot)
    }

    /// Write the property, producing a new revision. The input record is
    /// left untouched.
    pub fn set(&self, record: &Record, value: T) -> Record {
        record.with(self.slot, value.into_slot())
    }

    /// Bind a sub-cursor to this property of `container`'s snapshot.
    ///
    /// The cursor's snapshot is the property's resolved value at bind time;
    /// dispatched actions are wrapped as `"<prop>.self"` and forwarded to
    /// the container's dispatch. Errors if the property is absent with no
    /// declared default, or if the stored value is not a `T`.
    pub fn cursor<C: Persistent>(&self, container: &Cursor<C>) -> StrataResult<Cursor<T>> {
        let value = container
            .get()
            .record()
            .get(self.slot)
            .ok_or_else(|| StrataError::absent_property(self.name))?;
        let snapshot = T::from_slot(value)
            .ok_or_else(|| StrataError::type_mismatch(self.name, any::type_name::<T>()))?;
        let kind = self.self_kind.clone();
        let forward = container.dispatcher().clone();
        Ok(Cursor::new(
            snapshot,
            Arc::new(move |action: Action| {
                forward(Action::new(kind.clone(), Payload::new(action)));
            }),
        ))
    }
}

/// Typed handle for a collection property, addressed through a [`Mapper`].
pub struct Coll<T> {
    slot: usize,
    name: &'static str,
    self_kind: Arc<str>,
    item_kind: Arc<str>,
    mapper: Arc<dyn Mapper>,
    default_item: Option<Arc<ItemDefault>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            name: self.name,
            self_kind: self.self_kind.clone(),
            item_kind: self.item_kind.clone(),
            mapper: self.mapper.clone(),
            default_item: self.default_item.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: SlotData> Coll<T> {
    pub(crate) fn declare(
        slot: usize,
        name: &'static str,
        mapper: Arc<dyn Mapper>,
        default_item: Option<Arc<ItemDefault>>,
    ) -> Self {
        Coll {
            slot,
            name,
            self_kind: Arc::from(format!("{name}.self")),
            item_kind: Arc::from(format!("{name}.item")),
            mapper,
            default_item,
            _marker: PhantomData,
        }
    }

    /// The slot this property occupies.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// The property name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn self_kind(&self) -> &Arc<str> {
        &self.self_kind
    }

    pub(crate) fn item_kind(&self) -> &Arc<str> {
        &self.item_kind
    }

    /// Read the whole collection value; an unset slot reads as the mapper's
    /// empty collection.
    pub fn get(&self, record: &Record) -> SlotValue {
        record
            .get(self.slot)
            .cloned()
            .unwrap_or_else(|| self.mapper.empty())
    }

    /// Read one item, falling back to the declared default item. The
    /// default is shared by reference across reads, never copied.
    pub fn at(&self, record: &Record, address: impl Into<Address>) -> Option<T> {
        let collection = self.get(record);
        self.mapper
            .get(&collection, &address.into())
            .or_else(|| self.default_item.as_ref().map(|d| d.resolve()))
            .and_then(|value| T::from_slot(&value))
    }

    /// Store an item at `address`, producing a new revision.
    pub fn put(&self, record: &Record, address: impl Into<Address>, item: T) -> Record {
        let collection = self.get(record);
        let updated = self
            .mapper
            .set(&collection, &address.into(), Some(item.into_slot()));
        record.with(self.slot, updated)
    }

    /// Store an absent value at `address`, producing a new revision.
    pub fn remove_at(&self, record: &Record, address: impl Into<Address>) -> Record {
        let collection = self.get(record);
        let updated = self.mapper.set(&collection, &address.into(), None);
        record.with(self.slot, updated)
    }

    /// Bind a sub-cursor to the item at `address`.
    ///
    /// The snapshot is the item at bind time, or the declared default item
    /// when the address is absent. Dispatched actions are wrapped as
    /// `"<prop>.item"` actions carrying the address, so reducing them can
    /// materialize the item on demand.
    pub fn item<C: Persistent>(
        &self,
        container: &Cursor<C>,
        address: impl Into<Address>,
    ) -> StrataResult<Cursor<T>> {
        let address = address.into();
        let collection = self.get(container.get().record());
        let value = self
            .mapper
            .get(&collection, &address)
            .or_else(|| self.default_item.as_ref().map(|d| d.resolve()))
            .ok_or_else(|| StrataError::missing_item(self.name, address.clone()))?;
        let snapshot = T::from_slot(&value)
            .ok_or_else(|| StrataError::type_mismatch(self.name, any::type_name::<T>()))?;
        let kind = self.item_kind.clone();
        let forward = container.dispatcher().clone();
        Ok(Cursor::new(
            snapshot,
            Arc::new(move |action: Action| {
                forward(Action::new(
                    kind.clone(),
                    Payload::new(ItemPayload {
                        address: address.clone(),
                        action: Some(action),
                    }),
                ));
            }),
        ))
    }

    /// Construct the action that removes the item at `address`: its reducer
    /// stores an absent value there.
    pub fn remove(&self, address: impl Into<Address>) -> Action {
        Action::new(
            self.item_kind.clone(),
            Payload::new(ItemPayload {
                address: address.into(),
                action: None,
            }),
        )
    }

    /// Bind a sub-cursor to the whole collection value.
    pub fn cursor<C: Persistent>(&self, container: &Cursor<C>) -> Cursor<SlotValue> {
        let snapshot = self.get(container.get().record());
        let kind = self.self_kind.clone();
        let forward = container.dispatcher().clone();
        Cursor::new(
            snapshot,
            Arc::new(move |action: Action| {
                forward(Action::new(kind.clone(), Payload::new(action)));
            }),
        )
    }
}

/// Reducer for `"<prop>.self"` actions: unwrap the child action, reduce the
/// nested record stored at the slot, and store the result back. A child
/// that reduces to the same revision leaves the container unchanged.
pub(crate) fn self_reducer(slot: usize) -> Reducer {
    Arc::new(move |record: &Record, payload: &Payload| {
        let Some(child_action) = payload.downcast_ref::<Action>() else {
            return record.clone();
        };
        match record.get(slot) {
            Some(SlotValue::Object(child)) => {
                let next = child.reduce(child_action);
                if next.is_same(child) {
                    record.clone()
                } else {
                    record.with(slot, SlotValue::Object(next))
                }
            }
            _ => record.clone(),
        }
    })
}

/// Reducer for `"<prop>.item"` actions. A `None` child action stores an
/// absent value at the address. Otherwise the addressed item (defaulted if
/// absent) is reduced and stored back, which is what materializes items on
/// demand.
pub(crate) fn item_reducer(
    slot: usize,
    mapper: Arc<dyn Mapper>,
    default_item: Option<Arc<ItemDefault>>,
) -> Reducer {
    Arc::new(move |record: &Record, payload: &Payload| {
        let Some(ItemPayload { address, action }) = payload.downcast_ref::<ItemPayload>() else {
            return record.clone();
        };
        let collection = record
            .get(slot)
            .cloned()
            .unwrap_or_else(|| mapper.empty());
        match action {
            None => record.with(slot, mapper.set(&collection, address, None)),
            Some(child_action) => {
                let item = mapper
                    .get(&collection, address)
                    .or_else(|| default_item.as_ref().map(|d| d.resolve()));
                let Some(SlotValue::Object(child)) = item else {
                    return record.clone();
                };
                let next = child.reduce(child_action);
                if next.is_same(&child) {
                    record.clone()
                } else {
                    let updated = mapper.set(&collection, address, Some(SlotValue::Object(next)));
                    record.with(slot, updated)
                }
            }
        }
    })
}
