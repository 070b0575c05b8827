//! Type-erased request payloads and the descriptors that keep their types.
//!
//! # Design
//! A [`Payload`] stores its value as `dyn Any` next to a [`TypeDescriptor`]
//! recorded at construction time. For collections the descriptor names the
//! element type and the container shape, so the engine can find the
//! element's codec even when the collection is empty or heterogeneous in
//! shape (list vs set). Collections are always held as `Vec<T>`.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeSet, HashSet, LinkedList, VecDeque};
use std::fmt;
use std::hash::Hash;

/// Collection shape of a payload or of a requested result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Set,
}

/// Element type plus optional container shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    container: Option<ContainerKind>,
}

impl TypeDescriptor {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            container: None,
        }
    }

    pub fn collection_of<T: 'static>(container: ContainerKind) -> Self {
        Self {
            container: Some(container),
            ..Self::of::<T>()
        }
    }

    /// `TypeId` of the value, or of the element for collections.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn container(&self) -> Option<ContainerKind> {
        self.container
    }

    pub fn is_collection(&self) -> bool {
        self.container.is_some()
    }
}

/// Collections the engine can deserialize into.
pub trait Container<T>: FromIterator<T> + 'static {
    const KIND: ContainerKind;
}

impl<T: 'static> Container<T> for Vec<T> {
    const KIND: ContainerKind = ContainerKind::List;
}

impl<T: 'static> Container<T> for VecDeque<T> {
    const KIND: ContainerKind = ContainerKind::List;
}

impl<T: 'static> Container<T> for LinkedList<T> {
    const KIND: ContainerKind = ContainerKind::List;
}

impl<T: Eq + Hash + 'static> Container<T> for HashSet<T> {
    const KIND: ContainerKind = ContainerKind::Set;
}

impl<T: Ord + 'static> Container<T> for BTreeSet<T> {
    const KIND: ContainerKind = ContainerKind::Set;
}

/// A request body value of arbitrary type.
pub struct Payload {
    descriptor: TypeDescriptor,
    len: Option<usize>,
    value: Box<dyn Any + Send + Sync>,
}

impl Payload {
    /// A single value, dispatched on `T` itself.
    ///
    /// A `Vec<T>` passed here is dispatched as the type `Vec<T>`; use
    /// [`Payload::list`] to dispatch on the element type.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            descriptor: TypeDescriptor::of::<T>(),
            len: None,
            value: Box::new(value),
        }
    }

    pub fn list<T, I>(items: I) -> Self
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        Self::collection(items, ContainerKind::List)
    }

    /// A set of `T`. Duplicates are dropped, keeping the first occurrence
    /// and the iteration order of the rest.
    pub fn set<T, I>(items: I) -> Self
    where
        T: Eq + Hash + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let mut items: Vec<T> = items.into_iter().collect();
        let first: Vec<bool> = {
            let mut seen = HashSet::with_capacity(items.len());
            items.iter().map(|item| seen.insert(item)).collect()
        };
        let mut first = first.into_iter();
        items.retain(|_| first.next().unwrap_or(false));
        Self::collection(items, ContainerKind::Set)
    }

    pub fn collection<T, I>(items: I, container: ContainerKind) -> Self
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        Self {
            descriptor: TypeDescriptor::collection_of::<T>(container),
            len: Some(items.len()),
            value: Box::new(items),
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// True only for collections without elements.
    pub fn is_empty_collection(&self) -> bool {
        self.len == Some(0)
    }

    /// The single value, if this payload holds a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.descriptor.is_collection() {
            return None;
        }
        self.value.downcast_ref::<T>()
    }

    /// The elements, if this payload is a collection of `T`.
    pub fn items<T: 'static>(&self) -> Option<&[T]> {
        if !self.descriptor.is_collection() {
            return None;
        }
        self.value.downcast_ref::<Vec<T>>().map(Vec::as_slice)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("descriptor", &self.descriptor)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
