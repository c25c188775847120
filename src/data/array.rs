//! Named, fixed-arity attribute arrays with tagged scalar storage.
//!
//! A [`DataArray`] stores `tuples * components` values of one scalar type in a
//! flat buffer. Arrays carry their own [`ModificationClock`]; an attribute set
//! folds these into its own modification time. [`ArrayHandle`] shares one
//! array between attribute sets (shallow copies) and advances the clock on
//! every write access.

use crate::algs::reduce::ParallelReducer;
use crate::clock::ModificationClock;
use crate::mesh_error::MeshDatasetError;
use num_traits::ToPrimitive;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Scalar type tag for attribute arrays.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScalarType {
    F64,
    F32,
    I32,
    I64,
    U8,
    U32,
    U64,
}

impl ScalarType {
    /// Returns a stable string label for the scalar type.
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::F64 => "f64",
            ScalarType::F32 => "f32",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::U8 => "u8",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
        }
    }

    /// Size of one value in bytes.
    pub fn size_of(self) -> usize {
        match self {
            ScalarType::U8 => 1,
            ScalarType::F32 | ScalarType::I32 | ScalarType::U32 => 4,
            ScalarType::F64 | ScalarType::I64 | ScalarType::U64 => 8,
        }
    }
}

/// Tagged flat value buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayBuffer {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

macro_rules! dispatch {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            ArrayBuffer::F64($v) => $body,
            ArrayBuffer::F32($v) => $body,
            ArrayBuffer::I32($v) => $body,
            ArrayBuffer::I64($v) => $body,
            ArrayBuffer::U8($v) => $body,
            ArrayBuffer::U32($v) => $body,
            ArrayBuffer::U64($v) => $body,
        }
    };
}

impl ArrayBuffer {
    /// Scalar type tag for this buffer.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ArrayBuffer::F64(_) => ScalarType::F64,
            ArrayBuffer::F32(_) => ScalarType::F32,
            ArrayBuffer::I32(_) => ScalarType::I32,
            ArrayBuffer::I64(_) => ScalarType::I64,
            ArrayBuffer::U8(_) => ScalarType::U8,
            ArrayBuffer::U32(_) => ScalarType::U32,
            ArrayBuffer::U64(_) => ScalarType::U64,
        }
    }

    /// Number of flat values.
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    /// Return true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value_f64(&self, idx: usize) -> Option<f64> {
        dispatch!(self, v => v.get(idx).and_then(|x| x.to_f64()))
    }

    fn shrink_to_fit(&mut self) {
        dispatch!(self, v => v.shrink_to_fit())
    }

    fn capacity_bytes(&self) -> usize {
        dispatch!(self, v => v.capacity()) * self.scalar_type().size_of()
    }
}

/// Maps concrete scalar types to tagged buffers for typed accessors.
pub trait ArrayScalar: Copy + Default + ToPrimitive + Send + Sync + 'static {
    /// Scalar type tag for this concrete type.
    const SCALAR_TYPE: ScalarType;

    /// Wrap a typed buffer into a tagged container.
    fn wrap(values: Vec<Self>) -> ArrayBuffer;
    /// Borrow a typed buffer if the tag matches.
    fn unwrap(buf: &ArrayBuffer) -> Option<&[Self]>;
    /// Mutably borrow a typed buffer if the tag matches.
    fn unwrap_mut(buf: &mut ArrayBuffer) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_array_scalar {
    ($t:ty, $variant:ident) => {
        impl ArrayScalar for $t {
            const SCALAR_TYPE: ScalarType = ScalarType::$variant;

            fn wrap(values: Vec<Self>) -> ArrayBuffer {
                ArrayBuffer::$variant(values)
            }

            fn unwrap(buf: &ArrayBuffer) -> Option<&[Self]> {
                if let ArrayBuffer::$variant(v) = buf {
                    Some(v)
                } else {
                    None
                }
            }

            fn unwrap_mut(buf: &mut ArrayBuffer) -> Option<&mut Vec<Self>> {
                if let ArrayBuffer::$variant(v) = buf {
                    Some(v)
                } else {
                    None
                }
            }
        }
    };
}

impl_array_scalar!(f64, F64);
impl_array_scalar!(f32, F32);
impl_array_scalar!(i32, I32);
impl_array_scalar!(i64, I64);
impl_array_scalar!(u8, U8);
impl_array_scalar!(u32, U32);
impl_array_scalar!(u64, U64);

/// Named array of fixed-arity tuples.
#[derive(Clone, Debug)]
pub struct DataArray {
    name: String,
    components: usize,
    buffer: ArrayBuffer,
    clock: ModificationClock,
}

impl DataArray {
    /// Build an array from a flat buffer of `tuples * components` values.
    pub fn from_values<T: ArrayScalar>(
        name: impl Into<String>,
        components: usize,
        values: Vec<T>,
    ) -> Result<Self, MeshDatasetError> {
        Self::from_buffer(name, components, T::wrap(values))
    }

    /// Build an array from an already tagged buffer.
    pub fn from_buffer(
        name: impl Into<String>,
        components: usize,
        buffer: ArrayBuffer,
    ) -> Result<Self, MeshDatasetError> {
        let name = name.into();
        if components == 0 {
            return Err(MeshDatasetError::ZeroComponents(name));
        }
        if buffer.len() % components != 0 {
            return Err(MeshDatasetError::ArrayShapeMismatch {
                name,
                values: buffer.len(),
                components,
            });
        }
        Ok(Self {
            name,
            components,
            buffer,
            clock: ModificationClock::new(),
        })
    }

    /// Build a single-component array; every value is its own tuple.
    pub fn single_component<T: ArrayScalar>(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            buffer: T::wrap(values),
            clock: ModificationClock::new(),
        }
    }

    /// Build an array of `tuples` tuples, every value set to `fill`.
    pub fn filled<T: ArrayScalar>(
        name: impl Into<String>,
        components: usize,
        tuples: usize,
        fill: T,
    ) -> Result<Self, MeshDatasetError> {
        Self::from_values(name, components, vec![fill; tuples * components.max(1)])
    }

    /// Array name; fixed for the lifetime of the array.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of components per tuple.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of tuples.
    pub fn tuples(&self) -> usize {
        self.buffer.len() / self.components
    }

    /// Scalar type tag.
    pub fn scalar_type(&self) -> ScalarType {
        self.buffer.scalar_type()
    }

    /// Tagged buffer.
    pub fn buffer(&self) -> &ArrayBuffer {
        &self.buffer
    }

    /// Modification time of this array.
    pub fn mtime(&self) -> u64 {
        self.clock.get()
    }

    /// Record a modification made through a borrowed slice.
    pub fn modified(&self) {
        self.clock.modified();
    }

    /// Typed read-only view of the flat values.
    pub fn as_slice<T: ArrayScalar>(&self) -> Result<&[T], MeshDatasetError> {
        T::unwrap(&self.buffer).ok_or_else(|| self.type_mismatch(T::SCALAR_TYPE))
    }

    /// Typed mutable view of the flat values; advances the array clock.
    pub fn as_mut_slice<T: ArrayScalar>(&mut self) -> Result<&mut [T], MeshDatasetError> {
        let found = self.scalar_type();
        let name = &self.name;
        match T::unwrap_mut(&mut self.buffer) {
            Some(v) => {
                self.clock.modified();
                Ok(v.as_mut_slice())
            }
            None => Err(MeshDatasetError::ArrayTypeMismatch {
                name: name.clone(),
                expected: T::SCALAR_TYPE,
                found,
            }),
        }
    }

    /// Read one tuple as `f64` values.
    pub fn tuple(&self, index: usize) -> Result<Vec<f64>, MeshDatasetError> {
        self.check_tuple(index)?;
        let start = index * self.components;
        Ok((start..start + self.components)
            .map(|i| self.buffer.value_f64(i).unwrap_or(f64::NAN))
            .collect())
    }

    /// Read one component of one tuple as `f64`.
    pub fn component(&self, index: usize, component: usize) -> Result<f64, MeshDatasetError> {
        self.check_tuple(index)?;
        self.check_component(component)?;
        Ok(self
            .buffer
            .value_f64(index * self.components + component)
            .unwrap_or(f64::NAN))
    }

    /// Overwrite one tuple with typed values.
    pub fn set_tuple<T: ArrayScalar>(
        &mut self,
        index: usize,
        values: &[T],
    ) -> Result<(), MeshDatasetError> {
        self.check_tuple(index)?;
        if values.len() != self.components {
            return Err(MeshDatasetError::ArrayShapeMismatch {
                name: self.name.clone(),
                values: values.len(),
                components: self.components,
            });
        }
        let start = index * self.components;
        let comps = self.components;
        let dst = self.as_mut_slice::<T>()?;
        dst[start..start + comps].copy_from_slice(values);
        Ok(())
    }

    /// Set every value to `fill`.
    pub fn fill<T: ArrayScalar>(&mut self, fill: T) -> Result<(), MeshDatasetError> {
        self.as_mut_slice::<T>()?.fill(fill);
        Ok(())
    }

    /// Resize to `tuples` tuples, filling new values with the type default.
    pub fn resize_tuples(&mut self, tuples: usize) {
        let len = tuples * self.components;
        dispatch!(&mut self.buffer, v => v.resize(len, Default::default()));
        self.clock.modified();
    }

    /// Value range of `component`, skipping NaNs and tuples whose ghost
    /// status intersects `skip`.
    ///
    /// Returns `None` when no tuple contributes (empty array, every tuple
    /// masked, or an out-of-range component). Tuples are scanned through
    /// `reducer`.
    pub fn range(
        &self,
        reducer: &ParallelReducer,
        component: usize,
        ghosts: Option<&[u8]>,
        skip: u8,
    ) -> Option<(f64, f64)> {
        if component >= self.components {
            log::error!(
                "range of component {component} requested on `{}` with {} components",
                self.name,
                self.components
            );
            return None;
        }
        dispatch!(&self.buffer, v => component_range(reducer, v, self.components, component, ghosts, skip))
    }

    /// Bytes held by the value buffer, including spare capacity.
    pub fn actual_memory_size(&self) -> usize {
        self.buffer.capacity_bytes() + self.name.capacity()
    }

    /// Release spare capacity.
    pub fn squeeze(&mut self) {
        self.buffer.shrink_to_fit();
    }

    /// Independent copy with a fresh clock.
    pub fn deep_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            components: self.components,
            buffer: self.buffer.clone(),
            clock: ModificationClock::new(),
        }
    }

    fn type_mismatch(&self, expected: ScalarType) -> MeshDatasetError {
        MeshDatasetError::ArrayTypeMismatch {
            name: self.name.clone(),
            expected,
            found: self.scalar_type(),
        }
    }

    fn check_tuple(&self, index: usize) -> Result<(), MeshDatasetError> {
        let len = self.tuples();
        if index >= len {
            return Err(MeshDatasetError::TupleOutOfRange {
                name: self.name.clone(),
                index,
                len,
            });
        }
        Ok(())
    }

    fn check_component(&self, component: usize) -> Result<(), MeshDatasetError> {
        if component >= self.components {
            return Err(MeshDatasetError::ComponentOutOfRange {
                name: self.name.clone(),
                component,
                components: self.components,
            });
        }
        Ok(())
    }
}

fn component_range<T: ToPrimitive + Sync>(
    reducer: &ParallelReducer,
    values: &[T],
    components: usize,
    component: usize,
    ghosts: Option<&[u8]>,
    skip: u8,
) -> Option<(f64, f64)> {
    let (lo, hi) = reducer.reduce_ranges(
        values.len() / components,
        || (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi): &mut (f64, f64), tuples| {
            for tuple in tuples {
                if ghosts
                    .and_then(|g| g.get(tuple))
                    .is_some_and(|&bits| bits & skip != 0)
                {
                    continue;
                }
                let Some(x) = values[tuple * components + component].to_f64() else {
                    continue;
                };
                if x.is_nan() {
                    continue;
                }
                *lo = lo.min(x);
                *hi = hi.max(x);
            }
        },
        |a, b| (a.0.min(b.0), a.1.max(b.1)),
    );
    (lo <= hi).then_some((lo, hi))
}

/// Shared, lockable handle to a [`DataArray`].
///
/// Clones share the same array. Write access advances the array clock before
/// the guard is handed out, so the mutation cannot be observed by a cache
/// stamped before it.
#[derive(Clone, Debug)]
pub struct ArrayHandle(Arc<RwLock<DataArray>>);

impl ArrayHandle {
    /// Wrap an array in a new shared handle.
    pub fn new(array: DataArray) -> Self {
        ArrayHandle(Arc::new(RwLock::new(array)))
    }

    /// Shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, DataArray> {
        self.0.read()
    }

    /// Exclusive write access; the array is marked modified first.
    pub fn write(&self) -> RwLockWriteGuard<'_, DataArray> {
        let guard = self.0.write();
        guard.modified();
        guard
    }

    /// Array name.
    pub fn name(&self) -> String {
        self.0.read().name().to_owned()
    }

    /// Array modification time.
    pub fn mtime(&self) -> u64 {
        self.0.read().mtime()
    }

    /// Whether two handles refer to the same array.
    pub fn ptr_eq(&self, other: &ArrayHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Handle to an independent copy of the array.
    pub fn deep_copy(&self) -> ArrayHandle {
        ArrayHandle::new(self.0.read().deep_clone())
    }
}

impl From<DataArray> for ArrayHandle {
    fn from(array: DataArray) -> Self {
        ArrayHandle::new(array)
    }
}
