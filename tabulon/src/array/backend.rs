//! The three interchangeable storage backends behind a [`super::TypedArray`]:
//! dense (contiguous buffer), sparse (hash map + default fill, with
//! automatic promotion to dense) and mapped (memory-mapped byte region, for
//! fixed-width types only).

use std::collections::HashMap;

use memmap2::MmapMut;
use tracing::debug;

use crate::array::element::{ArrayElement, FixedWidth};
use crate::io::MappedHeader;

/// Which storage style backs a `TypedArray`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStyle {
    /// Contiguous native buffer, O(1) direct indexing.
    Dense,
    /// Hash map from index to value plus a default; auto-promotes to dense.
    Sparse,
    /// Memory-mapped fixed-width byte region.
    Mapped,
}

/// The storage behind a [`super::TypedArray`].
#[derive(Debug)]
pub enum Backend<T> {
    /// See [`BackendStyle::Dense`].
    Dense(Vec<T>),
    /// See [`BackendStyle::Sparse`].
    Sparse(SparseStore<T>),
    /// See [`BackendStyle::Mapped`]. Only constructible for `T: FixedWidth`.
    Mapped(MappedStore<T>),
}

impl<T: ArrayElement> Backend<T> {
    pub fn style(&self) -> BackendStyle {
        match self {
            Self::Dense(_) => BackendStyle::Dense,
            Self::Sparse(_) => BackendStyle::Sparse,
            Self::Mapped(_) => BackendStyle::Mapped,
        }
    }
}

/// Sparse backing store: a hash map from index to non-default value, plus
/// the default value returned for every other index.
///
/// Promotes itself to dense (the caller swaps the enum variant) once
/// occupancy exceeds `load_factor * capacity`; see
/// [`SparseStore::should_promote`].
#[derive(Debug)]
pub struct SparseStore<T> {
    entries: HashMap<usize, T>,
    default: T,
    capacity: usize,
    load_factor: f64,
}

impl<T: ArrayElement> SparseStore<T> {
    pub fn new(capacity: usize, default: T, load_factor: f64) -> Self {
        Self {
            entries: HashMap::new(),
            default,
            capacity,
            load_factor,
        }
    }

    pub fn get(&self, index: usize) -> T {
        self.entries.get(&index).cloned().unwrap_or_else(|| self.default.clone())
    }

    /// Sets `index` to `value`, returning the previous value and whether
    /// this write should trigger a promotion to dense.
    ///
    /// Promotion trigger: strictly more than `floor(load_factor *
    /// capacity)` non-default entries after the write.
    pub fn set(&mut self, index: usize, value: T) -> (T, bool) {
        let previous = self.get(index);
        if value == self.default {
            self.entries.remove(&index);
        } else {
            self.entries.insert(index, value);
        }
        let threshold = (self.load_factor * self.capacity as f64).floor() as usize;
        let promote = self.entries.len() > threshold;
        if promote {
            debug!(
                occupancy = self.entries.len(),
                threshold, "sparse array promoting to dense"
            );
        }
        (previous, promote)
    }

    pub fn non_default_count(&self) -> usize {
        self.entries.len()
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn to_dense(&self, length: usize) -> Vec<T> {
        (0..length).map(|i| self.get(i)).collect()
    }

    pub fn iter_sparse(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries.iter().map(|(idx, value)| (*idx, value))
    }
}

/// A memory-mapped, fixed-width backing store.
///
/// Slot `i` lives at byte offset `header_len + i * T::WIDTH`,
/// where `header_len` is `MappedHeader::FIXED_SIZE` for every type except
/// `DATETIME-ZONED`, whose header carries a trailing zone dictionary.
#[derive(Debug)]
pub struct MappedStore<T> {
    mmap: MmapMut,
    capacity: usize,
    header_len: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: ArrayElement + FixedWidth> MappedStore<T> {
    /// Builds an anonymous (non-file-backed) mapped store.
    pub fn new(capacity: usize, length: usize, default: T) -> std::io::Result<Self> {
        Self::new_with_header(capacity, length, default, None)
    }

    fn new_with_header(
        capacity: usize,
        length: usize,
        default: T,
        zone_dictionary: Option<Vec<String>>,
    ) -> std::io::Result<Self> {
        let header = Self::header(capacity, length, default, zone_dictionary);
        let header_len = header.total_len();
        let mut mmap = MmapMut::map_anon(header_len + capacity * T::WIDTH)?;
        header.write(&mut mmap[..header_len]);
        Ok(Self {
            mmap,
            capacity,
            header_len,
            _marker: std::marker::PhantomData,
        })
    }

    /// Builds a file-backed mapped store, writing a fresh header.
    pub fn create_in_file(file: &std::fs::File, capacity: usize, length: usize, default: T) -> std::io::Result<Self> {
        Self::create_in_file_with_header(file, capacity, length, default, None)
    }

    fn create_in_file_with_header(
        file: &std::fs::File,
        capacity: usize,
        length: usize,
        default: T,
        zone_dictionary: Option<Vec<String>>,
    ) -> std::io::Result<Self> {
        let header = Self::header(capacity, length, default, zone_dictionary);
        let header_len = header.total_len();
        file.set_len((header_len + capacity * T::WIDTH) as u64)?;
        let mut mmap = unsafe { MmapMut::map_mut(file)? };
        header.write(&mut mmap[..header_len]);
        Ok(Self {
            mmap,
            capacity,
            header_len,
            _marker: std::marker::PhantomData,
        })
    }

    /// Opens an existing file-backed mapped store, reading its header back.
    pub fn open_file(file: &std::fs::File) -> std::io::Result<Self> {
        let mmap = unsafe { MmapMut::map_mut(file)? };
        let header = MappedHeader::read(&mmap[..])?;
        if header.type_code != T::TYPE_CODE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("mapped file holds {}, expected {}", header.type_code, T::TYPE_CODE),
            ));
        }
        let header_len = header.total_len();
        Ok(Self {
            mmap,
            capacity: header.capacity as usize,
            header_len,
            _marker: std::marker::PhantomData,
        })
    }

    fn header(capacity: usize, length: usize, default: T, zone_dictionary: Option<Vec<String>>) -> MappedHeader {
        let mut default_value = vec![0_u8; T::WIDTH];
        default.write_be(&mut default_value);
        MappedHeader {
            type_code: T::TYPE_CODE,
            length: length as u32,
            capacity: capacity as u32,
            default_value,
            zone_dictionary,
        }
    }

    fn slot_offset(&self, index: usize) -> usize {
        self.header_len + index * T::WIDTH
    }

    pub fn get(&self, index: usize) -> T {
        let offset = self.slot_offset(index);
        T::read_be(&self.mmap[offset..offset + T::WIDTH])
    }

    pub fn set(&mut self, index: usize, value: T) -> T {
        let previous = self.get(index);
        let offset = self.slot_offset(index);
        value.write_be(&mut self.mmap[offset..offset + T::WIDTH]);
        previous
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Anonymous-mapped counterpart of [`Self::new`] for `DATETIME-ZONED`,
    /// which additionally needs a zone dictionary embedded in the header.
    pub fn new_zoned(
        capacity: usize,
        length: usize,
        default: crate::array::element::ZonedDateTime,
        zones: Vec<String>,
    ) -> std::io::Result<Self> {
        Self::new_with_header(capacity, length, default, Some(zones))
    }

    /// File-backed counterpart of [`Self::new_zoned`].
    pub fn create_in_file_zoned(
        file: &std::fs::File,
        capacity: usize,
        length: usize,
        default: crate::array::element::ZonedDateTime,
        zones: Vec<String>,
    ) -> std::io::Result<Self> {
        Self::create_in_file_with_header(file, capacity, length, default, Some(zones))
    }

    /// The zone dictionary embedded in this store's header.
    pub fn zone_dictionary(&self) -> std::io::Result<Vec<String>> {
        Ok(MappedHeader::read(&self.mmap[..])?.zone_dictionary.unwrap_or_default())
    }

    /// Flushes this mapped store's dirty pages to its backing file.
    pub fn flush(&self) -> std::io::Result<()> {
        self.mmap.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::element::ZonedDateTime;

    #[test]
    fn sparse_store_promotes_past_load_factor_threshold() {
        let mut store = SparseStore::new(100, 0_i32, 0.5);
        for key in 0..50 {
            let (_, promote) = store.set(key, key as i32 + 1);
            assert!(!promote, "slot {key} should stay sparse");
        }
        let (_, promote) = store.set(50, 51);
        assert!(promote, "51st distinct entry should trigger promotion");
    }

    #[test]
    fn mapped_store_get_set_round_trip() {
        let mut store = MappedStore::<f64>::new(8, 8, 0.0).unwrap();
        store.set(3, 2.5);
        assert_eq!(store.get(3), 2.5);
        assert_eq!(store.get(0), 0.0);
    }

    #[test]
    fn mapped_store_zoned_embeds_and_recovers_zone_dictionary() {
        let zones = vec!["UTC".to_string(), "America/New_York".to_string()];
        let default = ZonedDateTime(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH, 0);
        let mut store = MappedStore::new_zoned(4, 4, default, zones.clone()).unwrap();
        let value = ZonedDateTime(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH, 1);
        store.set(2, value);
        assert_eq!(store.get(2), value);
        assert_eq!(store.zone_dictionary().unwrap(), zones);
    }
}
