//! Open addressing hash map keyed by non-negative integers.
//!
//! Collisions are resolved with double hashing: `hash1` picks the first slot and
//! `hash2` is the probe step. On insertion the map applies Brent's improvement,
//! moving a colliding entry one step along its own probe sequence when that frees
//! the slot for the new key. Table sizes are always taken from `PRIME_SIZES` so
//! every probe step is coprime with the table size and a probe sequence visits
//! every slot before repeating.
//!
//! Entries can never be removed.

use tracing::debug;

use crate::error::{QuantizeError, Result};

/// Allowed table sizes, see https://planetmath.org/goodhashtableprimes.
const PRIME_SIZES: [usize; 20] =
[
	53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613, 393241, 786433,
	1572869, 3145739, 6291469, 12582917, 25165843,
];

/// The table is rebuilt once more than this percentage of slots is used.
const MAX_LOAD_PERCENT: usize = 95;

/// Largish prime spreading similar keys far apart.
fn hash1(key: u32) -> u64
{
	key as u64 * 3141
}

/// Probe step, always smaller than the smallest allowed table size.
fn hash2(key: u32) -> u64
{
	1 + key as u64 % 37
}

/// Get the first allowed table size able to hold `desired` slots.
fn allowed_size(desired: usize) -> Result<usize>
{
	PRIME_SIZES.iter()
		.copied()
		.find(|&size| size >= desired)
		.ok_or(QuantizeError::CapacityExceeded { desired, max: PRIME_SIZES[PRIME_SIZES.len() - 1] })
}

#[derive(Debug, Clone)]
struct Slot<V>
{
	key: u32,
	value: V,
}

/// Hash map with prime table sizes and Brent-style insertion.
#[derive(Debug, Clone)]
pub struct PrimeHashMap<V>
{
	slots: Vec<Option<Slot<V>>>,
	used: usize,
}

impl<V> PrimeHashMap<V>
{
	/// Create a map of the minimum allowed size.
	pub fn new() -> Self
	{
		Self::with_size(PRIME_SIZES[0])
	}

	/// Create a map able to hold at least `capacity` slots without rebuilding.
	/// Fails when the hint is larger than the largest allowed table size.
	pub fn with_capacity(capacity: usize) -> Result<Self>
	{
		Ok(Self::with_size(allowed_size(capacity)?))
	}

	fn with_size(size: usize) -> Self
	{
		let mut slots: Vec<Option<Slot<V>>> = Vec::with_capacity(size);
		slots.resize_with(size, || None);
		Self { slots, used: 0 }
	}

	/// Number of keys stored.
	pub fn len(&self) -> usize
	{
		self.used
	}

	pub fn is_empty(&self) -> bool
	{
		self.used == 0
	}

	/// Current table size, always one of the allowed primes.
	pub fn capacity(&self) -> usize
	{
		self.slots.len()
	}

	/// Get the value stored for a key.
	pub fn get(&self, key: u32) -> Option<&V>
	{
		self.find(key).and_then(|index| self.slots[index].as_ref()).map(|slot| &slot.value)
	}

	/// Get a mutable reference to the value stored for a key.
	pub fn get_mut(&mut self, key: u32) -> Option<&mut V>
	{
		let index: usize = self.find(key)?;
		self.slots[index].as_mut().map(|slot| &mut slot.value)
	}

	pub fn contains(&self, key: u32) -> bool
	{
		self.find(key).is_some()
	}

	/// Set the value of a key, overwriting any previous value.
	pub fn set(&mut self, key: u32, value: V) -> Result<()>
	{
		if let Some(slot) = self.get_mut(key)
		{
			*slot = value;
			return Ok(());
		}

		// Integer percentage, strictly above the limit: a table at exactly 95% still takes one more key.
		if 100 * self.used / self.slots.len() > MAX_LOAD_PERCENT
		{
			self.reorganise()?;
		}

		self.insert_new(key, value);
		Ok(())
	}

	/// Iterate over all stored key value pairs in table order.
	pub fn iter(&self) -> impl Iterator<Item = (u32, &V)> + '_
	{
		self.slots.iter().flatten().map(|slot| (slot.key, &slot.value))
	}

	/// Walk the probe sequence of a key until it or an empty slot is found.
	fn find(&self, key: u32) -> Option<usize>
	{
		let max: u64 = self.slots.len() as u64;
		let step: u64 = hash2(key);
		let mut index: u64 = hash1(key) % max;

		while let Some(slot) = &self.slots[index as usize]
		{
			if slot.key == key
			{
				return Some(index as usize);
			}

			index = (index + step) % max;
		}

		None
	}

	/// Insert a key known to be absent. The table must have at least one empty slot.
	fn insert_new(&mut self, key: u32, value: V)
	{
		let max: u64 = self.slots.len() as u64;
		let step: u64 = hash2(key);
		let mut index: u64 = hash1(key) % max;

		while let Some(collision) = &self.slots[index as usize]
		{
			let next_index: u64 = (index + step) % max;
			let collision_index: u64 = (index + hash2(collision.key)) % max;

			if self.slots[next_index as usize].is_none() || self.slots[collision_index as usize].is_some()
			{
				// Next slot is free, or the collision can not be moved.
				index = next_index;
			}
			else
			{
				// The collision moves one step along its own probe sequence, freeing this slot.
				self.slots[collision_index as usize] = self.slots[index as usize].take();
				break;
			}
		}

		self.slots[index as usize] = Some(Slot { key, value });
		self.used += 1;
	}

	/// Rebuild the table at the next allowed size.
	fn reorganise(&mut self) -> Result<()>
	{
		let size: usize = allowed_size(self.slots.len() + 1)?;
		debug!(used = self.used, from = self.slots.len(), to = size, "reorganising hash map");

		let old: Vec<Option<Slot<V>>> = std::mem::replace(&mut self.slots, Self::with_size(size).slots);
		self.used = 0;

		for slot in old.into_iter().flatten()
		{
			self.insert_new(slot.key, slot.value);
		}

		Ok(())
	}
}

impl<V> Default for PrimeHashMap<V>
{
	fn default() -> Self
	{
		Self::new()
	}
}

/// Set of integer keys, the value of every present key is `()`.
pub type PrimeHashSet = PrimeHashMap<()>;

impl PrimeHashMap<()>
{
	/// Add a key to the set.
	pub fn insert(&mut self, key: u32) -> Result<()>
	{
		self.set(key, ())
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn small_set_and_get()
	{
		let mut map: PrimeHashMap<usize> = PrimeHashMap::new();
		let keys: [u32; 9] = [5, 3, 11, 7, 10, 3, 15, 5, 11];

		for (i, &key) in keys.iter().enumerate()
		{
			map.set(key, i + 1).unwrap();
		}

		// Last write per key wins.
		assert_eq!(map.len(), 6);
		assert_eq!(map.get(5), Some(&8));
		assert_eq!(map.get(3), Some(&6));
		assert_eq!(map.get(11), Some(&9));
		assert_eq!(map.get(7), Some(&4));
		assert_eq!(map.get(10), Some(&5));
		assert_eq!(map.get(15), Some(&7));
		assert_eq!(map.get(4), None);
	}

	#[test]
	fn colliding_keys_keep_their_own_values()
	{
		let mut map: PrimeHashMap<u32> = PrimeHashMap::new();

		// Keys 53 apart share a first slot in the initial table.
		for i in 0..40u32
		{
			map.set(i * 53, i).unwrap();
		}

		for i in 0..40u32
		{
			assert_eq!(map.get(i * 53), Some(&i));
		}
	}

	#[test]
	fn grows_through_prime_sizes()
	{
		let mut map: PrimeHashMap<u32> = PrimeHashMap::new();
		assert_eq!(map.capacity(), 53);

		for key in 0..100_000u32
		{
			map.set(key.wrapping_mul(2654435761), key).unwrap();
		}

		assert_eq!(map.len(), 100_000);
		assert!(PRIME_SIZES.contains(&map.capacity()));
		assert!(100 * map.len() / map.capacity() <= MAX_LOAD_PERCENT + 1);

		for key in 0..100_000u32
		{
			assert_eq!(map.get(key.wrapping_mul(2654435761)), Some(&key));
		}
	}

	#[test]
	fn grows_only_above_load_limit()
	{
		let mut map: PrimeHashMap<u32> = PrimeHashMap::new();

		// 50 of 53 slots is 94%, so the 51st key still goes into the first table.
		for key in 0..51
		{
			map.set(key, key).unwrap();
		}
		assert_eq!(map.capacity(), 53);

		// 51 of 53 is 96%, the next new key rebuilds the table.
		map.set(51, 51).unwrap();
		assert_eq!(map.capacity(), 97);
		assert_eq!(map.len(), 52);
		assert!((0..52).all(|key| map.get(key) == Some(&key)));
	}

	#[test]
	fn overwrite_after_growth()
	{
		let mut map: PrimeHashMap<u32> = PrimeHashMap::new();

		for key in 0..1000u32
		{
			map.set(key, 0).unwrap();
		}

		for key in (0..1000u32).rev()
		{
			map.set(key, key + 1).unwrap();
		}

		assert_eq!(map.len(), 1000);
		assert!(map.iter().all(|(key, &value)| value == key + 1));
	}

	#[test]
	fn with_capacity_rounds_to_prime()
	{
		let map: PrimeHashMap<u8> = PrimeHashMap::with_capacity(1000).unwrap();
		assert_eq!(map.capacity(), 1543);
		assert!(map.is_empty());
	}

	#[test]
	fn with_capacity_rejects_oversized_hint()
	{
		let result = PrimeHashMap::<u8>::with_capacity(30_000_000);
		assert!(matches!(result, Err(QuantizeError::CapacityExceeded { desired: 30_000_000, .. })));
	}

	#[test]
	fn set_variant()
	{
		let mut set: PrimeHashSet = PrimeHashSet::new();
		set.insert(42).unwrap();
		set.insert(42).unwrap();
		set.insert(0).unwrap();

		assert!(set.contains(42));
		assert!(set.contains(0));
		assert!(!set.contains(1));
		assert_eq!(set.len(), 2);
	}
}
