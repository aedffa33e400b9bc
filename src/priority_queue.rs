/// Entry of the priority queue, greater priority is popped first.
#[derive(Debug, Clone)]
pub struct HeapElement<T>
{
	pub priority: u64,
	pub value: T,
}

/// Binary max-heap stored in a single array.
///
/// The allocation grows in place and is kept at `2^k - 1` elements so that every
/// allocated slot belongs to a complete layer of the heap.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T>
{
	heap: Vec<HeapElement<T>>,
	heap_size: usize,
}

impl<T> PriorityQueue<T>
{
	/// Create a new priority queue with room for 63 elements.
	pub fn new() -> Self
	{
		Self::with_heap_size(63)
	}

	/// Create a new priority queue able to hold `size` elements, rounded up to the next power of 2 minus 1.
	pub fn with_capacity(size: usize) -> Self
	{
		let size: usize = size.max(1);
		Self::with_heap_size((1usize << (size.ilog2() + 1)) - 1)
	}

	fn with_heap_size(heap_size: usize) -> Self
	{
		Self
		{
			heap: Vec::with_capacity(heap_size),
			heap_size,
		}
	}

	/// Returns true if the queue has at least one element.
	pub fn has_next(&self) -> bool
	{
		!self.heap.is_empty()
	}

	pub fn len(&self) -> usize
	{
		self.heap.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.heap.is_empty()
	}

	/// Number of elements the queue can hold before growing.
	pub fn capacity(&self) -> usize
	{
		self.heap_size
	}

	/// Priority of the element `pop` would return.
	pub fn peek_priority(&self) -> Option<u64>
	{
		self.heap.first().map(|element| element.priority)
	}

	/// Push a new value with the given priority.
	pub fn push(&mut self, priority: u64, value: T)
	{
		if self.heap.len() == self.heap_size
		{
			// Grow by one full layer.
			self.heap_size = 2 * (self.heap_size + 1) - 1;
			self.heap.reserve_exact(self.heap_size - self.heap.len());
		}

		self.heap.push(HeapElement { priority, value });

		// Move the new element up while its parent has a lower priority.
		let mut index: usize = self.heap.len() - 1;
		while index > 0
		{
			let parent: usize = (index - 1) / 2;
			if self.heap[parent].priority >= priority
			{
				break;
			}

			self.heap.swap(parent, index);
			index = parent;
		}
	}

	/// Remove and return the value with the greatest priority.
	pub fn pop(&mut self) -> Option<T>
	{
		if self.heap.is_empty()
		{
			return None;
		}

		// The last element fills the vacated root and sinks along the larger child.
		let top: HeapElement<T> = self.heap.swap_remove(0);
		let length: usize = self.heap.len();
		let mut index: usize = 0;

		loop
		{
			let mut child: usize = 2 * index + 1;
			if child >= length
			{
				break;
			}

			if child + 1 < length && self.heap[child + 1].priority > self.heap[child].priority
			{
				child += 1;
			}

			if self.heap[child].priority <= self.heap[index].priority
			{
				break;
			}

			self.heap.swap(index, child);
			index = child;
		}

		Some(top.value)
	}
}

impl<T> Default for PriorityQueue<T>
{
	fn default() -> Self
	{
		Self::new()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn assert_heap<T>(queue: &PriorityQueue<T>)
	{
		for index in 1..queue.heap.len()
		{
			assert!(queue.heap[(index - 1) / 2].priority >= queue.heap[index].priority, "heap broken at {}", index);
		}
	}

	#[test]
	fn pops_in_descending_order()
	{
		let mut queue: PriorityQueue<u64> = PriorityQueue::with_capacity(2);
		let priorities: [u64; 9] = [5, 3, 4, 7, 10, 15, 3, 5, 11];

		for &priority in &priorities
		{
			queue.push(priority, priority);
			assert_heap(&queue);
		}

		let mut popped: Vec<u64> = Vec::new();
		while let Some(value) = queue.pop()
		{
			assert_heap(&queue);
			popped.push(value);
		}

		assert_eq!(popped, vec![15, 11, 10, 7, 5, 5, 4, 3, 3]);
		assert!(!queue.has_next());
		assert_eq!(queue.pop(), None);
	}

	#[test]
	fn capacity_stays_one_below_power_of_two()
	{
		let mut queue: PriorityQueue<()> = PriorityQueue::with_capacity(2);
		assert_eq!(queue.capacity(), 3);

		for i in 0..4
		{
			queue.push(i, ());
		}
		assert_eq!(queue.capacity(), 7);

		for i in 0..4
		{
			queue.push(i, ());
		}
		assert_eq!(queue.capacity(), 15);

		assert_eq!(PriorityQueue::<()>::with_capacity(8).capacity(), 15);
		assert_eq!(PriorityQueue::<()>::with_capacity(0).capacity(), 1);
		assert_eq!(PriorityQueue::<()>::new().capacity(), 63);
	}

	#[test]
	fn interleaved_push_and_pop_always_yield_maximum()
	{
		let mut queue: PriorityQueue<u64> = PriorityQueue::new();
		let mut reference: Vec<u64> = Vec::new();
		let mut seed: u64 = 0x2545F4914F6CDD1D;

		for round in 0..5000
		{
			seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
			let priority: u64 = (seed >> 33) % 1000;

			if round % 3 == 2
			{
				let expected: Option<u64> = reference.iter().copied().max();
				assert_eq!(queue.peek_priority(), expected);
				let value: Option<u64> = queue.pop();
				assert_eq!(value, expected);
				if let Some(value) = value
				{
					let position: usize = reference.iter().position(|&p| p == value).unwrap();
					reference.swap_remove(position);
				}
			}
			else
			{
				queue.push(priority, priority);
				reference.push(priority);
			}

			assert_heap(&queue);
			assert_eq!(queue.len(), reference.len());
		}
	}
}
