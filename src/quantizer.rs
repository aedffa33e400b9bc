//! Octree colour quantization.
//!
//! The source bitmap is scanned once into a colour index and an octree. Clusters are
//! then selected greedily, always splitting the node holding the most pixels, and
//! every cluster is replaced by the frequency weighted average of the colours it
//! absorbs. Colour counts are processed in ascending order and each one extends the
//! selection of the previous one.

use tracing::{debug, info};

use crate::bitmap::{Bitmap, CHANNELS};
use crate::color::{Color, Vector3};
use crate::config::QuantizerConfig;
use crate::error::{QuantizeError, Result};
use crate::hash_map::{PrimeHashMap, PrimeHashSet};
use crate::oct_tree::{NodeId, OctTree};
use crate::priority_queue::PriorityQueue;

/// Index of a record inside the colour index.
pub type RecordId = u32;

/// Number of distinct 24-bit colours.
const COLOUR_SPACE: usize = 1 << 24;

/// Center and half extent of the octree root, covering the whole RGB cube.
const ROOT_POSITION: Vector3 = Vector3::new(128, 128, 128);
const ROOT_HALF_SIZE: i64 = 128;

/// One distinct colour of the source image.
#[derive(Debug, Clone)]
pub struct ColorRecord
{
	color: Color,
	frequency: u64,
	recursive_frequency: Option<u64>,
	replacement: Option<usize>,
}

impl ColorRecord
{
	fn new(color: Color) -> Self
	{
		Self
		{
			color,
			frequency: 1,
			recursive_frequency: None,
			replacement: None,
		}
	}

	pub fn color(&self) -> Color
	{
		self.color
	}

	/// Number of pixels with exactly this colour.
	pub fn frequency(&self) -> u64
	{
		self.frequency
	}

	/// Slot of the replacement table holding the colour this record is painted with.
	pub fn replacement(&self) -> Option<usize>
	{
		self.replacement
	}
}

/// Frequency index: owns one record per distinct colour, keyed by the colour's 24-bit key.
#[derive(Debug, Clone)]
pub struct ColorIndex
{
	map: PrimeHashMap<RecordId>,
	records: Vec<ColorRecord>,
}

impl ColorIndex
{
	/// Create an index sized for roughly `expected` distinct colours.
	pub fn with_capacity(expected: usize) -> Result<Self>
	{
		Ok(Self
		{
			map: PrimeHashMap::with_capacity(expected)?,
			records: Vec::new(),
		})
	}

	/// Count one more pixel of `color`. Returns the record id and whether the colour is new.
	pub fn observe(&mut self, color: Color) -> Result<(RecordId, bool)>
	{
		if let Some(&id) = self.map.get(color.key())
		{
			self.records[id as usize].frequency += 1;
			return Ok((id, false));
		}

		let id: RecordId = self.records.len() as RecordId;
		self.records.push(ColorRecord::new(color));
		self.map.set(color.key(), id)?;
		Ok((id, true))
	}

	pub fn get(&self, color: Color) -> Option<&ColorRecord>
	{
		self.map.get(color.key()).map(|&id| &self.records[id as usize])
	}

	pub fn record(&self, id: RecordId) -> &ColorRecord
	{
		&self.records[id as usize]
	}

	pub fn records(&self) -> &[ColorRecord]
	{
		&self.records
	}

	/// Number of distinct colours.
	pub fn len(&self) -> usize
	{
		self.records.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.records.is_empty()
	}
}

/// Outputs for one requested colour count. Both bitmaps are owned copies.
#[derive(Debug, Clone)]
pub struct Reduction
{
	/// Colour count as requested by the caller.
	pub requested: usize,

	/// Colours actually used, smaller than `requested` when the image has fewer distinct colours.
	pub colors: usize,

	/// The source image painted with the reduced palette.
	pub image: Bitmap,

	/// One tile per palette colour.
	pub palette: Bitmap,
}

/// Stateful quantizer over one source bitmap.
#[derive(Debug)]
pub struct Quantizer<'a>
{
	source: &'a Bitmap,
	config: QuantizerConfig,
	index: ColorIndex,
	tree: OctTree<RecordId>,
	queue: PriorityQueue<NodeId>,
	selected: Vec<NodeId>,
	exclude: PrimeHashSet,
	replacements: Vec<Color>,
	previous: usize,
	output: Bitmap,
	palette: Bitmap,
	values: Vec<RecordId>,
}

impl<'a> Quantizer<'a>
{
	/// Scan every pixel of `source` once, building the colour index and the octree.
	pub fn scan(source: &'a Bitmap, config: QuantizerConfig) -> Result<Self>
	{
		config.validate()?;

		let (width, height): (u32, u32) = source.dimensions();
		if source.pixel_count() == 0
		{
			return Err(QuantizeError::EmptyImage { width, height });
		}

		let expected: usize = (source.pixel_count() / config.duplication_factor).clamp(1, COLOUR_SPACE);
		let mut index: ColorIndex = ColorIndex::with_capacity(expected)?;
		let mut tree: OctTree<RecordId> = OctTree::new(ROOT_POSITION, ROOT_HALF_SIZE);

		for pixel in source.as_bytes().chunks_exact(CHANNELS)
		{
			let color: Color = Color::new(pixel[0], pixel[1], pixel[2]);
			let (id, is_new) = index.observe(color)?;
			if is_new
			{
				tree.insert(color.to_vector(), id);
			}
		}

		info!(width, height, colours = index.len(), nodes = tree.len(), "scanned image");

		let mut quantizer: Quantizer<'a> = Self
		{
			source,
			config,
			index,
			tree,
			queue: PriorityQueue::new(),
			selected: Vec::new(),
			exclude: PrimeHashSet::new(),
			replacements: Vec::new(),
			previous: 0,
			output: Bitmap::new(width, height),
			palette: Bitmap::new(0, 0),
			values: Vec::with_capacity(256),
		};

		let root: NodeId = quantizer.tree.root();
		let priority: u64 = quantizer.recursive_frequency(root);
		quantizer.queue.push(priority, root);

		Ok(quantizer)
	}

	/// Number of distinct colours in the source.
	pub fn distinct_colors(&self) -> usize
	{
		self.index.len()
	}

	pub fn index(&self) -> &ColorIndex
	{
		&self.index
	}

	pub fn tree(&self) -> &OctTree<RecordId>
	{
		&self.tree
	}

	/// Clusters selected so far, in selection order.
	pub fn selected(&self) -> &[NodeId]
	{
		&self.selected
	}

	/// Colour currently assigned to a record.
	pub fn replacement_of(&self, id: RecordId) -> Option<Color>
	{
		self.index.record(id).replacement.map(|slot| self.replacements[slot])
	}

	/// Pixels stored in the subtree of `node`, memoized on the node's occupant.
	pub fn recursive_frequency(&mut self, node: NodeId) -> u64
	{
		let Some(&occupant) = self.tree.node(node).value() else
		{
			return 0;
		};

		if let Some(frequency) = self.index.records[occupant as usize].recursive_frequency
		{
			return frequency;
		}

		self.values.clear();
		self.tree.values(node, &mut self.values);
		let frequency: u64 = self.values.iter().map(|&id| self.index.records[id as usize].frequency).sum();

		self.index.records[occupant as usize].recursive_frequency = Some(frequency);
		frequency
	}

	/// Extend the selection until it holds `count` clusters or the tree is exhausted.
	/// Each step takes the node with the most pixels and queues its children.
	pub fn select(&mut self, count: usize) -> &[NodeId]
	{
		let mut children: [NodeId; 8] = [0; 8];

		while self.selected.len() < count
		{
			let Some(node) = self.queue.pop() else
			{
				break;
			};

			let mut length: usize = 0;
			for child in self.tree.children(node)
			{
				children[length] = child;
				length += 1;
			}

			for &child in &children[..length]
			{
				let priority: u64 = self.recursive_frequency(child);
				self.queue.push(priority, child);
			}

			self.selected.push(node);
		}

		&self.selected[..count.min(self.selected.len())]
	}

	/// Produce the recoloured image and palette for `requested` colours.
	/// Colour counts must be given in ascending order.
	pub fn reduce(&mut self, requested: usize) -> Result<Reduction>
	{
		if requested == 0
		{
			return Err(QuantizeError::InvalidTarget(requested));
		}

		let desired: usize = self.select(requested).len();
		if desired < self.previous
		{
			return Err(QuantizeError::OutOfOrder { previous: self.previous, requested });
		}

		// Newly selected clusters claim their subtrees from their ancestors.
		for &node in &self.selected[self.previous..desired]
		{
			self.exclude.insert(node as u32)?;
		}

		let side: u32 = self.config.block_size * ceil_sqrt(desired) as u32;
		self.palette.resize(side, side);

		for index in 0..desired
		{
			let color: Color = self.average_cluster(index)?;
			self.paint_block(index, color);
		}

		self.previous = desired;
		self.paint_output()?;
		debug!(requested, colours = desired, "reduced image");

		Ok(Reduction
		{
			requested,
			colors: desired,
			image: self.output.clone(),
			palette: self.palette.clone(),
		})
	}

	/// Average the colours absorbed by the cluster at `index` of the selection and
	/// point every absorbed record at the result.
	fn average_cluster(&mut self, index: usize) -> Result<Color>
	{
		let node: NodeId = self.selected[index];
		let occupant: RecordId = *self.tree.node(node).value().ok_or(QuantizeError::Invariant("selected cluster has no colour"))?;

		let slot: usize = if index >= self.previous
		{
			self.replacements.push(Color::default());
			self.replacements.len() - 1
		}
		else
		{
			self.index.records[occupant as usize].replacement.ok_or(QuantizeError::Invariant("cluster lost its replacement"))?
		};

		self.values.clear();
		self.tree.values_excluding(node, &self.exclude, &mut self.values);

		let mut sum: Vector3 = Vector3::default();
		let mut count: i64 = 0;
		for &id in &self.values
		{
			let record: &mut ColorRecord = &mut self.index.records[id as usize];
			record.replacement = Some(slot);
			sum.add_scaled(record.color.to_vector(), record.frequency as i64);
			count += record.frequency as i64;
		}

		if count == 0
		{
			return Err(QuantizeError::Invariant("cluster absorbed no pixels"));
		}

		// Integer division, the remainder is dropped.
		let color: Color = Color::from_vector(sum / count);
		self.replacements[slot] = color;
		Ok(color)
	}

	/// Fill the palette tile of the cluster at `index`, tiles are laid out row-major.
	fn paint_block(&mut self, index: usize, color: Color)
	{
		let block: usize = self.config.block_size as usize;
		let width: usize = self.palette.width() as usize;
		let row: usize = block * ((index * block) / width);
		let column: usize = (index * block) % width;
		let buffer: &mut [u8] = self.palette.as_bytes_mut();

		for ri in 0..block
		{
			for ci in 0..block
			{
				color.write_opaque(buffer, ((row + ri) * width + column + ci) * CHANNELS);
			}
		}
	}

	/// Paint every source pixel with the replacement of its colour.
	fn paint_output(&mut self) -> Result<()>
	{
		let source: &[u8] = self.source.as_bytes();
		let output: &mut [u8] = self.output.as_bytes_mut();

		for i in (0..source.len()).step_by(CHANNELS)
		{
			let slot: usize = self.index.get(Color::from_buffer(source, i))
				.and_then(|record| record.replacement)
				.ok_or(QuantizeError::Invariant("pixel colour has no replacement"))?;
			self.replacements[slot].write_opaque(output, i);
		}

		Ok(())
	}
}

/// Smallest `s` with `s * s >= n`.
fn ceil_sqrt(n: usize) -> usize
{
	let mut s: usize = (n as f64).sqrt() as usize;
	while s * s < n
	{
		s += 1;
	}
	while s > 0 && (s - 1) * (s - 1) >= n
	{
		s -= 1;
	}
	s
}
