//! Adaptive octree over integer 3D space.
//!
//! Every node stores at most one key, the key nearest to its center among all keys
//! routed through it. When a second key reaches an occupied node the node gains
//! eight children of half its extent and the farther of the two keys moves into the
//! child whose octant contains it. Nodes live in an arena and refer to their
//! children by index.

use std::ops::Range;

use crate::color::Vector3;
use crate::hash_map::PrimeHashSet;

/// Index of a node inside its tree.
pub type NodeId = usize;

/// Region of space covered by an octree node.
#[derive(Debug, Clone)]
pub struct ClusterNode<V>
{
	position: Vector3,
	half_size: i64,
	occupant: Option<(Vector3, V)>,
	children: Option<[NodeId; 8]>,
}

impl<V> ClusterNode<V>
{
	fn new(position: Vector3, half_size: i64) -> Self
	{
		Self
		{
			position,
			half_size,
			occupant: None,
			children: None,
		}
	}

	/// Center of the region.
	pub fn position(&self) -> Vector3
	{
		self.position
	}

	pub fn half_size(&self) -> i64
	{
		self.half_size
	}

	/// Key stored directly at this node.
	pub fn key(&self) -> Option<Vector3>
	{
		self.occupant.as_ref().map(|(key, _)| *key)
	}

	/// Value stored directly at this node.
	pub fn value(&self) -> Option<&V>
	{
		self.occupant.as_ref().map(|(_, value)| value)
	}

	pub fn has_children(&self) -> bool
	{
		self.children.is_some()
	}

	/// A node is live once something has been stored in or below it.
	fn is_live(&self) -> bool
	{
		self.occupant.is_some() || self.children.is_some()
	}
}

/// Octree storing one value per distinct key.
#[derive(Debug, Clone)]
pub struct OctTree<V>
{
	nodes: Vec<ClusterNode<V>>,
}

impl<V: Copy> OctTree<V>
{
	/// Create a tree whose root is centered at `position` and extends `half_size` in every direction.
	pub fn new(position: Vector3, half_size: i64) -> Self
	{
		Self { nodes: vec![ClusterNode::new(position, half_size)] }
	}

	pub fn root(&self) -> NodeId
	{
		0
	}

	pub fn node(&self, id: NodeId) -> &ClusterNode<V>
	{
		&self.nodes[id]
	}

	/// Number of allocated nodes, including empty children.
	pub fn len(&self) -> usize
	{
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.nodes[0].occupant.is_none()
	}

	/// Ids of all allocated nodes.
	pub fn node_ids(&self) -> Range<NodeId>
	{
		0..self.nodes.len()
	}

	/// Octant of `key` relative to the center of a node, ties fall to the lower octant.
	fn region(&self, id: NodeId, key: &Vector3) -> usize
	{
		let position: Vector3 = self.nodes[id].position;
		let mut region: usize = 0;
		if key.x > position.x
		{
			region += 1;
		}
		if key.y > position.y
		{
			region += 2;
		}
		if key.z > position.z
		{
			region += 4;
		}
		region
	}

	fn create_children(&mut self, id: NodeId) -> [NodeId; 8]
	{
		let position: Vector3 = self.nodes[id].position;
		let half: i64 = self.nodes[id].half_size / 2;
		let first: NodeId = self.nodes.len();

		for region in 0..8
		{
			let offset = |bit: usize| if region & bit != 0 { half } else { -half };
			let center: Vector3 = Vector3::new(position.x + offset(1), position.y + offset(2), position.z + offset(4));
			self.nodes.push(ClusterNode::new(center, half));
		}

		let children: [NodeId; 8] = std::array::from_fn(|region| first + region);
		self.nodes[id].children = Some(children);
		children
	}

	/// Store `value` under `key`, replacing the value of an equal key.
	pub fn insert(&mut self, key: Vector3, value: V)
	{
		let mut id: NodeId = self.root();
		let mut key: Vector3 = key;
		let mut value: V = value;

		loop
		{
			let (occupant_key, occupant_value) = match self.nodes[id].occupant
			{
				None =>
				{
					self.nodes[id].occupant = Some((key, value));
					return;
				},
				Some((occupant_key, _)) if occupant_key == key =>
				{
					self.nodes[id].occupant = Some((key, value));
					return;
				},
				Some(occupant) => occupant,
			};

			let children: [NodeId; 8] = match self.nodes[id].children
			{
				Some(children) => children,
				None => self.create_children(id),
			};

			// The nearer key stays here, the farther one continues into its octant.
			let position: Vector3 = self.nodes[id].position;
			if key.sq_distance(&position) < occupant_key.sq_distance(&position)
			{
				self.nodes[id].occupant = Some((key, value));
				id = children[self.region(id, &occupant_key)];
				key = occupant_key;
				value = occupant_value;
			}
			else
			{
				id = children[self.region(id, &key)];
			}
		}
	}

	/// Node currently holding `key`.
	pub fn find_node(&self, key: &Vector3) -> Option<NodeId>
	{
		let mut id: NodeId = self.root();

		loop
		{
			let node: &ClusterNode<V> = &self.nodes[id];
			if node.key().as_ref() == Some(key)
			{
				return Some(id);
			}

			let children: [NodeId; 8] = node.children?;
			id = children[self.region(id, key)];
		}
	}

	/// Value stored under `key`.
	pub fn get(&self, key: &Vector3) -> Option<V>
	{
		self.find_node(key).and_then(|id| self.nodes[id].value().copied())
	}

	/// Children of a node that hold a value or have descendants.
	pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_
	{
		self.nodes[id].children
			.into_iter()
			.flatten()
			.filter(|&child| self.nodes[child].is_live())
	}

	/// Append every value in the subtree rooted at `id` to `values`, node before descendants.
	pub fn values(&self, id: NodeId, values: &mut Vec<V>)
	{
		self.collect(id, values, |_| false);
	}

	/// Like `values`, but subtrees rooted at a descendant whose id is in `exclude` are skipped.
	/// The starting node itself is never skipped.
	pub fn values_excluding(&self, id: NodeId, exclude: &PrimeHashSet, values: &mut Vec<V>)
	{
		self.collect(id, values, |child| exclude.contains(child as u32));
	}

	fn collect<F>(&self, id: NodeId, values: &mut Vec<V>, skip: F)
	where
		F: Fn(NodeId) -> bool,
	{
		let mut stack: Vec<NodeId> = vec![id];

		while let Some(next) = stack.pop()
		{
			let node: &ClusterNode<V> = &self.nodes[next];
			if let Some((_, value)) = node.occupant
			{
				values.push(value);
			}

			if let Some(children) = node.children
			{
				stack.extend(children.iter().rev().copied().filter(|&child| !skip(child)));
			}
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn color_tree() -> OctTree<u32>
	{
		OctTree::new(Vector3::new(128, 128, 128), 128)
	}

	fn sample_keys() -> Vec<Vector3>
	{
		let mut keys: Vec<Vector3> = Vec::new();
		for r in (0..256).step_by(37)
		{
			for g in (0..256).step_by(51)
			{
				for b in (0..256).step_by(85)
				{
					keys.push(Vector3::new(r, g, b));
				}
			}
		}
		keys
	}

	#[test]
	fn every_inserted_key_is_found()
	{
		let mut tree: OctTree<u32> = color_tree();
		let keys: Vec<Vector3> = sample_keys();

		for (i, key) in keys.iter().enumerate()
		{
			tree.insert(*key, i as u32);
		}

		for (i, key) in keys.iter().enumerate()
		{
			assert_eq!(tree.get(key), Some(i as u32));
		}
		assert_eq!(tree.get(&Vector3::new(1, 1, 1)), None);

		let mut values: Vec<u32> = Vec::new();
		tree.values(tree.root(), &mut values);
		values.sort();
		assert_eq!(values, (0..keys.len() as u32).collect::<Vec<u32>>());
	}

	#[test]
	fn equal_key_overwrites_in_place()
	{
		let mut tree: OctTree<u32> = color_tree();
		tree.insert(Vector3::new(10, 20, 30), 1);
		tree.insert(Vector3::new(10, 20, 30), 2);

		assert_eq!(tree.get(&Vector3::new(10, 20, 30)), Some(2));
		assert_eq!(tree.len(), 1);
		assert!(!tree.node(tree.root()).has_children());
	}

	#[test]
	fn occupant_is_nearest_to_center()
	{
		let mut tree: OctTree<u32> = color_tree();
		for (i, key) in sample_keys().iter().enumerate()
		{
			tree.insert(*key, i as u32);
		}

		for id in tree.node_ids()
		{
			let node: &ClusterNode<u32> = tree.node(id);
			let Some(key) = node.key() else { continue };
			let distance: i64 = key.sq_distance(&node.position());

			let mut stack: Vec<NodeId> = tree.children(id).collect();
			while let Some(next) = stack.pop()
			{
				if let Some(other) = tree.node(next).key()
				{
					assert!(distance <= other.sq_distance(&node.position()));
				}
				stack.extend(tree.children(next));
			}
		}
	}

	#[test]
	fn closer_key_displaces_occupant()
	{
		let mut tree: OctTree<u32> = color_tree();
		tree.insert(Vector3::new(0, 0, 0), 1);
		tree.insert(Vector3::new(10, 10, 10), 2);

		let root: NodeId = tree.root();
		assert_eq!(tree.node(root).value(), Some(&2));

		let children: Vec<NodeId> = tree.children(root).collect();
		assert_eq!(children.len(), 1);
		assert_eq!(tree.node(children[0]).position(), Vector3::new(64, 64, 64));
		assert_eq!(tree.node(children[0]).half_size(), 64);
		assert_eq!(tree.node(children[0]).value(), Some(&1));
		assert_eq!(tree.find_node(&Vector3::new(0, 0, 0)), Some(children[0]));
	}

	#[test]
	fn ties_fall_to_lower_octant()
	{
		let mut tree: OctTree<u32> = color_tree();
		tree.insert(Vector3::new(128, 128, 128), 1);
		tree.insert(Vector3::new(128, 128, 200), 2);
		tree.insert(Vector3::new(128, 129, 128), 3);

		let root: NodeId = tree.root();
		let child_positions: Vec<Vector3> = tree.children(root).map(|id| tree.node(id).position()).collect();
		assert_eq!(child_positions, vec![Vector3::new(64, 192, 64), Vector3::new(64, 64, 192)]);
	}

	#[test]
	fn values_excluding_prunes_descendants_only()
	{
		let mut tree: OctTree<u32> = color_tree();
		tree.insert(Vector3::new(120, 120, 120), 1);
		tree.insert(Vector3::new(10, 10, 10), 2);
		tree.insert(Vector3::new(250, 250, 250), 3);
		tree.insert(Vector3::new(5, 5, 5), 4);

		let root: NodeId = tree.root();
		let low: NodeId = tree.find_node(&Vector3::new(10, 10, 10)).unwrap();

		let mut exclude: PrimeHashSet = PrimeHashSet::new();
		exclude.insert(root as u32).unwrap();
		exclude.insert(low as u32).unwrap();

		let mut values: Vec<u32> = Vec::new();
		tree.values_excluding(root, &exclude, &mut values);
		values.sort();
		assert_eq!(values, vec![1, 3]);

		values.clear();
		tree.values_excluding(low, &exclude, &mut values);
		values.sort();
		assert_eq!(values, vec![2, 4]);
	}
}
