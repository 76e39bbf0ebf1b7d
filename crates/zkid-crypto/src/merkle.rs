//! Sorted-leaf Poseidon Merkle trees for the certificate and circuit
//! registries.
//!
//! Leaves are reduced to field elements and sorted ascending before
//! insertion. Duplicates occupy their own slots, empty slots hold the zero
//! element, and only populated nodes are hashed. Two
//! parties holding the same leaf set always arrive at the same root, which
//! is what the on-chain registries publish.

use crate::leaf::certificate_leaf_hash;
use crate::poseidon::{fr_from_word, fr_to_word, poseidon_hash2_fields};
use ark_bn254::Fr;
use ark_ff::Zero;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zkid_types::{
    Bytes32, CircuitManifest, PackagedCertificate, ZkidError, ZkidResult, CERTIFICATE_TREE_HEIGHT,
    CIRCUIT_TREE_HEIGHT,
};

/// Builds trees of one fixed height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MerkleEngine {
    height: usize,
}

impl MerkleEngine {
    pub fn new(height: usize) -> Self {
        Self { height }
    }

    pub fn certificates() -> Self {
        Self::new(CERTIFICATE_TREE_HEIGHT)
    }

    pub fn circuits() -> Self {
        Self::new(CIRCUIT_TREE_HEIGHT)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn capacity(&self) -> usize {
        1usize << self.height
    }

    pub fn build<I>(&self, leaves: I) -> ZkidResult<MerkleTree>
    where
        I: IntoIterator<Item = Bytes32>,
    {
        MerkleTree::new(self.height, leaves)
    }

    pub fn root<I>(&self, leaves: I) -> ZkidResult<Bytes32>
    where
        I: IntoIterator<Item = Bytes32>,
    {
        Ok(self.build(leaves)?.root())
    }
}

/// Membership witness: the leaf, its position and one sibling per level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf: Bytes32,
    pub index: u64,
    pub siblings: Vec<Bytes32>,
}

impl InclusionProof {
    /// Walks the path using the index bits: a set bit means the node is a
    /// right child.
    pub fn compute_root(&self) -> Bytes32 {
        let mut node = fr_from_word(&self.leaf);
        let mut path = self.index;
        for sibling in &self.siblings {
            let sibling = fr_from_word(sibling);
            node = if path & 1 == 1 {
                poseidon_hash2_fields(sibling, node)
            } else {
                poseidon_hash2_fields(node, sibling)
            };
            path >>= 1;
        }
        fr_to_word(&node)
    }

    pub fn verify(&self, root: &Bytes32) -> bool {
        self.compute_root() == *root
    }
}

#[derive(Clone, Debug)]
pub struct MerkleTree {
    height: usize,
    leaves: Vec<Bytes32>,
    zeroes: Vec<Fr>,
    // layers[0] holds the leaves, layers[height] the root; only populated
    // nodes are stored.
    layers: Vec<Vec<Fr>>,
}

impl MerkleTree {
    pub fn new<I>(height: usize, leaves: I) -> ZkidResult<Self>
    where
        I: IntoIterator<Item = Bytes32>,
    {
        if height == 0 || height >= usize::BITS as usize {
            return Err(ZkidError::InvalidInput(format!("Invalid tree height: {}", height)));
        }

        // Leaves are ordered by their field value; duplicates keep their slots.
        let mut leaves: Vec<Bytes32> = leaves
            .into_iter()
            .map(|leaf| fr_to_word(&fr_from_word(&leaf)))
            .collect();
        leaves.sort();

        let capacity = 1usize << height;
        if leaves.len() > capacity {
            return Err(ZkidError::InvalidInput(format!(
                "Too many leaves for height {}: {} > {}",
                height,
                leaves.len(),
                capacity
            )));
        }

        let mut zeroes = Vec::with_capacity(height + 1);
        let mut current = Fr::zero();
        zeroes.push(current);
        for _ in 0..height {
            current = poseidon_hash2_fields(current, current);
            zeroes.push(current);
        }

        let mut layers = Vec::with_capacity(height + 1);
        layers.push(leaves.iter().map(fr_from_word).collect::<Vec<Fr>>());
        for level in 0..height {
            let curr = &layers[level];
            let next: Vec<Fr> = curr
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or(zeroes[level]);
                    poseidon_hash2_fields(pair[0], right)
                })
                .collect();
            layers.push(next);
        }

        debug!("Built Merkle tree: height={}, leaves={}", height, leaves.len());

        Ok(Self {
            height,
            leaves,
            zeroes,
            layers,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Leaves as field elements, sorted ascending.
    pub fn leaves(&self) -> &[Bytes32] {
        &self.leaves
    }

    pub fn root(&self) -> Bytes32 {
        let root = self.layers[self.height]
            .first()
            .copied()
            .unwrap_or(self.zeroes[self.height]);
        fr_to_word(&root)
    }

    pub fn index_of(&self, leaf: &Bytes32) -> Option<usize> {
        self.leaves.binary_search(&fr_to_word(&fr_from_word(leaf))).ok()
    }

    pub fn proof_at(&self, index: usize) -> ZkidResult<InclusionProof> {
        let leaf = *self.leaves.get(index).ok_or_else(|| {
            ZkidError::InvalidInput(format!("Leaf index {} out of range ({})", index, self.leaves.len()))
        })?;

        let mut siblings = Vec::with_capacity(self.height);
        let mut idx = index;
        for level in 0..self.height {
            let sibling_idx = idx ^ 1;
            let sibling = self.layers[level]
                .get(sibling_idx)
                .copied()
                .unwrap_or(self.zeroes[level]);
            siblings.push(fr_to_word(&sibling));
            idx >>= 1;
        }

        Ok(InclusionProof {
            leaf,
            index: index as u64,
            siblings,
        })
    }

    pub fn inclusion_proof(&self, leaf: &Bytes32) -> ZkidResult<InclusionProof> {
        let index = self
            .index_of(leaf)
            .ok_or_else(|| ZkidError::InvalidInput(format!("Leaf {} is not in the tree", leaf)))?;
        self.proof_at(index)
    }
}

// ============================================================================
// Registry Trees
// ============================================================================

/// Root of the certificate registry tree for a packaged certificate set.
pub fn certificate_root(certs: &[PackagedCertificate], version: u8) -> ZkidResult<Bytes32> {
    let leaves = certs
        .iter()
        .map(|cert| certificate_leaf_hash(cert, version))
        .collect::<ZkidResult<Vec<_>>>()?;
    MerkleEngine::certificates().root(leaves)
}

/// Root of the circuit registry tree over verification-key hashes.
pub fn circuit_root<I>(vkey_hashes: I) -> ZkidResult<Bytes32>
where
    I: IntoIterator<Item = Bytes32>,
{
    MerkleEngine::circuits().root(vkey_hashes)
}

pub fn circuit_manifest_root(manifest: &CircuitManifest) -> ZkidResult<Bytes32> {
    circuit_root(manifest.circuits.values().map(|entry| entry.hash))
}

/// Proves that `vkey_hash` is one of the manifest's circuits.
pub fn circuit_inclusion_proof(vkey_hash: &Bytes32, manifest: &CircuitManifest) -> ZkidResult<InclusionProof> {
    MerkleEngine::circuits()
        .build(manifest.circuits.values().map(|entry| entry.hash))?
        .inclusion_proof(vkey_hash)
}
