//! LHalo binary tree files
//!
//! The classic structure-finder output: a header of `ntrees`,
//! `totnhalos`, and per-tree node counts (all i32), followed by packed
//! 104-byte node records, little-endian throughout. Link fields use -1
//! for "none"; that sentinel stops at this boundary.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use lineage_foundation::{NodeId, TreeNode};

use crate::error::{Error, Result};
use crate::TreeSupplier;

/// Bytes per packed node record
const NODE_BYTES: usize = 104;

/// One open LHalo tree file.
pub struct LHaloTreeFile {
    reader: BufReader<File>,
    path: PathBuf,
    sizes: Vec<usize>,
    /// Byte offset of each tree's first record
    offsets: Vec<u64>,
}

impl LHaloTreeFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let ntrees = read_i32(&mut reader)?;
        let totnhalos = read_i32(&mut reader)?;
        if ntrees < 0 || totnhalos < 0 {
            return Err(Error::BadHeader {
                path: path.to_path_buf(),
                message: format!("negative counts: {ntrees} trees, {totnhalos} nodes"),
            });
        }

        let mut sizes = Vec::with_capacity(ntrees as usize);
        let mut total = 0usize;
        for _ in 0..ntrees {
            let n = read_i32(&mut reader)?;
            if n < 0 {
                return Err(Error::BadHeader {
                    path: path.to_path_buf(),
                    message: format!("negative tree size {n}"),
                });
            }
            sizes.push(n as usize);
            total += n as usize;
        }
        if total != totnhalos as usize {
            return Err(Error::BadHeader {
                path: path.to_path_buf(),
                message: format!("tree sizes sum to {total}, header says {totnhalos}"),
            });
        }

        let header_bytes = 4 * (2 + ntrees as u64);
        let mut offsets = Vec::with_capacity(sizes.len());
        let mut at = header_bytes;
        for &n in &sizes {
            offsets.push(at);
            at += (n * NODE_BYTES) as u64;
        }

        debug!(path = %path.display(), ntrees, totnhalos, "tree file opened");
        Ok(Self {
            reader,
            path: path.to_path_buf(),
            sizes,
            offsets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TreeSupplier for LHaloTreeFile {
    fn tree_count(&self) -> usize {
        self.sizes.len()
    }

    fn tree_sizes(&self) -> &[usize] {
        &self.sizes
    }

    fn load_tree(&mut self, treenr: usize) -> Result<Vec<TreeNode>> {
        let count = *self
            .sizes
            .get(treenr)
            .ok_or(Error::TreeOutOfRange {
                treenr,
                count: self.sizes.len(),
            })?;

        self.reader.seek(SeekFrom::Start(self.offsets[treenr]))?;

        let mut raw = vec![0u8; count * NODE_BYTES];
        if let Err(e) = self.reader.read_exact(&mut raw) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(Error::TruncatedTree {
                    treenr,
                    expected: count,
                    got: 0,
                });
            }
            return Err(e.into());
        }

        let mut nodes = Vec::with_capacity(count);
        for (i, chunk) in raw.chunks_exact(NODE_BYTES).enumerate() {
            nodes.push(parse_node(chunk, treenr, i)?);
        }
        Ok(nodes)
    }
}

fn parse_node(buf: &[u8], treenr: usize, index: usize) -> Result<TreeNode> {
    let first_fof = i32_at(buf, 12);
    if first_fof < 0 {
        return Err(Error::MissingFofLink {
            treenr,
            node: index,
        });
    }

    Ok(TreeNode {
        // descendant at offset 0 is not needed for tracking
        first_progenitor: link(i32_at(buf, 4)),
        next_progenitor: link(i32_at(buf, 8)),
        first_in_fof_group: NodeId(first_fof as u32),
        next_in_fof_group: link(i32_at(buf, 16)),
        len: i32_at(buf, 20),
        // m_mean200 (24) and m_tophat (32) are alternate estimates the
        // tracker does not use
        mvir: f32_at(buf, 28) as f64,
        pos: [
            f32_at(buf, 36) as f64,
            f32_at(buf, 40) as f64,
            f32_at(buf, 44) as f64,
        ],
        vel: [
            f32_at(buf, 48) as f64,
            f32_at(buf, 52) as f64,
            f32_at(buf, 56) as f64,
        ],
        vmax: f32_at(buf, 64) as f64,
        spin: [
            f32_at(buf, 68) as f64,
            f32_at(buf, 72) as f64,
            f32_at(buf, 76) as f64,
        ],
        most_bound_id: i64_at(buf, 80),
        snap: i32_at(buf, 88),
    })
}

fn link(raw: i32) -> Option<NodeId> {
    if raw < 0 {
        None
    } else {
        Some(NodeId(raw as u32))
    }
}

fn i32_at(buf: &[u8], off: usize) -> i32 {
    i32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

fn i64_at(buf: &[u8], off: usize) -> i64 {
    i64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

fn f32_at(buf: &[u8], off: usize) -> f32 {
    f32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(i32::from_le_bytes(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct RawNode {
        links: [i32; 5],
        len: i32,
        mvir: f32,
        pos: [f32; 3],
        vel: [f32; 3],
        vmax: f32,
        spin: [f32; 3],
        most_bound_id: i64,
        snap: i32,
    }

    fn raw(links: [i32; 5], len: i32, mvir: f32, snap: i32) -> RawNode {
        RawNode {
            links,
            len,
            mvir,
            pos: [1.0, 2.0, 3.0],
            vel: [-1.0, -2.0, -3.0],
            vmax: 210.5,
            spin: [0.1, 0.2, 0.3],
            most_bound_id: 987654321012,
            snap,
        }
    }

    fn write_node(buf: &mut Vec<u8>, n: &RawNode) {
        for v in n.links {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&n.len.to_le_bytes());
        buf.extend_from_slice(&0.0f32.to_le_bytes()); // m_mean200
        buf.extend_from_slice(&n.mvir.to_le_bytes());
        buf.extend_from_slice(&0.0f32.to_le_bytes()); // m_tophat
        for v in n.pos {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        for v in n.vel {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&0.0f32.to_le_bytes()); // vel_disp
        buf.extend_from_slice(&n.vmax.to_le_bytes());
        for v in n.spin {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&n.most_bound_id.to_le_bytes());
        buf.extend_from_slice(&n.snap.to_le_bytes());
        buf.extend_from_slice(&7i32.to_le_bytes()); // file_nr
        buf.extend_from_slice(&3i32.to_le_bytes()); // subhalo_index
        buf.extend_from_slice(&0.5f32.to_le_bytes()); // sub_half_mass
    }

    fn write_file(trees: &[Vec<RawNode>]) -> tempfile::NamedTempFile {
        let mut buf = Vec::new();
        let total: usize = trees.iter().map(|t| t.len()).sum();
        buf.extend_from_slice(&(trees.len() as i32).to_le_bytes());
        buf.extend_from_slice(&(total as i32).to_le_bytes());
        for t in trees {
            buf.extend_from_slice(&(t.len() as i32).to_le_bytes());
        }
        for t in trees {
            for n in t {
                write_node(&mut buf, n);
            }
        }
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&buf).unwrap();
        f
    }

    #[test]
    fn test_round_trip_against_handcrafted_image() {
        let trees = vec![
            vec![
                raw([-1, 1, -1, 0, -1], 100, 5.5, 1),
                raw([0, -1, -1, 0, -1], 80, 4.5, 0),
            ],
            vec![raw([-1, -1, -1, 0, -1], 50, 2.0, 1)],
        ];
        let file = write_file(&trees);

        let mut supplier = LHaloTreeFile::open(file.path()).unwrap();
        assert_eq!(supplier.tree_count(), 2);
        assert_eq!(supplier.tree_sizes(), &[2, 1]);

        let tree = supplier.load_tree(0).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].first_progenitor, Some(NodeId(1)));
        assert_eq!(tree[0].next_progenitor, None);
        assert_eq!(tree[0].first_in_fof_group, NodeId(0));
        assert_eq!(tree[0].len, 100);
        assert!((tree[0].mvir - 5.5).abs() < 1e-6);
        assert!((tree[0].vmax - 210.5).abs() < 1e-4);
        assert_eq!(tree[0].most_bound_id, 987654321012);
        assert_eq!(tree[0].snap, 1);
        assert_eq!(tree[1].snap, 0);

        // trees are independently addressable
        let second = supplier.load_tree(1).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].len, 50);
        let first_again = supplier.load_tree(0).unwrap();
        assert_eq!(first_again[0].len, 100);
    }

    #[test]
    fn test_header_mismatch_is_fatal() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&5i32.to_le_bytes()); // claims 5 nodes
        buf.extend_from_slice(&2i32.to_le_bytes()); // but the tree has 2
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&buf).unwrap();

        assert!(matches!(
            LHaloTreeFile::open(f.path()),
            Err(Error::BadHeader { .. })
        ));
    }

    #[test]
    fn test_truncated_tree_is_fatal() {
        let trees = vec![vec![raw([-1, -1, -1, 0, -1], 10, 1.0, 0)]];
        let file = write_file(&trees);
        // chop the last node record short
        let len = std::fs::metadata(file.path()).unwrap().len();
        let f = std::fs::OpenOptions::new()
            .write(true)
            .open(file.path())
            .unwrap();
        f.set_len(len - 10).unwrap();

        let mut supplier = LHaloTreeFile::open(file.path()).unwrap();
        assert!(matches!(
            supplier.load_tree(0),
            Err(Error::TruncatedTree { .. })
        ));
    }

    #[test]
    fn test_missing_fof_link_is_fatal() {
        let trees = vec![vec![raw([-1, -1, -1, -1, -1], 10, 1.0, 0)]];
        let file = write_file(&trees);
        let mut supplier = LHaloTreeFile::open(file.path()).unwrap();
        assert!(matches!(
            supplier.load_tree(0),
            Err(Error::MissingFofLink { .. })
        ));
    }
}
