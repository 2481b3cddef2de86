//! Binary output sink
//!
//! One file per output snapshot per input file, named
//! `{base}_z{redshift:.3}_{filenr}`. Each file starts with a placeholder
//! header of `ntrees + 2` i32 slots that `finalize` back-fills with the
//! tree count, the total record count, and the per-tree counts. Records
//! are packed little-endian in per-snapshot write order, which is exactly
//! the order the pre-write pass assigned to `merge_into_id` targets.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use lineage_engine::{EmittedHalo, TreeYield};
use lineage_foundation::{EpochTable, GalaxyData};

use crate::error::{Error, Result};
use crate::OutputSink;

/// Bytes per packed output record
pub const RECORD_BYTES: usize = 248;

struct SnapWriter {
    snap: i32,
    path: PathBuf,
    file: BufWriter<File>,
    total: i32,
    per_tree: Vec<i32>,
}

/// Per-snapshot binary writer for one input file.
pub struct BinaryOutputSink {
    snaps: Vec<SnapWriter>,
    ntrees: usize,
    finalized: bool,
}

impl BinaryOutputSink {
    pub fn create(
        dir: &Path,
        base: &str,
        filenr: i32,
        output_snaps: &[i32],
        epochs: &EpochTable,
        ntrees: usize,
    ) -> Result<Self> {
        let mut snaps = Vec::with_capacity(output_snaps.len());
        for &snap in output_snaps {
            let z = epochs
                .redshift(snap)
                .ok_or(Error::UnknownSnapshot { snap })?;
            let path = dir.join(format!("{base}_z{z:.3}_{filenr}"));
            let mut file = BufWriter::new(File::create(&path)?);

            // placeholder header, back-filled on finalize
            for _ in 0..ntrees + 2 {
                file.write_all(&0i32.to_le_bytes())?;
            }

            debug!(path = %path.display(), snap, "output file created");
            snaps.push(SnapWriter {
                snap,
                path,
                file,
                total: 0,
                per_tree: vec![0; ntrees],
            });
        }

        Ok(Self {
            snaps,
            ntrees,
            finalized: false,
        })
    }
}

impl OutputSink for BinaryOutputSink {
    fn write_tree(&mut self, treenr: usize, tree: &TreeYield) -> Result<()> {
        for sw in &mut self.snaps {
            let mut written = 0;
            for halo in tree.halos.iter().filter(|h| h.record.snap == sw.snap) {
                write_record(&mut sw.file, halo)?;
                written += 1;
            }
            sw.per_tree[treenr] = written;
            sw.total += written;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        debug_assert!(!self.finalized);
        for sw in &mut self.snaps {
            sw.file.flush()?;
            sw.file.seek(SeekFrom::Start(0))?;
            sw.file.write_all(&(self.ntrees as i32).to_le_bytes())?;
            sw.file.write_all(&sw.total.to_le_bytes())?;
            for &n in &sw.per_tree {
                sw.file.write_all(&n.to_le_bytes())?;
            }
            sw.file.flush()?;
            info!(path = %sw.path.display(), records = sw.total, "output file finalized");
        }
        self.finalized = true;
        Ok(())
    }
}

fn write_record(w: &mut impl Write, halo: &EmittedHalo) -> Result<()> {
    let rec = &halo.record;
    w.write_all(&halo.global_id.to_le_bytes())?;
    w.write_all(&halo.central_global_id.to_le_bytes())?;
    w.write_all(&rec.most_bound_id.to_le_bytes())?;
    w.write_all(&rec.unique_id.to_le_bytes())?;

    w.write_all(&rec.halo_type.as_i32().to_le_bytes())?;
    w.write_all(&rec.snap.to_le_bytes())?;
    w.write_all(&rec.len.to_le_bytes())?;
    w.write_all(&rec.merge_status.to_le_bytes())?;
    w.write_all(&(rec.merge_into_id as i32).to_le_bytes())?;
    w.write_all(&rec.merge_into_snap.to_le_bytes())?;

    w.write_all(&rec.mvir.to_le_bytes())?;
    w.write_all(&rec.rvir.to_le_bytes())?;
    w.write_all(&rec.vvir.to_le_bytes())?;
    w.write_all(&rec.vmax.to_le_bytes())?;
    for v in rec.pos {
        w.write_all(&v.to_le_bytes())?;
    }
    for v in rec.vel {
        w.write_all(&v.to_le_bytes())?;
    }
    w.write_all(&rec.delta_mvir.to_le_bytes())?;
    w.write_all(&rec.infall_mvir.to_le_bytes())?;
    w.write_all(&rec.infall_vvir.to_le_bytes())?;
    w.write_all(&rec.infall_vmax.to_le_bytes())?;
    w.write_all(&halo.dt_myr.to_le_bytes())?;

    let default_payload = GalaxyData::default();
    let galaxy = rec.galaxy.as_deref().unwrap_or(&default_payload);
    w.write_all(&galaxy.cold_gas.to_le_bytes())?;
    w.write_all(&galaxy.hot_gas.to_le_bytes())?;
    w.write_all(&galaxy.ejected_gas.to_le_bytes())?;
    w.write_all(&galaxy.stellar_mass.to_le_bytes())?;
    w.write_all(&galaxy.bulge_mass.to_le_bytes())?;
    w.write_all(&galaxy.black_hole_mass.to_le_bytes())?;
    w.write_all(&galaxy.metals_cold.to_le_bytes())?;
    w.write_all(&galaxy.metals_stellar.to_le_bytes())?;
    w.write_all(&galaxy.sfr.to_le_bytes())?;

    Ok(())
}
