use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
};

use anyhow::{anyhow, Context};
use serde::Serialize;

use crate::{
    cli::AnisoConfig,
    evaluator::AccumulatedOutputs,
    particle::{IsParticle, Particle, ParticleId, TypeId},
    position::{quat_from_wxyz, quat_to_wxyz, Position},
    shape::{type_shapes_json, TypeShape},
    stats::PassStats,
};

/// Reads a snapshot, one particle per line: `type x y z qw qx qy qz`.
/// Blank lines and lines starting with `#` are skipped.
pub fn read_snapshot(path: &str, types: &[String]) -> anyhow::Result<Vec<Particle>> {
    let file = File::open(path).with_context(|| format!("opening snapshot {path}"))?;
    let rdr = BufReader::new(file);

    let mut particles = Vec::new();
    for (line_no, line) in rdr.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 8 {
            return Err(anyhow!("{path}:{}: expected 8 columns, got {}", line_no + 1, parts.len()));
        }
        let type_id = types
            .iter()
            .position(|t| t == parts[0])
            .ok_or_else(|| anyhow!("{path}:{}: unknown particle type {:?}", line_no + 1, parts[0]))?;
        let mut nums = [0.0; 7];
        for (num, part) in nums.iter_mut().zip(&parts[1..]) {
            *num = part
                .parse::<f64>()
                .with_context(|| format!("{path}:{}: bad number {part:?}", line_no + 1))?;
            if !num.is_finite() {
                return Err(anyhow!("{path}:{}: non-finite value {part:?}", line_no + 1));
            }
        }
        // a zero quaternion would normalize to NaN
        let q_norm_sqd: f64 = nums[3..].iter().map(|c| c * c).sum();
        if !(q_norm_sqd.is_normal() && q_norm_sqd.is_finite()) {
            return Err(anyhow!("{path}:{}: orientation is not a valid quaternion", line_no + 1));
        }
        let pos = Position::new(nums[0], nums[1], nums[2]);
        let or = quat_from_wxyz([nums[3], nums[4], nums[5], nums[6]]);
        let id = particles.len() as ParticleId;
        particles.push(Particle::new(id, pos, or, type_id as TypeId));
    }
    log::info!("Read {} particles from {path}", particles.len());
    Ok(particles)
}

pub fn write_snapshot(particles: &[Particle], types: &[String], path: &str) -> anyhow::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "# type x y z qw qx qy qz")?;
    for p in particles {
        let type_name = types
            .get(p.type_id() as usize)
            .ok_or_else(|| anyhow!("particle {} has undeclared type {}", p.id(), p.type_id()))?;
        let pos = p.pos();
        let [qw, qx, qy, qz] = quat_to_wxyz(&p.or());
        writeln!(
            w,
            "{} {:?} {:?} {:?} {:?} {:?} {:?} {:?}",
            type_name,
            pos.x,
            pos.y,
            pos.z,
            qw,
            qx,
            qy,
            qz
        )?;
    }
    Ok(())
}

/// Per-particle table: `id energy fx fy fz tx ty tz`.
pub fn write_outputs(outputs: &AccumulatedOutputs, path: &str) -> anyhow::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "# id energy fx fy fz tx ty tz")?;
    for idx in 0..outputs.num_particles() {
        let f = outputs.force[idx];
        let t = outputs.torque[idx];
        writeln!(
            w,
            "{idx} {:?} {:?} {:?} {:?} {:?} {:?} {:?}",
            outputs.energy[idx], f.x, f.y, f.z, t.x, t.y, t.z
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct PassRecord<'a> {
    potential: &'a str,
    mode: String,
    num_pairs: usize,
    num_in_range: usize,
    total_energy: f64,
    outputs: &'a AccumulatedOutputs,
}

pub fn write_pass_json(
    potential: &str,
    mode: String,
    outputs: &AccumulatedOutputs,
    stats: &PassStats,
    path: &str,
) -> anyhow::Result<()> {
    let record = PassRecord {
        potential,
        mode,
        num_pairs: stats.num_pairs(),
        num_in_range: stats.num_in_range(),
        total_energy: outputs.total_energy(),
        outputs,
    };
    let w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(w, &record)?;
    Ok(())
}

/// One JSON document per line, one line per type.
pub fn write_type_shapes(shapes: &[TypeShape], path: &str) -> anyhow::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for json in type_shapes_json(shapes)? {
        writeln!(w, "{json}")?;
    }
    Ok(())
}

fn try_delete(p: String) -> anyhow::Result<()> {
    if std::path::Path::new(&p).is_file() {
        fs::remove_file(&p).with_context(|| format!("removing stale output {p}"))?;
    }
    Ok(())
}

pub fn clear_out_files(config: &AnisoConfig) -> anyhow::Result<()> {
    try_delete(config.toml())?;
    try_delete(config.particles())?;
    try_delete(config.outputs())?;
    try_delete(config.pass_json())?;
    try_delete(config.type_shapes())?;
    Ok(())
}
