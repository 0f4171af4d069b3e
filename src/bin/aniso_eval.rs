use std::fs::{self, create_dir_all};

use anyhow::anyhow;
use clap::Parser;
use aniso::cli::AnisoConfig;
use aniso::io::{clear_out_files, read_snapshot, write_outputs, write_pass_json, write_snapshot, write_type_shapes};
use aniso::neighbors::NeighborList;
use aniso::particle::IsParticle;
use aniso::{particles_from_config, potential_from_config, rng_from_config, InputParams};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Get commandline arguments
    let config = AnisoConfig::parse();

    let ip: InputParams = if !config.input().is_empty() {
        let contents = fs::read_to_string(config.input())?;
        toml::from_str(&contents)?
    } else {
        InputParams::default()
    };

    let potential = potential_from_config(&ip)?;
    let simbox = ip.simbox();

    let particles = match config.snapshot() {
        Some(path) => {
            let particles = read_snapshot(path, potential.types())?;
            // minimum image separations assume everything starts inside the box
            if let Some(p) = particles.iter().find(|p| !simbox.pos_in_box(p.pos())) {
                return Err(anyhow!("particle {} at {:?} lies outside the box", p.id(), p.pos()));
            }
            particles
        }
        None => {
            println!("Using seed = {:?}", ip.seed);
            let mut rng = rng_from_config(&ip);
            particles_from_config(&ip, &simbox, &mut rng)?
        }
    };

    // Init I/O
    println!("Writing output to {}", config.output_dir());
    create_dir_all(config.output_dir())?;
    clear_out_files(&config)?;

    // dump full config toml to output directory
    fs::write(config.toml(), toml::to_string(&ip)?)?;
    write_snapshot(&particles, potential.types(), &config.particles())?;

    // the list has to reach the largest cutoff present
    let r_list = potential.max_r_cut(&particles)?;
    let nlist = NeighborList::all_pairs(&simbox, &particles, r_list);

    let (outputs, stats) = potential.compute(nlist.pairs(), &particles, config.parallel())?;

    println!("Potential: {} (mode = {})", potential.name(), potential.mode());
    println!("# of particles: {:?} (density {:.4})", particles.len(), particles.len() as f64 / simbox.volume());
    println!("# of pairs: {:?} ({:?} in range)", stats.num_pairs(), stats.num_in_range());
    println!("Total energy: {:.6}", outputs.total_energy());
    println!("Virial trace: {:.6}", outputs.virial.trace());

    write_outputs(&outputs, &config.outputs())?;
    write_pass_json(potential.name(), potential.mode().to_string(), &outputs, &stats, &config.pass_json())?;
    write_type_shapes(&potential.type_shapes()?, &config.type_shapes())?;

    Ok(())
}
