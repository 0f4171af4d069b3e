use std::f64::consts::{E, FRAC_PI_2};

use aniso::{
    error::AnisoError,
    evaluator::AccumulatedOutputs,
    io::{read_snapshot, write_snapshot},
    neighbors::NeighborList,
    pair::{AnisoPair, AnisoPotential},
    particle::{IsParticle, Particle},
    particles_from_config,
    position::{Mat3, Orientation, Position, Quat, Vec3},
    potential_from_config,
    potentials::{
        dipole::{dipole_terms, DipolePairParams, DipolePartial},
        gay_berne::{gb_sigma, gb_zeta, GayBerneField, GayBerneParams, GayBernePartial},
        AnisoKernel, Dipole, GayBerne, PairContext,
    },
    rng_from_config,
    shape::{type_shapes_json, TypeShape},
    shift::ShiftMode,
    simbox::SimBox,
    stats::PassStats,
    typepair::TypePairKey,
    InputParams, PotentialParams,
};
use approx::{assert_relative_eq, relative_eq};
use quickcheck_macros::quickcheck;

const TEST_EPSILON: f64 = 0.000001;

fn type_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn big_box() -> SimBox {
    SimBox::new(Vec3::new(20.0, 20.0, 20.0))
}

fn gay_berne(epsilon: f64, lperp: f64, lpar: f64, r_cut: f64, mode: ShiftMode) -> AnisoPair<GayBerne> {
    let mut pair = AnisoPair::new(type_names(&["A"]), GayBerne::new(), Some(r_cut), mode).unwrap();
    let key = pair.key("A", "A").unwrap();
    let record = GayBernePartial {
        epsilon: Some(epsilon),
        lperp: Some(lperp),
        lpar: Some(lpar),
    };
    pair.kernel_mut().set_params(key, record).unwrap();
    pair
}

fn dipole(a: f64, kappa: f64, mu: f64, r_cut: f64, mode: ShiftMode) -> AnisoPair<Dipole> {
    let mut pair = AnisoPair::new(type_names(&["A"]), Dipole::new(), Some(r_cut), mode).unwrap();
    let key = pair.key("A", "A").unwrap();
    let record = DipolePartial {
        a: Some(a),
        kappa: Some(kappa),
    };
    pair.kernel_mut().set_params(key, record).unwrap();
    pair.kernel_mut().set_mu_magnitude(0, mu).unwrap();
    pair
}

fn two_particles(p0: Position, or0: Orientation, p1: Position, or1: Orientation) -> Vec<Particle> {
    vec![Particle::new(0, p0, or0, 0), Particle::new(1, p1, or1, 0)]
}

fn pass<K: AnisoKernel>(
    pair: &AnisoPair<K>,
    particles: &[Particle],
) -> Result<(AccumulatedOutputs, PassStats), AnisoError> {
    let nlist = NeighborList::all_pairs(&big_box(), particles, 9.0);
    pair.compute(nlist.pairs(), particles)
}

// rotates the local long axis (z) onto world x
fn along_x() -> Orientation {
    Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2)
}

fn tilted(x: f64, y: f64, z: f64, angle: f64) -> Orientation {
    Quat::from_axis_angle(&nalgebra::Unit::new_normalize(Vec3::new(x, y, z)), angle)
}

fn context(dr: Vec3, q_i: Orientation, q_j: Orientation) -> PairContext {
    PairContext {
        i: 0,
        j: 1,
        dr,
        q_i,
        q_j,
        key: TypePairKey::new(0, 0),
    }
}

// Compares force and torques against central differences of the energy.
// Rotating particle i by a small angle about n changes U by -(tau_i . n) angle.
fn check_derivatives<K: AnisoKernel>(kernel: &K, params: &K::Params, r_cut: f64, dr: Vec3, q_i: Orientation, q_j: Orientation) {
    let h = 1e-6;
    let u = |dr: Vec3, q_i: Orientation, q_j: Orientation| {
        kernel.evaluate(&context(dr, q_i, q_j), params, r_cut).unwrap().energy
    };
    let out = kernel.evaluate(&context(dr, q_i, q_j), params, r_cut).unwrap();

    for axis in [Vec3::x_axis(), Vec3::y_axis(), Vec3::z_axis()] {
        let n = axis.into_inner();
        let d = n * h;
        let force = -(u(dr + d, q_i, q_j) - u(dr - d, q_i, q_j)) / (2.0 * h);
        assert_relative_eq!(out.force.dot(&n), force, epsilon = 1e-5, max_relative = 1e-5);

        let plus = Quat::from_axis_angle(&axis, h);
        let minus = Quat::from_axis_angle(&axis, -h);
        let torque_i = -(u(dr, plus * q_i, q_j) - u(dr, minus * q_i, q_j)) / (2.0 * h);
        let torque_j = -(u(dr, q_i, plus * q_j) - u(dr, q_i, minus * q_j)) / (2.0 * h);
        assert_relative_eq!(out.torque_i.dot(&n), torque_i, epsilon = 1e-5, max_relative = 1e-5);
        assert_relative_eq!(out.torque_j.dot(&n), torque_j, epsilon = 1e-5, max_relative = 1e-5);
    }

    // no net angular momentum is created by an internal force
    let balance = out.torque_i + out.torque_j + dr.cross(&out.force);
    assert!(balance.norm() < 1e-9, "angular momentum not conserved: {balance:?}");
}

#[test]
fn type_pair_key_is_unordered() {
    assert_eq!(TypePairKey::new(0, 1), TypePairKey::new(1, 0));
    assert_eq!(TypePairKey::new(3, 1).types(), (1, 3));
    assert!(TypePairKey::new(2, 2).is_self_pair());

    let mut pair = AnisoPair::new(type_names(&["A", "B"]), GayBerne::new(), Some(2.5), ShiftMode::None).unwrap();
    assert_eq!(pair.key("A", "B").unwrap(), pair.key("B", "A").unwrap());

    let record = GayBernePartial {
        epsilon: Some(1.5),
        lperp: Some(0.4),
        lpar: Some(0.6),
    };
    let key = pair.key("B", "A").unwrap();
    pair.kernel_mut().set_params(key, record.clone()).unwrap();

    let kernel = pair.kernel();
    assert_eq!(kernel.params().explicit(TypePairKey::new(0, 1)), Some(&record));
    assert_eq!(kernel.pair_params(0, 1).unwrap(), kernel.pair_params(1, 0).unwrap());
    assert_eq!(
        kernel.pair_params(1, 0).unwrap(),
        GayBerneParams {
            epsilon: 1.5,
            lperp: 0.4,
            lpar: 0.6
        }
    );
}

#[test]
fn set_replaces_whole_record() {
    let mut kernel = GayBerne::new();
    let key = TypePairKey::new(0, 0);
    let full = GayBernePartial {
        epsilon: Some(1.0),
        lperp: Some(0.5),
        lpar: Some(0.5),
    };
    kernel.set_params(key, full).unwrap();
    assert!(kernel.pair_params(0, 0).is_ok());

    let only_epsilon = GayBernePartial {
        epsilon: Some(2.0),
        ..Default::default()
    };
    kernel.set_params(key, only_epsilon).unwrap();
    let unresolved = kernel.pair_params(0, 0).unwrap_err();
    assert_eq!(unresolved.field, "lperp");
}

#[test]
fn defaults_fill_unset_fields() {
    let mut kernel = GayBerne::new();
    kernel.params_mut().set_default(GayBerneField::Lpar, 0.7).unwrap();
    let record = GayBernePartial {
        epsilon: Some(1.0),
        lperp: Some(0.5),
        lpar: None,
    };
    kernel.set_params(TypePairKey::new(0, 1), record).unwrap();
    let p = kernel.pair_params(1, 0).unwrap();
    assert_relative_eq!(p.lpar, 0.7);
    assert_relative_eq!(p.sigma_min(), 1.0);
    assert_relative_eq!(p.sigma_max(), 1.4);

    // dipole A falls back to its built-in default
    let mut dipole = Dipole::new();
    dipole
        .set_params(
            TypePairKey::new(0, 0),
            DipolePartial {
                a: None,
                kappa: Some(0.5),
            },
        )
        .unwrap();
    dipole.set_mu(0, Vec3::new(0.0, 1.0, 0.0)).unwrap();
    let p = dipole.pair_params(0, 0).unwrap();
    assert_relative_eq!(p.a, 1.0);
    assert_relative_eq!(p.kappa, 0.5);
}

#[test]
fn missing_lpar_is_reported_with_pair() {
    let mut pair = AnisoPair::new(type_names(&["A"]), GayBerne::new(), Some(2.5), ShiftMode::None).unwrap();
    let key = pair.key("A", "A").unwrap();
    let record = GayBernePartial {
        epsilon: Some(1.0),
        lperp: Some(0.45),
        lpar: None,
    };
    pair.kernel_mut().set_params(key, record).unwrap();

    let particles = two_particles(
        Position::new(0.0, 0.0, 0.0),
        Orientation::identity(),
        Position::new(1.0, 0.0, 0.0),
        Orientation::identity(),
    );
    let err = pass(&pair, &particles).unwrap_err();
    assert_eq!(
        err,
        AnisoError::MissingParameter {
            field: "lpar".to_string(),
            pair: "(A, A)".to_string()
        }
    );
    assert_eq!(err.to_string(), "missing parameter `lpar` for type pair (A, A)");
}

#[test]
fn missing_dipole_fields_are_reported() {
    let mut pair = AnisoPair::new(type_names(&["A", "B"]), Dipole::new(), Some(3.0), ShiftMode::None).unwrap();
    let complete = DipolePartial {
        a: Some(1.0),
        kappa: Some(1.0),
    };
    for (a, b) in [("A", "A"), ("B", "B")] {
        let key = pair.key(a, b).unwrap();
        pair.kernel_mut().set_params(key, complete.clone()).unwrap();
    }
    // A falls back to its default, kappa has none
    let key = pair.key("A", "B").unwrap();
    pair.kernel_mut()
        .set_params(key, DipolePartial { a: Some(2.0), kappa: None })
        .unwrap();
    pair.kernel_mut().set_mu_magnitude(0, 1.0).unwrap();
    pair.kernel_mut().set_mu_magnitude(1, 1.0).unwrap();

    let particles = vec![
        Particle::new(0, Position::new(0.0, 0.0, 0.0), Orientation::identity(), 0),
        Particle::new(1, Position::new(2.0, 0.0, 0.0), Orientation::identity(), 1),
    ];
    assert_eq!(
        pass(&pair, &particles).unwrap_err(),
        AnisoError::MissingParameter {
            field: "kappa".to_string(),
            pair: "(A, B)".to_string()
        }
    );

    pair.kernel_mut().set_params(key, complete).unwrap();
    assert!(pass(&pair, &particles).is_ok());

    // mu is per type
    let mut no_mu = AnisoPair::new(type_names(&["A", "B"]), Dipole::new(), Some(3.0), ShiftMode::None).unwrap();
    no_mu.kernel_mut().params_mut().set_default(aniso::potentials::dipole::DipoleField::Kappa, 1.0).unwrap();
    no_mu.kernel_mut().set_mu_magnitude(0, 1.0).unwrap();
    assert_eq!(
        pass(&no_mu, &particles).unwrap_err(),
        AnisoError::MissingParameter {
            field: "mu".to_string(),
            pair: "(B)".to_string()
        }
    );
}

#[test]
fn only_present_types_need_parameters() {
    let mut pair = AnisoPair::new(type_names(&["A", "B"]), GayBerne::new(), Some(2.5), ShiftMode::Shift).unwrap();
    let key = pair.key("A", "A").unwrap();
    let record = GayBernePartial {
        epsilon: Some(1.0),
        lperp: Some(0.5),
        lpar: Some(0.5),
    };
    pair.kernel_mut().set_params(key, record).unwrap();

    let particles = two_particles(
        Position::new(0.0, 0.0, 0.0),
        Orientation::identity(),
        Position::new(1.2, 0.0, 0.0),
        Orientation::identity(),
    );
    assert!(pass(&pair, &particles).is_ok());

    // type shapes are reported for every declared type
    assert!(pair.type_shapes().is_err());
}

#[test]
fn missing_cutoff() {
    let mut pair = AnisoPair::new(type_names(&["A"]), GayBerne::new(), None, ShiftMode::None).unwrap();
    let key = pair.key("A", "A").unwrap();
    let record = GayBernePartial {
        epsilon: Some(1.0),
        lperp: Some(0.5),
        lpar: Some(0.5),
    };
    pair.kernel_mut().set_params(key, record).unwrap();

    let particles = two_particles(
        Position::new(0.0, 0.0, 0.0),
        Orientation::identity(),
        Position::new(8.0, 0.0, 0.0),
        Orientation::identity(),
    );
    assert_eq!(
        pass(&pair, &particles).unwrap_err(),
        AnisoError::MissingCutoff {
            pair: "(A, A)".to_string()
        }
    );

    // without cutoff checking every listed pair interacts
    pair.set_check_cutoff(false);
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_in_range(), 1);
    assert!(out.total_energy() < 0.0);

    pair.set_check_cutoff(true);
    pair.set_r_cut(key, 2.5).unwrap();
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_in_range(), 0);
    assert_eq!(out.total_energy(), 0.0);
}

#[test]
fn invalid_configuration() {
    let mut pair = gay_berne(1.0, 0.45, 0.5, 2.5, ShiftMode::None);
    assert!(matches!(pair.set_mode_str("xplor"), Err(AnisoError::InvalidConfiguration(_))));
    assert_eq!(pair.mode(), ShiftMode::None);
    pair.set_mode_str("shift").unwrap();
    assert_eq!(pair.mode(), ShiftMode::Shift);

    let key = pair.key("A", "A").unwrap();
    assert!(pair.set_r_cut(key, -1.0).is_err());
    assert!(pair.key("A", "C").is_err());

    let bad_length = GayBernePartial {
        epsilon: Some(1.0),
        lperp: Some(0.0),
        lpar: Some(0.5),
    };
    assert!(pair.kernel_mut().set_params(key, bad_length).is_err());

    let mut kernel = Dipole::new();
    assert!(matches!(kernel.set_mu_magnitude(0, -1.0), Err(AnisoError::InvalidConfiguration(_))));
    let negative_kappa = DipolePartial {
        a: Some(1.0),
        kappa: Some(-1.0),
    };
    assert!(kernel.set_params(TypePairKey::new(0, 0), negative_kappa).is_err());

    let mut ip = InputParams::default();
    ip.mode = "smooth".to_string();
    assert!(matches!(potential_from_config(&ip), Err(AnisoError::InvalidConfiguration(_))));
}

#[test]
fn dipole_zero_prefactor_is_inert() {
    let pair = dipole(0.0, 1.0, 1.0, 3.0, ShiftMode::None);
    let particles = two_particles(
        Position::new(0.0, 0.0, 0.0),
        tilted(1.0, 2.0, 0.5, 0.3),
        Position::new(1.1, 0.4, -0.2),
        tilted(-1.0, 0.0, 1.0, 1.2),
    );
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_in_range(), 1);
    for idx in 0..2 {
        assert_relative_eq!(out.energy[idx], 0.0);
        assert_relative_eq!(out.force[idx].norm(), 0.0);
        assert_relative_eq!(out.torque[idx].norm(), 0.0);
    }
}

// head to tail moments along the separation, screened
#[test]
fn dipole_pair_energy() {
    let pair = dipole(1.0, 1.0, 1.0, 3.0, ShiftMode::None);
    let particles = two_particles(
        Position::new(0.0, 0.0, 0.0),
        Orientation::identity(),
        Position::new(2.0, 0.0, 0.0),
        Orientation::identity(),
    );
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_pairs(), 1);

    let expected = -0.25 / (E * E);
    assert_relative_eq!(out.total_energy(), expected, epsilon = TEST_EPSILON);
    assert_relative_eq!(out.energy[0], 0.5 * expected, epsilon = TEST_EPSILON);
    assert_relative_eq!(out.energy[1], 0.5 * expected, epsilon = TEST_EPSILON);

    let mu = Vec3::new(1.0, 0.0, 0.0);
    let terms = dipole_terms(&Vec3::new(-2.0, 0.0, 0.0), &mu, &mu, 1.0, 1.0);
    assert_relative_eq!(terms.dd, expected, epsilon = TEST_EPSILON);
    assert_eq!(terms.de, 0.0);
    assert_eq!(terms.ee, 0.0);
    assert_relative_eq!(terms.total(), expected, epsilon = TEST_EPSILON);

    // aligned moments attract and feel no torque
    assert!(out.force[0].x > 0.0);
    assert_relative_eq!(out.torque[0].norm(), 0.0, epsilon = TEST_EPSILON);
    assert_relative_eq!(out.torque[1].norm(), 0.0, epsilon = TEST_EPSILON);
}

#[test]
fn gay_berne_contact_distance() {
    let p = GayBerneParams {
        epsilon: 1.0,
        lperp: 0.45,
        lpar: 0.5,
    };
    let dr = Vec3::new(1.0, 0.0, 0.0);

    // end to end
    let or = along_x();
    assert_relative_eq!(gb_sigma(&dr, &or, &or, &p), 1.0, epsilon = TEST_EPSILON);
    assert_relative_eq!(gb_zeta(&dr, &or, &or, &p), 1.0, epsilon = TEST_EPSILON);

    // side by side
    let or = Orientation::identity();
    assert_relative_eq!(gb_sigma(&dr, &or, &or, &p), 0.9, epsilon = TEST_EPSILON);

    let pair = gay_berne(1.0, 0.45, 0.5, 2.5, ShiftMode::None);
    let particles = two_particles(Position::new(0.0, 0.0, 0.0), along_x(), Position::new(1.0, 0.0, 0.0), along_x());
    let (out, _) = pass(&pair, &particles).unwrap();
    assert_relative_eq!(out.total_energy(), 0.0, epsilon = TEST_EPSILON);
}

#[test]
fn gay_berne_isotropic_limit() {
    let p = GayBerneParams {
        epsilon: 1.0,
        lperp: 0.6,
        lpar: 0.6,
    };
    let dr = Vec3::new(0.3, -1.1, 0.8);
    for (or_i, or_j) in [
        (Orientation::identity(), Orientation::identity()),
        (tilted(1.0, 1.0, 0.0, 0.7), tilted(0.0, 1.0, -1.0, 2.1)),
        (along_x(), tilted(0.3, -0.2, 1.0, 1.4)),
    ] {
        assert_relative_eq!(gb_sigma(&dr, &or_i, &or_j, &p), 1.2, epsilon = TEST_EPSILON);
        let out = GayBerne::new()
            .evaluate(&context(dr, or_i, or_j), &p, 3.0)
            .unwrap();
        assert_relative_eq!(out.torque_i.norm(), 0.0, epsilon = TEST_EPSILON);
        assert_relative_eq!(out.torque_j.norm(), 0.0, epsilon = TEST_EPSILON);
    }
}

#[test]
fn gay_berne_derivatives() {
    let p = GayBerneParams {
        epsilon: 1.3,
        lperp: 0.5,
        lpar: 1.0,
    };
    let kernel = GayBerne::new();
    check_derivatives(&kernel, &p, 4.0, Vec3::new(1.8, 0.9, 0.5), tilted(1.0, 0.2, 0.3, 0.8), tilted(-0.4, 1.0, 0.1, 1.9));
    check_derivatives(&kernel, &p, 4.0, Vec3::new(-0.4, 2.1, 0.6), tilted(0.0, 0.0, 1.0, 0.4), tilted(1.0, 1.0, 1.0, 2.5));

    // oblate particles
    let p = GayBerneParams {
        epsilon: 0.8,
        lperp: 0.7,
        lpar: 0.4,
    };
    check_derivatives(&kernel, &p, 4.0, Vec3::new(0.9, -1.2, 0.7), tilted(0.5, 0.2, -1.0, 1.1), tilted(1.0, 0.0, 0.2, 0.3));
}

#[test]
fn dipole_derivatives() {
    let kernel = Dipole::new();
    let p = DipolePairParams {
        a: 1.3,
        kappa: 0.7,
        mu_i: Vec3::new(1.0, 0.2, -0.4),
        mu_j: Vec3::new(-0.3, 0.8, 0.5),
    };
    check_derivatives(&kernel, &p, 3.0, Vec3::new(0.9, -0.6, 0.7), tilted(1.0, 0.5, 0.0, 0.6), tilted(0.2, -1.0, 0.4, 1.7));

    // unscreened
    let p = DipolePairParams { kappa: 0.0, ..p };
    check_derivatives(&kernel, &p, 3.0, Vec3::new(-1.4, 0.3, 1.1), Orientation::identity(), tilted(0.0, 1.0, 1.0, 2.2));
}

#[test]
fn shifted_energy_vanishes_at_cutoff() {
    let r_cut = 2.5;
    let just_inside = r_cut - 1e-9;

    // end to end Gay-Berne pairs reach zeta_cut exactly at r_cut
    let pair = gay_berne(1.0, 0.45, 0.5, r_cut, ShiftMode::Shift);
    let particles = two_particles(Position::new(just_inside, 0.0, 0.0), along_x(), Position::new(0.0, 0.0, 0.0), along_x());
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_in_range(), 1);
    assert_relative_eq!(out.total_energy(), 0.0, epsilon = 1e-8);

    let unshifted = gay_berne(1.0, 0.45, 0.5, r_cut, ShiftMode::None);
    let (raw, _) = pass(&unshifted, &particles).unwrap();
    assert!(raw.total_energy() < -1e-4);

    let pair = dipole(1.0, 0.5, 1.0, r_cut, ShiftMode::Shift);
    let particles = two_particles(
        Position::new(0.0, just_inside, 0.0),
        tilted(0.0, 0.0, 1.0, 0.3),
        Position::new(0.0, 0.0, 0.0),
        tilted(1.0, 0.0, 0.0, 0.9),
    );
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_in_range(), 1);
    assert_relative_eq!(out.total_energy(), 0.0, epsilon = 1e-8);

    // on the cutoff nothing is contributed at all
    let particles = two_particles(
        Position::new(0.0, r_cut, 0.0),
        tilted(0.0, 0.0, 1.0, 0.3),
        Position::new(0.0, 0.0, 0.0),
        tilted(1.0, 0.0, 0.0, 0.9),
    );
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_in_range(), 0);
    assert_eq!(out.total_energy(), 0.0);
    assert_eq!(out.force[0], Vec3::zeros());
}

#[test]
fn shift_changes_only_energy() {
    let particles = two_particles(
        Position::new(0.2, 0.1, -0.3),
        tilted(1.0, 0.2, 0.3, 0.8),
        Position::new(1.3, 0.6, 0.2),
        tilted(-0.4, 1.0, 0.1, 1.9),
    );

    let plain = gay_berne(1.0, 0.45, 0.6, 2.5, ShiftMode::None);
    let shifted = gay_berne(1.0, 0.45, 0.6, 2.5, ShiftMode::Shift);
    let (a, _) = pass(&plain, &particles).unwrap();
    let (b, _) = pass(&shifted, &particles).unwrap();
    assert_eq!(a.force, b.force);
    assert_eq!(a.torque, b.torque);
    assert_eq!(a.virial, b.virial);
    assert!(b.total_energy() > a.total_energy());

    let plain = dipole(1.0, 0.5, 1.2, 2.5, ShiftMode::None);
    let shifted = dipole(1.0, 0.5, 1.2, 2.5, ShiftMode::Shift);
    let (a, _) = pass(&plain, &particles).unwrap();
    let (b, _) = pass(&shifted, &particles).unwrap();
    assert_eq!(a.force, b.force);
    assert_eq!(a.torque, b.torque);
    assert_ne!(a.total_energy(), b.total_energy());
}

#[test]
fn minimum_image_separation() {
    let simbox = SimBox::new(Vec3::new(10.0, 10.0, 10.0));
    let particles = two_particles(
        Position::new(4.5, 0.0, 0.0),
        Orientation::identity(),
        Position::new(-4.5, 0.0, 0.0),
        Orientation::identity(),
    );
    let nlist = NeighborList::all_pairs(&simbox, &particles, 2.0);
    assert_eq!(nlist.len(), 1);
    assert_relative_eq!(nlist.pairs()[0].dr.x, -1.0, epsilon = TEST_EPSILON);

    let nlist = NeighborList::all_pairs(&simbox, &particles, 0.5);
    assert!(nlist.is_empty());
}

fn dense_config() -> (InputParams, AnisoPotential, Vec<Particle>, NeighborList) {
    let mut ip = InputParams::default();
    ip.num_particles = 200;
    ip.box_dimensions = [12.0, 12.0, 12.0];
    let potential = potential_from_config(&ip).unwrap();
    let simbox = ip.simbox();
    let mut rng = rng_from_config(&ip);
    let particles = particles_from_config(&ip, &simbox, &mut rng).unwrap();
    // looser than r_cut, so the evaluator does the filtering
    let nlist = NeighborList::all_pairs(&simbox, &particles, 5.9);
    (ip, potential, particles, nlist)
}

#[test]
fn serial_and_parallel_passes_agree() {
    let (_, potential, particles, nlist) = dense_config();
    // spans several chunks
    assert!(nlist.len() > 2 * aniso::consts::PAR_CHUNK_PAIRS);

    let (serial, serial_stats) = potential.compute(nlist.pairs(), &particles, false).unwrap();
    let (parallel, parallel_stats) = potential.compute(nlist.pairs(), &particles, true).unwrap();
    assert_eq!(serial, parallel);
    assert_eq!(serial_stats, parallel_stats);
    assert_eq!(serial_stats.num_pairs(), nlist.len());
    assert!(serial_stats.num_in_range() > 0);
    assert!(serial_stats.num_out_of_range() > 0);
}

#[test]
fn pass_sums_pair_contributions() {
    let (_, potential, particles, nlist) = dense_config();
    let pair = match &potential {
        AnisoPotential::GayBerne(pair) => pair,
        AnisoPotential::Dipole(_) => panic!("default configuration is Gay-Berne"),
    };
    let (out, _) = pair.compute(nlist.pairs(), &particles).unwrap();

    let evaluator = pair.evaluator(&particles).unwrap();
    let orientations: Vec<Orientation> = particles.iter().map(|p| p.or()).collect();
    let mut energy = 0.0;
    let mut virial = Mat3::zeros();
    for neighbor in nlist.pairs() {
        if let Some((ctx, contribution)) = evaluator.evaluate_pair(neighbor, &orientations).unwrap() {
            energy += contribution.energy;
            virial += ctx.dr * contribution.force.transpose();
        }
    }
    assert_relative_eq!(out.total_energy(), energy, epsilon = 1e-9, max_relative = 1e-9);
    for r in 0..3 {
        for c in 0..3 {
            assert_relative_eq!(out.virial[(r, c)], virial[(r, c)], epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    // Newton's third law over the whole system
    assert!(out.total_force().norm() < 1e-8);
}

#[test]
fn type_shapes() {
    let pair = gay_berne(1.0, 0.45, 0.5, 2.5, ShiftMode::None);
    let shapes = pair.type_shapes().unwrap();
    assert_eq!(
        shapes,
        vec![TypeShape::Ellipsoid {
            a: 0.45,
            b: 0.45,
            c: 0.5
        }]
    );
    assert_eq!(
        type_shapes_json(&shapes).unwrap(),
        vec![r#"{"type":"Ellipsoid","a":0.45,"b":0.45,"c":0.5}"#.to_string()]
    );

    let pair = dipole(1.0, 1.0, 1.0, 2.5, ShiftMode::None);
    let shapes = pair.type_shapes().unwrap();
    assert_eq!(shapes, vec![TypeShape::None]);
    assert_eq!(type_shapes_json(&shapes).unwrap(), vec![r#"{"type":"None"}"#.to_string()]);
}

#[test]
fn config_from_toml() {
    let contents = r#"
seed = 7
num_particles = 10
box_dimensions = [10.0, 10.0, 10.0]
types = ["A", "B"]
mode = "none"
r_cut = 3.0

[[r_cuts]]
types = ["B", "A"]
r_cut = 2.0

[potential]
kind = "dipole"

[[potential.params]]
types = ["A", "A"]
kappa = 0.5

[[potential.params]]
types = ["B", "A"]
A = 2.0
kappa = 1.0

[[potential.mu]]
type = "A"
mu = [1.0, 0.0, 0.0]
"#;
    let ip: InputParams = toml::from_str(contents).unwrap();
    assert_eq!(ip.types, type_names(&["A", "B"]));
    assert!(matches!(ip.potential, PotentialParams::Dipole { .. }));

    let potential = potential_from_config(&ip).unwrap();
    assert_eq!(potential.name(), "dipole");
    assert_eq!(potential.mode(), ShiftMode::None);

    let pair = match &potential {
        AnisoPotential::Dipole(pair) => pair,
        AnisoPotential::GayBerne(_) => panic!("configured a dipole potential"),
    };
    assert_relative_eq!(pair.r_cut(pair.key("A", "B").unwrap()).unwrap(), 2.0);
    assert_relative_eq!(pair.r_cut(pair.key("B", "B").unwrap()).unwrap(), 3.0);
    let p = pair.kernel().pair_params(0, 0).unwrap();
    assert_relative_eq!(p.a, 1.0);
    assert_relative_eq!(p.kappa, 0.5);
    let p = pair.kernel().params().get(pair.key("A", "B").unwrap()).unwrap();
    assert_relative_eq!(p.a, 2.0);
    assert_relative_eq!(p.kappa, 1.0);

    // type B was never given a moment
    let particles = vec![
        Particle::new(0, Position::new(0.0, 0.0, 0.0), Orientation::identity(), 0),
        Particle::new(1, Position::new(1.5, 0.0, 0.0), Orientation::identity(), 1),
    ];
    let nlist = NeighborList::all_pairs(&ip.simbox(), &particles, 3.0);
    assert_eq!(
        potential.compute(nlist.pairs(), &particles, false).unwrap_err(),
        AnisoError::MissingParameter {
            field: "mu".to_string(),
            pair: "(B)".to_string()
        }
    );
}

#[test]
fn config_checks() {
    let ip = InputParams::default();
    assert!(ip.check().is_ok());

    let mut ip = InputParams::default();
    ip.types = type_names(&["A", "A"]);
    assert!(ip.check().is_err());

    let mut ip = InputParams::default();
    ip.r_cut = Some(4.5);
    assert!(ip.check().is_err());
    ip.check_cutoff = false;
    assert!(ip.check().is_ok());

    let mut ip = InputParams::default();
    ip.box_dimensions = [2.0, 2.0, 2.0];
    ip.num_particles = 100;
    ip.check_cutoff = false;
    let mut rng = rng_from_config(&ip);
    assert!(matches!(
        particles_from_config(&ip, &ip.simbox(), &mut rng),
        Err(AnisoError::InvalidConfiguration(_))
    ));

    let mut ip = InputParams::default();
    ip.types = Vec::new();
    let mut rng = rng_from_config(&ip);
    assert!(matches!(
        particles_from_config(&ip, &ip.simbox(), &mut rng),
        Err(AnisoError::InvalidConfiguration(_))
    ));
}

#[test]
fn snapshot_round_trip() {
    let ip = InputParams::default();
    let simbox = ip.simbox();
    let mut rng = rng_from_config(&ip);
    let particles = particles_from_config(&ip, &simbox, &mut rng).unwrap();

    let path = std::env::temp_dir().join(format!("aniso_snapshot_{}.txt", std::process::id()));
    let path = path.to_str().unwrap();
    write_snapshot(&particles, &ip.types, path).unwrap();
    let read = read_snapshot(path, &ip.types).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(read.len(), particles.len());
    for (a, b) in particles.iter().zip(&read) {
        assert_eq!(a.type_id(), b.type_id());
        assert_eq!(a.pos(), b.pos());
        assert_relative_eq!(a.or().angle_to(&b.or()), 0.0, epsilon = TEST_EPSILON);
    }

    assert!(read_snapshot(path, &ip.types).is_err());
}

#[test]
fn snapshot_rejects_bad_rows() {
    let types = type_names(&["A"]);
    let path = std::env::temp_dir().join(format!("aniso_bad_snapshot_{}.txt", std::process::id()));
    let path = path.to_str().unwrap();

    for row in [
        "A 0 0 0 0 0 0 0",
        "A 0 0 0 NaN 0 0 1",
        "A inf 0 0 1 0 0 0",
        "A 0 0 0 1 0 0",
        "B 0 0 0 1 0 0 0",
    ] {
        std::fs::write(path, format!("# type x y z qw qx qy qz\nA 1 0 0 1 0 0 0\n{row}\n")).unwrap();
        let err = read_snapshot(path, &types).unwrap_err();
        assert!(err.to_string().contains(":3:"), "{row:?}: {err}");
    }

    std::fs::write(path, "A 1 0 0 2 0 0 0\n").unwrap();
    let read = read_snapshot(path, &types).unwrap();
    assert_eq!(read[0].or(), Orientation::identity());
    std::fs::remove_file(path).unwrap();
}

#[test]
fn default_dipole_moment() {
    let mut pair = AnisoPair::new(type_names(&["A", "B"]), Dipole::new(), Some(3.0), ShiftMode::None).unwrap();
    pair.kernel_mut()
        .params_mut()
        .set_default(aniso::potentials::dipole::DipoleField::Kappa, 1.0)
        .unwrap();
    pair.kernel_mut().set_mu(0, Vec3::new(0.0, 2.0, 0.0)).unwrap();
    assert!(pair.kernel_mut().set_default_mu(Vec3::new(f64::NAN, 0.0, 0.0)).is_err());
    pair.kernel_mut().set_default_mu(Vec3::new(1.0, 0.0, 0.0)).unwrap();

    let p = pair.kernel().pair_params(0, 1).unwrap();
    assert_eq!(p.mu_i, Vec3::new(0.0, 2.0, 0.0));
    assert_eq!(p.mu_j, Vec3::new(1.0, 0.0, 0.0));

    // B falls back to the default moment and the pass resolves
    let particles = vec![
        Particle::new(0, Position::new(0.0, 0.0, 0.0), Orientation::identity(), 0),
        Particle::new(1, Position::new(1.5, 0.0, 0.0), Orientation::identity(), 1),
    ];
    let (out, stats) = pass(&pair, &particles).unwrap();
    assert_eq!(stats.num_in_range(), 1);
    assert!(out.total_energy().is_finite());
}

#[quickcheck]
fn arbitrary_passes_are_consistent(ip: InputParams) -> bool {
    let potential = match potential_from_config(&ip) {
        Ok(potential) => potential,
        Err(_) => return false,
    };
    let simbox = ip.simbox();
    let mut rng = rng_from_config(&ip);
    let particles = match particles_from_config(&ip, &simbox, &mut rng) {
        Ok(particles) => particles,
        Err(_) => return false,
    };
    let r_list = match potential.max_r_cut(&particles) {
        Ok(r) => r,
        Err(_) => return false,
    };
    let nlist = NeighborList::all_pairs(&simbox, &particles, r_list);
    let serial = potential.compute(nlist.pairs(), &particles, false);
    let parallel = potential.compute(nlist.pairs(), &particles, true);
    match (serial, parallel) {
        (Ok((a, _)), Ok((b, _))) => {
            a == b
                && a.total_energy().is_finite()
                && a.total_force().norm() < 1e-8
                && potential.type_shapes().map(|s| s.len() == ip.types.len()).unwrap_or(false)
        }
        _ => false,
    }
}

// swapping the roles of i and j flips the force and swaps the torques
#[quickcheck]
fn pair_is_symmetric_under_swap(p0: Particle, p1: Particle) -> bool {
    let dr = p0.pos() - p1.pos();
    if dr.norm() < 1.2 {
        return true;
    }
    let kernel = GayBerne::new();
    let p = GayBerneParams {
        epsilon: 1.0,
        lperp: 0.45,
        lpar: 0.6,
    };
    let forward = kernel.evaluate(&context(dr, p0.or(), p1.or()), &p, 4.0);
    let backward = kernel.evaluate(&context(-dr, p1.or(), p0.or()), &p, 4.0);
    let close = |a: Vec3, b: Vec3| (a - b).norm() <= 1e-9 * (1.0 + a.norm());
    match (forward, backward) {
        (None, None) => true,
        (Some(f), Some(b)) => {
            relative_eq!(f.energy, b.energy, epsilon = 1e-12, max_relative = 1e-9)
                && close(f.force, -b.force)
                && close(f.torque_i, b.torque_j)
                && close(f.torque_j, b.torque_i)
        }
        _ => false,
    }
}
