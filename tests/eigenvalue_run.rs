use simplemc::{
    AnalogTransport, BoundaryCondition, Geometry, Material, OutputSettings, Particle, Settings,
    Simulation, Transport, WorkerState,
};

/// Transport stub that absorbs every history without fission.
struct NoFission;

impl Transport for NoFission {
    fn transport(
        &self,
        particle: &mut Particle,
        _geometry: &Geometry,
        _material: &Material,
        _worker: &mut WorkerState,
    ) -> simplemc::Result<()> {
        particle.alive = false;
        Ok(())
    }
}

#[test]
fn test_single_fission_free_generation() -> simplemc::Result<()> {
    let settings = Settings {
        particles: 100,
        batches: 1,
        generations: 1,
        active: 0,
        threads: Some(2),
        ..Settings::default()
    };
    let mut sim = Simulation::new(settings)?;
    let summary = sim.run(&NoFission)?;

    assert_eq!(sim.source_bank().len(), 100);
    assert!(sim
        .source_bank()
        .iter()
        .all(|p| sim.geometry().contains(p.position) && p.alive));
    assert!(summary.batch_keff.is_empty());
    assert_eq!(summary.entropy.len(), 1);
    Ok(())
}

#[test]
fn test_reflective_box_converges_near_k_infinity() -> simplemc::Result<()> {
    // Default cross sections give k_inf = 1.5 * 2.29 / 3.42, just above 1.
    let settings = Settings {
        particles: 2000,
        batches: 12,
        active: 8,
        extent: [50.0, 50.0, 50.0],
        nuclides: 10,
        bins: 5,
        seed: 3,
        threads: Some(4),
        ..Settings::default()
    };
    let mut sim = Simulation::new(settings)?;
    let k_inf = sim.material().k_infinity();
    let summary = sim.run(&AnalogTransport)?;

    assert_eq!(summary.batch_keff.len(), 8);
    assert!(
        (summary.keff_mean - k_inf).abs() < 0.05,
        "mean keff {} vs k_inf {}",
        summary.keff_mean,
        k_inf
    );
    assert!(summary.keff_std.is_finite() && summary.keff_std > 0.0);
    assert!(summary.entropy.iter().all(|&h| h > 0.0 && h <= (125f64).log2() + 1e-12));
    Ok(())
}

#[test]
fn test_periodic_box_matches_infinite_medium() -> simplemc::Result<()> {
    let settings = Settings {
        particles: 2000,
        batches: 10,
        active: 6,
        extent: [5.0, 5.0, 5.0],
        boundary: BoundaryCondition::Periodic,
        nuclides: 5,
        bins: 3,
        seed: 11,
        threads: Some(2),
        ..Settings::default()
    };
    let mut sim = Simulation::new(settings)?;
    let k_inf = sim.material().k_infinity();
    let summary = sim.run(&AnalogTransport)?;
    assert!((summary.keff_mean - k_inf).abs() < 0.05);
    Ok(())
}

#[test]
fn test_saved_source_restarts_a_run() -> simplemc::Result<()> {
    let dir = tempfile::tempdir()?;
    let saved = dir.path().join("source.json");
    let base = Settings {
        particles: 150,
        batches: 3,
        active: 1,
        extent: [10.0, 10.0, 10.0],
        nuclides: 3,
        bins: 2,
        threads: Some(2),
        ..Settings::default()
    };

    let mut first = Simulation::new(Settings {
        output: OutputSettings {
            save_source: Some(saved.clone()),
            ..OutputSettings::default()
        },
        ..base.clone()
    })?;
    first.run(&AnalogTransport)?;
    let final_bank = first.source_bank().as_slice().to_vec();

    let second = Simulation::new(Settings {
        output: OutputSettings {
            load_source: Some(saved.clone()),
            ..OutputSettings::default()
        },
        ..base.clone()
    })?;
    assert_eq!(second.source_bank().as_slice(), final_bank.as_slice());

    let wrong_size = Simulation::new(Settings {
        particles: 151,
        output: OutputSettings {
            load_source: Some(saved),
            ..OutputSettings::default()
        },
        ..base
    });
    assert!(matches!(wrong_size, Err(simplemc::Error::Parse(_))));
    Ok(())
}

#[test]
fn test_output_files_have_one_line_per_record() -> simplemc::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = Settings {
        particles: 100,
        batches: 4,
        active: 2,
        generations: 2,
        extent: [10.0, 10.0, 10.0],
        nuclides: 3,
        bins: 2,
        tally: true,
        threads: Some(2),
        output: OutputSettings {
            keff_file: Some(dir.path().join("keff.dat")),
            entropy_file: Some(dir.path().join("entropy.dat")),
            tally_file: Some(dir.path().join("tally.dat")),
            bank_file: Some(dir.path().join("bank.dat")),
            source_file: Some(dir.path().join("source.dat")),
            ..OutputSettings::default()
        },
        ..Settings::default()
    };
    let mut sim = Simulation::new(settings)?;
    let summary = sim.run(&AnalogTransport)?;

    let read = |name: &str| std::fs::read_to_string(dir.path().join(name));
    let keff: Vec<f64> = read("keff.dat")?
        .lines()
        .map(|l| l.trim().parse().unwrap())
        .collect();
    assert_eq!(keff.len(), 2);
    for (written, k) in keff.iter().zip(&summary.batch_keff) {
        assert!((written - k).abs() < 1e-9);
    }
    assert_eq!(read("entropy.dat")?.lines().count(), 8);

    let tally = read("tally.dat")?;
    assert_eq!(tally.lines().count(), 2);
    assert!(tally.lines().all(|l| l.split_whitespace().count() == 8));

    let bank = read("bank.dat")?;
    assert_eq!(bank.lines().count(), 4 * 100);
    assert!(bank.lines().all(|l| l.split_whitespace().count() == 7));

    let source = read("source.dat")?;
    assert_eq!(source.lines().count(), 4 * 2 * 100);
    assert!(source.lines().all(|l| l.split_whitespace().count() == 3));
    Ok(())
}
