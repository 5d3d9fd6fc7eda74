//! End-to-end tests: catalog load, initial export and depletion simulation
//! wired through the service container.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use stockavl::application::EventLog;
use stockavl::config::Settings;
use stockavl::domain::AvlTree;
use stockavl::infrastructure::di::ServiceContainer;
use stockavl::util::testing;

const CATALOG: &str = "\
codigo;nome;estoque;preco
50;Geladeira;3;3499,90
30;Fogao;2;999,00
70;Microondas;1;450,00
20;Liquidificador;2;120,00
40;Batedeira;1;300,00
";

fn settings_in(dir: &Path, snapshots: bool) -> Settings {
    let catalog = dir.join("catalogo.csv");
    fs::write(&catalog, CATALOG).unwrap();
    Settings {
        catalog,
        log_file: dir.join("log_avl.txt"),
        output_dir: dir.join("out"),
        snapshot_each_removal: snapshots,
        seed: Some(2024),
        ..Settings::default()
    }
}

#[test]
fn given_catalog_when_simulating_then_every_unit_is_sold_and_tree_empties() {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let container = ServiceContainer::new(settings_in(dir.path(), false));
    let settings = &container.settings;
    let mut log = EventLog::memory()
        .with_file(container.fs.as_ref(), &settings.log_file)
        .unwrap();
    let mut tree = AvlTree::new();

    let loaded = container
        .catalog_service()
        .load(&settings.catalog, &mut tree, &mut log)
        .unwrap();
    container
        .export_service()
        .write_dot(&tree, &settings.initial_export_path())
        .unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let report = container
        .simulation_service()
        .run(&mut tree, &loaded.codes, &mut rng, &mut log);
    log.flush();

    assert!(report.completed);
    assert!(tree.is_empty());
    assert_eq!(report.sales, 9);
    assert_eq!(report.removals, 5);
    assert_eq!(report.cycles, report.sales + report.out_of_stock);

    let initial = fs::read_to_string(dir.path().join("out/initial.dot")).unwrap();
    assert!(initial.starts_with("digraph AVLTree {"));
    assert!(initial.contains("\"50\" [label=\"[50] Geladeira"));

    let logged = fs::read_to_string(&settings.log_file).unwrap();
    assert!(logged.contains("Starting automatic consumption simulation"));
    assert!(logged.contains("AVL tree is empty"));
    assert_eq!(logged.lines().count(), log.lines().len());
}

#[test]
fn given_snapshot_setting_when_simulating_then_writes_step_files_per_removal() {
    let dir = TempDir::new().unwrap();
    let container = ServiceContainer::new(settings_in(dir.path(), true));
    let settings = &container.settings;
    let mut log = EventLog::silent();
    let mut tree = AvlTree::new();
    let loaded = container
        .catalog_service()
        .load(&settings.catalog, &mut tree, &mut log)
        .unwrap();

    let report = container.simulation_service().run(
        &mut tree,
        &loaded.codes,
        &mut StdRng::seed_from_u64(7),
        &mut log,
    );

    let steps: Vec<String> = fs::read_dir(dir.path().join("out/steps"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(steps.len() as u64, report.removals);
    assert!(steps.iter().all(|name| name.starts_with("step_") && name.ends_with(".dot")));

    let last = fs::read_to_string(
        dir.path()
            .join("out/steps")
            .join(format!("step_{}.dot", report.cycles)),
    )
    .unwrap();
    assert!(last.contains("\"null\" [shape=plaintext, label=\"null\"];"));
}

#[test]
fn given_same_seed_when_simulating_twice_then_logs_are_identical() {
    let dir = TempDir::new().unwrap();
    let container = ServiceContainer::new(settings_in(dir.path(), false));

    let run = || {
        let mut log = EventLog::memory();
        let mut tree = AvlTree::new();
        let loaded = container
            .catalog_service()
            .load(&container.settings.catalog, &mut tree, &mut log)
            .unwrap();
        container.simulation_service().run(
            &mut tree,
            &loaded.codes,
            &mut StdRng::seed_from_u64(99),
            &mut log,
        );
        log.lines().to_vec()
    };

    assert_eq!(run(), run());
}
