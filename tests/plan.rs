//! End-to-end planning through the SQLite item database

use std::collections::BTreeMap;
use std::fs;

use rusqlite::Connection;

use craft_planner::report::{OutputsReport, StackSize, TieredReport, outputs_only};
use craft_planner::{Inventory, PlanError, Quantity, Recipe, Target, db, import, resolve};

const WOOD: &str = r#"{
  "items": [
    { "name": "Log" },
    { "name": "Planks", "batchYield": 4, "ingredients": [{ "name": "Log", "quantity": 1 }] },
    { "name": "Stick", "batchYield": 4, "ingredients": [{ "name": "Planks", "quantity": 2 }] }
  ]
}"#;

const TOOLS: &str = "\
Coal
Iron Ingot
Torch x4: 1 Stick, 1 Coal
Chest: 8 Planks
Hopper: 1 Chest, 5 Iron Ingot
";

fn open() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn counts(entries: &[(&str, Quantity)]) -> BTreeMap<String, Quantity> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn imported() -> Connection {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("wood.json"), WOOD).unwrap();
    fs::create_dir(dir.path().join("more")).unwrap();
    fs::write(dir.path().join("more").join("tools.recipes"), TOOLS).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a catalog").unwrap();

    let conn = open();
    let stats = import::import_to_database(&conn, dir.path()).unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.items, 8);
    assert_eq!(stats.errors, 0);
    conn
}

#[test]
fn directory_import_feeds_the_resolver() {
    let conn = imported();
    let catalog = db::load_catalog(&conn).unwrap();

    let plan = resolve(
        &catalog,
        &[Target::new("Hopper", 2), Target::new("Torch", 10)],
        &Inventory::new(),
    )
    .unwrap();

    // Hopper x2 -> 2 Chest, 10 Iron; Torch 10 -> 3 batches -> 3 Stick, 3 Coal
    // Chest x2 -> 16 Planks; Stick 3 -> 1 batch -> 2 Planks
    // Planks 16 -> 4 batches -> 4 Log; Planks 2 -> 1 batch -> 1 Log
    assert_eq!(
        plan.tiers,
        BTreeMap::from([
            (0, counts(&[("Hopper", 2), ("Torch", 10)])),
            (1, counts(&[("Chest", 2), ("Coal", 3), ("Iron Ingot", 10), ("Stick", 3)])),
            (2, counts(&[("Planks", 18)])),
            (3, counts(&[("Log", 5)])),
        ])
    );
    assert_eq!(plan.needs, counts(&[("Coal", 3), ("Iron Ingot", 10), ("Log", 5)]));
    assert_eq!(plan.extras, counts(&[("Planks", 2), ("Stick", 1), ("Torch", 2)]));
    assert_eq!(
        plan.batches,
        counts(&[("Chest", 2), ("Hopper", 2), ("Planks", 5), ("Stick", 1), ("Torch", 3)])
    );

    let text = TieredReport::new(&plan).to_string();
    assert!(text.contains("Tier 3:\n  5 Log\n"));
    assert!(text.contains("Needs:\n  3 Coal\n  10 Iron Ingot\n  5 Log\n"));
}

#[test]
fn surplus_from_inventory_carries_between_targets() {
    let conn = imported();
    let catalog = db::load_catalog(&conn).unwrap();
    let inventory = Inventory::from_signed([("Planks", 10), ("Coal", 1)]).unwrap();

    let plan = resolve(&catalog, &[Target::new("Chest", 2)], &inventory).unwrap();

    // 16 Planks needed, 10 on hand -> 6 more (2 batches, 2 spare)
    assert_eq!(plan.tiers.get(&1), Some(&counts(&[("Planks", 6)])));
    assert_eq!(plan.needs, counts(&[("Log", 2)]));
    assert_eq!(plan.extras, counts(&[("Coal", 1), ("Planks", 2)]));
}

#[test]
fn outputs_view_collapses_tiers() {
    let conn = imported();
    let catalog = db::load_catalog(&conn).unwrap();
    let plan = resolve(&catalog, &[Target::new("Chest", 20)], &Inventory::new()).unwrap();

    let lines: Vec<_> = outputs_only(&plan)
        .into_iter()
        .map(|l| (l.item, l.quantity))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("Log".to_string(), 40),
            ("Planks".to_string(), 160),
            ("Chest".to_string(), 20),
        ]
    );

    let text = OutputsReport::new(&plan, StackSize::default()).to_string();
    assert!(text.contains("  160 (2x64 + 32) Planks\n"));
    assert!(text.contains("  20 Chest\n"));
}

#[test]
fn missing_ingredient_aborts_the_plan() {
    let conn = imported();
    db::upsert_item(
        &conn,
        &Recipe::new("Lantern", 1, vec![craft_planner::Ingredient::new("Iron Nugget", 8)]),
    )
    .unwrap();
    let catalog = db::load_catalog(&conn).unwrap();

    let err = resolve(&catalog, &[Target::new("Lantern", 1)], &Inventory::new()).unwrap_err();
    assert_eq!(
        err,
        PlanError::UnknownItem {
            name: "Iron Nugget".into(),
            depth: 1
        }
    );
}

#[test]
fn export_round_trips_and_keeps_backup_history() {
    let conn = imported();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(&path, "{\"items\": []}").unwrap();

    let count = import::export_json(&conn, &path).unwrap();
    assert_eq!(count, 8);
    let first = import::backup_path(&path, b"{\"items\": []}");
    assert_eq!(fs::read_to_string(&first).unwrap(), "{\"items\": []}");

    // the second export keeps the first export's output alongside the original;
    // a third with unchanged contents adds nothing new
    let exported = fs::read(&path).unwrap();
    import::export_json(&conn, &path).unwrap();
    import::export_json(&conn, &path).unwrap();
    let mut backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with("data-old-"))
        .collect();
    backups.sort();
    let mut expected = vec![first, import::backup_path(&path, &exported)];
    expected.sort();
    assert_eq!(backups, expected);

    let fresh = open();
    import::import_to_database(&fresh, &path).unwrap();
    assert_eq!(db::list_items(&fresh).unwrap(), db::list_items(&conn).unwrap());
}

#[test]
fn bad_file_is_counted_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.recipes"), "Log\n").unwrap();
    fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

    let conn = open();
    let stats = import::import_to_database(&conn, dir.path()).unwrap();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.errors, 1);
    assert_eq!(db::list_items(&conn).unwrap(), vec![Recipe::raw("Log")]);
}

#[test]
fn invalid_recipe_skips_its_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.recipes"), "Log\n").unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"{ "items": [
            { "name": "Coal" },
            { "name": "Gear", "batchYield": 0, "ingredients": [{ "name": "Coal", "quantity": 1 }] }
        ] }"#,
    )
    .unwrap();
    fs::write(dir.path().join("c.recipes"), "Sand\n").unwrap();

    let conn = open();
    let stats = import::import_to_database(&conn, dir.path()).unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.items, 2);
    assert_eq!(
        db::list_items(&conn).unwrap(),
        vec![Recipe::raw("Log"), Recipe::raw("Sand")]
    );
}

#[cfg(unix)]
#[test]
fn dangling_link_does_not_stop_the_scan() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.recipes"), "Log\n").unwrap();
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("b.recipes")).unwrap();
    fs::write(dir.path().join("c.recipes"), "Sand\n").unwrap();

    let files = import::find_catalog_files(dir.path());
    assert_eq!(files, vec![dir.path().join("a.recipes"), dir.path().join("c.recipes")]);

    let conn = open();
    let stats = import::import_to_database(&conn, dir.path()).unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.errors, 0);
}
