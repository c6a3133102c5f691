use pokemon_service::migration::{migrate_file, MigrationError};
use std::fs;

const DATA_FIXTURE: &str = include_str!("../data/pokemonsList.js");

#[test]
fn migrates_data_file_in_place() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("pokemonsList.js");
    fs::write(&path, DATA_FIXTURE).unwrap();

    let migration = migrate_file(&path).expect("Migration failed");
    assert_eq!(migration.updated, 3);
    assert_eq!(migration.skipped, 0);

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, migration.content);
    for id in [1, 4, 25] {
        let image = format!("\"image\": `${{baseURL}}/assets/pokemons/{}.png`", id);
        let shiny = format!(
            "\"shinyImage\": `${{baseURL}}/assets/pokemons/shiny/{}.png`",
            id
        );
        assert_eq!(written.matches(&shiny).count(), 1, "id {}", id);
        assert!(written.find(&image).unwrap() < written.find(&shiny).unwrap());
    }
    assert!(written.starts_with("const baseURL = process.env.API_URL"));
}

#[test]
fn second_run_leaves_file_unchanged() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("pokemonsList.js");
    fs::write(&path, DATA_FIXTURE).unwrap();

    migrate_file(&path).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    let again = migrate_file(&path).unwrap();
    assert_eq!(again.updated, 0);
    assert_eq!(again.skipped, 3);
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn missing_data_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("absent.js");

    let err = migrate_file(&path).unwrap_err();
    assert!(matches!(err, MigrationError::Read { .. }));
    assert!(err.to_string().contains("absent.js"));
    assert!(!path.exists());
}
