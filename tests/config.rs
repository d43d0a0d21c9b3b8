//! Configuration file tests.
//!
//! These write TOML files to a temporary directory and check that loading
//! them produces a config the game driver can run with.

use std::io::Write;

use rand::SeedableRng;
use rand::rngs::StdRng;

use sapper::config::SapperConfig;
use sapper::error::{ConfigError, SapperError};
use sapper::field::Minefield;
use sapper::game::Game;
use sapper::select::FirstCandidate;

fn write_config(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join("sapper.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    path
}

#[test]
fn loaded_config_drives_a_game() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        seed = 17
        games = 3

        [grid]
        height = 6
        width = 7
        hazards = 5

        [closure]
        max_iterations = 100000
        "#,
    );

    let config = SapperConfig::load(&path).unwrap();
    assert_eq!(config.seed, Some(17));
    assert_eq!(config.games, 3);

    let grid = config.grid().unwrap();
    assert_eq!((grid.height(), grid.width()), (6, 7));

    let mut rng = StdRng::seed_from_u64(config.seed.unwrap());
    let field = Minefield::random(grid, config.grid.hazards, &mut rng).unwrap();
    let mut game = Game::with_config(field, config.closure.clone());
    let report = game.play(&mut FirstCandidate).unwrap();
    assert!(report.moves >= 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = SapperConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SapperError::Config(ConfigError::Io { .. })));
}

#[test]
fn parse_error_names_the_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_config(&dir, "[grid]\nheight = \"tall\"\n");
    let err = SapperConfig::load(&path).unwrap_err();
    match err {
        SapperError::Config(ConfigError::Parse { path: reported, .. }) => {
            assert_eq!(reported, path.display().to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_values_rejected_on_load() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_config(&dir, "[grid]\nheight = 3\nwidth = 3\nhazards = 10\n");
    let err = SapperConfig::load(&path).unwrap_err();
    assert!(matches!(err, SapperError::Config(ConfigError::Invalid { .. })));
}
