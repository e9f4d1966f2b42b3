mod common;

use common::*;
use neurograph::config::load_config;
use neurograph::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_model_file_round_trip() {
    let registry = registry();
    let original = network();
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.txt");
    let header = DocumentHeader::default();

    let saved = save_model_file(
        &registry,
        "Network",
        &original,
        &path,
        &header,
        SelectionMode::All,
    )
    .unwrap();
    assert_eq!(saved.tags, 2);
    assert_eq!(saved.links, 9);

    let mut restored = Network::default();
    let loaded = load_model_file(
        &registry,
        &path,
        "Network",
        &mut restored,
        false,
        &header,
        LoadPolicy::Strict,
    )
    .unwrap();
    assert_eq!(loaded.links, 9);
    assert_same_network(&original, &restored);
}

#[test]
fn test_header_mismatches_are_reported() {
    let registry = registry();

    let err = load_text(&registry, "neurograph-model 2\n\n", LoadPolicy::Lenient).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::VersionMismatch {
            file_version: 2,
            expected_version: 1
        }
    ));

    let err = load_text(&registry, "connectome 1\n\n", LoadPolicy::Lenient).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidMagic { .. }));

    let err = load_text(&registry, "", LoadPolicy::Lenient).unwrap_err();
    assert!(matches!(err, DocumentError::MissingHeader));

    let err = load_text(&registry, "neurograph-model\n", LoadPolicy::Lenient).unwrap_err();
    assert!(matches!(err, DocumentError::MalformedHeader(_)));
}

#[test]
fn test_configured_header() {
    let registry = registry();
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("neurograph.toml");
    fs::write(
        &config_path,
        concat!(
            "[document]\nmagic = \"lab-brain\"\nversion = 3\n\n",
            "[serialization]\nload_policy = \"strict\"\n",
        ),
    )
    .unwrap();
    let config = load_config(Some(&config_path), None).unwrap();
    let header = DocumentHeader::from(&config.document);
    assert_eq!(header.to_string(), "lab-brain 3");

    let path = dir.path().join("network.txt");
    let original = network();
    save_model_file(&registry, "Network", &original, &path, &header, SelectionMode::All).unwrap();
    assert!(fs::read_to_string(&path).unwrap().starts_with("lab-brain 3\n"));

    let mut restored = Network::default();
    load_model_file(
        &registry,
        &path,
        "Network",
        &mut restored,
        false,
        &header,
        config.serialization.load_policy,
    )
    .unwrap();
    assert_same_network(&original, &restored);

    let err = load_model_file(
        &registry,
        &path,
        "Network",
        &mut Network::default(),
        false,
        &DocumentHeader::default(),
        LoadPolicy::Lenient,
    )
    .unwrap_err();
    assert!(matches!(err, DocumentError::InvalidMagic { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let registry = registry();
    let dir = tempdir().unwrap();
    let err = load_model_file(
        &registry,
        dir.path().join("absent.txt"),
        "Network",
        &mut Network::default(),
        false,
        &DocumentHeader::default(),
        LoadPolicy::Lenient,
    )
    .unwrap_err();
    assert!(matches!(err, DocumentError::Io(_)));
}
