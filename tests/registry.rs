//! Store and registry end-to-end tests

mod helper;

use std::fs;

use helper::{create_test_store, sample_collection, tarball};
use tarball_registry::config::RegistryConfig;
use tarball_registry::tarball::guess::GuessPolicy;
use tarball_registry::tarball::sort::{SortCriteria, sorted_tarball_list};
use tarball_registry::tarball::store::TOOL_VERSION;
use tarball_registry::tarball::{
    RegistryError, SearchCriteria, TarballCollection, TarballRegistry,
};

fn names(collection: &TarballCollection) -> Vec<String> {
    collection.tarballs.iter().map(|t| t.name.clone()).collect()
}

#[test]
fn persisted_collection_reloads_in_canonical_order() {
    let (_temp_dir, store) = create_test_store();
    let registry = TarballRegistry::from_collection(sample_collection(), GuessPolicy::default());

    registry.persist(&store).unwrap();
    let loaded = TarballRegistry::load(&store, GuessPolicy::default()).unwrap();

    let expected = sorted_tarball_list(sample_collection().tarballs, SortCriteria::AllFields);
    assert_eq!(loaded.tarballs(), expected.as_slice());
    assert_eq!(
        loaded.tarballs()[0].name,
        "mysql-5.7.44-linux-glibc2.12-x86_64.tar.gz"
    );
    assert_eq!(loaded.tarballs().last().unwrap().flavor, "percona");
}

#[test]
fn add_remove_and_persist_cycle() {
    let (_temp_dir, store) = create_test_store();
    let mut registry = TarballRegistry::load(&store, GuessPolicy::default()).unwrap();
    assert!(registry.collection().is_empty());

    for tarball in sample_collection().tarballs {
        registry.add(tarball).unwrap();
    }
    registry
        .remove("mysql-5.7.44-linux-glibc2.12-x86_64.tar.gz")
        .unwrap();
    registry.persist(&store).unwrap();

    let reloaded = TarballRegistry::load(&store, GuessPolicy::default()).unwrap();
    assert_eq!(reloaded.collection().len(), 7);
    assert_eq!(reloaded.collection().schema_version, TOOL_VERSION);
    assert!(
        reloaded
            .find_by_name("mysql-5.7.44-linux-glibc2.12-x86_64.tar.gz")
            .is_err()
    );
}

#[test]
fn failed_persist_keeps_previous_document() {
    let (_temp_dir, store) = create_test_store();
    TarballRegistry::from_collection(sample_collection(), GuessPolicy::default())
        .persist(&store)
        .unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    let mut broken = sample_collection();
    broken.tarballs.push(tarball(
        "mysql-8.0.37-copy.tar.xz",
        "mysql",
        "8.0.37",
        "linux",
        "amd64",
        false,
    ));
    let result = store.persist(&broken);

    assert!(matches!(
        result,
        Err(RegistryError::DuplicateCombination { .. })
    ));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
}

#[test]
fn corrupt_document_is_reported() {
    let (_temp_dir, store) = create_test_store();
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "not json").unwrap();

    let result = TarballRegistry::load(&store, GuessPolicy::default());

    assert!(matches!(result, Err(RegistryError::CorruptState { .. })));
}

#[test]
fn merge_then_persist_adds_only_new_names() {
    let (_temp_dir, store) = create_test_store();
    let mut registry =
        TarballRegistry::from_collection(sample_collection(), GuessPolicy::default());
    let incoming = TarballCollection::new(
        "0.1.0",
        vec![
            tarball(
                "mysql-8.0.37-macos14-arm64.tar.gz",
                "mysql",
                "8.0.37",
                "darwin",
                "arm64",
                false,
            ),
            tarball("mysql-9.0.1-macos14-arm64.tar.gz", "mysql", "9.0.1", "darwin", "arm64", false),
        ],
    );

    let added = registry.merge(&incoming).unwrap();
    registry.persist(&store).unwrap();

    assert_eq!(added, 1);
    let reloaded = TarballRegistry::load(&store, GuessPolicy::default()).unwrap();
    assert_eq!(reloaded.collection().len(), 9);
    assert!(
        names(reloaded.collection()).contains(&"mysql-9.0.1-macos14-arm64.tar.gz".to_string())
    );
}

#[test]
fn resolution_across_the_catalog() {
    let registry = TarballRegistry::from_collection(sample_collection(), GuessPolicy::default());

    let exact = registry
        .resolve(&SearchCriteria::new("8.0.37", "mysql", "Linux", "x86_64").minimal(true))
        .unwrap();
    assert_eq!(exact.name, "mysql-8.0.37-linux-glibc2.17-x86_64-minimal.tar.xz");

    let by_alias = registry
        .resolve(&SearchCriteria::new("8.0", "mysql", "macOS", "arm64"))
        .unwrap();
    assert_eq!(by_alias.name, "mysql-8.0.37-macos14-arm64.tar.gz");

    let newest = registry
        .resolve(
            &SearchCriteria::new("8.0", "mysql", "linux", "amd64")
                .minimal(true)
                .prefer_newest(true),
        )
        .unwrap();
    assert_eq!(newest.version, "8.0.37");

    let ambiguous = registry.resolve(&SearchCriteria::new("8.0", "mysql", "linux", "amd64"));
    assert!(matches!(
        ambiguous,
        Err(RegistryError::AmbiguousMatch {
            same_version: false,
            ..
        })
    ));
}

#[test]
fn guess_uses_configured_policy() {
    let config: RegistryConfig = serde_json::from_str(
        r#"{
            "guess": {
                "downloadUrl": "https://mirror.example.com/MySQL/",
                "allowedVersions": ["8.0"]
            }
        }"#,
    )
    .unwrap();
    let registry =
        TarballRegistry::from_collection(sample_collection(), GuessPolicy::new(config.guess));

    let guessed = registry
        .resolve_guess(&SearchCriteria::new("8.0", "mysql", "linux", "amd64"))
        .unwrap();

    assert_eq!(
        guessed.url,
        "https://mirror.example.com/MySQL-8.0/mysql-8.0.38-linux-glibc2.17-x86_64-minimal.tar.xz"
    );
    assert!(guessed.is_guessed());
    assert!(matches!(
        registry.resolve_guess(&SearchCriteria::new("8.4", "mysql", "linux", "amd64")),
        Err(RegistryError::UnsupportedGuess { .. })
    ));
}

#[test]
fn guessed_entry_can_be_added_and_found() {
    let mut registry =
        TarballRegistry::from_collection(sample_collection(), GuessPolicy::default());

    let guessed = registry
        .resolve_guess(&SearchCriteria::new("8.4", "mysql", "linux", "amd64"))
        .unwrap();
    registry.add(guessed.clone()).unwrap();

    assert_eq!(registry.find_by_url(&guessed.url).unwrap().version, "8.4.2");
    let tree = registry.tree();
    assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["5.7", "8.0", "8.4"]);
    assert_eq!(tree["8.4"].len(), 2);
}

#[test]
fn guessed_entry_is_saved_only_once_it_has_a_checksum() {
    let (_temp_dir, store) = create_test_store();
    let mut registry =
        TarballRegistry::from_collection(sample_collection(), GuessPolicy::default());
    let mut guessed = registry
        .resolve_guess(&SearchCriteria::new("8.4", "mysql", "linux", "amd64"))
        .unwrap();

    registry.add(guessed.clone()).unwrap();
    match registry.persist(&store) {
        Err(RegistryError::ValidationFailed(issues)) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].name, guessed.name);
            assert_eq!(issues[0].issue, "checksum is missing");
        }
        other => panic!("Expected ValidationFailed, got {other:?}"),
    }
    assert!(!store.exists());

    registry.remove(&guessed.name).unwrap();
    guessed.checksum = "SHA512:0123456789abcdef".to_string();
    registry.add(guessed.clone()).unwrap();
    registry.persist(&store).unwrap();

    let reloaded = TarballRegistry::load(&store, GuessPolicy::default()).unwrap();
    assert_eq!(reloaded.collection().len(), 9);
    assert!(reloaded.find_by_name(&guessed.name).unwrap().is_guessed());
}
