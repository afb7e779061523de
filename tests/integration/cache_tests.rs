//! Binary cache integration tests
//!
//! These tests load a realistic resource root, write it to a cache file and
//! compare the restored repository with the original.

use resource_repository::cache::{fingerprint, CacheError, CACHE_MAGIC};
use resource_repository::resources::ResourceVisibility;
use resource_repository::{
    read_cache_file, write_cache_file, ItemKind, LoaderOptions, RepositoryLoader, ResourceNamespace,
    ResourceRepository, ResourceType,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A library with every kind of item the cache stores
fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let res = dir.path().join("res");

    write(
        &res,
        "values/values.xml",
        r##"<resources xmlns:android="http://schemas.android.com/apk/res/android" xmlns:tools="http://schemas.android.com/tools">
    <string name="hello">hello</string>
    <string name="styled">Hello <b>World</b></string>
    <color name="black">#000000</color>
    <color name="white">#ffffff</color>
    <string-array name="planets" tools:index="1">
        <item>Mercury</item>
        <item>Venus</item>
    </string-array>
    <plurals name="songs">
        <item quantity="one">%d song</item>
        <item quantity="other">%d songs</item>
    </plurals>
    <!-- Orientation of the layout. -->
    <attr name="orientation">
        <enum name="horizontal" value="0"/>
        <enum name="vertical" value="1"/>
    </attr>
    <declare-styleable name="CustomView">
        <attr name="customColor" format="color"/>
        <attr name="android:text"/>
        <attr name="orientation"/>
    </declare-styleable>
    <style name="Theme.App" parent="android:Theme.Material">
        <item name="android:textColor">@color/black</item>
        <item name="customColor">#fff</item>
    </style>
</resources>"##,
    );
    write(
        &res,
        "values-fr/strings.xml",
        r#"<resources><string name="hello">bonjour</string></resources>"#,
    );
    write(&res, "drawable-hdpi/icon.png", "png");
    write(&res, "drawable/shape.xml", "<shape/>");
    write(
        &res,
        "layout/main.xml",
        r#"<FrameLayout xmlns:android="http://schemas.android.com/apk/res/android" android:id="@+id/root"/>"#,
    );
    write(dir.path(), "public.txt", "color black\nstring hello\n");

    (dir, res)
}

fn load(res: &Path) -> ResourceRepository {
    RepositoryLoader::new(res, LoaderOptions::default())
        .load()
        .expect("Failed to load repository")
}

fn assert_equivalent(original: &ResourceRepository, restored: &ResourceRepository) {
    let ns = ResourceNamespace::ResAuto;
    assert_eq!(original.item_count(), restored.item_count());
    assert_eq!(original.types().collect::<Vec<_>>(), restored.types().collect::<Vec<_>>());

    for resource_type in ResourceType::ALL {
        let expected = original.get_resources(&ns, resource_type);
        let actual = restored.get_resources(&ns, resource_type);
        assert_eq!(expected, actual, "{} items differ", resource_type);

        for (name, variants) in expected {
            for (a, b) in variants.iter().zip(&actual[name]) {
                assert_eq!(a.kind(), b.kind(), "{}/{}", resource_type, name);
                assert_eq!(original.key(a), restored.key(b));
                assert_eq!(original.source_path(a), restored.source_path(b));
            }
        }

        assert_eq!(
            original.public_resources(&ns, resource_type),
            restored.public_resources(&ns, resource_type)
        );
    }
}

#[test]
fn test_round_trip_of_loaded_repository() {
    let (dir, res) = fixture();
    let original = load(&res);
    let cache_path = dir.path().join("cache.bin");

    write_cache_file(&cache_path, &original, 42).unwrap();
    let restored = read_cache_file(&cache_path, Some(42)).unwrap();

    assert!(restored.is_frozen());
    assert_eq!(restored.origin(), original.origin());
    assert_eq!(restored.namespace(), original.namespace());
    assert_eq!(restored.configurations().len(), original.configurations().len());
    assert_equivalent(&original, &restored);
}

#[test]
fn test_round_trip_keeps_visibility_and_attr_namespaces() {
    let (dir, res) = fixture();
    let original = load(&res);
    let cache_path = dir.path().join("cache.bin");
    write_cache_file(&cache_path, &original, 1).unwrap();
    let restored = read_cache_file(&cache_path, None).unwrap();
    let ns = ResourceNamespace::ResAuto;

    let black = &restored.get_resources_named(&ns, ResourceType::Color, "black")[0];
    let white = &restored.get_resources_named(&ns, ResourceType::Color, "white")[0];
    assert_eq!(black.visibility(), ResourceVisibility::Public);
    assert_eq!(white.visibility(), ResourceVisibility::Private);

    let styleable = &restored.get_resources_named(&ns, ResourceType::Styleable, "CustomView")[0];
    let text = &styleable.styleable_attrs()[1];
    assert!(matches!(text.kind(), ItemKind::AttrReference(_)));
    assert_eq!(restored.item_namespace(text), ResourceNamespace::Android);

    let style = &restored.get_resources_named(&ns, ResourceType::Style, "Theme.App")[0];
    let text_color = style.style_item(&ResourceNamespace::Android, "textColor").unwrap();
    assert_eq!(text_color.value(), Some("@color/black"));
    assert_eq!(
        restored.resolver(text_color.resolver()).unwrap().prefix_to_uri("android"),
        Some("http://schemas.android.com/apk/res/android")
    );
}

#[test]
fn test_stale_cache_is_rejected() {
    let (dir, res) = fixture();
    let original = load(&res);
    let cache_path = dir.path().join("cache.bin");
    write_cache_file(&cache_path, &original, 7).unwrap();

    assert!(matches!(read_cache_file(&cache_path, Some(8)), Err(CacheError::Stale)));
}

#[test]
fn test_fingerprint_follows_sources() {
    let (dir, res) = fixture();
    let loader = RepositoryLoader::new(&res, LoaderOptions::default());
    let before = fingerprint(&loader).unwrap();
    assert_eq!(before, fingerprint(&loader).unwrap());

    write(&res, "values-de/strings.xml", r#"<resources><string name="hello">hallo</string></resources>"#);
    let after_new_file = fingerprint(&loader).unwrap();
    assert_ne!(before, after_new_file);

    write(dir.path(), "R.txt", "int id root 0x7f040000\n");
    assert_ne!(after_new_file, fingerprint(&loader).unwrap());
}

#[test]
fn test_load_cached_or_fresh_reuses_and_refreshes() {
    let (dir, res) = fixture();
    let loader = RepositoryLoader::new(&res, LoaderOptions::default());
    let cache_path = dir.path().join("cache.bin");

    let (first, from_cache) = ResourceRepository::load_cached_or_fresh(&loader, &cache_path).unwrap();
    assert!(!from_cache);
    assert!(cache_path.exists());

    let (second, from_cache) = ResourceRepository::load_cached_or_fresh(&loader, &cache_path).unwrap();
    assert!(from_cache);
    assert_equivalent(&first, &second);

    write(&res, "values-es/strings.xml", r#"<resources><string name="hello">hola</string></resources>"#);
    let (third, from_cache) = ResourceRepository::load_cached_or_fresh(&loader, &cache_path).unwrap();
    assert!(!from_cache);
    assert_eq!(
        third
            .get_resources_named(&ResourceNamespace::ResAuto, ResourceType::String, "hello")
            .len(),
        3
    );
}

#[test]
fn test_corrupt_cache_fails() {
    let (dir, res) = fixture();
    let original = load(&res);
    let cache_path = dir.path().join("cache.bin");
    write_cache_file(&cache_path, &original, 3).unwrap();

    let bytes = fs::read(&cache_path).unwrap();
    assert!(bytes.starts_with(CACHE_MAGIC));

    // Truncated body
    fs::write(&cache_path, &bytes[..bytes.len() - 5]).unwrap();
    assert!(read_cache_file(&cache_path, Some(3)).is_err());

    // Wrong magic
    let mut garbled = bytes.clone();
    garbled[0] ^= 0xff;
    fs::write(&cache_path, &garbled).unwrap();
    assert!(matches!(
        read_cache_file(&cache_path, Some(3)),
        Err(CacheError::InvalidFormat(_))
    ));

    // Trailing garbage
    let mut extended = bytes;
    extended.extend_from_slice(&[1, 2, 3]);
    fs::write(&cache_path, &extended).unwrap();
    assert!(read_cache_file(&cache_path, Some(3)).is_err());
}

#[test]
fn test_corrupt_cache_falls_back_to_xml() {
    let (dir, res) = fixture();
    let loader = RepositoryLoader::new(&res, LoaderOptions::default());
    let cache_path = dir.path().join("cache.bin");
    fs::write(&cache_path, b"definitely not a cache").unwrap();

    let (repo, from_cache) = ResourceRepository::load_cached_or_fresh(&loader, &cache_path).unwrap();
    assert!(!from_cache);
    assert_eq!(repo.item_count(), load(&res).item_count());
    assert!(read_cache_file(&cache_path, None).is_ok(), "the cache should have been rewritten");
}

#[test]
fn test_round_trip_of_packaged_library() {
    use std::io::Write;
    use zip::write::FileOptions;

    let dir = TempDir::new().unwrap();
    let aar = dir.path().join("library.aar");
    let mut writer = zip::ZipWriter::new(fs::File::create(&aar).unwrap());
    for (name, contents) in [
        ("AndroidManifest.xml", r#"<manifest package="com.example.packaged"/>"#),
        ("public.txt", "string hello\n"),
        ("res/values/strings.xml", r#"<resources><string name="hello">hello</string><string name="bye">bye</string></resources>"#),
        ("res/drawable/shape.xml", "<shape/>"),
    ] {
        writer.start_file(name, FileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();

    let loader = RepositoryLoader::new(&aar, LoaderOptions::default());
    let original = loader.load().unwrap();
    let cache_path = dir.path().join("cache.bin");
    write_cache_file(&cache_path, &original, fingerprint(&loader).unwrap()).unwrap();

    let restored = read_cache_file(&cache_path, Some(fingerprint(&loader).unwrap())).unwrap();
    assert_equivalent(&original, &restored);
    assert_eq!(restored.origin(), aar.as_path());
    assert_eq!(restored.package_name(), Some("com.example.packaged"));

    let shape = &restored.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::Drawable, "shape")[0];
    assert_eq!(
        restored.source_path(shape),
        Some(aar.join("res").join("drawable").join("shape.xml"))
    );
}
