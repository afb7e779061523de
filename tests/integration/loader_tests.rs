//! Loader integration tests
//!
//! These tests build resource roots in a temporary directory and check the
//! id, visibility and variant rules of the loaded repository.

use resource_repository::resources::{FolderConfiguration, ResourceVisibility};
use resource_repository::{
    LoaderOptions, RepositoryLoader, ResourceError, ResourceItem, ResourceNamespace, ResourceRepository,
    ResourceType,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const LAYOUT_WITH_ID: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android"
    android:layout_width="match_parent"
    android:layout_height="match_parent">
    <TextView android:id="@+id/id_from_layout" />
</LinearLayout>
"#;

const VALID_R_TXT: &str = "int id id1 0x7f040000
int id id2 0x7f040001
int id id3 0x7f040002
int string app_name 0x7f050000
";

/// A library laid out like an exploded AAR: `<dir>/res` plus siblings
struct Library {
    dir: TempDir,
}

impl Library {
    fn new() -> Self {
        let library = Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        };
        fs::create_dir_all(library.res()).unwrap();
        library
    }

    fn res(&self) -> PathBuf {
        self.dir.path().join("res")
    }

    /// Write a file below `res/`
    fn resource(&self, relative: &str, contents: &str) -> &Self {
        write(&self.res(), relative, contents);
        self
    }

    /// Write a file next to `res/`
    fn sibling(&self, name: &str, contents: &str) -> &Self {
        write(self.dir.path(), name, contents);
        self
    }

    fn load(&self) -> ResourceRepository {
        RepositoryLoader::new(self.res(), LoaderOptions::default())
            .load()
            .expect("Failed to load repository")
    }
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn id_names(repo: &ResourceRepository) -> BTreeSet<String> {
    repo.get_resources(&ResourceNamespace::ResAuto, ResourceType::Id)
        .keys()
        .cloned()
        .collect()
}

fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

// ============================================================================
// ID sourcing
// ============================================================================

mod id_tests {
    use super::*;

    #[test]
    fn test_r_txt_takes_precedence_over_layouts() {
        let library = Library::new();
        library
            .resource("layout/main.xml", LAYOUT_WITH_ID)
            .sibling("R.txt", VALID_R_TXT);

        let repo = library.load();
        assert_eq!(id_names(&repo), names(&["id1", "id2", "id3"]));
    }

    #[test]
    fn test_r_txt_ids_have_no_source_path() {
        let library = Library::new();
        library.sibling("R.txt", VALID_R_TXT);

        let repo = library.load();
        let id = &repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::Id, "id1")[0];
        assert_eq!(repo.source_path(id), None);
        assert!(repo.folder_configuration(id.configuration()).unwrap().is_default());
    }

    #[test]
    fn test_missing_r_txt_falls_back_to_layouts() {
        let library = Library::new();
        library.resource("layout/main.xml", LAYOUT_WITH_ID);

        let repo = library.load();
        assert_eq!(id_names(&repo), names(&["id_from_layout"]));

        let id = &repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::Id, "id_from_layout")[0];
        assert_eq!(repo.source_path(id), Some(library.res().join("layout").join("main.xml")));
    }

    #[test]
    fn test_broken_r_txt_falls_back_to_layouts() {
        let library = Library::new();
        library
            .resource("layout/main.xml", LAYOUT_WITH_ID)
            .sibling("R.txt", "int id id1 0x7f040000\nthis is not a symbol line\n");

        let repo = library.load();
        assert_eq!(id_names(&repo), names(&["id_from_layout"]));
    }

    #[test]
    fn test_wrong_but_parseable_r_txt_wins() {
        let library = Library::new();
        library
            .resource("layout/main.xml", LAYOUT_WITH_ID)
            .sibling("R.txt", "int id some_other_id 0x7f040000\n");

        let repo = library.load();
        assert_eq!(id_names(&repo), names(&["some_other_id"]));
    }

    #[test]
    fn test_r_txt_without_ids_falls_back_to_layouts() {
        let library = Library::new();
        library
            .resource("layout/main.xml", LAYOUT_WITH_ID)
            .sibling("R.txt", "int string app_name 0x7f050000\n");

        let repo = library.load();
        assert_eq!(id_names(&repo), names(&["id_from_layout"]));
    }

    #[test]
    fn test_malformed_layout_keeps_ids_found_before_error() {
        let library = Library::new();
        library
            .resource(
                "layout/main.xml",
                r#"<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android">
    <TextView android:id="@+id/first"/>
    <Broken a="1" a="2"/>
    <TextView android:id="@+id/after_error"/>
</LinearLayout>"#,
            )
            .resource("layout/other.xml", LAYOUT_WITH_ID);

        let repo = library.load();
        assert_eq!(id_names(&repo), names(&["first", "id_from_layout"]));
        assert_eq!(repo.get_resources(&ResourceNamespace::ResAuto, ResourceType::Layout).len(), 2);
    }

    #[test]
    fn test_declared_ids_are_not_duplicated() {
        let library = Library::new();
        library
            .resource(
                "values/ids.xml",
                r#"<resources><item type="id" name="id1"/></resources>"#,
            )
            .sibling("R.txt", VALID_R_TXT);

        let repo = library.load();
        let variants = repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::Id, "id1");
        assert_eq!(variants.len(), 1);
        assert!(repo.source_path(&variants[0]).is_some(), "the values definition should be kept");
    }
}

// ============================================================================
// Variants and visibility
// ============================================================================

mod variant_tests {
    use super::*;

    fn greetings() -> Library {
        let library = Library::new();
        library
            .resource(
                "values/strings.xml",
                r#"<resources><string name="hello">hello</string></resources>"#,
            )
            .resource(
                "values-fr/strings.xml",
                r#"<resources><string name="hello">bonjour</string></resources>"#,
            )
            .resource(
                "values-es/strings.xml",
                r#"<resources><string name="hello">hola</string></resources>"#,
            );
        library
    }

    #[test]
    fn test_every_variant_is_returned() {
        let repo = greetings().load();
        let variants = repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::String, "hello");

        let values: BTreeSet<&str> = variants.iter().filter_map(ResourceItem::resource_value).collect();
        assert_eq!(values, ["bonjour", "hello", "hola"].into_iter().collect());
    }

    #[test]
    fn test_best_match_per_locale() {
        let repo = greetings().load();
        let ns = ResourceNamespace::ResAuto;

        let pick = |qualifiers: &str| {
            let target = FolderConfiguration::from_qualifier_string(qualifiers).unwrap();
            repo.best_match(&ns, ResourceType::String, "hello", &target)
                .and_then(ResourceItem::resource_value)
                .map(str::to_string)
        };

        assert_eq!(pick("fr").as_deref(), Some("bonjour"));
        assert_eq!(pick("es").as_deref(), Some("hola"));
        assert_eq!(pick("de").as_deref(), Some("hello"));
    }

    #[test]
    fn test_unknown_namespace_or_type_is_empty() {
        let repo = greetings().load();
        assert!(repo
            .get_resources(&ResourceNamespace::Android, ResourceType::String)
            .is_empty());
        assert!(repo
            .get_resources(&ResourceNamespace::ResAuto, ResourceType::Transition)
            .is_empty());
        assert!(repo
            .get_resources_named(&ResourceNamespace::ResAuto, ResourceType::String, "missing")
            .is_empty());
    }

    #[test]
    fn test_file_resources_per_density() {
        let library = Library::new();
        library
            .resource("drawable-hdpi/icon.png", "png")
            .resource("drawable-xhdpi/icon.png", "png")
            .resource("layout/main.xml", LAYOUT_WITH_ID);

        let repo = library.load();
        let icons = repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::Drawable, "icon");
        assert_eq!(icons.len(), 2);
        assert!(icons.iter().all(ResourceItem::is_file_based));

        let layout = &repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::Layout, "main")[0];
        assert_eq!(layout.resource_value(), Some("layout/main.xml"));
    }

    #[test]
    fn test_everything_public_without_public_txt() {
        let library = Library::new();
        library.resource(
            "values/values.xml",
            r#"<resources>
    <color name="black">#000000</color>
    <color name="red">#ff0000</color>
    <string name="app_name">Demo</string>
</resources>"#,
        );

        let repo = library.load();
        assert!(repo
            .all_items()
            .all(|item| item.visibility() == ResourceVisibility::Public));
    }

    #[test]
    fn test_public_txt_flips_default_visibility() {
        let library = Library::new();
        library
            .resource(
                "values/values.xml",
                r#"<resources>
    <color name="black">#000000</color>
    <color name="white">#ffffff</color>
    <color name="red">#ff0000</color>
    <string name="app_name">Demo</string>
</resources>"#,
            )
            .resource("drawable/icon.png", "png")
            .sibling("public.txt", "color black\ncolor white\n");

        let repo = library.load();
        let ns = ResourceNamespace::ResAuto;

        let public: BTreeSet<&str> = repo
            .public_resources(&ns, ResourceType::Color)
            .into_iter()
            .map(ResourceItem::name)
            .collect();
        assert_eq!(public, ["black", "white"].into_iter().collect());

        let private: Vec<&str> = repo
            .all_items()
            .filter(|item| item.visibility() == ResourceVisibility::Private)
            .map(ResourceItem::name)
            .collect();
        assert_eq!(private.len(), 3, "{:?}", private);
        assert!(repo.public_resources(&ns, ResourceType::String).is_empty());
        assert!(repo.public_resources(&ns, ResourceType::Drawable).is_empty());
    }
}

// ============================================================================
// Repository lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;
    use resource_repository::NamespaceResolver;

    #[test]
    fn test_loaded_repository_rejects_mutation() {
        let library = Library::new();
        library.resource(
            "values/strings.xml",
            r#"<resources><string name="hello">hello</string></resources>"#,
        );
        let mut repo = library.load();
        assert!(repo.is_frozen());

        let existing = repo.get_resources_named(&ResourceNamespace::ResAuto, ResourceType::String, "hello")[0].clone();
        let config = existing.configuration();
        let item = ResourceItem::value(
            ResourceType::String,
            "other",
            ResourceVisibility::Public,
            (existing.source_file().unwrap(), config),
            Some("other".to_string()),
            None,
        );

        assert!(matches!(repo.add_item(item), Err(ResourceError::Frozen)));
        assert!(matches!(
            repo.add_configuration(FolderConfiguration::from_qualifier_string("fr").unwrap()),
            Err(ResourceError::Frozen)
        ));
        assert!(matches!(
            repo.add_source_file(Some("values/more.xml".to_string()), config),
            Err(ResourceError::Frozen)
        ));
        assert!(matches!(
            repo.intern_resolver(Arc::new(NamespaceResolver::new(vec![(
                "a".to_string(),
                "http://schemas.android.com/apk/res/android".to_string(),
            )]))),
            Err(ResourceError::Frozen)
        ));

        // Freezing again changes nothing
        repo.freeze();
        assert!(repo.is_frozen());
        assert_eq!(repo.item_count(), 1);
    }

    #[test]
    fn test_package_name_from_manifest() {
        let library = Library::new();
        library.sibling(
            "AndroidManifest.xml",
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.lib"/>"#,
        );

        let repo = library.load();
        assert_eq!(repo.package_name(), Some("com.example.lib"));
        // Memoized
        assert_eq!(repo.package_name(), Some("com.example.lib"));
    }

    #[test]
    fn test_package_name_is_shared_across_threads() {
        let library = Library::new();
        library.sibling("AndroidManifest.xml", r#"<manifest package="com.example.lib"/>"#);
        let repo = Arc::new(library.load());

        let packages: Vec<&str> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let repo = &repo;
                    scope.spawn(move || repo.package_name())
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap().expect("package from manifest"))
                .collect()
        });

        assert!(packages.iter().all(|package| *package == "com.example.lib"));
        assert!(
            packages.iter().all(|package| std::ptr::eq(*package, packages[0])),
            "every thread should see the same stored value"
        );

        // The manifest is not read again
        library.sibling("AndroidManifest.xml", r#"<manifest package="com.example.changed"/>"#);
        assert_eq!(repo.package_name(), Some("com.example.lib"));
    }

    #[test]
    fn test_missing_manifest_has_no_package() {
        let repo = Library::new().load();
        assert_eq!(repo.package_name(), None);
    }

    #[test]
    fn test_package_namespace_wins_over_manifest() {
        let library = Library::new();
        library.sibling(
            "AndroidManifest.xml",
            r#"<manifest package="com.example.manifest"/>"#,
        );
        let options = LoaderOptions {
            namespace: ResourceNamespace::from_package_name("com.example.ns"),
            ..LoaderOptions::default()
        };

        let repo = RepositoryLoader::new(library.res(), options).load().unwrap();
        assert_eq!(repo.package_name(), Some("com.example.ns"));
    }

    #[test]
    fn test_library_name_is_kept() {
        let library = Library::new();
        let options = LoaderOptions {
            library_name: Some("com.example:lib:1.0".to_string()),
            ..LoaderOptions::default()
        };

        let repo = RepositoryLoader::new(library.res(), options).load().unwrap();
        assert_eq!(repo.library_name(), Some("com.example:lib:1.0"));
        assert_eq!(repo.origin(), library.res().as_path());
    }
}

// ============================================================================
// Packaged libraries
// ============================================================================

mod archive_tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const FILES: [(&str, &str); 5] = [
        (
            "res/values/values.xml",
            r##"<resources>
    <string name="hello">hello</string>
    <color name="black">#000000</color>
    <color name="white">#ffffff</color>
</resources>"##,
        ),
        (
            "res/values-fr/strings.xml",
            r#"<resources><string name="hello">bonjour</string></resources>"#,
        ),
        ("res/layout/main.xml", LAYOUT_WITH_ID),
        ("res/drawable-hdpi/icon.png", "png"),
        ("public.txt", "color black\n"),
    ];

    /// Pack entries the way an AAR is packaged: `res/` plus the symbol
    /// files and manifest at the archive root
    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(fs::File::create(path).unwrap());
        for (name, contents) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn load(path: &Path) -> ResourceRepository {
        RepositoryLoader::new(path, LoaderOptions::default())
            .load()
            .expect("Failed to load repository")
    }

    #[test]
    fn test_archive_loads_like_directory() {
        let dir = TempDir::new().unwrap();
        for (name, contents) in FILES {
            write(&dir.path().join("exploded"), name, contents);
        }
        let aar = dir.path().join("library.aar");
        write_archive(&aar, &FILES);

        let exploded = load(&dir.path().join("exploded/res"));
        let packaged = load(&aar);
        let ns = ResourceNamespace::ResAuto;

        assert!(packaged.is_frozen());
        assert_eq!(packaged.origin(), aar.as_path());
        assert_eq!(packaged.item_count(), exploded.item_count());
        assert_eq!(id_names(&packaged), names(&["id_from_layout"]));
        for resource_type in [ResourceType::String, ResourceType::Color, ResourceType::Layout, ResourceType::Drawable] {
            let keys = |repo: &ResourceRepository| -> Vec<String> {
                repo.get_resources(&ns, resource_type)
                    .values()
                    .flatten()
                    .map(|item| repo.key(item))
                    .collect()
            };
            assert_eq!(keys(&packaged), keys(&exploded), "{} items differ", resource_type);
        }

        let black = &packaged.get_resources_named(&ns, ResourceType::Color, "black")[0];
        let white = &packaged.get_resources_named(&ns, ResourceType::Color, "white")[0];
        assert_eq!(black.visibility(), ResourceVisibility::Public);
        assert_eq!(white.visibility(), ResourceVisibility::Private);
        assert_eq!(
            packaged.source_path(black),
            Some(aar.join("res").join("values").join("values.xml"))
        );
    }

    #[test]
    fn test_archive_r_txt_and_manifest() {
        let dir = TempDir::new().unwrap();
        let aar = dir.path().join("library.aar");
        write_archive(
            &aar,
            &[
                ("AndroidManifest.xml", r#"<manifest package="com.example.packaged"/>"#),
                ("R.txt", VALID_R_TXT),
                ("res/layout/main.xml", LAYOUT_WITH_ID),
            ],
        );

        let repo = load(&aar);
        assert_eq!(id_names(&repo), names(&["id1", "id2", "id3"]));
        assert_eq!(repo.manifest_path(), None);
        assert_eq!(repo.package_name(), Some("com.example.packaged"));
    }

    #[test]
    fn test_broken_r_txt_in_archive_falls_back_to_layouts() {
        let dir = TempDir::new().unwrap();
        let aar = dir.path().join("library.aar");
        write_archive(
            &aar,
            &[
                ("R.txt", "this is not a symbol line\n"),
                ("res/layout/main.xml", LAYOUT_WITH_ID),
            ],
        );

        assert_eq!(id_names(&load(&aar)), names(&["id_from_layout"]));
    }

    #[test]
    fn test_unreadable_archive_is_empty() {
        let dir = TempDir::new().unwrap();
        let aar = dir.path().join("library.aar");
        fs::write(&aar, "not a zip archive").unwrap();

        let repo = load(&aar);
        assert!(repo.is_frozen());
        assert_eq!(repo.item_count(), 0);
        assert_eq!(repo.package_name(), None);
    }
}
