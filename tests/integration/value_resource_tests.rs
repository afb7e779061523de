//! Value resource integration tests
//!
//! These tests load `values/*.xml` files and check the item built for each
//! kind of tag.

use resource_repository::parser::xml::XmlToken;
use resource_repository::resources::{Arity, AttributeFormats, ItemKind, ANDROID_URI, TOOLS_URI};
use resource_repository::{
    LoaderOptions, RepositoryLoader, ResourceItem, ResourceNamespace, ResourceRepository, ResourceType,
    ValueResourceXmlParser,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Load a repository holding one `values/values.xml` file
fn load_values(xml: &str) -> (TempDir, ResourceRepository) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let res = dir.path().join("res");
    fs::create_dir_all(res.join("values")).unwrap();
    fs::write(res.join("values").join("values.xml"), xml).unwrap();
    let repo = RepositoryLoader::new(&res, LoaderOptions::default())
        .load()
        .expect("Failed to load repository");
    (dir, repo)
}

fn single<'a>(repo: &'a ResourceRepository, resource_type: ResourceType, name: &str) -> &'a ResourceItem {
    let variants = repo.get_resources_named(&ResourceNamespace::ResAuto, resource_type, name);
    assert_eq!(variants.len(), 1, "expected one {}/{}", resource_type, name);
    &variants[0]
}

// ============================================================================
// Simple values and strings
// ============================================================================

mod string_tests {
    use super::*;

    const STRINGS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources xmlns:xliff="urn:oasis:names:tc:xliff:document:1.2">
    <string name="plain">  Plain   text  </string>
    <string name="styled">Hello <b>World</b></string>
    <string name="quoted">"  keep  "</string>
    <string name="escaped">Don\'t\nstop</string>
    <string name="welcome">Welcome <xliff:g id="name">%s</xliff:g>!</string>
    <color name="accent">#FF4081</color>
    <dimen name="margin">16dp</dimen>
    <item type="dimen" name="padding">8dp</item>
    <item type="drawable" name="alias">
        @drawable/icon
    </item>
    <bool name="enabled">true</bool>
    <integer name="count">3</integer>
</resources>
"#;

    #[test]
    fn test_string_text_is_unescaped() {
        let (_dir, repo) = load_values(STRINGS);

        assert_eq!(single(&repo, ResourceType::String, "plain").resource_value(), Some("Plain text"));
        assert_eq!(single(&repo, ResourceType::String, "quoted").resource_value(), Some("  keep  "));
        assert_eq!(single(&repo, ResourceType::String, "escaped").resource_value(), Some("Don't\nstop"));
        assert_eq!(
            single(&repo, ResourceType::String, "welcome").resource_value(),
            Some("Welcome %s!")
        );
    }

    #[test]
    fn test_raw_xml_only_for_markup() {
        let (_dir, repo) = load_values(STRINGS);

        let styled = single(&repo, ResourceType::String, "styled");
        assert_eq!(styled.resource_value(), Some("Hello World"));
        assert_eq!(styled.raw_xml(), Some("Hello <b>World</b>"));

        assert_eq!(single(&repo, ResourceType::String, "plain").raw_xml(), None);
        assert!(single(&repo, ResourceType::String, "welcome")
            .raw_xml()
            .is_some_and(|raw| raw.contains("xliff:g")));
    }

    #[test]
    fn test_typed_values() {
        let (_dir, repo) = load_values(STRINGS);

        assert_eq!(single(&repo, ResourceType::Color, "accent").resource_value(), Some("#FF4081"));
        assert_eq!(single(&repo, ResourceType::Dimen, "margin").resource_value(), Some("16dp"));
        assert_eq!(single(&repo, ResourceType::Dimen, "padding").resource_value(), Some("8dp"));
        assert_eq!(single(&repo, ResourceType::Bool, "enabled").resource_value(), Some("true"));
        assert_eq!(single(&repo, ResourceType::Integer, "count").resource_value(), Some("3"));
        assert_eq!(
            single(&repo, ResourceType::Drawable, "alias").resource_value(),
            Some("@drawable/icon")
        );
    }

    #[test]
    fn test_source_path_points_at_value_file() {
        let (dir, repo) = load_values(STRINGS);
        let accent = single(&repo, ResourceType::Color, "accent");
        assert_eq!(
            repo.source_path(accent),
            Some(dir.path().join("res").join("values").join("values.xml"))
        );
        assert_eq!(repo.key(accent), "color/accent");
    }

    #[test]
    fn test_later_definition_in_same_file_wins() {
        let (_dir, repo) = load_values(
            r##"<resources>
    <color name="dup">#111111</color>
    <color name="dup">#222222</color>
</resources>"##,
        );
        assert_eq!(single(&repo, ResourceType::Color, "dup").resource_value(), Some("#222222"));
    }
}

// ============================================================================
// Arrays and plurals
// ============================================================================

mod collection_tests {
    use super::*;

    const COLLECTIONS: &str = r#"<resources xmlns:tools="http://schemas.android.com/tools">
    <string-array name="planets" tools:index="1">
        <item>Mercury</item>
        <item>Venus</item>
        <item>Earth</item>
    </string-array>
    <integer-array name="numbers">
        <item>1</item>
        <item>2</item>
    </integer-array>
    <array name="empty"/>
    <plurals name="songs" tools:quantity="one">
        <item quantity="one">%d song</item>
        <item quantity="other">%d songs</item>
    </plurals>
    <plurals name="albums">
        <item quantity="few">a few albums</item>
        <item quantity="other">many albums</item>
        <item quantity="lots">ignored</item>
    </plurals>
</resources>"#;

    #[test]
    fn test_arrays() {
        let (_dir, repo) = load_values(COLLECTIONS);

        let planets = single(&repo, ResourceType::Array, "planets");
        match planets.kind() {
            ItemKind::Array { elements, default_index } => {
                assert_eq!(elements, &["Mercury", "Venus", "Earth"]);
                assert_eq!(*default_index, 1);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(planets.resource_value(), Some("Venus"));

        assert_eq!(single(&repo, ResourceType::Array, "numbers").resource_value(), Some("1"));
        assert_eq!(single(&repo, ResourceType::Array, "empty").resource_value(), None);
    }

    #[test]
    fn test_plurals() {
        let (_dir, repo) = load_values(COLLECTIONS);

        let songs = single(&repo, ResourceType::Plurals, "songs");
        assert_eq!(songs.resource_value(), Some("%d song"));
        assert_eq!(songs.quantity(Arity::Other), Some("%d songs"));
        assert_eq!(songs.quantity(Arity::Few), None);

        let albums = single(&repo, ResourceType::Plurals, "albums");
        assert_eq!(albums.resource_value(), Some("many albums"));
        assert_eq!(albums.quantity(Arity::Few), Some("a few albums"));
        match albums.kind() {
            ItemKind::Plurals { quantities, .. } => assert_eq!(quantities.len(), 2),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_array_index_out_of_bounds_stops_the_file() {
        let (_dir, repo) = load_values(
            r#"<resources xmlns:tools="http://schemas.android.com/tools">
    <string name="before">kept</string>
    <string-array name="bad" tools:index="5"><item>a</item></string-array>
    <string name="after">lost</string>
</resources>"#,
        );
        assert_eq!(single(&repo, ResourceType::String, "before").resource_value(), Some("kept"));
        assert!(repo
            .get_resources_named(&ResourceNamespace::ResAuto, ResourceType::String, "after")
            .is_empty());
    }
}

// ============================================================================
// Styles
// ============================================================================

mod style_tests {
    use super::*;

    const STYLES: &str = r##"<resources xmlns:android="http://schemas.android.com/apk/res/android">
    <style name="Theme.App" parent="@android:style/Theme.Material">
        <item name="android:textColor">#000</item>
        <item name="colorAccent">@color/accent</item>
        <item name="android:textColor">#fff</item>
    </style>
    <style name="Theme.App.Dark"/>
    <style name="Widget.Button" parent="">
        <item name="android:padding">4dp</item>
    </style>
</resources>"##;

    #[test]
    fn test_style_parent() {
        let (_dir, repo) = load_values(STYLES);

        assert_eq!(
            single(&repo, ResourceType::Style, "Theme.App").style_parent(),
            Some("android:Theme.Material")
        );
        assert_eq!(single(&repo, ResourceType::Style, "Theme.App.Dark").style_parent(), None);
        assert_eq!(single(&repo, ResourceType::Style, "Widget.Button").style_parent(), None);
    }

    #[test]
    fn test_style_item_without_name_is_skipped() {
        let (_dir, repo) = load_values(
            r#"<resources>
    <style name="Theme.Partial">
        <item>orphan</item>
        <item name="colorAccent">@color/accent</item>
    </style>
</resources>"#,
        );
        let style = single(&repo, ResourceType::Style, "Theme.Partial");

        match style.kind() {
            ItemKind::Style { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].attr_name(), "colorAccent");
                assert_eq!(items[0].value(), Some("@color/accent"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_style_items_keep_first_definition() {
        let (_dir, repo) = load_values(STYLES);
        let style = single(&repo, ResourceType::Style, "Theme.App");

        match style.kind() {
            ItemKind::Style { items, .. } => assert_eq!(items.len(), 2),
            other => panic!("unexpected kind {:?}", other),
        }

        let text_color = style.style_item(&ResourceNamespace::Android, "textColor").unwrap();
        assert_eq!(text_color.value(), Some("#000"));
        assert_eq!(text_color.attr_name(), "android:textColor");

        let accent = style.style_item(&ResourceNamespace::ResAuto, "colorAccent").unwrap();
        assert_eq!(accent.value(), Some("@color/accent"));
    }

    #[test]
    fn test_style_items_carry_their_resolver() {
        let (_dir, repo) = load_values(STYLES);
        let style = single(&repo, ResourceType::Style, "Theme.App");
        let item = style.style_item(&ResourceNamespace::Android, "textColor").unwrap();

        let resolver = repo.resolver(item.resolver()).unwrap();
        assert_eq!(resolver.prefix_to_uri("android"), Some(ANDROID_URI));
        assert_eq!(repo.resolver(style.resolver()).unwrap().as_ref(), resolver.as_ref());
    }
}

// ============================================================================
// Attrs and styleables
// ============================================================================

mod attr_tests {
    use super::*;

    const ATTRS: &str = r#"<resources>
    <!-- Orientation of the layout. -->
    <attr name="orientation">
        <enum name="horizontal" value="0"/>
        <enum name="vertical" value="1"/>
    </attr>
    <attr name="gravity">
        <flag name="top" value="0x30"/>
        <flag name="bottom" value="0x50"/>
    </attr>
    <attr name="size" format="dimension"/>
    <attr name="anything"/>

    <declare-styleable name="CustomView">
        <attr name="customColor" format="color"/>
        <attr name="android:text"/>
        <attr name="orientation"/>
    </declare-styleable>
</resources>"#;

    #[test]
    fn test_enum_and_flag_values() {
        let (_dir, repo) = load_values(ATTRS);

        let orientation = single(&repo, ResourceType::Attr, "orientation").attr_definition().unwrap();
        assert_eq!(orientation.formats, AttributeFormats::ENUM);
        assert_eq!(orientation.values.get("horizontal"), Some(&Some(0)));
        assert_eq!(orientation.values.get("vertical"), Some(&Some(1)));
        assert_eq!(orientation.description.as_deref(), Some("Orientation of the layout."));

        let gravity = single(&repo, ResourceType::Attr, "gravity").attr_definition().unwrap();
        assert_eq!(gravity.formats, AttributeFormats::FLAGS);
        assert_eq!(gravity.values.get("top"), Some(&Some(0x30)));
        assert_eq!(gravity.values.get("bottom"), Some(&Some(0x50)));
    }

    #[test]
    fn test_formats() {
        let (_dir, repo) = load_values(ATTRS);

        let size = single(&repo, ResourceType::Attr, "size").attr_definition().unwrap();
        assert_eq!(size.formats, AttributeFormats::DIMENSION);

        let anything = single(&repo, ResourceType::Attr, "anything").attr_definition().unwrap();
        assert_eq!(anything.formats, AttributeFormats::DEFAULT);
    }

    #[test]
    fn test_styleable_attrs() {
        let (_dir, repo) = load_values(ATTRS);
        let styleable = single(&repo, ResourceType::Styleable, "CustomView");

        let attrs = styleable.styleable_attrs();
        let names: Vec<&str> = attrs.iter().map(ResourceItem::name).collect();
        assert_eq!(names, vec!["customColor", "text", "orientation"]);
        assert_eq!(repo.item_namespace(&attrs[1]), ResourceNamespace::Android);
        assert_eq!(repo.item_namespace(&attrs[2]), ResourceNamespace::ResAuto);
    }

    #[test]
    fn test_styleable_defines_attrs_with_formats() {
        let (_dir, repo) = load_values(ATTRS);

        let custom = single(&repo, ResourceType::Attr, "customColor").attr_definition().unwrap();
        assert_eq!(custom.formats, AttributeFormats::COLOR);

        // Framework attrs and format-less references define nothing
        assert!(repo
            .get_resources_named(&ResourceNamespace::ResAuto, ResourceType::Attr, "text")
            .is_empty());
        assert!(single(&repo, ResourceType::Attr, "orientation")
            .attr_definition()
            .is_some_and(|definition| !definition.values.is_empty()));
    }

    #[test]
    fn test_undefined_attr_prefix_skips_attr() {
        let (_dir, repo) = load_values(
            r#"<resources xmlns:other="http://example.com/not-a-resource-namespace">
    <declare-styleable name="View">
        <attr name="other:color"/>
        <attr name="size" format="dimension"/>
    </declare-styleable>
</resources>"#,
        );
        let names: Vec<&str> = single(&repo, ResourceType::Styleable, "View")
            .styleable_attrs()
            .iter()
            .map(ResourceItem::name)
            .collect();
        assert_eq!(names, vec!["size"]);
    }
}

// ============================================================================
// Ignored content
// ============================================================================

mod skip_tests {
    use super::*;

    #[test]
    fn test_prefixed_and_unknown_tags_are_skipped() {
        let (_dir, repo) = load_values(
            r#"<resources xmlns:tools="http://schemas.android.com/tools">
    <eat-comment/>
    <skip/>
    <tools:string name="tooling">ignored</tools:string>
    <public type="string" name="kept"/>
    <unknown name="mystery">?</unknown>
    <item type="nonsense" name="odd">?</item>
    <string>no name</string>
    <string name="kept">kept</string>
    <item type="id" name="action"/>
</resources>"#,
        );

        let strings: Vec<&String> = repo
            .get_resources(&ResourceNamespace::ResAuto, ResourceType::String)
            .keys()
            .collect();
        assert_eq!(strings, vec!["kept"]);
        assert!(repo
            .get_resources(&ResourceNamespace::ResAuto, ResourceType::Public)
            .is_empty());
        assert_eq!(single(&repo, ResourceType::Id, "action").resource_value(), None);
        assert_eq!(repo.item_count(), 2);
    }

    #[test]
    fn test_other_root_element_is_ignored() {
        let (_dir, repo) = load_values(r#"<selector><string name="nope">x</string></selector>"#);
        assert_eq!(repo.item_count(), 0);
    }
}

// ============================================================================
// Namespace scopes
// ============================================================================

mod resolver_tests {
    use super::*;

    const SCOPED: &str = r#"<resources>
    <style name="One" xmlns:a="http://schemas.android.com/apk/res/android" xmlns:t="http://schemas.android.com/tools"/>
    <style name="Two" xmlns:a="http://schemas.android.com/apk/res/android" xmlns:t="http://schemas.android.com/tools"/>
    <style name="Three" xmlns:b="http://schemas.android.com/apk/res/android"/>
</resources>"#;

    fn next_style(parser: &mut ValueResourceXmlParser) {
        loop {
            match parser.next_token().unwrap() {
                XmlToken::StartTag if parser.name() == "style" => return,
                XmlToken::EndDocument => panic!("no more <style> tags"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_resolver_cache_grows_per_distinct_scope() {
        let mut parser = ValueResourceXmlParser::new();
        parser.set_input(Path::new("styles.xml"), SCOPED);

        next_style(&mut parser);
        let first = parser.namespace_resolver().unwrap();
        assert_eq!(first.namespace_count(), 2);
        assert_eq!(first.prefix_to_uri("t"), Some(TOOLS_URI));
        assert_eq!(parser.resolver_cache_len(), 1);

        next_style(&mut parser);
        let second = parser.namespace_resolver().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(parser.resolver_cache_len(), 1);

        next_style(&mut parser);
        let third = parser.namespace_resolver().unwrap();
        assert_eq!(third.prefix_to_uri("b"), Some(ANDROID_URI));
        assert_eq!(parser.resolver_cache_len(), 2);
    }

    #[test]
    fn test_loaded_items_share_interned_resolvers() {
        let (_dir, repo) = load_values(SCOPED);

        let one = single(&repo, ResourceType::Style, "One").resolver();
        let two = single(&repo, ResourceType::Style, "Two").resolver();
        let three = single(&repo, ResourceType::Style, "Three").resolver();
        assert_eq!(one, two);
        assert_ne!(one, three);
        // The empty resolver plus the two distinct scopes
        assert_eq!(repo.resolvers().len(), 3);
    }
}
