use bitflags::bitflags;
use std::fmt;

// Ordinals are persisted by the binary cache; only append variants.

/// Kind of an Android resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Anim,
    Animator,
    Array,
    Attr,
    Bool,
    Color,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Plurals,
    Raw,
    String,
    Style,
    Styleable,
    Transition,
    Xml,
    Public,
    Macro,
}

impl ResourceType {
    pub const ALL: [ResourceType; 26] = [
        ResourceType::Anim,
        ResourceType::Animator,
        ResourceType::Array,
        ResourceType::Attr,
        ResourceType::Bool,
        ResourceType::Color,
        ResourceType::Dimen,
        ResourceType::Drawable,
        ResourceType::Font,
        ResourceType::Fraction,
        ResourceType::Id,
        ResourceType::Integer,
        ResourceType::Interpolator,
        ResourceType::Layout,
        ResourceType::Menu,
        ResourceType::Mipmap,
        ResourceType::Navigation,
        ResourceType::Plurals,
        ResourceType::Raw,
        ResourceType::String,
        ResourceType::Style,
        ResourceType::Styleable,
        ResourceType::Transition,
        ResourceType::Xml,
        ResourceType::Public,
        ResourceType::Macro,
    ];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Name used in `R` classes, R.txt, public.txt and resource URLs
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Anim => "anim",
            ResourceType::Animator => "animator",
            ResourceType::Array => "array",
            ResourceType::Attr => "attr",
            ResourceType::Bool => "bool",
            ResourceType::Color => "color",
            ResourceType::Dimen => "dimen",
            ResourceType::Drawable => "drawable",
            ResourceType::Font => "font",
            ResourceType::Fraction => "fraction",
            ResourceType::Id => "id",
            ResourceType::Integer => "integer",
            ResourceType::Interpolator => "interpolator",
            ResourceType::Layout => "layout",
            ResourceType::Menu => "menu",
            ResourceType::Mipmap => "mipmap",
            ResourceType::Navigation => "navigation",
            ResourceType::Plurals => "plurals",
            ResourceType::Raw => "raw",
            ResourceType::String => "string",
            ResourceType::Style => "style",
            ResourceType::Styleable => "styleable",
            ResourceType::Transition => "transition",
            ResourceType::Xml => "xml",
            ResourceType::Public => "public",
            ResourceType::Macro => "macro",
        }
    }

    /// Human readable name for reports
    pub fn display_name(self) -> &'static str {
        match self {
            ResourceType::Anim => "Animation",
            ResourceType::Animator => "Animator",
            ResourceType::Array => "Array",
            ResourceType::Attr => "Attr",
            ResourceType::Bool => "Boolean",
            ResourceType::Color => "Color",
            ResourceType::Dimen => "Dimension",
            ResourceType::Drawable => "Drawable",
            ResourceType::Font => "Font",
            ResourceType::Fraction => "Fraction",
            ResourceType::Id => "ID",
            ResourceType::Integer => "Integer",
            ResourceType::Interpolator => "Interpolator",
            ResourceType::Layout => "Layout",
            ResourceType::Menu => "Menu",
            ResourceType::Mipmap => "Mip Map",
            ResourceType::Navigation => "Navigation",
            ResourceType::Plurals => "Plurals",
            ResourceType::Raw => "Raw",
            ResourceType::String => "String",
            ResourceType::Style => "Style",
            ResourceType::Styleable => "Styleable",
            ResourceType::Transition => "Transition",
            ResourceType::Xml => "XML",
            ResourceType::Public => "Public",
            ResourceType::Macro => "Macro",
        }
    }

    /// Parse the class name used by R.txt and public.txt (`string`, `id`, ...)
    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Resource type declared by a tag directly below `<resources>`
    pub fn from_xml_tag_name(tag: &str) -> Option<Self> {
        match tag {
            "declare-styleable" => Some(ResourceType::Styleable),
            "string-array" | "integer-array" => Some(ResourceType::Array),
            "item" | "eat-comment" | "skip" => None,
            _ => Self::from_class_name(tag),
        }
    }

    /// Types whose value is a reference to a file in a type folder
    pub fn is_file_reference(self) -> bool {
        matches!(
            self,
            ResourceType::Animator
                | ResourceType::Drawable
                | ResourceType::Interpolator
                | ResourceType::Layout
                | ResourceType::Menu
                | ResourceType::Mipmap
                | ResourceType::Transition
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Visibility of a resource outside of its library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceVisibility {
    PrivateXmlOnly,
    Private,
    Public,
}

impl ResourceVisibility {
    pub const ALL: [ResourceVisibility; 3] = [
        ResourceVisibility::PrivateXmlOnly,
        ResourceVisibility::Private,
        ResourceVisibility::Public,
    ];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceVisibility::PrivateXmlOnly => "private_xml_only",
            ResourceVisibility::Private => "private",
            ResourceVisibility::Public => "public",
        }
    }
}

bitflags! {
    /// Value formats an attr accepts (`format="color|reference"`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeFormats: u32 {
        const BOOLEAN = 1 << 0;
        const COLOR = 1 << 1;
        const DIMENSION = 1 << 2;
        const ENUM = 1 << 3;
        const FLAGS = 1 << 4;
        const FLOAT = 1 << 5;
        const FRACTION = 1 << 6;
        const INTEGER = 1 << 7;
        const REFERENCE = 1 << 8;
        const STRING = 1 << 9;
    }
}

impl AttributeFormats {
    /// Formats assumed for an attr that never declares any
    pub const DEFAULT: AttributeFormats = AttributeFormats::BOOLEAN
        .union(AttributeFormats::COLOR)
        .union(AttributeFormats::DIMENSION)
        .union(AttributeFormats::FLOAT)
        .union(AttributeFormats::FRACTION)
        .union(AttributeFormats::INTEGER)
        .union(AttributeFormats::REFERENCE)
        .union(AttributeFormats::STRING);

    /// Parse a `format` attribute value; unknown names are ignored
    pub fn parse(formats: &str) -> Self {
        formats
            .split('|')
            .map(str::trim)
            .filter_map(Self::from_format_name)
            .fold(AttributeFormats::empty(), |acc, f| acc | f)
    }

    fn from_format_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(AttributeFormats::BOOLEAN),
            "color" => Some(AttributeFormats::COLOR),
            "dimension" => Some(AttributeFormats::DIMENSION),
            "enum" => Some(AttributeFormats::ENUM),
            "flags" => Some(AttributeFormats::FLAGS),
            "float" => Some(AttributeFormats::FLOAT),
            "fraction" => Some(AttributeFormats::FRACTION),
            "integer" => Some(AttributeFormats::INTEGER),
            "reference" => Some(AttributeFormats::REFERENCE),
            "string" => Some(AttributeFormats::STRING),
            _ => None,
        }
    }
}

/// Plural category (CLDR), not a quantity number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arity {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl Arity {
    pub const ALL: [Arity; 6] = [
        Arity::Zero,
        Arity::One,
        Arity::Two,
        Arity::Few,
        Arity::Many,
        Arity::Other,
    ];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Arity::Zero => "zero",
            Arity::One => "one",
            Arity::Two => "two",
            Arity::Few => "few",
            Arity::Many => "many",
            Arity::Other => "other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }
}

/// Screen density of a density-qualified folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Density {
    Low,
    Medium,
    Tv,
    High,
    XHigh,
    XxHigh,
    XxxHigh,
    Any,
    NoDpi,
    Custom(u16),
}

impl Density {
    const NAMED: [Density; 9] = [
        Density::Low,
        Density::Medium,
        Density::Tv,
        Density::High,
        Density::XHigh,
        Density::XxHigh,
        Density::XxxHigh,
        Density::Any,
        Density::NoDpi,
    ];

    pub const DEFAULT_DPI: u32 = 160;

    pub fn dpi(self) -> u32 {
        match self {
            Density::Low => 120,
            Density::Medium => 160,
            Density::Tv => 213,
            Density::High => 240,
            Density::XHigh => 320,
            Density::XxHigh => 480,
            Density::XxxHigh => 640,
            Density::Any => 0xFFFE,
            Density::NoDpi => 0xFFFF,
            Density::Custom(dpi) => u32::from(dpi),
        }
    }

    pub fn from_dpi(dpi: u32) -> Option<Self> {
        if let Some(named) = Self::NAMED.iter().copied().find(|d| d.dpi() == dpi) {
            return Some(named);
        }
        u16::try_from(dpi)
            .ok()
            .filter(|dpi| *dpi > 0)
            .map(Density::Custom)
    }

    pub fn qualifier(self) -> String {
        match self {
            Density::Low => "ldpi".to_string(),
            Density::Medium => "mdpi".to_string(),
            Density::Tv => "tvdpi".to_string(),
            Density::High => "hdpi".to_string(),
            Density::XHigh => "xhdpi".to_string(),
            Density::XxHigh => "xxhdpi".to_string(),
            Density::XxxHigh => "xxxhdpi".to_string(),
            Density::Any => "anydpi".to_string(),
            Density::NoDpi => "nodpi".to_string(),
            Density::Custom(dpi) => format!("{}dpi", dpi),
        }
    }

    pub fn from_qualifier(segment: &str) -> Option<Self> {
        if let Some(named) = Self::NAMED.iter().copied().find(|d| d.qualifier() == segment) {
            return Some(named);
        }
        let digits = segment.strip_suffix("dpi")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::from_dpi(digits.parse().ok()?)
    }

    /// Real screen densities, as opposed to `anydpi` and `nodpi`
    pub fn is_physical(self) -> bool {
        !matches!(self, Density::Any | Density::NoDpi)
    }
}

/// Kind of a folder directly below `res/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFolderType {
    Anim,
    Animator,
    Color,
    Drawable,
    Font,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Raw,
    Transition,
    Values,
    Xml,
}

impl ResourceFolderType {
    const ALL: [ResourceFolderType; 14] = [
        ResourceFolderType::Anim,
        ResourceFolderType::Animator,
        ResourceFolderType::Color,
        ResourceFolderType::Drawable,
        ResourceFolderType::Font,
        ResourceFolderType::Interpolator,
        ResourceFolderType::Layout,
        ResourceFolderType::Menu,
        ResourceFolderType::Mipmap,
        ResourceFolderType::Navigation,
        ResourceFolderType::Raw,
        ResourceFolderType::Transition,
        ResourceFolderType::Values,
        ResourceFolderType::Xml,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceFolderType::Anim => "anim",
            ResourceFolderType::Animator => "animator",
            ResourceFolderType::Color => "color",
            ResourceFolderType::Drawable => "drawable",
            ResourceFolderType::Font => "font",
            ResourceFolderType::Interpolator => "interpolator",
            ResourceFolderType::Layout => "layout",
            ResourceFolderType::Menu => "menu",
            ResourceFolderType::Mipmap => "mipmap",
            ResourceFolderType::Navigation => "navigation",
            ResourceFolderType::Raw => "raw",
            ResourceFolderType::Transition => "transition",
            ResourceFolderType::Values => "values",
            ResourceFolderType::Xml => "xml",
        }
    }

    /// Folder type from a full folder name such as `drawable-hdpi`
    pub fn from_folder_name(folder_name: &str) -> Option<Self> {
        let prefix = folder_name.split('-').next().unwrap_or(folder_name);
        Self::ALL.iter().copied().find(|t| t.name() == prefix)
    }

    /// Resource type of the files in a non-values folder
    pub fn resource_type(self) -> Option<ResourceType> {
        match self {
            ResourceFolderType::Anim => Some(ResourceType::Anim),
            ResourceFolderType::Animator => Some(ResourceType::Animator),
            ResourceFolderType::Color => Some(ResourceType::Color),
            ResourceFolderType::Drawable => Some(ResourceType::Drawable),
            ResourceFolderType::Font => Some(ResourceType::Font),
            ResourceFolderType::Interpolator => Some(ResourceType::Interpolator),
            ResourceFolderType::Layout => Some(ResourceType::Layout),
            ResourceFolderType::Menu => Some(ResourceType::Menu),
            ResourceFolderType::Mipmap => Some(ResourceType::Mipmap),
            ResourceFolderType::Navigation => Some(ResourceType::Navigation),
            ResourceFolderType::Raw => Some(ResourceType::Raw),
            ResourceFolderType::Transition => Some(ResourceType::Transition),
            ResourceFolderType::Values => None,
            ResourceFolderType::Xml => Some(ResourceType::Xml),
        }
    }

    /// XML files in these folders may declare ids with `@+id/`
    pub fn is_id_generating(self) -> bool {
        matches!(
            self,
            ResourceFolderType::Drawable
                | ResourceFolderType::Layout
                | ResourceFolderType::Menu
                | ResourceFolderType::Navigation
                | ResourceFolderType::Transition
                | ResourceFolderType::Xml
        )
    }

    pub fn is_density_based(self) -> bool {
        matches!(self, ResourceFolderType::Drawable | ResourceFolderType::Mipmap)
    }
}
