use super::types::Density;
use std::fmt;

/// Qualifier categories in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QualifierKind {
    CountryCode,
    NetworkCode,
    Locale,
    LayoutDirection,
    SmallestWidth,
    ScreenWidth,
    ScreenHeight,
    ScreenSize,
    ScreenRatio,
    ScreenRound,
    WideColorGamut,
    HighDynamicRange,
    Orientation,
    UiMode,
    NightMode,
    Density,
    Touchscreen,
    KeyboardState,
    TextInput,
    NavigationState,
    Navigation,
    Version,
}

impl QualifierKind {
    pub const ALL: [QualifierKind; 22] = [
        QualifierKind::CountryCode,
        QualifierKind::NetworkCode,
        QualifierKind::Locale,
        QualifierKind::LayoutDirection,
        QualifierKind::SmallestWidth,
        QualifierKind::ScreenWidth,
        QualifierKind::ScreenHeight,
        QualifierKind::ScreenSize,
        QualifierKind::ScreenRatio,
        QualifierKind::ScreenRound,
        QualifierKind::WideColorGamut,
        QualifierKind::HighDynamicRange,
        QualifierKind::Orientation,
        QualifierKind::UiMode,
        QualifierKind::NightMode,
        QualifierKind::Density,
        QualifierKind::Touchscreen,
        QualifierKind::KeyboardState,
        QualifierKind::TextInput,
        QualifierKind::NavigationState,
        QualifierKind::Navigation,
        QualifierKind::Version,
    ];
}

/// Qualifiers that are one keyword out of a fixed list. For screen size the
/// list is ordered from smallest to largest.
const KEYWORDS: &[(QualifierKind, &[&str])] = &[
    (QualifierKind::LayoutDirection, &["ldltr", "ldrtl"]),
    (QualifierKind::ScreenSize, &["small", "normal", "large", "xlarge"]),
    (QualifierKind::ScreenRatio, &["long", "notlong"]),
    (QualifierKind::ScreenRound, &["round", "notround"]),
    (QualifierKind::WideColorGamut, &["widecg", "nowidecg"]),
    (QualifierKind::HighDynamicRange, &["highdr", "lowdr"]),
    (QualifierKind::Orientation, &["port", "land", "square"]),
    (
        QualifierKind::UiMode,
        &["car", "desk", "television", "appliance", "watch", "vrheadset"],
    ),
    (QualifierKind::NightMode, &["notnight", "night"]),
    (QualifierKind::Touchscreen, &["notouch", "stylus", "finger"]),
    (QualifierKind::KeyboardState, &["keysexposed", "keyshidden", "keyssoft"]),
    (QualifierKind::TextInput, &["nokeys", "qwerty", "12key"]),
    (QualifierKind::NavigationState, &["navexposed", "navhidden"]),
    (QualifierKind::Navigation, &["nonav", "dpad", "trackball", "wheel"]),
];

/// Language, optional script and optional region
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleQualifier {
    pub language: String,
    pub script: Option<String>,
    pub region: Option<String>,
}

impl LocaleQualifier {
    /// `fr`, `fr` + `rCA` (two segments), or BCP 47 `b+sr+Latn+RS`
    fn parse(segment: &str, next: Option<&str>) -> Option<(Self, usize)> {
        if let Some(tag) = segment.strip_prefix("b+") {
            return Self::parse_bcp47(tag).map(|locale| (locale, 1));
        }

        if !is_language(segment) {
            return None;
        }
        let language = segment.to_string();

        match next.and_then(parse_region) {
            Some(region) => Some((
                Self {
                    language,
                    script: None,
                    region: Some(region),
                },
                2,
            )),
            None => Some((
                Self {
                    language,
                    script: None,
                    region: None,
                },
                1,
            )),
        }
    }

    fn parse_bcp47(tag: &str) -> Option<Self> {
        let mut parts = tag.split('+');
        let language = parts.next().filter(|l| is_language(l))?.to_string();
        let mut script = None;
        let mut region = None;

        for part in parts {
            if part.len() == 4 && part.chars().all(|c| c.is_ascii_alphabetic()) && script.is_none() {
                script = Some(part.to_string());
            } else if (part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
                || (part.len() == 3 && part.chars().all(|c| c.is_ascii_digit()))
            {
                region = Some(part.to_ascii_uppercase());
            } else {
                return None;
            }
        }

        Some(Self {
            language,
            script,
            region,
        })
    }

    fn is_bcp47(&self) -> bool {
        self.script.is_some() || self.language.len() == 3
    }

    fn segment(&self) -> String {
        if self.is_bcp47() {
            let mut tag = format!("b+{}", self.language);
            if let Some(script) = &self.script {
                tag.push('+');
                tag.push_str(script);
            }
            if let Some(region) = &self.region {
                tag.push('+');
                tag.push_str(region);
            }
            tag
        } else {
            match &self.region {
                Some(region) => format!("{}-r{}", self.language, region),
                None => self.language.clone(),
            }
        }
    }

    fn is_match_for(&self, target: &LocaleQualifier) -> bool {
        if !self.language.eq_ignore_ascii_case(&target.language) {
            return false;
        }
        if let Some(region) = &self.region {
            if target.region.as_deref() != Some(region.as_str()) {
                return false;
            }
        }
        if let Some(script) = &self.script {
            if target.script.as_deref() != Some(script.as_str()) {
                return false;
            }
        }
        true
    }
}

fn is_language(segment: &str) -> bool {
    (segment.len() == 2 || segment.len() == 3) && segment.chars().all(|c| c.is_ascii_lowercase())
}

fn parse_region(segment: &str) -> Option<String> {
    let region = segment.strip_prefix('r')?;
    let valid = (region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase()))
        || (region.len() == 3 && region.chars().all(|c| c.is_ascii_digit()));
    valid.then(|| region.to_string())
}

fn parse_prefixed_number(segment: &str, prefix: &str, suffix: &str) -> Option<u16> {
    let digits = segment.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// One decoded folder qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    CountryCode(u16),
    NetworkCode(u16),
    Locale(LocaleQualifier),
    SmallestWidth(u16),
    ScreenWidth(u16),
    ScreenHeight(u16),
    Density(Density),
    Version(u16),
    Keyword(QualifierKind, &'static str),
}

impl Qualifier {
    pub fn kind(&self) -> QualifierKind {
        match self {
            Qualifier::CountryCode(_) => QualifierKind::CountryCode,
            Qualifier::NetworkCode(_) => QualifierKind::NetworkCode,
            Qualifier::Locale(_) => QualifierKind::Locale,
            Qualifier::SmallestWidth(_) => QualifierKind::SmallestWidth,
            Qualifier::ScreenWidth(_) => QualifierKind::ScreenWidth,
            Qualifier::ScreenHeight(_) => QualifierKind::ScreenHeight,
            Qualifier::Density(_) => QualifierKind::Density,
            Qualifier::Version(_) => QualifierKind::Version,
            Qualifier::Keyword(kind, _) => *kind,
        }
    }

    /// Decode the qualifier starting at `segment`; returns it together with
    /// the number of segments consumed
    fn parse(segment: &str, next: Option<&str>) -> Option<(Self, usize)> {
        for (kind, keywords) in KEYWORDS {
            if let Some(keyword) = keywords.iter().find(|k| **k == segment) {
                return Some((Qualifier::Keyword(*kind, *keyword), 1));
            }
        }

        if let Some(mcc) = parse_prefixed_number(segment, "mcc", "") {
            return Some((Qualifier::CountryCode(mcc), 1));
        }
        if let Some(mnc) = parse_prefixed_number(segment, "mnc", "") {
            return Some((Qualifier::NetworkCode(mnc), 1));
        }
        if let Some(dp) = parse_prefixed_number(segment, "sw", "dp") {
            return Some((Qualifier::SmallestWidth(dp), 1));
        }
        if let Some(dp) = parse_prefixed_number(segment, "w", "dp") {
            return Some((Qualifier::ScreenWidth(dp), 1));
        }
        if let Some(dp) = parse_prefixed_number(segment, "h", "dp") {
            return Some((Qualifier::ScreenHeight(dp), 1));
        }
        if let Some(version) = parse_prefixed_number(segment, "v", "") {
            return Some((Qualifier::Version(version), 1));
        }
        if let Some(density) = Density::from_qualifier(segment) {
            return Some((Qualifier::Density(density), 1));
        }

        LocaleQualifier::parse(segment, next).map(|(locale, used)| (Qualifier::Locale(locale), used))
    }

    fn segment(&self) -> String {
        match self {
            Qualifier::CountryCode(mcc) => format!("mcc{:03}", mcc),
            Qualifier::NetworkCode(mnc) => format!("mnc{:03}", mnc),
            Qualifier::Locale(locale) => locale.segment(),
            Qualifier::SmallestWidth(dp) => format!("sw{}dp", dp),
            Qualifier::ScreenWidth(dp) => format!("w{}dp", dp),
            Qualifier::ScreenHeight(dp) => format!("h{}dp", dp),
            Qualifier::Density(density) => density.qualifier(),
            Qualifier::Version(version) => format!("v{}", version),
            Qualifier::Keyword(_, keyword) => keyword.to_string(),
        }
    }

    /// Whether a resource qualified with `self` can be used on a device
    /// described by `target` (same kind)
    fn is_match_for(&self, target: &Qualifier) -> bool {
        match (self, target) {
            (Qualifier::Locale(own), Qualifier::Locale(other)) => own.is_match_for(other),
            (Qualifier::SmallestWidth(own), Qualifier::SmallestWidth(other))
            | (Qualifier::ScreenWidth(own), Qualifier::ScreenWidth(other))
            | (Qualifier::ScreenHeight(own), Qualifier::ScreenHeight(other))
            | (Qualifier::Version(own), Qualifier::Version(other)) => own <= other,
            (Qualifier::Density(_), Qualifier::Density(_)) => true,
            (
                Qualifier::Keyword(QualifierKind::ScreenSize, own),
                Qualifier::Keyword(QualifierKind::ScreenSize, other),
            ) => keyword_rank(QualifierKind::ScreenSize, own) <= keyword_rank(QualifierKind::ScreenSize, other),
            (own, other) => own == other,
        }
    }

    /// Preference among matching qualifiers of one kind, higher is better
    fn match_score(&self, target: &Qualifier) -> i64 {
        match (self, target) {
            (Qualifier::Density(own), Qualifier::Density(other)) => density_score(*own, *other),
            (Qualifier::Locale(own), _) => {
                i64::from(own.region.is_some()) + i64::from(own.script.is_some())
            }
            (Qualifier::SmallestWidth(v), _)
            | (Qualifier::ScreenWidth(v), _)
            | (Qualifier::ScreenHeight(v), _)
            | (Qualifier::Version(v), _) => i64::from(*v),
            (Qualifier::Keyword(QualifierKind::ScreenSize, own), _) => {
                keyword_rank(QualifierKind::ScreenSize, own) as i64
            }
            _ => 0,
        }
    }

    fn implied_version(&self) -> u16 {
        match self {
            Qualifier::Density(Density::Any) => 21,
            Qualifier::Density(_) => 4,
            Qualifier::Locale(locale) if locale.is_bcp47() => 21,
            Qualifier::SmallestWidth(_) | Qualifier::ScreenWidth(_) | Qualifier::ScreenHeight(_) => 13,
            Qualifier::Keyword(kind, keyword) => match kind {
                QualifierKind::ScreenSize | QualifierKind::ScreenRatio => 4,
                QualifierKind::LayoutDirection => 17,
                QualifierKind::ScreenRound => 23,
                QualifierKind::WideColorGamut | QualifierKind::HighDynamicRange => 26,
                QualifierKind::NightMode => 8,
                QualifierKind::UiMode => match *keyword {
                    "car" | "desk" => 8,
                    "television" | "appliance" => 13,
                    "watch" => 20,
                    "vrheadset" => 26,
                    _ => 0,
                },
                _ => 0,
            },
            _ => 0,
        }
    }
}

fn keyword_rank(kind: QualifierKind, keyword: &str) -> usize {
    KEYWORDS
        .iter()
        .find(|(k, _)| *k == kind)
        .and_then(|(_, keywords)| keywords.iter().position(|k| *k == keyword))
        .unwrap_or(0)
}

/// Exact density wins, then the closest higher density (scaled down), then
/// the closest lower one. `anydpi` beats everything, `nodpi` loses.
fn density_score(candidate: Density, target: Density) -> i64 {
    match candidate {
        Density::Any => i64::MAX,
        Density::NoDpi => i64::MIN + 1,
        _ => {
            let candidate = i64::from(candidate.dpi());
            let target = if target.is_physical() {
                i64::from(target.dpi())
            } else {
                i64::from(Density::DEFAULT_DPI)
            };
            if candidate == target {
                i64::MAX - 1
            } else if candidate > target {
                1_000_000 - (candidate - target)
            } else {
                -(target - candidate)
            }
        }
    }
}

/// Decoded qualifiers of a resource folder. The default configuration has
/// no qualifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FolderConfiguration {
    qualifiers: Vec<Qualifier>,
}

impl FolderConfiguration {
    /// Parse the dash-separated qualifier suffix of a folder name (without
    /// the folder type). Returns `None` for invalid or out-of-order input.
    pub fn from_qualifier_string(qualifiers: &str) -> Option<Self> {
        let mut config = FolderConfiguration::default();
        if qualifiers.is_empty() {
            return Some(config);
        }

        let segments: Vec<&str> = qualifiers.split('-').collect();
        let mut index = 0;
        let mut last_kind: Option<QualifierKind> = None;

        while index < segments.len() {
            let (qualifier, used) = Qualifier::parse(segments[index], segments.get(index + 1).copied())?;
            let kind = qualifier.kind();
            if last_kind.is_some_and(|last| kind <= last) {
                return None;
            }
            last_kind = Some(kind);
            config.qualifiers.push(qualifier);
            index += used;
        }

        config.normalize();
        Some(config)
    }

    /// Parse a full folder name such as `drawable-hdpi`; the part before
    /// the first dash is ignored
    pub fn from_folder_name(folder_name: &str) -> Option<Self> {
        match folder_name.split_once('-') {
            Some((_, qualifiers)) => Self::from_qualifier_string(qualifiers),
            None => Some(Self::default()),
        }
    }

    /// Drop a version qualifier already implied by the other qualifiers
    fn normalize(&mut self) {
        let implied = self
            .qualifiers
            .iter()
            .map(Qualifier::implied_version)
            .max()
            .unwrap_or(0);
        self.qualifiers
            .retain(|q| !matches!(q, Qualifier::Version(v) if *v <= implied));
    }

    pub fn is_default(&self) -> bool {
        self.qualifiers.is_empty()
    }

    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    pub fn get(&self, kind: QualifierKind) -> Option<&Qualifier> {
        self.qualifiers.iter().find(|q| q.kind() == kind)
    }

    pub fn density(&self) -> Option<Density> {
        match self.get(QualifierKind::Density) {
            Some(Qualifier::Density(density)) => Some(*density),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<u16> {
        match self.get(QualifierKind::Version) {
            Some(Qualifier::Version(version)) => Some(*version),
            _ => None,
        }
    }

    pub fn locale(&self) -> Option<&LocaleQualifier> {
        match self.get(QualifierKind::Locale) {
            Some(Qualifier::Locale(locale)) => Some(locale),
            _ => None,
        }
    }

    /// Dash-joined qualifier suffix, empty for the default configuration
    pub fn qualifier_string(&self) -> String {
        self.qualifiers
            .iter()
            .map(Qualifier::segment)
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Folder name for a folder type, e.g. `values-fr`
    pub fn folder_name(&self, folder_type: &str) -> String {
        if self.is_default() {
            folder_type.to_string()
        } else {
            format!("{}-{}", folder_type, self.qualifier_string())
        }
    }

    /// No qualifier contradicts the corresponding target qualifier.
    /// Qualifiers missing on either side never contradict.
    pub fn is_match_for(&self, target: &FolderConfiguration) -> bool {
        self.qualifiers.iter().all(|own| match target.get(own.kind()) {
            Some(other) => own.is_match_for(other),
            None => true,
        })
    }

    /// Index of the candidate that best matches `target`.
    ///
    /// Candidates contradicting the target are eliminated first. Then, for
    /// each qualifier the target specifies (in precedence order), only the
    /// candidates with the best value for that qualifier survive, provided
    /// at least one candidate specifies it. Density always participates,
    /// treating a missing density as `mdpi`.
    pub fn best_match(candidates: &[&FolderConfiguration], target: &FolderConfiguration) -> Option<usize> {
        let mut remaining: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.is_match_for(target))
            .map(|(index, _)| index)
            .collect();

        for kind in QualifierKind::ALL {
            if remaining.len() <= 1 {
                break;
            }

            if kind == QualifierKind::Density {
                let target_density = target.density().unwrap_or(Density::Medium);
                let score = |index: &usize| {
                    density_score(candidates[*index].density().unwrap_or(Density::Medium), target_density)
                };
                if let Some(best) = remaining.iter().map(&score).max() {
                    remaining.retain(|index| score(index) == best);
                }
                continue;
            }

            let Some(reference) = target.get(kind) else {
                continue;
            };
            let scored: Vec<(usize, i64)> = remaining
                .iter()
                .filter_map(|index| {
                    candidates[*index]
                        .get(kind)
                        .map(|qualifier| (*index, qualifier.match_score(reference)))
                })
                .collect();
            if let Some(best) = scored.iter().map(|(_, score)| *score).max() {
                remaining = scored
                    .into_iter()
                    .filter(|(_, score)| *score == best)
                    .map(|(index, _)| index)
                    .collect();
            }
        }

        remaining.first().copied()
    }
}

impl fmt::Display for FolderConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualifier_string())
    }
}
