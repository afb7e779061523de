use crate::resources::ResourceError;
use indexmap::IndexSet;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use tracing::debug;

const NEW_ID_PREFIX: &str = "@+id/";

/// Ids declared by one file. When the file is malformed, `ids` holds what
/// was found before the error.
#[derive(Debug, Default)]
pub struct ScannedIds {
    pub ids: IndexSet<String>,
    pub error: Option<ResourceError>,
}

/// Scanner for the `@+id/` declarations of layout, menu and other
/// ID-generating XML files
pub struct LayoutParser;

impl LayoutParser {
    pub fn new() -> Self {
        Self
    }

    /// Collect the names declared with `@+id/name` in any attribute, in
    /// document order and without duplicates
    pub fn parse(&self, path: &Path, contents: &[u8]) -> ScannedIds {
        let mut scanned = ScannedIds::default();
        if let Err(e) = self.scan(path, contents, &mut scanned.ids) {
            scanned.error = Some(e);
        }
        debug!("Scanned {}: {} ids", path.display(), scanned.ids.len());
        scanned
    }

    fn scan(&self, path: &Path, contents: &[u8], ids: &mut IndexSet<String>) -> Result<(), ResourceError> {
        let mut reader = Reader::from_reader(contents);
        reader.trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| ResourceError::xml(path, err.to_string()))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|err| ResourceError::xml(path, err.to_string()))?;
                        if let Some(name) = value.trim().strip_prefix(NEW_ID_PREFIX) {
                            if !name.is_empty() {
                                ids.insert(name.to_string());
                            }
                        }
                    }
                }
                Ok(Event::Eof) => return Ok(()),
                Err(e) => return Err(ResourceError::xml(path, e.to_string())),
                _ => {}
            }
            buf.clear();
        }
    }
}

impl Default for LayoutParser {
    fn default() -> Self {
        Self::new()
    }
}
