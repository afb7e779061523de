use crate::resources::ResourceError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use tracing::debug;

/// Parser for AndroidManifest.xml files
pub struct ManifestParser;

impl ManifestParser {
    pub fn new() -> Self {
        Self
    }

    /// Read the `package` attribute of the manifest at `path`
    pub fn parse_package(&self, path: &Path) -> Result<Option<String>, ResourceError> {
        let contents = std::fs::read(path)?;
        self.parse_package_content(path, &contents)
    }

    /// Package declared by the root `<manifest>` element; `None` when the
    /// root is something else or has no `package` attribute
    pub fn parse_package_content(&self, path: &Path, contents: &[u8]) -> Result<Option<String>, ResourceError> {
        let mut reader = Reader::from_reader(contents);
        reader.trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() != b"manifest" {
                        return Ok(None);
                    }
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        if attr.key.as_ref() == b"package" {
                            let package = attr
                                .unescape_value()
                                .map_err(|err| ResourceError::xml(path, err.to_string()))?
                                .trim()
                                .to_string();
                            debug!("Parsed manifest {}: package {}", path.display(), package);
                            return Ok((!package.is_empty()).then_some(package));
                        }
                    }
                    return Ok(None);
                }
                Ok(Event::Eof) => return Ok(None),
                Err(e) => return Err(ResourceError::xml(path, e.to_string())),
                _ => {}
            }
            buf.clear();
        }
    }
}

impl Default for ManifestParser {
    fn default() -> Self {
        Self::new()
    }
}
