//! Sectioned key/value text reader used by the scene format.
//!
//! The grammar is deliberately small:
//!
//! - `[Name]` starts a section
//! - `Key = value` assigns inside the current section
//! - `#`, `;` and `//` start a comment that runs to the end of the line
//!
//! Section and key lookups are case-insensitive. Numeric triples may be
//! separated by whitespace or commas.

use std::collections::HashMap;

use lumen_math::Vec3;

use super::{LoadError, LoadResult};

/// One `[Section]` of a scene file.
#[derive(Debug, Default)]
pub struct Section {
    name: String,
    entries: HashMap<String, String>,
}

impl Section {
    /// The section name as written in the file.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    fn invalid(&self, key: &str, value: &str) -> LoadError {
        LoadError::InvalidValue {
            section: self.name.clone(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Read a string value.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or(default).to_string()
    }

    /// Read a float value.
    pub fn float_or(&self, key: &str, default: f32) -> LoadResult<f32> {
        match self.raw(key) {
            Some(value) => value.trim().parse().map_err(|_| self.invalid(key, value)),
            None => Ok(default),
        }
    }

    /// Read a non-negative integer value.
    pub fn index_or(&self, key: &str, default: usize) -> LoadResult<usize> {
        match self.raw(key) {
            Some(value) => value.trim().parse().map_err(|_| self.invalid(key, value)),
            None => Ok(default),
        }
    }

    /// Read a three-component vector.
    pub fn vec3_or(&self, key: &str, default: Vec3) -> LoadResult<Vec3> {
        match self.raw(key) {
            Some(value) => match parse_floats(value).as_deref() {
                Some([x, y, z]) => Ok(Vec3::new(*x, *y, *z)),
                _ => Err(self.invalid(key, value)),
            },
            None => Ok(default),
        }
    }

    /// Read a colour given either as a triple or as a single grey level.
    pub fn color_or(&self, key: &str, default: f32) -> LoadResult<Vec3> {
        match self.raw(key) {
            Some(value) => match parse_floats(value).as_deref() {
                Some([grey]) => Ok(Vec3::splat(*grey)),
                Some([r, g, b]) => Ok(Vec3::new(*r, *g, *b)),
                _ => Err(self.invalid(key, value)),
            },
            None => Ok(Vec3::splat(default)),
        }
    }
}

fn parse_floats(value: &str) -> Option<Vec<f32>> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().ok())
        .collect()
}

fn strip_comment(line: &str) -> &str {
    let cut = [line.find('#'), line.find(';'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..cut]
}

/// A parsed scene file: its sections keyed by lower-cased name.
#[derive(Debug, Default)]
pub struct ConfigFile {
    sections: HashMap<String, Section>,
}

impl ConfigFile {
    /// Parse the text of a scene file.
    pub fn parse(content: &str) -> LoadResult<Self> {
        let mut sections: HashMap<String, Section> = HashMap::new();
        let mut current: Option<String> = None;

        for (index, raw_line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest.strip_suffix(']').ok_or_else(|| LoadError::Parse {
                    line: line_no,
                    message: format!("unterminated section header '{}'", line),
                })?;
                let name = name.trim();
                let key = name.to_ascii_lowercase();
                sections.entry(key.clone()).or_insert_with(|| Section {
                    name: name.to_string(),
                    entries: HashMap::new(),
                });
                current = Some(key);
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| LoadError::Parse {
                line: line_no,
                message: format!("expected 'Key = value', found '{}'", line),
            })?;

            let section = current
                .as_ref()
                .and_then(|name| sections.get_mut(name))
                .ok_or_else(|| LoadError::Parse {
                    line: line_no,
                    message: "assignment outside of any section".to_string(),
                })?;

            section
                .entries
                .insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(Self { sections })
    }

    /// Get a section by name.
    pub fn section(&self, name: &str) -> LoadResult<&Section> {
        self.sections
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| LoadError::MissingSection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
        # leading comment
        [Scene]
        Exposure = 2.5        ; trailing comment
        Camera.Position = 0.0, 1.0, -10.0

        [Material0]
        type = checkerboard
        Diffuse = 0.5
        Specular = 1.0 0.5 0.25 // inline
    ";

    #[test]
    fn test_parse_sections_and_values() {
        let config = ConfigFile::parse(SAMPLE).unwrap();
        let scene = config.section("scene").unwrap();

        assert_eq!(scene.name(), "Scene");
        assert_eq!(scene.float_or("Exposure", 1.0).unwrap(), 2.5);
        assert_eq!(
            scene.vec3_or("Camera.Position", Vec3::ZERO).unwrap(),
            Vec3::new(0.0, 1.0, -10.0)
        );
        assert_eq!(scene.float_or("Missing", 7.0).unwrap(), 7.0);
    }

    #[test]
    fn test_color_accepts_scalar_or_triple() {
        let config = ConfigFile::parse(SAMPLE).unwrap();
        let material = config.section("Material0").unwrap();

        assert_eq!(material.string_or("Type", ""), "checkerboard");
        assert_eq!(material.color_or("Diffuse", 0.0).unwrap(), Vec3::splat(0.5));
        assert_eq!(
            material.color_or("Specular", 0.0).unwrap(),
            Vec3::new(1.0, 0.5, 0.25)
        );
        assert_eq!(material.color_or("Diffuse2", 0.0).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_missing_section() {
        let config = ConfigFile::parse(SAMPLE).unwrap();
        assert!(matches!(
            config.section("Light0"),
            Err(LoadError::MissingSection(name)) if name == "Light0"
        ));
    }

    #[test]
    fn test_invalid_number_reports_key() {
        let config = ConfigFile::parse("[Scene]\nExposure = bright\n").unwrap();
        let err = config.section("Scene").unwrap().float_or("Exposure", 1.0).unwrap_err();
        assert!(err.to_string().contains("Exposure"));
    }

    #[test]
    fn test_assignment_outside_section_is_an_error() {
        let err = ConfigFile::parse("Exposure = 1.0\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));
    }
}
