//! Minimal reader for the INI dialect chain descriptions are written in.
//!
//! Sections are `[name]` headers, options are `key = value` or `key: value`.
//! Option names are case-insensitive, lines starting with `#` or `;` are
//! comments and lines indented deeper than their option continue its value.
//! Options of the `DEFAULT` section are visible from every other section.

use std::collections::HashMap;

pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IniError {
    #[error("line {line}: option found before any section header")]
    MissingSectionHeader { line: usize },

    #[error("line {line}: expected `[section]` or `key = value`")]
    Syntax { line: usize },

    #[error("line {line}: section '{section}' already exists")]
    DuplicateSection { line: usize, section: String },

    #[error("line {line}: option '{key}' in section '{section}' already exists")]
    DuplicateOption {
        line: usize,
        section: String,
        key: String,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Ini {
    defaults: HashMap<String, String>,
    sections: HashMap<String, HashMap<String, String>>,
}

struct Cursor {
    section: String,
    key: String,
    indent: usize,
}

impl Ini {
    pub fn parse(source: &str) -> Result<Self, IniError> {
        let mut ini = Ini::default();
        let mut section: Option<String> = None;
        let mut cursor: Option<Cursor> = None;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                cursor = None;
                continue;
            }

            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indent = raw.len() - raw.trim_start().len();

            if let Some(cur) = &cursor {
                if indent > cur.indent {
                    if let Some(value) = ini.value_mut(&cur.section, &cur.key) {
                        value.push('\n');
                        value.push_str(trimmed);
                    }
                    continue;
                }
            }

            if trimmed.starts_with('[') {
                let name = match trimmed.rfind(']') {
                    Some(end) if end > 1 => &trimmed[1..end],
                    _ => return Err(IniError::Syntax { line }),
                };

                if name != DEFAULT_SECTION {
                    if ini.sections.contains_key(name) {
                        return Err(IniError::DuplicateSection {
                            line,
                            section: name.to_owned(),
                        });
                    }
                    ini.sections.insert(name.to_owned(), HashMap::new());
                }

                section = Some(name.to_owned());
                cursor = None;
                continue;
            }

            let current = match &section {
                Some(current) => current.clone(),
                None => return Err(IniError::MissingSectionHeader { line }),
            };

            let split = match trimmed.find(|c: char| c == '=' || c == ':') {
                Some(split) => split,
                None => return Err(IniError::Syntax { line }),
            };

            let key = trimmed[..split].trim().to_lowercase();
            let value = trimmed[split + 1..].trim().to_owned();

            if key.is_empty() {
                return Err(IniError::Syntax { line });
            }

            let options = ini.options_mut(&current);
            if options.contains_key(&key) {
                return Err(IniError::DuplicateOption {
                    line,
                    section: current,
                    key,
                });
            }
            options.insert(key.clone(), value);

            cursor = Some(Cursor {
                section: current,
                key,
                indent,
            });
        }

        Ok(ini)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Looks option up in `section`, falling back to `DEFAULT`.
    /// Returns `None` if section itself does not exist.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let options = self.sections.get(section)?;
        let key = key.to_lowercase();
        options
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
    }

    fn options_mut(&mut self, section: &str) -> &mut HashMap<String, String> {
        if section == DEFAULT_SECTION {
            &mut self.defaults
        } else {
            self.sections.entry(section.to_owned()).or_default()
        }
    }

    fn value_mut(&mut self, section: &str, key: &str) -> Option<&mut String> {
        self.options_mut(section).get_mut(key)
    }
}
