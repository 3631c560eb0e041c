//! Turns a device's declared intent into the command lines to submit.

use std::error::Error as StdError;
use std::fs;
use std::path::Path;

use log::debug;
use tera::{Context, Tera};

use super::inventory::{DeviceSpec, Vars};
use crate::error::{DeviceError, InventoryError};

/// Renders device templates with layered variables.
///
/// Variable precedence, lowest first: the device's own `name` and `host`,
/// the inventory `defaults`, then the device's variables.
#[derive(Debug, Default)]
pub struct CommandRenderer {
    tera: Tera,
    defaults: Vars,
}

impl CommandRenderer {
    /// Renderer with no templates loaded.
    pub fn new(defaults: Vars) -> Self {
        Self {
            tera: Tera::default(),
            defaults,
        }
    }

    /// Load every regular file in `dir` as a template named after its file name.
    pub fn from_dir(dir: &Path, defaults: Vars) -> Result<Self, InventoryError> {
        let templates_error = |message: String| InventoryError::Templates {
            dir: dir.to_path_buf(),
            message,
        };

        let mut renderer = Self::new(defaults);
        let entries = fs::read_dir(dir).map_err(|e| templates_error(e.to_string()))?;

        for entry in entries {
            let path = entry.map_err(|e| templates_error(e.to_string()))?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path).map_err(|e| templates_error(format!("{}: {}", name, e)))?;
            renderer
                .add_template(name, &content)
                .map_err(|e| templates_error(format!("{}: {}", name, error_chain(&e))))?;
            debug!("Loaded template {}", name);
        }

        Ok(renderer)
    }

    /// Register a template from a string.
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<(), tera::Error> {
        self.tera.add_raw_template(name, content)
    }

    /// Ordered commands for `device`.
    ///
    /// Inline commands are returned verbatim. Template output is split on
    /// newlines with blank lines dropped; indentation is kept since IOS uses
    /// it for sub-mode lines. Zero commands is reported as
    /// [`DeviceError::EmptyConfiguration`].
    pub fn render(&self, device: &DeviceSpec) -> Result<Vec<String>, DeviceError> {
        let commands = match (&device.commands, &device.template) {
            (Some(commands), _) => commands.clone(),
            (None, Some(template)) => self.render_template(template, device)?,
            (None, None) => Vec::new(),
        };

        if commands.is_empty() {
            return Err(DeviceError::EmptyConfiguration);
        }
        Ok(commands)
    }

    fn render_template(&self, template: &str, device: &DeviceSpec) -> Result<Vec<String>, DeviceError> {
        let render_error = |message: String| DeviceError::TemplateRender {
            template: template.to_string(),
            message,
        };

        if !self.tera.get_template_names().any(|n| n == template) {
            return Err(render_error("template not found".to_string()));
        }

        let rendered = self
            .tera
            .render(template, &self.context(device))
            .map_err(|e| render_error(error_chain(&e)))?;

        Ok(split_commands(&rendered))
    }

    fn context(&self, device: &DeviceSpec) -> Context {
        let mut context = Context::new();
        context.insert("name", &device.name);
        context.insert("host", &device.host);
        for (key, value) in self.defaults.iter().chain(device.vars.iter()) {
            context.insert(key.as_str(), value);
        }
        context
    }
}

/// One command per non-blank line, trailing whitespace removed.
pub fn split_commands(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tera keeps the useful part of a message in the source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
