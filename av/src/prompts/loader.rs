//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to embedded
//! defaults, then renders them in strict mode.

use std::path::{Path, PathBuf};

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError, RenderErrorReason,
};
use serde::Serialize;
use tracing::{debug, info};

use super::{ContractError, embedded};
use crate::schema::DataUri;

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.agrivision/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `user_dir` before the embedded copies
    ///
    /// A directory that does not exist is ignored.
    pub fn new(user_dir: impl AsRef<Path>) -> Self {
        let user_dir = user_dir.as_ref();
        let exists = user_dir.is_dir();
        debug!(?user_dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: exists.then(|| user_dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.register_helper("media", Box::new(media_helper));
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{user_dir}/{name}.pmt`
    /// 2. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String, ContractError> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path).map_err(|source| ContractError::TemplateRead { path, source });
            }
            debug!(?path, "PromptLoader::load_template: not found in user override");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(ContractError::TemplateNotFound(name.to_string()))
    }

    /// Render a template with the given record as context
    ///
    /// Every field the template references must be present in `context`.
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String, ContractError> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| ContractError::Render {
                template: template_name.to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

/// `{{media url=field}}` - marks where an attached image belongs in the prompt
///
/// The image itself travels as a separate media part of the request.
fn media_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .hash_get("url")
        .ok_or_else(|| RenderError::from(RenderErrorReason::ParamNotFoundForName("media", "url".to_string())))?;

    if param.is_value_missing() {
        return Err(RenderErrorReason::ParamNotFoundForName("media", "url".to_string()).into());
    }

    let marker = match param.value().as_str().map(DataUri::parse) {
        Some(Ok(uri)) => format!("[attached image: {}]", uri.mime()),
        _ => "[attached image]".to_string(),
    };
    out.write(&marker)?;
    Ok(())
}
