//! Code generation for a modeled package
//!
//! Output is rendered through Handlebars templates from the views built in
//! [`views`]. One run produces:
//! - `models.rs` with enums and table structs
//! - one `<module>.rs` per query source file
//! - `mod.rs` declaring the modules and re-exporting the runtime types

use crate::model::Package;
use crate::{GenerateError, GeneratedFiles, Result};
use handlebars::Handlebars;
use serde::Serialize;

pub mod templates;
pub mod views;

/// Template-based code generator
pub struct TemplateGenerator {
    handlebars: Handlebars<'static>,
}

impl TemplateGenerator {
    /// Create a new template generator
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        // Output is Rust source, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("doc", Box::new(doc_helper));
        handlebars.register_helper("rust_str", Box::new(rust_str_helper));

        Self { handlebars }
    }

    /// Register a template
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| GenerateError::CodeGen(format!("Template registration failed: {}", e)))?;
        Ok(())
    }

    /// Register a partial usable as `{{> name}}`
    pub fn register_partial(&mut self, name: &str, partial: &str) -> Result<()> {
        self.handlebars
            .register_partial(name, partial)
            .map_err(|e| GenerateError::CodeGen(format!("Partial registration failed: {}", e)))?;
        Ok(())
    }

    /// Render a template with context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        Ok(self.handlebars.render(template_name, context)?)
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a package into Rust source files
pub struct Renderer {
    generator: TemplateGenerator,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut generator = TemplateGenerator::new();
        generator.register_partial("struct", templates::STRUCT_PARTIAL)?;
        generator.register_template("models", templates::MODELS_TEMPLATE)?;
        generator.register_template("queries", templates::QUERIES_TEMPLATE)?;
        generator.register_template("mod", templates::MOD_TEMPLATE)?;

        Ok(Self { generator })
    }

    /// Render every output file of `package`
    pub fn render(&self, package: &Package) -> Result<GeneratedFiles> {
        let mut files = GeneratedFiles::new();

        let models = views::models_file(package);
        files.insert("models.rs".to_string(), self.generator.render("models", &models)?);

        let query_files = views::query_files(package)?;
        let modules: Vec<String> = query_files.keys().cloned().collect();
        for (module, file) in &query_files {
            log::debug!(
                "Rendering module '{}' with {} query(ies)",
                module,
                file.queries.len()
            );
            files.insert(format!("{}.rs", module), self.generator.render("queries", file)?);
        }

        let root = views::mod_file(package, modules);
        files.insert("mod.rs".to_string(), self.generator.render("mod", &root)?);

        Ok(files)
    }
}

// Handlebars helper functions

/// `{{doc lines indent}}` writes each line as a `///` comment, every line
/// followed by `indent`
fn doc_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h
        .param(0)
        .ok_or_else(|| handlebars::RenderError::new("doc helper requires a parameter"))?;

    let lines = param
        .value()
        .as_array()
        .ok_or_else(|| handlebars::RenderError::new("doc helper requires an array parameter"))?;

    let indent = h.param(1).and_then(|p| p.value().as_str()).unwrap_or("");

    for line in lines {
        let text = line.as_str().unwrap_or("");
        if text.is_empty() {
            out.write("///\n")?;
        } else {
            out.write(&format!("/// {}\n", text))?;
        }
        out.write(indent)?;
    }
    Ok(())
}

/// `{{rust_str value}}` writes a quoted Rust string literal
fn rust_str_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h
        .param(0)
        .ok_or_else(|| handlebars::RenderError::new("rust_str helper requires a parameter"))?;

    let input = param
        .value()
        .as_str()
        .ok_or_else(|| handlebars::RenderError::new("rust_str helper requires a string parameter"))?;

    out.write(&format!("{:?}", input))?;
    Ok(())
}
