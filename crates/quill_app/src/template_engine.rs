use handlebars::{Handlebars, no_escape};
use include_dir::{Dir, DirEntry, File, include_dir};
use lazy_static::lazy_static;
use quill_domain::Template;

static TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates");

fn files(dir: &'static Dir<'static>) -> impl Iterator<Item = &'static File<'static>> {
    dir.entries().iter().flat_map(walk_entry)
}

fn walk_entry(entry: &'static DirEntry<'static>) -> Box<dyn Iterator<Item = &'static File<'static>>> {
    match entry {
        DirEntry::File(f) => Box::new(std::iter::once(f)),
        DirEntry::Dir(d) => Box::new(d.entries().iter().flat_map(walk_entry)),
    }
}

/// Creates a Handlebars instance with strict mode, no HTML escaping, the
/// `inc` helper and every embedded prompt template registered under its
/// file name.
fn create_handlebar() -> Handlebars<'static> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_escape_fn(no_escape);

    // Register the 'inc' helper to increment index for 1-based numbering
    hb.register_helper(
        "inc",
        Box::new(
            |h: &handlebars::Helper,
             _: &handlebars::Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output|
             -> handlebars::HelperResult {
                let value = h.param(0).and_then(|v| v.value().as_u64()).ok_or_else(|| {
                    handlebars::RenderErrorReason::ParamNotFoundForIndex("inc", 0)
                })?;
                out.write(&(value + 1).to_string())?;
                Ok(())
            },
        ),
    );

    for file in files(&TEMPLATES) {
        let name = file.path().to_string_lossy();
        let content = file
            .contents_utf8()
            .unwrap_or_else(|| panic!("embedded template '{}' is not valid UTF-8", name));
        hb.register_template_string(&name, content)
            .unwrap_or_else(|e| panic!("failed to register template '{}': {}", name, e));
    }

    hb
}

lazy_static! {
    static ref HANDLEBARS: Handlebars<'static> = create_handlebar();
}

/// Renders the embedded prompt templates.
pub struct TemplateEngine<'a> {
    handlebar: &'a Handlebars<'static>,
}

impl Default for TemplateEngine<'static> {
    fn default() -> Self {
        Self { handlebar: &HANDLEBARS }
    }
}

impl TemplateEngine<'_> {
    /// Renders a registered template with the provided data.
    pub fn render<V: serde::Serialize>(
        &self,
        template: impl Into<Template<V>>,
        data: &V,
    ) -> anyhow::Result<String> {
        let template = template.into();
        Ok(self.handlebar.render(&template.template, data)?)
    }
}
