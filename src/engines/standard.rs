//! Production backend: pulldown-cmark, mustache and tl.
//!
//! Templates are compiled once at construction. Every file below the
//! templates root carrying the template extension is registered under its
//! root-relative path, extension removed:
//!
//! ```text
//! templates/default_layout.mustache  → "default_layout"
//! templates/post.mustache            → "post"
//! templates/partials/nav.mustache    → "partials/nav"   ({{> partials/nav}})
//! ```
//!
//! Partials always resolve against the templates root, so view files
//! compiled from anywhere in the source tree can include them. A partial
//! that does not exist renders as nothing.
//!
//! Rendering follows mustache: `{{#posts}}` repeats for each item,
//! `{{^posts}}` renders when the list is empty or the value is false, and a
//! name missing from the current item is looked up in the enclosing
//! contexts. Layouts receive the wrapped page as `yield` and must emit it
//! unescaped: `{{{yield}}}`.

use super::backend::{EngineError, RenderBackend};
use mustache::{Context, Template};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

pub struct StandardBackend {
    context: Context,
    templates: HashMap<String, Template>,
}

impl StandardBackend {
    /// Compile every template under `templates_dir`. A missing directory
    /// yields no templates; rendering a layout then fails by name.
    pub fn new(templates_dir: &Path, extension: &str) -> Result<Self, EngineError> {
        let mut context = Context::new(templates_dir.to_path_buf());
        context.template_extension = extension.to_string();
        let mut templates = HashMap::new();

        if templates_dir.is_dir() {
            let suffix = format!(".{extension}");
            for entry in WalkDir::new(templates_dir).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(name) = template_name(entry.path(), templates_dir, &suffix) else {
                    continue;
                };
                let source = read_source(entry.path())?;
                let template = compile(&context, &source, &name)?;
                templates.insert(name, template);
            }
        }

        Ok(Self { context, templates })
    }
}

/// `templates/partials/nav.mustache` → `partials/nav`.
fn template_name(path: &Path, root: &Path, suffix: &str) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    joined
        .strip_suffix(suffix)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn read_source(path: &Path) -> Result<String, EngineError> {
    fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn compile(context: &Context, source: &str, name: &str) -> Result<Template, EngineError> {
    context
        .compile(source.chars())
        .map_err(|source| EngineError::Template {
            name: name.to_string(),
            source,
        })
}

fn render(template: &Template, name: &str, context: &Value) -> Result<String, EngineError> {
    template
        .render_to_string(context)
        .map_err(|source| EngineError::Render {
            name: name.to_string(),
            source,
        })
}

impl RenderBackend for StandardBackend {
    fn markdown_to_html(&self, markdown: &str) -> String {
        let options = Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(markdown, options);
        let mut html = String::new();
        md_html::push_html(&mut html, parser);
        html
    }

    fn render_template(&self, name: &str, context: &Value) -> Result<String, EngineError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| EngineError::MissingTemplate(name.to_string()))?;
        render(template, name, context)
    }

    fn render_file(&self, path: &Path, context: &Value) -> Result<String, EngineError> {
        let name = path.display().to_string();
        let template = compile(&self.context, &read_source(path)?, &name)?;
        render(&template, &name, context)
    }

    fn first_paragraph(&self, html: &str) -> Option<String> {
        let dom = tl::parse(html, tl::ParserOptions::default()).ok()?;
        let parser = dom.parser();
        let handle = dom.query_selector("p")?.next()?;
        let node = handle.get(parser)?;
        Some(node.outer_html(parser).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn backend_with(templates: &[(&str, &str)]) -> (TempDir, StandardBackend) {
        let tmp = TempDir::new().unwrap();
        for (path, body) in templates {
            let full = tmp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, body).unwrap();
        }
        let backend = StandardBackend::new(tmp.path(), "mustache").unwrap();
        (tmp, backend)
    }

    /// Render `source` as a view file placed outside the templates root.
    fn render_view(backend: &StandardBackend, source: &str, context: Value) -> String {
        let dir = TempDir::new().unwrap();
        let view = dir.path().join("view.html.mustache");
        fs::write(&view, source).unwrap();
        backend.render_file(&view, &context).unwrap()
    }

    fn listing() -> Value {
        json!({
            "status": "preview",
            "posts": [{"title": "A"}, {"title": "B"}],
            "pages": [],
        })
    }

    #[test]
    fn markdown_uses_smart_quotes() {
        let (_tmp, backend) = backend_with(&[]);
        let html = backend.markdown_to_html("It's \"quoted\"");
        assert!(html.contains('\u{2019}'), "no apostrophe in {html}");
        assert!(html.contains('\u{201c}'), "no opening quote in {html}");
        assert!(html.contains('\u{201d}'), "no closing quote in {html}");
    }

    #[test]
    fn markdown_renders_paragraphs() {
        let (_tmp, backend) = backend_with(&[]);
        let html = backend.markdown_to_html("Hello\n\nWorld\n");
        assert_eq!(html, "<p>Hello</p>\n<p>World</p>\n");
    }

    #[test]
    fn first_paragraph_of_fragment() {
        let (_tmp, backend) = backend_with(&[]);
        assert_eq!(
            backend.first_paragraph("<p>Hello</p><p>World</p>"),
            Some("<p>Hello</p>".to_string())
        );
    }

    #[test]
    fn first_paragraph_skips_headings() {
        let (_tmp, backend) = backend_with(&[]);
        assert_eq!(
            backend.first_paragraph("<h1>Title</h1>\n<p>Intro</p>\n"),
            Some("<p>Intro</p>".to_string())
        );
    }

    #[test]
    fn no_paragraph_no_teaser() {
        let (_tmp, backend) = backend_with(&[]);
        assert_eq!(backend.first_paragraph("<h1>Only a title</h1>"), None);
    }

    #[test]
    fn templates_registered_by_relative_name() {
        let (_tmp, backend) = backend_with(&[
            ("post.mustache", "<article>{{title}}</article>"),
            ("partials/nav.mustache", "<nav/>"),
            ("notes.txt", "ignored"),
        ]);
        let ctx = json!({"title": "Hi"});
        assert_eq!(
            backend.render_template("post", &ctx).unwrap(),
            "<article>Hi</article>"
        );
        assert_eq!(
            backend.render_template("partials/nav", &ctx).unwrap(),
            "<nav/>"
        );
        assert!(matches!(
            backend.render_template("notes", &ctx),
            Err(EngineError::MissingTemplate(name)) if name == "notes"
        ));
    }

    #[test]
    fn layout_yields_unescaped_body() {
        let (_tmp, backend) = backend_with(&[(
            "default_layout.mustache",
            "<body>{{{yield}}}</body>",
        )]);
        let out = backend
            .render_template("default_layout", &json!({"yield": "<p>Hi</p>"}))
            .unwrap();
        assert_eq!(out, "<body><p>Hi</p></body>");
    }

    #[test]
    fn plain_variables_are_escaped() {
        let (_tmp, backend) = backend_with(&[("t.mustache", "{{title}}")]);
        let out = backend
            .render_template("t", &json!({"title": "<b>"}))
            .unwrap();
        assert_eq!(out, "&lt;b&gt;");
    }

    #[test]
    fn sections_repeat_for_each_item() {
        let (_tmp, backend) = backend_with(&[]);
        let out = render_view(&backend, "{{#posts}}<{{title}}>{{/posts}}", listing());
        assert_eq!(out, "<A><B>");
    }

    #[test]
    fn inverted_section_renders_for_empty_list() {
        let (_tmp, backend) = backend_with(&[]);
        let out = render_view(
            &backend,
            "{{^pages}}none{{/pages}}{{^posts}}hidden{{/posts}}",
            listing(),
        );
        assert_eq!(out, "none");
    }

    #[test]
    fn false_value_skips_section() {
        let (_tmp, backend) = backend_with(&[]);
        let out = render_view(
            &backend,
            "{{#published}}live{{/published}}{{^published}}draft{{/published}}",
            json!({"published": false}),
        );
        assert_eq!(out, "draft");
    }

    #[test]
    fn names_resolve_through_enclosing_context() {
        let (_tmp, backend) = backend_with(&[]);
        let out = render_view(
            &backend,
            "{{#posts}}{{title}}:{{status}};{{/posts}}",
            listing(),
        );
        assert_eq!(out, "A:preview;B:preview;");
    }

    #[test]
    fn render_file_can_use_partials() {
        let (_tmp, backend) = backend_with(&[("partials/item.mustache", "<li>{{title}}</li>")]);
        let out = render_view(
            &backend,
            "<ul>{{#posts}}{{> partials/item}}{{/posts}}</ul>",
            listing(),
        );
        assert_eq!(out, "<ul><li>A</li><li>B</li></ul>");
    }

    #[test]
    fn unclosed_section_is_template_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.mustache"), "{{#posts}}open").unwrap();
        let result = StandardBackend::new(tmp.path(), "mustache");
        assert!(matches!(
            result,
            Err(EngineError::Template { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn missing_templates_dir_has_no_templates() {
        let tmp = TempDir::new().unwrap();
        let backend = StandardBackend::new(&tmp.path().join("absent"), "mustache").unwrap();
        assert!(matches!(
            backend.render_template("default_layout", &json!({})),
            Err(EngineError::MissingTemplate(_))
        ));
    }
}
