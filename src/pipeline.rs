//! Build orchestration.
//!
//! A build runs these steps, each finishing before the next starts:
//!
//! ```text
//! 1. prepare          empty preview/, published/, tmp/ (hidden entries kept)
//! 2. resolve          src/ → records, written to tmp/metadata.json
//! 3. render_fragments content → tmp/*.content.html, teasers, output paths
//! 4. publish_assets   assets → preview/ + published/
//! 5. compose_content  content → pages (preview always, published if flagged)
//! 6. render_views     views → preview/ + published/
//! ```
//!
//! Output paths and teasers are final after step 4, so the `all_metadata`
//! list shared by steps 5 and 6 is serialized once and every page can link
//! to every other. Any error aborts the build; files already written stay.
//!
//! [`Pipeline::run_with`] reports a [`Progress`] event before each step and
//! hands over the collection once it is resolved.

use crate::assets;
use crate::config::{self, BuildConfig, ConfigError, Roots};
use crate::content;
use crate::engines::{EngineError, RenderBackend, StandardBackend};
use crate::files::{self, FsError};
use crate::paths::PathError;
use crate::render::RenderError;
use crate::resolve::{ResolveError, Resolver};
use crate::types::{Kind, Record};
use crate::views;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The resolved collection, written under the temp root after step 2.
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Loading templates: {0}")]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A content page written by [`Pipeline::compose_content`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    /// Source path relative to the source root.
    pub source: PathBuf,
    pub url_path: String,
    pub published: bool,
}

/// A view written by [`Pipeline::render_views`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewReport {
    pub source: PathBuf,
    pub url_path: String,
}

/// The steps of a build, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Prepare,
    Resolve,
    RenderFragments,
    PublishAssets,
    ComposeContent,
    RenderViews,
}

#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// A step is about to run.
    Starting(Step),
    /// The collection as written to `metadata.json`.
    Resolved(&'a [Record]),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub pages: Vec<PageReport>,
    pub views: Vec<ViewReport>,
    pub assets: usize,
}

/// One project's build: its configuration and anchored roots.
pub struct Pipeline {
    config: BuildConfig,
    roots: Roots,
}

impl Pipeline {
    pub fn new(project: &Path, config: BuildConfig) -> Self {
        let roots = config.roots(project);
        Self { config, roots }
    }

    /// Load `twotree.toml` from `project` (stock defaults if absent).
    pub fn load(project: &Path) -> Result<Self, BuildError> {
        Ok(Self::new(project, config::load_config(project)?))
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    /// The production backend over this project's templates.
    pub fn backend(&self) -> Result<StandardBackend, BuildError> {
        Ok(StandardBackend::new(
            &self.roots.templates,
            &self.config.template_extension,
        )?)
    }

    pub fn prepare(&self) -> Result<(), BuildError> {
        for root in self.roots.prepared() {
            files::prepare_target(root)?;
        }
        Ok(())
    }

    pub fn resolve(&self) -> Result<Vec<Record>, BuildError> {
        let records = Resolver::new(&self.config).resolve(&self.roots.source)?;
        let json = serde_json::to_string_pretty(&records)?;
        files::write_file(&self.roots.temp.join(METADATA_FILE), &json)?;
        Ok(records)
    }

    /// Fragments, teasers and output paths for content; output paths for
    /// views. Stops at the first content record without a `content_type`.
    pub fn render_fragments(
        &self,
        backend: &impl RenderBackend,
        records: &mut [Record],
    ) -> Result<(), BuildError> {
        for record in records.iter_mut() {
            match record.kind {
                Kind::Content => content::prepare(backend, record, &self.roots)?,
                Kind::View => views::place(record, &self.roots, &self.config.view_extension)?,
                Kind::Directory | Kind::Asset => {}
            }
        }
        Ok(())
    }

    pub fn publish_assets(&self, records: &mut [Record]) -> Result<usize, BuildError> {
        Ok(assets::publish_assets(records, &self.roots)?)
    }

    pub fn compose_content(
        &self,
        backend: &impl RenderBackend,
        records: &[Record],
        all_metadata: &Value,
    ) -> Result<Vec<PageReport>, BuildError> {
        let mut pages = Vec::new();
        for record in records.iter().filter(|r| r.kind == Kind::Content) {
            let page = content::compose(backend, record, all_metadata)?;
            content::publish(record, &page)?;
            pages.push(PageReport {
                source: self.relative(&record.source_path),
                url_path: record.url_path.clone().unwrap_or_default(),
                published: record.published_path.is_some(),
            });
        }
        Ok(pages)
    }

    pub fn render_views(
        &self,
        backend: &impl RenderBackend,
        records: &[Record],
        all_metadata: &Value,
    ) -> Result<Vec<ViewReport>, BuildError> {
        let mut written = Vec::new();
        for record in records.iter().filter(|r| r.kind == Kind::View) {
            views::publish(backend, record, all_metadata)?;
            written.push(ViewReport {
                source: self.relative(&record.source_path),
                url_path: record.url_path.clone().unwrap_or_default(),
            });
        }
        Ok(written)
    }

    /// Every step in order.
    pub fn run(&self, backend: &impl RenderBackend) -> Result<BuildReport, BuildError> {
        self.run_with(backend, |_| {})
    }

    /// Every step in order, reporting progress to `on_progress`.
    pub fn run_with(
        &self,
        backend: &impl RenderBackend,
        mut on_progress: impl FnMut(Progress<'_>),
    ) -> Result<BuildReport, BuildError> {
        on_progress(Progress::Starting(Step::Prepare));
        self.prepare()?;

        on_progress(Progress::Starting(Step::Resolve));
        let mut records = self.resolve()?;
        on_progress(Progress::Resolved(&records));

        on_progress(Progress::Starting(Step::RenderFragments));
        self.render_fragments(backend, &mut records)?;

        on_progress(Progress::Starting(Step::PublishAssets));
        let assets = self.publish_assets(&mut records)?;

        let all_metadata = all_metadata(&records)?;
        on_progress(Progress::Starting(Step::ComposeContent));
        let pages = self.compose_content(backend, &records, &all_metadata)?;

        on_progress(Progress::Starting(Step::RenderViews));
        let views = self.render_views(backend, &records, &all_metadata)?;

        Ok(BuildReport {
            pages,
            views,
            assets,
        })
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.roots.source)
            .unwrap_or(path)
            .to_path_buf()
    }
}

/// The collection as templates see it under `all_metadata`.
pub fn all_metadata(records: &[Record]) -> Result<Value, serde_json::Error> {
    serde_json::to_value(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::backend::tests::MockBackend;
    use crate::test_helpers::*;
    use serde_json::json;
    use std::fs;

    fn read(path: impl AsRef<Path>) -> String {
        fs::read_to_string(path.as_ref())
            .unwrap_or_else(|e| panic!("reading {}: {e}", path.as_ref().display()))
    }

    #[test]
    fn prepare_creates_all_roots() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pipeline = Pipeline::new(tmp.path(), BuildConfig::default());
        pipeline.prepare().unwrap();
        assert!(tmp.path().join("preview").is_dir());
        assert!(tmp.path().join("published").is_dir());
        assert!(tmp.path().join("tmp").is_dir());
        assert!(!tmp.path().join("src").exists());
    }

    #[test]
    fn resolve_writes_metadata_json() {
        let tmp = setup_fixtures();
        let pipeline = Pipeline::load(tmp.path()).unwrap();
        pipeline.prepare().unwrap();
        let records = pipeline.resolve().unwrap();

        let written: Value =
            serde_json::from_str(&read(tmp.path().join("tmp/metadata.json"))).unwrap();
        assert_eq!(written.as_array().unwrap().len(), records.len());
        assert_eq!(written[0]["kind"], json!("directory"));
    }

    #[test]
    fn fixture_build_with_mock_backend() {
        let tmp = setup_fixtures();
        let pipeline = Pipeline::load(tmp.path()).unwrap();
        let report = pipeline.run(&MockBackend::new()).unwrap();

        assert_eq!(report.assets, 2);
        assert_eq!(report.pages.len(), 4);
        assert_eq!(report.views.len(), 2);

        let draft = find_page(&report, "blog/draft.md");
        assert_eq!(draft.url_path, "/blog/draft/");
        assert!(!draft.published);
        assert!(find_page(&report, "blog/first-post.md").published);

        assert!(tmp.path().join("preview/blog/draft/index.html").exists());
        assert!(!tmp.path().join("published/blog/draft/index.html").exists());
        assert!(tmp.path().join("published/feeds/posts.xml").exists());
        assert!(tmp.path().join("published/.nojekyll").exists());
    }

    #[test]
    fn run_with_reports_each_step_in_order() {
        let tmp = setup_fixtures();
        let pipeline = Pipeline::load(tmp.path()).unwrap();
        let mut seen = Vec::new();
        let mut resolved = 0;
        pipeline
            .run_with(&MockBackend::new(), |progress| match progress {
                Progress::Starting(step) => seen.push(step),
                Progress::Resolved(records) => {
                    assert_eq!(seen.last(), Some(&Step::Resolve));
                    resolved = records.len();
                }
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                Step::Prepare,
                Step::Resolve,
                Step::RenderFragments,
                Step::PublishAssets,
                Step::ComposeContent,
                Step::RenderViews,
            ]
        );
        let written: Value =
            serde_json::from_str(&read(tmp.path().join("tmp/metadata.json"))).unwrap();
        assert_eq!(written.as_array().unwrap().len(), resolved);
    }

    #[test]
    fn failed_step_stops_progress() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("src/blog/blog.yml"), "content_type: [post\n").unwrap();
        let pipeline = Pipeline::load(tmp.path()).unwrap();
        let mut seen = Vec::new();
        let result = pipeline.run_with(&MockBackend::new(), |progress| {
            if let Progress::Starting(step) = progress {
                seen.push(step);
            }
        });

        assert!(matches!(result, Err(BuildError::Resolve(_))));
        assert_eq!(seen, vec![Step::Prepare, Step::Resolve]);
    }

    #[test]
    fn teasers_and_urls_reach_all_metadata() {
        let tmp = setup_fixtures();
        let pipeline = Pipeline::load(tmp.path()).unwrap();
        let backend = MockBackend::new();
        pipeline.prepare().unwrap();
        let mut records = pipeline.resolve().unwrap();
        pipeline.render_fragments(&backend, &mut records).unwrap();
        pipeline.publish_assets(&mut records).unwrap();
        let all = all_metadata(&records).unwrap();

        let by_source = |suffix: &str| {
            all.as_array()
                .unwrap()
                .iter()
                .find(|r| r["source_path"].as_str().unwrap().ends_with(suffix))
                .unwrap_or_else(|| panic!("no record for {suffix}"))
                .clone()
        };
        assert_eq!(by_source("blog/draft.md")["teaser"], json!("Custom teaser"));
        assert_eq!(by_source("blog/first-post.md")["url_path"], json!("/blog/first-post/"));
        assert_eq!(by_source("style.css")["url_path"], json!("/style.css"));
        assert_eq!(by_source("feeds/posts.xml.mustache")["url_path"], json!("/feeds/posts.xml"));
    }

    #[test]
    fn missing_content_type_stops_the_build() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("src/about/about.yml"), "inherit_metadata: false\n").unwrap();
        let pipeline = Pipeline::load(tmp.path()).unwrap();

        let err = pipeline.run(&MockBackend::new()).unwrap_err();
        assert!(matches!(err, BuildError::Render(RenderError::MissingContentType(_))));
        assert!(err.to_string().contains("about/index.md"));
        assert!(!tmp.path().join("preview/about/index.html").exists());
    }

    #[test]
    fn hidden_output_entries_survive_rebuild() {
        let tmp = setup_fixtures();
        let git = tmp.path().join("published/.git");
        fs::create_dir_all(&git).unwrap();
        fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(tmp.path().join("published/stale.html"), "old").unwrap();

        Pipeline::load(tmp.path())
            .unwrap()
            .run(&MockBackend::new())
            .unwrap();
        assert!(git.join("HEAD").exists());
        assert!(!tmp.path().join("published/stale.html").exists());
    }

    #[test]
    fn fixture_build_with_standard_backend() {
        let tmp = setup_fixtures();
        let pipeline = Pipeline::load(tmp.path()).unwrap();
        let backend = pipeline.backend().unwrap();
        pipeline.run(&backend).unwrap();

        let home = read(tmp.path().join("preview/index.html"));
        assert!(home.contains("<title>Home</title>"), "{home}");
        assert!(home.contains("Welcome to the site."), "{home}");

        let post = read(tmp.path().join("published/blog/first-post/index.html"));
        assert!(post.contains("<h1>First Post</h1>"), "{post}");
        assert!(post.contains("It\u{2019}s the \u{201c}first\u{201d} post."), "{post}");

        let preview_index = read(tmp.path().join("preview/blog/index.html"));
        assert!(preview_index.contains(r#"href="/blog/first-post/""#), "{preview_index}");
        assert!(preview_index.contains(r#"href="/blog/draft/""#), "{preview_index}");
        assert!(preview_index.contains("Custom teaser"), "{preview_index}");
        assert!(preview_index.contains(r#"<li class="preview">"#), "{preview_index}");
        assert!(!preview_index.contains("Nothing here yet."), "{preview_index}");

        let published_index = read(tmp.path().join("published/blog/index.html"));
        assert!(published_index.contains(r#"href="/blog/first-post/""#), "{published_index}");
        assert!(!published_index.contains("/blog/draft/"), "{published_index}");
        assert!(published_index.contains(r#"<li class="published">"#), "{published_index}");

        let feed = read(tmp.path().join("published/feeds/posts.xml"));
        assert!(feed.starts_with("<?xml"), "{feed}");
        assert!(feed.contains("<title>Two Trees</title>"), "{feed}");
        assert!(feed.contains("<link>/blog/first-post/</link>"), "{feed}");
        assert!(!feed.contains("/blog/draft/"), "{feed}");

        let about = read(tmp.path().join("preview/about/index.html"));
        assert!(about.contains("About this site."), "{about}");
        assert!(!tmp.path().join("published/about/index.html").exists());

        assert_eq!(
            read(tmp.path().join("published/style.css")),
            read(tmp.path().join("src/style.css"))
        );
        assert!(tmp.path().join("tmp/blog/first-post.content.html").exists());
    }
}
