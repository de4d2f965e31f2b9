//! `render` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use imgcaptions_config::{CliSettings, Config, FilterOverrides};
use imgcaptions_filter::{
    FigureTemplate, ImageFilter, MergePolicy, Mode, PassthroughResolver, SourceResolver,
};
use imgcaptions_site::{
    PageHeader, PageIndex, PageTreeResolver, Scanner, split_front_matter, strip_order_prefix,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Page file to rewrite.
    file: PathBuf,

    /// Path to configuration file (default: auto-discover imgcaptions.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content mode, `markdown` or `html` (overrides config and front matter).
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Space-join `id` and `class` instead of replacing them.
    #[arg(long)]
    append: bool,

    /// Disable the filter and copy the page body through.
    #[arg(long)]
    disable: bool,

    /// Path prefix stripped from absolute image paths.
    #[arg(long)]
    prefix: Option<String>,

    /// Pages directory (overrides config).
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// Site base URL (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Route of the page (default: derived from FILE's folder under the pages directory).
    #[arg(long)]
    page: Option<String>,

    /// Write the result to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, page scanning, or file I/O fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            filter: FilterOverrides {
                enabled: self.disable.then_some(false),
                mode: self.mode,
                merge: self.append.then_some(MergePolicy::Append),
                prefix: self.prefix.clone(),
            },
            pages_dir: self.pages_dir.clone(),
            base_url: self.base_url.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let text = fs::read_to_string(&self.file)?;
        let (header_text, body) = split_front_matter(&text);
        let header = header_text
            .map(PageHeader::parse)
            .transpose()?
            .unwrap_or_default();

        let filter_config = config.filter_config(&header.overrides());
        if self.verbose {
            output.info(&format!(
                "Rendering {} as {} ({})",
                self.file.display(),
                filter_config.mode,
                config.event_for(filter_config.mode)
            ));
        }
        let filter = ImageFilter::new(filter_config)?;

        let index = scan_pages(&config, &output)?;
        let rendered = match &index {
            Some(index) => {
                let route = self
                    .page
                    .clone()
                    .or_else(|| page_route(&self.file, &config.site_resolved.pages_dir))
                    .unwrap_or_default();
                tracing::info!(route = %route, "Resolving images against page tree");
                render_with(&filter, body, &PageTreeResolver::new(index, &route))
            }
            None => render_with(&filter, body, &PassthroughResolver),
        };

        let result = match header_text {
            Some(_) => format!("{}{rendered}", &text[..text.len() - body.len()]),
            None => rendered,
        };

        match &self.output {
            Some(path) => {
                fs::write(path, &result)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => output.print(&result)?,
        }
        Ok(())
    }
}

fn render_with(filter: &ImageFilter, body: &str, resolver: &dyn SourceResolver) -> String {
    filter.apply(body, resolver, &FigureTemplate)
}

/// Scan the configured pages directory; `None` when it does not exist.
fn scan_pages(config: &Config, output: &Output) -> Result<Option<PageIndex>, CliError> {
    let pages_dir = &config.site_resolved.pages_dir;
    if !pages_dir.is_dir() {
        output.warning(&format!(
            "Pages directory not found: {} (image sources left as written)",
            pages_dir.display()
        ));
        return Ok(None);
    }
    let index = Scanner::new(pages_dir).scan(&config.site_resolved.base_url)?;
    Ok(Some(index))
}

/// Route of the page whose file is `file`, relative to `pages_dir`.
///
/// Returns `None` when `file` is outside `pages_dir`.
fn page_route(file: &Path, pages_dir: &Path) -> Option<String> {
    let file = std::path::absolute(file).ok()?;
    let pages_dir = std::path::absolute(pages_dir).ok()?;
    let folder = file.parent()?.strip_prefix(&pages_dir).ok()?;
    let segments: Vec<String> = folder
        .components()
        .map(|c| strip_order_prefix(&c.as_os_str().to_string_lossy()).to_owned())
        .collect();
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(file: PathBuf, config: PathBuf, output: PathBuf) -> RenderArgs {
        RenderArgs {
            file,
            config: Some(config),
            mode: None,
            append: false,
            disable: false,
            prefix: None,
            pages_dir: None,
            base_url: None,
            page: None,
            output: Some(output),
            verbose: false,
        }
    }

    #[test]
    fn test_page_route_strips_order_prefixes() {
        let pages = Path::new("/site/pages");
        assert_eq!(
            page_route(Path::new("/site/pages/02.blog/01.post/item.md"), pages),
            Some("blog/post".to_owned())
        );
        assert_eq!(
            page_route(Path::new("/site/pages/default.md"), pages),
            Some(String::new())
        );
        assert_eq!(page_route(Path::new("/elsewhere/item.md"), pages), None);
    }

    #[test]
    fn test_render_resolves_against_page_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let post = root.join("pages").join("01.blog");
        fs::create_dir_all(&post).unwrap();
        fs::write(post.join("cat.jpg"), "").unwrap();
        let page = post.join("item.md");
        fs::write(
            &page,
            "---\ntitle: Cats\n---\n![A cat](cat.jpg \"Sleeping\"){.wide}\n",
        )
        .unwrap();
        let config = root.join("imgcaptions.toml");
        fs::write(&config, "[site]\nbase_url = \"/site\"\n").unwrap();
        let out = root.join("out.md");

        args(page, config, out.clone()).execute().unwrap();

        assert_eq!(
            fs::read_to_string(out).unwrap(),
            "---\ntitle: Cats\n---\n<figure><img src=\"/site/blog/cat.jpg\" alt=\"A cat\" \
             title=\"Sleeping\" class=\"wide\"><figcaption>Sleeping</figcaption></figure>\n"
        );
    }

    #[test]
    fn test_render_honours_front_matter_disable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let page = root.join("page.md");
        let text = "---\nimgcaptions:\n  enabled: false\n---\n![A](a.png)\n";
        fs::write(&page, text).unwrap();
        let config = root.join("imgcaptions.toml");
        fs::write(&config, "").unwrap();
        let out = root.join("out.md");

        args(page, config, out.clone()).execute().unwrap();

        assert_eq!(fs::read_to_string(out).unwrap(), text);
    }

    #[test]
    fn test_render_without_pages_dir_passes_sources_through() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let page = root.join("page.md");
        fs::write(&page, "![](img/a.png)").unwrap();
        let config = root.join("imgcaptions.toml");
        fs::write(&config, "[site]\npages_dir = \"missing\"\n").unwrap();
        let out = root.join("out.md");

        args(page, config, out.clone()).execute().unwrap();

        assert_eq!(
            fs::read_to_string(out).unwrap(),
            "<figure><img src=\"img/a.png\" alt=\"\"></figure>"
        );
    }

    #[test]
    fn test_render_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = args(
            temp_dir.path().join("page.md"),
            temp_dir.path().join("nope.toml"),
            temp_dir.path().join("out.md"),
        )
        .execute();
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
