use minijinja::Environment;
use serde::Serialize;

pub const SITE_NAME: &str = "Copilot That Jawn";

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("tips.html", include_str!("../templates/tips.html")),
    ("details.html", include_str!("../templates/details.html")),
    ("about.html", include_str!("../templates/about.html")),
    ("privacy.html", include_str!("../templates/privacy.html")),
    ("contribute.html", include_str!("../templates/contribute.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
    ("sitemap.xml", include_str!("../templates/sitemap.xml")),
    ("feed.rss.xml", include_str!("../templates/feed.rss.xml")),
];

/// Page templates compiled once at startup.
///
/// `.html` and `.xml` templates auto-escape their output.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// # Errors
    ///
    /// Fails when a bundled template does not parse.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        env.add_global("site_name", SITE_NAME);
        Ok(Self { env })
    }

    /// # Errors
    ///
    /// Fails on an unknown template name or a render error.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context)
    }
}

#[cfg(test)]
mod tests {
    use minijinja::context;

    use super::*;

    #[test]
    fn every_template_parses() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn static_pages_render_within_layout() {
        let templates = Templates::new().unwrap();
        for page in ["about.html", "privacy.html", "contribute.html", "not_found.html"] {
            let html = templates.render(page, context! {}).unwrap();
            assert!(html.contains("<!DOCTYPE html>"), "{page}");
            assert!(html.contains(SITE_NAME), "{page}");
        }
    }

    #[test]
    fn html_output_is_escaped() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render(
                "tips.html",
                context! { title => "<script>alert(1)</script>", articles => Vec::<()>::new() },
            )
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn unknown_template_is_error() {
        let templates = Templates::new().unwrap();
        assert!(templates.render("missing.html", context! {}).is_err());
    }
}
