use std::collections::HashMap;
use std::sync::LazyLock;

use jawn_core::slugify;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html::push_html};
use regex::Regex;

use crate::escape::escape_attr;
use crate::images::ImageResolver;

static CODE_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<pre><code class="language-([\w+#.-]+)">"#).expect("code class regex is valid")
});

/// Render an article body to HTML.
///
/// Tables, footnotes, strikethrough and task lists are enabled. Headings get
/// slug `id`s, images go through `images` and code fences carry their
/// language class on both `<pre>` and `<code>`.
pub fn render_markdown(markdown: &str, images: &ImageResolver<'_>) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(markdown, options);
    let events = rewrite_images(inject_heading_ids(parser), images);

    let mut html = String::with_capacity(markdown.len() * 2);
    push_html(&mut html, events.into_iter());
    reconcile_code_classes(&html)
}

/// Copy `language-*` from `<code>` onto the enclosing `<pre>`.
pub fn reconcile_code_classes(html: &str) -> String {
    CODE_CLASS_RE
        .replace_all(html, r#"<pre class="language-$1"><code class="language-$1">"#)
        .into_owned()
}

/// Buffer each heading, derive a slug from its text and re-emit the start
/// tag with that slug as its `id`. Repeated slugs get `-1`, `-2`, ...
fn inject_heading_ids<'a>(parser: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut heading: Option<(Tag<'a>, Vec<Event<'a>>, String)> = None;

    for event in parser {
        if heading.is_some() {
            if let Event::End(TagEnd::Heading(level)) = event {
                if let Some((tag, inner, text)) = heading.take() {
                    events.push(Event::Start(with_heading_id(tag, &text, &mut seen)));
                    events.extend(inner);
                    events.push(Event::End(TagEnd::Heading(level)));
                }
            } else if let Some((_, inner, text)) = heading.as_mut() {
                if let Event::Text(t) | Event::Code(t) = &event {
                    text.push_str(t);
                }
                inner.push(event);
            }
            continue;
        }

        match event {
            Event::Start(tag @ Tag::Heading { .. }) => {
                heading = Some((tag, Vec::new(), String::new()));
            }
            other => events.push(other),
        }
    }
    events
}

fn with_heading_id<'a>(tag: Tag<'a>, text: &str, seen: &mut HashMap<String, usize>) -> Tag<'a> {
    match tag {
        Tag::Heading {
            level,
            id: None,
            classes,
            attrs,
        } => {
            let base = slugify(text);
            if base.is_empty() {
                return Tag::Heading {
                    level,
                    id: None,
                    classes,
                    attrs,
                };
            }
            let count = seen.entry(base.clone()).or_insert(0);
            let slug = if *count == 0 {
                base
            } else {
                format!("{base}-{count}")
            };
            *count += 1;
            Tag::Heading {
                level,
                id: Some(CowStr::from(slug)),
                classes,
                attrs,
            }
        }
        other => other,
    }
}

/// Replace every image with a single inline `<img>` carrying the resolved
/// source, optional title, alt text, `img-fluid` and lazy loading.
fn rewrite_images<'a>(events: Vec<Event<'a>>, images: &ImageResolver<'_>) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut pending: Option<(String, String, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) if pending.is_none() => {
                let src = images
                    .resolve(&dest_url)
                    .unwrap_or_else(|| dest_url.to_string());
                pending = Some((src, title.to_string(), String::new()));
            }
            Event::End(TagEnd::Image) if pending.is_some() => {
                if let Some((src, title, alt)) = pending.take() {
                    out.push(Event::InlineHtml(img_tag(&src, &title, &alt).into()));
                }
            }
            Event::Text(t) | Event::Code(t) if pending.is_some() => {
                if let Some((_, _, alt)) = pending.as_mut() {
                    alt.push_str(&t);
                }
            }
            Event::SoftBreak | Event::HardBreak if pending.is_some() => {
                if let Some((_, _, alt)) = pending.as_mut() {
                    alt.push(' ');
                }
            }
            _ if pending.is_some() => {}
            other => out.push(other),
        }
    }
    out
}

fn img_tag(src: &str, title: &str, alt: &str) -> String {
    let mut tag = format!("<img src=\"{}\"", escape_attr(src));
    if !title.is_empty() {
        tag.push_str(&format!(" title=\"{}\"", escape_attr(title)));
    }
    if !alt.is_empty() {
        tag.push_str(&format!(" alt=\"{}\"", escape_attr(alt)));
    }
    tag.push_str(" class=\"img-fluid\" loading=\"lazy\" />");
    tag
}
