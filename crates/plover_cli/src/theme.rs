//! The default theme.

use plover::html::*;
use plover::render::{
    BaseRenderContext, PageLinkToRender, PaginationToRender, PostToRender, RenderIndexContext,
    RenderLabelContext, RenderPostContext,
};

/// What goes into a page's `<head>`, besides the site-wide bits.
struct PageHead<'a> {
    title: &'a str,
    description: Option<&'a str>,
    canonical_url: &'a str,
    image: Option<&'a str>,
    og_type: &'a str,
}

fn page(ctx: &BaseRenderContext, head_props: PageHead, content: Vec<HtmlElement>) -> HtmlElement {
    let partials = ctx.partials();

    let mut head_element = head()
        .child(meta().attr("charset", "UTF-8"))
        .child(
            meta()
                .attr("name", "viewport")
                .attr("content", "width=device-width, initial-scale=1"),
        )
        .child(title().child(head_props.title))
        .child(link().rel("canonical").href(head_props.canonical_url))
        .child(property_meta("og:title", head_props.title))
        .child(property_meta("og:type", head_props.og_type))
        .child(property_meta("og:url", head_props.canonical_url))
        .child(property_meta("og:site_name", ctx.site_title()))
        .child(named_meta("twitter:title", head_props.title));

    if let Some(description) = head_props
        .description
        .or(ctx.config().description.as_deref())
    {
        head_element = head_element
            .child(named_meta("description", description))
            .child(property_meta("og:description", description))
            .child(named_meta("twitter:description", description));
    }

    if let Some(image) = head_props.image {
        head_element = head_element
            .child(property_meta("og:image", image))
            .child(named_meta("twitter:card", "summary_large_image"))
            .child(named_meta("twitter:image", image));
    }

    html().lang(ctx.config().language.as_str()).child(
        head_element
            .child(
                link()
                    .rel("stylesheet")
                    .href(ctx.url_for("assets/style.css")),
            )
            .raw(partials.head.as_str())
            .raw(partials.js.as_str()),
    )
    .child(
        body()
            .raw(partials.header.as_str())
            .child(
                header().class("site-header").child(
                    h1().class("site-title")
                        .child(a().href(ctx.home_url()).child(ctx.site_title())),
                ),
            )
            .child(
                div()
                    .id("content-wrapper")
                    .child(main().children(content))
                    .child(
                        aside()
                            .id("sidebar")
                            .raw(partials.sidebar.as_str())
                            .child(label_list(ctx)),
                    ),
            )
            .raw(partials.footer.as_str()),
    )
}

fn named_meta(name: &str, content: &str) -> HtmlElement {
    meta().attr("name", name).attr("content", content)
}

fn property_meta(property: &str, content: &str) -> HtmlElement {
    meta().attr("property", property).attr("content", content)
}

fn label_list(ctx: &BaseRenderContext) -> HtmlElement {
    section().class("labels").child(h2().child("Labels")).child(
        ul().children(ctx.labels().iter().map(|label| {
            li().child(a().href(label.url.as_str()).child(label.name))
                .child(span().class("count").child(format!(" ({})", label.post_count)))
        })),
    )
}

fn breadcrumb(ctx: &BaseRenderContext, current: &str) -> HtmlElement {
    nav()
        .class("breadcrumbs")
        .attr("aria-label", "Breadcrumb")
        .child(a().href(ctx.home_url()).child("Home"))
        .child(span().class("separator").child(" › "))
        .child(span().child(current))
}

fn post_summary(post: &PostToRender, show_label: bool) -> HtmlElement {
    let mut summary = article().class("post");

    if show_label {
        if let Some(label) = post.first_label() {
            summary = summary.child(
                div()
                    .class("label-line")
                    .child(span().class("label").child(a().href(label.url.as_str()).child(label.name))),
            );
        }
    }

    summary
        .child(
            a().class("img-thumbnail")
                .href(post.url.as_str())
                .child(img().src(post.thumbnail_url).alt(post.title)),
        )
        .child(h2().class("post-title").child(a().href(post.url.as_str()).child(post.title)))
        .child(
            p().class("post-snippet")
                .child(post.preview)
                .child(" ")
                .child(a().href(post.url.as_str()).child("Read more")),
        )
}

fn pagination_nav(pagination: &PaginationToRender) -> Option<HtmlElement> {
    if !pagination.is_needed() {
        return None;
    }

    let mut nav_element = nav().class("pagination");

    if let Some(previous_url) = &pagination.previous_url {
        nav_element = nav_element.child(
            a().class("prev")
                .rel("prev")
                .href(previous_url.as_str())
                .child("« Previous"),
        );
    }

    for link in &pagination.links {
        nav_element = nav_element.child(match link {
            PageLinkToRender::Page {
                number,
                is_current: true,
                ..
            } => span()
                .class("current")
                .attr("aria-current", "page")
                .child(number.to_string()),
            PageLinkToRender::Page { number, url, .. } => {
                a().href(url.as_str()).child(number.to_string())
            }
            PageLinkToRender::Ellipsis => span().class("ellipsis").child("…"),
        });
    }

    if let Some(next_url) = &pagination.next_url {
        nav_element = nav_element.child(
            a().class("next")
                .rel("next")
                .href(next_url.as_str())
                .child("Next »"),
        );
    }

    Some(nav_element)
}

pub fn index(ctx: &RenderIndexContext) -> HtmlElement {
    let title = if ctx.pagination.current > 1 {
        format!("{} (page {})", ctx.site_title(), ctx.pagination.current)
    } else {
        ctx.site_title().to_string()
    };

    let content = std::iter::once(
        div()
            .class("blog-posts")
            .children(ctx.posts.iter().map(|post| post_summary(post, true))),
    )
    .chain(pagination_nav(&ctx.pagination))
    .collect();

    page(
        ctx,
        PageHead {
            title: &title,
            description: None,
            canonical_url: &ctx.permalink,
            image: None,
            og_type: "website",
        },
        content,
    )
}

pub fn label(ctx: &RenderLabelContext) -> HtmlElement {
    let title = format!("{} | {}", ctx.label.name, ctx.site_title());

    let content = [
        breadcrumb(ctx, ctx.label.name),
        h1().class("label-title").child(ctx.label.name),
        div()
            .class("blog-posts")
            .children(ctx.posts.iter().map(|post| post_summary(post, false))),
    ]
    .into_iter()
    .chain(pagination_nav(&ctx.pagination))
    .collect();

    page(
        ctx,
        PageHead {
            title: &title,
            description: None,
            canonical_url: &ctx.permalink,
            image: None,
            og_type: "website",
        },
        content,
    )
}

pub fn post(ctx: &RenderPostContext) -> HtmlElement {
    let post = &ctx.post;

    let mut post_article = article()
        .class("post-item")
        .child(h1().class("post-title").child(post.title))
        .child(
            div().class("post-meta").child(
                time()
                    .attr("datetime", post.published_rfc3339.as_str())
                    .child(post.published.as_str()),
            ),
        );

    if !post.labels.is_empty() {
        post_article = post_article.child(div().class("post-labels").children(
            post.labels.iter().map(|label| {
                a().class("label")
                    .href(label.url.as_str())
                    .child(label.name)
            }),
        ));
    }

    post_article = post_article.child(div().class("post-content").raw(post.content));

    let mut content = vec![breadcrumb(ctx, post.title), post_article];

    if !ctx.related.is_empty() {
        content.push(
            section().class("related-posts").child(h2().child("Related posts")).child(
                ul().children(ctx.related.iter().map(|related| {
                    li().child(
                        a().href(related.url.as_str())
                            .child(img().src(related.thumbnail_url).alt(related.title))
                            .child(span().child(related.title)),
                    )
                })),
            ),
        );
    }

    page(
        ctx,
        PageHead {
            title: post.title,
            description: Some(post.preview).filter(|preview| !preview.is_empty()),
            canonical_url: &post.permalink,
            image: Some(post.thumbnail_url),
            og_type: "article",
        },
        content,
    )
}
