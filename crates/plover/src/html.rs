use std::fmt::{self, Write};

use indexmap::IndexMap;

/// A node in an HTML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(HtmlElement),

    /// Text, escaped when rendered.
    Text(String),

    /// Markup inserted as-is (e.g., post content from the API, or partials).
    Raw(String),
}

impl From<HtmlElement> for Node {
    fn from(element: HtmlElement) -> Self {
        Self::Element(element)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    pub tag_name: String,
    pub children: Vec<Node>,
    pub attrs: IndexMap<String, String>,
}

impl HtmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag_name: tag.into(),
            children: Vec::new(),
            attrs: IndexMap::new(),
        }
    }

    /// Sets the attribute to the given value, or removes it when the value is
    /// `None`.
    pub fn attr<V>(mut self, name: impl Into<String>, value: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        let name = name.into();
        match value.into() {
            Some(value) => {
                *self.attrs.entry(name).or_default() = value.into();
            }
            None => {
                self.attrs.shift_remove(&name);
            }
        }

        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<N>(mut self, children: impl IntoIterator<Item = N>) -> Self
    where
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Appends raw, unescaped markup.
    pub fn raw(mut self, html: impl Into<String>) -> Self {
        self.children.push(Node::Raw(html.into()));
        self
    }

    pub fn render_to_string(&self) -> Result<String, fmt::Error> {
        let mut html = String::new();
        self.write_to(&mut html)?;

        Ok(html)
    }

    /// Renders the element as a full document, with a doctype.
    pub fn render_document(&self) -> Result<String, fmt::Error> {
        let mut html = String::from("<!DOCTYPE html>\n");
        self.write_to(&mut html)?;

        Ok(html)
    }

    fn write_to(&self, html: &mut impl Write) -> fmt::Result {
        write!(html, "<{}", self.tag_name)?;

        for (name, value) in &self.attrs {
            write!(html, " {name}")?;

            if !value.is_empty() {
                write!(html, r#"="{}""#, escape_attr(value))?;
            }
        }

        write!(html, ">")?;

        if is_void(&self.tag_name) {
            return Ok(());
        }

        for child in &self.children {
            match child {
                Node::Element(element) => element.write_to(html)?,
                Node::Text(text) => write!(html, "{}", escape_text(text))?,
                Node::Raw(raw) => write!(html, "{raw}")?,
            }
        }

        write!(html, "</{}>", self.tag_name)
    }
}

impl HtmlElement {
    pub fn id<V>(self, id: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("id", id)
    }

    pub fn class<V>(self, class: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("class", class)
    }

    pub fn title<V>(self, title: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("title", title)
    }

    pub fn href<V>(self, href: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("href", href)
    }

    pub fn src<V>(self, src: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("src", src)
    }

    pub fn alt<V>(self, alt: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("alt", alt)
    }

    pub fn rel<V>(self, rel: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("rel", rel)
    }

    pub fn lang<V>(self, lang: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("lang", lang)
    }
}

fn is_void(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

macro_rules! elements {
    ($($name:ident),*) => {
        $(
            pub fn $name() -> HtmlElement {
                HtmlElement::new(stringify!($name))
            }
        )*
    }
}

elements! {
    a, article, aside, body, div, footer, h1, h2, h3, head, header, html, img, li, link, main,
    meta, nav, p, section, span, style, time, title, ul
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_render() {
        let element = div()
            .class("outer")
            .child(div().class("inner").child(h1().class("heading").child("Hello")));

        assert_eq!(
            element.render_to_string().unwrap(),
            r#"<div class="outer"><div class="inner"><h1 class="heading">Hello</h1></div></div>"#
        );
    }

    #[test]
    fn test_render_escapes_text_and_attributes() {
        let element = a()
            .href("/search?q=a&b")
            .title(r#"Say "hi""#)
            .child("<script>alert(1)</script>");

        assert_eq!(
            element.render_to_string().unwrap(),
            r#"<a href="/search?q=a&amp;b" title="Say &quot;hi&quot;">&lt;script&gt;alert(1)&lt;/script&gt;</a>"#
        );
    }

    #[test]
    fn test_render_raw_content() {
        let element = div().raw("<p>Already <b>HTML</b></p>");

        assert_eq!(
            element.render_to_string().unwrap(),
            "<div><p>Already <b>HTML</b></p></div>"
        );
    }

    #[test]
    fn test_render_void_elements() {
        let element = head()
            .child(meta().attr("charset", "UTF-8"))
            .child(img().src("a.png").alt(""));

        assert_eq!(
            element.render_to_string().unwrap(),
            r#"<head><meta charset="UTF-8"><img src="a.png" alt></head>"#
        );
    }

    #[test]
    fn test_attr_none_removes_attribute() {
        let element = div().class("a").id("main").class::<String>(None);

        assert_eq!(element.render_to_string().unwrap(), r#"<div id="main"></div>"#);
    }

    #[test]
    fn test_render_document() {
        let element = html().lang("en").child(body());

        assert_eq!(
            element.render_document().unwrap(),
            "<!DOCTYPE html>\n<html lang=\"en\"><body></body></html>"
        );
    }
}
