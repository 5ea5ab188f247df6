//! Small helpers for producing HTML strings.

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaKey {
    /// `<meta name="...">`
    Name(&'static str),
    /// `<meta property="...">`, used by Open Graph.
    Property(&'static str),
}

/// Document head metadata of a page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Head {
    pub title: String,
    pub meta: Vec<(MetaKey, String)>,
    pub canonical: Option<String>,
}

impl Head {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: &'static str, content: impl Into<String>) -> Self {
        self.meta.push((MetaKey::Name(name), content.into()));
        self
    }

    pub fn property(mut self, property: &'static str, content: impl Into<String>) -> Self {
        self.meta.push((MetaKey::Property(property), content.into()));
        self
    }

    pub fn canonical(mut self, href: impl Into<String>) -> Self {
        self.canonical = Some(href.into());
        self
    }

    pub fn content_of(&self, key: MetaKey) -> Option<&str> {
        self.meta
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, content)| content.as_str())
    }

    /// Renders the tags that belong inside `<head>`.
    pub fn render(&self) -> String {
        let mut html = format!("<title>{}</title>", escape(&self.title));
        for (key, content) in &self.meta {
            let (attr, value) = match key {
                MetaKey::Name(name) => ("name", name),
                MetaKey::Property(property) => ("property", property),
            };
            html.push_str(&format!(
                r#"<meta {}="{}" content="{}">"#,
                attr,
                value,
                escape(content)
            ));
        }
        if let Some(href) = &self.canonical {
            html.push_str(&format!(r#"<link rel="canonical" href="{}">"#, escape(href)));
        }
        html
    }
}
