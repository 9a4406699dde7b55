//! Allow-list schema for the sanitizer.

use std::collections::{BTreeMap, BTreeSet};

/// Key in [`Schema::attributes`] whose entries apply to every tag.
pub const ANY_TAG: &str = "*";

/// Tags permitted by the baseline schema (GitHub-flavored).
const DEFAULT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "br", "b", "i", "strong", "em", "a", "pre", "code", "img",
    "tt", "div", "ins", "del", "sup", "sub", "p", "ol", "ul", "table", "thead", "tbody", "tfoot",
    "blockquote", "dl", "dt", "dd", "kbd", "q", "samp", "var", "hr", "ruby", "rt", "rp", "li",
    "tr", "td", "th", "s", "strike", "summary", "details", "caption", "figure", "figcaption",
    "abbr", "bdo", "cite", "dfn", "mark", "small", "span", "time", "wbr", "input",
];

/// Attributes permitted on every tag by the baseline schema.
const DEFAULT_GLOBAL_ATTRIBUTES: &[&str] = &[
    "abbr", "align", "alt", "aria-describedby", "aria-hidden", "aria-label", "aria-labelledby",
    "axis", "border", "cellpadding", "cellspacing", "colspan", "datetime", "dir", "headers",
    "height", "hreflang", "id", "lang", "rowspan", "scope", "span", "start", "summary", "title",
    "valign", "width",
];

/// Tags removed together with their content.
const DEFAULT_STRIP: &[&str] = &["script", "style"];

/// What the sanitizer lets through.
///
/// Tags outside `tag_names` are unwrapped (their children are kept), except
/// tags in `strip`, which disappear with everything inside them.
///
/// `protocols` restricts URL-valued attributes. Keys are either an
/// attribute name (`href`) or `tag.attribute` (`iframe.src`); the
/// tag-specific key wins. Relative URLs are always accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub tag_names: BTreeSet<String>,
    pub attributes: BTreeMap<String, BTreeSet<String>>,
    pub protocols: BTreeMap<String, BTreeSet<String>>,
    pub strip: BTreeSet<String>,
}

impl Default for Schema {
    fn default() -> Self {
        let mut attributes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        attributes.insert(ANY_TAG.to_string(), set(DEFAULT_GLOBAL_ATTRIBUTES));
        for (tag, names) in [
            ("a", &["href"][..]),
            ("img", &["src", "longdesc"][..]),
            ("blockquote", &["cite"][..]),
            ("del", &["cite"][..]),
            ("ins", &["cite"][..]),
            ("q", &["cite"][..]),
            ("code", &["class"][..]),
            ("ul", &["class"][..]),
            ("ol", &["class"][..]),
            ("li", &["class"][..]),
            ("input", &["type", "checked", "disabled"][..]),
            ("div", &["itemscope", "itemtype"][..]),
        ] {
            attributes.insert(tag.to_string(), set(names));
        }

        let mut protocols = BTreeMap::new();
        protocols.insert("href".to_string(), set(&["http", "https", "mailto"]));
        protocols.insert("src".to_string(), set(&["http", "https"]));
        protocols.insert("cite".to_string(), set(&["http", "https"]));
        protocols.insert("longdesc".to_string(), set(&["http", "https"]));

        Self {
            tag_names: set(DEFAULT_TAGS),
            attributes,
            protocols,
            strip: set(DEFAULT_STRIP),
        }
    }
}

impl Schema {
    /// Merge an extension into this schema. Extensions only ever widen the
    /// allow-lists, except for protocols, where an entry replaces the
    /// baseline list for that key.
    pub fn extend(&mut self, ext: &SchemaExtension) {
        self.tag_names
            .extend(ext.tag_names.iter().map(|t| t.to_ascii_lowercase()));
        for (tag, names) in &ext.attributes {
            self.attributes
                .entry(tag.to_ascii_lowercase())
                .or_default()
                .extend(names.iter().map(|n| n.to_ascii_lowercase()));
        }
        for (key, schemes) in &ext.protocols {
            self.protocols.insert(
                key.to_ascii_lowercase(),
                schemes.iter().map(|s| s.to_ascii_lowercase()).collect(),
            );
        }
    }

    /// Builder form of [`extend`](Self::extend).
    pub fn with(mut self, ext: &SchemaExtension) -> Self {
        self.extend(ext);
        self
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tag_names.contains(tag)
    }

    pub fn allows_attribute(&self, tag: &str, name: &str) -> bool {
        [tag, ANY_TAG].iter().any(|key| {
            self.attributes
                .get(*key)
                .is_some_and(|names| names.contains(name))
        })
    }

    /// Allowed URL schemes for `tag.name`, if the attribute is restricted.
    pub fn protocols_for(&self, tag: &str, name: &str) -> Option<&BTreeSet<String>> {
        self.protocols
            .get(&format!("{tag}.{name}"))
            .or_else(|| self.protocols.get(name))
    }
}

/// Additions merged into a baseline [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default, rename_all = "camelCase"))]
pub struct SchemaExtension {
    pub tag_names: Vec<String>,
    pub attributes: BTreeMap<String, Vec<String>>,
    pub protocols: BTreeMap<String, Vec<String>>,
}

impl SchemaExtension {
    /// `u` and `del` with `class`/`id`: the canonical tags the normalizer
    /// introduces.
    pub fn formatting() -> Self {
        let mut ext = Self::default();
        for tag in ["u", "del"] {
            ext.tag_names.push(tag.to_string());
            ext.attributes
                .insert(tag.to_string(), vec!["class".into(), "id".into()]);
        }
        ext
    }

    /// The `section.footnotes` block the parser appends after the body.
    pub fn footnotes() -> Self {
        let mut ext = Self {
            tag_names: vec!["section".into()],
            ..Self::default()
        };
        ext.attributes.insert("section".into(), vec!["class".into()]);
        ext
    }

    /// What the embed rewriter emits: safe-linking attributes on anchors and
    /// the `div > iframe` embed block, with frames restricted to HTTPS.
    pub fn embeds() -> Self {
        let mut ext = Self {
            tag_names: vec!["div".into(), "iframe".into()],
            ..Self::default()
        };
        ext.attributes
            .insert("a".into(), vec!["target".into(), "rel".into()]);
        ext.attributes.insert("div".into(), vec!["class".into()]);
        ext.attributes.insert(
            "iframe".into(),
            [
                "src",
                "width",
                "height",
                "allow",
                "allowfullscreen",
                "frameborder",
                "class",
                "style",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        ext.protocols.insert("iframe.src".into(), vec!["https".into()]);
        ext
    }

    /// Combine two extensions.
    pub fn merge(mut self, other: SchemaExtension) -> Self {
        self.tag_names.extend(other.tag_names);
        for (tag, names) in other.attributes {
            self.attributes.entry(tag).or_default().extend(names);
        }
        self.protocols.extend(other.protocols);
        self
    }
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
