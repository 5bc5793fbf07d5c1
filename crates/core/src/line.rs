//! Line classification.
//!
//! Every raw template line is turned into a [`SourceLine`]: its indentation,
//! its [`LineKind`] and the fragments it contributes to the output. Rules are
//! tried in a fixed order and the first one that accepts the content wins;
//! anything no rule accepts is literal text.

use std::fmt::Write as _;

use crate::error::CompileWarning;

/// Opening delimiter of an embedded code region.
pub const PHP_OPEN: &str = "<?php";
/// Closing delimiter of an embedded code region.
pub const PHP_CLOSE: &str = "?>";
/// Tag used when an element declares only an id and/or classes.
pub const DEFAULT_TAG: &str = "div";

const SILENT_COMMENT: &str = "-#";
const DOCTYPE_MARKER: &str = "!!!";
const COMMENT_OPEN: &str = "<!-- ";
const COMMENT_CLOSE: &str = " -->";

/// Keywords that open a nested block using PHP's alternative syntax.
pub const CONTROL_KEYWORDS: &[&str] = &["if", "foreach", "for", "while"];

/// Statements that look like control flow but are not nested by the compiler.
const UNNESTED_KEYWORDS: &[&str] = &["else", "elseif", "switch", "case", "do"];

/// Document type emitted for a `!!!` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Doctype {
    /// XHTML 1.1, used for a bare `!!!` and unknown variants.
    #[default]
    Xhtml11,
    /// `!!! 5` / `!!! html`
    Html5,
    /// `!!! strict`
    Strict,
    /// `!!! transitional`
    Transitional,
    /// `!!! frameset`
    Frameset,
    /// `!!! basic`
    Basic,
    /// `!!! mobile`
    Mobile,
    /// `!!! xml`
    Xml,
}

impl Doctype {
    /// Resolve the variant name written after `!!!`.
    pub fn from_variant(variant: Option<&str>) -> Self {
        let Some(variant) = variant else {
            return Doctype::Xhtml11;
        };
        match variant.to_ascii_lowercase().as_str() {
            "5" | "html" | "html5" => Doctype::Html5,
            "strict" => Doctype::Strict,
            "transitional" => Doctype::Transitional,
            "frameset" => Doctype::Frameset,
            "basic" => Doctype::Basic,
            "mobile" => Doctype::Mobile,
            "xml" => Doctype::Xml,
            _ => Doctype::Xhtml11,
        }
    }

    /// The declaration text written to the output.
    pub fn declaration(self) -> &'static str {
        match self {
            Doctype::Xhtml11 => {
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#
            }
            Doctype::Html5 => "<!DOCTYPE html>",
            Doctype::Strict => {
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#
            }
            Doctype::Transitional => {
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#
            }
            Doctype::Frameset => {
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#
            }
            Doctype::Basic => {
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#
            }
            Doctype::Mobile => {
                r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#
            }
            Doctype::Xml => "<?xml version='1.0' encoding='utf-8' ?>",
        }
    }
}

/// Parsed representation of an element declaration (e.g. `%a#home.nav(href='/')`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name, [`DEFAULT_TAG`] when only id/classes were given.
    pub tag: String,
    /// Optional `#id`.
    pub id: Option<String>,
    /// Classes from the `.a.b` chain, in source order.
    pub classes: Vec<String>,
    /// Raw text between the attribute parentheses, copied through as-is.
    pub attributes: Option<String>,
    /// Whether the declaration ended with the self-close marker `/`.
    pub self_closing: bool,
}

impl Element {
    /// Start tag with id, class and attribute text inserted in that order.
    pub fn start_tag(&self) -> String {
        let mut tag = format!("<{}", self.tag);

        if let Some(id) = self.id.as_ref() {
            write!(tag, " id='{}'", id).ok();
        }
        if !self.classes.is_empty() {
            write!(tag, " class='{}'", self.classes.join(" ")).ok();
        }
        if let Some(attributes) = self.attributes.as_ref() {
            tag.push(' ');
            tag.push_str(attributes);
        }

        tag.push_str(if self.self_closing { " />" } else { ">" });
        tag
    }

    /// Matching end tag.
    pub fn end_tag(&self) -> String {
        format!("</{}>", self.tag)
    }
}

/// What a line is, decided by the first matching classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Blank line or `-#` silent comment; never reaches the output.
    Ignored,
    /// `!!!` document type declaration.
    Doctype(Doctype),
    /// `/` HTML comment, inline or wrapping nested lines.
    Comment,
    /// `%tag#id.class(attrs)` element declaration.
    Element(Element),
    /// `- keyword(condition)` block using PHP's alternative syntax.
    ControlFlow {
        /// One of [`CONTROL_KEYWORDS`].
        keyword: String,
        /// Text between the outer parentheses.
        condition: String,
    },
    /// `- code` passed through as a code region.
    RawCode,
    /// `= expr` echoed through a code region.
    Expression,
    /// Anything else, copied verbatim.
    Text,
}

/// One classified template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Line number (1-indexed).
    pub number: usize,
    /// Line as it was read.
    pub raw: String,
    /// Count of leading space characters.
    pub leading_spaces: usize,
    /// Nesting depth, two spaces per level.
    pub indent: usize,
    /// Line with surrounding whitespace removed.
    pub content: String,
    /// Classification result.
    pub kind: LineKind,
    /// Fragment emitted when the line opens a level.
    pub open: Option<String>,
    /// Inline content; present means the line is complete on its own.
    pub inline: Option<String>,
    /// Fragment emitted when the level opened by this line closes.
    pub close: Option<String>,
}

impl SourceLine {
    /// Classify one raw line.
    pub fn parse(number: usize, raw: &str) -> Self {
        let trimmed = raw.trim_end();
        let leading_spaces = trimmed.bytes().take_while(|b| *b == b' ').count();
        let content = trimmed.trim_start();

        let Classified {
            kind,
            open,
            inline,
            close,
        } = classify(content);

        SourceLine {
            number,
            raw: raw.to_string(),
            leading_spaces,
            indent: leading_spaces / 2,
            content: content.to_string(),
            kind,
            open,
            inline,
            close,
        }
    }

    /// Whether the line is invisible to validation and nesting.
    pub fn is_ignored(&self) -> bool {
        matches!(self.kind, LineKind::Ignored)
    }

    /// Whether the line has no inline content and therefore becomes a frame.
    pub fn opens_level(&self) -> bool {
        !self.is_ignored() && self.inline.is_none()
    }

    /// Full single-line rendering: opening fragment, inline content and
    /// closing fragment, trimmed.
    pub fn render(&self) -> String {
        let mut rendered = String::new();
        for part in [&self.open, &self.inline, &self.close].into_iter().flatten() {
            rendered.push_str(part);
        }
        rendered.trim().to_string()
    }

    /// Warning for leading tabs; only spaces count toward `indent`.
    pub fn indentation_warning(&self) -> Option<CompileWarning> {
        let content_start = self.raw.len() - self.raw.trim_start().len();
        self.raw[..content_start]
            .contains('\t')
            .then_some(CompileWarning::TabIndentation { line: self.number })
    }

    /// Non-fatal warning for lines that degraded to a fallback rule.
    pub fn fallback_warning(&self) -> Option<CompileWarning> {
        match &self.kind {
            LineKind::Text if looks_like_element(&self.content) => {
                Some(CompileWarning::LiteralFallback {
                    line: self.number,
                    content: self.content.clone(),
                })
            }
            LineKind::RawCode => {
                let code = self.content.trim_start_matches('-').trim_start();
                let word = leading_word(code);
                let known = CONTROL_KEYWORDS.contains(&word) || UNNESTED_KEYWORDS.contains(&word);
                known.then(|| CompileWarning::UnsupportedControlFlow {
                    line: self.number,
                    keyword: word.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Output of a single classification rule.
struct Classified {
    kind: LineKind,
    open: Option<String>,
    inline: Option<String>,
    close: Option<String>,
}

impl Classified {
    /// Line rendered as one piece that never opens a level.
    fn single(kind: LineKind, text: String) -> Self {
        Self {
            kind,
            open: None,
            inline: Some(text),
            close: None,
        }
    }
}

type Rule = fn(&str) -> Option<Classified>;

/// Classification rules in priority order.
const RULES: &[Rule] = &[
    ignored,
    doctype,
    comment,
    element,
    control_flow,
    raw_code,
    expression,
];

fn classify(content: &str) -> Classified {
    RULES
        .iter()
        .find_map(|rule| rule(content))
        .unwrap_or_else(|| Classified::single(LineKind::Text, content.to_string()))
}

fn ignored(content: &str) -> Option<Classified> {
    (content.is_empty() || content.starts_with(SILENT_COMMENT)).then_some(Classified {
        kind: LineKind::Ignored,
        open: None,
        inline: None,
        close: None,
    })
}

fn doctype(content: &str) -> Option<Classified> {
    let rest = content.strip_prefix(DOCTYPE_MARKER)?;
    let variant = match marker_argument(rest)? {
        "" => None,
        name => Some(name),
    };
    let doctype = Doctype::from_variant(variant);
    Some(Classified::single(
        LineKind::Doctype(doctype),
        doctype.declaration().to_string(),
    ))
}

fn comment(content: &str) -> Option<Classified> {
    let rest = content.strip_prefix('/')?;
    let text = match marker_argument(rest)? {
        "" => None,
        text => Some(text.to_string()),
    };
    Some(Classified {
        kind: LineKind::Comment,
        open: Some(COMMENT_OPEN.to_string()),
        inline: text,
        close: Some(COMMENT_CLOSE.to_string()),
    })
}

/// Text after a marker: empty, or separated from the marker by whitespace.
fn marker_argument(rest: &str) -> Option<&str> {
    if rest.is_empty() {
        Some("")
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// What follows the element declaration.
enum Tail<'a> {
    Open,
    SelfClose,
    Expression(&'a str),
    Inline(&'a str),
}

fn element(content: &str) -> Option<Classified> {
    let mut cursor = content;
    let tag = take_name(&mut cursor, '%');
    let id = take_name(&mut cursor, '#');
    let mut classes = Vec::new();
    while let Some(class) = take_name(&mut cursor, '.') {
        classes.push(class);
    }

    if tag.is_none() && id.is_none() && classes.is_empty() {
        return None;
    }

    let mut attributes = None;
    if cursor.starts_with('(') {
        let (inner, rest) = split_attributes(cursor)?;
        if !inner.is_empty() {
            attributes = Some(inner.to_string());
        }
        cursor = rest;
    }

    let tail = parse_tail(cursor)?;
    let element = Element {
        tag: tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
        id,
        classes,
        attributes,
        self_closing: matches!(tail, Tail::SelfClose),
    };

    let open = element.start_tag();
    let inline = match tail {
        Tail::SelfClose => return Some(Classified::single(LineKind::Element(element), open)),
        Tail::Open => None,
        Tail::Expression(expr) => Some(echo(expr)),
        Tail::Inline(text) => Some(text.to_string()),
    };
    let close = element.end_tag();

    Some(Classified {
        kind: LineKind::Element(element),
        open: Some(open),
        inline,
        close: Some(close),
    })
}

/// Consume `prefix` followed by a name, advancing `cursor` past both.
fn take_name(cursor: &mut &str, prefix: char) -> Option<String> {
    let rest = cursor.strip_prefix(prefix)?;
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
        .count();
    let name = rest[..len].to_string();
    *cursor = &rest[len..];
    Some(name)
}

/// Split `(attrs)rest` at the parenthesis balancing the first one.
/// Parentheses inside single or double quotes don't count.
fn split_attributes(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((input[1..i].trim(), &input[i + 1..]));
                    }
                }
                _ => {}
            },
        }
    }

    None
}

fn parse_tail(rest: &str) -> Option<Tail<'_>> {
    if rest.is_empty() {
        return Some(Tail::Open);
    }

    let trimmed = rest.trim_start();
    if trimmed == "/" {
        return Some(Tail::SelfClose);
    }
    if let Some(expr) = trimmed.strip_prefix('=') {
        let expr = expr.trim();
        return (!expr.is_empty()).then_some(Tail::Expression(expr));
    }
    if rest.starts_with(char::is_whitespace) {
        return Some(Tail::Inline(trimmed));
    }

    None
}

fn control_flow(content: &str) -> Option<Classified> {
    let code = content.strip_prefix('-')?.trim_start();
    let keyword = leading_word(code);
    if !CONTROL_KEYWORDS.contains(&keyword) {
        return None;
    }

    let condition = code[keyword.len()..]
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .trim();
    if condition.is_empty() {
        return None;
    }

    Some(Classified {
        kind: LineKind::ControlFlow {
            keyword: keyword.to_string(),
            condition: condition.to_string(),
        },
        open: Some(php_wrap(&format!("{keyword}({condition}):"))),
        inline: None,
        close: Some(php_wrap(&format!("end{keyword};"))),
    })
}

fn raw_code(content: &str) -> Option<Classified> {
    let code = content.strip_prefix('-')?.trim();
    if code.is_empty() {
        return None;
    }
    Some(Classified::single(LineKind::RawCode, php_wrap(code)))
}

fn expression(content: &str) -> Option<Classified> {
    let expr = content.strip_prefix('=')?.trim();
    if expr.is_empty() {
        return None;
    }
    Some(Classified::single(LineKind::Expression, echo(expr)))
}

fn php_wrap(code: &str) -> String {
    format!("{PHP_OPEN} {code} {PHP_CLOSE}")
}

fn echo(expr: &str) -> String {
    php_wrap(&format!("echo({expr});"))
}

fn leading_word(code: &str) -> &str {
    let len = code.bytes().take_while(u8::is_ascii_alphabetic).count();
    &code[..len]
}

fn looks_like_element(content: &str) -> bool {
    let mut chars = content.chars();
    match chars.next() {
        Some('%') => true,
        Some('#' | '.') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> SourceLine {
        SourceLine::parse(1, raw)
    }

    #[test]
    fn blank_and_silent_comment_lines_are_ignored() {
        assert!(parse("").is_ignored());
        assert!(parse("      ").is_ignored());
        assert!(parse("  -# note to self").is_ignored());
        assert!(!parse("").opens_level());
    }

    #[test]
    fn computes_indent_from_leading_spaces() {
        let line = parse("    %p hi   ");
        assert_eq!(line.leading_spaces, 4);
        assert_eq!(line.indent, 2);
        assert_eq!(line.content, "%p hi");
    }

    #[test]
    fn bare_doctype_is_xhtml11() {
        let line = parse("!!!");
        assert_eq!(line.kind, LineKind::Doctype(Doctype::Xhtml11));
        assert_eq!(line.render(), Doctype::Xhtml11.declaration());
        assert!(!line.opens_level());
    }

    #[test]
    fn doctype_variants() {
        assert_eq!(parse("!!! 5").render(), "<!DOCTYPE html>");
        assert_eq!(parse("!!! Strict").kind, LineKind::Doctype(Doctype::Strict));
        assert_eq!(
            parse("!!! whatever").kind,
            LineKind::Doctype(Doctype::Xhtml11)
        );
        // marker must be followed by whitespace
        assert_eq!(parse("!!!5").kind, LineKind::Text);
    }

    #[test]
    fn inline_comment() {
        let line = parse("/ hidden note");
        assert_eq!(line.kind, LineKind::Comment);
        assert_eq!(line.inline.as_deref(), Some("hidden note"));
        assert_eq!(line.render(), "<!-- hidden note -->");
    }

    #[test]
    fn block_comment_opens_level() {
        let line = parse("/");
        assert_eq!(line.kind, LineKind::Comment);
        assert!(line.opens_level());
        assert_eq!(line.open.as_deref(), Some("<!-- "));
        assert_eq!(line.close.as_deref(), Some(" -->"));
    }

    #[test]
    fn element_with_inline_text() {
        let line = parse("%p Hello");
        assert_eq!(line.render(), "<p>Hello</p>");
        assert!(!line.opens_level());
    }

    #[test]
    fn element_without_content_opens_level() {
        let line = parse("%ul");
        assert!(line.opens_level());
        assert_eq!(line.open.as_deref(), Some("<ul>"));
        assert_eq!(line.close.as_deref(), Some("</ul>"));
    }

    #[test]
    fn id_and_classes_default_to_div() {
        let line = parse("#main.wide.dark");
        let LineKind::Element(element) = &line.kind else {
            panic!("expected element, got {:?}", line.kind);
        };
        assert_eq!(element.tag, "div");
        assert_eq!(element.id.as_deref(), Some("main"));
        assert_eq!(element.classes, vec!["wide", "dark"]);
        assert_eq!(
            line.open.as_deref(),
            Some("<div id='main' class='wide dark'>")
        );
    }

    #[test]
    fn attributes_follow_id_and_class() {
        let line = parse("%a#home.nav(href='/' title=\"Home (start)\") Home");
        assert_eq!(
            line.render(),
            "<a id='home' class='nav' href='/' title=\"Home (start)\">Home</a>"
        );
    }

    #[test]
    fn attributes_stop_at_balancing_parenthesis() {
        let line = parse("%a(href='x') link (more)");
        assert_eq!(line.render(), "<a href='x'>link (more)</a>");
    }

    #[test]
    fn unbalanced_attributes_fall_back_to_text() {
        let line = parse("%a(href='x' link");
        assert_eq!(line.kind, LineKind::Text);
        assert!(line.fallback_warning().is_some());
    }

    #[test]
    fn self_closing_element_never_opens_level() {
        for raw in ["%br/", "%br /", "%img(src='a.png')/"] {
            let line = parse(raw);
            assert!(!line.opens_level(), "{raw}");
            assert!(line.render().ends_with(" />"), "{raw}");
        }
        let LineKind::Element(element) = parse("%br/").kind else {
            panic!("expected element");
        };
        assert!(element.self_closing);
    }

    #[test]
    fn inline_expression_is_echoed() {
        assert_eq!(
            parse("%p= $title").render(),
            "<p><?php echo($title); ?></p>"
        );
        assert_eq!(
            parse("%span = strtoupper($name)").render(),
            "<span><?php echo(strtoupper($name)); ?></span>"
        );
    }

    #[test]
    fn control_flow_opens_level() {
        let line = parse("- foreach($items as $item)");
        assert_eq!(
            line.kind,
            LineKind::ControlFlow {
                keyword: "foreach".to_string(),
                condition: "$items as $item".to_string(),
            }
        );
        assert!(line.opens_level());
        assert_eq!(
            line.open.as_deref(),
            Some("<?php foreach($items as $item): ?>")
        );
        assert_eq!(line.close.as_deref(), Some("<?php endforeach; ?>"));
    }

    #[test]
    fn control_flow_allows_space_before_condition() {
        let line = parse("-if ($user)");
        assert_eq!(line.open.as_deref(), Some("<?php if($user): ?>"));
        assert_eq!(line.close.as_deref(), Some("<?php endif; ?>"));
    }

    #[test]
    fn unknown_keyword_is_raw_code() {
        let line = parse("- iffy($x)");
        assert_eq!(line.kind, LineKind::RawCode);
        assert_eq!(line.render(), "<?php iffy($x) ?>");
        assert_eq!(line.fallback_warning(), None);
    }

    #[test]
    fn unnested_keyword_warns() {
        let line = parse("- else");
        assert_eq!(line.kind, LineKind::RawCode);
        assert_eq!(
            line.fallback_warning(),
            Some(CompileWarning::UnsupportedControlFlow {
                line: 1,
                keyword: "else".to_string(),
            })
        );
    }

    #[test]
    fn expression_line() {
        let line = parse("= $count + 1");
        assert_eq!(line.kind, LineKind::Expression);
        assert_eq!(line.render(), "<?php echo($count + 1); ?>");
        assert!(!line.opens_level());
    }

    #[test]
    fn bare_markers_are_text() {
        assert_eq!(parse("-").kind, LineKind::Text);
        assert_eq!(parse("=").kind, LineKind::Text);
        assert_eq!(parse("%p=").kind, LineKind::Text);
    }

    #[test]
    fn plain_text_is_verbatim() {
        let line = parse("  Hello, <b>world</b>!");
        assert_eq!(line.kind, LineKind::Text);
        assert_eq!(line.render(), "Hello, <b>world</b>!");
        assert_eq!(line.fallback_warning(), None);
    }

    #[test]
    fn malformed_element_warns() {
        let line = parse("%p!oops");
        assert_eq!(line.kind, LineKind::Text);
        assert!(matches!(
            line.fallback_warning(),
            Some(CompileWarning::LiteralFallback { line: 1, .. })
        ));
        assert_eq!(parse("... and so on").fallback_warning(), None);
    }

    #[test]
    fn leading_tabs_warn_and_do_not_indent() {
        let line = parse("\t%p x");
        assert_eq!(line.indent, 0);
        assert_eq!(line.render(), "<p>x</p>");
        assert_eq!(
            line.indentation_warning(),
            Some(CompileWarning::TabIndentation { line: 1 })
        );
        assert_eq!(parse("  %p\tx").indentation_warning(), None);
    }
}
