//! Record formatting
//!
//! A [`Formatter`] renders a [`Record`] into text from a template whose
//! placeholders name record attributes. Three placeholder syntaxes are
//! supported (see [`Style`]). Templates are parsed once at construction; the
//! check for whether `asctime` is needed happens there too, so rendering
//! never formats a timestamp the template does not use.
//!
//! # Examples
//!
//! ```
//! use rust_logging::{Formatter, Level, Record, Style};
//!
//! let formatter = Formatter::builder()
//!     .format("{levelname:<8}|{name}|{message}")
//!     .style(Style::Brace)
//!     .build()
//!     .unwrap();
//!
//! let record = Record::new("db", Level::INFO, "connected");
//! assert_eq!(formatter.format(&record).unwrap(), "INFO    |db|connected");
//! ```

use super::error::{LoggerError, Result};
use super::printf::{self, Conversion, Flags, Piece};
use super::record::{ExcInfo, Record};
use super::value::Value;
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Default date format; milliseconds are appended as `,mmm`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Template used by `basic_config` when none is given.
pub const BASIC_FORMAT: &str = "%(levelname)s:%(name)s:%(message)s";

/// Placeholder syntax of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Style {
    /// `%(name)s`, with printf flags, width and precision
    #[default]
    #[serde(rename = "%")]
    Percent,
    /// `{name}` or `{name:>10}`
    #[serde(rename = "{")]
    Brace,
    /// `$name` or `${name}`, `$$` for a literal dollar
    #[serde(rename = "$")]
    Template,
}

impl Style {
    pub fn default_format(self) -> &'static str {
        match self {
            Style::Percent => "%(message)s",
            Style::Brace => "{message}",
            Style::Template => "${message}",
        }
    }

    /// Template used by `basic_config` for this style
    pub fn basic_format(self) -> &'static str {
        match self {
            Style::Percent => BASIC_FORMAT,
            Style::Brace => "{levelname}:{name}:{message}",
            Style::Template => "${levelname}:${name}:${message}",
        }
    }

    fn uses_time(self, fmt: &str) -> bool {
        match self {
            Style::Percent => fmt.contains("%(asctime)"),
            Style::Brace => fmt.contains("{asctime"),
            Style::Template => fmt.contains("$asctime") || fmt.contains("${asctime}"),
        }
    }
}

impl FromStr for Style {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "%" => Ok(Style::Percent),
            "{" => Ok(Style::Brace),
            "$" => Ok(Style::Template),
            other => Err(LoggerError::config(
                "formatter",
                format!("Style must be one of: %,{{,$ (got '{}')", other),
            )),
        }
    }
}

/// Which clock `asctime` is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Converter {
    #[default]
    Local,
    Utc,
}

pub type ExceptionHook = Arc<dyn Fn(&ExcInfo) -> String + Send + Sync>;
pub type StackHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Literal(String),
    Percent(Conversion),
    Brace { name: String, spec: BraceSpec },
    Template(String),
}

impl Fragment {
    fn is_field(&self) -> bool {
        !matches!(self, Fragment::Literal(_))
    }
}

pub struct Formatter {
    fmt: String,
    datefmt: Option<String>,
    style: Style,
    /// Parse failures are kept when validation is off and reported per render
    fragments: std::result::Result<Vec<Fragment>, String>,
    uses_time: bool,
    defaults: HashMap<String, Value>,
    converter: Converter,
    exception_hook: Option<ExceptionHook>,
    stack_hook: Option<StackHook>,
}

impl Formatter {
    /// Percent-style formatter with validation on.
    pub fn new(fmt: impl Into<String>) -> Result<Self> {
        Self::builder().format(fmt).build()
    }

    #[must_use]
    pub fn builder() -> FormatterBuilder {
        FormatterBuilder::default()
    }

    /// Shared formatter used by handlers that have none of their own.
    pub fn shared_default() -> Arc<Formatter> {
        static DEFAULT: OnceLock<Arc<Formatter>> = OnceLock::new();
        Arc::clone(DEFAULT.get_or_init(|| Arc::new(Formatter::default())))
    }

    pub fn format_string(&self) -> &str {
        &self.fmt
    }

    pub fn datefmt(&self) -> Option<&str> {
        self.datefmt.as_deref()
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Whether the template references `asctime`. Computed at construction.
    #[inline]
    pub fn uses_time(&self) -> bool {
        self.uses_time
    }

    /// Render a record: substituted template, then exception and stack text.
    pub fn format(&self, record: &Record) -> Result<String> {
        let mut out = self.format_message(record)?;

        let exc_text = match &record.exc_info {
            Some(exc) => Some(record.exc_text_or_init(|| self.format_exception(exc))),
            None => record.exc_text(),
        };
        if let Some(text) = exc_text.filter(|t| !t.is_empty()) {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(text);
        }

        if let Some(stack) = &record.stack_info {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.format_stack(stack));
        }
        Ok(out)
    }

    /// Placeholder substitution only, without exception or stack text.
    pub fn format_message(&self, record: &Record) -> Result<String> {
        let message = record.get_message()?;
        let asctime = if self.uses_time {
            Some(self.format_time(record, self.datefmt.as_deref())?)
        } else {
            None
        };

        let fragments = self.fragments.as_ref().map_err(LoggerError::format)?;
        let mut out = String::with_capacity(self.fmt.len() + message.len() + 32);
        for fragment in fragments {
            match fragment {
                Fragment::Literal(text) => out.push_str(text),
                Fragment::Percent(conversion) => {
                    let name = conversion.key.as_deref().unwrap_or_default();
                    let value = self.lookup(record, name, message, asctime.as_deref())?;
                    out.push_str(&printf::render(conversion, &value)?);
                }
                Fragment::Brace { name, spec } => {
                    let value = self.lookup(record, name, message, asctime.as_deref())?;
                    out.push_str(&spec.render(&value)?);
                }
                Fragment::Template(name) => {
                    let value = self.lookup(record, name, message, asctime.as_deref())?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }

    fn lookup(
        &self,
        record: &Record,
        name: &str,
        message: &str,
        asctime: Option<&str>,
    ) -> Result<Value> {
        match name {
            "message" => Ok(Value::from(message)),
            "asctime" => Ok(Value::Str(match asctime {
                Some(t) => t.to_string(),
                None => self.format_time(record, self.datefmt.as_deref())?,
            })),
            _ => record
                .attribute(name)
                .or_else(|| self.defaults.get(name).cloned())
                .ok_or_else(|| LoggerError::missing_attribute(name)),
        }
    }

    /// Creation time of the record in the formatter's clock.
    ///
    /// Without a date format the result is `YYYY-MM-DD HH:MM:SS,mmm`. A
    /// malformed `datefmt` is a format error.
    pub fn format_time(&self, record: &Record, datefmt: Option<&str>) -> Result<String> {
        let fmt = datefmt.unwrap_or(DEFAULT_DATE_FORMAT);
        let items = StrftimeItems::new(fmt);
        let mut text = String::with_capacity(32);
        let written = match self.converter {
            Converter::Utc => write!(text, "{}", record.created.format_with_items(items)),
            Converter::Local => write!(
                text,
                "{}",
                record.created.with_timezone(&Local).format_with_items(items)
            ),
        };
        written.map_err(|_| LoggerError::format(format!("Invalid date format '{}'", fmt)))?;
        if datefmt.is_none() {
            write!(text, ",{:03}", record.msecs())
                .map_err(|_| LoggerError::format("failed to render milliseconds"))?;
        }
        Ok(text)
    }

    /// Text appended for a captured error. Replaceable with
    /// [`FormatterBuilder::exception_formatter`].
    pub fn format_exception(&self, exc: &ExcInfo) -> String {
        if let Some(hook) = &self.exception_hook {
            return hook(exc);
        }
        let mut out = exc.to_string();
        if !exc.causes.is_empty() {
            out.push_str("\nCaused by:");
            for cause in &exc.causes {
                out.push_str("\n    ");
                out.push_str(cause);
            }
        }
        if let Some(backtrace) = &exc.backtrace {
            out.push_str("\nStack backtrace:\n");
            out.push_str(backtrace.trim_end());
        }
        out
    }

    /// Text appended for stack info. Replaceable with
    /// [`FormatterBuilder::stack_formatter`].
    pub fn format_stack(&self, stack_info: &str) -> String {
        match &self.stack_hook {
            Some(hook) => hook(stack_info),
            None => stack_info.trim_end_matches('\n').to_string(),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        let fmt = Style::Percent.default_format().to_string();
        Self {
            fragments: parse_fragments(Style::Percent, &fmt).map_err(|e| e.to_string()),
            uses_time: false,
            fmt,
            datefmt: None,
            style: Style::Percent,
            defaults: HashMap::new(),
            converter: Converter::Local,
            exception_hook: None,
            stack_hook: None,
        }
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter")
            .field("fmt", &self.fmt)
            .field("datefmt", &self.datefmt)
            .field("style", &self.style)
            .field("uses_time", &self.uses_time)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Formatter`]
#[derive(Default)]
pub struct FormatterBuilder {
    fmt: Option<String>,
    datefmt: Option<String>,
    style: Style,
    defaults: HashMap<String, Value>,
    no_validate: bool,
    converter: Converter,
    exception_hook: Option<ExceptionHook>,
    stack_hook: Option<StackHook>,
}

impl FormatterBuilder {
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn format(mut self, fmt: impl Into<String>) -> Self {
        self.fmt = Some(fmt.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn datefmt(mut self, datefmt: impl Into<String>) -> Self {
        self.datefmt = Some(datefmt.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Value used when a record lacks the named attribute
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn defaults(mut self, defaults: HashMap<String, Value>) -> Self {
        self.defaults.extend(defaults);
        self
    }

    /// Template checks at construction (on by default)
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn validate(mut self, validate: bool) -> Self {
        self.no_validate = !validate;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn utc(mut self, utc: bool) -> Self {
        self.converter = if utc { Converter::Utc } else { Converter::Local };
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn exception_formatter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExcInfo) -> String + Send + Sync + 'static,
    {
        self.exception_hook = Some(Arc::new(hook));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn stack_formatter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.stack_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<Formatter> {
        let style = self.style;
        let fmt = self
            .fmt
            .unwrap_or_else(|| style.default_format().to_string());
        let validate = !self.no_validate;

        let fragments = match parse_fragments(style, &fmt) {
            Ok(fragments) => {
                if validate && !fragments.iter().any(Fragment::is_field) {
                    return Err(LoggerError::config(
                        "formatter",
                        format!("Invalid format '{}' for '{}' style", fmt, style_char(style)),
                    ));
                }
                Ok(fragments)
            }
            Err(err) if validate => {
                return Err(LoggerError::config_caused(
                    "formatter",
                    format!("Invalid format '{}' for '{}' style", fmt, style_char(style)),
                    err,
                ))
            }
            Err(err) => Err(err.to_string()),
        };

        if let Some(datefmt) = &self.datefmt {
            if StrftimeItems::new(datefmt).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "formatter",
                    format!("Invalid date format '{}'", datefmt),
                ));
            }
        }

        Ok(Formatter {
            uses_time: style.uses_time(&fmt),
            fmt,
            datefmt: self.datefmt,
            style,
            fragments,
            defaults: self.defaults,
            converter: self.converter,
            exception_hook: self.exception_hook,
            stack_hook: self.stack_hook,
        })
    }
}

fn style_char(style: Style) -> char {
    match style {
        Style::Percent => '%',
        Style::Brace => '{',
        Style::Template => '$',
    }
}

fn parse_fragments(style: Style, fmt: &str) -> Result<Vec<Fragment>> {
    match style {
        Style::Percent => parse_percent(fmt),
        Style::Brace => parse_brace(fmt),
        Style::Template => parse_template(fmt),
    }
}

fn parse_percent(fmt: &str) -> Result<Vec<Fragment>> {
    printf::parse(fmt)?
        .into_iter()
        .map(|piece| match piece {
            Piece::Literal(text) => Ok(Fragment::Literal(text)),
            Piece::Spec(conversion) if conversion.key.is_some() => {
                Ok(Fragment::Percent(conversion))
            }
            Piece::Spec(_) => Err(LoggerError::format("format requires a mapping")),
        })
        .collect()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn parse_brace(fmt: &str) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::new();
    let mut literal = String::new();
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(LoggerError::format("unexpected '{' in field name")),
                        Some(ch) => field.push(ch),
                        None => return Err(LoggerError::format("expected '}' before end of string")),
                    }
                }
                let (head, spec_text) = match field.split_once(':') {
                    Some((head, spec)) => (head, Some(spec)),
                    None => (field.as_str(), None),
                };
                let (name, conversion) = match head.split_once('!') {
                    Some((name, conv)) => (name, Some(conv)),
                    None => (head, None),
                };
                if !is_identifier(name) {
                    return Err(LoggerError::format(format!("invalid field name '{}'", name)));
                }
                let mut spec = BraceSpec::parse(spec_text.unwrap_or(""))?;
                match conversion {
                    None => {}
                    Some("r") | Some("a") => spec.repr = true,
                    Some("s") => {}
                    Some(other) => {
                        return Err(LoggerError::format(format!(
                            "invalid conversion '{}'",
                            other
                        )))
                    }
                }
                if !literal.is_empty() {
                    fragments.push(Fragment::Literal(std::mem::take(&mut literal)));
                }
                fragments.push(Fragment::Brace {
                    name: name.to_string(),
                    spec,
                });
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(LoggerError::format("single '}' encountered in format string")),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        fragments.push(Fragment::Literal(literal));
    }
    Ok(fragments)
}

fn parse_template(fmt: &str) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::new();
    let mut literal = String::new();
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            literal.push(c);
            continue;
        }
        let name = match chars.peek() {
            Some('$') => {
                chars.next();
                literal.push('$');
                continue;
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(LoggerError::format("unterminated '${' placeholder")),
                    }
                }
                name
            }
            Some(&ch) if ch == '_' || ch.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch != '_' && !ch.is_ascii_alphanumeric() {
                        break;
                    }
                    name.push(ch);
                    chars.next();
                }
                name
            }
            _ => return Err(LoggerError::format("invalid placeholder: bare '$'")),
        };
        if !is_identifier(&name) {
            return Err(LoggerError::format(format!("invalid placeholder '${{{}}}'", name)));
        }
        if !literal.is_empty() {
            fragments.push(Fragment::Literal(std::mem::take(&mut literal)));
        }
        fragments.push(Fragment::Template(name));
    }
    if !literal.is_empty() {
        fragments.push(Fragment::Literal(literal));
    }
    Ok(fragments)
}

/// `[[fill]align][sign][0][width][.precision][type]`
#[derive(Debug, Clone, PartialEq, Eq)]
struct BraceSpec {
    repr: bool,
    fill: char,
    align: Option<char>,
    sign: Option<char>,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl BraceSpec {
    fn parse(text: &str) -> Result<Self> {
        let mut spec = BraceSpec {
            repr: false,
            fill: ' ',
            align: None,
            sign: None,
            zero: false,
            width: None,
            precision: None,
            kind: None,
        };
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');

        if chars.len() >= 2 && is_align(chars[1]) {
            spec.fill = chars[0];
            spec.align = Some(chars[1]);
            i = 2;
        } else if !chars.is_empty() && is_align(chars[0]) {
            spec.align = Some(chars[0]);
            i = 1;
        }
        if i < chars.len() && matches!(chars[i], '+' | '-' | ' ') {
            spec.sign = Some(chars[i]);
            i += 1;
        }
        if i < chars.len() && chars[i] == '0' {
            spec.zero = true;
            i += 1;
        }
        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i > start {
            spec.width = chars[start..i].iter().collect::<String>().parse().ok();
        }
        if i < chars.len() && chars[i] == '.' {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i == start {
                return Err(LoggerError::format("format specifier missing precision"));
            }
            spec.precision = chars[start..i].iter().collect::<String>().parse().ok();
        }
        if i < chars.len() && "sdbxXoeEfFgG%".contains(chars[i]) {
            spec.kind = Some(chars[i]);
            i += 1;
        }
        if i != chars.len() {
            return Err(LoggerError::format(format!(
                "invalid format specifier '{}'",
                text
            )));
        }
        Ok(spec)
    }

    fn render(&self, value: &Value) -> Result<String> {
        let flags = Flags {
            plus: self.sign == Some('+'),
            space: self.sign == Some(' '),
            ..Flags::default()
        };
        let (body, numeric) = match self.kind {
            None | Some('s') => {
                let text = if self.repr { value.repr() } else { value.to_string() };
                let text = match self.precision {
                    Some(p) if matches!(value, Value::Str(_)) || self.kind == Some('s') => {
                        text.chars().take(p).collect()
                    }
                    _ => text,
                };
                let numeric = self.kind.is_none() && matches!(value, Value::Int(_) | Value::Float(_));
                (text, numeric)
            }
            Some('b') => {
                let n = value.as_int().ok_or_else(|| not_a_number('b', value))?;
                let sign = if n < 0 { "-" } else { "" };
                (format!("{}{:b}", sign, n.unsigned_abs()), true)
            }
            Some('%') => {
                let f = value.as_float().ok_or_else(|| not_a_number('%', value))?;
                let conversion = Conversion {
                    key: None,
                    flags,
                    width: None,
                    precision: Some(self.precision.unwrap_or(6)),
                    kind: 'f',
                };
                (format!("{}%", printf::render(&conversion, &Value::Float(f * 100.0))?), true)
            }
            Some(kind) => {
                let conversion = Conversion {
                    key: None,
                    flags,
                    width: None,
                    precision: if kind == 'd' { None } else { self.precision },
                    kind,
                };
                (printf::render(&conversion, value)?, true)
            }
        };

        let width = self.width.unwrap_or(0);
        let len = body.chars().count();
        if len >= width {
            return Ok(body);
        }
        let pad = width - len;
        let (fill, align) = match (self.zero, self.align) {
            (true, None) if numeric => ('0', '='),
            (_, Some(align)) => (self.fill, align),
            (_, None) if numeric => (self.fill, '>'),
            _ => (self.fill, '<'),
        };
        let padding = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
        Ok(match align {
            '<' => format!("{}{}", body, padding(pad)),
            '>' => format!("{}{}", padding(pad), body),
            '^' => format!("{}{}{}", padding(pad / 2), body, padding(pad - pad / 2)),
            _ => {
                let split = body
                    .char_indices()
                    .find(|(_, c)| !matches!(c, '+' | '-' | ' '))
                    .map_or(body.len(), |(idx, _)| idx);
                format!("{}{}{}", &body[..split], padding(pad), &body[split..])
            }
        })
    }
}

fn not_a_number(kind: char, value: &Value) -> LoggerError {
    LoggerError::format(format!(
        "unknown format code '{}' for value of type {}",
        kind,
        value.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::Level;

    fn record() -> Record {
        Record::new("app.db", Level::WARNING, "disk %d%% full").with_args([93])
    }

    #[test]
    fn test_default_formatter_renders_message() {
        let formatter = Formatter::default();
        assert_eq!(formatter.format(&record()).unwrap(), "disk 93% full");
        assert!(!formatter.uses_time());
    }

    #[test]
    fn test_percent_style_with_width() {
        let formatter = Formatter::new("[%(levelname)-8s] %(name)s: %(message)s").unwrap();
        assert_eq!(
            formatter.format(&record()).unwrap(),
            "[WARNING ] app.db: disk 93% full"
        );
    }

    #[test]
    fn test_brace_style_alignment() {
        let formatter = Formatter::builder()
            .format("{levelname:>9}|{levelno:05d}|{message!r}")
            .style(Style::Brace)
            .build()
            .unwrap();
        assert_eq!(
            formatter.format(&record()).unwrap(),
            "  WARNING|00030|\"disk 93% full\""
        );
    }

    #[test]
    fn test_template_style() {
        let formatter = Formatter::builder()
            .format("$levelname ${name}: $message costs $$5")
            .style(Style::Template)
            .build()
            .unwrap();
        assert_eq!(
            formatter.format(&record()).unwrap(),
            "WARNING app.db: disk 93% full costs $5"
        );
    }

    #[test]
    fn test_uses_time_detection() {
        assert!(Formatter::new("%(asctime)s %(message)s").unwrap().uses_time());
        let brace = Formatter::builder()
            .format("{asctime} {message}")
            .style(Style::Brace)
            .build()
            .unwrap();
        assert!(brace.uses_time());
        assert!(!Formatter::new("%(message)s").unwrap().uses_time());
    }

    #[test]
    fn test_asctime_default_layout() {
        let formatter = Formatter::builder()
            .format("%(asctime)s")
            .utc(true)
            .build()
            .unwrap();
        let rec = record();
        let expected = format!(
            "{},{:03}",
            rec.created.format(DEFAULT_DATE_FORMAT),
            rec.msecs()
        );
        assert_eq!(formatter.format(&rec).unwrap(), expected);
    }

    #[test]
    fn test_custom_datefmt() {
        let formatter = Formatter::builder()
            .format("%(asctime)s")
            .datefmt("%Y")
            .utc(true)
            .build()
            .unwrap();
        let rec = record();
        assert_eq!(formatter.format(&rec).unwrap(), rec.created.format("%Y").to_string());
    }

    #[test]
    fn test_format_time_rejects_bad_datefmt() {
        let formatter = Formatter::builder().utc(true).build().unwrap();
        let rec = record();
        let err = formatter.format_time(&rec, Some("%Y %Q")).unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(formatter.format_time(&rec, Some("%Y")).unwrap(), rec.created.format("%Y").to_string());
        assert!(formatter.format_time(&rec, None).unwrap().contains(','));
    }

    #[test]
    fn test_missing_attribute_is_an_error() {
        let formatter = Formatter::new("%(user)s %(message)s").unwrap();
        let err = formatter.format(&record()).unwrap_err();
        assert!(matches!(err, LoggerError::MissingAttribute { ref name } if name == "user"));
    }

    #[test]
    fn test_defaults_fill_missing_attributes() {
        let formatter = Formatter::builder()
            .format("%(user)s: %(message)s")
            .default_value("user", "anonymous")
            .build()
            .unwrap();
        assert_eq!(formatter.format(&record()).unwrap(), "anonymous: disk 93% full");

        let rec = record();
        rec.set_extra("user", "root").unwrap();
        assert_eq!(formatter.format(&rec).unwrap(), "root: disk 93% full");
    }

    #[test]
    fn test_validation() {
        assert!(Formatter::new("no fields here").is_err());
        assert!(Formatter::builder().format("{oops").style(Style::Brace).build().is_err());
        assert!(Formatter::builder().format("cost $").style(Style::Template).build().is_err());
        assert!(Formatter::builder().format("%(message)s").datefmt("%Q").build().is_err());

        let lenient = Formatter::builder()
            .format("{oops")
            .style(Style::Brace)
            .validate(false)
            .build()
            .unwrap();
        assert!(lenient.format(&record()).is_err());

        let literal = Formatter::builder().format("static").validate(false).build().unwrap();
        assert_eq!(literal.format(&record()).unwrap(), "static");
    }

    #[test]
    fn test_exception_text_appended_and_cached() {
        let formatter = Formatter::new("%(levelname)s %(message)s").unwrap();
        let rec = Record::new("app", Level::ERROR, "boom")
            .with_exc_info(ExcInfo::new("ParseError", "bad token"));

        let text = formatter.format(&rec).unwrap();
        assert_eq!(text, "ERROR boom\nParseError: bad token");
        assert_eq!(rec.exc_text(), Some("ParseError: bad token"));

        let custom = Formatter::builder()
            .exception_formatter(|exc| format!("!! {}", exc.message))
            .build()
            .unwrap();
        // cached text from the first formatter wins
        assert_eq!(custom.format(&rec).unwrap(), "boom\nParseError: bad token");
    }

    #[test]
    fn test_overridable_exception_and_stack_hooks() {
        let formatter = Formatter::builder()
            .exception_formatter(|exc| format!("<{}>", exc.type_name))
            .stack_formatter(|stack| stack.to_uppercase())
            .build()
            .unwrap();
        let rec = Record::new("app", Level::ERROR, "boom")
            .with_exc_info(ExcInfo::new("IoError", "closed"))
            .with_stack_info("frame one\n");
        assert_eq!(formatter.format(&rec).unwrap(), "boom\n<IoError>\nFRAME ONE\n");
        assert_eq!(formatter.format_message(&rec).unwrap(), "boom");
    }

    #[test]
    fn test_format_is_idempotent() {
        let formatter = Formatter::new("%(name)s %(levelno)d %(message)s").unwrap();
        let rec = record();
        assert_eq!(formatter.format(&rec).unwrap(), formatter.format(&rec).unwrap());
    }
}
